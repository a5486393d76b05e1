//! 组件解析器抽象接口
//!
//! 提供依赖解析的契约以及解析链（循环依赖检测）的上下文

use crate::slot::{FieldType, Resolved};
use crate::tag::TagValue;
use infrastructure_common::{DependencyError, DependencyResult};
use uuid::Uuid;

/// 实例解析器 trait
///
/// 负责为字段类型和注入指令解析组件实例
pub trait InstanceResolver {
    /// 解析字段需要的实例
    ///
    /// 返回 `Ok(None)` 表示没有候选组件且注入是可选的，字段应保持原值。
    fn resolve_instance(
        &self,
        field_type: &FieldType,
        tag: &TagValue,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<Option<Resolved>>;
}

#[derive(Debug, Clone)]
struct ChainEntry {
    id: Uuid,
    label: String,
}

/// 解析上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<ChainEntry>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定选项创建解析上下文
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加注册项到解析链
    pub fn push(&mut self, id: Uuid, label: impl Into<String>) -> DependencyResult<()> {
        let label = label.into();
        if self.contains(id) {
            return Err(DependencyError::CyclicDependency {
                chain: self.render_chain(&label),
            });
        }
        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                max_depth: self.options.max_depth,
                chain: self.render_chain(&label),
            });
        }
        self.resolution_chain.push(ChainEntry { id, label });
        Ok(())
    }

    /// 从解析链中移除最后一项
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 注册项是否正在解析中
    pub fn contains(&self, id: Uuid) -> bool {
        self.resolution_chain.iter().any(|entry| entry.id == id)
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    fn render_chain(&self, closing: &str) -> String {
        self.resolution_chain
            .iter()
            .map(|entry| entry.label.as_str())
            .chain(std::iter::once(closing))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}
