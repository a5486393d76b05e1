//! 作用域配置与统计信息

use crate::resolver::ResolveOptions;
use serde::{Deserialize, Serialize};

/// 作用域配置
///
/// 缺失的配置键使用默认值，因此可以直接从任意配置源绑定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// 作用域名称，用于日志和诊断信息
    pub name: String,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl ScopeConfig {
    /// 创建指定名称的配置
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 转换为解析选项
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_resolution_depth,
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            max_resolution_depth: ResolveOptions::default().max_depth,
        }
    }
}

/// 作用域统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeStats {
    /// 本作用域中已注册组件数量
    pub registered_components: usize,
    /// 本作用域中已创建实例的组件数量
    pub active_singletons: usize,
    /// 祖先作用域数量
    pub ancestors: usize,
}
