//! 结构体注入描述

use crate::injection::{Injection, WireTarget, Wireable};
use crate::resolver::{InstanceResolver, ResolveContext};
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use tracing::trace;

/// 一个结构体类型的全部注入字段
///
/// 每次装配都会重新推导，不做跨调用缓存。
#[derive(Debug, Clone)]
pub struct Injectable {
    /// 目标结构体类型
    pub target: TypeInfo,
    /// 按声明顺序排列的注入字段
    pub injections: Vec<Injection>,
}

impl Injectable {
    /// 从类型推导注入描述
    ///
    /// 带注入指令但不是 `pub` 的字段会导致 [`DependencyError::FieldNotExported`]。
    pub fn of<T: Wireable>() -> DependencyResult<Self> {
        let target = TypeInfo::of::<T>();
        let injections = T::injections();
        if let Some(hidden) = injections.iter().find(|injection| !injection.exported) {
            return Err(DependencyError::FieldNotExported {
                type_name: target.name.to_string(),
                field: hidden.name.to_string(),
            });
        }
        Ok(Self { target, injections })
    }

    /// 是否没有任何注入字段
    pub fn is_empty(&self) -> bool {
        self.injections.is_empty()
    }

    /// 对目标执行全部注入
    ///
    /// 解析器返回 `None` 时跳过该字段，保留字段原值；任何错误都会附加字段名称后立即返回。
    pub fn apply(
        &self,
        target: &mut dyn WireTarget,
        resolver: &dyn InstanceResolver,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<()> {
        let actual = target.target_type();
        if actual != self.target {
            return Err(DependencyError::not_coercible(self.target.name, actual.name));
        }

        for injection in &self.injections {
            let tag = injection.tag();
            let resolved = resolver
                .resolve_instance(&injection.field_type, &tag, ctx)
                .map_err(|e| DependencyError::resolving_field(injection.name, e))?;
            let Some(resolved) = resolved else {
                trace!(field = injection.name, "可选字段没有候选组件，保持原值");
                continue;
            };
            injection
                .apply(target, resolved)
                .map_err(|e| DependencyError::injecting_field(injection.name, e))?;
            trace!(field = injection.name, target = self.target.name, "字段注入完成");
        }
        Ok(())
    }
}
