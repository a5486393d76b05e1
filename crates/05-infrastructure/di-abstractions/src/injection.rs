//! 字段注入描述
//!
//! 提供单个字段的注入元数据以及按字段名称写入解析结果的能力

use crate::injectable::Injectable;
use crate::slot::{FieldType, InjectionSlot, Resolved};
use crate::tag::TagValue;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::Any;
use std::fmt;

/// 可被装配的目标结构体
///
/// 通常由 `#[derive(Wireable)]` 生成。没有注入字段的组件可以直接使用默认实现：
///
/// ```rust
/// use di_abstractions::Wireable;
///
/// struct Clock;
///
/// impl Wireable for Clock {}
/// ```
pub trait Wireable: Send + Sync + 'static {
    /// 按声明顺序列出所有带注入指令的字段
    fn injections() -> Vec<Injection>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// 按名称定位字段
    fn field_mut(&mut self, _name: &str) -> Option<&mut dyn Any> {
        None
    }
}

/// 类型擦除后的装配目标
///
/// 对所有 [`Wireable`] 自动实现，用于一次装配多个不同类型的目标。
pub trait WireTarget {
    /// 目标的具体类型
    fn target_type(&self) -> TypeInfo;

    /// 根据目标类型推导注入描述
    fn injectable(&self) -> DependencyResult<Injectable>;

    /// 按名称定位字段
    fn locate_field(&mut self, name: &str) -> Option<&mut dyn Any>;
}

impl<T: Wireable> WireTarget for T {
    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn injectable(&self) -> DependencyResult<Injectable> {
        Injectable::of::<T>()
    }

    fn locate_field(&mut self, name: &str) -> Option<&mut dyn Any> {
        Wireable::field_mut(self, name)
    }
}

type AssignFn = fn(&mut dyn Any, Resolved) -> DependencyResult<()>;

/// 单个字段的注入描述
#[derive(Clone, Copy)]
pub struct Injection {
    /// 字段名称
    pub name: &'static str,
    /// 字段请求的类型
    pub field_type: FieldType,
    /// 原始注入指令
    pub directive: &'static str,
    /// 字段是否对外可见（`pub`）
    pub exported: bool,
    assign: AssignFn,
}

impl Injection {
    /// 为类型为 `S` 的字段创建注入描述
    pub fn new<S: InjectionSlot>(
        name: &'static str,
        directive: &'static str,
        exported: bool,
    ) -> Self {
        Self {
            name,
            field_type: S::field_type(),
            directive,
            exported,
            assign: assign_slot::<S>,
        }
    }

    /// 解析注入指令
    pub fn tag(&self) -> TagValue {
        TagValue::parse(self.directive)
    }

    /// 将解析结果写入目标上的同名字段
    pub fn apply(&self, target: &mut dyn WireTarget, value: Resolved) -> DependencyResult<()> {
        let target_type = target.target_type();
        let field = target
            .locate_field(self.name)
            .ok_or_else(|| DependencyError::FieldNotFound {
                type_name: target_type.name.to_string(),
                field: self.name.to_string(),
            })?;
        (self.assign)(field, value)
    }
}

impl fmt::Debug for Injection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injection")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("directive", &self.directive)
            .field("exported", &self.exported)
            .finish()
    }
}

fn assign_slot<S: InjectionSlot>(field: &mut dyn Any, value: Resolved) -> DependencyResult<()> {
    let slot = field.downcast_mut::<S>().ok_or_else(|| {
        DependencyError::not_coercible("declared field type", std::any::type_name::<S>())
    })?;
    slot.assign(value)
}
