//! 注入槽位
//!
//! 可注入字段的类型必须实现 [`InjectionSlot`]：
//!
//! - `Option<Arc<X>>` - 单值请求，零值为 `None`
//! - `Vec<Arc<X>>` - 集合请求，元素类型为 `Arc<X>`，零值为空集合
//!
//! `X` 可以是具体类型，也可以是 `dyn Trait`。

use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的组件引用，内部保存目标字段需要的 `Arc<X>`
pub type ComponentRef = Box<dyn Any + Send>;

/// 字段请求的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 单值请求
    Single(TypeInfo),
    /// 集合请求
    Sequence {
        /// 集合本身的类型
        sequence: TypeInfo,
        /// 元素类型
        element: TypeInfo,
    },
}

impl FieldType {
    /// 字段声明的类型
    pub fn declared(&self) -> TypeInfo {
        match self {
            Self::Single(info) => *info,
            Self::Sequence { sequence, .. } => *sequence,
        }
    }

    /// 参与候选过滤的组件类型，集合请求取元素类型
    pub fn component(&self) -> TypeInfo {
        match self {
            Self::Single(info) => *info,
            Self::Sequence { element, .. } => *element,
        }
    }

    /// 是否为集合请求
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.declared(), f)
    }
}

/// 解析结果
pub enum Resolved {
    /// 单值请求的唯一胜出者
    One(ComponentRef),
    /// 集合请求的全部候选，按优先级排序
    Many(Vec<ComponentRef>),
}

impl Resolved {
    fn describe(&self) -> &'static str {
        match self {
            Self::One(_) => "single component",
            Self::Many(_) => "component sequence",
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(_) => f.write_str("Resolved::One(..)"),
            Self::Many(items) => write!(f, "Resolved::Many(len = {})", items.len()),
        }
    }
}

/// 可注入字段类型
pub trait InjectionSlot: Any + Send + Sync {
    /// 字段请求的类型
    fn field_type() -> FieldType;

    /// 将解析结果写入字段
    fn assign(&mut self, resolved: Resolved) -> DependencyResult<()>;
}

impl<X> InjectionSlot for Option<Arc<X>>
where
    X: ?Sized + Send + Sync + 'static,
{
    fn field_type() -> FieldType {
        FieldType::Single(TypeInfo::of::<Arc<X>>())
    }

    fn assign(&mut self, resolved: Resolved) -> DependencyResult<()> {
        match resolved {
            Resolved::One(component) => {
                *self = Some(downcast_component::<Arc<X>>(component)?);
                Ok(())
            }
            other => Err(DependencyError::not_coercible(
                std::any::type_name::<Self>(),
                other.describe(),
            )),
        }
    }
}

impl<X> InjectionSlot for Vec<Arc<X>>
where
    X: ?Sized + Send + Sync + 'static,
{
    fn field_type() -> FieldType {
        FieldType::Sequence {
            sequence: TypeInfo::of::<Self>(),
            element: TypeInfo::of::<Arc<X>>(),
        }
    }

    fn assign(&mut self, resolved: Resolved) -> DependencyResult<()> {
        match resolved {
            Resolved::Many(components) => {
                *self = components
                    .into_iter()
                    .map(downcast_component::<Arc<X>>)
                    .collect::<DependencyResult<Vec<_>>>()?;
                Ok(())
            }
            other => Err(DependencyError::not_coercible(
                std::any::type_name::<Self>(),
                other.describe(),
            )),
        }
    }
}

/// 将组件引用还原为具体的 `Arc<X>`
pub fn downcast_component<C: Any>(component: ComponentRef) -> DependencyResult<C> {
    component
        .downcast::<C>()
        .map(|boxed| *boxed)
        .map_err(|_| {
            DependencyError::not_coercible(std::any::type_name::<C>(), "resolved component")
        })
}
