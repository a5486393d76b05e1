//! # Dependency Injection Abstractions
//!
//! 字段注入抽象层，定义注入元数据、注入指令语法和实例解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`TagValue`] - 解析字段上的注入指令（`optional`、`qualifier=<name>`）
//! - [`Wireable`] - 可被装配的目标结构体，通常由 `#[derive(Wireable)]` 生成
//! - [`Injection`] / [`Injectable`] - 单个字段与整个结构体的注入描述
//! - [`InstanceResolver`] - 为字段类型和指令解析组件实例
//! - [`ScopeConfig`] - 作用域配置

pub mod container;
pub mod injectable;
pub mod injection;
pub mod resolver;
pub mod slot;
pub mod tag;

pub use container::*;
pub use injectable::*;
pub use injection::*;
pub use resolver::*;
pub use slot::*;
pub use tag::*;

pub use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
