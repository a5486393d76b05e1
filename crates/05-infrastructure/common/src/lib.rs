//! # Infrastructure Common
//!
//! 这个 crate 提供了组件装配基础设施的公共定义。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] - 注册、解析与注入过程中的全部错误类型
//! - [`TypeInfo`] - 运行时类型标识（`TypeId` + 类型名称）
//!
//! ## 设计原则
//!
//! - 错误就地返回，不做本地恢复或重试
//! - 类型比较只依赖 `TypeId`，类型名称只用于诊断信息

pub mod errors;
pub mod metadata;

pub use errors::*;
pub use metadata::*;
