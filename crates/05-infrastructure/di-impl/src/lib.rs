//! # 依赖注入具体实现
//!
//! 提供作用域、组件注册项和字段装配的具体实现。
//!
//! ```rust,ignore
//! use component_macros::Wireable;
//! use di_impl::Scope;
//! use std::sync::Arc;
//!
//! trait Sport: Send + Sync {}
//!
//! #[derive(Wireable)]
//! struct Squash;
//! impl Sport for Squash {}
//!
//! #[derive(Wireable, Default)]
//! struct Player {
//!     #[inject]
//!     pub sport: Option<Arc<dyn Sport>>,
//! }
//!
//! let scope = Scope::new();
//! scope.register(Squash)?.implements::<dyn Sport>(|c| c);
//!
//! let mut player = Player::default();
//! scope.wire(&mut player)?;
//! ```
//!
//! ## 解析规则
//!
//! - 候选组件先按类型过滤，再按限定符过滤（`qualifier=*` 匹配全部限定符）
//! - 父作用域的候选组件总是按可选方式收集
//! - 排序：优先级数值小的在前，相同优先级时无限定符的在前，其余保持注册顺序
//! - 单值字段取最高优先级；最高优先级上存在多个候选时报告歧义
//! - 集合字段按排序结果注入全部候选

pub mod registration;
pub mod registrations;
pub mod scope;

pub use registration::{Registered, Registration, SharedInstance};
pub use registrations::Registrations;
pub use scope::{Scope, ScopeBuilder};

pub use di_abstractions::{ScopeConfig, ScopeStats, TagValue, WireTarget, Wireable};
pub use infrastructure_common::{DependencyError, DependencyResult};
