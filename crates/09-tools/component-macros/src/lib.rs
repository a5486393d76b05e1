//! # Component Macros
//!
//! 为可装配结构体生成注入元数据的过程宏。
//!
//! ## 核心宏
//!
//! - [`Wireable`](derive@Wireable) - 为结构体实现 `di_abstractions::Wireable`
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::Wireable;
//! use std::sync::Arc;
//!
//! #[derive(Wireable, Default)]
//! pub struct Player {
//!     #[inject]
//!     pub sport: Option<Arc<dyn Sport>>,
//!     #[inject(optional, qualifier = "soccer")]
//!     pub soccer: Option<Arc<dyn Sport>>,
//!     #[inject("qualifier=*")]
//!     pub all: Vec<Arc<dyn Sport>>,
//!     name: String,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod utils;
mod wireable;

/// 可装配结构体派生宏
///
/// 带 `#[inject]` 属性的字段会成为注入字段，字段类型必须是 `Option<Arc<X>>` 或 `Vec<Arc<X>>`。
///
/// # 参数
///
/// - `optional` - 没有候选组件时不报错
/// - `qualifier = "name"` - 只接受指定限定符的组件，`*` 表示任意限定符
///
/// 也可以直接写完整的指令字符串：`#[inject("optional,qualifier=name")]`。
/// 注入字段必须是 `pub`，否则注册或装配时返回 `FieldNotExported` 错误。
#[proc_macro_derive(Wireable, attributes(inject))]
pub fn derive_wireable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    wireable::derive_wireable_impl(input)
}
