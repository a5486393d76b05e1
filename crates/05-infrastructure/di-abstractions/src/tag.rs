//! 注入指令解析
//!
//! 指令是逗号分隔的列表，可识别的片段：
//!
//! - 空字符串 - 必需注入，不带限定符
//! - `optional` - 可选注入，没有候选组件时保持字段原值
//! - `qualifier=<name>` - 按限定符精确匹配，`*` 匹配所有限定符
//!
//! 无法识别的片段会被忽略，解析永远不会失败。

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// 字段属性名称
pub const TAG_KEY: &str = "inject";
/// 限定符前缀
pub const TAG_PREFIX_QUALIFIER: &str = "qualifier=";
/// 可选注入标记
pub const TAG_VALUE_OPTIONAL: &str = "optional";
/// 匹配所有限定符的通配符
pub const ALL_QUALIFIERS: &str = "*";

/// 解析后的注入指令
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagValue {
    /// 限定符，空字符串表示未限定
    pub qualifier: String,
    /// 是否至少需要一个候选组件
    pub required: bool,
}

impl TagValue {
    /// 从指令字符串解析
    pub fn parse(directive: &str) -> Self {
        let mut result = Self::default();
        for part in directive.split(',') {
            if part == TAG_VALUE_OPTIONAL {
                result.required = false;
            } else if let Some(qualifier) = part.strip_prefix(TAG_PREFIX_QUALIFIER) {
                result.qualifier = qualifier.to_string();
            }
        }
        result
    }

    /// 带限定符的必需指令
    pub fn qualified(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            required: true,
        }
    }

    /// 返回一个 `required = false` 的副本
    pub fn as_optional(&self) -> Self {
        Self {
            qualifier: self.qualifier.clone(),
            required: false,
        }
    }

    /// 是否为通配限定符
    pub fn is_all_qualifier(&self) -> bool {
        self.qualifier == ALL_QUALIFIERS
    }
}

impl Default for TagValue {
    fn default() -> Self {
        Self {
            qualifier: String::new(),
            required: true,
        }
    }
}

impl FromStr for TagValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if !self.qualifier.is_empty() {
            parts.push(format!("{}{}", TAG_PREFIX_QUALIFIER, self.qualifier));
        }
        if !self.required {
            parts.push(TAG_VALUE_OPTIONAL.to_string());
        }
        f.write_str(&parts.join(","))
    }
}
