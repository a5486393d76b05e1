//! 元数据定义
//!
//! 提供组件和注入字段的运行时类型信息

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// 相等性只比较 `TypeId`，名称仅用于诊断输出。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 完整类型名称
    pub name: &'static str,
    /// 类型ID
    pub id: TypeId,
}

impl TypeInfo {
    /// 从类型获取类型信息，支持 `dyn Trait` 等非定长类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// 判断是否为类型 `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// 获取简短的类型名称（去掉每一段的模块路径）
    pub fn short_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                    result.push_str(&segment);
                    segment.clear();
                    result.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        result.push_str(&segment);
        result
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
