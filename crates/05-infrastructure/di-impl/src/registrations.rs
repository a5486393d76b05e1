//! 注册项集合
//!
//! 所有过滤操作都返回新集合，原集合保持不变。

use crate::registration::Registration;
use infrastructure_common::TypeInfo;
use std::fmt;
use std::sync::Arc;

/// 有序的注册项集合
#[derive(Debug, Clone, Default)]
pub struct Registrations(Vec<Arc<Registration>>);

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, registration: Arc<Registration>) {
        self.0.push(registration);
    }

    /// 追加另一个集合的全部注册项
    pub fn extend(&mut self, other: Registrations) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Registration>> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Registration>] {
        &self.0
    }

    /// 保留可以转换为目标类型的注册项
    pub fn filter_coercible(&self, target: &TypeInfo) -> Self {
        self.filter(|registration| registration.is_coercible_to(target))
    }

    /// 保留限定符完全相等的注册项
    pub fn filter_qualifier(&self, qualifier: &str) -> Self {
        self.filter(|registration| registration.qualifier() == qualifier)
    }

    /// 保留指定优先级的注册项
    pub fn filter_priority(&self, priority: i32) -> Self {
        self.filter(|registration| registration.priority() == priority)
    }

    /// 按优先级排序
    ///
    /// 优先级数值小的在前；优先级相同时无限定符的在前；其余保持原有顺序。
    pub fn by_priority(&self) -> Self {
        let mut sorted = self.0.clone();
        sorted.sort_by_cached_key(|registration| {
            (registration.priority(), registration.is_qualified())
        });
        Self(sorted)
    }

    /// 最高优先级（最小的优先级数值）
    pub fn best_priority(&self) -> Option<i32> {
        self.iter().map(|registration| registration.priority()).min()
    }

    /// 每个注册项的描述
    pub fn descriptors(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }

    fn filter(&self, predicate: impl Fn(&Registration) -> bool) -> Self {
        self.iter()
            .filter(|registration| predicate(registration))
            .cloned()
            .collect()
    }
}

impl FromIterator<Arc<Registration>> for Registrations {
    fn from_iter<I: IntoIterator<Item = Arc<Registration>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Registrations {
    type Item = Arc<Registration>;
    type IntoIter = std::vec::IntoIter<Arc<Registration>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Registrations {
    type Item = &'a Arc<Registration>;
    type IntoIter = std::slice::Iter<'a, Arc<Registration>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Registrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptors().join("\n\t"))
    }
}
