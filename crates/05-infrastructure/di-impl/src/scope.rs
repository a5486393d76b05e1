//! 作用域
//!
//! 作用域保存注册项并负责字段装配。子作用域可以看到父作用域的注册项，
//! 但父作用域的组件总是按可选方式收集，缺失时不会报错。

use crate::registration::{Registered, Registration};
use crate::registrations::Registrations;
use di_abstractions::{
    ComponentRef, FieldType, InjectionSlot, InstanceResolver, ResolveContext, Resolved,
    ScopeConfig, ScopeStats, TagValue, WireTarget, Wireable,
};
use infrastructure_common::{BoxError, DependencyError, DependencyResult, TypeInfo};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 组件作用域
pub struct Scope {
    id: Uuid,
    config: ScopeConfig,
    parent: Option<Arc<Scope>>,
    registrations: RwLock<Registrations>,
}

impl Scope {
    /// 创建没有父作用域的根作用域
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// 作用域构建器
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    /// 创建子作用域
    pub fn child(parent: &Arc<Scope>) -> Self {
        Self::builder()
            .name(format!("{}.child", parent.name()))
            .max_resolution_depth(parent.config.max_resolution_depth)
            .parent(Arc::clone(parent))
            .build()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// 本作用域注册项的快照，不包含父作用域
    pub fn registrations(&self) -> Registrations {
        self.registrations.read().clone()
    }

    /// 统计信息
    pub fn stats(&self) -> ScopeStats {
        let registrations = self.registrations.read();
        let mut ancestors = 0;
        let mut current = self.parent.as_ref();
        while let Some(scope) = current {
            ancestors += 1;
            current = scope.parent.as_ref();
        }
        ScopeStats {
            registered_components: registrations.len(),
            active_singletons: registrations
                .iter()
                .filter(|registration| registration.is_instantiated())
                .count(),
            ancestors,
        }
    }

    /// 注册一个组件值
    ///
    /// 值在第一次被解析时装配，之后一直复用。
    #[track_caller]
    pub fn register<T: Wireable>(&self, value: T) -> DependencyResult<Registered<T>> {
        let registration = Registration::from_value(value)?;
        Ok(Registered::new(self.add(registration)))
    }

    /// 注册一个工厂函数，工厂最多成功执行一次
    #[track_caller]
    pub fn register_factory<T, F>(&self, factory: F) -> DependencyResult<Registered<T>>
    where
        T: Wireable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let registration = Registration::from_factory(factory)?;
        Ok(Registered::new(self.add(registration)))
    }

    /// 注册一个可能失败的工厂函数
    #[track_caller]
    pub fn register_fallible<T, E, F>(&self, factory: F) -> DependencyResult<Registered<T>>
    where
        T: Wireable,
        E: Into<BoxError>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let registration = Registration::from_fallible(factory)?;
        Ok(Registered::new(self.add(registration)))
    }

    /// 注册组件值，失败时 panic
    #[track_caller]
    pub fn must_register<T: Wireable>(&self, value: T) -> Registered<T> {
        match self.register(value) {
            Ok(registered) => registered,
            Err(e) => panic!("组件注册失败: {e}"),
        }
    }

    /// 注册工厂函数，失败时 panic
    #[track_caller]
    pub fn must_register_factory<T, F>(&self, factory: F) -> Registered<T>
    where
        T: Wireable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        match self.register_factory(factory) {
            Ok(registered) => registered,
            Err(e) => panic!("组件注册失败: {e}"),
        }
    }

    /// 注册可能失败的工厂函数，失败时 panic
    #[track_caller]
    pub fn must_register_fallible<T, E, F>(&self, factory: F) -> Registered<T>
    where
        T: Wireable,
        E: Into<BoxError>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        match self.register_fallible(factory) {
            Ok(registered) => registered,
            Err(e) => panic!("组件注册失败: {e}"),
        }
    }

    /// 装配目标结构体的全部注入字段
    ///
    /// 出现第一个错误时立即返回，之前已经注入的字段保持注入后的值。
    pub fn wire(&self, target: &mut dyn WireTarget) -> DependencyResult<()> {
        let mut ctx = ResolveContext::with_options(self.config.resolve_options());
        self.wire_target(target, &mut ctx)
    }

    /// 按顺序装配多个目标，遇到第一个错误时停止
    pub fn wire_all(&self, targets: &mut [&mut dyn WireTarget]) -> DependencyResult<()> {
        for target in targets.iter_mut() {
            self.wire(&mut **target)?;
        }
        Ok(())
    }

    /// 装配目标，失败时 panic
    #[track_caller]
    pub fn must_wire(&self, target: &mut dyn WireTarget) {
        if let Err(e) = self.wire(target) {
            panic!("组件装配失败: {e}");
        }
    }

    /// 装配多个目标，失败时 panic
    #[track_caller]
    pub fn must_wire_all(&self, targets: &mut [&mut dyn WireTarget]) {
        if let Err(e) = self.wire_all(targets) {
            panic!("组件装配失败: {e}");
        }
    }

    /// 直接解析单个组件，规则与 `Option<Arc<X>>` 字段相同
    pub fn resolve<X>(&self, tag: &TagValue) -> DependencyResult<Option<Arc<X>>>
    where
        X: ?Sized + Send + Sync + 'static,
    {
        self.resolve_slot(tag)
    }

    /// 直接解析全部组件，规则与 `Vec<Arc<X>>` 字段相同
    pub fn resolve_all<X>(&self, tag: &TagValue) -> DependencyResult<Vec<Arc<X>>>
    where
        X: ?Sized + Send + Sync + 'static,
    {
        self.resolve_slot(tag)
    }

    fn resolve_slot<S: InjectionSlot + Default>(&self, tag: &TagValue) -> DependencyResult<S> {
        let mut slot = S::default();
        let mut ctx = ResolveContext::with_options(self.config.resolve_options());
        if let Some(resolved) = self.resolve_instance(&S::field_type(), tag, &mut ctx)? {
            slot.assign(resolved)?;
        }
        Ok(slot)
    }

    fn add(&self, registration: Registration) -> Arc<Registration> {
        let registration = Arc::new(registration);
        info!(
            scope = %self.config.name,
            component = registration.component_type().name,
            source = registration.source(),
            "注册组件"
        );
        self.registrations.write().push(Arc::clone(&registration));
        registration
    }

    fn wire_target(
        &self,
        target: &mut dyn WireTarget,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<()> {
        let injectable = target.injectable()?;
        if injectable.is_empty() {
            return Ok(());
        }
        debug!(
            scope = %self.config.name,
            target = injectable.target.name,
            fields = injectable.injections.len(),
            "装配组件"
        );
        injectable.apply(target, self, ctx)
    }

    /// 收集本作用域与祖先作用域中的候选组件，并按优先级排序
    fn gather(
        &self,
        component: &TypeInfo,
        tag: &TagValue,
        identifier: &str,
    ) -> DependencyResult<Registrations> {
        let mut candidates = self.registrations.read().filter_coercible(component);
        if !tag.is_all_qualifier() {
            candidates = candidates.filter_qualifier(&tag.qualifier);
        }
        if let Some(parent) = &self.parent {
            candidates.extend(parent.gather(component, &tag.as_optional(), identifier)?);
        }

        let candidates = candidates.by_priority();
        if tag.required && candidates.is_empty() {
            return Err(DependencyError::NoCandidateFound {
                identifier: identifier.to_string(),
            });
        }
        Ok(candidates)
    }

    /// 获取候选组件的实例并转换为请求的类型
    ///
    /// 新创建的实例使用当前作用域装配。
    fn wired_instance(
        &self,
        registration: &Registration,
        component: &TypeInfo,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<ComponentRef> {
        if let Err(e) = ctx.push(registration.id(), registration.label()) {
            warn!(scope = %self.config.name, error = %e, "解析链中止");
            return Err(e);
        }
        let created = registration.get_instance_with(|target| self.wire_target(target, ctx));
        ctx.pop();

        let (instance, first) = created?;
        if first {
            debug!(component = %registration, "实例已创建并装配");
        }
        registration
            .coerce(instance, component)
            .ok_or_else(|| {
                DependencyError::not_coercible(component.name, registration.component_type().name)
            })
    }
}

impl InstanceResolver for Scope {
    fn resolve_instance(
        &self,
        field_type: &FieldType,
        tag: &TagValue,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<Option<Resolved>> {
        let component = field_type.component();
        let identifier = identifier(&component, tag);
        let candidates = self.gather(&component, tag, &identifier)?;

        if field_type.is_sequence() {
            debug!(identifier = %identifier, candidates = candidates.len(), "解析组件集合");
            let components = candidates
                .iter()
                .map(|candidate| self.wired_instance(candidate, &component, ctx))
                .collect::<DependencyResult<Vec<_>>>()?;
            return Ok(Some(Resolved::Many(components)));
        }

        let Some(priority) = candidates.best_priority() else {
            debug!(identifier = %identifier, "没有候选组件，跳过可选字段");
            return Ok(None);
        };
        let winners = candidates.filter_priority(priority);
        match winners.as_slice() {
            [winner] => {
                debug!(identifier = %identifier, winner = %winner, "选中候选组件");
                let component = self.wired_instance(winner, &component, ctx)?;
                Ok(Some(Resolved::One(component)))
            }
            tied => {
                warn!(
                    identifier = %identifier,
                    priority,
                    candidates = tied.len(),
                    "存在多个相同优先级的候选组件"
                );
                Err(DependencyError::AmbiguousCandidates {
                    priority,
                    identifier,
                    candidates: winners.descriptors(),
                })
            }
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.name().to_string()))
            .field("registrations", &self.registrations.read().len())
            .finish()
    }
}

fn identifier(component: &TypeInfo, tag: &TagValue) -> String {
    if tag.qualifier.is_empty() {
        component.to_string()
    } else {
        format!("{} with qualifier {}", component, tag.qualifier)
    }
}

/// 作用域构建器
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    config: ScopeConfig,
    parent: Option<Arc<Scope>>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置作用域名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// 使用完整配置，覆盖之前设置的名称
    pub fn config(mut self, config: ScopeConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置父作用域
    pub fn parent(mut self, parent: Arc<Scope>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 设置最大解析深度
    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.config.max_resolution_depth = depth;
        self
    }

    pub fn build(self) -> Scope {
        let scope = Scope {
            id: Uuid::new_v4(),
            config: self.config,
            parent: self.parent,
            registrations: RwLock::new(Registrations::new()),
        };
        debug!(scope = %scope.config.name, id = %scope.id, "创建作用域");
        scope
    }
}
