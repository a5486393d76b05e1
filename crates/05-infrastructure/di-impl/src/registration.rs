//! 组件注册项
//!
//! 一个注册项对应一个组件：工厂函数、声明类型、限定符、优先级以及缓存的实例。
//! 工厂成功执行后实例即被固定，之后的解析都返回同一个实例。

use di_abstractions::{ComponentRef, Injectable, WireTarget, Wireable};
use infrastructure_common::{BoxError, DependencyError, DependencyResult, TypeInfo};
use parking_lot::{Condvar, Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};
use uuid::Uuid;

/// 共享的组件实例，内部保存组件的具体类型
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn Fn() -> Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync>;
type Caster = Arc<dyn Fn(SharedInstance) -> Option<ComponentRef> + Send + Sync>;
type TargetFn = fn(&mut (dyn Any + Send + Sync)) -> Option<&mut dyn WireTarget>;

/// 注册项可以转换到的目标类型
struct Coercion {
    target: TypeInfo,
    cast: Caster,
}

impl Coercion {
    fn identity<T: Send + Sync + 'static>() -> Self {
        Self {
            target: TypeInfo::of::<Arc<T>>(),
            cast: Arc::new(|instance: SharedInstance| {
                instance
                    .downcast::<T>()
                    .ok()
                    .map(|component| Box::new(component) as ComponentRef)
            }),
        }
    }

    fn interface<T, I>(cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            target: TypeInfo::of::<Arc<I>>(),
            cast: Arc::new(move |instance: SharedInstance| {
                instance
                    .downcast::<T>()
                    .ok()
                    .map(|component| Box::new(cast(component)) as ComponentRef)
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Settings {
    qualifier: String,
    priority: i32,
}

enum SlotState {
    Empty,
    Creating(ThreadId),
    Ready(SharedInstance),
}

/// 组件注册信息
pub struct Registration {
    id: Uuid,
    component_type: TypeInfo,
    source: String,
    settings: RwLock<Settings>,
    coercions: RwLock<Vec<Coercion>>,
    factory: Factory,
    wire_target: TargetFn,
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Registration {
    /// 注册一个组件值
    ///
    /// 组件类型自身的注入元数据无效时返回 [`DependencyError::InvalidComponentType`]。
    #[track_caller]
    pub fn from_value<T: Wireable>(value: T) -> DependencyResult<Self> {
        let location = Location::caller();
        Injectable::of::<T>().map_err(|e| DependencyError::InvalidComponentType {
            type_name: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })?;

        let value = Mutex::new(Some(value));
        let factory: Factory = Box::new(move || {
            value
                .lock()
                .take()
                .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
                .ok_or_else(|| BoxError::from("组件值已被取出"))
        });
        Ok(Self::new::<T>(factory, location))
    }

    /// 注册一个无参工厂函数
    ///
    /// 结果类型自身的注入元数据无效时返回 [`DependencyError::InvalidResultType`]。
    #[track_caller]
    pub fn from_factory<T, F>(factory: F) -> DependencyResult<Self>
    where
        T: Wireable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let location = Location::caller();
        Self::validate_result_type::<T>()?;
        let factory: Factory = Box::new(move || {
            Ok::<_, BoxError>(Box::new(factory()) as Box<dyn Any + Send + Sync>)
        });
        Ok(Self::new::<T>(factory, location))
    }

    /// 注册一个可能失败的无参工厂函数，工厂返回的错误原样保留
    #[track_caller]
    pub fn from_fallible<T, E, F>(factory: F) -> DependencyResult<Self>
    where
        T: Wireable,
        E: Into<BoxError>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let location = Location::caller();
        Self::validate_result_type::<T>()?;
        let factory: Factory = Box::new(move || {
            factory()
                .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
                .map_err(Into::<BoxError>::into)
        });
        Ok(Self::new::<T>(factory, location))
    }

    fn validate_result_type<T: Wireable>() -> DependencyResult<()> {
        Injectable::of::<T>()
            .map(|_| ())
            .map_err(|e| DependencyError::InvalidResultType {
                type_name: std::any::type_name::<T>().to_string(),
                message: e.to_string(),
            })
    }

    fn new<T: Wireable>(factory: Factory, location: &'static Location<'static>) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_type: TypeInfo::of::<T>(),
            source: format!("{}:{}:{}", location.file(), location.line(), location.column()),
            settings: RwLock::new(Settings {
                qualifier: String::new(),
                priority: 0,
            }),
            coercions: RwLock::new(vec![Coercion::identity::<T>()]),
            factory,
            wire_target: as_wire_target::<T>,
            state: Mutex::new(SlotState::Empty),
            ready: Condvar::new(),
        }
    }

    /// 注册项标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 组件声明类型
    pub fn component_type(&self) -> TypeInfo {
        self.component_type
    }

    /// 注册位置（file:line:column）
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 限定符
    pub fn qualifier(&self) -> String {
        self.settings.read().qualifier.clone()
    }

    /// 是否带限定符
    pub fn is_qualified(&self) -> bool {
        !self.settings.read().qualifier.is_empty()
    }

    /// 优先级，数值越小优先级越高
    pub fn priority(&self) -> i32 {
        self.settings.read().priority
    }

    /// 设置限定符，返回同一个注册项以便链式调用
    pub fn with_qualifier(&self, qualifier: impl Into<String>) -> &Self {
        self.settings.write().qualifier = qualifier.into();
        self
    }

    /// 设置优先级，返回同一个注册项以便链式调用
    pub fn with_priority(&self, priority: i32) -> &Self {
        self.settings.write().priority = priority;
        self
    }

    /// 是否可以转换为目标类型
    pub fn is_coercible_to(&self, target: &TypeInfo) -> bool {
        self.coercions
            .read()
            .iter()
            .any(|coercion| coercion.target == *target)
    }

    /// 所有可转换的目标类型
    pub fn coercible_types(&self) -> Vec<TypeInfo> {
        self.coercions.read().iter().map(|c| c.target).collect()
    }

    /// 将实例转换为目标类型的组件引用
    pub fn coerce(&self, instance: SharedInstance, target: &TypeInfo) -> Option<ComponentRef> {
        let cast = self
            .coercions
            .read()
            .iter()
            .find(|coercion| coercion.target == *target)
            .map(|coercion| Arc::clone(&coercion.cast))?;
        cast(instance)
    }

    /// 是否已经创建实例
    pub fn is_instantiated(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Ready(_))
    }

    /// 简短标签，用于解析链
    pub fn label(&self) -> String {
        let settings = self.settings.read();
        let name = self.component_type.short_name();
        if settings.qualifier.is_empty() {
            name
        } else {
            format!("{}({})", name, settings.qualifier)
        }
    }

    /// 获取实例，返回 `(实例, 是否首次创建)`
    ///
    /// 工厂最多成功执行一次；失败时不缓存，之后的调用会重新尝试。
    pub fn get_instance(&self) -> DependencyResult<(SharedInstance, bool)> {
        self.get_instance_with(|_| Ok(()))
    }

    /// 获取实例，首次创建时在发布实例之前执行装配
    ///
    /// 工厂成功后实例总会被缓存，即使装配失败或 panic（装配错误仍会返回）。
    pub fn get_instance_with<W>(&self, wire: W) -> DependencyResult<(SharedInstance, bool)>
    where
        W: FnOnce(&mut dyn WireTarget) -> DependencyResult<()>,
    {
        let current = thread::current().id();
        {
            let mut state = self.state.lock();
            loop {
                let owner = match &*state {
                    SlotState::Ready(instance) => return Ok((Arc::clone(instance), false)),
                    SlotState::Creating(owner) => *owner,
                    SlotState::Empty => break,
                };
                if owner == current {
                    return Err(DependencyError::CyclicDependency {
                        chain: format!("{} -> {}", self.label(), self.label()),
                    });
                }
                // 其他线程正在创建，等待其完成
                self.ready.wait(&mut state);
            }
            *state = SlotState::Creating(current);
        }

        let mut guard = CreationGuard {
            registration: self,
            instance: None,
        };
        debug!(component = %self, "调用组件工厂");
        let instance = match (self.factory)() {
            Ok(instance) => instance,
            Err(source) => {
                drop(guard);
                return Err(DependencyError::InstanceCreationFailed {
                    component: self.to_string(),
                    source,
                });
            }
        };

        // 新建的 Arc 只有一个引用，装配期间可以取得可变引用
        let created = guard.instance.insert(Arc::from(instance));
        let wired = match Arc::get_mut(created).and_then(|i| (self.wire_target)(i)) {
            Some(target) => wire(target),
            None => Err(DependencyError::not_coercible(
                self.component_type.name,
                "created instance",
            )),
        };
        let shared = Arc::clone(created);
        drop(guard);
        trace!(component = %self, "实例已缓存");
        wired.map(|()| (shared, true))
    }

    fn add_coercion(&self, coercion: Coercion) {
        let mut coercions = self.coercions.write();
        coercions.retain(|existing| existing.target != coercion.target);
        coercions.push(coercion);
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings.read();
        write!(f, "component {}", self.component_type)?;
        if !settings.qualifier.is_empty() {
            write!(f, "({})", settings.qualifier)?;
        }
        write!(
            f,
            " with priority {} registered at: {}",
            settings.priority, self.source
        )
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings.read().clone();
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("component_type", &self.component_type.name)
            .field("qualifier", &settings.qualifier)
            .field("priority", &settings.priority)
            .field("source", &self.source)
            .field("factory", &"<function>")
            .finish()
    }
}

fn as_wire_target<T: Wireable>(
    instance: &mut (dyn Any + Send + Sync),
) -> Option<&mut dyn WireTarget> {
    instance
        .downcast_mut::<T>()
        .map(|component| component as &mut dyn WireTarget)
}

/// 创建过程中持有槽位，被丢弃时发布结果
///
/// 工厂已成功时实例被缓存，即使装配中途 panic；工厂失败或 panic 时槽位恢复为空。
struct CreationGuard<'a> {
    registration: &'a Registration,
    instance: Option<SharedInstance>,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let state = match self.instance.take() {
            Some(instance) => SlotState::Ready(instance),
            None => SlotState::Empty,
        };
        *self.registration.state.lock() = state;
        self.registration.ready.notify_all();
    }
}

/// 带组件类型的注册项句柄
///
/// 所有设置方法修改的都是同一个注册项，并返回句柄本身以便链式调用。
pub struct Registered<T> {
    registration: Arc<Registration>,
    component: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Registered<T> {
    pub(crate) fn new(registration: Arc<Registration>) -> Self {
        Self {
            registration,
            component: PhantomData,
        }
    }

    /// 设置限定符
    pub fn with_qualifier(self, qualifier: impl Into<String>) -> Self {
        self.registration.with_qualifier(qualifier);
        self
    }

    /// 设置优先级
    pub fn with_priority(self, priority: i32) -> Self {
        self.registration.with_priority(priority);
        self
    }

    /// 声明组件满足接口 `I`，之后可以注入到 `Arc<I>` 字段
    ///
    /// ```rust,ignore
    /// scope.register(Squash::default())?.implements::<dyn Sport>(|c| c);
    /// ```
    pub fn implements<I>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.registration.add_coercion(Coercion::interface(cast));
        self
    }

    /// 底层注册项
    pub fn registration(&self) -> &Arc<Registration> {
        &self.registration
    }
}

impl<T> Clone for Registered<T> {
    fn clone(&self) -> Self {
        Self {
            registration: Arc::clone(&self.registration),
            component: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Registered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.registration, f)
    }
}
