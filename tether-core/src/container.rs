//! 依赖解析容器
//!
//! 容器维护三张表：
//! - 绑定表：key → 实例或工厂
//! - 实例缓存：key → 已解析的实例
//! - 类型注册表：key → 构造参数声明与构造函数（链接期注册在首次使用时记忆化）
//!
//! 每一次顶层 `get` 都会创建一个 [`Resolver`]，解析栈只属于这一次调用。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::{ContainerError, ContainerResult};
use crate::injectable::{
    type_key, Argument, Arguments, Injectable, Instance, ParamKind, Parameter, TypeRegistration,
};
use crate::utils::dependency::ResolutionStack;

/// 工厂函数，通过 [`Resolver`] 解析自身依赖
pub type Factory = Arc<dyn Fn(&mut Resolver<'_>) -> ContainerResult<Instance> + Send + Sync>;

/// 构造函数（类型擦除）
pub type Constructor = Arc<dyn Fn(&Arguments) -> ContainerResult<Instance> + Send + Sync>;

/// 显式绑定
#[derive(Clone)]
pub enum Binding {
    /// 已存在的实例，绑定时同时写入实例缓存
    Instance(Instance),
    /// 延迟工厂，最多调用一次，结果缓存
    Factory(Factory),
}

impl Binding {
    pub fn instance<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Binding::Instance(instance)
    }

    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        Binding::Factory(Arc::new(move |resolver: &mut Resolver<'_>| -> ContainerResult<Instance> {
            let instance: Instance = Arc::new(factory(resolver)?);
            Ok(instance)
        }))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Instance(_) => write!(f, "Binding::Instance"),
            Binding::Factory(_) => write!(f, "Binding::Factory"),
        }
    }
}

/// 可自动解析类型的构造信息
#[derive(Clone)]
pub struct Provider {
    parameters: Arc<[Parameter]>,
    construct: Constructor,
}

impl Provider {
    pub fn new<F>(parameters: Vec<Parameter>, construct: F) -> Self
    where
        F: Fn(&Arguments) -> ContainerResult<Instance> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into(),
            construct: Arc::new(construct),
        }
    }

    pub fn of<T: Injectable>() -> Self {
        Self::from_registration(&TypeRegistration::of::<T>())
    }

    fn from_registration(registration: &TypeRegistration) -> Self {
        Self {
            parameters: (registration.parameters)().into(),
            construct: Arc::new(registration.construct),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    pub bindings: usize,
    pub cached_instances: usize,
    pub registered_types: usize,
}

/// 依赖解析容器
pub struct Container {
    bindings: RwLock<HashMap<String, Binding>>,
    instances: RwLock<HashMap<String, Instance>>,
    providers: RwLock<HashMap<String, Provider>>,
    seeded: AtomicBool,
}

impl Container {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            providers: RwLock::new(HashMap::new()),
            seeded: AtomicBool::new(false),
        }
    }

    /// 绑定 key，替换已有绑定
    ///
    /// 实例绑定同时写入实例缓存；工厂绑定会清除该 key 的旧缓存，
    /// 保证下一次 `get` 调用新工厂。
    pub fn bind(&self, key: impl Into<String>, binding: Binding) {
        let key = key.into();
        let mut bindings = self.bindings.write();
        let mut instances = self.instances.write();

        match &binding {
            Binding::Instance(instance) => {
                instances.insert(key.clone(), Arc::clone(instance));
            }
            Binding::Factory(_) => {
                instances.remove(&key);
            }
        }

        tracing::debug!(key = %key, binding = ?binding, "Bound key");
        bindings.insert(key, binding);
    }

    /// 以类型 key 绑定实例
    pub fn bind_instance<T: Any + Send + Sync>(&self, instance: Arc<T>) {
        self.bind(type_key::<T>(), Binding::instance(instance));
    }

    /// 以类型 key 绑定工厂
    pub fn bind_factory<T, F>(&self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.bind(type_key::<T>(), Binding::factory(factory));
    }

    /// 注册可自动解析的类型
    pub fn register<T: Injectable>(&self) {
        self.register_provider(type_key::<T>(), Provider::of::<T>());
    }

    /// 以任意 key 注册构造信息
    pub fn register_provider(&self, key: impl Into<String>, provider: Provider) {
        self.seed_registrations();
        let key = key.into();
        tracing::debug!(key = %key, parameters = provider.parameters.len(), "Registered type");
        self.providers.write().insert(key, provider);
    }

    /// 解析 key
    pub fn get(&self, key: &str) -> ContainerResult<Instance> {
        Resolver::new(self).get(key)
    }

    /// 按类型解析
    pub fn resolve<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        Resolver::new(self).resolve::<T>()
    }

    /// 按任意 key 解析并转换为 `T`
    pub fn resolve_key<T: Any + Send + Sync>(&self, key: &str) -> ContainerResult<Arc<T>> {
        Resolver::new(self).resolve_key::<T>(key)
    }

    /// 是否已绑定、已缓存或类型已注册，不会触发解析
    pub fn has(&self, key: &str) -> bool {
        self.bindings.read().contains_key(key)
            || self.instances.read().contains_key(key)
            || self.provider(key).is_some()
    }

    /// 清空绑定、实例缓存和记忆化的类型注册表
    pub fn clear(&self) {
        let mut bindings = self.bindings.write();
        let mut instances = self.instances.write();
        let mut providers = self.providers.write();

        bindings.clear();
        instances.clear();
        providers.clear();
        self.seeded.store(false, Ordering::Release);

        tracing::debug!("Container cleared");
    }

    pub fn stats(&self) -> ContainerStats {
        self.seed_registrations();
        ContainerStats {
            bindings: self.bindings.read().len(),
            cached_instances: self.instances.read().len(),
            registered_types: self.providers.read().len(),
        }
    }

    /// 已缓存实例的 key，按字典序
    pub fn cached_instances(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.instances.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn cached(&self, key: &str) -> Option<Instance> {
        self.instances.read().get(key).cloned()
    }

    /// 写入实例缓存；并发首次解析时先写入者胜出
    fn store(&self, key: &str, instance: Instance) -> Instance {
        let mut instances = self.instances.write();
        Arc::clone(instances.entry(key.to_string()).or_insert(instance))
    }

    fn provider(&self, key: &str) -> Option<Provider> {
        self.seed_registrations();
        self.providers.read().get(key).cloned()
    }

    /// 将链接期注册的类型记忆化到注册表中，已有的运行时注册优先
    fn seed_registrations(&self) {
        if self.seeded.load(Ordering::Acquire) {
            return;
        }

        let mut providers = self.providers.write();
        if self.seeded.load(Ordering::Acquire) {
            return;
        }

        let mut seeded = 0usize;
        for registration in inventory::iter::<TypeRegistration> {
            providers
                .entry((registration.key)().to_string())
                .or_insert_with(|| Provider::from_registration(registration));
            seeded += 1;
        }
        self.seeded.store(true, Ordering::Release);

        tracing::debug!(count = seeded, "Loaded link-time type registrations");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.read().len())
            .field("cached_instances", &self.instances.read().len())
            .field("registered_types", &self.providers.read().len())
            .finish()
    }
}

/// 一次顶层解析的上下文，持有本次调用的解析栈
pub struct Resolver<'c> {
    container: &'c Container,
    stack: ResolutionStack,
}

impl<'c> Resolver<'c> {
    pub fn new(container: &'c Container) -> Self {
        Self {
            container,
            stack: ResolutionStack::new(),
        }
    }

    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// 当前正在解析的 key
    pub fn stack(&self) -> &[String] {
        self.stack.path()
    }

    /// 解析顺序：显式绑定 → 实例缓存 → 循环检测 → 自动解析
    pub fn get(&mut self, key: &str) -> ContainerResult<Instance> {
        let binding = self.container.bindings.read().get(key).cloned();

        match binding {
            Some(Binding::Instance(instance)) => return Ok(instance),
            Some(Binding::Factory(factory)) => {
                if let Some(instance) = self.container.cached(key) {
                    tracing::trace!(key, "Returning cached factory result");
                    return Ok(instance);
                }

                self.enter(key)?;
                tracing::debug!(key, "Invoking factory");
                let result = factory(self);
                self.stack.leave(key);

                return Ok(self.container.store(key, result?));
            }
            None => {}
        }

        if let Some(instance) = self.container.cached(key) {
            tracing::trace!(key, "Returning cached instance");
            return Ok(instance);
        }

        self.enter(key)?;
        let result = self.auto_resolve(key);
        self.stack.leave(key);

        Ok(self.container.store(key, result?))
    }

    pub fn resolve<T: Any + Send + Sync>(&mut self) -> ContainerResult<Arc<T>> {
        self.resolve_key::<T>(type_key::<T>())
    }

    pub fn resolve_key<T: Any + Send + Sync>(&mut self, key: &str) -> ContainerResult<Arc<T>> {
        self.get(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_string(),
                expected: type_key::<T>(),
            })
    }

    fn enter(&mut self, key: &str) -> ContainerResult<()> {
        self.stack
            .enter(key)
            .map_err(|path| ContainerError::CircularDependency { path })
    }

    fn auto_resolve(&mut self, key: &str) -> ContainerResult<Instance> {
        let provider = self
            .container
            .provider(key)
            .ok_or_else(|| ContainerError::UnknownType {
                key: key.to_string(),
            })?;

        tracing::debug!(key, depth = self.stack.depth(), "Auto-resolving type");

        let args = self.bind_parameters(key, provider.parameters())?;
        (provider.construct)(&args)
    }

    fn bind_parameters(&mut self, owner: &str, parameters: &[Parameter]) -> ContainerResult<Arguments> {
        let mut args = Arguments::new(owner);

        for parameter in parameters {
            let argument = match parameter.kind() {
                ParamKind::Service(dependency) => match self.get(dependency) {
                    Ok(instance) => Argument::Instance(instance),
                    Err(err) => match parameter.default() {
                        Some(default) => {
                            tracing::warn!(
                                owner,
                                parameter = parameter.name(),
                                error = %err,
                                "Dependency unavailable, using declared default"
                            );
                            default.to_argument()
                        }
                        None => return Err(wrap_parameter_error(owner, parameter, err)),
                    },
                },
                ParamKind::Value(_) | ParamKind::Untyped => match parameter.default() {
                    Some(default) => default.to_argument(),
                    None => {
                        return Err(ContainerError::UnresolvableParameter {
                            owner: owner.to_string(),
                            parameter: parameter.name().to_string(),
                            source: None,
                        })
                    }
                },
            };

            args.push(parameter.name(), argument);
        }

        Ok(args)
    }
}

/// 为嵌套失败附加参数上下文；循环依赖保持原样以保留完整路径
fn wrap_parameter_error(owner: &str, parameter: &Parameter, err: ContainerError) -> ContainerError {
    match err {
        ContainerError::CircularDependency { .. } => err,
        other => ContainerError::UnresolvableParameter {
            owner: owner.to_string(),
            parameter: parameter.name().to_string(),
            source: Some(Box::new(other)),
        },
    }
}
