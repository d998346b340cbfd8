//! 请求拦截器模块
//!
//! 拦截器在处理器之前按注册顺序执行，每个拦截器拿到一个 [`Next`]，
//! 调用它会继续执行链上的下一个拦截器（最后是处理器）；不调用则短路，
//! 由拦截器自己的返回值作为分发结果。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tether_core::{type_key, Instance};

use crate::request::RequestContext;
use crate::response::HandlerResult;

/// 处理器拦截器 trait
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 处理请求；调用 `next.run(ctx)` 继续执行后续链路
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult;
}

type Continuation<'a> = Box<dyn FnOnce(&mut RequestContext) -> HandlerResult + 'a>;

/// 链上剩余部分的延续
pub struct Next<'a> {
    continuation: Continuation<'a>,
}

impl<'a> Next<'a> {
    fn new(continuation: Continuation<'a>) -> Self {
        Self { continuation }
    }

    /// 执行下一个拦截器或处理器
    pub fn run(self, ctx: &mut RequestContext) -> HandlerResult {
        (self.continuation)(ctx)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// 从右向左折叠拦截器，得到最外层的延续并执行
///
/// 最内层是 `handler`；执行顺序与 `interceptors` 的顺序一致。
pub fn execute_chain<'a, H>(
    interceptors: &'a [Arc<dyn Interceptor>],
    ctx: &mut RequestContext,
    handler: H,
) -> HandlerResult
where
    H: FnOnce(&mut RequestContext) -> HandlerResult + 'a,
{
    let mut chain: Continuation<'a> = Box::new(handler);

    for interceptor in interceptors.iter().rev() {
        let next = Next::new(chain);
        chain = Box::new(move |ctx: &mut RequestContext| {
            tracing::trace!(interceptor = interceptor.name(), "Entering interceptor");
            interceptor.handle(ctx, next)
        });
    }

    chain(ctx)
}

type Caster = fn(Instance) -> Option<Arc<dyn Interceptor>>;

fn cast<T: Interceptor + Any>(instance: Instance) -> Option<Arc<dyn Interceptor>> {
    let interceptor: Arc<dyn Interceptor> = instance.downcast::<T>().ok()?;
    Some(interceptor)
}

/// 拦截器注册表
///
/// 容器只产出类型擦除的实例，注册表记录哪些 key 的实例可以当作
/// [`Interceptor`] 使用。
#[derive(Default)]
pub struct InterceptorRegistry {
    casters: HashMap<String, Caster>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 `type_key::<T>()` 注册，返回该 key
    pub fn register<T: Interceptor + Any>(&mut self) -> &'static str {
        self.register_as::<T>(type_key::<T>());
        type_key::<T>()
    }

    pub fn register_as<T: Interceptor + Any>(&mut self, key: impl Into<String>) {
        let key = key.into();
        tracing::debug!(interceptor = %key, "Registered interceptor");
        self.casters.insert(key, cast::<T>);
    }

    /// 将容器解析出的实例转换为拦截器；未注册或类型不符时返回 `None`
    pub fn cast(&self, key: &str, instance: Instance) -> Option<Arc<dyn Interceptor>> {
        let caster = self.casters.get(key)?;
        caster(instance)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.casters.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("interceptors", &self.casters.keys().collect::<Vec<_>>())
            .finish()
    }
}
