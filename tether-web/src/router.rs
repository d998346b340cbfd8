//! 路由器与分发器
//!
//! 注册阶段需要 `&mut Router`，服务阶段只需要 `&Router`，编译后的缓存在
//! 第一次分发时惰性构建，任何注册都会使其失效。

use std::any::Any;
use std::sync::Arc;

use http::Method;
use parking_lot::RwLock;
use tether_core::{Argument, Arguments, Container, ContainerError, Instance, ParamKind, RouterSettings};

use crate::cache::{CacheStats, RouteCache, RouteMatch};
use crate::controller::{BoundAction, Controller, ControllerRegistry};
use crate::error::{DispatchError, DispatchResult};
use crate::interceptor::{execute_chain, Interceptor, InterceptorRegistry};
use crate::request::RequestContext;
use crate::response::HandlerResult;
use crate::route::{Route, RouteInfo};
use crate::table::{InterceptorIds, RouteTable};

/// 路由器
pub struct Router {
    container: Arc<Container>,
    settings: RouterSettings,
    table: RouteTable,
    controllers: ControllerRegistry,
    interceptors: InterceptorRegistry,
    cache: RwLock<Option<Arc<RouteCache>>>,
}

impl Router {
    pub fn new(container: Arc<Container>) -> Self {
        Self::with_settings(container, RouterSettings::default())
    }

    pub fn with_settings(container: Arc<Container>, settings: RouterSettings) -> Self {
        Self {
            container,
            settings,
            table: RouteTable::new(),
            controllers: ControllerRegistry::new(),
            interceptors: InterceptorRegistry::new(),
            cache: RwLock::new(None),
        }
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    // ==================== 注册 ====================

    /// 在当前分组作用域内注册路由，并使编译缓存失效
    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handler: &str,
        action: &str,
    ) -> DispatchResult<()> {
        let route = self.table.add(
            method,
            path,
            handler,
            action,
            &self.settings.default_param_pattern,
        )?;

        tracing::debug!(
            method = %route.method(),
            path = route.path(),
            pattern = route.pattern(),
            handler,
            action,
            "Registered route"
        );
        self.invalidate();
        Ok(())
    }

    pub fn get(&mut self, path: &str, handler: &str, action: &str) -> DispatchResult<()> {
        self.add_route(Method::GET, path, handler, action)
    }

    pub fn post(&mut self, path: &str, handler: &str, action: &str) -> DispatchResult<()> {
        self.add_route(Method::POST, path, handler, action)
    }

    pub fn put(&mut self, path: &str, handler: &str, action: &str) -> DispatchResult<()> {
        self.add_route(Method::PUT, path, handler, action)
    }

    pub fn patch(&mut self, path: &str, handler: &str, action: &str) -> DispatchResult<()> {
        self.add_route(Method::PATCH, path, handler, action)
    }

    pub fn delete(&mut self, path: &str, handler: &str, action: &str) -> DispatchResult<()> {
        self.add_route(Method::DELETE, path, handler, action)
    }

    /// 分组注册
    ///
    /// `body` 内注册的路由带上累积的前缀和拦截器；无论 `body` 是否成功，
    /// 返回前都会恢复外层作用域。
    pub fn group<F>(
        &mut self,
        prefix: &str,
        interceptors: impl Into<InterceptorIds>,
        body: F,
    ) -> DispatchResult<()>
    where
        F: FnOnce(&mut Router) -> DispatchResult<()>,
    {
        let previous = self.table.push_scope(prefix, interceptors.into());
        let result = body(self);
        self.table.restore_scope(previous);
        self.invalidate();
        result
    }

    /// 注册控制器的动作表，返回用于路由的处理器 key
    pub fn controller<C: Controller>(&mut self) -> &'static str {
        self.controllers.register::<C>()
    }

    pub fn controller_as<C: Controller>(&mut self, handler: impl Into<String>) {
        self.controllers.register_as::<C>(handler);
    }

    /// 登记拦截器类型，返回用于分组的拦截器 key
    pub fn interceptor<T: Interceptor + Any>(&mut self) -> &'static str {
        self.interceptors.register::<T>()
    }

    pub fn interceptor_as<T: Interceptor + Any>(&mut self, key: impl Into<String>) {
        self.interceptors.register_as::<T>(key);
    }

    /// 删除所有路由并重置分组作用域
    pub fn clear_routes(&mut self) {
        self.table.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        *self.cache.get_mut() = None;
    }

    // ==================== 缓存 ====================

    /// 当前的编译缓存，不存在时构建
    fn compiled(&self) -> Arc<RouteCache> {
        if let Some(cache) = self.cache.read().as_ref() {
            return Arc::clone(cache);
        }

        let mut slot = self.cache.write();
        if let Some(cache) = slot.as_ref() {
            return Arc::clone(cache);
        }

        let cache = Arc::new(RouteCache::build(self.table.routes()));
        tracing::debug!(routes = self.table.len(), "Built route cache");
        *slot = Some(Arc::clone(&cache));
        cache
    }

    /// 丢弃编译缓存，下一次分发时重建
    pub fn clear_cache(&self) {
        *self.cache.write() = None;
        tracing::debug!("Route cache cleared");
    }

    /// 缓存统计；缓存未构建时静态与动态计数都为零
    pub fn cache_stats(&self) -> CacheStats {
        match self.cache.read().as_ref() {
            Some(cache) => cache.stats(),
            None => CacheStats::default(),
        }
    }

    /// 按注册顺序列出所有路由
    pub fn list_routes(&self) -> Vec<RouteInfo> {
        self.table.routes().iter().map(|route| route.info()).collect()
    }

    // ==================== 分发 ====================

    /// 查找路由但不执行
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.compiled().lookup(method, path.trim_start_matches('/'))
    }

    /// 分发请求：匹配路由，执行拦截器链，最后调用处理器动作
    pub fn dispatch(&self, method: &Method, path: &str) -> HandlerResult {
        let RouteMatch { route, params } = self
            .find(method, path)
            .ok_or_else(|| DispatchError::route_not_found(method.as_str(), path))?;

        tracing::debug!(
            method = %method,
            path,
            route = route.path(),
            handler = route.handler(),
            action = route.action(),
            "Matched route"
        );

        let interceptors = route
            .interceptors()
            .iter()
            .map(|id| self.materialize_interceptor(id))
            .collect::<DispatchResult<Vec<_>>>()?;

        let mut ctx = RequestContext::new(method.clone(), path).with_params(params);
        execute_chain(&interceptors, &mut ctx, |ctx| self.invoke_handler(&route, ctx))
    }

    fn materialize_interceptor(&self, id: &str) -> DispatchResult<Arc<dyn Interceptor>> {
        let instance = self.container.get(id)?;
        self.interceptors
            .cast(id, instance)
            .ok_or_else(|| DispatchError::InvalidInterceptor {
                interceptor: id.to_string(),
            })
    }

    /// 链的最内层：解析处理器、校验动作、绑定参数、调用
    fn invoke_handler(&self, route: &Route, ctx: &mut RequestContext) -> HandlerResult {
        let handler = self.materialize_handler(route.handler())?;

        let action = self
            .controllers
            .action(route.handler(), route.action())
            .ok_or_else(|| DispatchError::ActionNotFound {
                handler: route.handler().to_string(),
                action: route.action().to_string(),
            })?;

        let args = self.bind_arguments(route, action, ctx)?;
        action.invoke(&handler, &args, ctx)
    }

    fn materialize_handler(&self, handler: &str) -> DispatchResult<Instance> {
        self.container.get(handler).map_err(|err| {
            if err.is_unknown(handler) {
                DispatchError::HandlerNotFound {
                    handler: handler.to_string(),
                }
            } else {
                err.into()
            }
        })
    }

    /// 按声明顺序绑定动作参数：路径参数 → 容器解析 → 默认值
    fn bind_arguments(
        &self,
        route: &Route,
        action: &BoundAction,
        ctx: &RequestContext,
    ) -> DispatchResult<Arguments> {
        let mut args = Arguments::new(format!("{}::{}", route.handler(), route.action()));

        for parameter in action.parameters() {
            if let Some(value) = ctx.param(parameter.name()) {
                args.push(parameter.name(), Argument::Instance(Arc::new(value.to_string())));
                continue;
            }

            let argument = match (parameter.kind(), parameter.default()) {
                (ParamKind::Service(key), default) => match (self.container.get(key), default) {
                    (Ok(instance), _) => Argument::Instance(instance),
                    (Err(err), Some(default)) => {
                        tracing::warn!(
                            parameter = parameter.name(),
                            error = %err,
                            "Action dependency unavailable, using declared default"
                        );
                        default.to_argument()
                    }
                    (Err(err), None) => return Err(self.unresolvable(route, parameter.name(), err)),
                },
                (_, Some(default)) => default.to_argument(),
                (_, None) => {
                    return Err(DispatchError::MissingArgument {
                        handler: route.handler().to_string(),
                        action: route.action().to_string(),
                        parameter: parameter.name().to_string(),
                    })
                }
            };

            args.push(parameter.name(), argument);
        }

        Ok(args)
    }

    fn unresolvable(&self, route: &Route, parameter: &str, source: ContainerError) -> DispatchError {
        DispatchError::UnresolvableParameter {
            handler: route.handler().to_string(),
            action: route.action().to_string(),
            parameter: parameter.to_string(),
            source,
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.len())
            .field("controllers", &self.controllers.len())
            .field("interceptors", &self.interceptors.len())
            .field("cache_built", &self.cache.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Action;
    use crate::interceptor::Next;
    use crate::response;
    use http::StatusCode;
    use tether_core::{ContainerResult, Injectable, Parameter};

    struct Pages;

    impl Injectable for Pages {
        fn construct(_args: &Arguments) -> ContainerResult<Self> {
            Ok(Pages)
        }
    }

    impl Pages {
        fn show(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
            Ok(response::text(StatusCode::OK, format!("page {}", args.str("slug")?)))
        }

        fn about(&self, _args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
            Ok(response::text(StatusCode::OK, "about"))
        }
    }

    impl Controller for Pages {
        fn actions() -> Vec<Action<Self>> {
            vec![
                Action::new("show", Self::show).param(Parameter::value::<String>("slug")),
                Action::new("about", Self::about),
            ]
        }
    }

    struct Deny;

    impl Injectable for Deny {
        fn construct(_args: &Arguments) -> ContainerResult<Self> {
            Ok(Deny)
        }
    }

    impl Interceptor for Deny {
        fn handle(&self, _ctx: &mut RequestContext, _next: Next<'_>) -> HandlerResult {
            Ok(response::text(StatusCode::FORBIDDEN, "denied"))
        }
    }

    fn router() -> Router {
        let container = Arc::new(Container::new());
        container.register::<Pages>();
        container.register::<Deny>();

        let mut router = Router::new(container);
        let pages = router.controller::<Pages>();
        router.interceptor::<Deny>();
        router.get("/about", pages, "about").unwrap();
        router.get("/pages/@slug", pages, "show").unwrap();
        router
    }

    fn body(router: &Router, path: &str) -> String {
        router.dispatch(&Method::GET, path).unwrap().into_body()
    }

    #[test]
    fn test_dispatch_static_and_dynamic() {
        let router = router();
        assert_eq!(body(&router, "/about"), "about");
        assert_eq!(body(&router, "/about/"), "about");
        assert_eq!(body(&router, "/pages/intro"), "page intro");
    }

    #[test]
    fn test_route_not_found() {
        let router = router();
        let err = router.dispatch(&Method::POST, "/about").unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { .. }));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_registration_invalidates_cache() {
        let mut router = router();
        assert_eq!(body(&router, "/about"), "about");
        assert_eq!(router.cache_stats().total_routes, 2);

        router.get("/contact", type_key_of_pages(), "about").unwrap();
        assert_eq!(router.cache_stats(), CacheStats::default());
        assert_eq!(body(&router, "/contact"), "about");
        assert_eq!(router.cache_stats().static_routes, 2);
    }

    fn type_key_of_pages() -> &'static str {
        tether_core::type_key::<Pages>()
    }

    #[test]
    fn test_group_restores_scope_on_error() {
        let mut router = router();
        let pages = type_key_of_pages();

        let result = router.group("/admin", InterceptorIds::of::<Deny>(), |r| {
            r.get("/ok", pages, "about")?;
            r.get("/bad/@id:(", pages, "about")
        });
        assert!(matches!(result, Err(DispatchError::InvalidPattern { .. })));

        router.get("/after", pages, "about").unwrap();
        let routes = router.list_routes();
        let after = routes.iter().find(|r| r.path == "/after").unwrap();
        assert!(after.interceptors.is_empty());

        let denied = router.dispatch(&Method::GET, "/admin/ok").unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_clear_routes() {
        let mut router = router();
        router.clear_routes();
        assert!(router.list_routes().is_empty());
        assert!(matches!(
            router.dispatch(&Method::GET, "/about"),
            Err(DispatchError::RouteNotFound { .. })
        ));
    }
}
