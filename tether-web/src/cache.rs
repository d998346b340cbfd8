//! 编译后的路由缓存
//!
//! 每个方法的路由被拆成两部分：
//! - 静态表：不含占位符的路由，以去掉首尾 `/` 的路径为 key，同时登记
//!   追加一个 `/` 的 key，两种写法都能精确命中
//! - 动态表：其余路由，保持注册顺序线性扫描，先注册者优先

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use http::Method;
use serde::Serialize;

use crate::route::Route;

#[derive(Debug, Default)]
struct MethodRoutes {
    static_routes: HashMap<String, Arc<Route>>,
    static_count: usize,
    dynamic_routes: Vec<Arc<Route>>,
}

/// 一次成功的匹配
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: HashMap<String, String>,
}

/// 由路由表派生的查找结构，构建后只读
#[derive(Debug, Default)]
pub struct RouteCache {
    methods: HashMap<Method, MethodRoutes>,
}

impl RouteCache {
    /// 按方法拆分所有路由
    pub fn build(routes: &[Arc<Route>]) -> Self {
        let mut methods: HashMap<Method, MethodRoutes> = HashMap::new();

        for route in routes {
            let entry = methods.entry(route.method().clone()).or_default();

            if route.is_static() {
                let key = route.static_key();
                entry.static_routes.insert(key.to_string(), Arc::clone(route));
                entry.static_routes.insert(format!("{}/", key), Arc::clone(route));
                entry.static_count += 1;
            } else {
                entry.dynamic_routes.push(Arc::clone(route));
            }
        }

        Self { methods }
    }

    /// 先查静态表，再按注册顺序扫描动态表
    ///
    /// `normalized` 已经去掉了前导 `/`。
    pub fn lookup(&self, method: &Method, normalized: &str) -> Option<RouteMatch> {
        let routes = self.methods.get(method)?;

        if let Some(route) = routes.static_routes.get(normalized) {
            tracing::trace!(method = %method, path = normalized, "Static route hit");
            return Some(RouteMatch {
                route: Arc::clone(route),
                params: HashMap::new(),
            });
        }

        routes.dynamic_routes.iter().find_map(|route| {
            route.captures(normalized).map(|params| RouteMatch {
                route: Arc::clone(route),
                params,
            })
        })
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for (method, routes) in &self.methods {
            let method_stats = MethodStats {
                total: routes.static_count + routes.dynamic_routes.len(),
                static_routes: routes.static_count,
                dynamic_routes: routes.dynamic_routes.len(),
            };
            stats.total_routes += method_stats.total;
            stats.static_routes += method_stats.static_routes;
            stats.dynamic_routes += method_stats.dynamic_routes;
            stats.methods.insert(method.to_string(), method_stats);
        }

        stats
    }
}

/// 单个方法的路由计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodStats {
    pub total: usize,
    #[serde(rename = "static")]
    pub static_routes: usize,
    #[serde(rename = "dynamic")]
    pub dynamic_routes: usize,
}

/// 路由缓存统计，计数单位是路由而不是查找 key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_routes: usize,
    pub static_routes: usize,
    pub dynamic_routes: usize,
    pub methods: BTreeMap<String, MethodStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::config::DEFAULT_PARAM_PATTERN;

    fn route(method: Method, path: &str, action: &str) -> Arc<Route> {
        Arc::new(Route::new(method, path, "Handler", action, Vec::new(), DEFAULT_PARAM_PATTERN).unwrap())
    }

    fn cache() -> RouteCache {
        RouteCache::build(&[
            route(Method::GET, "/", "home"),
            route(Method::GET, "/users", "index"),
            route(Method::GET, "/users/@id", "show"),
            route(Method::GET, "/users/@name:[a-z]+", "by_name"),
            route(Method::POST, "/users", "store"),
        ])
    }

    #[test]
    fn test_static_lookup_with_and_without_trailing_slash() {
        let cache = cache();

        let bare = cache.lookup(&Method::GET, "users").unwrap();
        let slashed = cache.lookup(&Method::GET, "users/").unwrap();
        assert!(Arc::ptr_eq(&bare.route, &slashed.route));
        assert!(bare.params.is_empty());

        assert_eq!(cache.lookup(&Method::GET, "").unwrap().route.action(), "home");
        assert_eq!(cache.lookup(&Method::POST, "users").unwrap().route.action(), "store");
    }

    #[test]
    fn test_dynamic_lookup_first_registered_wins() {
        let cache = cache();

        let found = cache.lookup(&Method::GET, "users/ada").unwrap();
        assert_eq!(found.route.action(), "show");
        assert_eq!(found.params.get("id").map(String::as_str), Some("ada"));
    }

    #[test]
    fn test_lookup_misses() {
        let cache = cache();
        assert!(cache.lookup(&Method::GET, "posts").is_none());
        assert!(cache.lookup(&Method::DELETE, "users").is_none());
        assert!(cache.lookup(&Method::GET, "users/7/posts").is_none());
    }

    #[test]
    fn test_stats_count_routes() {
        let stats = cache().stats();

        assert_eq!(stats.total_routes, 5);
        assert_eq!(stats.static_routes, 3);
        assert_eq!(stats.dynamic_routes, 2);
        assert_eq!(
            stats.methods["GET"],
            MethodStats {
                total: 4,
                static_routes: 2,
                dynamic_routes: 2
            }
        );

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["methods"]["POST"]["static"], 1);
    }
}
