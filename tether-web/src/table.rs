//! 路由表与分组作用域

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tether_core::type_key;

use crate::error::DispatchResult;
use crate::route::Route;

/// 拦截器标识列表
///
/// 分组可以传入嵌套的列表，构造时会展平成一个有序序列：
///
/// ```
/// use tether_web::InterceptorIds;
///
/// let ids = InterceptorIds::from(vec![
///     InterceptorIds::from("auth"),
///     InterceptorIds::from(["audit", "throttle"]),
/// ]);
/// assert_eq!(ids.as_slice(), ["auth", "audit", "throttle"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptorIds(Vec<String>);

impl InterceptorIds {
    pub fn none() -> Self {
        Self::default()
    }

    /// 以类型 key 标识的拦截器
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(vec![type_key::<T>().to_string()])
    }

    /// 追加，保持顺序
    pub fn and(mut self, other: impl Into<InterceptorIds>) -> Self {
        self.0.extend(other.into().0);
        self
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for InterceptorIds {
    fn from(id: &str) -> Self {
        Self(vec![id.to_string()])
    }
}

impl From<String> for InterceptorIds {
    fn from(id: String) -> Self {
        Self(vec![id])
    }
}

impl From<()> for InterceptorIds {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl<T: Into<InterceptorIds>> From<Vec<T>> for InterceptorIds {
    fn from(items: Vec<T>) -> Self {
        items
            .into_iter()
            .fold(Self::none(), |ids, item| ids.and(item))
    }
}

impl<T: Into<InterceptorIds>, const N: usize> From<[T; N]> for InterceptorIds {
    fn from(items: [T; N]) -> Self {
        items
            .into_iter()
            .fold(Self::none(), |ids, item| ids.and(item))
    }
}

/// 当前生效的分组：前缀与拦截器都是所有外层分组的累积
#[derive(Debug, Clone, Default)]
pub struct GroupScope {
    prefix: String,
    interceptors: Vec<String>,
}

impl GroupScope {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn interceptors(&self) -> &[String] {
        &self.interceptors
    }

    /// 嵌套分组：前缀直接拼接，拦截器外层在前
    fn nested(&self, prefix: &str, interceptors: InterceptorIds) -> Self {
        let mut combined = self.interceptors.clone();
        combined.extend(interceptors.into_vec());
        Self {
            prefix: format!("{}{}", self.prefix, prefix),
            interceptors: combined,
        }
    }

    /// 路由的完整路径：分组内为 `/` + 去掉前导 `/` 的前缀 + 路径
    fn full_path(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            return path.to_string();
        }
        format!("/{}{}", self.prefix.trim_start_matches('/'), path)
    }
}

/// 按注册顺序保存的路由表
///
/// 同一方法下编译后的模式唯一：重复注册会替换原路由，但保留原来的位置。
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    index: HashMap<(Method, String), usize>,
    scope: GroupScope,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在当前分组作用域内添加路由
    pub fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: &str,
        action: &str,
        default_param_pattern: &str,
    ) -> DispatchResult<Arc<Route>> {
        let full_path = self.scope.full_path(path);
        let route = Arc::new(Route::new(
            method,
            full_path,
            handler,
            action,
            self.scope.interceptors.clone(),
            default_param_pattern,
        )?);

        let key = (route.method().clone(), route.pattern().to_string());
        match self.index.get(&key) {
            Some(&position) => {
                tracing::debug!(
                    method = %route.method(),
                    path = route.path(),
                    "Replacing route with identical pattern"
                );
                self.routes[position] = Arc::clone(&route);
            }
            None => {
                self.index.insert(key, self.routes.len());
                self.routes.push(Arc::clone(&route));
            }
        }

        Ok(route)
    }

    /// 进入嵌套分组，返回需要恢复的外层作用域
    pub fn push_scope(&mut self, prefix: &str, interceptors: InterceptorIds) -> GroupScope {
        let nested = self.scope.nested(prefix, interceptors);
        std::mem::replace(&mut self.scope, nested)
    }

    pub fn restore_scope(&mut self, previous: GroupScope) {
        self.scope = previous;
    }

    pub fn scope(&self) -> &GroupScope {
        &self.scope
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
        self.index.clear();
        self.scope = GroupScope::default();
    }
}
