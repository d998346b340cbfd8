//! # Tether Web
//!
//! 单进程、同步的请求分发层
//!
//! ## 核心特性
//!
//! - **路由表** - `@name` / `@name:expr` 占位符，分组累积前缀与拦截器
//! - **编译缓存** - 静态路由精确查找，动态路由按注册顺序匹配
//! - **拦截器链** - 按注册顺序执行，可短路
//! - **依赖解析** - 处理器与拦截器由 Tether Core 容器按需构造

pub mod app;
pub mod cache;
pub mod controller;
pub mod error;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod table;

pub use app::Application;
pub use cache::{CacheStats, MethodStats, RouteCache, RouteMatch};
pub use controller::{Action, ActionFn, BoundAction, Controller, ControllerRegistry};
pub use error::{DispatchError, DispatchResult};
pub use interceptor::{execute_chain, Interceptor, InterceptorRegistry, Next};
pub use request::RequestContext;
pub use response::{HandlerResult, Response};
pub use route::{Route, RouteInfo};
pub use router::Router;
pub use table::{GroupScope, InterceptorIds, RouteTable};

pub use http;

pub mod prelude {
    //! 预导入模块

    pub use crate::app::Application;
    pub use crate::controller::{Action, Controller};
    pub use crate::error::{DispatchError, DispatchResult};
    pub use crate::interceptor::{Interceptor, Next};
    pub use crate::request::RequestContext;
    pub use crate::response::{self, HandlerResult, Response};
    pub use crate::router::Router;
    pub use crate::table::InterceptorIds;

    pub use http::{Method, StatusCode};
    pub use tether_core::prelude::*;
}
