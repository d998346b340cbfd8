//! 前端控制器
//!
//! `Application` 持有配置、容器与路由器，把传输层交来的 (method, path)
//! 交给路由器分发，并把分发错误转换为 JSON 错误响应。

use std::sync::Arc;
use std::time::Instant;

use http::Method;
use tether_core::{Binding, ConfigError, Container, Settings, SETTINGS_KEY};

use crate::error::DispatchError;
use crate::response::{self, Response};
use crate::router::Router;

/// Tether 应用
pub struct Application {
    settings: Arc<Settings>,
    router: Router,
}

impl Application {
    /// 使用新的容器创建应用
    pub fn new(settings: Settings) -> Self {
        Self::with_container(settings, Arc::new(Container::new()))
    }

    /// 使用已有的容器创建应用；配置以类型 key 和 `"settings"` 两个 key 绑定
    pub fn with_container(settings: Settings, container: Arc<Container>) -> Self {
        let settings = Arc::new(settings);
        container.bind_instance(Arc::clone(&settings));
        container.bind(SETTINGS_KEY, Binding::instance(Arc::clone(&settings)));

        let router = Router::with_settings(container, settings.router.clone());

        tracing::info!(app = %settings.app.name, "Application created");
        Self { settings, router }
    }

    /// 从 TOML 文本创建，随后应用环境变量覆盖
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings = Settings::from_toml_str(content)?.with_env_overrides();
        Ok(Self::new(settings))
    }

    /// 按配置初始化全局日志
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        self.settings.logging.clone().init()
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn container(&self) -> &Arc<Container> {
        self.router.container()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// 处理一次请求，任何分发错误都转换为错误响应
    pub fn handle(&self, method: &str, path: &str) -> Response {
        let start = Instant::now();

        let result = parse_method(method, path)
            .and_then(|method| self.router.dispatch(&method, path));

        match result {
            Ok(response) => {
                tracing::info!(
                    method,
                    path,
                    status = response.status().as_u16(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Request handled"
                );
                response
            }
            Err(err) => {
                let response = response::error_response(&err);
                if err.status_code().is_server_error() {
                    tracing::error!(method, path, error = %err, "Request failed");
                } else {
                    tracing::info!(method, path, error = %err, "Request rejected");
                }
                response
            }
        }
    }
}

/// 方法名不区分大小写；无法识别的方法不可能匹配任何路由
fn parse_method(method: &str, path: &str) -> Result<Method, DispatchError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| DispatchError::route_not_found(method, path))
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.settings.app.name)
            .field("router", &self.router)
            .finish()
    }
}
