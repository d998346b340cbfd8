//! 分发层错误类型
//!
//! 每一种分发失败都有独立的错误类型；映射到传输层状态码只通过
//! [`DispatchError::status_code`] 这一个窄接口完成。

use http::StatusCode;
use tether_core::ContainerError;
use thiserror::Error;

/// 分发结果
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// 分发错误
#[derive(Error, Debug)]
pub enum DispatchError {
    /// 静态表与动态表都没有匹配 - 404 Not Found
    #[error("No route matches {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// 处理器类型无法被容器定位
    #[error("Handler '{handler}' not found")]
    HandlerNotFound { handler: String },

    /// 处理器的动作表中没有该动作
    #[error("Action '{action}' not found on handler '{handler}'")]
    ActionNotFound { handler: String, action: String },

    /// 拦截器实例没有 `handle` 入口
    #[error("'{interceptor}' is not a registered interceptor")]
    InvalidInterceptor { interceptor: String },

    /// 动作参数既不是路径参数，也无法解析，也没有默认值
    #[error("Missing argument '{parameter}' for {handler}::{action}")]
    MissingArgument {
        handler: String,
        action: String,
        parameter: String,
    },

    /// 必需的服务参数解析失败
    #[error("Cannot resolve parameter '{parameter}' for {handler}::{action}")]
    UnresolvableParameter {
        handler: String,
        action: String,
        parameter: String,
        #[source]
        source: ContainerError,
    },

    /// 路由模式无法编译为正则表达式
    #[error("Invalid route pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 容器错误（例如拦截器或处理器构造时的嵌套失败）
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// 处理器或拦截器自身返回的错误
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// 获取错误对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn route_not_found(method: impl Into<String>, path: impl Into<String>) -> Self {
        DispatchError::RouteNotFound {
            method: method.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DispatchError::route_not_found("GET", "/missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DispatchError::HandlerNotFound {
                handler: "Missing".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DispatchError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_container_errors_are_transparent() {
        let err = DispatchError::from(ContainerError::CircularDependency {
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        });
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
    }
}
