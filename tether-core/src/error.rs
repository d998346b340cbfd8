//! 容器错误类型
//!
//! 容器内部使用 `ContainerError` 表达每一种解析失败；应用代码（工厂、构造函数）
//! 的失败通过 `anyhow::Error` 携带，并经由 `ContainerError::Other` 传播。

use thiserror::Error;

/// 容器操作结果
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 依赖解析错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 既没有绑定、缓存实例，也没有注册对应的类型
    #[error("Unknown type '{key}': no binding, cached instance or registration")]
    UnknownType { key: String },

    /// 构造参数无法绑定
    ///
    /// `source` 为空表示参数本身不可解析（基础类型或无类型且没有默认值），
    /// 否则保存了嵌套解析失败的原始原因。
    #[error("Cannot resolve parameter '{parameter}' of '{owner}'")]
    UnresolvableParameter {
        owner: String,
        parameter: String,
        #[source]
        source: Option<Box<ContainerError>>,
    },

    /// 解析栈重入，`path` 以重入的类型结尾
    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    /// 实例存在但类型与请求的不一致
    #[error("Type mismatch for '{key}': expected '{expected}'")]
    TypeMismatch { key: String, expected: &'static str },

    /// 构造函数读取了一个没有提供的参数
    #[error("Argument '{parameter}' was not supplied to '{owner}'")]
    MissingArgument { owner: String, parameter: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContainerError {
    /// 沿着 `UnresolvableParameter` 包装链找到最初的失败原因
    pub fn root_cause(&self) -> &ContainerError {
        let mut current = self;
        while let ContainerError::UnresolvableParameter {
            source: Some(inner),
            ..
        } = current
        {
            current = inner;
        }
        current
    }

    /// 是否是指定 key 的 `UnknownType`（不包括嵌套依赖的失败）
    pub fn is_unknown(&self, key: &str) -> bool {
        matches!(self, ContainerError::UnknownType { key: missing } if missing == key)
    }
}

/// 配置与日志初始化错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),
}
