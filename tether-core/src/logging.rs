//! 日志初始化
//!
//! `[logging]` 段反序列化为 [`LoggingConfig`]，`init` 安装全局的
//! `tracing-subscriber`。

use serde::de::{value, DeserializeOwned, IntoDeserializer};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// 作为 `EnvFilter` 指令使用的名称
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 紧凑格式（默认）
    Compact,
    /// 完整格式（带时间、级别、目标）
    Full,
    Json,
    /// 美化格式（适合开发）
    Pretty,
}

/// 环境变量中的枚举值与配置文件同名，大小写不敏感
fn parse_env_value<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let deserializer: value::StringDeserializer<value::Error> =
        raw.trim().to_ascii_lowercase().into_deserializer();
    T::deserialize(deserializer).ok()
}

/// 日志配置，对应配置文件中的 `[logging]` 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（默认：Info）
    pub level: LogLevel,

    /// 日志格式（默认：Compact）
    pub format: LogFormat,

    /// 是否显示目标（模块路径）（默认：false）
    pub show_target: bool,

    /// 是否显示线程 ID（默认：false）
    pub show_thread_ids: bool,

    /// 是否显示线程名（默认：false）
    pub show_thread_names: bool,

    /// 自定义过滤器，例如 "tether_web=debug,tether_core=trace"
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
            show_thread_names: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// `RUST_LOG` 覆盖过滤器，`LOG_LEVEL`/`LOG_FORMAT` 覆盖级别与格式；
    /// 无法解析的值被忽略
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.filter = Some(rust_log);
        }

        if let Some(level) = lookup("LOG_LEVEL").and_then(|value| parse_env_value(&value)) {
            self.level = level;
        }

        if let Some(format) = lookup("LOG_FORMAT").and_then(|value| parse_env_value(&value)) {
            self.format = format;
        }

        self
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_directive());
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| fallback()),
            None => fallback(),
        }
    }

    /// 初始化全局日志订阅者；重复初始化返回错误
    pub fn init(self) -> Result<(), ConfigError> {
        let builder = fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_thread_names(self.show_thread_names);

        let installed = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };
        installed.map_err(|e| ConfigError::LoggingInitFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_env_values_are_case_insensitive() {
        let config = LoggingConfig::default()
            .apply_overrides(overrides(&[("LOG_LEVEL", "WARNING"), ("LOG_FORMAT", " Json ")]));

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_overrides_ignore_invalid_values() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            ..LoggingConfig::default()
        }
        .apply_overrides(overrides(&[
            ("LOG_LEVEL", "shouting"),
            ("LOG_FORMAT", "xml"),
            ("RUST_LOG", "tether_web=trace"),
        ]));

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.filter.as_deref(), Some("tether_web=trace"));
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
        assert_eq!(LoggingConfig::default().level.as_directive(), "info");
    }
}
