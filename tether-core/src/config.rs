//! 应用配置
//!
//! 配置从 TOML 文本解析，随后可以用环境变量覆盖：
//!
//! ```toml
//! [app]
//! name = "demo"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [router]
//! default_param_pattern = "[^/]+"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "TETHER_";

/// 默认的路径参数匹配表达式：不包含 `/` 的一个或多个字符
pub const DEFAULT_PARAM_PATTERN: &str = "[^/]+";

/// 应用基本信息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tether".to_string(),
        }
    }
}

/// 路由配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// `@name` 占位符没有自定义表达式时使用的匹配表达式
    pub default_param_pattern: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            default_param_pattern: DEFAULT_PARAM_PATTERN.to_string(),
        }
    }
}

/// 全部配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub logging: LoggingConfig,
    pub router: RouterSettings,
}

impl Settings {
    /// 从 TOML 文本解析，缺失的段落使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 读取 TOML 文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&content)
    }

    /// 应用进程环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 使用给定的查找函数覆盖配置项
    ///
    /// 配置键 `app.name` 对应环境变量 `TETHER_APP_NAME`；日志相关的
    /// `RUST_LOG`、`LOG_LEVEL`、`LOG_FORMAT` 交给 [`LoggingConfig`] 处理。
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(&key_to_env("app.name")) {
            self.app.name = name;
        }
        if let Some(pattern) = lookup(&key_to_env("router.default_param_pattern")) {
            self.router.default_param_pattern = pattern;
        }
        self.logging = self.logging.apply_overrides(&lookup);
        self
    }
}

/// 将配置键转换为环境变量名
/// 例如: router.default_param_pattern -> TETHER_ROUTER_DEFAULT_PARAM_PATTERN
pub fn key_to_env(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace('.', "_").to_uppercase())
}
