//! 路由记录与路径模式编译
//!
//! 路径中的 `@name` 或 `@name:expr` 占位符编译为命名捕获组，其余文本按字面
//! 匹配。编译后的表达式去掉前导 `/`，首尾锚定，并允许一个可选的结尾 `/`：
//!
//! ```text
//! /users/@id          ->  ^users/(?P<id>[^/]+)/?$
//! /posts/@year:\d{4}  ->  ^posts/(?P<year>\d{4})/?$
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{DispatchError, DispatchResult};

/// 占位符：`@name` 与可选的 `:expr`（不能包含 `/`）
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)(?::([^/]+))?").expect("placeholder pattern must compile"));

/// 路径是否包含占位符
pub fn has_placeholders(path: &str) -> bool {
    PLACEHOLDER.is_match(path)
}

/// 将路由路径编译为正则表达式源码
pub fn compile_pattern(path: &str, default_param_pattern: &str) -> String {
    let trimmed = path.trim_matches('/');
    let mut source = String::with_capacity(trimmed.len() + 8);
    source.push('^');

    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(trimmed) {
        let Some(whole) = caps.get(0) else { continue };
        source.push_str(&regex::escape(&trimmed[last..whole.start()]));

        let expr = caps.get(2).map_or(default_param_pattern, |m| m.as_str());
        let _ = write!(source, "(?P<{}>{})", &caps[1], expr);
        last = whole.end();
    }

    source.push_str(&regex::escape(&trimmed[last..]));
    source.push_str("/?$");
    source
}

/// 已注册的路由，创建后不可变
#[derive(Debug)]
pub struct Route {
    method: Method,
    path: String,
    pattern: String,
    regex: Regex,
    handler: String,
    action: String,
    interceptors: Vec<String>,
}

impl Route {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        handler: impl Into<String>,
        action: impl Into<String>,
        interceptors: Vec<String>,
        default_param_pattern: &str,
    ) -> DispatchResult<Self> {
        let path = path.into();
        let pattern = compile_pattern(&path, default_param_pattern);
        let regex = Regex::new(&pattern).map_err(|source| DispatchError::InvalidPattern {
            pattern: path.clone(),
            source,
        })?;

        Ok(Self {
            method,
            path,
            pattern,
            regex,
            handler: handler.into(),
            action: action.into(),
            interceptors,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 完整路径（包含分组前缀）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 编译后的表达式源码，同一方法下唯一
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn interceptors(&self) -> &[String] {
        &self.interceptors
    }

    pub fn is_static(&self) -> bool {
        !has_placeholders(&self.path)
    }

    /// 静态表的查找 key：去掉首尾 `/`
    pub fn static_key(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// 用已去掉前导 `/` 的路径匹配，成功时返回命名参数
    pub fn captures(&self, normalized: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(normalized)?;
        let params = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|value| (name.to_string(), value.as_str().to_string()))
            })
            .collect();
        Some(params)
    }

    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            method: self.method.to_string(),
            path: self.path.clone(),
            handler: self.handler.clone(),
            action: self.action.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}

/// 路由清单中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub action: String,
    pub interceptors: Vec<String>,
}
