//! 请求上下文

use std::collections::HashMap;

use http::{Extensions, Method};

/// 单次分发的请求上下文
///
/// 由分发器创建，以 `&mut` 依次传给拦截器和最终的动作。拦截器可以在
/// `extensions` 中存放值供处理器读取。
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    extensions: Extensions,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 原始请求路径（未去掉前导 `/`）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 从路径中提取的命名参数
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
