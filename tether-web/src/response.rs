//! 响应类型与构造辅助函数

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;

use crate::error::{DispatchError, DispatchResult};

/// 分发结果使用的响应类型，正文已经渲染为字符串
pub type Response = http::Response<String>;

/// 处理器与拦截器的返回值
pub type HandlerResult = DispatchResult<Response>;

/// 纯文本响应
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    with_content_type(status, body.into(), "text/plain; charset=utf-8")
}

/// JSON 响应
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> HandlerResult {
    let body = serde_json::to_string(body).map_err(|e| DispatchError::Handler(e.into()))?;
    Ok(with_content_type(status, body, "application/json"))
}

/// 将分发错误转换为 `{"error": message}` 响应
pub fn error_response(error: &DispatchError) -> Response {
    let body = serde_json::json!({ "error": error.to_string() }).to_string();
    with_content_type(error.status_code(), body, "application/json")
}

fn with_content_type(status: StatusCode, body: String, content_type: &'static str) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let response = json(StatusCode::CREATED, &serde_json::json!({ "id": 7 })).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), r#"{"id":7}"#);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_error_response() {
        let response = error_response(&DispatchError::route_not_found("GET", "/nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body["error"], "No route matches GET /nope");
    }
}
