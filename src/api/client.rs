use crate::error::{ApiError, ApiResult};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// 构建带统一重定向策略的异步 HTTP 客户端。
/// 超时仅在配置显式提供时设置，否则沿用 reqwest 默认（不限时）。
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().redirect(Policy::limited(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// 读取失败响应的状态码与可读信息，供各阶段组装错误。
pub(crate) async fn read_failure(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, error_message_from_body(&body))
}

/// 非 2xx 转为 `ApiError::Status`，成功时原样返回响应。
pub(crate) async fn ensure_success(response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = read_failure(response).await;
    Err(ApiError::Status { status, message })
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response, what: &str) -> ApiResult<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("failed to parse {what}: {e}")))
}

/// 从后端错误体中提取信息。后端使用 `{"detail": ...}`，detail 可能是字符串、
/// 带 message/code 的对象，或校验错误数组。
pub(crate) fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = value.get("detail").and_then(detail_message) {
            return message;
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    truncate(trimmed)
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("msg"))
            .or_else(|| map.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_string_detail() {
        assert_eq!(
            error_message_from_body(r#"{"detail":"Storage quota exceeded"}"#),
            "Storage quota exceeded"
        );
    }

    #[test]
    fn extracts_structured_detail() {
        assert_eq!(
            error_message_from_body(r#"{"detail":{"code":"token_expired","message":"Token has expired"}}"#),
            "Token has expired"
        );
        assert_eq!(
            error_message_from_body(r#"{"detail":{"code":"invalid_token"}}"#),
            "invalid_token"
        );
    }

    #[test]
    fn joins_validation_errors() {
        let body = r#"{"detail":[{"msg":"field required"},{"msg":"value is not a valid integer"}]}"#;
        assert_eq!(
            error_message_from_body(body),
            "field required; value is not a valid integer"
        );
    }

    #[test]
    fn falls_back_to_plain_text() {
        assert_eq!(error_message_from_body(""), "no response body");
        assert_eq!(error_message_from_body("Bad Gateway"), "Bad Gateway");
        let long = "x".repeat(500);
        assert_eq!(error_message_from_body(&long).chars().count(), 201);
    }
}
