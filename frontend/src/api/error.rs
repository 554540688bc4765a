//! API 错误类型
//!
//! 非 2xx 响应携带服务端下发的 message；传输失败与解析失败
//! 各自独立成类。客户端从不自动重试，是否提示用户由调用方决定。

use serde::Deserialize;
use std::fmt;

/// API 调用的结构化失败结果
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 请求构建失败（序列化等，未发出网络请求）
    Build(String),
    /// 传输层失败（连接中断、DNS 等）
    Network(String),
    /// 响应体无法按预期解码
    Decode(String),
    /// 服务端返回非 2xx，携带其 message
    Status { code: u16, message: String },
}

/// 服务端错误响应体 `{ message: ... }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// 从非 2xx 响应构建错误，尽力提取服务端 message
    pub fn from_response(code: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("request failed with status {code}"));
        Self::Status { code, message }
    }

    /// 是否属于鉴权失败 (401/403)
    ///
    /// 守卫不会因此自动跳转登录页；是否提示由页面决定。
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Status { code: 401 | 403, .. })
    }

    /// 面向用户的提示文案：优先服务端 message，否则通用兜底
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            _ => "Something went wrong, please try again in a moment".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(msg) => write!(f, "request build failed: {msg}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Decode(msg) => write!(f, "response decode failed: {msg}"),
            Self::Status { code, message } => write!(f, "server returned {code}: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<crate::web::HttpError> for ApiError {
    fn from(e: crate::web::HttpError) -> Self {
        use crate::web::HttpError;
        match e {
            HttpError::RequestBuildFailed(msg) => Self::Build(msg),
            HttpError::NetworkError(msg) => Self::Network(msg),
            HttpError::ResponseParseFailed(msg) => Self::Decode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_message() {
        let err = ApiError::from_response(422, r#"{"message":"OTP expired"}"#);
        assert_eq!(err, ApiError::Status { code: 422, message: "OTP expired".into() });
        assert_eq!(err.user_message(), "OTP expired");
        assert!(!err.is_auth_error());
    }

    #[test]
    fn falls_back_on_unparseable_body() {
        let err = ApiError::from_response(500, "<html>oops</html>");
        match err {
            ApiError::Status { code, message } => {
                assert_eq!(code, 500);
                assert!(message.contains("500"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn auth_error_classification() {
        assert!(ApiError::from_response(401, "{}").is_auth_error());
        assert!(ApiError::from_response(403, "{}").is_auth_error());
        assert!(!ApiError::from_response(404, "{}").is_auth_error());
        assert!(!ApiError::Network("down".into()).is_auth_error());
    }
}
