use std::any::Any;
use http::StatusCode;
use super::Response;

/// 파이프라인 내부에서 발생하는 예기치 않은 오류
///
/// 401, 429 같은 예상된 실패는 `Response`로 표현되며 이 타입을 사용하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("handler failed: {0}")]
    Handler(String),

    #[error("token validator failed: {0}")]
    Validator(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("middleware {middleware} misconfigured: {message}")]
    Config {
        middleware: String,
        message: String,
    },
}

impl PipelineError {
    pub fn config(middleware: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            middleware: middleware.into(),
            message: message.into(),
        }
    }

    /// 파이프라인 바깥 경계에서 오류를 500 응답으로 변환합니다.
    pub fn into_response(self) -> Response {
        Response::error(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for PipelineError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for PipelineError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// 패닉 페이로드에서 메시지를 꺼냅니다.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
