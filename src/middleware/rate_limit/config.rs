use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::middleware::PipelineError;

/// Rate Limit 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// 윈도우당 허용 요청 수
    pub requests_per_window: u32,

    /// 윈도우 길이 (초)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// 클라이언트 식별에 사용할 헤더
    #[serde(default = "default_client_header")]
    pub client_header: String,
}

fn default_window_seconds() -> u64 {
    60 // 기본값: 1분
}

fn default_client_header() -> String {
    "x-forwarded-for".to_string()
}

impl RateLimitConfig {
    pub fn new(requests_per_window: u32) -> Self {
        Self {
            requests_per_window,
            window_seconds: default_window_seconds(),
            client_header: default_client_header(),
        }
    }

    pub fn with_window(mut self, window_seconds: u64) -> Self {
        self.window_seconds = window_seconds;
        self
    }

    pub fn with_client_header(mut self, header: impl Into<String>) -> Self {
        self.client_header = header.into();
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.requests_per_window == 0 {
            return Err(PipelineError::config(
                "rate-limit",
                "requestsPerWindow must be greater than 0",
            ));
        }
        if self.window_seconds == 0 {
            return Err(PipelineError::config(
                "rate-limit",
                "windowSeconds must be greater than 0",
            ));
        }
        if http::HeaderName::from_bytes(self.client_header.as_bytes()).is_err() {
            return Err(PipelineError::config(
                "rate-limit",
                format!("invalid client header: {}", self.client_header),
            ));
        }
        Ok(())
    }
}
