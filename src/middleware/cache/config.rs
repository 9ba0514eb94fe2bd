use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::middleware::PipelineError;

/// 응답 캐시 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// 캐시 항목 유효 시간 (초)
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    300 // 기본값: 5분
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ttl_seconds == 0 {
            return Err(PipelineError::config(
                "cache",
                "ttlSeconds must be greater than 0",
            ));
        }
        Ok(())
    }
}
