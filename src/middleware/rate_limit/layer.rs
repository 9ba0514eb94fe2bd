use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use http::header::{HeaderName, HeaderValue, RETRY_AFTER};
use http::StatusCode;
use tracing::{debug, warn};
use crate::middleware::{BoxHandler, Handler, PipelineError, Request, Response, SharedClock};
use super::config::RateLimitConfig;
use super::store::{RateDecision, RateLimitStore, SlidingWindowStore};

/// 식별 헤더가 없는 클라이언트가 공유하는 키
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 이 횟수의 요청마다 유휴 클라이언트를 정리
const SWEEP_INTERVAL: u64 = 1024;

/// Rate Limit 레이어
pub struct RateLimitLayer {
    inner: BoxHandler,
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    clock: SharedClock,
    requests: AtomicU64,
}

impl RateLimitLayer {
    pub fn new(inner: BoxHandler, config: RateLimitConfig, clock: SharedClock) -> Self {
        Self::with_store(inner, config, Arc::new(SlidingWindowStore::new()), clock)
    }

    pub fn with_store(
        inner: BoxHandler,
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
        clock: SharedClock,
    ) -> Self {
        Self {
            inner,
            config,
            store,
            clock,
            requests: AtomicU64::new(0),
        }
    }

    fn maybe_sweep(&self, now: Instant) {
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if count % SWEEP_INTERVAL == 0 {
            self.store.purge_idle(now, self.config.window());
            debug!("유휴 클라이언트 정리");
        }
    }

    /// 클라이언트 식별자를 추출합니다.
    ///
    /// 쉼표로 구분된 프록시 체인이면 첫 번째 값을 사용합니다.
    fn client_id(&self, req: &Request) -> String {
        req.header(&self.config.client_header)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string()
    }

    /// Rate Limit 초과 응답을 생성합니다.
    fn limit_exceeded_response(&self, retry_after: Duration) -> Response {
        let mut response = Response::error(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
        let wait_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);

        response.headers.insert(
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(self.config.requests_per_window),
        );
        response.headers.insert(RETRY_AFTER, HeaderValue::from(wait_secs));
        response
    }
}

impl Handler for RateLimitLayer {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        let client_id = self.client_id(&req);
        let now = self.clock.now();
        self.maybe_sweep(now);

        let decision = self.store.try_acquire(
            &client_id,
            now,
            self.config.requests_per_window,
            self.config.window(),
        );

        match decision {
            RateDecision::Allowed { remaining } => {
                debug!(client = %client_id, remaining, "Rate limit 통과");
                self.inner.handle(req)
            }
            RateDecision::Limited { retry_after } => {
                warn!(
                    client = %client_id,
                    retry_after_secs = retry_after.as_secs(),
                    "Rate limit 초과"
                );
                Ok(self.limit_exceeded_response(retry_after))
            }
        }
    }
}
