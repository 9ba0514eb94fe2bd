use std::sync::atomic::{AtomicU64, Ordering};
use http::header::{HeaderName, HeaderValue};
use http::Method;
use tracing::debug;
use crate::middleware::{BoxHandler, Handler, PipelineError, Request, Response, SharedClock};
use super::config::CacheConfig;
use super::store::ResponseCache;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// 이 횟수의 GET 요청마다 만료된 항목을 정리
const SWEEP_INTERVAL: u64 = 1024;

/// 응답 캐시 레이어
///
/// GET 요청만 캐시하며, 다른 메서드는 캐시를 조회하거나 채우지 않고 그대로 위임합니다.
pub struct CacheLayer {
    inner: BoxHandler,
    cache: ResponseCache,
    clock: SharedClock,
    requests: AtomicU64,
}

impl CacheLayer {
    pub fn new(inner: BoxHandler, config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(config.ttl()),
            clock,
            requests: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn maybe_sweep(&self) {
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if count % SWEEP_INTERVAL == 0 {
            self.cache.purge_expired(self.clock.now());
            debug!(entries = self.cache.len(), "만료된 캐시 항목 정리");
        }
    }
}

impl Handler for CacheLayer {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        if req.method != Method::GET {
            return self.inner.handle(req);
        }

        self.maybe_sweep();
        let key = ResponseCache::cache_key(&req);
        let (mut response, status) = self
            .cache
            .get_or_fetch(&key, self.clock.as_ref(), || self.inner.handle(req))?;

        if let Some(value) = status.header_value() {
            response.headers.insert(X_CACHE, HeaderValue::from_static(value));
        }
        Ok(response)
    }
}
