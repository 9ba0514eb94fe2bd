use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;
use crate::middleware::{Clock, PipelineError, Request, Response};

/// 캐시 조회 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// 유효한 항목을 돌려줌
    Hit,
    /// 내부 핸들러를 호출했고 결과를 저장함
    Miss,
    /// 내부 핸들러를 호출했지만 200이 아니어서 저장하지 않음
    Bypass,
}

impl CacheStatus {
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            Self::Hit => Some("HIT"),
            Self::Miss => Some("MISS"),
            Self::Bypass => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    stored_at: Instant,
    response: Response,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

type Slot = Arc<Mutex<Option<CachedResponse>>>;

/// TTL 기반 응답 캐시
///
/// 키마다 슬롯 락을 두어 조회-위임-저장을 하나의 단위로 수행합니다.
/// 같은 키의 동시 요청은 한 번만 내부 핸들러를 호출하고, 다른 키끼리는 서로 막지 않습니다.
/// 만료된 항목은 조회 시점에 제거됩니다.
#[derive(Debug)]
pub struct ResponseCache {
    slots: DashMap<String, Slot>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    /// 메서드, 경로, 키 순으로 정렬된 쿼리 파라미터로 캐시 키를 생성합니다.
    pub fn cache_key(req: &Request) -> String {
        let mut parts = vec![req.method.to_string(), req.path.clone()];

        if let Some(params) = &req.query_params {
            let sorted: BTreeMap<_, _> = params.iter().collect();
            parts.extend(sorted.into_iter().map(|(k, v)| format!("{}={}", k, v)));
        }

        format!("{:x}", Sha256::digest(parts.join("|").as_bytes()))
    }

    fn slot(&self, key: &str) -> Slot {
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// 비어 있는 슬롯을 맵에서 제거합니다. 다른 요청이 잡고 있는 슬롯은 남겨둡니다.
    fn release_slot(&self, key: &str, slot: &Slot) {
        self.slots.remove_if(key, |_, current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_some_and(|entry| entry.is_none())
        });
    }

    /// 유효한 항목이 있으면 복사본을 돌려주고, 없으면 `fetch`를 호출해 200 응답을 저장합니다.
    ///
    /// `fetch`가 실패하거나 200이 아니면 아무것도 저장하지 않고 슬롯도 남기지 않습니다.
    pub fn get_or_fetch<F>(
        &self,
        key: &str,
        clock: &dyn Clock,
        fetch: F,
    ) -> Result<(Response, CacheStatus), PipelineError>
    where
        F: FnOnce() -> Result<Response, PipelineError>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock();

        let now = clock.now();
        if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(now, self.ttl)) {
            debug!(key = %key, "캐시 적중");
            return Ok((cached.response.clone(), CacheStatus::Hit));
        }
        if entry.take().is_some() {
            debug!(key = %key, "만료된 캐시 항목 제거");
        }

        let response = match fetch() {
            Ok(response) if response.status == http::StatusCode::OK => response,
            other => {
                drop(entry);
                self.release_slot(key, &slot);
                return other.map(|response| (response, CacheStatus::Bypass));
            }
        };

        *entry = Some(CachedResponse {
            stored_at: clock.now(),
            response: response.clone(),
        });
        debug!(key = %key, ttl_secs = self.ttl.as_secs(), "응답 캐시 저장");
        Ok((response, CacheStatus::Miss))
    }

    /// 만료된 항목을 제거합니다. 갱신 중인 슬롯은 건너뜁니다.
    pub fn purge_expired(&self, now: Instant) {
        self.slots.retain(|_, slot| match slot.try_lock() {
            Some(entry) => entry.as_ref().is_some_and(|cached| cached.is_fresh(now, self.ttl)),
            None => true,
        });
    }

    /// 값이 채워진 항목 수 (만료 여부와 무관)
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use serde_json::json;
    use crate::middleware::ManualClock;

    const TTL: Duration = Duration::from_secs(300);

    fn ok_response(n: i64) -> Result<Response, PipelineError> {
        Ok(Response::json(StatusCode::OK, json!({ "n": n })))
    }

    #[test]
    fn test_cache_key_sorts_query_params() {
        let a = Request::get("/users").query("b", "2").query("a", "1").build().unwrap();
        let b = Request::get("/users").query("a", "1").query("b", "2").build().unwrap();
        let c = Request::get("/users").query("a", "1").build().unwrap();

        assert_eq!(ResponseCache::cache_key(&a), ResponseCache::cache_key(&b));
        assert_ne!(ResponseCache::cache_key(&a), ResponseCache::cache_key(&c));
        assert_eq!(ResponseCache::cache_key(&a).len(), 64);
    }

    #[test]
    fn test_cache_key_includes_method_and_path() {
        let get = Request::get("/users").build().unwrap();
        let post = Request::builder().method(Method::POST).path("/users").build().unwrap();
        let other = Request::get("/orders").build().unwrap();

        assert_ne!(ResponseCache::cache_key(&get), ResponseCache::cache_key(&post));
        assert_ne!(ResponseCache::cache_key(&get), ResponseCache::cache_key(&other));
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        let (first, status) = cache.get_or_fetch("k", &clock, || ok_response(1)).unwrap();
        assert_eq!(status, CacheStatus::Miss);

        let (second, status) = cache
            .get_or_fetch("k", &clock, || panic!("fetch must not run on hit"))
            .unwrap();
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        cache.get_or_fetch("k", &clock, || ok_response(1)).unwrap();
        clock.advance(TTL);

        let (res, status) = cache.get_or_fetch("k", &clock, || ok_response(2)).unwrap();
        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(res.body["n"], 2);
    }

    #[test]
    fn test_non_ok_is_not_stored() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        let (_, status) = cache
            .get_or_fetch("k", &clock, || Ok(Response::error(StatusCode::NOT_FOUND, "Not found")))
            .unwrap();
        assert_eq!(status, CacheStatus::Bypass);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_uncached_keys_leave_no_slots() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        for i in 0..1000 {
            let key = format!("/missing/{}", i);
            cache
                .get_or_fetch(&key, &clock, || Ok(Response::error(StatusCode::NOT_FOUND, "Not found")))
                .unwrap();
        }
        for i in 0..10 {
            let key = format!("/broken/{}", i);
            let _ = cache.get_or_fetch(&key, &clock, || Err(PipelineError::Handler("boom".to_string())));
        }

        assert!(cache.is_empty());
        assert_eq!(cache.slots.len(), 0);
    }

    #[test]
    fn test_expired_then_not_found_releases_slot() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        cache.get_or_fetch("k", &clock, || ok_response(1)).unwrap();
        assert_eq!(cache.slots.len(), 1);

        clock.advance(TTL);
        let (_, status) = cache
            .get_or_fetch("k", &clock, || Ok(Response::error(StatusCode::NOT_FOUND, "Not found")))
            .unwrap();
        assert_eq!(status, CacheStatus::Bypass);
        assert_eq!(cache.slots.len(), 0);
    }

    #[test]
    fn test_fetch_error_stores_nothing() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        let result = cache.get_or_fetch("k", &clock, || Err(PipelineError::Handler("boom".to_string())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResponseCache::new(TTL);
        let clock = ManualClock::new();

        cache.get_or_fetch("old", &clock, || ok_response(1)).unwrap();
        clock.advance(Duration::from_secs(200));
        cache.get_or_fetch("new", &clock, || ok_response(2)).unwrap();
        clock.advance(Duration::from_secs(150));

        cache.purge_expired(clock.now());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.slots.len(), 1);

        let (_, status) = cache
            .get_or_fetch("new", &clock, || panic!("fetch must not run on hit"))
            .unwrap();
        assert_eq!(status, CacheStatus::Hit);
    }
}
