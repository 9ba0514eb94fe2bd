use std::collections::VecDeque;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use tracing::debug;

/// Rate Limit 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// 요청이 기록되었고 윈도우에 `remaining`개의 여유가 남음
    Allowed { remaining: u32 },
    /// 한도 초과. `retry_after` 이후 다음 요청이 가능
    Limited { retry_after: Duration },
}

/// 속도 제한 저장소 trait
///
/// `try_acquire`는 만료된 기록 정리, 한도 확인, 기록 추가를 키 단위로 원자적으로 수행해야 합니다.
pub trait RateLimitStore: Send + Sync {
    fn try_acquire(&self, key: &str, now: Instant, limit: u32, window: Duration) -> RateDecision;

    /// 윈도우 안에 기록이 남지 않은 클라이언트를 제거합니다.
    fn purge_idle(&self, now: Instant, window: Duration);
}

/// 슬라이딩 윈도우 저장소
///
/// 클라이언트별 요청 시각을 샤딩된 맵에 보관합니다.
#[derive(Debug, Default)]
pub struct SlidingWindowStore {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록이 남아 있는 클라이언트 수
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    timestamps.retain(|ts| now.saturating_duration_since(*ts) < window);
}

fn retry_after(timestamps: &VecDeque<Instant>, now: Instant, window: Duration) -> Duration {
    timestamps
        .iter()
        .min()
        .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
        .unwrap_or_default()
}

impl RateLimitStore for SlidingWindowStore {
    fn try_acquire(&self, key: &str, now: Instant, limit: u32, window: Duration) -> RateDecision {
        // entry 가드가 샤드 락을 잡고 있는 동안 정리-확인-기록을 수행
        let mut timestamps = self.windows.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, limit, "새로운 슬라이딩 윈도우 생성");
            VecDeque::new()
        });

        prune(&mut timestamps, now, window);

        let used = timestamps.len();
        if used >= limit as usize {
            return RateDecision::Limited {
                retry_after: retry_after(&timestamps, now, window),
            };
        }

        timestamps.push_back(now);
        RateDecision::Allowed {
            remaining: limit.saturating_sub(used as u32 + 1),
        }
    }

    fn purge_idle(&self, now: Instant, window: Duration) {
        self.windows.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
    }
}
