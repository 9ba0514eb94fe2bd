//! Rate Limiting 레이어
//!
//! 클라이언트별 슬라이딩 윈도우로 요청 속도를 제한합니다.

mod config;
mod layer;
pub mod store;

pub use config::RateLimitConfig;
pub use layer::{RateLimitLayer, UNKNOWN_CLIENT};
pub use store::{RateDecision, RateLimitStore, SlidingWindowStore};
