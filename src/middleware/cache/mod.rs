//! 응답 캐시 레이어
//!
//! GET 응답을 TTL 동안 보관하고 `X-Cache` 헤더로 적중 여부를 표시합니다.

mod config;
mod layer;
pub mod store;

pub use config::CacheConfig;
pub use layer::{CacheLayer, X_CACHE};
pub use store::{CacheStatus, ResponseCache};
