//! 요청 처리 파이프라인
//!
//! 인증, 속도 제한, 응답 캐시, 로깅 레이어를 최종 핸들러 바깥에 순서대로 쌓습니다.
//! 각 레이어는 응답을 직접 만들어 반환(short-circuit)하거나 안쪽으로 위임합니다.

pub mod auth;
pub mod cache;
pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod manager;
pub mod rate_limit;
pub mod traits;
pub mod types;

pub use chain::{LayerSpec, Pipeline, PipelineBuilder};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{MiddlewareConfig, MiddlewareType};
pub use error::PipelineError;
pub use handler::{handler_fn, EchoHandler, HandlerFn};
pub use manager::{build_pipeline, Capabilities};
pub use traits::{BoxHandler, Handler};
pub use types::{Request, RequestBuilder, Response};
