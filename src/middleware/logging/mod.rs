//! 로깅 레이어
//!
//! 요청마다 메서드, 경로, 상태 코드, 처리 시간을 `LogSink`로 보냅니다.

mod layer;
mod sink;

pub use layer::LoggingLayer;
pub use sink::{LogSink, MemorySink, SharedSink, TracingSink};
