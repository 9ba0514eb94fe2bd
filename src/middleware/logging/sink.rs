use std::sync::Arc;
use parking_lot::Mutex;
use crate::logging::{log_request, RequestLog};

/// 요청 기록을 받아가는 외부 로그 대상
pub trait LogSink: Send + Sync {
    fn record(&self, log: &RequestLog);
}

pub type SharedSink = Arc<dyn LogSink>;

/// `tracing` 이벤트로 기록하는 기본 싱크
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, log: &RequestLog) {
        log_request(log);
    }
}

/// 메모리에 기록을 모으는 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<RequestLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RequestLog> {
        self.entries.lock().clone()
    }

    pub fn errors(&self) -> Vec<RequestLog> {
        self.entries
            .lock()
            .iter()
            .filter(|log| log.error.is_some())
            .cloned()
            .collect()
    }
}

impl LogSink for MemorySink {
    fn record(&self, log: &RequestLog) {
        self.entries.lock().push(log.clone());
    }
}
