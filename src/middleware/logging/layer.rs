use std::panic::{self, AssertUnwindSafe};
use uuid::Uuid;
use crate::logging::RequestLog;
use crate::middleware::error::panic_message;
use crate::middleware::{BoxHandler, Handler, PipelineError, Request, Response, SharedClock};
use super::sink::SharedSink;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 요청/응답 로깅 레이어
///
/// 호출마다 정확히 하나의 `RequestLog`를 싱크에 남깁니다. 내부 오류는 기록한 뒤
/// 변환하지 않고 그대로 돌려주며, 내부 패닉도 기록한 뒤 다시 일으킵니다.
pub struct LoggingLayer {
    inner: BoxHandler,
    sink: SharedSink,
    clock: SharedClock,
}

impl LoggingLayer {
    pub fn new(inner: BoxHandler, sink: SharedSink, clock: SharedClock) -> Self {
        Self { inner, sink, clock }
    }

    fn request_id(req: &Request) -> String {
        req.header(REQUEST_ID_HEADER)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

impl Handler for LoggingLayer {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        let mut log = RequestLog::new(Self::request_id(&req));
        log.with_request(&req);
        let start = self.clock.now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.inner.handle(req)));
        log.with_duration(self.clock.now().saturating_duration_since(start));

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                log.with_error(format!("handler panicked: {}", panic_message(payload.as_ref())));
                self.sink.record(&log);
                panic::resume_unwind(payload);
            }
        };

        match &result {
            Ok(response) => log.with_response(response.status),
            Err(e) => log.with_error(e),
        }
        self.sink.record(&log);

        result
    }
}
