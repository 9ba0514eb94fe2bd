use std::sync::Arc;
use super::{PipelineError, Request, Response};

/// 요청 처리 트레이트
///
/// 최종 핸들러와 모든 레이어가 이 트레이트를 구현합니다. 레이어는 내부 핸들러를
/// 하나만 소유하며, 응답을 직접 만들어 반환(short-circuit)하거나 내부로 위임합니다.
///
/// 예상된 실패(401, 429 등)는 `Ok(Response)`로, 예기치 않은 오류는 `Err`로 전달됩니다.
pub trait Handler: Send + Sync {
    fn handle(&self, req: Request) -> Result<Response, PipelineError>;
}

pub type BoxHandler = Box<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        (**self).handle(req)
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        (**self).handle(req)
    }
}
