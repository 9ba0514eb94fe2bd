use http::StatusCode;
use serde_json::{json, Value};
use super::{Handler, PipelineError, Request, Response};

/// 클로저를 최종 핸들러로 사용하기 위한 어댑터
pub struct HandlerFn<F> {
    f: F,
}

/// 클로저를 `Handler`로 감쌉니다.
///
/// ```
/// use request_pipeline::middleware::{handler_fn, Handler, Request, Response};
/// use http::StatusCode;
///
/// let handler = handler_fn(|_req: Request| {
///     Ok(Response::json(StatusCode::OK, serde_json::json!({ "ok": true })))
/// });
/// let res = handler.handle(Request::get("/").build().unwrap()).unwrap();
/// assert_eq!(res.status, StatusCode::OK);
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, PipelineError> + Send + Sync,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, PipelineError> + Send + Sync,
{
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        (self.f)(req)
    }
}

/// 요청 본문을 그대로 돌려주는 데모용 핸들러
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        let data = req.body.map(Value::Object).unwrap_or(Value::Null);
        Ok(Response::json(
            StatusCode::OK,
            json!({ "message": "Success", "data": data }),
        ))
    }
}
