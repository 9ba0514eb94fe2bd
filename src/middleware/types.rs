use std::collections::HashMap;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use super::PipelineError;

/// 파이프라인으로 들어오는 요청
///
/// 레이어는 요청을 소유권째 넘겨받으므로 본문(body)에 파생 정보를 주입할 수 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Map<String, Value>>,
    pub query_params: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            query_params: None,
        }
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn get(path: impl Into<String>) -> RequestBuilder {
        Self::builder().method(Method::GET).path(path)
    }

    pub fn post(path: impl Into<String>) -> RequestBuilder {
        Self::builder().method(Method::POST).path(path)
    }

    /// 헤더 값을 문자열로 가져옵니다. UTF-8이 아닌 값은 `None`입니다.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// `http::request::Builder`처럼 헤더 파싱 오류를 `build()` 시점까지 미룹니다.
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Result<Request, PipelineError>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            inner: Ok(Request::new(Method::GET, "/")),
        }
    }
}

impl RequestBuilder {
    pub fn method(self, method: Method) -> Self {
        self.and_then(|mut req| {
            req.method = method;
            Ok(req)
        })
    }

    pub fn path(self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.and_then(|mut req| {
            req.path = path;
            Ok(req)
        })
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        self.and_then(|mut req| {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            let value = HeaderValue::from_str(value)?;
            req.headers.insert(name, value);
            Ok(req)
        })
    }

    pub fn query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.and_then(|mut req| {
            req.query_params.get_or_insert_with(HashMap::new).insert(key, value);
            Ok(req)
        })
    }

    /// JSON 객체를 본문으로 설정합니다. 객체가 아닌 값은 거부됩니다.
    pub fn json_body(self, body: Value) -> Self {
        self.and_then(|mut req| match body {
            Value::Object(map) => {
                req.body = Some(map);
                Ok(req)
            }
            other => Err(PipelineError::Handler(format!(
                "request body must be a JSON object, got {}",
                other
            ))),
        })
    }

    pub fn build(self) -> Result<Request, PipelineError> {
        self.inner
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(Request) -> Result<Request, PipelineError>,
    {
        Self {
            inner: self.inner.and_then(f),
        }
    }
}

/// 파이프라인이 돌려주는 응답
///
/// 값 타입이므로 캐시된 응답은 항상 복사본으로 전달됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Value,
    pub headers: HeaderMap,
}

impl Response {
    /// `Content-Type: application/json` 헤더를 가진 응답을 생성합니다.
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self { status, body, headers }
    }

    /// `{"error": message}` 형태의 오류 응답
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let req = Request::get("/users")
            .header("X-Forwarded-For", "10.0.0.1")
            .query("page", "2")
            .json_body(json!({ "test": "data" }))
            .build()
            .unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/users");
        assert_eq!(req.header("x-forwarded-for"), Some("10.0.0.1"));
        assert_eq!(req.query_params.unwrap().get("page").map(String::as_str), Some("2"));
        assert_eq!(req.body.unwrap()["test"], "data");
    }

    #[test]
    fn test_builder_defers_invalid_header() {
        let result = Request::get("/").header("bad header", "x").build();
        assert!(matches!(result, Err(PipelineError::InvalidHeader(_))));
    }

    #[test]
    fn test_builder_rejects_non_object_body() {
        let result = Request::post("/").json_body(json!([1, 2])).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let res = Response::error(StatusCode::UNAUTHORIZED, "Authentication required");
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body, json!({ "error": "Authentication required" }));
        assert_eq!(res.header("content-type"), Some("application/json"));
    }
}
