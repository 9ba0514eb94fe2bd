use std::panic::{self, AssertUnwindSafe};
use http::header::{self, HeaderValue};
use http::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use crate::middleware::error::panic_message;
use crate::middleware::{BoxHandler, Handler, PipelineError, Request, Response};
use super::config::AuthConfig;
use super::validator::{Identity, SharedValidator};

const MISSING_CREDENTIALS: &str = "Authentication required";
const MALFORMED_HEADER: &str = "Malformed authorization header";
const INVALID_TOKEN: &str = "Invalid authentication token";

/// 인증 레이어
///
/// `Authorization: <scheme> <token>` 헤더를 검증하고, 성공하면 사용자 ID를
/// 요청 본문에 주입한 뒤 내부 핸들러로 위임합니다. 검증기 장애는 이 레이어를
/// 넘어가지 않고 500 응답으로 변환됩니다.
pub struct AuthenticationLayer {
    inner: BoxHandler,
    validator: SharedValidator,
    config: AuthConfig,
}

impl AuthenticationLayer {
    pub fn new(inner: BoxHandler, validator: SharedValidator, config: AuthConfig) -> Self {
        Self {
            inner,
            validator,
            config,
        }
    }

    /// Authorization 헤더에서 토큰을 추출합니다.
    fn extract_token(&self, value: &HeaderValue) -> Option<String> {
        let value = value.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        match &self.config.scheme {
            Some(expected) if !expected.eq_ignore_ascii_case(scheme) => None,
            _ => Some(token.to_string()),
        }
    }

    /// 401 Unauthorized 응답을 생성합니다.
    fn unauthorized_response(&self, message: &str) -> Response {
        let mut response = Response::error(StatusCode::UNAUTHORIZED, message);
        let scheme = self.config.scheme.as_deref().unwrap_or("Bearer");
        if let Ok(value) = HeaderValue::from_str(scheme) {
            response.headers.insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }

    fn validate(&self, token: &str) -> Result<Option<Identity>, PipelineError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.validator.validate_token(token))) {
            Ok(result) => result,
            Err(payload) => Err(PipelineError::Validator(format!(
                "validator panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    fn inject_identity(&self, req: &mut Request, identity: Identity) {
        req.body
            .get_or_insert_with(Map::new)
            .insert(self.config.identity_key.clone(), Value::String(identity.user_id));
    }
}

impl Handler for AuthenticationLayer {
    fn handle(&self, mut req: Request) -> Result<Response, PipelineError> {
        let Some(value) = req.headers.get(header::AUTHORIZATION) else {
            debug!(path = %req.path, "Authorization 헤더 없음");
            return Ok(self.unauthorized_response(MISSING_CREDENTIALS));
        };

        let Some(token) = self.extract_token(value) else {
            debug!(path = %req.path, "잘못된 Authorization 헤더 형식");
            return Ok(self.unauthorized_response(MALFORMED_HEADER));
        };

        match self.validate(&token) {
            Ok(Some(identity)) => {
                debug!(user_id = %identity.user_id, "인증 성공");
                self.inject_identity(&mut req, identity);
                self.inner.handle(req)
            }
            Ok(None) => {
                warn!(path = %req.path, "토큰 검증 실패");
                Ok(self.unauthorized_response(INVALID_TOKEN))
            }
            Err(e) => {
                error!(error = %e, "토큰 검증기 오류");
                Ok(Response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Authentication error: {}", e),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;
    use crate::middleware::auth::{validator_fn, StaticTokenValidator};
    use crate::middleware::{handler_fn, EchoHandler};

    fn create_test_layer(config: AuthConfig) -> AuthenticationLayer {
        let validator = StaticTokenValidator::default().with_token("test_token", "user_123");
        AuthenticationLayer::new(Box::new(EchoHandler), Arc::new(validator), config)
    }

    fn request_with_auth(value: &str) -> Request {
        Request::get("/api/data")
            .header("Authorization", value)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_header() {
        let layer = create_test_layer(AuthConfig::default());
        let res = layer.handle(Request::get("/api/data").build().unwrap()).unwrap();

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body, json!({ "error": "Authentication required" }));
        assert!(res.headers.contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn test_malformed_header() {
        let layer = create_test_layer(AuthConfig::default());

        for value in ["Bearer", "Bearer    ", "test_token"] {
            let res = layer.handle(request_with_auth(value)).unwrap();
            assert_eq!(res.status, StatusCode::UNAUTHORIZED, "value: {:?}", value);
            assert_eq!(res.body["error"], "Malformed authorization header");
        }
    }

    #[test]
    fn test_scheme_mismatch_is_malformed() {
        let layer = create_test_layer(AuthConfig::with_scheme("Bearer"));
        let res = layer.handle(request_with_auth("Basic test_token")).unwrap();
        assert_eq!(res.body["error"], "Malformed authorization header");

        let res = layer.handle(request_with_auth("bearer test_token")).unwrap();
        assert_eq!(res.status, StatusCode::OK);
    }

    #[test]
    fn test_invalid_token() {
        let layer = create_test_layer(AuthConfig::default());
        let res = layer.handle(request_with_auth("Bearer wrong")).unwrap();

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Invalid authentication token");
    }

    #[test]
    fn test_injects_identity_into_body() {
        let layer = create_test_layer(AuthConfig::default());
        let req = Request::get("/api/data")
            .header("Authorization", "Bearer test_token")
            .json_body(json!({ "test": "data" }))
            .build()
            .unwrap();

        let res = layer.handle(req).unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["data"], json!({ "test": "data", "user_id": "user_123" }));
    }

    #[test]
    fn test_creates_body_when_absent() {
        let config = AuthConfig {
            identity_key: "subject".to_string(),
            ..AuthConfig::default()
        };
        let layer = create_test_layer(config);
        let res = layer.handle(request_with_auth("Bearer test_token")).unwrap();

        assert_eq!(res.body["data"], json!({ "subject": "user_123" }));
    }

    #[test]
    fn test_validator_error_becomes_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner_calls = calls.clone();
        let inner = handler_fn(move |req| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            EchoHandler.handle(req)
        });
        let validator = validator_fn(|_| Err(PipelineError::Validator("key store offline".to_string())));
        let layer = AuthenticationLayer::new(Box::new(inner), Arc::new(validator), AuthConfig::default());

        let res = layer.handle(request_with_auth("Bearer anything")).unwrap();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.body["error"],
            "Authentication error: token validator failed: key store offline"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validator_panic_becomes_500() {
        let validator = validator_fn(|_| panic!("corrupted key"));
        let layer = AuthenticationLayer::new(Box::new(EchoHandler), Arc::new(validator), AuthConfig::default());

        let res = layer.handle(request_with_auth("Bearer anything")).unwrap();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body["error"].as_str().unwrap().contains("corrupted key"));
    }
}
