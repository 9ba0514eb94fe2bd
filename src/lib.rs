//! Request Pipeline은 요청 처리 핸들러 바깥에 미들웨어 레이어를 쌓는 라이브러리입니다.
//!
//! # 주요 기능
//!
//! - Bearer 토큰 인증과 사용자 ID 주입
//! - 클라이언트별 슬라이딩 윈도우 속도 제한
//! - GET 응답 캐시 (`X-Cache: HIT/MISS`)
//! - 요청 단위 구조화 로깅
//!
//! # 예제
//!
//! ```
//! use std::sync::Arc;
//! use http::StatusCode;
//! use request_pipeline::middleware::{
//!     auth::StaticTokenValidator, rate_limit::RateLimitConfig, EchoHandler, Handler, Pipeline, Request,
//! };
//!
//! let validator = StaticTokenValidator::default().with_token("test_token", "user_123");
//! let pipeline = Pipeline::builder()
//!     .rate_limit(RateLimitConfig::new(2))
//!     .authentication(Arc::new(validator))
//!     .build(EchoHandler)
//!     .unwrap();
//!
//! let req = Request::get("/api/data")
//!     .header("Authorization", "Bearer test_token")
//!     .build()
//!     .unwrap();
//! let res = pipeline.handle(req).unwrap();
//!
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.body["data"]["user_id"], "user_123");
//! ```
//!
//! # 설정 파일
//!
//! `PIPELINE_CONFIG_FILE` 환경 변수로 TOML 파일을 지정하면 미들웨어 체인을 설정으로 구성할 수 있습니다.
//!
//! ```
//! use request_pipeline::middleware::{build_pipeline, Capabilities, EchoHandler};
//! use request_pipeline::settings::Settings;
//!
//! let settings = Settings::from_toml(r#"
//!     [middleware.limiter]
//!     middleware_type = "rate-limit"
//!     order = 1
//!
//!     [middleware.limiter.settings]
//!     requestsPerWindow = 10
//!
//!     [middleware.cache]
//!     middleware_type = "cache"
//!     order = 0
//! "#).unwrap();
//!
//! let pipeline = build_pipeline(&settings.middleware, Capabilities::default(), EchoHandler).unwrap();
//! assert_eq!(pipeline.layer_names(), ["cache", "rate-limit"]);
//! ```

pub mod logging;
pub mod middleware;
pub mod settings;
