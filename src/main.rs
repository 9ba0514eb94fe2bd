use std::error::Error;
use std::sync::Arc;
use request_pipeline::logging::init_logging;
use request_pipeline::middleware::{
    auth::StaticTokenValidator, build_pipeline, cache::CacheConfig, logging::TracingSink,
    rate_limit::RateLimitConfig, Capabilities, EchoHandler, Handler, Pipeline, Request, Response,
};
use request_pipeline::settings::Settings;
use tracing::{error, info};

/// 설정에 미들웨어가 없을 때 사용하는 기본 체인
fn default_pipeline() -> Result<Pipeline, Box<dyn Error>> {
    let validator = StaticTokenValidator::default().with_token("test_token", "user_123");

    let pipeline = Pipeline::builder()
        .cache(CacheConfig::default())
        .logging(Arc::new(TracingSink))
        .rate_limit(RateLimitConfig::new(2))
        .authentication(Arc::new(validator))
        .build(EchoHandler)?;
    Ok(pipeline)
}

fn print_response(label: &str, res: &Response) {
    println!(
        "{}: {} {} (X-Cache: {})",
        label,
        res.status.as_u16(),
        res.body,
        res.header("x-cache").unwrap_or("-")
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::load().map_err(|e| {
        eprintln!("설정 로드 실패: {}", e);
        e
    })?;

    let _guard = init_logging(&settings.logging);

    let pipeline = if settings.middleware.is_empty() {
        info!("설정된 미들웨어가 없어 기본 체인을 사용합니다");
        default_pipeline()?
    } else {
        build_pipeline(&settings.middleware, Capabilities::default(), EchoHandler)?
    };
    info!(layers = ?pipeline.layer_names(), "파이프라인 준비 완료");

    let requests = vec![
        ("Request 1", Request::get("/api/data")
            .header("Authorization", "Bearer test_token")
            .header("X-Forwarded-For", "192.168.1.1")
            .query("page", "1")
            .build()?),
        ("Request 2 (cached)", Request::get("/api/data")
            .header("Authorization", "Bearer test_token")
            .header("X-Forwarded-For", "192.168.1.1")
            .query("page", "1")
            .build()?),
        ("Request 3", Request::get("/api/data")
            .header("Authorization", "Bearer test_token")
            .header("X-Forwarded-For", "192.168.1.1")
            .query("page", "2")
            .build()?),
        ("Invalid token", Request::get("/api/profile")
            .header("Authorization", "Bearer wrong_token")
            .header("X-Forwarded-For", "192.168.1.2")
            .build()?),
    ];

    for (label, req) in requests {
        let res = match pipeline.handle(req) {
            Ok(res) => res,
            Err(e) => {
                error!(error = %e, "요청 처리 실패");
                e.into_response()
            }
        };
        print_response(label, &res);
    }

    Ok(())
}
