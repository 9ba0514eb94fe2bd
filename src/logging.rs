use std::time::Duration;
use tracing::{debug, info, warn, error, Level, span};
use tracing_appender::non_blocking::WorkerGuard;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use crate::middleware::Request;
use crate::settings::{LogFormat, LogOutput, LogSettings};

/// 전역 tracing 구독자를 설치합니다.
///
/// 반환되는 `WorkerGuard`는 프로세스 종료 시까지 유지해야 버퍼가 비워집니다.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = std::path::Path::new(path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "request_pipeline.log".to_string());
            let appender = tracing_appender::rolling::daily(
                directory.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            tracing_appender::non_blocking(appender)
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::new(Rfc3339))
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true);

    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_file(true).with_line_number(true).try_init(),
    };

    if let Err(e) = installed {
        // 테스트 등에서 이미 구독자가 설치된 경우
        eprintln!("로깅 초기화 건너뜀: {}", e);
    }
    guard
}

/// 요청 하나의 처리 결과 기록
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            status_code: None,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn with_request(&mut self, req: &Request) {
        self.method = req.method.to_string();
        self.path = req.path.clone();

        debug!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "Received request"
        );
    }

    pub fn with_response(&mut self, status: http::StatusCode) {
        self.status_code = Some(status.as_u16());
    }

    pub fn with_duration(&mut self, duration: Duration) {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    pub fn level(&self) -> Level {
        if self.error.is_some() {
            Level::ERROR
        } else if self.status_code.is_some_and(|status| status >= 400) {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

pub fn log_request(log: &RequestLog) {
    let level = log.level();
    let status = log.status_code.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());

    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        method = %log.method,
        path = %log.path,
        status = %status,
        duration_ms = %log.duration_ms
    );
    let _enter = span.enter();

    if level == Level::ERROR {
        error!(error = ?log.error, "Request failed");
    } else if level == Level::WARN {
        warn!("Request completed with warning");
    } else {
        info!("Request completed successfully");
    }
}
