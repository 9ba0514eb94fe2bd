use std::fmt;
use std::sync::Arc;
use tracing::debug;
use super::auth::{AuthConfig, AuthenticationLayer, SharedValidator};
use super::cache::{CacheConfig, CacheLayer};
use super::logging::{LoggingLayer, SharedSink};
use super::rate_limit::{RateLimitConfig, RateLimitLayer, RateLimitStore};
use super::{BoxHandler, Handler, PipelineError, Request, Response, SharedClock, SystemClock};

type WrapFn = Box<dyn FnOnce(BoxHandler) -> BoxHandler + Send>;

/// 체인에 쌓을 레이어 하나의 생성 정보
pub enum LayerSpec {
    Authentication {
        validator: SharedValidator,
        config: AuthConfig,
    },
    RateLimit {
        config: RateLimitConfig,
        store: Option<Arc<dyn RateLimitStore>>,
    },
    Cache(CacheConfig),
    Logging(SharedSink),
    Custom {
        name: String,
        wrap: WrapFn,
    },
}

impl LayerSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::RateLimit { .. } => "rate-limit",
            Self::Cache(_) => "cache",
            Self::Logging(_) => "logging",
            Self::Custom { name, .. } => name.as_str(),
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        match self {
            Self::RateLimit { config, .. } => config.validate(),
            Self::Cache(config) => config.validate(),
            Self::Authentication { config, .. } => {
                if config.identity_key.is_empty() {
                    return Err(PipelineError::config("authentication", "identity key is empty"));
                }
                Ok(())
            }
            Self::Logging(_) | Self::Custom { .. } => Ok(()),
        }
    }

    fn wrap(self, inner: BoxHandler, clock: &SharedClock) -> BoxHandler {
        match self {
            Self::Authentication { validator, config } => {
                Box::new(AuthenticationLayer::new(inner, validator, config))
            }
            Self::RateLimit { config, store: Some(store) } => {
                Box::new(RateLimitLayer::with_store(inner, config, store, clock.clone()))
            }
            Self::RateLimit { config, store: None } => {
                Box::new(RateLimitLayer::new(inner, config, clock.clone()))
            }
            Self::Cache(config) => Box::new(CacheLayer::new(inner, config, clock.clone())),
            Self::Logging(sink) => Box::new(LoggingLayer::new(inner, sink, clock.clone())),
            Self::Custom { wrap, .. } => wrap(inner),
        }
    }
}

impl fmt::Debug for LayerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LayerSpec").field(&self.name()).finish()
    }
}

/// 레이어 체인 빌더
///
/// 먼저 추가한 레이어가 가장 바깥에 위치하며 요청을 가장 먼저 받습니다.
///
/// ```
/// use std::sync::Arc;
/// use request_pipeline::middleware::{
///     auth::StaticTokenValidator, cache::CacheConfig, logging::TracingSink,
///     rate_limit::RateLimitConfig, EchoHandler, Pipeline,
/// };
///
/// let validator = StaticTokenValidator::default().with_token("secret", "user_123");
/// let pipeline = Pipeline::builder()
///     .cache(CacheConfig::default())
///     .logging(Arc::new(TracingSink))
///     .rate_limit(RateLimitConfig::new(2))
///     .authentication(Arc::new(validator))
///     .build(EchoHandler)
///     .unwrap();
///
/// assert_eq!(pipeline.layer_names(), ["cache", "logging", "rate-limit", "authentication"]);
/// ```
pub struct PipelineBuilder {
    layers: Vec<LayerSpec>,
    clock: SharedClock,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 속도 제한과 캐시가 사용할 시계를 지정합니다.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn add(mut self, spec: LayerSpec) -> Self {
        self.layers.push(spec);
        self
    }

    pub fn authentication(self, validator: SharedValidator) -> Self {
        self.authentication_with(validator, AuthConfig::default())
    }

    pub fn authentication_with(self, validator: SharedValidator, config: AuthConfig) -> Self {
        self.add(LayerSpec::Authentication { validator, config })
    }

    pub fn rate_limit(self, config: RateLimitConfig) -> Self {
        self.add(LayerSpec::RateLimit { config, store: None })
    }

    pub fn rate_limit_with_store(self, config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        self.add(LayerSpec::RateLimit {
            config,
            store: Some(store),
        })
    }

    pub fn cache(self, config: CacheConfig) -> Self {
        self.add(LayerSpec::Cache(config))
    }

    pub fn logging(self, sink: SharedSink) -> Self {
        self.add(LayerSpec::Logging(sink))
    }

    /// 사용자 정의 레이어를 추가합니다.
    pub fn layer<F>(self, name: impl Into<String>, wrap: F) -> Self
    where
        F: FnOnce(BoxHandler) -> BoxHandler + Send + 'static,
    {
        self.add(LayerSpec::Custom {
            name: name.into(),
            wrap: Box::new(wrap),
        })
    }

    /// 최종 핸들러를 감싸 파이프라인을 생성합니다.
    pub fn build<H: Handler + 'static>(self, handler: H) -> Result<Pipeline, PipelineError> {
        for spec in &self.layers {
            spec.validate()?;
        }

        let layer_names: Vec<String> = self.layers.iter().map(|spec| spec.name().to_string()).collect();
        debug!(layers = ?layer_names, "파이프라인 구성");

        // 안쪽 레이어부터 감싸기
        let mut root: BoxHandler = Box::new(handler);
        for spec in self.layers.into_iter().rev() {
            root = spec.wrap(root, &self.clock);
        }

        Ok(Pipeline { root, layer_names })
    }
}

/// 구성이 끝난 요청 처리 파이프라인
///
/// 생성 후에는 변경할 수 없으며, 레이어를 바꾸려면 새로 빌드해야 합니다.
/// 여러 스레드에서 동시에 `handle`을 호출할 수 있습니다.
pub struct Pipeline {
    root: BoxHandler,
    layer_names: Vec<String>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// 바깥쪽부터 나열한 레이어 이름
    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }
}

impl Handler for Pipeline {
    fn handle(&self, req: Request) -> Result<Response, PipelineError> {
        self.root.handle(req)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layer_names)
            .finish()
    }
}
