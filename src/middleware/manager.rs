use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use super::auth::{create_validator, AuthSettings, SharedValidator};
use super::chain::{LayerSpec, Pipeline};
use super::config::{MiddlewareConfig, MiddlewareType};
use super::logging::{SharedSink, TracingSink};
use super::{Handler, PipelineError, SharedClock};

/// 설정만으로 표현할 수 없는 외부 협력자
#[derive(Default, Clone)]
pub struct Capabilities {
    /// 토큰 검증기. 없으면 인증 설정의 `source`로 생성합니다.
    pub validator: Option<SharedValidator>,
    /// 로그 싱크. 없으면 `TracingSink`를 사용합니다.
    pub sink: Option<SharedSink>,
    pub clock: Option<SharedClock>,
}

/// 미들웨어 설정으로부터 레이어 생성 정보를 만듭니다.
fn create_layer(config: &MiddlewareConfig, capabilities: &Capabilities) -> Result<LayerSpec, PipelineError> {
    debug!(
        "미들웨어 생성 시작: type={:?}, settings={:?}",
        config.middleware_type, config.settings
    );

    match config.middleware_type {
        MiddlewareType::Authentication => {
            let settings: AuthSettings = config.typed_settings()?;
            let validator = match &capabilities.validator {
                Some(validator) => validator.clone(),
                None => create_validator(&settings)?,
            };
            Ok(LayerSpec::Authentication {
                validator,
                config: settings.layer_config(),
            })
        }
        MiddlewareType::RateLimit => Ok(LayerSpec::RateLimit {
            config: config.typed_settings()?,
            store: None,
        }),
        MiddlewareType::Cache => Ok(LayerSpec::Cache(config.typed_settings()?)),
        MiddlewareType::Logging => {
            let sink = capabilities
                .sink
                .clone()
                .unwrap_or_else(|| Arc::new(TracingSink));
            Ok(LayerSpec::Logging(sink))
        }
    }
}

/// 설정된 미들웨어로 파이프라인을 구성합니다.
///
/// 비활성화된 항목은 건너뛰고, `order`가 낮은 항목이 바깥쪽에 놓입니다 (같으면 이름순).
/// 하나라도 생성에 실패하면 파이프라인 전체가 실패합니다.
pub fn build_pipeline<H: Handler + 'static>(
    middleware_configs: &HashMap<String, MiddlewareConfig>,
    capabilities: Capabilities,
    handler: H,
) -> Result<Pipeline, PipelineError> {
    // 정렬을 위해 Vec으로 변환
    let mut ordered_configs: Vec<_> = middleware_configs
        .iter()
        .filter(|(_, config)| config.enabled)
        .collect();
    ordered_configs.sort_by(|(a_name, a), (b_name, b)| {
        a.order.cmp(&b.order).then_with(|| a_name.cmp(b_name))
    });

    let mut builder = Pipeline::builder();
    if let Some(clock) = &capabilities.clock {
        builder = builder.clock(clock.clone());
    }

    for (name, config) in ordered_configs {
        let spec = create_layer(config, &capabilities).map_err(|e| {
            PipelineError::config(name.clone(), e.to_string())
        })?;
        builder = builder.add(spec);
    }

    let pipeline = builder.build(handler)?;
    info!(layers = ?pipeline.layer_names(), "미들웨어 체인 구성 완료");
    Ok(pipeline)
}
