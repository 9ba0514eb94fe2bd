use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use super::auth::AuthSettings;
use super::cache::CacheConfig;
use super::rate_limit::RateLimitConfig;
use super::PipelineError;

/// 미들웨어 종류
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MiddlewareType {
    Authentication,
    RateLimit,
    Cache,
    Logging,
}

impl MiddlewareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::RateLimit => "rate-limit",
            Self::Cache => "cache",
            Self::Logging => "logging",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MiddlewareConfig {
    /// 미들웨어 타입
    pub middleware_type: MiddlewareType,

    /// 미들웨어 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 체인 내 위치 (낮은 숫자가 바깥쪽, 먼저 실행)
    #[serde(default)]
    pub order: i32,

    /// 미들웨어별 설정
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl MiddlewareConfig {
    pub fn new(middleware_type: MiddlewareType, order: i32) -> Self {
        Self {
            middleware_type,
            enabled: true,
            order,
            settings: HashMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// TOML 설정에서 미들웨어 설정을 파싱합니다.
    pub fn from_toml(config: &str) -> Result<HashMap<String, Self>, toml::de::Error> {
        #[derive(Deserialize)]
        struct Config {
            #[serde(default)]
            middleware: HashMap<String, MiddlewareConfig>,
        }

        let config: Config = toml::from_str(config)?;
        Ok(config.middleware)
    }

    /// `settings` 맵을 타입이 있는 설정으로 변환합니다.
    pub fn typed_settings<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let value = serde_json::Value::Object(
            self.settings.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        );
        serde_json::from_value(value)
            .map_err(|e| PipelineError::config(self.middleware_type.as_str(), e.to_string()))
    }

    /// 설정 값이 해당 미들웨어의 조건을 만족하는지 검증합니다.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self.middleware_type {
            MiddlewareType::Authentication => self.typed_settings::<AuthSettings>()?.validate(),
            MiddlewareType::RateLimit => self.typed_settings::<RateLimitConfig>()?.validate(),
            MiddlewareType::Cache => self.typed_settings::<CacheConfig>()?.validate(),
            MiddlewareType::Logging => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            [middleware.limiter]
            middleware_type = "rate-limit"
            enabled = true
            order = 1

            [middleware.limiter.settings]
            requestsPerWindow = 2
            windowSeconds = 60
        "#;

        let configs = MiddlewareConfig::from_toml(toml_str).unwrap();
        assert_eq!(configs.len(), 1);

        let config = configs.get("limiter").unwrap();
        assert_eq!(config.middleware_type, MiddlewareType::RateLimit);
        assert!(config.enabled);
        assert_eq!(config.order, 1);

        let limit: RateLimitConfig = config.typed_settings().unwrap();
        assert_eq!(limit.requests_per_window, 2);
    }

    #[test]
    fn test_defaults() {
        let toml_str = r#"
            [middleware.log]
            middleware_type = "logging"
        "#;

        let configs = MiddlewareConfig::from_toml(toml_str).unwrap();
        let config = configs.get("log").unwrap();
        assert!(config.enabled);
        assert_eq!(config.order, 0);
        assert!(config.settings.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let toml_str = r#"
            [middleware.cors]
            middleware_type = "cors"
        "#;

        assert!(MiddlewareConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_validate_reports_bad_settings() {
        let config = MiddlewareConfig::new(MiddlewareType::RateLimit, 0)
            .with_setting("requestsPerWindow", json!(0));
        assert!(matches!(config.validate(), Err(PipelineError::Config { .. })));

        let config = MiddlewareConfig::new(MiddlewareType::Cache, 0)
            .with_setting("ttlSeconds", json!("soon"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_auth_without_source() {
        let config = MiddlewareConfig::new(MiddlewareType::Authentication, 0)
            .with_setting("scheme", json!("Bearer"));
        assert!(matches!(config.validate(), Err(PipelineError::Config { .. })));

        let config = config.with_setting("source", json!({ "tokens": { "secret": "user_123" } }));
        assert!(config.validate().is_ok());
    }
}
