use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::middleware::PipelineError;

/// 인증 레이어 동작 설정
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    /// 허용할 인증 스킴 (예: `Bearer`, `Basic`). `None`이면 모든 스킴을 허용합니다.
    pub scheme: Option<String>,

    /// 인증된 사용자 ID를 주입할 요청 본문 키
    pub identity_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scheme: None,
            identity_key: default_identity_key(),
        }
    }
}

impl AuthConfig {
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            ..Self::default()
        }
    }
}

fn default_identity_key() -> String {
    "user_id".to_string()
}

/// 토큰 검증기 소스 설정
///
/// # TOML 예시
///
/// ```toml
/// [middleware.auth]
/// middleware_type = "authentication"
/// order = 1
///
/// [middleware.auth.settings]
/// scheme = "Bearer"
/// source = { tokens = { "secret-token" = "user_123" } }
/// ```
///
/// ```toml
/// [middleware.auth.settings]
/// scheme = "Basic"
/// source = { htpasswd = "/etc/pipeline/.htpasswd" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorSource {
    /// 토큰 → 사용자 ID 테이블
    Tokens(HashMap<String, String>),
    /// 사용자 이름 → bcrypt 해시 테이블
    Users(HashMap<String, String>),
    /// .htpasswd 파일 경로
    Htpasswd(String),
}

impl Default for ValidatorSource {
    fn default() -> Self {
        Self::Tokens(HashMap::new())
    }
}

/// 설정 파일에서 읽어들이는 인증 레이어 설정
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default = "default_identity_key")]
    pub identity_key: String,

    #[serde(default)]
    pub source: ValidatorSource,
}

impl AuthSettings {
    pub fn layer_config(&self) -> AuthConfig {
        AuthConfig {
            scheme: self.scheme.clone(),
            identity_key: self.identity_key.clone(),
        }
    }

    /// 검증기를 만들 수 있는 설정인지 확인합니다.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let problem = match &self.source {
            ValidatorSource::Tokens(tokens) if tokens.is_empty() => Some("token table is empty"),
            ValidatorSource::Users(users) if users.is_empty() => Some("user table is empty"),
            ValidatorSource::Htpasswd(path) if path.trim().is_empty() => Some("htpasswd path is empty"),
            _ if self.identity_key.is_empty() => Some("identity key is empty"),
            _ => None,
        };

        match problem {
            Some(message) => Err(PipelineError::config("authentication", message)),
            None => Ok(()),
        }
    }
}
