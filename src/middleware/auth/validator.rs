use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use crate::middleware::PipelineError;
use super::config::{AuthSettings, ValidatorSource};

/// 인증된 사용자 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

/// 토큰 검증기 트레이트
///
/// - `Ok(Some(identity))`: 검증 성공
/// - `Ok(None)`: 토큰 거부
/// - `Err(_)`: 검증기 자체의 장애 (인증 레이어가 500으로 변환)
pub trait TokenValidator: Send + Sync {
    fn validate_token(&self, token: &str) -> Result<Option<Identity>, PipelineError>;
}

pub type SharedValidator = Arc<dyn TokenValidator>;

/// 정적 토큰 테이블 기반 검증기
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, String>,
}

impl StaticTokenValidator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate_token(&self, token: &str) -> Result<Option<Identity>, PipelineError> {
        Ok(self.tokens.get(token).map(Identity::new))
    }
}

/// Basic 자격증명 검증기
///
/// 토큰은 `user:password`를 base64로 인코딩한 값이며, 비밀번호는 bcrypt 해시와 비교합니다.
///
/// # 지원하는 해시 알고리즘
/// - bcrypt ($2a$, $2b$, $2y$ 접두사)
///
/// # .htpasswd 파일 형식
/// ```text
/// user1:$2y$05$c4WoMPo3SXsafkva.HHa6uXQZWr7oboPiC2bT/r7q1BB8I2s0BRqC
/// user2:$2b$05$LgzK4lXJzxGHVoJ0KhO1E.eQE9L5.H4TD/w0Nz8cP6b/U.ik2M0FW
/// ```
#[derive(Debug, Clone, Default)]
pub struct BasicCredentialsValidator {
    users: HashMap<String, String>,
}

impl BasicCredentialsValidator {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// .htpasswd 파일에서 자격증명을 로드합니다.
    pub fn from_htpasswd<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::config(
                "authentication",
                format!("Failed to read htpasswd file {}: {}", path.display(), e),
            )
        })?;

        let users = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(':'))
            .map(|(user, hash)| (user.to_string(), hash.to_string()))
            .collect();

        Ok(Self { users })
    }

    fn decode(token: &str) -> Option<(String, String)> {
        let decoded = BASE64.decode(token.trim()).ok()?;
        let pair = String::from_utf8(decoded).ok()?;
        let (user, password) = pair.split_once(':')?;
        Some((user.to_string(), password.to_string()))
    }
}

impl TokenValidator for BasicCredentialsValidator {
    fn validate_token(&self, token: &str) -> Result<Option<Identity>, PipelineError> {
        let Some((username, password)) = Self::decode(token) else {
            return Ok(None);
        };

        let verified = self
            .users
            .get(&username)
            .map(|hash| verify_password(&password, hash))
            .unwrap_or(false);

        Ok(verified.then(|| Identity::new(username)))
    }
}

/// 비밀번호 검증 함수
fn verify_password(password: &str, hash: &str) -> bool {
    if hash.starts_with("$2") {
        bcrypt::verify(password, hash).unwrap_or(false)
    } else {
        // bcrypt가 아닌 해시는 지원하지 않음
        false
    }
}

/// 클로저 기반 검증기
pub struct ValidatorFn<F> {
    f: F,
}

pub fn validator_fn<F>(f: F) -> ValidatorFn<F>
where
    F: Fn(&str) -> Result<Option<Identity>, PipelineError> + Send + Sync,
{
    ValidatorFn { f }
}

impl<F> TokenValidator for ValidatorFn<F>
where
    F: Fn(&str) -> Result<Option<Identity>, PipelineError> + Send + Sync,
{
    fn validate_token(&self, token: &str) -> Result<Option<Identity>, PipelineError> {
        (self.f)(token)
    }
}

/// 검증기 팩토리
pub fn create_validator(settings: &AuthSettings) -> Result<SharedValidator, PipelineError> {
    settings.validate()?;

    match &settings.source {
        ValidatorSource::Tokens(tokens) => Ok(Arc::new(StaticTokenValidator::new(tokens.clone()))),
        ValidatorSource::Users(users) => {
            Ok(Arc::new(BasicCredentialsValidator::new(users.clone())))
        }
        ValidatorSource::Htpasswd(path) => {
            Ok(Arc::new(BasicCredentialsValidator::from_htpasswd(path)?))
        }
    }
}
