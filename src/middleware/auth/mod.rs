//! 인증 레이어
//!
//! `Authorization` 헤더의 토큰을 외부 검증기로 확인하고 사용자 ID를 요청에 주입합니다.

mod config;
mod layer;
mod validator;

pub use config::{AuthConfig, AuthSettings, ValidatorSource};
pub use layer::AuthenticationLayer;
pub use validator::{
    create_validator, validator_fn, BasicCredentialsValidator, Identity, SharedValidator,
    StaticTokenValidator, TokenValidator, ValidatorFn,
};
