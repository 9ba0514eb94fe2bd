use std::{collections::HashMap, env, fs, path::Path};
use serde::Deserialize;
use tracing::{debug, info};
use crate::middleware::config::MiddlewareConfig;

mod error;
pub mod logging;

pub use error::SettingsError;
pub use logging::{LogFormat, LogOutput, LogSettings};

pub type Result<T> = std::result::Result<T, SettingsError>;

/// 설정 파일 경로를 지정하는 환경 변수
pub const CONFIG_FILE_ENV: &str = "PIPELINE_CONFIG_FILE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 미들웨어 설정
    #[serde(default)]
    pub middleware: HashMap<String, MiddlewareConfig>,
}

impl Settings {
    /// `PIPELINE_CONFIG_FILE`이 있으면 TOML 파일에서, 없으면 환경 변수에서 설정을 읽습니다.
    pub fn load() -> Result<Self> {
        let settings = if let Ok(config_path) = env::var(CONFIG_FILE_ENV) {
            Self::from_toml_file(&config_path)?
        } else {
            Self::from_env()?
        };

        // 설정 생성 시점에 바로 검증
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("설정 파일 로드: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| SettingsError::FileError {
            path: path.to_string_lossy().to_string(),
            error: e,
        })?;

        let settings = Self::from_toml(&content)?;
        info!(
            middlewares = settings.middleware.len(),
            "설정 파일 로드 완료: {}",
            path.display()
        );
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LogSettings::from_env()?,
            middleware: HashMap::new(),
        })
    }

    /// 활성화된 미들웨어 설정을 검증합니다.
    pub fn validate(&self) -> Result<()> {
        for (name, middleware) in &self.middleware {
            if middleware.enabled {
                middleware.validate().map_err(|source| SettingsError::InvalidMiddleware {
                    name: name.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// 환경 변수를 파싱합니다. 변수가 없으면 `default`를 사용합니다.
pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}
