//! Environment configuration.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::identifier::SessionId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Mock,
    Http,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Http => "http",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported ASSIST_PROVIDER '{0}' (expected 'mock' or 'http')")]
    UnknownProvider(String),

    #[error("invalid ASSIST_TIMEOUT_SECS '{0}': expected a positive integer")]
    InvalidTimeout(String),
}

#[derive(Clone, Default)]
pub struct EnvConfig {
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub engine: Option<String>,
    pub timeout: Option<Duration>,
    pub transcript_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub session_id: Option<SessionId>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            provider: parse_provider(env_string_opt("ASSIST_PROVIDER"))?,
            base_url: env_string_opt("ASSIST_BASE_URL"),
            access_token: env_string_opt("ASSIST_ACCESS_TOKEN"),
            engine: env_string_opt("ASSIST_ENGINE"),
            timeout: parse_timeout(env_string_opt("ASSIST_TIMEOUT_SECS"))?,
            transcript_dir: env_string_opt("ASSIST_TRANSCRIPT_DIR").map(PathBuf::from),
            log_filter: env_string_opt("ASSIST_LOG"),
            session_id: env_string_opt("ASSIST_SESSION_ID").map(parse_session_id),
        })
    }
}

impl fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("engine", &self.engine)
            .field("timeout", &self.timeout)
            .field("transcript_dir", &self.transcript_dir)
            .field("log_filter", &self.log_filter)
            .field("session_id", &self.session_id)
            .finish()
    }
}

fn parse_provider(value: Option<String>) -> Result<ProviderKind, ConfigError> {
    let Some(value) = value else {
        return Ok(ProviderKind::default());
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "mock" => Ok(ProviderKind::Mock),
        "http" => Ok(ProviderKind::Http),
        _ => Err(ConfigError::UnknownProvider(value)),
    }
}

fn parse_timeout(value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ConfigError::InvalidTimeout(value)),
    }
}

fn parse_session_id(value: String) -> SessionId {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(id) => SessionId::Numeric(id),
        Err(_) => SessionId::Text(value.to_owned()),
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
