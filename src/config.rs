use std::time::Duration;

pub const ENV_API_URL: &str = "WASTE_MATCH_API_URL";
pub const ENV_TIMEOUT_MS: &str = "WASTE_MATCH_TIMEOUT_MS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` leaves requests without a deadline.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API url (expected http:// or https://): {value}")]
    InvalidUrl { value: String },
    #[error("invalid {ENV_TIMEOUT_MS} value: {value}")]
    InvalidTimeout { value: String },
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(mut getter: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = getter(ENV_API_URL)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = match getter(ENV_TIMEOUT_MS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
                _ => return Err(ConfigError::InvalidTimeout { value }),
            },
            None => None,
        };

        Ok(Self {
            base_url: normalize_url(&base_url)?,
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_url(url)?;
        Ok(self)
    }
}

fn normalize_url(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl {
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
