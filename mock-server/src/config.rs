//! Mock server configuration read from the environment.

use thiserror::Error;

/// Settings for the `mock-server` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port bound on 127.0.0.1 (`PORT`, default 3000).
    pub port: u16,
    /// Plan codes that exist at startup (`MOCK_PLANS`, comma-separated,
    /// default `gold`).
    pub plans: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            plans: vec!["gold".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(plans) = lookup("MOCK_PLANS") {
            config.plans = plans
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}
