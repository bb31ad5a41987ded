use thiserror::Error;

/// Errors returned while loading or validating a [`crate::ServiceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: io error: {0}")]
    Io(String),

    #[error("config: parse error: {0}")]
    Parse(String),

    #[error("config: invalid: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
