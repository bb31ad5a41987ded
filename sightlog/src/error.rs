use thiserror::Error;

#[derive(Debug, Error)]
pub enum SightLogError {
    #[error("sightlog: io error: {0}")]
    Io(String),

    #[error("sightlog: serialization error: {0}")]
    Serialization(String),

    #[error("sightlog: line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl From<std::io::Error> for SightLogError {
    fn from(e: std::io::Error) -> Self {
        SightLogError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SightLogError {
    fn from(e: serde_json::Error) -> Self {
        SightLogError::Serialization(e.to_string())
    }
}
