use faceid_vecstore::VecError;
use thiserror::Error;

/// Errors returned by gallery operations.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("gallery: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("gallery: length mismatch: {vectors} vectors, {names} names")]
    LengthMismatch { vectors: usize, names: usize },

    #[error("gallery: name {0:?} is reserved for unmatched queries")]
    ReservedName(String),

    #[error("gallery: index_id {index_id} out of range (size {size})")]
    OutOfRange { index_id: usize, size: usize },

    #[error("gallery: corrupt: {0}")]
    CorruptGallery(String),

    #[error("gallery: index error: {0}")]
    Index(String),

    #[error("gallery: io error: {0}")]
    Io(String),

    #[error("gallery: serialization error: {0}")]
    Serialization(String),
}

impl From<VecError> for GalleryError {
    fn from(e: VecError) -> Self {
        match e {
            VecError::DimensionMismatch { got, want } => GalleryError::DimensionMismatch {
                expected: want,
                got,
            },
            other => GalleryError::Index(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(e: std::io::Error) -> Self {
        GalleryError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(e: serde_json::Error) -> Self {
        GalleryError::Serialization(e.to_string())
    }
}
