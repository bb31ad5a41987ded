use std::fmt;

pub use faceid_gallery::UNKNOWN_LABEL;
use serde::Serialize;

/// Outcome of matching one query against the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", content = "name", rename_all = "lowercase")]
pub enum Decision {
    /// An enrolled identity passed the threshold.
    Identified(String),
    /// No enrolled identity passed the threshold.
    Unknown,
}

impl Decision {
    /// Matched identity name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Identified(name) => Some(name),
            Self::Unknown => None,
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Self::Identified(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identified(name) => write!(f, "{name}"),
            Self::Unknown => write!(f, "{UNKNOWN_LABEL}"),
        }
    }
}

/// A [`Decision`] together with the candidate that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    #[serde(flatten)]
    pub decision: Decision,

    /// Accepted candidate. `None` when the decision is Unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_id: Option<usize>,

    /// Exact L2 distance to the accepted candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Verdict {
    pub fn unknown() -> Self {
        Self {
            decision: Decision::Unknown,
            index_id: None,
            distance: None,
        }
    }
}
