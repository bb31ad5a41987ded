//! Nearest-neighbor search over append-only embedding matrices.
//!
//! Two [`VecIndex`] implementations share one contract: results ordered by
//! squared Euclidean distance, exact ties broken by the lower `index_id`,
//! and an empty index answering every query with no candidates.
//!
//! - [`FlatIndex`]: exhaustive scan, exact.
//! - [`HNSW`]: hierarchical navigable small world graph, approximate.

pub mod distance;
pub mod error;
pub mod flat;
pub mod hnsw;
pub mod vecstore;

pub use distance::{l2, squared_l2};
pub use error::VecError;
pub use flat::FlatIndex;
pub use hnsw::{HNSW, HNSWConfig};
pub use vecstore::{Candidate, IndexKind, VecIndex, rank};
