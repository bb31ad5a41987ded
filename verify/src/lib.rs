//! Face identity verification over an embedding gallery.
//!
//! # Pipeline
//!
//! For each query embedding:
//!
//! 1. The gallery's index returns the top-k [`Candidate`]s by squared L2
//!    distance (ties: lower `index_id` first).
//! 2. [`match_one`] recomputes the exact L2 distance to each candidate in
//!    rank order and accepts the first within the threshold.
//! 3. The result is a [`Decision`]: `Identified(name)` or `Unknown`.
//!
//! An empty gallery or a query with no passing candidate is `Unknown`, not
//! an error.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use faceid_gallery::Gallery;
//! use faceid_verify::{Decision, VerificationService};
//!
//! let gallery = Arc::new(Gallery::with_flat_index(4));
//! gallery
//!     .add(&[&[0.0, 0.0, 0.0, 0.0], &[10.0, 10.0, 10.0, 10.0]], &["alice", "bob"])
//!     .unwrap();
//!
//! let svc = VerificationService::new(gallery);
//! let decisions = svc
//!     .verify(&[[0.0f32, 0.0, 0.0, 0.0], [5.0, 5.0, 5.0, 5.0]], 2, 5.0)
//!     .unwrap();
//! assert_eq!(decisions, vec![Decision::Identified("alice".into()), Decision::Unknown]);
//! ```
//!
//! [`Candidate`]: faceid_vecstore::Candidate

mod config;
mod decision;
mod error;
mod service;
pub mod verifier;

pub use config::{DEFAULT_THRESHOLD, DEFAULT_TOP_K, ServiceConfig};
pub use decision::{Decision, UNKNOWN_LABEL, Verdict};
pub use error::ConfigError;
pub use service::VerificationService;
pub use verifier::{match_one, verify_one};
