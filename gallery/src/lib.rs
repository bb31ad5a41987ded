//! Append-only gallery of enrolled face embeddings.
//!
//! A [`Gallery`] owns the embeddings, one [`IdentityRecord`] per embedding,
//! and a nearest-neighbor index over them. Embeddings are addressed by
//! `index_id`, their insertion position, which is stable for the gallery's
//! lifetime: rows are never removed, only tombstoned via
//! [`Gallery::revoke`].
//!
//! # Usage
//!
//! ```
//! use faceid_gallery::Gallery;
//!
//! let gallery = Gallery::with_flat_index(4);
//! let ids = gallery
//!     .add(&[&[0.0, 0.0, 0.0, 0.0], &[10.0, 10.0, 10.0, 10.0]], &["alice", "bob"])
//!     .unwrap();
//! assert_eq!(ids, vec![0, 1]);
//!
//! let candidates = gallery.query(&[9.0, 9.0, 9.0, 9.0], 1).unwrap();
//! assert_eq!(candidates[0].index_id, 1);
//! ```
//!
//! # Persistence
//!
//! [`Gallery::save`] writes two row-aligned artifacts into a directory:
//! `embeddings.bin` (dense little-endian matrix) and `identities.jsonl`
//! (one record per line). [`Gallery::open`] refuses to load them unless
//! the row counts, the dimension and every `index_id` agree.

mod error;
mod gallery;
mod identity;
pub mod persist;

pub use error::GalleryError;
pub use gallery::{Gallery, GalleryConfig, GalleryView};
pub use identity::{Enrollment, IdentityRecord, UNKNOWN_LABEL};
pub use persist::{EMBEDDINGS_FILE, IDENTITIES_FILE, Matrix};
