//! Exact-distance acceptance over ranked candidates.
//!
//! The index may rank candidates approximately. The accept decision is
//! always made on a fresh exact L2 distance between the query and the stored
//! embedding, so it is reproducible regardless of the index in use.
//!
//! # Policy
//!
//! Candidates are walked in the order given. The **first** one whose exact
//! distance is within the threshold wins, even if a later candidate is
//! closer. With an exact index the two coincide.

use faceid_gallery::GalleryView;
use faceid_vecstore::{Candidate, l2};

use crate::decision::{Decision, Verdict};

/// Decides the identity for one query. See [`match_one`].
pub fn verify_one(
    query: &[f32],
    candidates: &[Candidate],
    gallery: &GalleryView<'_>,
    threshold: f32,
) -> Decision {
    match_one(query, candidates, gallery, threshold).decision
}

/// Walks `candidates` in order and accepts the first one whose exact L2
/// distance to `query` is `<= threshold`.
///
/// `threshold` is in Euclidean (L2) distance units, not squared. Revoked
/// records and ids the gallery does not hold are skipped. A NaN or negative
/// threshold accepts nothing.
pub fn match_one(
    query: &[f32],
    candidates: &[Candidate],
    gallery: &GalleryView<'_>,
    threshold: f32,
) -> Verdict {
    for c in candidates {
        let Ok((vector, record)) = gallery.entry(c.index_id) else {
            continue;
        };
        if record.revoked {
            continue;
        }
        let distance = l2(query, vector);
        if distance <= threshold {
            return Verdict {
                decision: Decision::Identified(record.name.clone()),
                index_id: Some(c.index_id),
                distance: Some(distance),
            };
        }
    }
    Verdict::unknown()
}
