use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::VecError;
use crate::flat::FlatIndex;
use crate::hnsw::{HNSW, HNSWConfig};

/// Candidate is a single result from a nearest-neighbor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Insertion position of the matched vector.
    pub index_id: usize,

    /// Squared Euclidean distance between the query and matched vector.
    /// Lower values indicate higher similarity.
    pub distance: f32,
}

/// Orders candidates by ascending distance, breaking exact ties by the
/// lower `index_id`. NaN distances sort last.
pub fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index_id.cmp(&b.index_id))
}

/// VecIndex is the interface for nearest-neighbor search over an
/// append-only sequence of dense float32 vectors.
///
/// Vectors are addressed by their insertion position (`index_id`), which is
/// never reused. Implementations hold no locks of their own; the owner
/// serializes `append` against `search`.
pub trait VecIndex: Send + Sync {
    /// Vector dimension fixed at construction.
    fn dim(&self) -> usize;

    /// Append a vector and return its `index_id`.
    fn append(&mut self, vector: &[f32]) -> Result<usize, VecError>;

    /// Append multiple vectors at once. Every vector is checked before any
    /// is stored, so a dimension error leaves the index unchanged.
    fn append_batch(&mut self, vectors: &[&[f32]]) -> Result<Vec<usize>, VecError> {
        let want = self.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
            return Err(VecError::DimensionMismatch {
                got: bad.len(),
                want,
            });
        }
        vectors.iter().map(|v| self.append(v)).collect()
    }

    /// Return up to `top_k` nearest vectors to the query, ordered by
    /// [`rank`] (closest first, lower `index_id` on ties).
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Candidate>, VecError>;

    /// Return the stored vector at `index_id`.
    fn vector(&self, index_id: usize) -> Option<&[f32]>;

    /// Return the number of vectors in the index.
    fn len(&self) -> usize;

    /// Return true if the index contains no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// IndexKind selects the search structure used behind a gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndexKind {
    /// Exhaustive scan. Exact results.
    #[default]
    Flat,

    /// Hierarchical Navigable Small World graph. Zero values take the
    /// [`HNSWConfig`] defaults.
    Hnsw {
        #[serde(default)]
        m: usize,
        #[serde(default)]
        ef_construction: usize,
        #[serde(default)]
        ef_search: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

impl IndexKind {
    /// Build an empty index of this kind. Panics if `dim` is 0.
    pub fn build(&self, dim: usize) -> Box<dyn VecIndex> {
        self.build_with_capacity(dim, 0)
    }

    /// Like [`IndexKind::build`], reserving room for `rows` vectors up front
    /// where the structure supports it.
    pub fn build_with_capacity(&self, dim: usize, rows: usize) -> Box<dyn VecIndex> {
        match *self {
            IndexKind::Flat => Box::new(FlatIndex::with_capacity(dim, rows)),
            IndexKind::Hnsw {
                m,
                ef_construction,
                ef_search,
                seed,
            } => Box::new(HNSW::new(HNSWConfig {
                dim,
                m,
                ef_construction,
                ef_search,
                seed,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(index_id: usize, distance: f32) -> Candidate {
        Candidate { index_id, distance }
    }

    #[test]
    fn test_rank_by_distance_then_id() {
        let mut cs = vec![cand(3, 1.0), cand(1, 2.0), cand(0, 1.0), cand(2, 0.5)];
        cs.sort_by(rank);
        let ids: Vec<usize> = cs.iter().map(|c| c.index_id).collect();
        assert_eq!(ids, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_rank_nan_last() {
        let mut cs = vec![cand(0, f32::NAN), cand(1, 3.0)];
        cs.sort_by(rank);
        assert_eq!(cs[0].index_id, 1);
    }

    #[test]
    fn test_index_kind_yaml() {
        let flat: IndexKind = serde_yaml::from_str("kind: flat").unwrap();
        assert_eq!(flat, IndexKind::Flat);

        let hnsw: IndexKind = serde_yaml::from_str("kind: hnsw\nm: 8\nseed: 7").unwrap();
        assert_eq!(
            hnsw,
            IndexKind::Hnsw {
                m: 8,
                ef_construction: 0,
                ef_search: 0,
                seed: Some(7),
            }
        );
    }

    #[test]
    fn test_build() {
        let mut idx = IndexKind::Flat.build(3);
        assert_eq!(idx.dim(), 3);
        idx.append(&[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(idx.len(), 1);

        let idx = IndexKind::Hnsw {
            m: 0,
            ef_construction: 0,
            ef_search: 0,
            seed: Some(1),
        }
        .build(4);
        assert_eq!(idx.dim(), 4);
        assert!(idx.is_empty());
    }

    #[test]
    fn test_build_with_capacity() {
        for kind in [IndexKind::Flat, IndexKind::Hnsw { m: 0, ef_construction: 0, ef_search: 0, seed: Some(3) }] {
            let mut idx = kind.build_with_capacity(2, 8);
            assert!(idx.is_empty());
            idx.append_batch(&[&[0.0, 0.0], &[3.0, 4.0]]).unwrap();
            assert_eq!(idx.search(&[3.0, 4.0], 1).unwrap()[0].index_id, 1);
        }
    }

    #[test]
    fn test_append_batch_atomic() {
        let mut idx = IndexKind::Flat.build(2);
        let err = idx.append_batch(&[&[1.0, 0.0], &[1.0]]).unwrap_err();
        assert!(matches!(err, VecError::DimensionMismatch { got: 1, want: 2 }));
        assert!(idx.is_empty());

        let ids = idx.append_batch(&[&[1.0, 0.0], &[0.0, 1.0]]).unwrap();
        assert_eq!(ids, vec![0, 1]);
    }
}
