use crate::distance::squared_l2;
use crate::error::VecError;
use crate::vecstore::{Candidate, VecIndex, rank};

/// FlatIndex is an exhaustive VecIndex over a row-major matrix.
///
/// Each search computes the distance to every stored vector and keeps the
/// k smallest by partial selection: O(N·D) per query, amortized O(D) per
/// append. Results are exact.
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index. Panics if `dim` is 0.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "vecstore: FlatIndex dim must be positive");
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Create an empty index with room for `rows` vectors.
    pub fn with_capacity(dim: usize, rows: usize) -> Self {
        let mut idx = Self::new(dim);
        idx.data.reserve(rows.saturating_mul(dim));
        idx
    }
}

impl VecIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn append(&mut self, vector: &[f32]) -> Result<usize, VecError> {
        if vector.len() != self.dim {
            return Err(VecError::DimensionMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let id = self.len();
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Candidate>, VecError> {
        if query.len() != self.dim {
            return Err(VecError::DimensionMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        if self.data.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let mut results: Vec<Candidate> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(index_id, row)| Candidate {
                index_id,
                distance: squared_l2(query, row),
            })
            .collect();

        if results.len() > top_k {
            results.select_nth_unstable_by(top_k - 1, rank);
            results.truncate(top_k);
        }
        results.sort_by(rank);

        Ok(results)
    }

    fn vector(&self, index_id: usize) -> Option<&[f32]> {
        let start = index_id.checked_mul(self.dim)?;
        self.data.get(start..start.checked_add(self.dim)?)
    }

    fn len(&self) -> usize {
        self.data.len() / self.dim
    }
}
