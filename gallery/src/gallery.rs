use std::collections::BTreeMap;
use std::fmt;

use faceid_vecstore::{Candidate, IndexKind, VecIndex};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::error::GalleryError;
use crate::identity::{Enrollment, IdentityRecord, UNKNOWN_LABEL};

/// Controls gallery construction.
#[derive(Debug, Clone, Default)]
pub struct GalleryConfig {
    /// Embedding dimension (e.g. 128 or 512). Fixed for the gallery's lifetime.
    pub dim: usize,

    /// Search structure kept in sync with the stored embeddings.
    pub index: IndexKind,
}

pub(crate) struct GalleryInner {
    pub(crate) index: Box<dyn VecIndex>,
    pub(crate) records: Vec<IdentityRecord>,
}

impl GalleryInner {
    fn append(
        &mut self,
        vectors: &[&[f32]],
        meta: impl Iterator<Item = (String, BTreeMap<String, String>)>,
    ) -> Result<Vec<usize>, GalleryError> {
        let meta: Vec<_> = meta.collect();
        if let Some((name, _)) = meta.iter().find(|(name, _)| name == UNKNOWN_LABEL) {
            return Err(GalleryError::ReservedName(name.clone()));
        }
        // append_batch checks every vector before storing any.
        let ids = self.index.append_batch(vectors)?;
        for (&index_id, (name, attributes)) in ids.iter().zip(meta) {
            self.records.push(IdentityRecord {
                index_id,
                name,
                attributes,
                revoked: false,
            });
        }
        Ok(ids)
    }
}

/// Append-only set of enrolled (embedding, identity) pairs with a
/// nearest-neighbor index kept consistent with it.
///
/// One reader-writer lock guards embeddings, records and index together:
/// [`Gallery::add`], [`Gallery::enroll`] and [`Gallery::revoke`] are
/// exclusive, while lookups and queries run in parallel.
pub struct Gallery {
    dim: usize,
    kind: IndexKind,
    inner: RwLock<GalleryInner>,
}

impl fmt::Debug for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gallery")
            .field("dim", &self.dim)
            .field("index", &self.kind)
            .field("size", &self.size())
            .finish()
    }
}

impl Gallery {
    /// Creates an empty gallery. Panics if `cfg.dim` is 0.
    pub fn new(cfg: GalleryConfig) -> Self {
        assert!(cfg.dim > 0, "gallery: GalleryConfig.dim must be positive");
        let index = cfg.index.build(cfg.dim);
        Self {
            dim: cfg.dim,
            kind: cfg.index,
            inner: RwLock::new(GalleryInner {
                index,
                records: Vec::new(),
            }),
        }
    }

    /// Creates an empty gallery searched by exhaustive scan.
    pub fn with_flat_index(dim: usize) -> Self {
        Self::new(GalleryConfig {
            dim,
            index: IndexKind::Flat,
        })
    }

    pub(crate) fn from_inner(cfg: GalleryConfig, inner: GalleryInner) -> Self {
        Self {
            dim: cfg.dim,
            kind: cfg.index,
            inner: RwLock::new(inner),
        }
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Index kind used for candidate search.
    pub fn index_kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Enrolls `vectors[i]` under `names[i]` and returns the assigned
    /// `index_id`s, consecutive from the previous size.
    ///
    /// All-or-nothing: a length or dimension error leaves the gallery
    /// unchanged.
    pub fn add(&self, vectors: &[&[f32]], names: &[&str]) -> Result<Vec<usize>, GalleryError> {
        if vectors.len() != names.len() {
            return Err(GalleryError::LengthMismatch {
                vectors: vectors.len(),
                names: names.len(),
            });
        }

        let mut inner = self.inner.write();
        let ids = inner.append(
            vectors,
            names.iter().map(|n| (n.to_string(), BTreeMap::new())),
        )?;
        debug!("gallery: added {} embeddings, size {}", ids.len(), inner.records.len());
        Ok(ids)
    }

    /// Like [`Gallery::add`], with attributes carried per entry.
    pub fn enroll(&self, entries: &[Enrollment]) -> Result<Vec<usize>, GalleryError> {
        let vectors: Vec<&[f32]> = entries.iter().map(|e| e.vector.as_slice()).collect();

        let mut inner = self.inner.write();
        let ids = inner.append(
            &vectors,
            entries.iter().map(|e| (e.name.clone(), e.attributes.clone())),
        )?;
        debug!("gallery: enrolled {} embeddings, size {}", ids.len(), inner.records.len());
        Ok(ids)
    }

    /// Returns a copy of the embedding and identity record at `index_id`.
    pub fn get(&self, index_id: usize) -> Result<(Vec<f32>, IdentityRecord), GalleryError> {
        let view = self.read();
        let (vector, record) = view.entry(index_id)?;
        Ok((vector.to_vec(), record.clone()))
    }

    /// Returns the number of enrolled embeddings, revoked ones included.
    pub fn size(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if nothing has been enrolled.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the number of revoked records.
    pub fn revoked_count(&self) -> usize {
        self.inner.read().records.iter().filter(|r| r.revoked).count()
    }

    /// Top-k candidates for `vector`. See [`GalleryView::query`].
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, GalleryError> {
        self.read().query(vector, k)
    }

    /// Marks `index_id` as revoked. The row and its id stay in place; the
    /// verifier skips it from now on.
    ///
    /// Returns false if the record was already revoked.
    pub fn revoke(&self, index_id: usize) -> Result<bool, GalleryError> {
        let mut inner = self.inner.write();
        let size = inner.records.len();
        let record = inner
            .records
            .get_mut(index_id)
            .ok_or(GalleryError::OutOfRange { index_id, size })?;
        if record.revoked {
            return Ok(false);
        }
        record.revoked = true;
        debug!("gallery: revoked index_id {} ({})", index_id, record.name);
        Ok(true)
    }

    /// Acquires a consistent read view. Writers block until it is dropped.
    pub fn read(&self) -> GalleryView<'_> {
        GalleryView {
            dim: self.dim,
            inner: self.inner.read(),
        }
    }
}

/// Read-locked view of a [`Gallery`]. Every call on one view observes the
/// same gallery contents.
pub struct GalleryView<'a> {
    dim: usize,
    inner: RwLockReadGuard<'a, GalleryInner>,
}

impl GalleryView<'_> {
    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of enrolled embeddings.
    pub fn size(&self) -> usize {
        self.inner.records.len()
    }

    /// Returns up to `k` candidates ordered by ascending squared L2
    /// distance, lower `index_id` first on ties.
    ///
    /// An empty gallery yields no candidates; a query of the wrong length
    /// fails with `DimensionMismatch`.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, GalleryError> {
        Ok(self.inner.index.search(vector, k)?)
    }

    /// Stored embedding at `index_id`.
    pub fn vector(&self, index_id: usize) -> Option<&[f32]> {
        self.inner.index.vector(index_id)
    }

    /// Identity record at `index_id`.
    pub fn record(&self, index_id: usize) -> Option<&IdentityRecord> {
        self.inner.records.get(index_id)
    }

    /// Embedding and record at `index_id`.
    pub fn entry(&self, index_id: usize) -> Result<(&[f32], &IdentityRecord), GalleryError> {
        match (self.vector(index_id), self.record(index_id)) {
            (Some(vector), Some(record)) => Ok((vector, record)),
            _ => Err(GalleryError::OutOfRange {
                index_id,
                size: self.size(),
            }),
        }
    }

    /// All identity records in `index_id` order.
    pub fn records(&self) -> &[IdentityRecord] {
        &self.inner.records
    }
}
