use std::sync::Arc;

use faceid_gallery::{Gallery, GalleryError};
use tracing::debug;

use crate::config::{DEFAULT_THRESHOLD, DEFAULT_TOP_K, ServiceConfig};
use crate::decision::{Decision, Verdict};
use crate::verifier::match_one;

/// Runs batches of queries end-to-end: top-k candidates from the gallery's
/// index, then the exact-distance verifier.
///
/// Holds no per-call state. A result depends only on the gallery contents,
/// the queries, `k` and the threshold, so repeating a call against an
/// unchanged gallery returns the same decisions. Each batch runs under one
/// read lock and sees a single gallery state.
#[derive(Debug, Clone)]
pub struct VerificationService {
    gallery: Arc<Gallery>,
    top_k: usize,
    threshold: f32,
}

impl VerificationService {
    /// Creates a service with [`DEFAULT_TOP_K`] and [`DEFAULT_THRESHOLD`].
    pub fn new(gallery: Arc<Gallery>) -> Self {
        Self {
            gallery,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Creates a service using the config's `top_k` and threshold.
    pub fn from_config(gallery: Arc<Gallery>, cfg: &ServiceConfig) -> Self {
        Self {
            gallery,
            top_k: cfg.top_k,
            threshold: cfg.threshold,
        }
    }

    pub fn gallery(&self) -> &Arc<Gallery> {
        &self.gallery
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns one decision per query, in query order.
    ///
    /// Fails with `DimensionMismatch` before doing any work if a query has
    /// the wrong length. An empty gallery yields `Unknown` for every query.
    pub fn verify<Q: AsRef<[f32]>>(
        &self,
        queries: &[Q],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<Decision>, GalleryError> {
        Ok(self
            .verify_detailed(queries, k, threshold)?
            .into_iter()
            .map(|v| v.decision)
            .collect())
    }

    /// [`VerificationService::verify`] with the configured `top_k` and
    /// threshold.
    pub fn verify_default<Q: AsRef<[f32]>>(&self, queries: &[Q]) -> Result<Vec<Decision>, GalleryError> {
        self.verify(queries, self.top_k, self.threshold)
    }

    /// Like [`VerificationService::verify`], keeping the accepted
    /// candidate and its exact distance.
    pub fn verify_detailed<Q: AsRef<[f32]>>(
        &self,
        queries: &[Q],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<Verdict>, GalleryError> {
        let queries: Vec<&[f32]> = queries.iter().map(|q| q.as_ref()).collect();
        let view = self.gallery.read();

        let dim = view.dim();
        if let Some(bad) = queries.iter().find(|q| q.len() != dim) {
            return Err(GalleryError::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }

        let verdicts = queries
            .iter()
            .map(|&q| {
                let candidates = view.query(q, k)?;
                Ok(match_one(q, &candidates, &view, threshold))
            })
            .collect::<Result<Vec<_>, GalleryError>>()?;

        debug!(
            "verify: {} queries against {} embeddings, {} identified",
            verdicts.len(),
            view.size(),
            verdicts.iter().filter(|v| v.decision.is_identified()).count()
        );
        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_config() {
        let g = Arc::new(Gallery::with_flat_index(4));
        let svc = VerificationService::new(Arc::clone(&g));
        assert_eq!(svc.top_k(), DEFAULT_TOP_K);
        assert_eq!(svc.threshold(), DEFAULT_THRESHOLD);

        let mut cfg = ServiceConfig::new(4);
        cfg.top_k = 2;
        cfg.threshold = 1.5;
        let svc = VerificationService::from_config(g, &cfg);
        assert_eq!(svc.top_k(), 2);
        assert_eq!(svc.threshold(), 1.5);
    }

    #[test]
    fn verify_default_uses_configured_threshold() {
        let g = Arc::new(Gallery::with_flat_index(2));
        g.add(&[&[0.0, 0.0]], &["origin"]).unwrap();

        let mut cfg = ServiceConfig::new(2);
        cfg.threshold = 1.0;
        let svc = VerificationService::from_config(g, &cfg);

        let d = svc.verify_default(&[[0.6f32, 0.0], [3.0, 0.0]]).unwrap();
        assert_eq!(d, vec![Decision::Identified("origin".into()), Decision::Unknown]);
    }

    #[test]
    fn detailed_reports_candidate() {
        let g = Arc::new(Gallery::with_flat_index(2));
        g.add(&[&[0.0, 0.0], &[3.0, 4.0]], &["a", "b"]).unwrap();
        let svc = VerificationService::new(g);

        let v = svc.verify_detailed(&[vec![3.0f32, 4.0]], 2, 0.5).unwrap();
        assert_eq!(v[0].index_id, Some(1));
        assert_eq!(v[0].distance, Some(0.0));
    }

    #[test]
    fn mismatched_query_fails_whole_batch() {
        let g = Arc::new(Gallery::with_flat_index(2));
        g.add(&[&[0.0, 0.0]], &["a"]).unwrap();
        let svc = VerificationService::new(g);

        let queries: Vec<Vec<f32>> = vec![vec![0.0, 0.0], vec![0.0, 0.0, 0.0]];
        assert!(matches!(
            svc.verify(&queries, 1, 1.0),
            Err(GalleryError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}
