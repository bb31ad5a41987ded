use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::distance::squared_l2;
use crate::error::VecError;
use crate::vecstore::{Candidate, VecIndex, rank};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// HNSWConfig configures a new HNSW index.
#[derive(Debug, Clone)]
pub struct HNSWConfig {
    /// Vector dimension. Required; must be positive.
    pub dim: usize,
    /// Max connections per node per layer (except layer 0 which allows 2*M).
    /// Default: 16.
    pub m: usize,
    /// Size of the dynamic candidate list during index building.
    /// Default: 200.
    pub ef_construction: usize,
    /// Default size of the dynamic candidate list during search.
    /// Default: 50.
    pub ef_search: usize,
    /// Seed for level assignment. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl HNSWConfig {
    pub(crate) fn set_defaults(&mut self) {
        if self.m < 2 {
            self.m = 16;
        }
        if self.ef_construction == 0 {
            self.ef_construction = 200;
        }
        if self.ef_search == 0 {
            self.ef_search = 50;
        }
    }

    fn max_conns(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m * 2
        } else {
            self.m
        }
    }
}

// ---------------------------------------------------------------------------
// Internal priority-queue types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct DistItem {
    id: u32,
    dist: f32,
}

/// Min-heap: closest first, lower id first on ties.
impl Ord for DistItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.id.cmp(&self.id))
    }
}
impl PartialOrd for DistItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for DistItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistItem {}

/// Reversed for max-heap usage: farthest first, higher id first on ties.
#[derive(Clone, Copy)]
struct MaxDistItem {
    id: u32,
    dist: f32,
}

impl Ord for MaxDistItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}
impl PartialOrd for MaxDistItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for MaxDistItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for MaxDistItem {}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

struct HnswNode {
    vector: Vec<f32>,
    level: usize,
    friends: Vec<Vec<u32>>, // friends[layer] = neighbor index ids
}

// ---------------------------------------------------------------------------
// HNSW
// ---------------------------------------------------------------------------

/// HNSW is a Hierarchical Navigable Small World index implementing [VecIndex].
///
/// Nodes are never removed, so the node position doubles as the `index_id`.
/// Results are approximate; the returned candidates carry exact L2²
/// distances and are ordered by [`rank`].
///
/// A stored vector is always returned for a bit-identical query: nodes are
/// also keyed by a hash of their bit pattern, and exact hits are merged into
/// every result list ahead of the graph search results.
pub struct HNSW {
    cfg: HNSWConfig,
    nodes: Vec<HnswNode>,
    by_bits: HashMap<u64, Vec<u32>>,
    entry: Option<u32>,
    max_level: usize,
    level_mul: f64,
    rng: StdRng,
}

impl HNSW {
    /// Create an empty HNSW index with the given configuration.
    /// Panics if `cfg.dim` is not positive.
    pub fn new(mut cfg: HNSWConfig) -> Self {
        assert!(cfg.dim > 0, "vecstore: HNSWConfig.dim must be positive");
        cfg.set_defaults();
        let level_mul = 1.0 / (cfg.m as f64).ln();
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cfg,
            nodes: Vec::new(),
            by_bits: HashMap::new(),
            entry: None,
            max_level: 0,
            level_mul,
            rng,
        }
    }

    fn random_level(&mut self) -> usize {
        let r: f64 = self.rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
        let level = (-r.ln() * self.level_mul) as usize;
        level.min(31)
    }

    fn dist_to(&self, query: &[f32], id: u32) -> f32 {
        squared_l2(query, &self.nodes[id as usize].vector)
    }

    /// Greedy walk from `entry` through layers `from` down to `to`
    /// (inclusive), moving to any closer neighbor until none improves.
    fn greedy_descent(&self, query: &[f32], entry: u32, from: usize, to: usize) -> u32 {
        let mut cur = entry;
        let mut cur_dist = self.dist_to(query, cur);

        for lev in (to..=from).rev() {
            let mut changed = true;
            while changed {
                changed = false;
                let nd = &self.nodes[cur as usize];
                if lev >= nd.friends.len() {
                    break;
                }
                for &f_id in &nd.friends[lev] {
                    let d = self.dist_to(query, f_id);
                    if d < cur_dist {
                        cur = f_id;
                        cur_dist = d;
                        changed = true;
                    }
                }
            }
        }
        cur
    }

    fn search_layer(&self, query: &[f32], entry_points: &[u32], ef: usize, layer: usize) -> Vec<u32> {
        let mut visited = HashSet::with_capacity(ef * 2);
        let mut candidates: BinaryHeap<DistItem> = BinaryHeap::new();
        let mut results: BinaryHeap<MaxDistItem> = BinaryHeap::new();

        for &ep in entry_points {
            if visited.insert(ep) {
                let d = self.dist_to(query, ep);
                candidates.push(DistItem { id: ep, dist: d });
                results.push(MaxDistItem { id: ep, dist: d });
            }
        }
        while results.len() > ef {
            results.pop();
        }

        while let Some(closest) = candidates.pop() {
            if results.len() >= ef {
                if let Some(farthest) = results.peek() {
                    if closest.dist > farthest.dist {
                        break;
                    }
                }
            }

            let nd = &self.nodes[closest.id as usize];
            if layer >= nd.friends.len() {
                continue;
            }
            for &f_id in &nd.friends[layer] {
                if !visited.insert(f_id) {
                    continue;
                }

                let d = self.dist_to(query, f_id);
                let should_add =
                    results.len() < ef || results.peek().is_none_or(|far| d < far.dist);
                if should_add {
                    candidates.push(DistItem { id: f_id, dist: d });
                    results.push(MaxDistItem { id: f_id, dist: d });
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_iter().map(|item| item.id).collect()
    }

    /// Neighbor selection heuristic (HNSW paper, algorithm 4, keeping pruned
    /// connections). A candidate is preferred when it is closer to `base`
    /// than to every neighbor already chosen, which keeps links pointing in
    /// different directions so sparse regions stay connected. Leftover slots
    /// are filled with the closest rejected candidates.
    fn select_neighbors(&self, base: &[f32], candidates: &[u32], max_n: usize) -> Vec<u32> {
        if candidates.len() <= max_n {
            return candidates.to_vec();
        }

        let mut items: Vec<Candidate> = candidates
            .iter()
            .map(|&c_id| Candidate {
                index_id: c_id as usize,
                distance: self.dist_to(base, c_id),
            })
            .collect();
        items.sort_by(rank);

        let mut selected: Vec<u32> = Vec::with_capacity(max_n);
        let mut rejected: Vec<u32> = Vec::new();
        for c in &items {
            if selected.len() >= max_n {
                break;
            }
            let c_id = c.index_id as u32;
            let c_vec = &self.nodes[c.index_id].vector;
            let diverse = selected
                .iter()
                .all(|&s_id| self.dist_to(c_vec, s_id) > c.distance);
            if diverse {
                selected.push(c_id);
            } else {
                rejected.push(c_id);
            }
        }
        for r in rejected {
            if selected.len() >= max_n {
                break;
            }
            selected.push(r);
        }
        selected
    }

    fn bits_key(vector: &[f32]) -> u64 {
        let mut h = DefaultHasher::new();
        for v in vector {
            v.to_bits().hash(&mut h);
        }
        h.finish()
    }

    /// Stored nodes whose vector is bit-identical to `query`.
    fn exact_hits(&self, query: &[f32]) -> impl Iterator<Item = u32> {
        let same_bits = |id: &&u32| {
            self.nodes[**id as usize]
                .vector
                .iter()
                .map(|v| v.to_bits())
                .eq(query.iter().map(|v| v.to_bits()))
        };
        self.by_bits
            .get(&Self::bits_key(query))
            .into_iter()
            .flatten()
            .filter(same_bits)
            .copied()
    }
}

impl VecIndex for HNSW {
    fn dim(&self) -> usize {
        self.cfg.dim
    }

    fn append(&mut self, vector: &[f32]) -> Result<usize, VecError> {
        if vector.len() != self.cfg.dim {
            return Err(VecError::DimensionMismatch {
                got: vector.len(),
                want: self.cfg.dim,
            });
        }
        if self.nodes.len() >= u32::MAX as usize {
            return Err(VecError::Capacity(self.nodes.len()));
        }

        let idx = self.nodes.len() as u32;
        let level = self.random_level();
        self.nodes.push(HnswNode {
            vector: vector.to_vec(),
            level,
            friends: vec![Vec::new(); level + 1],
        });
        self.by_bits.entry(Self::bits_key(vector)).or_default().push(idx);

        // First node becomes the entry point.
        let entry = match self.entry {
            Some(entry) => entry,
            None => {
                self.entry = Some(idx);
                self.max_level = level;
                return Ok(idx as usize);
            }
        };

        // Phase 1: Greedy descent from top layer to level+1.
        let cur = self.greedy_descent(vector, entry, self.max_level, level + 1);

        // Phase 2: Beam search + connect at each layer.
        let top_insert = level.min(self.max_level);
        let ef_construction = self.cfg.ef_construction;

        let mut ep = vec![cur];
        for lev in (0..=top_insert).rev() {
            let candidates = self.search_layer(vector, &ep, ef_construction, lev);
            let max_c = self.cfg.max_conns(lev);
            let neighbors = self.select_neighbors(vector, &candidates, max_c);

            self.nodes[idx as usize].friends[lev] = neighbors.clone();

            // Bidirectional connections + pruning.
            for &n_id in &neighbors {
                let nn = &mut self.nodes[n_id as usize];
                if lev > nn.level {
                    continue;
                }
                nn.friends[lev].push(idx);
                if nn.friends[lev].len() > max_c {
                    let nn_vec = nn.vector.clone();
                    let nn_friends = nn.friends[lev].clone();
                    let pruned = self.select_neighbors(&nn_vec, &nn_friends, max_c);
                    self.nodes[n_id as usize].friends[lev] = pruned;
                }
            }

            ep = candidates;
        }

        // Update entry point if new node is higher.
        if level > self.max_level {
            self.entry = Some(idx);
            self.max_level = level;
        }

        Ok(idx as usize)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Candidate>, VecError> {
        if query.len() != self.cfg.dim {
            return Err(VecError::DimensionMismatch {
                got: query.len(),
                want: self.cfg.dim,
            });
        }
        let entry = match self.entry {
            Some(entry) if top_k > 0 => entry,
            _ => return Ok(vec![]),
        };

        let ef = self.cfg.ef_search.max(top_k);

        // Phase 1: Greedy descent from top layer to layer 1.
        let cur = self.greedy_descent(query, entry, self.max_level, 1);

        // Phase 2: Beam search at layer 0, plus bit-identical nodes.
        let mut ids: HashSet<u32> = self.search_layer(query, &[cur], ef, 0).into_iter().collect();
        ids.extend(self.exact_hits(query));
        let mut results: Vec<Candidate> = ids
            .into_iter()
            .map(|id| Candidate {
                index_id: id as usize,
                distance: self.dist_to(query, id),
            })
            .collect();

        results.sort_by(rank);
        results.truncate(top_k);
        Ok(results)
    }

    fn vector(&self, index_id: usize) -> Option<&[f32]> {
        self.nodes.get(index_id).map(|nd| nd.vector.as_slice())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
