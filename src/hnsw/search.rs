//! HNSW search: single-layer best-first traversal and the public query
//! facade.
//!
//! `search_layer` is shared by queries and by the insertion driver. Neighbor
//! lists are copied out under the owning node's shared lock and the lock is
//! released before any distance computation, so traversal holds each lock
//! only for the duration of one memcpy.

use crate::error::Result;
use crate::hnsw::distance::l2_sq;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::{VisitedSet, TRAVERSAL_SCRATCH};
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

/// A traversal candidate: (negated distance, id). `BinaryHeap` is a max-heap;
/// negating the distance makes `pop` yield the closest candidate first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    neg_distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.neg_distance.cmp(&other.neg_distance)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A result entry: (distance, id). Max-heap by distance so the worst kept
/// result is always at the top, ready to be evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResultEntry {
    distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for ResultEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance.cmp(&other.distance)
    }
}

impl PartialOrd for ResultEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first bounded search on one layer.
///
/// Returns the up-to-`ef` nearest nodes to `query` reachable from `entry` on
/// `layer`, ascending by squared-L2 distance. `visited` is cleared here; it
/// only has to be sized and owned by the calling worker.
pub(crate) fn search_layer(
    index: &HnswIndex,
    query: &[f32],
    entry: u32,
    layer: usize,
    ef: usize,
    visited: &mut VisitedSet,
) -> Vec<(f32, u32)> {
    visited.ensure_capacity(index.store.len());
    visited.clear();

    let mut candidates: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<ResultEntry> = BinaryHeap::with_capacity(ef + 1);
    // Cached worst kept distance; avoids a heap peek per neighbor.
    let mut worst_dist = f32::MAX;
    // Reused snapshot buffer for neighbor-list copies.
    let mut neighbor_buf: Vec<u32> = Vec::new();

    let entry_dist = l2_sq(query, index.store.get(entry).vector());
    visited.insert(entry);
    candidates.push(Candidate {
        neg_distance: OrderedFloat(-entry_dist),
        id: entry,
    });
    results.push(ResultEntry {
        distance: OrderedFloat(entry_dist),
        id: entry,
    });
    if results.len() >= ef {
        worst_dist = entry_dist;
    }

    while let Some(candidate) = candidates.pop() {
        let c_dist = -candidate.neg_distance.0;

        // The closest open candidate is farther than the worst kept result:
        // nothing reachable can improve the result set.
        if results.len() >= ef && c_dist > worst_dist {
            break;
        }

        neighbor_buf.clear();
        {
            let lists = index.store.get(candidate.id).neighbors.read();
            if let Some(list) = lists.get(layer) {
                neighbor_buf.extend_from_slice(list);
            }
        }

        for &neighbor in &neighbor_buf {
            if !visited.insert(neighbor) {
                continue;
            }
            let dist = l2_sq(query, index.store.get(neighbor).vector());
            if results.len() < ef || dist < worst_dist {
                candidates.push(Candidate {
                    neg_distance: OrderedFloat(-dist),
                    id: neighbor,
                });
                results.push(ResultEntry {
                    distance: OrderedFloat(dist),
                    id: neighbor,
                });
                if results.len() > ef {
                    results.pop();
                }
                if results.len() >= ef {
                    worst_dist = results.peek().map_or(f32::MAX, |r| r.distance.0);
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|r| (r.distance.0, r.id))
        .collect()
}

/// Greedy ef=1 descent from `entry` on `from_layer` down to (and including)
/// `to_layer`, returning the refined entry point.
pub(crate) fn descend(
    index: &HnswIndex,
    query: &[f32],
    mut entry: u32,
    from_layer: usize,
    to_layer: usize,
    visited: &mut VisitedSet,
) -> u32 {
    for layer in (to_layer..=from_layer).rev() {
        if let Some(&(_, nearest)) = search_layer(index, query, entry, layer, 1, visited).first() {
            entry = nearest;
        }
    }
    entry
}

impl HnswIndex {
    /// Returns the IDs of up to `k` approximate nearest neighbors of `query`,
    /// ascending by squared-L2 distance, using the configured `ef_search`
    /// (0 = auto: `max(ef_construction, k)`).
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<u32>> {
        self.search_with_ef(query, k, self.config.ef_search)
    }

    /// Like [`search`](Self::search) with a per-call `ef_search` override
    /// (0 = auto). Larger values trade latency for recall.
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<u32>> {
        self.check_dimension(query)?;

        let state = *self.state.read();
        let entry = match state.entry_point {
            Some(ep) => ep,
            None => return Ok(Vec::new()),
        };

        let ef = if ef_search > 0 {
            ef_search
        } else {
            self.config.ef_construction.max(k)
        };

        TRAVERSAL_SCRATCH.with(|cell| {
            let mut visited = cell.borrow_mut();
            let ep = if state.max_level > 0 {
                descend(self, query, entry, state.max_level, 1, &mut visited)
            } else {
                entry
            };
            let mut results = search_layer(self, query, ep, 0, ef, &mut visited);
            results.truncate(k);
            Ok(results.into_iter().map(|(_, id)| id).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;

    fn axis_vec(dim: usize, axis: usize, value: f32) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = value;
        v
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let idx = HnswIndex::with_default_config(128).unwrap();
        let hits = idx.search(&vec![0.0; 128], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_single_point() {
        let idx = HnswIndex::with_default_config(128).unwrap();
        let v = axis_vec(128, 0, 1.0);
        idx.insert(&v).unwrap();

        assert_eq!(idx.search(&v, 1).unwrap(), vec![0]);
        // Asking for more neighbors than points returns what exists.
        assert_eq!(idx.search(&axis_vec(128, 0, 2.0), 3).unwrap(), vec![0]);
    }

    #[test]
    fn test_results_ascend_by_distance() {
        let idx = HnswIndex::with_default_config(4).unwrap();
        for i in 0..32 {
            idx.insert(&axis_vec(4, 0, i as f32)).unwrap();
        }
        let query = axis_vec(4, 0, 0.2);
        let hits = idx.search(&query, 8).unwrap();
        assert_eq!(hits.len(), 8);
        let dists: Vec<f32> = hits.iter().map(|&id| l2_sq(&query, idx.vector(id))).collect();
        for pair in dists.windows(2) {
            assert!(pair[0] <= pair[1], "distances not ascending: {dists:?}");
        }
        assert_eq!(hits[0], 0);
    }

    #[test]
    fn test_k_truncation_and_distinctness() {
        let idx = HnswIndex::with_default_config(2).unwrap();
        for i in 0..50 {
            idx.insert(&[i as f32, (i * 7 % 13) as f32]).unwrap();
        }
        let hits = idx.search(&[3.0, 5.0], 10).unwrap();
        assert_eq!(hits.len(), 10);
        let unique: std::collections::HashSet<u32> = hits.iter().copied().collect();
        assert_eq!(unique.len(), hits.len());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let idx = HnswIndex::with_default_config(8).unwrap();
        let err = idx.search(&vec![0.0; 4], 3).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        );
    }

    #[test]
    fn test_ef_override_still_finds_nearest() {
        let idx = HnswIndex::with_default_config(2).unwrap();
        for i in 0..200 {
            idx.insert(&[(i % 20) as f32, (i / 20) as f32]).unwrap();
        }
        let exact = idx.search_with_ef(&[7.1, 4.9], 1, 400).unwrap();
        let narrow = idx.search_with_ef(&[7.1, 4.9], 1, 1).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(narrow.len(), 1);
        // The wide beam must find the true nearest grid point (7, 5).
        assert_eq!(idx.vector(exact[0]), &[7.0, 5.0]);
    }
}
