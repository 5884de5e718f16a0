//! HNSW insertion: level assignment, layered connection with bidirectional
//! links, and diversity-aware neighbor pruning.
//!
//! Inserts take `&self` and run concurrently with each other and with
//! searches. The global lock is held only to register the node and (rarely)
//! to promote the entry point; linking touches one neighbor lock at a time.

use crate::config;
use crate::error::Result;
use crate::hnsw::distance::l2_sq;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::search::{descend, search_layer};
use crate::hnsw::visited::TRAVERSAL_SCRATCH;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Draw a node level: the number of successful p=0.5 trials before the first
/// failure, capped at [`config::MAX_LEVEL`]. Each worker thread draws from
/// its own stream.
pub(crate) fn random_level<R: Rng>(rng: &mut R) -> usize {
    let mut level = 0;
    while level < config::MAX_LEVEL && rng.random::<f32>() < 0.5 {
        level += 1;
    }
    level
}

/// Reduce `candidates` (distances measured from `base`) to at most `m`
/// diverse neighbors.
///
/// Candidates are walked in ascending distance order; one is kept only if no
/// already-kept neighbor sits strictly closer to it than `base` does. Fewer
/// than `m` may survive — diversity wins over degree. Candidate sets smaller
/// than `m` pass through untouched.
pub(crate) fn select_diverse(
    index: &HnswIndex,
    candidates: &[(f32, u32)],
    m: usize,
) -> Vec<u32> {
    if candidates.len() < m {
        return candidates.iter().map(|&(_, id)| id).collect();
    }

    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut selected: Vec<(f32, u32)> = Vec::with_capacity(m);
    for &(dist_to_base, cid) in &sorted {
        if selected.len() >= m {
            break;
        }
        let cvec = index.store.get(cid).vector();
        let diverse = selected
            .iter()
            .all(|&(_, sid)| l2_sq(cvec, index.store.get(sid).vector()) >= dist_to_base);
        if diverse {
            selected.push((dist_to_base, cid));
        }
    }
    selected.into_iter().map(|(_, id)| id).collect()
}

impl HnswIndex {
    /// Insert one point and return its assigned ID.
    ///
    /// IDs are dense and follow insertion order. The call always completes;
    /// the only failure modes are a dimension mismatch (rejected before any
    /// mutation) and arena exhaustion (rejected before the node registers).
    pub fn insert(&self, vector: &[f32]) -> Result<u32> {
        self.check_dimension(vector)?;
        self.insert_point(vector)
    }

    /// Insert a batch, using `num_threads` workers after a sequential
    /// warm-up of the first [`config::WARMUP_INSERTS`] points.
    ///
    /// The warm-up pins down the top layers and the entry point; without it,
    /// early parallel inserts race to re-promote the peak against a graph
    /// with nothing to attach to. Workers then drain a shared cursor until
    /// the batch is exhausted. The whole batch is dimension-checked up
    /// front, so a bad vector rejects the call before anything is inserted.
    pub fn insert_batch(&self, data: &[Vec<f32>], num_threads: usize) -> Result<()> {
        for vector in data {
            self.check_dimension(vector)?;
        }
        if data.is_empty() {
            return Ok(());
        }

        let warmup = data.len().min(config::WARMUP_INSERTS);
        tracing::debug!(total = data.len(), warmup, "batch insert: sequential warm-up");
        for vector in &data[..warmup] {
            self.insert_point(vector)?;
        }

        if warmup == data.len() || num_threads <= 1 {
            for vector in &data[warmup..] {
                self.insert_point(vector)?;
            }
            return Ok(());
        }

        tracing::debug!(
            threads = num_threads,
            remaining = data.len() - warmup,
            "batch insert: parallel phase"
        );
        let cursor = AtomicUsize::new(warmup);
        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..num_threads)
                .map(|_| {
                    scope.spawn(|| -> Result<()> {
                        loop {
                            let i = cursor.fetch_add(1, Ordering::Relaxed);
                            if i >= data.len() {
                                return Ok(());
                            }
                            self.insert_point(&data[i])?;
                        }
                    })
                })
                .collect();
            for worker in workers {
                match worker.join() {
                    Ok(result) => result?,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(())
        })
    }

    fn insert_point(&self, vector: &[f32]) -> Result<u32> {
        debug_assert_eq!(vector.len(), self.dimension);
        let level = random_level(&mut rand::rng());

        // Register the node and snapshot the peak in one critical section.
        // The capacity check inside append fires before anything is visible.
        let (id, entry, peak) = {
            let mut state = self.state.write();
            let id = self.store.append(vector.to_vec(), level)?;
            match state.entry_point {
                None => {
                    state.entry_point = Some(id);
                    state.max_level = level;
                    return Ok(id);
                }
                Some(ep) => (id, ep, state.max_level),
            }
        };

        TRAVERSAL_SCRATCH.with(|cell| {
            let mut visited = cell.borrow_mut();

            // Greedy ef=1 descent through the layers above the node's own.
            let mut ep = if peak > level {
                descend(self, vector, entry, peak, level + 1, &mut visited)
            } else {
                entry
            };

            // Connect one layer at a time, top down.
            for layer in (0..=level.min(peak)).rev() {
                let cands = search_layer(
                    self,
                    vector,
                    ep,
                    layer,
                    self.config.ef_construction,
                    &mut visited,
                );

                // The new node's own list: no contention possible, no other
                // worker has seen this ID yet.
                let selected = select_diverse(self, &cands, self.config.m);
                self.store.get(id).neighbors.write()[layer] = selected.clone();

                // Back-link from each chosen neighbor, re-pruning any list
                // the append pushed over its cap. One neighbor lock at a
                // time; the transient cap+1 list is never published because
                // readers only take snapshot copies under this same lock.
                for &nb in &selected {
                    let nb_node = self.store.get(nb);
                    let mut lists = nb_node.neighbors.write();
                    let list = &mut lists[layer];
                    list.push(id);
                    if list.len() > self.config.max_degree(layer) {
                        let rescored: Vec<(f32, u32)> = list
                            .iter()
                            .map(|&c| (l2_sq(nb_node.vector(), self.store.get(c).vector()), c))
                            .collect();
                        *list = select_diverse(self, &rescored, self.config.m);
                    }
                }

                if let Some(&(_, nearest)) = cands.first() {
                    ep = nearest;
                }
            }
        });

        // Promote the entry point if this node topped out a new layer. The
        // peak may have moved since the snapshot, so re-check under the lock.
        if level > peak {
            let mut state = self.state.write();
            if level > state.max_level {
                state.max_level = level;
                state.entry_point = Some(id);
            }
        }

        Ok(id)
    }
}
