//! Generation-stamped visited set for graph traversal.
//!
//! Replaces `HashSet<u32>` with O(1) array indexing. Each [`VisitedSet::clear`]
//! bumps a generation counter instead of zeroing the array, so repeated
//! traversals pay a full memset only on counter wraparound.

use crate::config;
use std::cell::RefCell;

thread_local! {
    /// Per-worker traversal scratch shared by the insert and search paths.
    /// Eliminates per-operation allocation of a node-count-sized array.
    pub(crate) static TRAVERSAL_SCRATCH: RefCell<VisitedSet> =
        RefCell::new(VisitedSet::new(0));
}

/// Dense visited set stamped with a generation counter.
#[derive(Debug)]
pub struct VisitedSet {
    stamps: Vec<u16>,
    generation: u16,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            stamps: vec![0u16; capacity],
            generation: 1,
        }
    }

    /// Reset the set. O(1) amortized: a full memset happens only every
    /// `u16::MAX - 1` calls, when the generation wraps back to 1.
    pub fn clear(&mut self) {
        if self.generation == u16::MAX {
            self.stamps.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Make sure the array covers at least `node_count` IDs plus headroom.
    ///
    /// The headroom absorbs IDs registered by concurrent inserts after the
    /// caller snapshotted the count, without growing mid-traversal.
    pub fn ensure_capacity(&mut self, node_count: usize) {
        if self.stamps.len() < node_count + config::VISITED_MIN_HEADROOM {
            self.stamps.resize(node_count + config::VISITED_GROW_HEADROOM, 0);
        }
    }

    /// Mark `id` as visited. Returns `true` if it was not previously visited
    /// in the current generation. Grows on demand so an ID published after
    /// [`ensure_capacity`] never indexes out of bounds.
    #[inline]
    pub fn insert(&mut self, id: u32) -> bool {
        let idx = id as usize;
        if idx >= self.stamps.len() {
            self.stamps.resize(idx + config::VISITED_GROW_HEADROOM, 0);
        }
        if self.stamps[idx] == self.generation {
            false
        } else {
            self.stamps[idx] = self.generation;
            true
        }
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_clear() {
        let mut vs = VisitedSet::new(100);
        assert!(vs.insert(0));
        assert!(!vs.insert(0));
        assert!(vs.insert(73));

        vs.clear();
        assert!(vs.insert(0));
        assert!(vs.insert(73));
    }

    #[test]
    fn test_grows_on_demand() {
        let mut vs = VisitedSet::new(0);
        assert!(vs.insert(5000));
        assert!(!vs.insert(5000));
    }

    #[test]
    fn test_ensure_capacity_keeps_headroom() {
        let mut vs = VisitedSet::new(0);
        vs.ensure_capacity(100);
        assert!(vs.stamps.len() >= 100 + config::VISITED_MIN_HEADROOM);
        let len = vs.stamps.len();
        // Within headroom: no reallocation.
        vs.ensure_capacity(110);
        assert_eq!(vs.stamps.len(), len);
    }

    #[test]
    fn test_generation_wraparound_resets() {
        let mut vs = VisitedSet::new(10);
        for _ in 0..(u16::MAX as usize - 1) {
            vs.clear();
        }
        assert_eq!(vs.generation, u16::MAX);
        vs.insert(5);

        // The wrapping clear memsets and restarts at generation 1.
        vs.clear();
        assert_eq!(vs.generation, 1);
        assert!(vs.insert(5));
    }
}
