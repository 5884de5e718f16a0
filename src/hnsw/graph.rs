//! HNSW graph structure: configuration, node arena, and index state.
//!
//! [`HnswConfig`] defines tuning parameters (M, ef_construction, ef_search).
//! [`HnswIndex`] owns the node arena and the global entry-point state; the
//! insertion and search algorithms live in the sibling modules.

use crate::config;
use crate::error::{IndexError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Configuration parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, recall, and
/// memory usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Number of bidirectional links per node on layers >= 1; layer 0 allows
    /// `2 * m`.
    pub m: usize,
    /// Candidate list breadth during index construction.
    pub ef_construction: usize,
    /// Candidate list breadth during search. 0 means auto: each query uses
    /// `max(ef_construction, k)`.
    pub ef_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_M,
            ef_construction: config::DEFAULT_EF_CONSTRUCTION,
            ef_search: config::DEFAULT_EF_SEARCH,
        }
    }
}

impl HnswConfig {
    /// Maximum out-degree on the given layer.
    #[inline]
    pub(crate) fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m * 2
        } else {
            self.m
        }
    }
}

/// One point in the graph.
///
/// The vector and level never change after construction; the lock guards
/// only the per-layer neighbor lists (`neighbors.len() == level + 1`).
pub(crate) struct Node {
    vector: Vec<f32>,
    level: usize,
    pub(crate) neighbors: RwLock<Vec<Vec<u32>>>,
}

impl Node {
    fn new(vector: Vec<f32>, level: usize) -> Self {
        Self {
            vector,
            level,
            neighbors: RwLock::new(vec![Vec::new(); level + 1]),
        }
    }

    #[inline]
    pub(crate) fn vector(&self) -> &[f32] {
        &self.vector
    }

    #[inline]
    pub(crate) fn level(&self) -> usize {
        self.level
    }
}

type Chunk = Box<[OnceLock<Node>]>;

fn new_chunk() -> Chunk {
    (0..config::NODE_CHUNK_SIZE).map(|_| OnceLock::new()).collect()
}

/// Append-only node arena with stable addresses.
///
/// A fixed directory of lazily-allocated chunks: chunks never move once
/// allocated, so a `&Node` obtained from [`NodeStore::get`] stays valid for
/// the lifetime of the index even as the arena grows. Appends are serialized
/// by the caller (they happen under the index's global write lock); reads
/// are lock-free given an ID.
pub(crate) struct NodeStore {
    chunks: Box<[OnceLock<Chunk>]>,
    len: AtomicUsize,
}

impl NodeStore {
    fn new() -> Self {
        Self {
            chunks: (0..config::NODE_MAX_CHUNKS).map(|_| OnceLock::new()).collect(),
            len: AtomicUsize::new(0),
        }
    }

    /// Number of registered nodes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Register a new node and return its ID. Caller must hold the index's
    /// global write lock; the capacity check happens before anything becomes
    /// visible to readers.
    pub(crate) fn append(&self, vector: Vec<f32>, level: usize) -> Result<u32> {
        let id = self.len.load(Ordering::Relaxed);
        if id >= config::NODE_MAX_CHUNKS * config::NODE_CHUNK_SIZE {
            return Err(IndexError::CapacityExhausted(id));
        }
        let chunk = self.chunks[id / config::NODE_CHUNK_SIZE].get_or_init(new_chunk);
        if chunk[id % config::NODE_CHUNK_SIZE]
            .set(Node::new(vector, level))
            .is_err()
        {
            unreachable!("node slot {id} written twice");
        }
        self.len.store(id + 1, Ordering::Release);
        Ok(id as u32)
    }

    /// Stable handle to a registered node. IDs come from [`append`] or from
    /// neighbor lists, both of which publish only after the slot is written.
    #[inline]
    pub(crate) fn get(&self, id: u32) -> &Node {
        let idx = id as usize;
        self.chunks[idx / config::NODE_CHUNK_SIZE]
            .get()
            .and_then(|chunk| chunk[idx % config::NODE_CHUNK_SIZE].get())
            .expect("node id not registered")
    }
}

/// Entry point and peak layer, read and written as a consistent pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphState {
    pub entry_point: Option<u32>,
    pub max_level: usize,
}

/// Concurrent HNSW index over fixed-dimensional f32 vectors.
///
/// Inserts and searches take `&self` and may run from any number of threads
/// simultaneously. Node IDs are dense (`0..len()`), assigned in insertion
/// order, and remain valid for the lifetime of the index.
pub struct HnswIndex {
    pub(crate) config: HnswConfig,
    pub(crate) dimension: usize,
    pub(crate) store: NodeStore,
    pub(crate) state: RwLock<GraphState>,
}

impl HnswIndex {
    /// Creates a new empty index with the given dimension and configuration.
    pub fn new(dimension: usize, config: HnswConfig) -> Result<Self> {
        if dimension == 0 {
            return Err(IndexError::InvalidParameter(
                "dimension must be positive".into(),
            ));
        }
        if config.m == 0 {
            return Err(IndexError::InvalidParameter("m must be positive".into()));
        }
        if config.ef_construction == 0 {
            return Err(IndexError::InvalidParameter(
                "ef_construction must be positive".into(),
            ));
        }
        Ok(Self {
            config,
            dimension,
            store: NodeStore::new(),
            state: RwLock::new(GraphState {
                entry_point: None,
                max_level: 0,
            }),
        })
    }

    /// Creates a new empty index with default configuration
    /// (M=16, ef_construction=200, auto ef_search).
    pub fn with_default_config(dimension: usize) -> Result<Self> {
        Self::new(dimension, HnswConfig::default())
    }

    /// Returns the number of points in the index.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the index contains no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension every inserted vector must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current peak layer across all nodes (0 for an empty index).
    pub fn max_level(&self) -> usize {
        self.state.read().max_level
    }

    /// ID of the node all top-down traversals start from, if any.
    pub fn entry_point(&self) -> Option<u32> {
        self.state.read().entry_point
    }

    /// Top layer of the given node. Panics if `id` is not registered.
    pub fn level_of(&self, id: u32) -> usize {
        self.store.get(id).level()
    }

    /// The stored vector of the given node. Panics if `id` is not registered.
    pub fn vector(&self, id: u32) -> &[f32] {
        self.store.get(id).vector()
    }

    #[inline]
    pub(crate) fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Validate the structural invariants of the graph.
    ///
    /// Intended for quiescent indexes (no in-flight inserts): checks neighbor
    /// degree bounds, absence of self-loops and duplicates, layer membership
    /// of every link target, and entry-point/peak agreement. Returns a
    /// description of the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let n = self.store.len();
        let state = *self.state.read();

        match state.entry_point {
            None => {
                if n != 0 {
                    return Err(format!("{n} nodes but no entry point"));
                }
            }
            Some(ep) => {
                if ep as usize >= n {
                    return Err(format!("entry point {ep} out of bounds ({n} nodes)"));
                }
                let ep_level = self.store.get(ep).level();
                if ep_level != state.max_level {
                    return Err(format!(
                        "entry point {ep} has level {ep_level}, expected peak {}",
                        state.max_level
                    ));
                }
            }
        }

        for id in 0..n as u32 {
            let node = self.store.get(id);
            if node.vector().len() != self.dimension {
                return Err(format!(
                    "node {id} has dimension {}, index expects {}",
                    node.vector().len(),
                    self.dimension
                ));
            }
            if node.level() > config::MAX_LEVEL {
                return Err(format!("node {id} level {} exceeds cap", node.level()));
            }
            if node.level() > state.max_level {
                return Err(format!(
                    "node {id} level {} above recorded peak {}",
                    node.level(),
                    state.max_level
                ));
            }

            let lists = node.neighbors.read();
            if lists.len() != node.level() + 1 {
                return Err(format!(
                    "node {id}: {} neighbor lists for level {}",
                    lists.len(),
                    node.level()
                ));
            }
            for (layer, list) in lists.iter().enumerate() {
                if list.len() > self.config.max_degree(layer) {
                    return Err(format!(
                        "node {id} layer {layer}: degree {} exceeds cap {}",
                        list.len(),
                        self.config.max_degree(layer)
                    ));
                }
                let mut seen = HashSet::with_capacity(list.len());
                for &nb in list {
                    if nb == id {
                        return Err(format!("node {id} layer {layer}: self-loop"));
                    }
                    if nb as usize >= n {
                        return Err(format!(
                            "node {id} layer {layer}: neighbor {nb} out of bounds"
                        ));
                    }
                    if !seen.insert(nb) {
                        return Err(format!(
                            "node {id} layer {layer}: duplicate neighbor {nb}"
                        ));
                    }
                    if self.store.get(nb).level() < layer {
                        return Err(format!(
                            "node {id} layer {layer}: neighbor {nb} only reaches layer {}",
                            self.store.get(nb).level()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
