//! Global configuration constants for smallworld.
//!
//! All tuning parameters and structural limits are defined here as
//! compile-time constants; per-index configuration is carried by
//! [`crate::HnswConfig`].

/// Default number of bidirectional links per node on layers >= 1.
///
/// Layer 0 allows `2 * M` links. Higher values improve recall but increase
/// memory and build time. Typical range: 8–64.
pub const DEFAULT_M: usize = 16;

/// Default candidate-list breadth during index construction.
///
/// Higher values produce a better-connected graph but slow down builds.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default candidate-list breadth during search.
///
/// 0 means auto: each query uses `max(ef_construction, k)`.
pub const DEFAULT_EF_SEARCH: usize = 0;

/// Highest layer a node can be assigned. Layers are numbered 0..=MAX_LEVEL.
pub const MAX_LEVEL: usize = 16;

/// Number of points inserted sequentially before parallel workers start in
/// [`crate::HnswIndex::insert_batch`]. The single-threaded warm-up pins down
/// the top layers and the entry point so early workers do not race to
/// re-promote it against an empty graph.
pub const WARMUP_INSERTS: usize = 500;

/// Nodes per chunk of the node arena. Must be a power of two.
pub const NODE_CHUNK_SIZE: usize = 4096;

/// Number of chunk slots in the node arena directory. Together with
/// [`NODE_CHUNK_SIZE`] this bounds the index at ~16.7M nodes; appending past
/// the bound fails with [`crate::IndexError::CapacityExhausted`].
pub const NODE_MAX_CHUNKS: usize = 4096;

/// Minimum slack the visited set keeps past the current node count. A
/// traversal that races concurrent registrations may encounter IDs above the
/// count it was sized for; the headroom absorbs them without reallocation.
pub const VISITED_MIN_HEADROOM: usize = 1024;

/// Amount the visited set grows past the node count when it does reallocate.
pub const VISITED_GROW_HEADROOM: usize = 8192;
