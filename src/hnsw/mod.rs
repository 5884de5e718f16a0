//! Hierarchical Navigable Small World (HNSW) approximate nearest-neighbor
//! index with concurrent insertion and search.
//!
//! The graph is layered: layer 0 holds every node, each higher layer an
//! exponentially thinner sample, and queries descend greedily from the top
//! layer's entry point before widening into a bounded best-first sweep on
//! layer 0. Writers share the graph with readers through two levels of
//! locking — one global reader/writer lock ordering node registration and
//! entry-point updates, and one lock per node guarding only that node's
//! neighbor lists. Neighbor lists are always read as snapshot copies, so a
//! search never observes a torn list, only a graph that is some merge of
//! completed inserts and in-flight back-links.

/// Squared-L2 distance kernel: SIMD where available, scalar fallback.
pub mod distance;
/// Graph structure: configuration, node arena, and index state.
pub mod graph;
/// Insertion: level assignment, layered connection, diversity pruning.
pub mod insert;
/// Search: single-layer best-first primitive and the public query facade.
pub mod search;
/// Generation-stamped visited set reused across traversals.
pub mod visited;

pub use graph::{HnswConfig, HnswIndex};
