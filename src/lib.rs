//! # smallworld
//!
//! Concurrent in-memory approximate nearest-neighbor search over
//! fixed-dimensional f32 vectors, built on a Hierarchical Navigable Small
//! World (HNSW) proximity graph with squared-L2 distance.
//!
//! The index supports parallel batch insertion and concurrent point queries
//! against the same graph: registration and entry-point updates go through a
//! single global reader/writer lock, while each node carries its own lock
//! over its neighbor lists. This is a core library crate with zero async
//! dependencies — suitable for embedding directly in Rust services, CLIs, or
//! language bindings.
//!
//! ```no_run
//! use smallworld::HnswIndex;
//!
//! # fn main() -> smallworld::Result<()> {
//! let index = HnswIndex::with_default_config(128)?;
//! index.insert(&vec![0.1; 128])?;
//! index.insert(&vec![0.2; 128])?;
//! let hits = index.search(&vec![0.15; 128], 10)?;
//! # Ok(())
//! # }
//! ```

/// Global configuration constants: defaults, limits, and tuning parameters.
pub mod config;
/// Error types surfaced by index construction, insertion, and search.
pub mod error;
/// HNSW engine: graph structure, insertion, search, and the distance kernel.
pub mod hnsw;

pub use error::{IndexError, Result};
pub use hnsw::{HnswConfig, HnswIndex};
