//! Core domain types for Graphloom
//!
//! This crate defines the fundamental data structures flowing through
//! the pipeline: text chunks, candidate triples, and the read views of
//! persisted graph records.

pub mod artifacts;
pub mod chunk;
pub mod error;
pub mod graph;
pub mod triple;

pub use chunk::Chunk;
pub use error::{CoreError, Result};
pub use graph::{GraphEdge, GraphNode};
pub use triple::Triple;
