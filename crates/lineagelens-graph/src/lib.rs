//! Graph construction and lineage analysis
//!
//! This crate handles:
//! - Parsing the raw node/edge graph handed over by the loader
//! - Indexing nodes and grouping columns into entities
//! - Column-level lineage closures (upstream/downstream)
//! - Entity-level adjacency and topological leveling

pub mod input;
pub mod index;
pub mod closure;
pub mod dag;

pub use input::{GraphInput, InputError, RawEdge, RawEdgeKind, RawNode, RawNodeKind};
pub use index::GraphIndex;
pub use closure::LineageClosure;
pub use dag::{EntityGraph, Leveling};
