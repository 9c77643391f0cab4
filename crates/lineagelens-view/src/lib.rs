//! Lineage view engine
//!
//! This crate implements the interactive side of the diagram:
//! - Layered layout and placement of revealed entities
//! - Visible set with guarded expand/collapse transitions
//! - Edge path recomputation
//! - Highlighting and impact summaries over column lineage

pub mod layout;
pub mod visibility;
pub mod paths;
pub mod impact;
pub mod state;

pub use impact::ImpactSummary;
pub use paths::PathCache;
pub use state::{ExpansionState, ViewState};
pub use visibility::{
    Action, Direction, PendingTransition, TransitionKey, TransitionOutcome, TransitionRequest,
    TransitionStart,
};

use lineagelens_core::LayoutConfig;
use lineagelens_graph::GraphInput;

/// Build a view for `input`: index, closures, layers, initial layout
pub fn load_graph(input: &GraphInput, config: LayoutConfig) -> ViewState {
    ViewState::load(input, config)
}
