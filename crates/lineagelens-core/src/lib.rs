//! LineageLens Core
//!
//! Core domain model shared by the graph and view crates: raw nodes and
//! edges, derived entities, layout configuration, load diagnostics and the
//! rendering output contract.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod model;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use model::{
    ColumnInfo, Edge, EdgeKind, Entity, EntityKind, ExposureDetails, Node, NodeKind, Position, Size,
    DEFAULT_RESOURCE_TYPE,
};
pub use report::{PathEndpoints, RenderedEdge, RenderedEntity, ReportVersion, ViewReport, ViewSnapshot, ViewSummary};
pub use config::{BoxConfig, ConfigError, LayoutConfig, SpacingConfig};
