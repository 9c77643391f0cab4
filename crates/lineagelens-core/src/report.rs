//! Rendering output contract and view report (stable v1)
//!
//! `ViewSnapshot` is what a rendering collaborator draws. `ViewReport`
//! wraps a snapshot for export; it is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::Diagnostic;
use crate::model::{ColumnInfo, EdgeKind, EntityKind};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A visible entity as handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEntity {
    pub name: String,
    pub kind: EntityKind,
    pub resource_type: String,
    pub columns: Vec<ColumnInfo>,
    pub layer: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub columns_collapsed: bool,
}

/// Anchor points of an edge: source side (x1, y1) to target side (x2, y2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathEndpoints {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl PathEndpoints {
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Horizontal cubic curve between the endpoints, as an SVG path
    pub fn svg_path(&self) -> String {
        let mid_x = (self.x1 + self.x2) / 2.0;
        format!(
            "M{},{} C{},{} {},{} {},{}",
            self.x1, self.y1, mid_x, self.y1, mid_x, self.y2, self.x2, self.y2
        )
    }
}

/// A visible edge as handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub path_endpoints: PathEndpoints,
    pub path: String,
}

/// Everything currently drawable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub entities: Vec<RenderedEntity>,
    pub edges: Vec<RenderedEdge>,
}

impl ViewSnapshot {
    /// Find a rendered entity by name
    pub fn entity(&self, name: &str) -> Option<&RenderedEntity> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSummary {
    /// Entities known to the loaded graph
    pub total_entities: usize,

    /// Entities currently visible
    pub visible_entities: usize,

    /// Edges currently visible
    pub visible_edges: usize,

    /// Distinct layers among visible entities
    pub visible_layers: usize,

    /// Number of load/layout diagnostics
    pub diagnostics: usize,
}

/// View report (view.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ViewSummary,

    /// Drawable view
    pub view: ViewSnapshot,

    /// Load and layout diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl ViewReport {
    /// Create a report from a snapshot and the diagnostics collected so far
    pub fn new(total_entities: usize, view: ViewSnapshot, diagnostics: Vec<Diagnostic>) -> Self {
        let mut layers: Vec<usize> = view.entities.iter().map(|e| e.layer).collect();
        layers.sort_unstable();
        layers.dedup();

        let summary = ViewSummary {
            total_entities,
            visible_entities: view.entities.len(),
            visible_edges: view.edges.len(),
            visible_layers: layers.len(),
            diagnostics: diagnostics.len(),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            view,
            diagnostics,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, DiagnosticCode};
    use pretty_assertions::assert_eq;

    fn rendered(name: &str, layer: usize) -> RenderedEntity {
        RenderedEntity {
            name: name.to_string(),
            kind: EntityKind::Model,
            resource_type: "model".to_string(),
            columns: Vec::new(),
            layer,
            x: 0.0,
            y: 0.0,
            width: 250.0,
            height: 96.0,
            columns_collapsed: false,
        }
    }

    #[test]
    fn svg_path_is_horizontal_cubic() {
        let endpoints = PathEndpoints { x1: 0.0, y1: 10.0, x2: 100.0, y2: 30.0 };
        assert_eq!(endpoints.svg_path(), "M0,10 C50,10 50,30 100,30");
    }

    #[test]
    fn non_finite_endpoints() {
        let endpoints = PathEndpoints { x1: f64::NAN, y1: 0.0, x2: 1.0, y2: 1.0 };
        assert!(!endpoints.is_finite());
    }

    #[test]
    fn report_summary_counts() {
        let view = ViewSnapshot {
            entities: vec![rendered("a", 0), rendered("b", 1), rendered("c", 1)],
            edges: Vec::new(),
        };
        let diagnostics = vec![Diagnostic::warn(DiagnosticCode::NodeMissingEntity, "missing")];

        let report = ViewReport::new(5, view, diagnostics);
        assert_eq!(
            report.summary,
            ViewSummary {
                total_entities: 5,
                visible_entities: 3,
                visible_edges: 0,
                visible_layers: 2,
                diagnostics: 1,
            }
        );
        assert_eq!(report.version, ReportVersion::CURRENT);
    }

    #[test]
    fn report_serialization() {
        let report = ViewReport::new(0, ViewSnapshot::default(), Vec::new());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"view\""));
        assert!(json.contains("\"diagnostics\""));
    }
}
