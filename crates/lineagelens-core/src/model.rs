//! Graph and entity types

use serde::{Deserialize, Serialize};

/// Resource type used when no column of an entity declares one
pub const DEFAULT_RESOURCE_TYPE: &str = "model";

/// Kind of a raw graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A column belonging to a model, source, seed or snapshot
    Column,

    /// A downstream consumer (dashboard, notebook, application)
    Exposure,
}

/// Kind of a raw graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Target column is computed using the source column
    Lineage,

    /// The target exposure consumes the source column
    ExposureUse,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lineage => write!(f, "lineage"),
            Self::ExposureUse => write!(f, "exposure"),
        }
    }
}

/// Optional descriptive fields carried by an exposure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureDetails {
    /// Exposure type (dashboard, notebook, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub exposure_type: Option<String>,

    /// Link to the exposure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Any other keys the loader attached
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExposureDetails {
    /// Number of optional detail rows drawn inside the exposure box
    pub fn detail_rows(&self) -> usize {
        usize::from(self.exposure_type.is_some()) + usize::from(self.url.is_some())
    }
}

/// A validated graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, stable identifier
    pub id: String,

    pub kind: NodeKind,

    /// Owning entity (model name for columns, own name for exposures)
    pub entity_name: String,

    /// Display label (column name)
    pub label: String,

    pub data_type: Option<String>,

    pub is_key: bool,

    /// Marks the column whose model is the focal entity
    pub is_main_focus: bool,

    /// Declared resource type (model, source, seed, snapshot)
    pub resource_type: Option<String>,

    /// Exposure details, only for exposure nodes
    pub exposure: Option<ExposureDetails>,
}

/// A validated graph edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
        }
    }
}

/// Kind of a derived entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Model,
    Exposure,
}

/// A column as listed inside its entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub id: String,
    pub label: String,
    pub data_type: Option<String>,
    pub is_key: bool,
}

/// Diagram coordinates: `x` is the left edge, `y` the vertical center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.height > 0.0
    }
}

/// A grouped unit in the diagram: a model (with columns) or an exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    pub kind: EntityKind,

    /// First declared resource type among the columns, or `model`
    pub resource_type: String,

    /// Columns in input order (always empty for exposures)
    pub columns: Vec<ColumnInfo>,

    /// Exposure details, only for exposures
    pub exposure: Option<ExposureDetails>,

    /// One of the columns is flagged as the main focus
    pub is_main_focus: bool,

    /// Topological layer assigned by the leveler
    pub layer: usize,

    /// `None` until the layout engine has placed the entity
    pub position: Option<Position>,

    pub size: Size,

    pub columns_collapsed: bool,
}

impl Entity {
    /// Create a model entity with no columns yet
    pub fn model(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Model,
            resource_type: resource_type.into(),
            columns: Vec::new(),
            exposure: None,
            is_main_focus: false,
            layer: 0,
            position: None,
            size: Size::default(),
            columns_collapsed: false,
        }
    }

    /// Create a zero-column exposure entity
    pub fn exposure(name: impl Into<String>, details: ExposureDetails) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Exposure,
            resource_type: "exposure".to_string(),
            columns: Vec::new(),
            exposure: Some(details),
            is_main_focus: false,
            layer: 0,
            position: None,
            size: Size::default(),
            columns_collapsed: false,
        }
    }

    pub fn is_exposure(&self) -> bool {
        self.kind == EntityKind::Exposure
    }

    /// Position of a column within this entity
    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    /// Position, if one has been assigned and is finite
    pub fn valid_position(&self) -> Option<Position> {
        self.position.filter(Position::is_finite)
    }

    /// Top edge of the box
    pub fn top(&self) -> Option<f64> {
        self.valid_position().map(|p| p.y - self.size.height / 2.0)
    }

    /// Bottom edge of the box
    pub fn bottom(&self) -> Option<f64> {
        self.valid_position().map(|p| p.y + self.size.height / 2.0)
    }
}
