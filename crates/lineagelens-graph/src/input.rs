//! Raw graph input parsing
//!
//! Parses the `{nodes, edges, main_node}` JSON document produced by the
//! lineage loader. Unknown node/edge types are kept as `Unknown` so that a
//! single bad record never fails the whole document.

use lineagelens_core::ExposureDetails;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Graph document as handed over by the loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    /// Column and exposure nodes
    #[serde(default)]
    pub nodes: Vec<RawNode>,

    /// Lineage and exposure edges
    #[serde(default)]
    pub edges: Vec<RawEdge>,

    /// Column the view should initially focus on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_node: Option<String>,
}

impl GraphInput {
    /// Load a graph from file
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| InputError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse a graph from JSON string
    pub fn from_str(json: &str) -> Result<Self, InputError> {
        serde_json::from_str(json)
            .map_err(|e| InputError::ParseError(e.to_string()))
    }

    pub fn with_main_node(mut self, column_id: impl Into<String>) -> Self {
        self.main_node = Some(column_id.into());
        self
    }
}

/// Node type as written by the loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawNodeKind {
    Column,
    Exposure,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A node record (column or exposure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Unique identifier (e.g., "orders.customer_id")
    pub id: String,

    /// Node type
    #[serde(rename = "type", default)]
    pub kind: RawNodeKind,

    /// Owning model name (exposure name for exposure nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Column name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_key: Option<bool>,

    /// Marks the column of the focal model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_main: Option<bool>,

    /// Resource type (model, source, seed, snapshot)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Exposure details (type, url, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_data: Option<ExposureDetails>,
}

impl RawNode {
    /// Column node whose label is the part of the id after the last dot
    pub fn column(id: impl Into<String>, model: impl Into<String>) -> Self {
        let id = id.into();
        let label = id.rsplit('.').next().unwrap_or(&id).to_string();
        Self {
            id,
            kind: RawNodeKind::Column,
            model: Some(model.into()),
            label: Some(label),
            data_type: None,
            is_key: None,
            is_main: None,
            resource_type: None,
            exposure_data: None,
        }
    }

    /// Exposure node named `name`
    pub fn exposure(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            kind: RawNodeKind::Exposure,
            label: Some(name.clone()),
            model: Some(name),
            data_type: None,
            is_key: None,
            is_main: None,
            resource_type: None,
            exposure_data: Some(ExposureDetails::default()),
        }
    }

    pub fn with_main(mut self) -> Self {
        self.is_main = Some(true);
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Edge type as written by the loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawEdgeKind {
    Lineage,
    Exposure,
    #[default]
    #[serde(other)]
    Unknown,
}

/// An edge record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: RawEdgeKind,
}

impl RawEdge {
    pub fn lineage(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: RawEdgeKind::Lineage,
        }
    }

    pub fn exposure(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: RawEdgeKind::Exposure,
        }
    }
}

/// Graph input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read graph file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse graph JSON: {0}")]
    ParseError(String),
}
