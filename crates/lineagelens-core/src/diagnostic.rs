//! Load and layout diagnostics
//!
//! Nothing in the core fails hard: a malformed record is skipped and
//! reported here instead.
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Node issues
    /// A node does not name its owning model/exposure
    NodeMissingEntity,

    /// A node has a type other than column or exposure
    NodeUnknownKind,

    /// A node id was already used by an earlier node
    NodeDuplicateId,

    // Edge issues
    /// An edge has a type other than lineage or exposure
    EdgeUnknownKind,

    /// An edge source id is not a known node
    EdgeUnknownSource,

    /// An edge target id is not a known node
    EdgeUnknownTarget,

    /// Edge endpoint kinds do not match the edge type
    EdgeInvalidEndpoint,

    // Graph issues
    /// A model and an exposure share the same entity name
    EntityKindConflict,

    /// `main_node` does not name a known column
    MainNodeUnknown,

    // Layout issues
    /// Computed height or position is not a finite number
    InvalidGeometry,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeMissingEntity => "NODE_MISSING_ENTITY",
            Self::NodeUnknownKind => "NODE_UNKNOWN_KIND",
            Self::NodeDuplicateId => "NODE_DUPLICATE_ID",
            Self::EdgeUnknownKind => "EDGE_UNKNOWN_KIND",
            Self::EdgeUnknownSource => "EDGE_UNKNOWN_SOURCE",
            Self::EdgeUnknownTarget => "EDGE_UNKNOWN_TARGET",
            Self::EdgeInvalidEndpoint => "EDGE_INVALID_ENDPOINT",
            Self::EntityKindConflict => "ENTITY_KIND_CONFLICT",
            Self::MainNodeUnknown => "MAIN_NODE_UNKNOWN",
            Self::InvalidGeometry => "INVALID_GEOMETRY",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the element was skipped or hidden
    Warn,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Node id, edge endpoints or entity name the diagnostic is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            subject: None,
        }
    }

    /// Shorthand for a skipped-element warning
    pub fn warn(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warn, message)
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}
