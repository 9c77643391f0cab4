//! Layout configuration schema (lineagelens.toml)

use serde::{Deserialize, Serialize};

/// Box dimensions for entities and their column rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Fixed width of every entity box
    pub width: f64,

    /// Inner padding (also the diagram margin)
    pub padding: f64,

    /// Height of the title row
    pub title_height: f64,

    /// Height of the resource-type row below the title
    pub subtitle_height: f64,

    /// Height of one column row
    pub column_height: f64,

    /// Gap between column rows
    pub column_padding: f64,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            width: 250.0,
            padding: 15.0,
            title_height: 40.0,
            subtitle_height: 28.0,
            column_height: 28.0,
            column_padding: 4.0,
        }
    }
}

/// Spacing between layers and between stacked entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Horizontal gap between layers
    pub x_spacing: f64,

    /// Vertical gap between entities in a layer
    pub y_spacing: f64,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            x_spacing: 150.0,
            y_spacing: 40.0,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Entity box dimensions
    #[serde(default, rename = "box")]
    pub node_box: BoxConfig,

    /// Layer and stacking gaps
    #[serde(default)]
    pub layout: SpacingConfig,
}

impl LayoutConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Title plus resource-type row; the height of a collapsed model
    pub fn header_height(&self) -> f64 {
        self.node_box.title_height + self.node_box.subtitle_height
    }

    /// Horizontal distance from one layer's left edge to the next
    pub fn layer_stride(&self) -> f64 {
        self.node_box.width + self.layout.x_spacing
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_box.width, 250.0);
        assert_eq!(config.header_height(), 68.0);
        assert_eq!(config.layer_stride(), 400.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = LayoutConfig::from_toml(
            r#"
            [box]
            width = 300.0

            [layout]
            y_spacing = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.node_box.width, 300.0);
        assert_eq!(config.node_box.column_height, 28.0);
        assert_eq!(config.layout.y_spacing, 10.0);
        assert_eq!(config.layout.x_spacing, 150.0);
    }

    #[test]
    fn non_finite_values_parse() {
        let config = LayoutConfig::from_toml("[box]\ncolumn_height = nan\n").unwrap();
        assert!(config.node_box.column_height.is_nan());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = LayoutConfig::from_toml("[box\nwidth = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = LayoutConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: LayoutConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
