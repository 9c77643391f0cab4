//! Edge anchor points
//!
//! Edges leave the right side of the source column row and enter the left
//! side of the target column row (or the vertical center of an exposure).

use std::collections::BTreeMap;

use lineagelens_core::{Edge, Entity, LayoutConfig, PathEndpoints};
use lineagelens_graph::GraphIndex;

use crate::visibility::Visibility;

/// Vertical anchor of a node inside its entity box
pub fn anchor_y(entity: &Entity, node_id: &str, config: &LayoutConfig) -> Option<f64> {
    let position = entity.valid_position()?;
    if entity.is_exposure() {
        return Some(position.y);
    }

    let top = entity.top()?;
    let header = config.header_height();
    if entity.columns_collapsed {
        return Some(top + header / 2.0);
    }

    let b = &config.node_box;
    let row = entity.column_index(node_id)? as f64;
    Some(top + header + row * b.column_height + (b.column_height - b.column_padding) / 2.0)
}

/// Endpoints of an edge, if both ends are placed and finite
pub fn endpoints(index: &GraphIndex, edge: &Edge, config: &LayoutConfig) -> Option<PathEndpoints> {
    let source = index.entity(index.entity_of(&edge.source_id)?)?;
    let target = index.entity(index.entity_of(&edge.target_id)?)?;

    let b = &config.node_box;
    let endpoints = PathEndpoints {
        x1: source.valid_position()?.x + b.width - b.padding,
        y1: anchor_y(source, &edge.source_id, config)?,
        x2: target.valid_position()?.x + b.padding,
        y2: anchor_y(target, &edge.target_id, config)?,
    };

    endpoints.is_finite().then_some(endpoints)
}

/// Endpoints of the currently visible edges, keyed by edge position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathCache {
    paths: BTreeMap<usize, PathEndpoints>,
}

impl PathCache {
    /// Recompute every visible edge
    pub fn recompute_all(&mut self, index: &GraphIndex, visibility: &Visibility, config: &LayoutConfig) {
        self.paths.clear();
        for (slot, edge) in index.edges().iter().enumerate() {
            if !visibility.edge_visible(index, edge) {
                continue;
            }
            if let Some(endpoints) = endpoints(index, edge, config) {
                self.paths.insert(slot, endpoints);
            }
        }
    }

    /// Recompute only the edges touching `entity`
    pub fn recompute_touching(
        &mut self,
        index: &GraphIndex,
        visibility: &Visibility,
        entity: &str,
        config: &LayoutConfig,
    ) {
        for (slot, edge) in index.edges().iter().enumerate() {
            let touches = index.entity_of(&edge.source_id) == Some(entity)
                || index.entity_of(&edge.target_id) == Some(entity);
            if !touches {
                continue;
            }

            match endpoints(index, edge, config) {
                Some(endpoints) if visibility.edge_visible(index, edge) => {
                    self.paths.insert(slot, endpoints);
                }
                _ => {
                    self.paths.remove(&slot);
                }
            }
        }
    }

    pub fn get(&self, slot: usize) -> Option<&PathEndpoints> {
        self.paths.get(&slot)
    }

    /// Edge positions with paths, in input order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PathEndpoints)> {
        self.paths.iter().map(|(slot, endpoints)| (*slot, endpoints))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
