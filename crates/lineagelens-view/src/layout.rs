//! Layered layout engine
//!
//! Layers are laid out left to right, entities in a layer stacked top to
//! bottom in input order, and each layer centered vertically against the
//! tallest one. Revealed entities that have never been placed are fanned out
//! next to the entity that revealed them instead.

use std::collections::{BTreeMap, HashSet};

use lineagelens_core::{Entity, EntityKind, LayoutConfig, Position, Size};
use lineagelens_graph::GraphIndex;

use crate::visibility::{Direction, Visibility};

/// Box size of an entity under the given configuration
pub fn measure(entity: &Entity, config: &LayoutConfig) -> Size {
    let b = &config.node_box;

    let height = match entity.kind {
        EntityKind::Exposure => {
            let rows = entity.exposure.as_ref().map_or(0, |d| d.detail_rows());
            let details = if rows == 0 { 0.0 } else { rows as f64 * b.column_height };
            b.title_height + details + b.padding
        }
        EntityKind::Model if entity.columns_collapsed => config.header_height(),
        EntityKind::Model => {
            // A model without column data still gets one row
            let rows = entity.columns.len().max(1);
            config.header_height() + rows as f64 * b.column_height + b.padding
        }
    };

    Size {
        width: b.width,
        height,
    }
}

/// Size every entity of the index
pub fn measure_all(index: &mut GraphIndex, config: &LayoutConfig) {
    for entity in index.entities_mut() {
        entity.size = measure(entity, config);
    }
}

/// Lay out every visible entity from scratch.
///
/// `trailing` names entities placed after the last populated layer instead
/// of at their own layer (exposures with nothing upstream of them).
/// Returns the names of visible entities whose size or position came out
/// non-finite; those keep their previous position and must be hidden by
/// the caller.
pub fn layered_layout(
    index: &mut GraphIndex,
    visibility: &Visibility,
    trailing: &HashSet<String>,
    config: &LayoutConfig,
) -> Vec<String> {
    let mut layers: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut appended = Vec::new();

    for (slot, entity) in index.entities().iter().enumerate() {
        if !visibility.contains(&entity.name) {
            continue;
        }
        if trailing.contains(&entity.name) {
            appended.push(slot);
        } else {
            layers.entry(entity.layer).or_default().push(slot);
        }
    }

    if !appended.is_empty() {
        if let Some(last) = layers.values_mut().next_back() {
            last.extend(appended);
        } else {
            layers.insert(0, appended);
        }
    }

    let entities = index.entities_mut();
    let mut invalid = Vec::new();
    let mut placed_layers: Vec<(Vec<usize>, f64)> = Vec::new();
    let mut x = config.node_box.padding;

    for slots in layers.values() {
        let mut y = config.node_box.padding;
        let mut bottom = 0.0;
        let mut placed = Vec::new();

        for &slot in slots {
            let entity = &mut entities[slot];
            let size = entity.size;
            let position = Position::new(x, y + size.height / 2.0);

            if !size.is_valid() || !position.is_finite() {
                invalid.push(entity.name.clone());
                continue;
            }

            entity.position = Some(position);
            bottom = y + size.height;
            y += size.height + config.layout.y_spacing;
            placed.push(slot);
        }

        // Empty layers take no horizontal room
        if placed.is_empty() {
            continue;
        }
        x += config.layer_stride();
        placed_layers.push((placed, bottom));
    }

    let tallest = placed_layers
        .iter()
        .map(|(_, bottom)| *bottom)
        .fold(0.0, f64::max);

    for (slots, bottom) in &placed_layers {
        let shift = (tallest - bottom) / 2.0;
        if shift <= 0.0 {
            continue;
        }
        for &slot in slots {
            if let Some(position) = entities[slot].position.as_mut() {
                position.y += shift;
            }
        }
    }

    invalid
}

/// Place the unplaced `neighbors` of `anchor` in a column beside it,
/// vertically centered on the anchor. Neighbors that already have a valid
/// position keep it, and a new box that would cross one of them in the
/// placement column is pushed below it.
///
/// Returns the neighbors whose candidate position was not finite.
pub fn fan_out(
    index: &mut GraphIndex,
    anchor: &str,
    neighbors: &[String],
    direction: Direction,
    config: &LayoutConfig,
) -> Vec<String> {
    let b = &config.node_box;
    let y_spacing = config.layout.y_spacing;
    let parent = index.entity(anchor).and_then(Entity::valid_position);

    let column_x = match (parent, direction) {
        (Some(p), Direction::Downstream) => p.x + config.layer_stride(),
        (Some(p), Direction::Upstream) => p.x - config.layer_stride(),
        (None, Direction::Downstream) => b.padding + config.layout.x_spacing,
        (None, Direction::Upstream) => b.padding,
    };
    let center_y = parent.map_or(b.padding, |p| p.y);

    let mut heights = Vec::new();
    let mut occupied: Vec<(f64, f64)> = Vec::new();
    for entity in neighbors.iter().filter_map(|name| index.entity(name)) {
        match (entity.valid_position(), entity.top(), entity.bottom()) {
            (Some(position), Some(top), Some(bottom)) => {
                if (position.x - column_x).abs() < b.width {
                    occupied.push((top, bottom));
                }
            }
            _ => heights.push(entity.size.height),
        }
    }
    occupied.sort_by(|l, r| l.0.total_cmp(&r.0));

    let gaps = heights.len().saturating_sub(1) as f64 * y_spacing;
    let span = heights.iter().sum::<f64>() + gaps;

    let mut cursor = center_y - span / 2.0;
    let mut invalid = Vec::new();

    for name in neighbors {
        let Some(entity) = index.entity_mut(name) else {
            continue;
        };
        if entity.valid_position().is_some() {
            continue;
        }

        let height = entity.size.height;

        // Ranges are sorted by top, so one pass clears every crossing
        for &(top, bottom) in &occupied {
            if cursor < bottom + y_spacing && cursor + height + y_spacing > top {
                cursor = cursor.max(bottom + y_spacing);
            }
        }

        let position = Position::new(column_x, cursor + height / 2.0);
        if entity.size.is_valid() && position.is_finite() {
            entity.position = Some(position);
            cursor += height + y_spacing;
        } else {
            invalid.push(name.clone());
        }
    }

    invalid
}
