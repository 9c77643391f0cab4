//! The owned view state
//!
//! `ViewState` holds one loaded graph together with everything derived from
//! it (closures, layers, sizes, positions) and the current visible set. All
//! mutation goes through its methods; renderers read `snapshot()`.

use std::collections::{BTreeSet, HashSet};

use lineagelens_core::{
    Diagnostic, DiagnosticCode, Edge, EdgeKind, Entity, EntityKind, LayoutConfig, NodeKind,
    Position, RenderedEdge, RenderedEntity, ViewReport, ViewSnapshot,
};
use lineagelens_graph::{EntityGraph, GraphIndex, GraphInput, Leveling, LineageClosure};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::impact::{impact_summary, ImpactSummary};
use crate::layout::{fan_out, layered_layout, measure, measure_all};
use crate::paths::PathCache;
use crate::visibility::{
    Action, Direction, PendingTransition, TransitionGuard, TransitionKey, TransitionOutcome,
    TransitionRequest, TransitionStart, Visibility,
};

/// Flags for drawing an entity's expand/collapse handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    pub has_downstream: bool,
    /// Some direct downstream neighbor is visible
    pub downstream_expanded: bool,
    pub has_upstream: bool,
    /// Some direct upstream neighbor is visible
    pub upstream_expanded: bool,
}

/// Graph, layout and visibility for one diagram
#[derive(Debug, Clone)]
pub struct ViewState {
    config: LayoutConfig,
    index: GraphIndex,
    closure: LineageClosure,
    graph: EntityGraph,
    leveling: Leveling,

    /// Exposures placed after the last populated layer
    trailing: HashSet<String>,

    visibility: Visibility,
    guard: TransitionGuard,
    paths: PathCache,

    /// Geometry problems found after load
    layout_diagnostics: Vec<Diagnostic>,
}

impl ViewState {
    /// Index, level and lay out a graph, then seed the visible set
    pub fn load(input: &GraphInput, config: LayoutConfig) -> Self {
        let mut index = GraphIndex::build(input);
        let closure = LineageClosure::build(index.edges());
        let graph = EntityGraph::from_index(&index);
        let leveling = graph.assign_layers();

        for entity in index.entities_mut() {
            entity.layer = leveling.layer(&entity.name).unwrap_or_default();
        }
        measure_all(&mut index, &config);

        let trailing = index
            .entities()
            .iter()
            .filter(|e| e.is_exposure())
            .filter(|e| graph.upstream(&e.name).is_empty() || !leveling.is_reached(&e.name))
            .map(|e| e.name.clone())
            .collect();

        let visibility = Visibility::initial(&index, |name| {
            let mut neighbors = graph.upstream(name).to_vec();
            neighbors.extend_from_slice(graph.downstream(name));
            neighbors
        });

        let mut state = Self {
            config,
            index,
            closure,
            graph,
            leveling,
            trailing,
            visibility,
            guard: TransitionGuard::default(),
            paths: PathCache::default(),
            layout_diagnostics: Vec::new(),
        };
        state.relayout();

        info!(
            entities = state.index.entities().len(),
            layers = state.leveling.max_layer().map_or(0, |l| l + 1),
            visible = state.visibility.len(),
            focus = state.index.focus_entity().unwrap_or("-"),
            "loaded view"
        );

        state
    }

    /// Lay out the whole visible set from scratch and recompute every path
    pub fn relayout(&mut self) {
        let invalid = layered_layout(&mut self.index, &self.visibility, &self.trailing, &self.config);
        self.hide_degenerate(invalid);
        self.recompute_dependent_paths();
    }

    /// Make every entity visible and lay out again
    pub fn show_all(&mut self) {
        for entity in self.index.entities() {
            self.visibility.show(&entity.name);
        }
        self.relayout();
    }

    // Transitions

    pub fn expand_downstream(&mut self, entity: &str) -> TransitionOutcome {
        self.transition(TransitionRequest::expand_downstream(entity))
    }

    pub fn expand_upstream(&mut self, entity: &str) -> TransitionOutcome {
        self.transition(TransitionRequest::expand_upstream(entity))
    }

    pub fn collapse_downstream(&mut self, entity: &str) -> TransitionOutcome {
        self.transition(TransitionRequest::collapse_downstream(entity))
    }

    pub fn collapse_upstream(&mut self, entity: &str) -> TransitionOutcome {
        self.transition(TransitionRequest::collapse_upstream(entity))
    }

    /// Run both phases of a transition
    pub fn transition(&mut self, request: TransitionRequest) -> TransitionOutcome {
        match self.begin(request) {
            TransitionStart::Pending(pending) => self.finish(pending),
            TransitionStart::NoOp => TransitionOutcome::NoOp,
            TransitionStart::Rejected => TransitionOutcome::Rejected,
        }
    }

    pub fn begin_expand_downstream(&mut self, entity: &str) -> TransitionStart {
        self.begin(TransitionRequest::expand_downstream(entity))
    }

    pub fn begin_expand_upstream(&mut self, entity: &str) -> TransitionStart {
        self.begin(TransitionRequest::expand_upstream(entity))
    }

    pub fn begin_collapse_downstream(&mut self, entity: &str) -> TransitionStart {
        self.begin(TransitionRequest::collapse_downstream(entity))
    }

    pub fn begin_collapse_upstream(&mut self, entity: &str) -> TransitionStart {
        self.begin(TransitionRequest::collapse_upstream(entity))
    }

    /// Phase one: take the guard and change the visible set. Paths are
    /// stale until the returned transition is passed to [`Self::finish`].
    pub fn begin(&mut self, request: TransitionRequest) -> TransitionStart {
        let key = request.key();

        if self.guard.is_held(&key) {
            debug!(entity = %key.entity, direction = %key.direction, "transition already in flight, dropped");
            return TransitionStart::Rejected;
        }
        if !self.graph.contains(&request.entity) {
            debug!(entity = %request.entity, "transition on unknown entity ignored");
            return TransitionStart::NoOp;
        }

        self.guard.acquire(key.clone());
        match self.apply_visibility_change(&request) {
            Some((shown, hidden)) => {
                debug!(
                    entity = %request.entity,
                    direction = %request.direction,
                    action = ?request.action,
                    shown = shown.len(),
                    hidden = hidden.len(),
                    "applied visibility change"
                );
                TransitionStart::Pending(PendingTransition {
                    key,
                    action: request.action,
                    shown,
                    hidden,
                })
            }
            None => {
                self.guard.release(&key);
                TransitionStart::NoOp
            }
        }
    }

    /// Phase two: recompute paths and release the guard
    pub fn finish(&mut self, pending: PendingTransition) -> TransitionOutcome {
        self.recompute_dependent_paths();
        self.guard.release(&pending.key);

        TransitionOutcome::Applied {
            shown: pending.shown,
            hidden: pending.hidden,
        }
    }

    /// Give up on a pending transition without recomputing paths.
    ///
    /// The visibility change from phase one stays in place and the guard is
    /// released. Paths touching the change stay stale until the next
    /// [`Self::finish`], [`Self::recompute_dependent_paths`] or relayout.
    pub fn abandon(&mut self, pending: PendingTransition) {
        debug!(entity = %pending.key.entity, direction = %pending.key.direction, "transition abandoned");
        self.guard.release(&pending.key);
    }

    /// Whether `(entity, direction)` is between phase one and phase two
    pub fn is_in_flight(&self, entity: &str, direction: Direction) -> bool {
        self.guard.is_held(&TransitionKey {
            entity: entity.to_string(),
            direction,
        })
    }

    /// Set mutation plus default placement. `None` when there is nothing to do.
    fn apply_visibility_change(&mut self, request: &TransitionRequest) -> Option<(Vec<String>, Vec<String>)> {
        let entity = request.entity.as_str();

        match request.action {
            Action::Expand => {
                let neighbors = match request.direction {
                    Direction::Downstream => self.graph.downstream(entity).to_vec(),
                    Direction::Upstream => self.graph.upstream(entity).to_vec(),
                };
                if neighbors.is_empty() {
                    return None;
                }

                let mut shown = Vec::new();
                for name in &neighbors {
                    if self.visibility.show(name) {
                        shown.push(name.clone());
                    }
                }

                let invalid = fan_out(&mut self.index, entity, &neighbors, request.direction, &self.config);
                let hidden = self.hide_degenerate(invalid);
                shown.retain(|name| !hidden.contains(name));

                Some((shown, hidden))
            }
            Action::Collapse => {
                let reach = match request.direction {
                    Direction::Downstream => self.graph.transitive_downstream(entity),
                    Direction::Upstream => self.graph.transitive_upstream(entity),
                };
                if reach.is_empty() {
                    return None;
                }

                let mut hidden = Vec::new();
                for name in reach {
                    if self.visibility.hide(&name) {
                        hidden.push(name);
                    }
                }

                Some((Vec::new(), hidden))
            }
        }
    }

    /// Recompute every visible edge's endpoints from current positions
    pub fn recompute_dependent_paths(&mut self) {
        self.paths.recompute_all(&self.index, &self.visibility, &self.config);
    }

    /// Hide `candidates` and any other visible entity without finite
    /// geometry; returns what was actually hidden
    fn hide_degenerate(&mut self, mut candidates: Vec<String>) -> Vec<String> {
        candidates.extend(
            self.index
                .entities()
                .iter()
                .filter(|e| self.visibility.contains(&e.name))
                .filter(|e| e.valid_position().is_none() || !e.size.is_valid())
                .map(|e| e.name.clone()),
        );

        let mut hidden = Vec::new();
        for name in candidates {
            if !self.visibility.hide(&name) {
                continue;
            }

            warn!(entity = %name, "non-finite geometry, entity hidden");
            self.layout_diagnostics.push(
                Diagnostic::warn(
                    DiagnosticCode::InvalidGeometry,
                    format!("Entity '{}' has non-finite size or position and was hidden", name),
                )
                .with_subject(name.clone()),
            );
            hidden.push(name);
        }

        hidden
    }

    // Lineage queries

    /// Upstream closure of a column. A known column without lineage is its
    /// own closure; an unknown id has none.
    pub fn get_upstream(&self, column_id: &str) -> BTreeSet<String> {
        self.closure_or_self(self.closure.upstream_of(column_id), column_id)
    }

    /// Downstream closure of a column, same conventions as `get_upstream`
    pub fn get_downstream(&self, column_id: &str) -> BTreeSet<String> {
        self.closure_or_self(self.closure.downstream_of(column_id), column_id)
    }

    fn closure_or_self(&self, closure: Option<&BTreeSet<String>>, column_id: &str) -> BTreeSet<String> {
        match closure {
            Some(columns) => columns.clone(),
            None if self.is_column(column_id) => BTreeSet::from([column_id.to_string()]),
            None => BTreeSet::new(),
        }
    }

    fn is_column(&self, id: &str) -> bool {
        self.index.node(id).is_some_and(|n| n.kind == NodeKind::Column)
    }

    /// Columns to highlight when `column_id` is selected
    pub fn related_columns(&self, column_id: &str) -> BTreeSet<String> {
        if !self.is_column(column_id) {
            return BTreeSet::new();
        }
        self.closure.related(column_id)
    }

    /// Edges to highlight when `column_id` is selected: lineage edges inside
    /// the related set and exposure edges leaving it
    pub fn highlighted_edges(&self, column_id: &str) -> Vec<&Edge> {
        let related = self.related_columns(column_id);

        self.index
            .edges()
            .iter()
            .filter(|e| match e.kind {
                EdgeKind::Lineage => related.contains(&e.source_id) && related.contains(&e.target_id),
                EdgeKind::ExposureUse => related.contains(&e.source_id),
            })
            .collect()
    }

    pub fn impact_summary(&self, column_id: &str) -> Option<ImpactSummary> {
        impact_summary(&self.index, &self.closure, column_id)
    }

    // Entity-level UI operations

    /// Collapse or expand a model's column list. The entity keeps its
    /// vertical center. Returns false if nothing changed.
    pub fn set_columns_collapsed(&mut self, name: &str, collapsed: bool) -> bool {
        let config = &self.config;
        let Some(entity) = self.index.entity_mut(name) else {
            return false;
        };
        if entity.kind != EntityKind::Model || entity.columns_collapsed == collapsed {
            return false;
        }

        entity.columns_collapsed = collapsed;
        entity.size = measure(entity, config);

        if self.visibility.contains(name) {
            self.hide_degenerate(Vec::new());
        }
        self.paths.recompute_touching(&self.index, &self.visibility, name, &self.config);
        true
    }

    /// Flip the column list; returns the new collapsed flag
    pub fn toggle_columns(&mut self, name: &str) -> Option<bool> {
        let collapsed = !self.index.entity(name)?.columns_collapsed;
        self.set_columns_collapsed(name, collapsed).then_some(collapsed)
    }

    /// Drag a visible entity by `(dx, dy)`. Non-finite results are ignored.
    pub fn move_entity(&mut self, name: &str, dx: f64, dy: f64) -> bool {
        if !self.visibility.contains(name) {
            return false;
        }
        let Some(entity) = self.index.entity_mut(name) else {
            return false;
        };
        let Some(current) = entity.valid_position() else {
            return false;
        };

        let moved = Position::new(current.x + dx, current.y + dy);
        if !moved.is_finite() {
            warn!(entity = %name, dx, dy, "ignored move to non-finite position");
            return false;
        }
        entity.position = Some(moved);

        self.paths.recompute_touching(&self.index, &self.visibility, name, &self.config);
        true
    }

    pub fn expansion_state(&self, name: &str) -> Option<ExpansionState> {
        if !self.graph.contains(name) {
            return None;
        }
        let downstream = self.graph.downstream(name);
        let upstream = self.graph.upstream(name);

        Some(ExpansionState {
            has_downstream: !downstream.is_empty(),
            downstream_expanded: downstream.iter().any(|n| self.visibility.contains(n)),
            has_upstream: !upstream.is_empty(),
            upstream_expanded: upstream.iter().any(|n| self.visibility.contains(n)),
        })
    }

    // Read access

    pub fn is_entity_visible(&self, name: &str) -> bool {
        self.visibility.contains(name)
    }

    /// Visible entities in index order
    pub fn visible_entities(&self) -> Vec<&Entity> {
        self.index
            .entities()
            .iter()
            .filter(|e| self.visibility.contains(&e.name))
            .collect()
    }

    /// Names of visible entities in index order
    pub fn visible_names(&self) -> Vec<&str> {
        self.visible_entities().into_iter().map(|e| e.name.as_str()).collect()
    }

    pub fn visible_edges(&self) -> Vec<&Edge> {
        self.index
            .edges()
            .iter()
            .filter(|e| self.visibility.edge_visible(&self.index, e))
            .collect()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.index.entity(name)
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn entity_graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn leveling(&self) -> &Leveling {
        &self.leveling
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Load diagnostics followed by layout diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.index
            .diagnostics()
            .iter()
            .chain(&self.layout_diagnostics)
            .cloned()
            .collect()
    }

    /// Everything a renderer needs to draw the current view
    pub fn snapshot(&self) -> ViewSnapshot {
        let entities = self
            .visible_entities()
            .into_iter()
            .filter_map(|e| {
                let position = e.valid_position()?;
                Some(RenderedEntity {
                    name: e.name.clone(),
                    kind: e.kind,
                    resource_type: e.resource_type.clone(),
                    columns: e.columns.clone(),
                    layer: e.layer,
                    x: position.x,
                    y: position.y,
                    width: e.size.width,
                    height: e.size.height,
                    columns_collapsed: e.columns_collapsed,
                })
            })
            .collect();

        let edges = self
            .paths
            .iter()
            .filter_map(|(slot, endpoints)| {
                let edge = self.index.edges().get(slot)?;
                Some(RenderedEdge {
                    source_id: edge.source_id.clone(),
                    target_id: edge.target_id.clone(),
                    kind: edge.kind,
                    path_endpoints: *endpoints,
                    path: endpoints.svg_path(),
                })
            })
            .collect();

        ViewSnapshot { entities, edges }
    }

    /// Versioned export of the current view
    pub fn report(&self) -> ViewReport {
        ViewReport::new(self.index.entities().len(), self.snapshot(), self.diagnostics())
    }
}
