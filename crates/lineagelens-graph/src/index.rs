//! Node index and entity grouping
//!
//! Turns the raw node/edge lists into an id -> node lookup, the validated
//! edge list and the list of entities (models with their columns, and
//! zero-column exposures). Malformed records are skipped with a diagnostic.

use std::collections::{HashMap, HashSet};

use lineagelens_core::{
    ColumnInfo, Diagnostic, DiagnosticCode, Edge, EdgeKind, Entity, EntityKind, Node, NodeKind,
    Severity, DEFAULT_RESOURCE_TYPE,
};
use tracing::{info, warn};

use crate::input::{GraphInput, RawEdgeKind, RawNode, RawNodeKind};

/// Lookup tables for one loaded graph
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    /// Validated nodes by id
    nodes: HashMap<String, Node>,

    /// Validated edges in input order
    edges: Vec<Edge>,

    /// Models in first-seen order, then exposures in first-seen order
    entities: Vec<Entity>,

    /// Entity name -> position in `entities`
    entity_lookup: HashMap<String, usize>,

    /// Entity the view is centred on
    focus_entity: Option<String>,

    /// Column to highlight on load
    focus_column: Option<String>,

    /// Everything skipped while building
    diagnostics: Vec<Diagnostic>,
}

impl GraphIndex {
    /// Build the index from a raw graph
    pub fn build(input: &GraphInput) -> Self {
        let mut index = Self::default();

        let order = index.index_nodes(&input.nodes);
        index.group_entities(&order);
        index.index_edges(input);
        index.resolve_focus(input.main_node.as_deref());

        info!(
            nodes = index.nodes.len(),
            edges = index.edges.len(),
            entities = index.entities.len(),
            skipped = index.diagnostics.len(),
            "indexed lineage graph"
        );

        index
    }

    fn skip(&mut self, diagnostic: Diagnostic) {
        warn!(code = %diagnostic.code, subject = ?diagnostic.subject, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Validate nodes; returns accepted ids in input order
    fn index_nodes(&mut self, raw_nodes: &[RawNode]) -> Vec<String> {
        let mut order = Vec::with_capacity(raw_nodes.len());

        for raw in raw_nodes {
            let kind = match raw.kind {
                RawNodeKind::Column => NodeKind::Column,
                RawNodeKind::Exposure => NodeKind::Exposure,
                RawNodeKind::Unknown => {
                    self.skip(
                        Diagnostic::warn(
                            DiagnosticCode::NodeUnknownKind,
                            format!("Node '{}' has an unsupported type, skipping", raw.id),
                        )
                        .with_subject(raw.id.clone()),
                    );
                    continue;
                }
            };

            let Some(entity_name) = raw.model.as_deref().filter(|m| !m.is_empty()) else {
                self.skip(
                    Diagnostic::warn(
                        DiagnosticCode::NodeMissingEntity,
                        format!("Node '{}' does not name its model, skipping", raw.id),
                    )
                    .with_subject(raw.id.clone()),
                );
                continue;
            };

            if self.nodes.contains_key(&raw.id) {
                self.skip(
                    Diagnostic::warn(
                        DiagnosticCode::NodeDuplicateId,
                        format!("Node id '{}' is already in use, skipping", raw.id),
                    )
                    .with_subject(raw.id.clone()),
                );
                continue;
            }

            let node = Node {
                id: raw.id.clone(),
                kind,
                entity_name: entity_name.to_string(),
                label: raw.label.clone().unwrap_or_else(|| raw.id.clone()),
                data_type: raw.data_type.clone(),
                is_key: raw.is_key.unwrap_or(false),
                is_main_focus: raw.is_main.unwrap_or(false),
                resource_type: raw.resource_type.clone().filter(|t| !t.is_empty()),
                exposure: match kind {
                    NodeKind::Exposure => Some(raw.exposure_data.clone().unwrap_or_default()),
                    NodeKind::Column => None,
                },
            };

            order.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }

        order
    }

    /// Group columns into models and exposures into zero-column entities
    fn group_entities(&mut self, order: &[String]) {
        // First declared resource type per model, so that a partially
        // annotated model gets one consistent type.
        let mut resource_types: HashMap<&str, &str> = HashMap::new();
        for node in order.iter().filter_map(|id| self.nodes.get(id)) {
            if node.kind != NodeKind::Column {
                continue;
            }
            if let Some(resource_type) = node.resource_type.as_deref() {
                resource_types.entry(node.entity_name.as_str()).or_insert(resource_type);
            }
        }

        let mut models: Vec<Entity> = Vec::new();
        let mut exposures: Vec<Entity> = Vec::new();
        let mut model_slots: HashMap<String, usize> = HashMap::new();
        let mut exposure_names: HashSet<String> = HashSet::new();

        for node in order.iter().filter_map(|id| self.nodes.get(id)) {
            match node.kind {
                NodeKind::Column => {
                    let slot = *model_slots.entry(node.entity_name.clone()).or_insert_with(|| {
                        let resource_type = resource_types
                            .get(node.entity_name.as_str())
                            .copied()
                            .unwrap_or(DEFAULT_RESOURCE_TYPE);
                        models.push(Entity::model(node.entity_name.clone(), resource_type));
                        models.len() - 1
                    });

                    let model = &mut models[slot];
                    model.is_main_focus |= node.is_main_focus;
                    model.columns.push(ColumnInfo {
                        id: node.id.clone(),
                        label: node.label.clone(),
                        data_type: node.data_type.clone(),
                        is_key: node.is_key,
                    });
                }
                NodeKind::Exposure => {
                    if exposure_names.insert(node.entity_name.clone()) {
                        exposures.push(Entity::exposure(
                            node.entity_name.clone(),
                            node.exposure.clone().unwrap_or_default(),
                        ));
                    }
                }
            }
        }

        let mut conflicts = Vec::new();
        exposures.retain(|exposure| {
            let clash = model_slots.contains_key(&exposure.name);
            if clash {
                conflicts.push(exposure.name.clone());
            }
            !clash
        });
        for name in conflicts {
            self.nodes
                .retain(|_, n| !(n.kind == NodeKind::Exposure && n.entity_name == name));
            self.skip(
                Diagnostic::warn(
                    DiagnosticCode::EntityKindConflict,
                    format!("Exposure '{}' has the same name as a model, skipping", name),
                )
                .with_subject(name),
            );
        }

        self.entities = models;
        self.entities.extend(exposures);
        self.entity_lookup = self
            .entities
            .iter()
            .enumerate()
            .map(|(slot, entity)| (entity.name.clone(), slot))
            .collect();
    }

    fn index_edges(&mut self, input: &GraphInput) {
        for raw in &input.edges {
            let subject = format!("{} -> {}", raw.source, raw.target);

            let kind = match raw.kind {
                RawEdgeKind::Lineage => EdgeKind::Lineage,
                RawEdgeKind::Exposure => EdgeKind::ExposureUse,
                RawEdgeKind::Unknown => {
                    self.skip(
                        Diagnostic::warn(
                            DiagnosticCode::EdgeUnknownKind,
                            format!("Edge {} has an unsupported type, skipping", subject),
                        )
                        .with_subject(subject),
                    );
                    continue;
                }
            };

            let source = self.nodes.get(&raw.source).map(|n| (n.kind, n.entity_name.clone()));
            let Some((source_kind, source_entity)) = source else {
                self.skip(
                    Diagnostic::warn(
                        DiagnosticCode::EdgeUnknownSource,
                        format!("Edge source '{}' is not a known node, skipping", raw.source),
                    )
                    .with_subject(subject),
                );
                continue;
            };

            let target = self.nodes.get(&raw.target).map(|n| (n.kind, n.entity_name.clone()));
            let Some((target_kind, target_entity)) = target else {
                self.skip(
                    Diagnostic::warn(
                        DiagnosticCode::EdgeUnknownTarget,
                        format!("Edge target '{}' is not a known node, skipping", raw.target),
                    )
                    .with_subject(subject),
                );
                continue;
            };

            let endpoints_valid = match kind {
                EdgeKind::Lineage => {
                    source_kind == NodeKind::Column && target_kind == NodeKind::Column
                }
                EdgeKind::ExposureUse => {
                    source_kind == NodeKind::Column && target_kind == NodeKind::Exposure
                }
            };
            let entities_known = self.entity_lookup.contains_key(&source_entity)
                && self.entity_lookup.contains_key(&target_entity);

            if !endpoints_valid || !entities_known {
                self.skip(
                    Diagnostic::warn(
                        DiagnosticCode::EdgeInvalidEndpoint,
                        format!("Edge {} does not connect valid {} endpoints, skipping", subject, kind),
                    )
                    .with_subject(subject),
                );
                continue;
            }

            self.edges.push(Edge::new(raw.source.clone(), raw.target.clone(), kind));
        }
    }

    fn resolve_focus(&mut self, main_node: Option<&str>) {
        self.focus_entity = self
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Model && e.is_main_focus)
            .map(|e| e.name.clone());

        let Some(main_node) = main_node else {
            return;
        };

        let resolved = self
            .nodes
            .get(main_node)
            .filter(|n| n.kind == NodeKind::Column)
            .map(|n| (n.id.clone(), n.entity_name.clone()));

        match resolved {
            Some((column_id, entity_name)) => {
                self.focus_column = Some(column_id);
                if self.focus_entity.is_none() {
                    self.focus_entity = Some(entity_name);
                }
            }
            None => {
                let diagnostic = Diagnostic::new(
                    DiagnosticCode::MainNodeUnknown,
                    Severity::Info,
                    format!("Main node '{}' is not a known column", main_node),
                )
                .with_subject(main_node);
                self.skip(diagnostic);
            }
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Number of indexed nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validated edges in input order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All entities, models first
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entity_lookup.get(name).map(|&slot| &self.entities[slot])
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        let slot = *self.entity_lookup.get(name)?;
        self.entities.get_mut(slot)
    }

    /// Name of the entity owning a node
    pub fn entity_of(&self, node_id: &str) -> Option<&str> {
        self.nodes.get(node_id).map(|n| n.entity_name.as_str())
    }

    /// Focal entity, if any column is flagged as main (or `main_node` resolved)
    pub fn focus_entity(&self) -> Option<&str> {
        self.focus_entity.as_deref()
    }

    /// Column named by `main_node`
    pub fn focus_column(&self) -> Option<&str> {
        self.focus_column.as_deref()
    }

    /// Records skipped while building
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawEdge;
    use pretty_assertions::assert_eq;

    fn sample_input() -> GraphInput {
        GraphInput {
            nodes: vec![
                RawNode::column("orders.id", "orders"),
                RawNode::column("raw_orders.id", "raw_orders").with_resource_type("source"),
                RawNode::column("orders.amount", "orders").with_resource_type("model"),
                RawNode::column("raw_orders.amount", "raw_orders"),
                RawNode::exposure("exposure.revenue", "revenue_dashboard"),
            ],
            edges: vec![
                RawEdge::lineage("raw_orders.id", "orders.id"),
                RawEdge::lineage("raw_orders.amount", "orders.amount"),
                RawEdge::exposure("orders.amount", "exposure.revenue"),
            ],
            main_node: None,
        }
    }

    #[test]
    fn groups_columns_by_entity_in_first_seen_order() {
        let index = GraphIndex::build(&sample_input());

        let names: Vec<&str> = index.entities().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "raw_orders", "revenue_dashboard"]);

        let orders = index.entity("orders").unwrap();
        let columns: Vec<&str> = orders.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(columns, vec!["id", "amount"]);
    }

    #[test]
    fn resource_type_from_first_annotated_column() {
        let index = GraphIndex::build(&sample_input());

        // Only the second orders column declares a type
        assert_eq!(index.entity("orders").unwrap().resource_type, "model");
        assert_eq!(index.entity("raw_orders").unwrap().resource_type, "source");
    }

    #[test]
    fn resource_type_defaults_to_model() {
        let input = GraphInput {
            nodes: vec![RawNode::column("a.x", "a")],
            ..Default::default()
        };
        let index = GraphIndex::build(&input);
        assert_eq!(index.entity("a").unwrap().resource_type, DEFAULT_RESOURCE_TYPE);
    }

    #[test]
    fn exposures_have_no_columns() {
        let index = GraphIndex::build(&sample_input());
        let exposure = index.entity("revenue_dashboard").unwrap();
        assert_eq!(exposure.kind, EntityKind::Exposure);
        assert!(exposure.columns.is_empty());
        assert_eq!(index.entity_of("exposure.revenue"), Some("revenue_dashboard"));
    }

    #[test]
    fn node_without_model_is_skipped() {
        let mut input = sample_input();
        let mut orphan = RawNode::column("orphan.id", "orphan");
        orphan.model = None;
        input.nodes.push(orphan);
        input.edges.push(RawEdge::lineage("orphan.id", "orders.id"));

        let index = GraphIndex::build(&input);

        assert!(index.node("orphan.id").is_none());
        assert_eq!(index.entities().len(), 3);
        assert_eq!(index.edges().len(), 3);

        let codes: Vec<DiagnosticCode> = index.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![DiagnosticCode::NodeMissingEntity, DiagnosticCode::EdgeUnknownSource]
        );
    }

    #[test]
    fn duplicate_and_unknown_nodes_are_skipped() {
        let mut input = sample_input();
        input.nodes.push(RawNode::column("orders.id", "other"));
        let mut test_node = RawNode::column("test.not_null", "orders");
        test_node.kind = RawNodeKind::Unknown;
        input.nodes.push(test_node);

        let index = GraphIndex::build(&input);

        assert_eq!(index.entity_of("orders.id"), Some("orders"));
        assert!(index.entity("other").is_none());
        assert!(index.node("test.not_null").is_none());
        assert_eq!(index.diagnostics().len(), 2);
    }

    #[test]
    fn edges_with_mismatched_endpoints_are_skipped() {
        let mut input = sample_input();
        // Exposure edge pointing at a column, lineage edge into an exposure
        input.edges.push(RawEdge::exposure("orders.id", "raw_orders.id"));
        input.edges.push(RawEdge::lineage("orders.id", "exposure.revenue"));
        input.edges.push(RawEdge::lineage("orders.id", "missing.id"));

        let index = GraphIndex::build(&input);

        assert_eq!(index.edges().len(), 3);
        let codes: Vec<DiagnosticCode> = index.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::EdgeInvalidEndpoint,
                DiagnosticCode::EdgeInvalidEndpoint,
                DiagnosticCode::EdgeUnknownTarget,
            ]
        );
    }

    #[test]
    fn exposure_named_like_a_model_is_dropped() {
        let mut input = sample_input();
        input.nodes.push(RawNode::exposure("exposure.orders", "orders"));

        let index = GraphIndex::build(&input);

        assert_eq!(index.entity("orders").unwrap().kind, EntityKind::Model);
        assert_eq!(index.entities().len(), 3);
        assert!(index.node("exposure.orders").is_none());
        assert_eq!(index.diagnostics()[0].code, DiagnosticCode::EntityKindConflict);
    }

    #[test]
    fn focus_from_main_flag() {
        let mut input = sample_input();
        input.nodes[1] = input.nodes[1].clone().with_main();

        let index = GraphIndex::build(&input);
        assert_eq!(index.focus_entity(), Some("raw_orders"));
        assert!(index.entity("raw_orders").unwrap().is_main_focus);
        assert_eq!(index.focus_column(), None);
    }

    #[test]
    fn focus_from_main_node() {
        let input = sample_input().with_main_node("orders.amount");

        let index = GraphIndex::build(&input);
        assert_eq!(index.focus_entity(), Some("orders"));
        assert_eq!(index.focus_column(), Some("orders.amount"));
    }

    #[test]
    fn unknown_main_node_is_reported() {
        let input = sample_input().with_main_node("nope.id");

        let index = GraphIndex::build(&input);
        assert_eq!(index.focus_entity(), None);
        assert_eq!(index.diagnostics()[0].code, DiagnosticCode::MainNodeUnknown);
        assert_eq!(index.diagnostics()[0].severity, Severity::Info);
    }
}
