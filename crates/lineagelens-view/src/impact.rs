//! Blast radius of a column change

use std::collections::BTreeSet;

use lineagelens_core::{EdgeKind, NodeKind};
use lineagelens_graph::{GraphIndex, LineageClosure};
use serde::Serialize;

/// What a change to one column reaches downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub column_id: String,

    /// Entity owning the column
    pub entity: String,

    /// Downstream columns, not counting the column itself
    pub downstream_columns: usize,

    /// Models reached downstream, other than the column's own
    pub affected_models: BTreeSet<String>,

    /// Exposures consuming any column in the downstream closure
    pub affected_exposures: BTreeSet<String>,
}

impl ImpactSummary {
    pub fn is_isolated(&self) -> bool {
        self.downstream_columns == 0 && self.affected_exposures.is_empty()
    }
}

/// Impact of changing `column_id`; `None` if it is not a known column
pub fn impact_summary(
    index: &GraphIndex,
    closure: &LineageClosure,
    column_id: &str,
) -> Option<ImpactSummary> {
    let node = index.node(column_id).filter(|n| n.kind == NodeKind::Column)?;

    let mut reached = BTreeSet::new();
    reached.insert(column_id.to_string());
    if let Some(downstream) = closure.downstream_of(column_id) {
        reached.extend(downstream.iter().cloned());
    }

    let affected_models = reached
        .iter()
        .filter_map(|id| index.entity_of(id))
        .filter(|entity| *entity != node.entity_name)
        .map(str::to_string)
        .collect();

    let affected_exposures = index
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::ExposureUse && reached.contains(&e.source_id))
        .filter_map(|e| index.entity_of(&e.target_id))
        .map(str::to_string)
        .collect();

    Some(ImpactSummary {
        column_id: column_id.to_string(),
        entity: node.entity_name.clone(),
        downstream_columns: reached.len() - 1,
        affected_models,
        affected_exposures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagelens_graph::{GraphInput, RawEdge, RawNode};
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn graph() -> (GraphIndex, LineageClosure) {
        let input = GraphInput {
            nodes: vec![
                RawNode::column("stg.id", "stg"),
                RawNode::column("stg.amount", "stg"),
                RawNode::column("stg.amount_usd", "stg"),
                RawNode::column("fct.total", "fct"),
                RawNode::column("rpt.total", "rpt"),
                RawNode::exposure("exp.finance", "finance"),
            ],
            edges: vec![
                RawEdge::lineage("stg.amount", "stg.amount_usd"),
                RawEdge::lineage("stg.amount_usd", "fct.total"),
                RawEdge::lineage("fct.total", "rpt.total"),
                RawEdge::exposure("rpt.total", "exp.finance"),
            ],
            main_node: None,
        };
        let index = GraphIndex::build(&input);
        let closure = LineageClosure::build(index.edges());
        (index, closure)
    }

    #[test]
    fn counts_everything_downstream() {
        let (index, closure) = graph();
        let impact = impact_summary(&index, &closure, "stg.amount").unwrap();

        assert_eq!(impact.entity, "stg");
        assert_eq!(impact.downstream_columns, 3);
        // Own model is not an affected model even though stg.amount_usd is downstream
        assert_eq!(impact.affected_models, set(&["fct", "rpt"]));
        assert_eq!(impact.affected_exposures, set(&["finance"]));
        assert!(!impact.is_isolated());
    }

    #[test]
    fn column_without_lineage_is_isolated() {
        let (index, closure) = graph();
        let impact = impact_summary(&index, &closure, "stg.id").unwrap();

        assert_eq!(impact.downstream_columns, 0);
        assert!(impact.affected_models.is_empty());
        assert!(impact.is_isolated());
    }

    #[test]
    fn exposure_directly_on_column() {
        let (index, closure) = graph();
        let impact = impact_summary(&index, &closure, "rpt.total").unwrap();

        assert_eq!(impact.downstream_columns, 0);
        assert_eq!(impact.affected_exposures, set(&["finance"]));
    }

    #[test]
    fn unknown_or_exposure_ids_have_no_summary() {
        let (index, closure) = graph();
        assert_eq!(impact_summary(&index, &closure, "nope.col"), None);
        assert_eq!(impact_summary(&index, &closure, "exp.finance"), None);
    }
}
