//! End-to-end view scenarios: load, level, lay out, expand and collapse

use lineagelens_core::{DiagnosticCode, LayoutConfig};
use lineagelens_graph::{GraphInput, RawEdge, RawNode};
use lineagelens_view::{load_graph, TransitionOutcome, TransitionStart, ViewState};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

/// One column per model, one lineage edge per pair
fn models(pairs: &[(&str, &str)], focus: Option<&str>) -> GraphInput {
    let mut names: Vec<&str> = Vec::new();
    for (source, target) in pairs {
        for name in [*source, *target] {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let nodes = names
        .iter()
        .map(|name| {
            let node = RawNode::column(format!("{name}.col1"), *name);
            if Some(*name) == focus {
                node.with_main()
            } else {
                node
            }
        })
        .collect();

    let edges = pairs
        .iter()
        .map(|(s, t)| RawEdge::lineage(format!("{s}.col1"), format!("{t}.col1")))
        .collect();

    GraphInput {
        nodes,
        edges,
        main_node: None,
    }
}

fn layer(state: &ViewState, name: &str) -> usize {
    state.entity(name).unwrap().layer
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn visible(state: &ViewState) -> Vec<String> {
    state.visible_names().into_iter().map(str::to_string).collect()
}

#[test]
fn test_linear_chain() {
    let state = load_graph(&models(&[("A", "B"), ("B", "C")], None), LayoutConfig::default());

    assert_eq!(layer(&state, "A"), 0);
    assert_eq!(layer(&state, "B"), 1);
    assert_eq!(layer(&state, "C"), 2);
    assert_eq!(state.get_upstream("C.col1"), set(&["A.col1", "B.col1", "C.col1"]));

    // No focus: everything visible, laid out left to right
    let snapshot = state.snapshot();
    let xs: Vec<f64> = ["A", "B", "C"].iter().map(|n| snapshot.entity(n).unwrap().x).collect();
    assert_eq!(xs, vec![15.0, 415.0, 815.0]);
    assert_eq!(snapshot.edges.len(), 2);
}

#[test]
fn test_diamond() {
    let state = load_graph(
        &models(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")], None),
        LayoutConfig::default(),
    );

    assert_eq!(layer(&state, "B"), 1);
    assert_eq!(layer(&state, "C"), 1);
    assert_eq!(layer(&state, "D"), 2);

    let b = state.entity("B").unwrap();
    let c = state.entity("C").unwrap();
    assert_eq!(b.position.unwrap().x, c.position.unwrap().x);
    assert!(b.bottom().unwrap() <= c.top().unwrap() || c.bottom().unwrap() <= b.top().unwrap());
}

#[test]
fn test_diamond_expand_fans_out_without_overlap() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")], Some("A")),
        LayoutConfig::default(),
    );
    state.collapse_downstream("A");
    assert_eq!(visible(&state), vec!["A"]);

    assert!(state.expand_downstream("A").is_applied());
    let b = state.entity("B").unwrap();
    let c = state.entity("C").unwrap();
    assert!(b.bottom().unwrap() <= c.top().unwrap() || c.bottom().unwrap() <= b.top().unwrap());
}

#[test]
fn test_self_reference() {
    let state = load_graph(&models(&[("A", "A")], None), LayoutConfig::default());

    assert_eq!(layer(&state, "A"), 0);
    assert_eq!(state.get_upstream("A.col1"), set(&["A.col1"]));
    assert_eq!(state.get_downstream("A.col1"), set(&["A.col1"]));
}

#[test]
fn test_cycle_terminates() {
    let state = load_graph(&models(&[("A", "B"), ("B", "A")], None), LayoutConfig::default());

    assert_eq!(state.leveling().len(), 2);
    assert_eq!(state.get_upstream("A.col1"), set(&["A.col1", "B.col1"]));
}

#[test]
fn test_collapse_after_deep_expand() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("B", "C")], Some("A")),
        LayoutConfig::default(),
    );
    // Focus on A shows A and B
    assert_eq!(visible(&state), vec!["A", "B"]);

    state.expand_downstream("A");
    state.expand_downstream("B");
    assert_eq!(visible(&state), vec!["A", "B", "C"]);

    state.collapse_downstream("A");
    assert_eq!(visible(&state), vec!["A"]);
    assert!(state.visible_edges().is_empty());
    assert!(state.snapshot().edges.is_empty());
}

#[test]
fn test_expand_collapse_round_trip() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("B", "C"), ("C", "D")], Some("B")),
        LayoutConfig::default(),
    );
    let before = visible(&state);

    assert_eq!(
        state.expand_downstream("C"),
        TransitionOutcome::Applied {
            shown: vec!["D".to_string()],
            hidden: vec![],
        }
    );
    state.collapse_downstream("C");

    assert_eq!(visible(&state), before);
}

#[test]
fn test_reexpand_restores_position() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("B", "C"), ("C", "D")], Some("B")),
        LayoutConfig::default(),
    );

    state.expand_downstream("C");
    let placed = state.entity("D").unwrap().position;
    state.collapse_downstream("C");
    state.expand_downstream("C");

    assert_eq!(state.entity("D").unwrap().position, placed);
}

#[test]
fn test_relayout_is_idempotent() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D"), ("D", "E")], None),
        LayoutConfig::default(),
    );

    state.relayout();
    let first = state.snapshot();
    state.relayout();
    let second = state.snapshot();

    assert_eq!(first, second);
}

#[test]
fn test_reentrant_transition_is_rejected() {
    let mut state = load_graph(
        &models(&[("A", "B"), ("B", "C")], Some("A")),
        LayoutConfig::default(),
    );

    let TransitionStart::Pending(pending) = state.begin_expand_downstream("B") else {
        panic!("expected a pending transition");
    };
    assert_eq!(state.collapse_downstream("B"), TransitionOutcome::Rejected);
    assert!(state.is_entity_visible("C"));

    state.finish(pending);
    assert!(state.collapse_downstream("B").is_applied());
    assert!(!state.is_entity_visible("C"));
}

#[test]
fn test_non_finite_config_hides_entities() {
    let config = LayoutConfig::from_toml("[box]\ncolumn_height = nan\n").unwrap();
    let mut input = models(&[("A", "B")], None);
    input.nodes.push(RawNode::exposure("exp.dash", "dash"));

    let state = load_graph(&input, config);

    // Exposures without detail rows do not depend on column height
    assert_eq!(visible(&state), vec!["dash"]);
    let hidden: Vec<_> = state
        .diagnostics()
        .into_iter()
        .filter(|d| d.code == DiagnosticCode::InvalidGeometry)
        .filter_map(|d| d.subject)
        .collect();
    assert_eq!(hidden, vec!["A", "B"]);

    for entity in state.snapshot().entities {
        assert!(entity.x.is_finite() && entity.y.is_finite());
    }
}

#[test]
fn test_exposures_follow_visible_models() {
    let mut input = models(&[("stg", "fct")], Some("stg"));
    input.nodes.push(RawNode::exposure("exp.dash", "dash"));
    input.edges.push(RawEdge::exposure("fct.col1", "exp.dash"));

    let state = load_graph(&input, LayoutConfig::default());

    assert_eq!(visible(&state), vec!["stg", "fct", "dash"]);
    let snapshot = state.snapshot();
    assert_eq!(snapshot.edges.len(), 2);
    assert!(snapshot.edges[1].path.starts_with('M'));
    assert!(snapshot.entity("dash").unwrap().x > snapshot.entity("fct").unwrap().x);
}

#[test]
fn test_impact_summary() {
    let mut input = models(&[("A", "B"), ("B", "C")], None);
    input.nodes.push(RawNode::exposure("exp.dash", "dash"));
    input.edges.push(RawEdge::exposure("C.col1", "exp.dash"));

    let state = load_graph(&input, LayoutConfig::default());
    let impact = state.impact_summary("A.col1").unwrap();

    assert_eq!(impact.downstream_columns, 2);
    assert_eq!(impact.affected_models, set(&["B", "C"]));
    assert_eq!(impact.affected_exposures, set(&["dash"]));
}

#[test]
fn test_fixture_graph() {
    let graph_path = std::path::Path::new("../../fixtures/jaffle-shop/graph.json");

    if graph_path.exists() {
        let input = GraphInput::from_file(graph_path).unwrap();
        let mut state = load_graph(&input, LayoutConfig::default());

        assert!(state.index().focus_entity().is_some());
        assert!(state.diagnostics().is_empty());

        state.show_all();
        let report = state.report();
        assert_eq!(report.summary.visible_entities, report.summary.total_entities);
    }
}
