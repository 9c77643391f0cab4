//! Visible set and expand/collapse transitions
//!
//! A transition runs in two phases: the visibility change (with placement of
//! revealed entities), then recomputation of the paths that depend on it.
//! Between the phases the `(entity, direction)` key is held in a
//! [`TransitionGuard`] and any further request for that key is rejected.

use std::collections::HashSet;

use lineagelens_core::{Edge, EdgeKind};
use lineagelens_graph::GraphIndex;

/// Which side of an entity a transition acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Downstream,
    Upstream,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Downstream => write!(f, "downstream"),
            Self::Upstream => write!(f, "upstream"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Reveal direct neighbors
    Expand,

    /// Hide everything transitively reachable
    Collapse,
}

/// A requested expand or collapse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub entity: String,
    pub direction: Direction,
    pub action: Action,
}

impl TransitionRequest {
    pub fn new(entity: impl Into<String>, direction: Direction, action: Action) -> Self {
        Self {
            entity: entity.into(),
            direction,
            action,
        }
    }

    pub fn expand_downstream(entity: impl Into<String>) -> Self {
        Self::new(entity, Direction::Downstream, Action::Expand)
    }

    pub fn expand_upstream(entity: impl Into<String>) -> Self {
        Self::new(entity, Direction::Upstream, Action::Expand)
    }

    pub fn collapse_downstream(entity: impl Into<String>) -> Self {
        Self::new(entity, Direction::Downstream, Action::Collapse)
    }

    pub fn collapse_upstream(entity: impl Into<String>) -> Self {
        Self::new(entity, Direction::Upstream, Action::Collapse)
    }

    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            entity: self.entity.clone(),
            direction: self.direction,
        }
    }
}

/// Guard key; expand and collapse in one direction share it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub entity: String,
    pub direction: Direction,
}

/// Keys of transitions whose second phase has not run yet
#[derive(Debug, Clone, Default)]
pub struct TransitionGuard {
    in_flight: HashSet<TransitionKey>,
}

impl TransitionGuard {
    /// Take the key; false if it is already held
    pub fn acquire(&mut self, key: TransitionKey) -> bool {
        self.in_flight.insert(key)
    }

    pub fn release(&mut self, key: &TransitionKey) -> bool {
        self.in_flight.remove(key)
    }

    pub fn is_held(&self, key: &TransitionKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// A transition whose visibility change has been applied but whose paths
/// have not been recomputed yet. Hand it back to `ViewState::finish`, or to
/// `ViewState::abandon` to drop it. Dropping the token any other way leaves
/// its `(entity, direction)` key held, and every later transition on that
/// key is rejected.
#[derive(Debug)]
#[must_use = "a pending transition holds its guard until finished"]
pub struct PendingTransition {
    pub(crate) key: TransitionKey,
    pub(crate) action: Action,
    pub(crate) shown: Vec<String>,
    pub(crate) hidden: Vec<String>,
}

impl PendingTransition {
    pub fn key(&self) -> &TransitionKey {
        &self.key
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

/// Result of starting a transition
#[derive(Debug)]
pub enum TransitionStart {
    /// Phase one applied; call `finish` to complete it
    Pending(PendingTransition),

    /// Unknown entity or nothing to reveal/hide
    NoOp,

    /// The same entity and direction is already mid-transition
    Rejected,
}

/// Result of a complete transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied {
        /// Entities that became visible
        shown: Vec<String>,

        /// Entities that became hidden (including ones hidden for invalid geometry)
        hidden: Vec<String>,
    },
    NoOp,
    Rejected,
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Names of the currently visible entities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    visible: HashSet<String>,
}

impl Visibility {
    /// Initial visible set: the focus entity with its direct neighbors and
    /// the exposures of every visible model; everything when there is no focus
    pub fn initial(index: &GraphIndex, neighbors: impl Fn(&str) -> Vec<String>) -> Self {
        let mut visibility = Self::default();

        let Some(focus) = index.focus_entity() else {
            for entity in index.entities() {
                visibility.show(&entity.name);
            }
            return visibility;
        };

        visibility.show(focus);
        for name in neighbors(focus) {
            visibility.show(&name);
        }

        // Exposures fed by any visible model
        let mut exposures = Vec::new();
        for edge in index.edges().iter().filter(|e| e.kind == EdgeKind::ExposureUse) {
            if let (Some(source), Some(target)) =
                (index.entity_of(&edge.source_id), index.entity_of(&edge.target_id))
            {
                if visibility.contains(source) {
                    exposures.push(target.to_string());
                }
            }
        }
        for name in exposures {
            visibility.show(&name);
        }

        visibility
    }

    /// Returns true if the entity was not visible before
    pub fn show(&mut self, name: &str) -> bool {
        self.visible.insert(name.to_string())
    }

    /// Returns true if the entity was visible before
    pub fn hide(&mut self, name: &str) -> bool {
        self.visible.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// An edge is shown iff the entities owning both endpoints are visible
    pub fn edge_visible(&self, index: &GraphIndex, edge: &Edge) -> bool {
        match (index.entity_of(&edge.source_id), index.entity_of(&edge.target_id)) {
            (Some(source), Some(target)) => self.contains(source) && self.contains(target),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagelens_graph::{GraphInput, RawEdge, RawNode};

    fn index() -> GraphIndex {
        let input = GraphInput {
            nodes: vec![
                RawNode::column("a.x", "a"),
                RawNode::column("b.x", "b").with_main(),
                RawNode::column("c.x", "c"),
                RawNode::column("d.x", "d"),
                RawNode::exposure("exp.dash", "dash"),
            ],
            edges: vec![
                RawEdge::lineage("a.x", "b.x"),
                RawEdge::lineage("b.x", "c.x"),
                RawEdge::lineage("c.x", "d.x"),
                RawEdge::exposure("a.x", "exp.dash"),
            ],
            main_node: None,
        };
        GraphIndex::build(&input)
    }

    #[test]
    fn guard_rejects_reentry_for_same_key_only() {
        let mut guard = TransitionGuard::default();
        let key = TransitionRequest::expand_downstream("a").key();

        assert!(guard.acquire(key.clone()));
        assert!(!guard.acquire(TransitionRequest::collapse_downstream("a").key()));
        assert!(guard.acquire(TransitionRequest::expand_upstream("a").key()));
        assert!(guard.acquire(TransitionRequest::expand_downstream("b").key()));

        assert!(guard.release(&key));
        assert!(!guard.is_held(&key));
        assert!(guard.acquire(key));
    }

    #[test]
    fn initial_focus_shows_neighbors_and_their_exposures() {
        let index = index();
        let visibility = Visibility::initial(&index, |name| match name {
            "b" => vec!["a".to_string(), "c".to_string()],
            _ => Vec::new(),
        });

        assert!(visibility.contains("a"));
        assert!(visibility.contains("b"));
        assert!(visibility.contains("c"));
        assert!(!visibility.contains("d"));
        // dash hangs off a, which is visible
        assert!(visibility.contains("dash"));
        assert_eq!(visibility.len(), 4);
    }

    #[test]
    fn initial_without_focus_shows_everything() {
        let input = GraphInput {
            nodes: vec![RawNode::column("a.x", "a"), RawNode::column("b.x", "b")],
            edges: vec![],
            main_node: None,
        };
        let index = GraphIndex::build(&input);
        let visibility = Visibility::initial(&index, |_| Vec::new());

        assert_eq!(visibility.len(), 2);
    }

    #[test]
    fn edge_needs_both_endpoints_visible() {
        let index = index();
        let mut visibility = Visibility::default();
        visibility.show("a");

        let edge = &index.edges()[0];
        assert!(!visibility.edge_visible(&index, edge));

        visibility.show("b");
        assert!(visibility.edge_visible(&index, edge));

        visibility.hide("a");
        assert!(!visibility.edge_visible(&index, edge));
    }
}
