//! Edge types for the family graph.
//!
//! Every relationship record becomes one directed petgraph edge from
//! `person_a` to `person_b`. Marriage edges are stored directed too, but
//! the graph indexes them from both ends.

use kindred_core::{PersonId, RelationshipKind};
use serde::{Deserialize, Serialize};

/// An edge in the family graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The kind of relationship.
    pub kind: RelationshipKind,

    /// Free-text note, e.g. the order of a remarriage.
    pub note: Option<String>,
}

impl Edge {
    pub fn new(kind: RelationshipKind) -> Self {
        Self { kind, note: None }
    }

    pub fn with_note(kind: RelationshipKind, note: Option<String>) -> Self {
        Self { kind, note }
    }
}

/// A flattened edge for export to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: PersonId,
    pub target: PersonId,
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
