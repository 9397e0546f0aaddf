//! Core graph data structure.
//!
//! The FamilyGraph wraps petgraph and adds adjacency indexes so that
//! "who are X's spouses" and "who are X's children" are answered without
//! scanning every relationship. Indexes record edges in relationship
//! order, which is the order children and spouses are displayed in.

use crate::edge::{Edge, GraphEdge};
use crate::search_index::SearchIndex;
use kindred_core::{Person, PersonId, Relationship, RelationshipKind};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// A spouse as seen from one side of a marriage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spouse<'a> {
    pub person: &'a Person,
    pub note: Option<&'a str>,
}

/// A parent as seen from the child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parent<'a> {
    pub person: &'a Person,
    pub kind: RelationshipKind,
}

/// An edge looked up through one of the adjacency indexes.
struct IndexedEdge<'a> {
    source: NodeId,
    target: NodeId,
    weight: &'a Edge,
}

impl<'a> IndexedEdge<'a> {
    fn source(&self) -> NodeId {
        self.source
    }

    fn target(&self) -> NodeId {
        self.target
    }

    fn weight(&self) -> &'a Edge {
        self.weight
    }
}

/// A person together with their resolved spouses and children.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyUnit<'a> {
    pub person: &'a Person,
    pub spouses: Vec<Spouse<'a>>,
    pub children: Vec<&'a Person>,
}

/// The family relationship graph.
///
/// Persons are nodes in snapshot order; every relationship whose two ends
/// exist is an edge. Relationships pointing at unknown persons are counted
/// and otherwise ignored.
#[derive(Debug, Clone)]
pub struct FamilyGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<Person, Edge>,

    /// Maps person IDs to graph node indexes.
    id_index: HashMap<PersonId, NodeId>,

    /// Marriage edges touching a node, from either end.
    spouse_index: HashMap<NodeId, Vec<EdgeIndex>>,

    /// Child edges leaving a node (node is the parent).
    child_index: HashMap<NodeId, Vec<EdgeIndex>>,

    /// Child edges entering a node (node is the child).
    parent_index: HashMap<NodeId, Vec<EdgeIndex>>,

    /// Lowercased name index for the root selector and member search.
    names: SearchIndex,

    /// Relationships dropped because an endpoint was unknown.
    dangling: usize,
}

impl Default for FamilyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            spouse_index: HashMap::new(),
            child_index: HashMap::new(),
            parent_index: HashMap::new(),
            names: SearchIndex::new(),
            dangling: 0,
        }
    }

    /// Adds a person to the graph.
    ///
    /// A second person with an already known id is ignored; the first
    /// record wins.
    pub fn add_person(&mut self, person: Person) -> NodeId {
        if let Some(&existing) = self.id_index.get(&person.id) {
            warn!("Duplicate person id {}, keeping the first record", person.id);
            return existing;
        }

        let id = person.id.clone();
        let name = person.full_name.clone();
        let index = self.graph.add_node(person);

        self.id_index.insert(id, index);
        self.names.insert(&name, index);

        index
    }

    /// Adds a relationship as an edge.
    ///
    /// Returns `false` when either end is not a known person; such an edge
    /// is dropped without error.
    pub fn add_relationship(&mut self, relationship: &Relationship) -> bool {
        let (from, to) = match (
            self.get_index(&relationship.person_a),
            self.get_index(&relationship.person_b),
        ) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                debug!(
                    "Dropping dangling {} edge {} -> {}",
                    relationship.kind, relationship.person_a, relationship.person_b
                );
                self.dangling += 1;
                return false;
            }
        };

        let edge = Edge::with_note(relationship.kind, relationship.note.clone());
        let edge_index = self.graph.add_edge(from, to, edge);

        if relationship.kind.is_child() {
            self.child_index.entry(from).or_default().push(edge_index);
            self.parent_index.entry(to).or_default().push(edge_index);
        } else {
            self.spouse_index.entry(from).or_default().push(edge_index);
            if from != to {
                self.spouse_index.entry(to).or_default().push(edge_index);
            }
        }

        true
    }

    /// Gets a person by ID.
    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets a person by graph index.
    pub fn person(&self, index: NodeId) -> Option<&Person> {
        self.graph.node_weight(index)
    }

    /// Gets the node index for a person ID.
    pub fn get_index(&self, id: &PersonId) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.id_index.contains_key(id)
    }

    /// Iterates over persons in snapshot order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.graph.node_weights()
    }

    /// Iterates over node indexes in snapshot order.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Spouses of a person, in relationship order.
    pub fn spouses(&self, id: &PersonId) -> Vec<Spouse<'_>> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };

        self.edges_in(&self.spouse_index, index)
            .filter_map(|edge| {
                let other = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                Some(Spouse {
                    person: self.graph.node_weight(other)?,
                    note: edge.weight().note.as_deref(),
                })
            })
            .collect()
    }

    /// Children of a person, in relationship order.
    pub fn children(&self, id: &PersonId) -> Vec<&Person> {
        self.get_index(id)
            .map(|index| {
                self.child_indexes(index)
                    .into_iter()
                    .filter_map(|child| self.graph.node_weight(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parents of a person with the kind of each link.
    pub fn parents(&self, id: &PersonId) -> Vec<Parent<'_>> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };

        self.edges_in(&self.parent_index, index)
            .filter_map(|edge| {
                Some(Parent {
                    person: self.graph.node_weight(edge.source())?,
                    kind: edge.weight().kind,
                })
            })
            .collect()
    }

    /// Child node indexes of a node, in relationship order.
    pub fn child_indexes(&self, index: NodeId) -> Vec<NodeId> {
        self.edges_in(&self.child_index, index)
            .map(|edge| edge.target())
            .collect()
    }

    /// Parent node indexes of a node.
    pub fn parent_indexes(&self, index: NodeId) -> Vec<NodeId> {
        self.edges_in(&self.parent_index, index)
            .map(|edge| edge.source())
            .collect()
    }

    /// Whether any child edge names this person as the child.
    pub fn has_parents(&self, id: &PersonId) -> bool {
        self.get_index(id)
            .and_then(|index| self.parent_index.get(&index))
            .map(|edges| !edges.is_empty())
            .unwrap_or(false)
    }

    /// Resolves a person together with spouses and children.
    pub fn resolve(&self, id: &PersonId) -> Option<FamilyUnit<'_>> {
        let person = self.get(id)?;
        Some(FamilyUnit {
            person,
            spouses: self.spouses(id),
            children: self.children(id),
        })
    }

    /// Persons whose name contains the query, in snapshot order.
    pub fn search(&self, query: &str) -> Vec<&Person> {
        if query.trim().is_empty() {
            return self.persons().collect();
        }
        self.names
            .search(query.trim())
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index))
            .collect()
    }

    /// Returns the number of persons.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of resolved relationships.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns all edges with source and target IDs for export.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                Some(GraphEdge {
                    source: self.graph.node_weight(edge_ref.source())?.id.clone(),
                    target: self.graph.node_weight(edge_ref.target())?.id.clone(),
                    kind: edge_ref.weight().kind,
                    note: edge_ref.weight().note.clone(),
                })
            })
            .collect()
    }

    fn edges_in<'a>(
        &'a self,
        index_map: &'a HashMap<NodeId, Vec<EdgeIndex>>,
        node: NodeId,
    ) -> impl Iterator<Item = IndexedEdge<'a>> + 'a {
        index_map
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(move |&edge| {
                let (source, target) = self.graph.edge_endpoints(edge)?;
                Some(IndexedEdge {
                    source,
                    target,
                    weight: self.graph.edge_weight(edge)?,
                })
            })
    }
}

/// Graph statistics for the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub persons: usize,
    pub relationships: usize,
    pub marriages: usize,
    pub child_links: usize,
    pub dangling: usize,
}

impl FamilyGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let marriages = self
            .graph
            .edge_weights()
            .filter(|edge| edge.kind == RelationshipKind::Marriage)
            .count();

        GraphStats {
            persons: self.node_count(),
            relationships: self.edge_count(),
            marriages,
            child_links: self.edge_count() - marriages,
            dangling: self.dangling,
        }
    }
}
