//! Graph builder for constructing the family graph from a dataset.
//!
//! The builder takes persons first and relationships second, so a
//! relationship can refer to a person listed after it.

use crate::graph::FamilyGraph;
use kindred_core::{FamilyDataset, Person, Relationship};
use tracing::debug;

/// Builds a FamilyGraph in two passes:
/// 1. Add all persons as nodes
/// 2. Resolve relationships into edges where both ends exist
pub struct FamilyGraphBuilder {
    graph: FamilyGraph,
    pending: Vec<Relationship>,
}

impl Default for FamilyGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyGraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: FamilyGraph::new(),
            pending: Vec::new(),
        }
    }

    /// Adds persons. Order is kept as given.
    pub fn add_persons<I>(&mut self, persons: I)
    where
        I: IntoIterator<Item = Person>,
    {
        for person in persons {
            self.graph.add_person(person);
        }
    }

    /// Queues relationships for the second pass.
    pub fn add_relationships<I>(&mut self, relationships: I)
    where
        I: IntoIterator<Item = Relationship>,
    {
        self.pending.extend(relationships);
    }

    /// Resolves queued relationships into edges.
    pub fn resolve_edges(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let total = pending.len();
        let resolved = pending
            .iter()
            .filter(|rel| self.graph.add_relationship(rel))
            .count();

        debug!(
            "Resolved {} of {} relationships ({} dangling)",
            resolved,
            total,
            total - resolved
        );
    }

    /// Finishes building and returns the graph.
    pub fn build(mut self) -> FamilyGraph {
        self.resolve_edges();
        self.graph
    }
}

impl FamilyGraph {
    /// Builds the graph for a dataset snapshot.
    ///
    /// Persons keep the dataset's order (birth year ascending, unknown
    /// last), which is the order root selection walks.
    pub fn from_dataset(dataset: &FamilyDataset) -> Self {
        let mut builder = FamilyGraphBuilder::new();
        builder.add_persons(dataset.persons.iter().cloned());
        builder.add_relationships(dataset.relationships.iter().cloned());
        builder.build()
    }
}
