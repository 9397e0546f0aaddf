//! Root selection.
//!
//! The root is the person the tree and mindmap start from. An explicit
//! choice wins when it exists; otherwise the eldest person with no
//! recorded parent is used.

use crate::graph::FamilyGraph;
use kindred_core::{Person, PersonId};
use tracing::debug;

/// Picks the display root.
///
/// 1. `requested`, if that person exists.
/// 2. The first person in snapshot order that is never the child side
///    of a child relationship.
/// 3. The first person in snapshot order.
///
/// Returns `None` only for an empty graph.
pub fn select_root(requested: Option<&PersonId>, graph: &FamilyGraph) -> Option<PersonId> {
    if let Some(id) = requested {
        if graph.contains(id) {
            return Some(id.clone());
        }
        debug!("Requested root {} not found, falling back", id);
    }

    natural_roots(graph)
        .into_iter()
        .next()
        .or_else(|| graph.persons().next())
        .map(|person| person.id.clone())
}

/// Every person without a recorded parent, in snapshot order.
pub fn natural_roots(graph: &FamilyGraph) -> Vec<&Person> {
    graph
        .persons()
        .filter(|person| !graph.has_parents(&person.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{FamilyDataset, Gender, Relationship};

    fn person(id: &str, year: Option<i32>) -> Person {
        Person::new(id, id, Gender::Male).with_birth(year, None, None)
    }

    #[test]
    fn test_eldest_parentless_person_is_root() {
        // P1(1920) -> P2(1950), P3(1960) unrelated
        let dataset = FamilyDataset::new(
            vec![
                person("P2", Some(1950)),
                person("P3", Some(1960)),
                person("P1", Some(1920)),
            ],
            vec![Relationship::child("P1", "P2")],
            vec![],
        );
        let graph = FamilyGraph::from_dataset(&dataset);

        assert_eq!(select_root(None, &graph), Some("P1".into()));
    }

    #[test]
    fn test_explicit_root_wins() {
        let dataset = FamilyDataset::new(
            vec![person("P1", Some(1920)), person("P2", Some(1950))],
            vec![Relationship::child("P1", "P2")],
            vec![],
        );
        let graph = FamilyGraph::from_dataset(&dataset);

        assert_eq!(select_root(Some(&"P2".into()), &graph), Some("P2".into()));
        assert_eq!(select_root(Some(&"missing".into()), &graph), Some("P1".into()));
    }

    #[test]
    fn test_everyone_has_a_parent() {
        // A two-person loop leaves no parentless person.
        let dataset = FamilyDataset::new(
            vec![person("A", Some(1900)), person("B", Some(1901))],
            vec![Relationship::child("A", "B"), Relationship::child("B", "A")],
            vec![],
        );
        let graph = FamilyGraph::from_dataset(&dataset);

        assert!(natural_roots(&graph).is_empty());
        assert_eq!(select_root(None, &graph), Some("A".into()));
    }

    #[test]
    fn test_empty_graph_has_no_root() {
        let graph = FamilyGraph::new();
        assert_eq!(select_root(None, &graph), None);
    }

    #[test]
    fn test_unknown_birth_years_sort_last() {
        let dataset = FamilyDataset::new(
            vec![person("nobirth", None), person("late", Some(1999))],
            vec![],
            vec![],
        );
        let graph = FamilyGraph::from_dataset(&dataset);

        assert_eq!(select_root(None, &graph), Some("late".into()));
    }
}
