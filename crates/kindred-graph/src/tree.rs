//! Nested family tree construction.
//!
//! A tree node is a person with their spouses beside them and their
//! children below. Children are every child edge leaving the person, no
//! matter which spouse they came from.
//!
//! Construction walks the graph with an explicit stack and keeps the set
//! of persons on the current ancestor path. Meeting one of them again is
//! a cycle in the data and is reported instead of recursing forever. A
//! person reachable along two separate paths is not a cycle and is
//! placed under each parent.

use crate::error::{GraphError, Result};
use crate::graph::{FamilyGraph, NodeId};
use kindred_core::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// A spouse shown beside a tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpouseLink {
    pub person: Person,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub person: Person,
    pub spouses: Vec<SpouseLink>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Depth of the deepest leaf below this node, 0 for a leaf.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyTree {
    pub roots: Vec<TreeNode>,
}

impl FamilyTree {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn size(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }
}

enum Frame {
    Enter { node: NodeId, parent: Option<usize> },
    Exit,
}

struct Slot {
    node: NodeId,
    children: Vec<usize>,
}

/// Builds the nested tree under each root.
///
/// Roots that are not in the graph are skipped.
pub fn build_family_tree(graph: &FamilyGraph, roots: &[PersonId]) -> Result<FamilyTree> {
    let mut tree = FamilyTree::default();

    for root in roots {
        let Some(start) = graph.get_index(root) else {
            warn!("Tree root {} not found, skipping", root);
            continue;
        };
        tree.roots.push(build_subtree(graph, start)?);
    }

    Ok(tree)
}

fn build_subtree(graph: &FamilyGraph, start: NodeId) -> Result<TreeNode> {
    // Slots are created in preorder, so every child slot has a larger
    // index than its parent.
    let mut slots: Vec<Slot> = Vec::new();
    let mut path: Vec<NodeId> = Vec::new();
    let mut on_path: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![Frame::Enter {
        node: start,
        parent: None,
    }];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter { node, parent } => {
                if on_path.contains(&node) {
                    return Err(cycle_error(graph, &path, node));
                }

                let slot = slots.len();
                slots.push(Slot {
                    node,
                    children: Vec::new(),
                });
                if let Some(parent) = parent {
                    slots[parent].children.push(slot);
                }

                path.push(node);
                on_path.insert(node);
                stack.push(Frame::Exit);

                for child in graph.child_indexes(node).into_iter().rev() {
                    stack.push(Frame::Enter {
                        node: child,
                        parent: Some(slot),
                    });
                }
            }
            Frame::Exit => {
                if let Some(node) = path.pop() {
                    on_path.remove(&node);
                }
            }
        }
    }

    assemble(graph, slots, start)
}

fn assemble(graph: &FamilyGraph, slots: Vec<Slot>, start: NodeId) -> Result<TreeNode> {
    let mut built: Vec<Option<TreeNode>> = vec![None; slots.len()];

    for (index, slot) in slots.iter().enumerate().rev() {
        let person = person_at(graph, slot.node)?;
        let children = slot
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();

        let spouses = graph
            .spouses(&person.id)
            .into_iter()
            .map(|spouse| SpouseLink {
                person: spouse.person.clone(),
                note: spouse.note.map(str::to_string),
            })
            .collect();

        built[index] = Some(TreeNode {
            person: person.clone(),
            spouses,
            children,
        });
    }

    match built.into_iter().next().flatten() {
        Some(root) => Ok(root),
        None => Err(GraphError::PersonNotFound(person_at(graph, start)?.id.clone())),
    }
}

fn person_at(graph: &FamilyGraph, node: NodeId) -> Result<&Person> {
    graph
        .person(node)
        .ok_or_else(|| GraphError::PersonNotFound(PersonId::new(format!("#{}", node.index()))))
}

fn cycle_error(graph: &FamilyGraph, path: &[NodeId], repeated: NodeId) -> GraphError {
    let from = path.iter().position(|&n| n == repeated).unwrap_or(0);
    let path: Vec<PersonId> = path[from..]
        .iter()
        .chain(std::iter::once(&repeated))
        .filter_map(|&n| graph.person(n).map(|p| p.id.clone()))
        .collect();

    warn!("Cycle in family data: {:?}", path);
    GraphError::Cycle { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{FamilyDataset, Gender, Relationship};

    fn graph(ids: &[&str], relationships: Vec<Relationship>) -> FamilyGraph {
        let persons = ids
            .iter()
            .map(|id| Person::new(*id, id.to_uppercase(), Gender::Female))
            .collect();
        FamilyGraph::from_dataset(&FamilyDataset::new(persons, relationships, vec![]))
    }

    fn child_ids(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.person.id.as_str()).collect()
    }

    #[test]
    fn test_three_generations() {
        let g = graph(
            &["gp", "p", "s", "c1", "c2"],
            vec![
                Relationship::child("gp", "p"),
                Relationship::marriage("p", "s").with_note("1st"),
                Relationship::child("p", "c1"),
                Relationship::adopted("p", "c2"),
            ],
        );

        let tree = build_family_tree(&g, &["gp".into()]).unwrap();
        assert_eq!(tree.roots.len(), 1);

        let root = &tree.roots[0];
        assert_eq!(child_ids(root), vec!["p"]);

        let p = &root.children[0];
        assert_eq!(p.spouses.len(), 1);
        assert_eq!(p.spouses[0].person.id.as_str(), "s");
        assert_eq!(p.spouses[0].note.as_deref(), Some("1st"));
        assert_eq!(child_ids(p), vec!["c1", "c2"]);
        assert_eq!(tree.size(), 4);
        assert_eq!(root.height(), 2);
    }

    #[test]
    fn test_children_from_any_spouse() {
        let g = graph(
            &["h", "w1", "w2", "a", "b"],
            vec![
                Relationship::marriage("h", "w1"),
                Relationship::marriage("h", "w2"),
                Relationship::child("h", "a"),
                Relationship::child("w2", "b"),
                Relationship::child("h", "b"),
            ],
        );

        let tree = build_family_tree(&g, &["h".into()]).unwrap();
        let h = &tree.roots[0];
        assert_eq!(h.spouses.len(), 2);
        assert_eq!(child_ids(h), vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let g = graph(
            &["a", "b", "c"],
            vec![
                Relationship::child("a", "b"),
                Relationship::child("b", "c"),
                Relationship::child("c", "a"),
            ],
        );

        let err = build_family_tree(&g, &["a".into()]).unwrap_err();
        match err {
            GraphError::Cycle { path } => {
                let ids: Vec<&str> = path.iter().map(PersonId::as_str).collect();
                assert_eq!(ids, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let g = graph(&["a"], vec![Relationship::child("a", "a")]);
        assert!(matches!(
            build_family_tree(&g, &["a".into()]),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_shared_descendant_appears_under_each_parent() {
        // Cousins marry; their child hangs below both branches.
        let g = graph(
            &["root", "x", "y", "kid"],
            vec![
                Relationship::child("root", "x"),
                Relationship::child("root", "y"),
                Relationship::child("x", "kid"),
                Relationship::child("y", "kid"),
            ],
        );

        let tree = build_family_tree(&g, &["root".into()]).unwrap();
        let root = &tree.roots[0];
        assert_eq!(child_ids(&root.children[0]), vec!["kid"]);
        assert_eq!(child_ids(&root.children[1]), vec!["kid"]);
    }

    #[test]
    fn test_unknown_and_empty_roots() {
        let g = graph(&["a"], vec![]);
        assert!(build_family_tree(&g, &[]).unwrap().is_empty());
        assert!(build_family_tree(&g, &["ghost".into()]).unwrap().is_empty());
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..1000).map(|i| format!("p{}", i)).collect();
        let persons = ids
            .iter()
            .map(|id| Person::new(id.as_str(), id.as_str(), Gender::Male))
            .collect();
        let relationships = ids
            .windows(2)
            .map(|pair| Relationship::child(pair[0].as_str(), pair[1].as_str()))
            .collect();
        let g = FamilyGraph::from_dataset(&FamilyDataset::new(persons, relationships, vec![]));

        let tree = build_family_tree(&g, &["p0".into()]).unwrap();
        assert_eq!(tree.size(), 1000);
        assert_eq!(tree.roots[0].height(), 999);
    }
}
