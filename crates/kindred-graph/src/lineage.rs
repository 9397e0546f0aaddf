//! Lineage traversal along child edges.
//!
//! Breadth-first walks up (ancestors) or down (descendants) from a
//! person, each result tagged with its generation distance. The same
//! walk guards new child relationships against making someone their own
//! ancestor.

use crate::error::{GraphError, Result};
use crate::graph::{FamilyGraph, NodeId};
use kindred_core::{Person, PersonId, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageDirection {
    /// Parents, grandparents, and so on.
    Up,
    /// Children, grandchildren, and so on.
    Down,
}

/// A person reached by a lineage walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relative {
    pub person: Person,
    /// 1 for a parent or child, 2 for a grandparent or grandchild.
    pub generation: usize,
}

impl FamilyGraph {
    /// Ancestors of a person, nearest generation first.
    ///
    /// `max_depth` of 0 means unlimited.
    pub fn ancestors(&self, id: &PersonId, max_depth: usize) -> Result<Vec<Relative>> {
        self.lineage(id, LineageDirection::Up, max_depth)
    }

    /// Descendants of a person, nearest generation first.
    pub fn descendants(&self, id: &PersonId, max_depth: usize) -> Result<Vec<Relative>> {
        self.lineage(id, LineageDirection::Down, max_depth)
    }

    pub fn lineage(
        &self,
        id: &PersonId,
        direction: LineageDirection,
        max_depth: usize,
    ) -> Result<Vec<Relative>> {
        let start = self
            .get_index(id)
            .ok_or_else(|| GraphError::PersonNotFound(id.clone()))?;
        let max_depth = if max_depth == 0 { usize::MAX } else { max_depth };

        let mut result = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(start, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for next in self.step(current, direction) {
                if !visited.insert(next) {
                    continue;
                }
                if let Some(person) = self.person(next) {
                    result.push(Relative {
                        person: person.clone(),
                        generation: depth + 1,
                    });
                }
                queue.push_back((next, depth + 1));
            }
        }

        Ok(result)
    }

    /// Whether `ancestor` is reachable upward from `id`.
    pub fn is_ancestor(&self, ancestor: &PersonId, id: &PersonId) -> bool {
        self.path_between(id, ancestor, LineageDirection::Up).is_some()
    }

    /// Checks that adding `relationship` keeps the child edges acyclic.
    ///
    /// Marriages never form a lineage cycle. A child edge parent -> child
    /// is rejected when the parent is already a descendant of the child.
    pub fn ensure_acyclic(&self, relationship: &Relationship) -> Result<()> {
        if !relationship.kind.is_child() {
            return Ok(());
        }

        let parent = &relationship.person_a;
        let child = &relationship.person_b;
        if parent == child {
            return Err(GraphError::Cycle {
                path: vec![parent.clone(), child.clone()],
            });
        }

        match self.path_between(child, parent, LineageDirection::Down) {
            Some(mut path) => {
                path.push(child.clone());
                Err(GraphError::Cycle { path })
            }
            None => Ok(()),
        }
    }

    /// Finds any cycle among child edges, returning its path.
    pub fn find_cycle(&self) -> Option<Vec<PersonId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<NodeId, Color> =
            self.node_indexes().map(|n| (n, Color::White)).collect();

        for start in self.node_indexes() {
            if color.get(&start) != Some(&Color::White) {
                continue;
            }

            // (node, index of the next child to visit)
            let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
            color.insert(start, Color::Gray);

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let children = self.child_indexes(node);
                if top.1 >= children.len() {
                    color.insert(node, Color::Black);
                    stack.pop();
                    continue;
                }
                let child = children[top.1];
                top.1 += 1;

                match color.get(&child).copied().unwrap_or(Color::White) {
                    Color::White => {
                        color.insert(child, Color::Gray);
                        stack.push((child, 0));
                    }
                    Color::Gray => {
                        let from = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                        let path = stack[from..]
                            .iter()
                            .map(|(n, _)| *n)
                            .chain(std::iter::once(child))
                            .filter_map(|n| self.person(n).map(|p| p.id.clone()))
                            .collect();
                        return Some(path);
                    }
                    Color::Black => {}
                }
            }
        }

        None
    }

    fn step(&self, node: NodeId, direction: LineageDirection) -> Vec<NodeId> {
        match direction {
            LineageDirection::Up => self.parent_indexes(node),
            LineageDirection::Down => self.child_indexes(node),
        }
    }

    /// Shortest path of ids from `from` to `to` following `direction`.
    fn path_between(
        &self,
        from: &PersonId,
        to: &PersonId,
        direction: LineageDirection,
    ) -> Option<Vec<PersonId>> {
        let start = self.get_index(from)?;
        let goal = self.get_index(to)?;

        let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut nodes = vec![goal];
                let mut cursor = goal;
                while let Some(&prev) = came_from.get(&cursor) {
                    nodes.push(prev);
                    cursor = prev;
                }
                nodes.reverse();
                return Some(
                    nodes
                        .into_iter()
                        .filter_map(|n| self.person(n).map(|p| p.id.clone()))
                        .collect(),
                );
            }
            for next in self.step(current, direction) {
                if visited.insert(next) {
                    came_from.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}
