//! Collapsible indented mindmap.
//!
//! Expansion state lives beside the tree, keyed by the chain of person ids
//! leading to each node, so collapsing a branch only hides rows. The tree itself is never
//! changed and re-expanding gives back the same outline.

use crate::card::{card_label, spouse_label, SpouseCard};
use crate::NO_DATA;
use kindred_core::{PersonCard, PersonId};
use kindred_graph::{FamilyTree, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Levels shallower than this start expanded.
pub const DEFAULT_EXPAND_DEPTH: usize = 2;

/// A node named by the person ids from its root down to itself, written
/// as `root/child/grandchild`. Sibling order does not enter the path, so a
/// stored override keeps following the same person when siblings are
/// added or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(Vec<PersonId>);

impl NodePath {
    pub const SEPARATOR: char = '/';

    pub fn root(id: impl Into<PersonId>) -> Self {
        Self(vec![id.into()])
    }

    pub fn child(&self, id: impl Into<PersonId>) -> Self {
        let mut steps = self.0.clone();
        steps.push(id.into());
        Self(steps)
    }

    /// 0 for a root.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn steps(&self) -> &[PersonId] {
        &self.0
    }

    /// The person this path ends at.
    pub fn person(&self) -> Option<&PersonId> {
        self.0.last()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.iter().map(PersonId::as_str).collect();
        write!(f, "{}", parts.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let steps: Vec<PersonId> = s.split(Self::SEPARATOR).map(PersonId::from).collect();
        if steps.iter().any(|step| step.as_str().trim().is_empty()) {
            return Err(format!("invalid node path '{}'", s));
        }
        Ok(Self(steps))
    }
}

impl TryFrom<String> for NodePath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}

/// Per-view expansion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapState {
    pub default_depth: usize,
    #[serde(default)]
    overrides: HashMap<NodePath, bool>,
}

impl Default for MindmapState {
    fn default() -> Self {
        Self::new(DEFAULT_EXPAND_DEPTH)
    }
}

impl MindmapState {
    pub fn new(default_depth: usize) -> Self {
        Self {
            default_depth,
            overrides: HashMap::new(),
        }
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.overrides
            .get(path)
            .copied()
            .unwrap_or(path.depth() < self.default_depth)
    }

    pub fn expand(&mut self, path: NodePath) {
        self.overrides.insert(path, true);
    }

    pub fn collapse(&mut self, path: NodePath) {
        self.overrides.insert(path, false);
    }

    /// Flips a node and returns its new state.
    pub fn toggle(&mut self, path: NodePath) -> bool {
        let expanded = !self.is_expanded(&path);
        self.overrides.insert(path, expanded);
        expanded
    }

    /// Drops all overrides. Used when the root changes.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Expanded,
    Collapsed,
    /// No children; drawn as a dot.
    Leaf,
}

impl Toggle {
    pub fn marker(&self) -> &'static str {
        match self {
            Toggle::Expanded => "[-]",
            Toggle::Collapsed => "[+]",
            Toggle::Leaf => "\u{2022}",
        }
    }
}

/// Line joining a row to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    Root,
    /// The vertical line runs on to a later sibling.
    Middle,
    /// Last sibling; the vertical line stops at this row.
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineRow {
    pub path: NodePath,
    pub depth: usize,
    pub card: PersonCard,
    pub spouses: Vec<SpouseCard>,
    pub toggle: Toggle,
    pub connector: Connector,
    pub child_count: usize,
}

/// Visible rows of the mindmap, in display order.
pub fn outline(tree: &FamilyTree, state: &MindmapState) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TreeNode, NodePath, Connector)> = tree
        .roots
        .iter()
        .rev()
        .map(|node| (node, NodePath::root(node.person.id.clone()), Connector::Root))
        .collect();

    while let Some((node, path, connector)) = stack.pop() {
        let expanded = state.is_expanded(&path);
        let toggle = match (node.children.is_empty(), expanded) {
            (true, _) => Toggle::Leaf,
            (false, true) => Toggle::Expanded,
            (false, false) => Toggle::Collapsed,
        };

        if toggle == Toggle::Expanded {
            let count = node.children.len();
            for (i, child) in node.children.iter().enumerate().rev() {
                let connector = if i + 1 == count {
                    Connector::Last
                } else {
                    Connector::Middle
                };
                stack.push((child, path.child(child.person.id.clone()), connector));
            }
        }

        rows.push(OutlineRow {
            depth: path.depth(),
            path,
            card: PersonCard::from_person(&node.person),
            spouses: node.spouses.iter().map(SpouseCard::from).collect(),
            toggle,
            connector,
            child_count: node.children.len(),
        });
    }

    rows
}

/// Renders outline rows as indented text.
pub fn render_text(rows: &[OutlineRow]) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }

    // open[d]: the row last seen at depth d has a later sibling
    let mut open: Vec<bool> = Vec::new();
    let mut lines = Vec::with_capacity(rows.len());

    for row in rows {
        open.truncate(row.depth);
        let mut line: String = open
            .iter()
            .skip(1)
            .map(|&more| if more { "│   " } else { "    " })
            .collect();
        line.push_str(match row.connector {
            Connector::Root => "",
            Connector::Middle => "├── ",
            Connector::Last => "└── ",
        });
        line.push_str(&format!("{} {}", row.toggle.marker(), card_label(&row.card)));
        if !row.spouses.is_empty() {
            let spouses: Vec<String> = row.spouses.iter().map(spouse_label).collect();
            line.push_str(&format!(" | {}", spouses.join(", ")));
        }
        open.push(row.connector == Connector::Middle);
        lines.push(line);
    }

    lines.join("\n")
}
