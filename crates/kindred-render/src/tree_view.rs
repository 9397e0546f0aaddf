//! Ancestor-descendant tree view.
//!
//! Each row is a main card with its spouses beside it, joined by a heart,
//! and the children hang below with box-drawing connectors. Children of
//! every marriage are shown together under the main person.

use crate::card::{card_label, spouse_label, SpouseCard};
use crate::NO_DATA;
use kindred_core::PersonCard;
use kindred_graph::{FamilyTree, TreeNode};
use serde::{Deserialize, Serialize};

pub const HEART: &str = "\u{2764}";
const SPOUSE_JOINER: &str = " + ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeCardNode {
    pub card: PersonCard,
    pub spouses: Vec<SpouseCard>,
    pub children: Vec<TreeCardNode>,
}

/// Converts sibling nodes and everything below them with an explicit
/// stack, so lineage depth is bounded by memory only.
fn card_nodes(nodes: &[TreeNode]) -> Vec<TreeCardNode> {
    // (node being built, its children, cards finished so far); the
    // bottom frame has no node and collects the top level.
    let mut stack: Vec<(Option<&TreeNode>, &[TreeNode], Vec<TreeCardNode>)> =
        vec![(None, nodes, Vec::with_capacity(nodes.len()))];

    loop {
        let Some(top) = stack.last() else {
            return Vec::new();
        };
        let pending = top.1;
        if let Some(child) = pending.get(top.2.len()) {
            let children = child.children.as_slice();
            stack.push((Some(child), children, Vec::with_capacity(children.len())));
            continue;
        }

        let Some((source, _, children)) = stack.pop() else {
            return Vec::new();
        };
        let Some(source) = source else {
            return children;
        };
        let card = TreeCardNode {
            card: PersonCard::from_person(&source.person),
            spouses: source.spouses.iter().map(SpouseCard::from).collect(),
            children,
        };
        if let Some(parent) = stack.last_mut() {
            parent.2.push(card);
        }
    }
}

impl TreeCardNode {
    /// The row text: main card, then spouses after a heart.
    pub fn row_label(&self) -> String {
        let mut row = card_label(&self.card);
        if !self.spouses.is_empty() {
            let spouses: Vec<String> = self.spouses.iter().map(spouse_label).collect();
            row.push_str(&format!(" {} {}", HEART, spouses.join(SPOUSE_JOINER)));
        }
        row
    }
}

/// Display model of the whole tree view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeView {
    pub roots: Vec<TreeCardNode>,
}

impl TreeView {
    pub fn new(tree: &FamilyTree) -> Self {
        Self {
            roots: card_nodes(&tree.roots),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Renders the tree as indented text.
    pub fn render_text(&self) -> String {
        if self.is_empty() {
            return NO_DATA.to_string();
        }

        let mut lines = Vec::new();
        for root in &self.roots {
            lines.push(root.row_label());
            let mut stack: Vec<(&TreeCardNode, String, bool)> = Vec::new();
            push_children(&mut stack, root, String::new());

            while let Some((node, prefix, last)) = stack.pop() {
                let connector = if last { "└── " } else { "├── " };
                lines.push(format!("{}{}{}", prefix, connector, node.row_label()));
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                push_children(&mut stack, node, child_prefix);
            }
        }
        lines.join("\n")
    }
}

/// Pushes children in reverse so the first one is popped first.
fn push_children<'a>(
    stack: &mut Vec<(&'a TreeCardNode, String, bool)>,
    node: &'a TreeCardNode,
    prefix: String,
) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate().rev() {
        stack.push((child, prefix.clone(), i + 1 == count));
    }
}
