//! Kindred Graph - Family relationship resolution
//!
//! This crate turns the flat persons and relationships of a dataset into
//! a graph that answers "who are X's spouses and children" directly, picks
//! the root a tree starts from, and builds the nested family tree.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with additional indexes for:
//! - Person id lookups
//! - Spouses, children and parents in relationship order
//! - Name search
//!
//! # Example
//!
//! ```
//! use kindred_core::{FamilyDataset, Gender, Person, Relationship};
//! use kindred_graph::{build_family_tree, select_root, FamilyGraph};
//!
//! let dataset = FamilyDataset::new(
//!     vec![
//!         Person::new("p1", "Grandfather", Gender::Male).with_birth(Some(1920), None, None),
//!         Person::new("p2", "Father", Gender::Male).with_birth(Some(1950), None, None),
//!     ],
//!     vec![Relationship::child("p1", "p2")],
//!     vec![],
//! );
//!
//! let graph = FamilyGraph::from_dataset(&dataset);
//! let root = select_root(None, &graph).unwrap();
//! let tree = build_family_tree(&graph, &[root]).unwrap();
//! assert_eq!(tree.size(), 2);
//! ```

mod builder;
mod edge;
mod error;
mod graph;
mod lineage;
mod roots;
mod search_index;
mod store;
mod tree;

pub use builder::FamilyGraphBuilder;
pub use edge::{Edge, GraphEdge};
pub use error::{GraphError, Result};
pub use graph::{FamilyGraph, FamilyUnit, GraphStats, NodeId, Parent, Spouse};
pub use lineage::{LineageDirection, Relative};
pub use roots::{natural_roots, select_root};
pub use store::{FamilyStore, StoreError};
pub use tree::{build_family_tree, FamilyTree, SpouseLink, TreeNode};
