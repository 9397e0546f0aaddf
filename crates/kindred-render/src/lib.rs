//! Kindred Render - Views over the family graph
//!
//! Every view is a plain data model that serializes to JSON for clients
//! and also renders to text for the terminal:
//! - `tree_view`: ancestor-descendant tree with spouses side by side
//! - `mindmap`: collapsible indented outline
//! - `list`: searchable, filterable member list
//! - `detail`: one member with relatives and admin-only contact details
//! - `page`: picks the view for a navigation state
//!
//! `viewport` holds the drag-to-pan state machine used by the tree view.

mod card;
mod detail;
mod list;
pub mod mindmap;
mod page;
mod tree_view;
mod viewport;

/// Placeholder when there is nothing to lay out.
pub const NO_DATA: &str = "No data found.";

pub use card::{card_label, spouse_label, SpouseCard};
pub use detail::{MemberDetail, ParentCard, BLANK_FIELD, NO_NOTE, PRIVATE_NOTICE};
pub use list::{ListQuery, MemberFilter, MemberList, MemberSort, EMPTY_FAMILY, NO_MATCH};
pub use mindmap::{outline, Connector, MindmapState, NodePath, OutlineRow, Toggle, DEFAULT_EXPAND_DEPTH};
pub use page::{render_page, Page, PageBody, PageOptions, RootChoice};
pub use tree_view::{TreeCardNode, TreeView, HEART};
pub use viewport::{ClickOutcome, Cursor, DragState, Point, ScrollExtent, Viewport, DRAG_THRESHOLD_PX};
