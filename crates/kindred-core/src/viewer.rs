//! Who is looking, and at what.

use crate::model::PersonId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The caller of a render. Computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub is_admin: bool,
}

impl Viewer {
    pub const ADMIN: Viewer = Viewer { is_admin: true };
    pub const GUEST: Viewer = Viewer { is_admin: false };

    /// Whether private details and edit actions are visible.
    pub fn can_see_private(&self) -> bool {
        self.is_admin
    }

    pub fn can_edit(&self) -> bool {
        self.is_admin
    }
}

/// Which layout the family is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    List,
    Tree,
    Mindmap,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewMode::List => "list",
            ViewMode::Tree => "tree",
            ViewMode::Mindmap => "mindmap",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(ViewMode::List),
            "tree" => Ok(ViewMode::Tree),
            "mindmap" => Ok(ViewMode::Mindmap),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

/// Navigation state. The three selectors are independent: changing the
/// view keeps the root and the open detail, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub view: ViewMode,
    #[serde(default, rename = "rootId")]
    pub root_id: Option<PersonId>,
    #[serde(default, rename = "memberModalId")]
    pub detail_id: Option<PersonId>,
}

impl AppState {
    pub fn new(view: ViewMode) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PersonId>) -> Self {
        self.root_id = Some(root.into());
        self
    }

    pub fn open_detail(mut self, id: impl Into<PersonId>) -> Self {
        self.detail_id = Some(id.into());
        self
    }

    pub fn close_detail(mut self) -> Self {
        self.detail_id = None;
        self
    }
}
