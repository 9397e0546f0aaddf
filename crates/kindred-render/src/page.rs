//! Page composition.
//!
//! One call turns the navigation state into everything a client shows:
//! the chosen root, the body for the current view, and the detail panel
//! when one is open.

use crate::detail::MemberDetail;
use crate::list::{ListQuery, MemberList};
use crate::mindmap::{self, MindmapState, OutlineRow};
use crate::tree_view::TreeView;
use crate::NO_DATA;
use kindred_core::{AppState, FamilyDataset, PersonId, ViewMode, Viewer};
use kindred_graph::{build_family_tree, select_root, FamilyGraph, GraphError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The root shown in the root selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootChoice {
    pub id: PersonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PageBody {
    List(MemberList),
    Tree(TreeView),
    Mindmap(Vec<OutlineRow>),
    /// No persons, or the data could not be laid out.
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub state: AppState,
    /// Only set for the tree and mindmap views.
    pub root: Option<RootChoice>,
    pub body: PageBody,
    pub detail: Option<MemberDetail>,
    pub can_edit: bool,
    /// A data error such as a relationship cycle.
    pub error: Option<String>,
}

/// View-local inputs that are not part of the navigation state.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub list: ListQuery,
    pub mindmap: MindmapState,
}

pub fn render_page(
    dataset: &FamilyDataset,
    graph: &FamilyGraph,
    state: &AppState,
    viewer: Viewer,
    options: &PageOptions,
) -> Page {
    debug!("Rendering {} view", state.view);
    let mut error = None;

    let (root, body) = match state.view {
        ViewMode::List => (None, PageBody::List(MemberList::build(&dataset.persons, &options.list))),
        ViewMode::Tree | ViewMode::Mindmap => {
            let root = select_root(state.root_id.as_ref(), graph);
            let choice = root.as_ref().and_then(|id| {
                graph.get(id).map(|p| RootChoice {
                    id: id.clone(),
                    name: p.full_name.clone(),
                })
            });
            let roots: Vec<PersonId> = root.into_iter().collect();

            let body = match build_family_tree(graph, &roots) {
                Ok(tree) if tree.is_empty() => PageBody::Message(NO_DATA.to_string()),
                Ok(tree) if state.view == ViewMode::Tree => PageBody::Tree(TreeView::new(&tree)),
                Ok(tree) => PageBody::Mindmap(mindmap::outline(&tree, &options.mindmap)),
                Err(err) => {
                    warn!("Cannot lay out family: {}", err);
                    error = Some(err.to_string());
                    PageBody::Message(err.to_string())
                }
            };
            (choice, body)
        }
    };

    let detail = state.detail_id.as_ref().and_then(|id| {
        match MemberDetail::build(graph, dataset, id, viewer) {
            Ok(detail) => Some(detail),
            Err(GraphError::PersonNotFound(_)) => {
                debug!("Detail {} not found, closing", id);
                None
            }
            Err(err) => {
                error.get_or_insert_with(|| err.to_string());
                None
            }
        }
    });

    Page {
        state: AppState {
            view: state.view,
            root_id: root
                .as_ref()
                .map(|r| r.id.clone())
                .or_else(|| state.root_id.clone()),
            detail_id: detail.as_ref().map(|d| d.card.id.clone()),
        },
        root,
        body,
        detail,
        can_edit: viewer.can_edit(),
        error,
    }
}

impl Page {
    pub fn render_text(&self) -> String {
        let mut out = match &self.body {
            PageBody::List(list) => list.render_text(),
            PageBody::Tree(tree) => tree.render_text(),
            PageBody::Mindmap(rows) => mindmap::render_text(rows),
            PageBody::Message(message) => message.clone(),
        };
        if let Some(detail) = &self.detail {
            out.push_str("\n\n");
            out.push_str(&detail.render_text());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{Gender, Person, Relationship};

    fn setup(relationships: Vec<Relationship>) -> (FamilyDataset, FamilyGraph) {
        let dataset = FamilyDataset::new(
            vec![
                Person::new("p1", "Founder", Gender::Male).with_birth(Some(1920), None, None),
                Person::new("p2", "Son", Gender::Male).with_birth(Some(1950), None, None),
            ],
            relationships,
            vec![],
        );
        let graph = FamilyGraph::from_dataset(&dataset);
        (dataset, graph)
    }

    #[test]
    fn test_tree_page_picks_root() {
        let (dataset, graph) = setup(vec![Relationship::child("p1", "p2")]);
        let page = render_page(
            &dataset,
            &graph,
            &AppState::new(ViewMode::Tree),
            Viewer::GUEST,
            &PageOptions::default(),
        );

        assert_eq!(page.state.root_id, Some("p1".into()));
        assert_eq!(page.root.as_ref().map(|r| r.name.as_str()), Some("Founder"));
        assert!(matches!(page.body, PageBody::Tree(ref t) if t.roots.len() == 1));
        assert!(page.error.is_none());
    }

    #[test]
    fn test_list_page_has_no_root_and_opens_detail() {
        let (dataset, graph) = setup(vec![]);
        let state = AppState::new(ViewMode::List).open_detail("p2");
        let page = render_page(&dataset, &graph, &state, Viewer::ADMIN, &PageOptions::default());

        assert!(page.root.is_none());
        assert_eq!(page.detail.as_ref().map(|d| d.card.name.as_str()), Some("Son"));
        assert_eq!(page.state.detail_id, Some("p2".into()));
        assert!(page.can_edit);
    }

    #[test]
    fn test_unknown_detail_is_closed() {
        let (dataset, graph) = setup(vec![]);
        let state = AppState::new(ViewMode::Mindmap).open_detail("ghost");
        let page = render_page(&dataset, &graph, &state, Viewer::GUEST, &PageOptions::default());

        assert!(page.detail.is_none());
        assert_eq!(page.state.detail_id, None);
    }

    #[test]
    fn test_cycle_is_reported() {
        let (dataset, graph) = setup(vec![
            Relationship::child("p1", "p2"),
            Relationship::child("p2", "p1"),
        ]);
        let state = AppState::new(ViewMode::Mindmap).with_root("p1");
        let page = render_page(&dataset, &graph, &state, Viewer::GUEST, &PageOptions::default());

        assert!(page.error.as_deref().unwrap_or("").contains("cycle"));
        assert!(matches!(page.body, PageBody::Message(_)));
    }

    #[test]
    fn test_empty_dataset_placeholder() {
        let dataset = FamilyDataset::default();
        let graph = FamilyGraph::from_dataset(&dataset);
        let page = render_page(
            &dataset,
            &graph,
            &AppState::new(ViewMode::Tree),
            Viewer::GUEST,
            &PageOptions::default(),
        );

        assert_eq!(page.render_text(), NO_DATA);
        assert!(page.root.is_none());
    }
}
