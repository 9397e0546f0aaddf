//! Request handlers for protocol methods.
//!
//! Each handler implements one method. Reads work on the installed
//! snapshot; mutations go through [`ServerContext::mutate`].

use crate::context::{MutationError, ServerContext};
use crate::protocol::{
    LoginParams, MemberGetParams, MindmapOverrides, MindmapParams, PageParams,
    PersonCreateParams, PersonUpdateParams, RelationshipAddParams, Response, RootsSearchParams,
    TreeParams, CYCLE_DETECTED, INTERNAL_ERROR, NOT_FOUND, VALIDATION_FAILED,
};
use crate::source::SourceError;
use kindred_core::{CoreError, Person, PersonCard, PersonId, Viewer};
use kindred_graph::{
    build_family_tree, natural_roots, select_root, FamilyGraph, FamilyTree, GraphError,
    GraphStats,
};
use kindred_render::{mindmap, render_page, MemberDetail, MemberList, MindmapState, PageOptions, TreeView};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-connection state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    pub viewer: Viewer,
}

fn mindmap_state(ctx: &ServerContext, overrides: MindmapOverrides) -> MindmapState {
    let mut state = MindmapState::new(overrides.depth.unwrap_or(ctx.settings.mindmap_default_depth));
    for path in overrides.expanded {
        state.expand(path);
    }
    for path in overrides.collapsed {
        state.collapse(path);
    }
    state
}

fn graph_error(id: Option<Value>, err: GraphError) -> Response {
    match err {
        GraphError::PersonNotFound(person) => {
            Response::error(id, NOT_FOUND, format!("Person not found: {}", person))
        }
        GraphError::Cycle { ref path } => {
            warn!("{}", err);
            Response::error_with_data(id, CYCLE_DETECTED, err.to_string(), json!({ "path": path }))
        }
    }
}

fn mutation_error(id: Option<Value>, err: MutationError) -> Response {
    match err {
        MutationError::Graph(err) => graph_error(id, err),
        MutationError::Core(CoreError::Validation { field, message }) => Response::error_with_data(
            id,
            VALIDATION_FAILED,
            message,
            json!({ "field": field }),
        ),
        MutationError::Core(CoreError::PersonNotFound(person)) => {
            Response::error(id, NOT_FOUND, format!("Person not found: {}", person))
        }
        MutationError::Core(err) | MutationError::Source(SourceError::Core(err)) => {
            Response::error(id, INTERNAL_ERROR, err.to_string())
        }
        MutationError::Source(err) => {
            warn!("Saving failed: {}", err);
            Response::error(id, INTERNAL_ERROR, format!("Saving failed: {}", err))
        }
    }
}

/// Tree for the requested (or fallback) root.
fn tree_for(graph: &FamilyGraph, requested: Option<&PersonId>) -> Result<FamilyTree, GraphError> {
    let roots: Vec<PersonId> = select_root(requested, graph).into_iter().collect();
    build_family_tree(graph, &roots)
}

/// Handles the family.info method.
pub async fn handle_info(ctx: &ServerContext, id: Option<Value>) -> Response {
    let state = ctx.state.read().await;

    #[derive(Serialize)]
    struct InfoResult {
        #[serde(rename = "siteName")]
        site_name: String,
        generation: u64,
        stats: GraphStats,
        #[serde(rename = "rootCount")]
        root_count: usize,
        /// A loop in the parent links, if the data has one.
        cycle: Option<Vec<PersonId>>,
        version: &'static str,
    }

    Response::success(
        id,
        InfoResult {
            site_name: ctx.settings.site_name.clone(),
            generation: state.generation,
            stats: state.graph.stats(),
            root_count: natural_roots(&state.graph).len(),
            cycle: state.graph.find_cycle(),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Handles the page.render method.
pub async fn handle_page(
    ctx: &ServerContext,
    session: &Session,
    id: Option<Value>,
    params: PageParams,
) -> Response {
    let start = Instant::now();
    let state = ctx.state.read().await;

    let options = PageOptions {
        list: params.list,
        mindmap: mindmap_state(ctx, params.mindmap),
    };
    let page = render_page(&state.dataset, &state.graph, &params.state, session.viewer, &options);
    debug!("Rendered {} page in {:?}", params.state.view, start.elapsed());

    Response::success(id, page)
}

/// Handles the tree.get method.
pub async fn handle_tree(ctx: &ServerContext, id: Option<Value>, params: TreeParams) -> Response {
    let state = ctx.state.read().await;

    match tree_for(&state.graph, params.root_id.as_ref()) {
        Ok(tree) => {
            let view = TreeView::new(&tree);
            if params.text {
                Response::success(id, json!({ "text": view.render_text() }))
            } else {
                Response::success(id, view)
            }
        }
        Err(err) => graph_error(id, err),
    }
}

/// Handles the mindmap.get method.
pub async fn handle_mindmap(
    ctx: &ServerContext,
    id: Option<Value>,
    params: MindmapParams,
) -> Response {
    let state = ctx.state.read().await;

    match tree_for(&state.graph, params.root_id.as_ref()) {
        Ok(tree) => {
            let rows = mindmap::outline(&tree, &mindmap_state(ctx, params.overrides));
            if params.text {
                Response::success(id, json!({ "text": mindmap::render_text(&rows) }))
            } else {
                Response::success(id, json!({ "rows": rows }))
            }
        }
        Err(err) => graph_error(id, err),
    }
}

/// Handles the members.list method.
pub async fn handle_members(
    ctx: &ServerContext,
    id: Option<Value>,
    params: kindred_render::ListQuery,
) -> Response {
    let state = ctx.state.read().await;
    Response::success(id, MemberList::build(&state.dataset.persons, &params))
}

/// Handles the member.get method.
pub async fn handle_member(
    ctx: &ServerContext,
    session: &Session,
    id: Option<Value>,
    params: MemberGetParams,
) -> Response {
    let state = ctx.state.read().await;
    match MemberDetail::build(&state.graph, &state.dataset, &params.id, session.viewer) {
        Ok(detail) => Response::success(id, detail),
        Err(err) => graph_error(id, err),
    }
}

/// Handles the roots.search method.
pub async fn handle_roots_search(
    ctx: &ServerContext,
    id: Option<Value>,
    params: RootsSearchParams,
) -> Response {
    let state = ctx.state.read().await;
    let query = params.query.trim();

    // An empty query lists the natural roots first, then everyone else.
    let mut matches: Vec<&Person> = if query.is_empty() {
        let mut roots = natural_roots(&state.graph);
        roots.extend(
            state
                .dataset
                .persons
                .iter()
                .filter(|p| state.graph.has_parents(&p.id)),
        );
        roots
    } else {
        state.graph.search(query)
    };
    matches.truncate(params.limit);

    let cards: Vec<PersonCard> = matches.into_iter().map(PersonCard::from_person).collect();
    Response::success(id, json!({ "persons": cards }))
}

/// Handles the auth.login method.
pub async fn handle_login(
    ctx: &ServerContext,
    session: &mut Session,
    id: Option<Value>,
    params: LoginParams,
) -> Response {
    session.viewer = Viewer {
        is_admin: ctx.settings.is_admin_token(params.token.trim()),
    };
    info!("Session is now {}", if session.viewer.is_admin { "admin" } else { "guest" });

    Response::success(id, json!({ "isAdmin": session.viewer.is_admin }))
}

/// Handles the person.create method.
pub async fn handle_person_create(
    ctx: &ServerContext,
    session: &Session,
    id: Option<Value>,
    params: PersonCreateParams,
) -> Response {
    if !session.viewer.can_edit() {
        return Response::forbidden(id);
    }

    let result = ctx
        .mutate(|dataset, _| {
            let person = params.person.into_person(PersonId::generate())?;
            let mut next = dataset.clone();
            if let Some(private) = params.private {
                next.upsert_private(private.into_details(person.id.clone()));
            }
            next.upsert_person(person.clone());
            Ok((next, person))
        })
        .await;

    match result {
        Ok(person) => {
            info!("Created {} ({})", person.full_name, person.id);
            Response::success(id, PersonCard::from_person(&person))
        }
        Err(err) => mutation_error(id, err),
    }
}

/// Handles the person.update method.
pub async fn handle_person_update(
    ctx: &ServerContext,
    session: &Session,
    id: Option<Value>,
    params: PersonUpdateParams,
) -> Response {
    if !session.viewer.can_edit() {
        return Response::forbidden(id);
    }

    let result = ctx
        .mutate(|dataset, _| {
            if !dataset.contains(&params.id) {
                return Err(CoreError::PersonNotFound(params.id.to_string()).into());
            }
            let person = params.person.into_person(params.id.clone())?;
            let mut next = dataset.clone();
            if let Some(private) = params.private {
                next.upsert_private(private.into_details(params.id));
            }
            next.upsert_person(person.clone());
            Ok((next, person))
        })
        .await;

    match result {
        Ok(person) => {
            info!("Updated {} ({})", person.full_name, person.id);
            Response::success(id, PersonCard::from_person(&person))
        }
        Err(err) => mutation_error(id, err),
    }
}

/// Handles the relationship.add method.
pub async fn handle_relationship_add(
    ctx: &ServerContext,
    session: &Session,
    id: Option<Value>,
    params: RelationshipAddParams,
) -> Response {
    if !session.viewer.can_edit() {
        return Response::forbidden(id);
    }

    let result = ctx
        .mutate(|dataset, graph| {
            let relationship = params.validate(dataset)?;
            graph.ensure_acyclic(&relationship)?;
            let mut next = dataset.clone();
            next.add_relationship(relationship.clone());
            Ok((next, relationship))
        })
        .await;

    match result {
        Ok(relationship) => {
            info!(
                "Linked {} -> {} ({})",
                relationship.person_a, relationship.person_b, relationship.kind
            );
            Response::success(id, relationship)
        }
        Err(err) => mutation_error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ServerSettings;
    use crate::source::JsonFileSource;
    use crate::sync_server::UpdateReason;
    use kindred_core::{FamilyDataset, Gender, PersonDraft, Relationship, RelationshipDraft, RelationshipKind};
    use std::sync::Arc;

    async fn context(dir: &std::path::Path) -> ServerContext {
        let dataset = FamilyDataset::new(
            vec![
                Person::new("p1", "Grandfather", Gender::Male).with_birth(Some(1920), None, None),
                Person::new("p2", "Father", Gender::Male).with_birth(Some(1950), None, None),
                Person::new("p3", "Grandson", Gender::Male).with_birth(Some(1980), None, None),
            ],
            vec![Relationship::child("p1", "p2"), Relationship::child("p2", "p3")],
            vec![],
        );
        let path = dir.join("family.json");
        std::fs::write(&path, dataset.to_json_pretty().unwrap()).unwrap();

        let settings = ServerSettings {
            admin_tokens: vec!["secret".to_string()],
            ..ServerSettings::default()
        };
        let ctx = ServerContext::new(Arc::new(JsonFileSource::new(path)), settings);
        ctx.reload(UpdateReason::Startup).await.unwrap();
        ctx
    }

    fn admin() -> Session {
        Session { viewer: Viewer::ADMIN }
    }

    fn link(a: &str, b: &str) -> RelationshipDraft {
        serde_json::from_value(json!({ "person_a": a, "person_b": b, "type": "biological_child" }))
            .unwrap()
    }

    #[tokio::test]
    async fn test_info() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let response = handle_info(&ctx, Some(json!(1))).await;
        let result = response.result.unwrap();

        assert_eq!(result["stats"]["persons"], 3);
        assert_eq!(result["rootCount"], 1);
        assert!(result["cycle"].is_null());
    }

    #[tokio::test]
    async fn test_guest_cannot_mutate() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = PersonCreateParams {
            person: PersonDraft::new("Someone", Gender::Female),
            private: None,
        };

        let response = handle_person_create(&ctx, &Session::default(), None, params).await;
        assert_eq!(response.error.map(|e| e.code), Some(crate::protocol::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_login_sets_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let mut session = Session::default();

        handle_login(&ctx, &mut session, None, LoginParams { token: "wrong".into() }).await;
        assert!(!session.viewer.is_admin);

        let response =
            handle_login(&ctx, &mut session, None, LoginParams { token: "secret".into() }).await;
        assert!(session.viewer.is_admin);
        assert_eq!(response.result.unwrap()["isAdmin"], true);
    }

    #[tokio::test]
    async fn test_create_person_installs_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = PersonCreateParams {
            person: PersonDraft::new("Granddaughter", Gender::Female),
            private: None,
        };

        let response = handle_person_create(&ctx, &admin(), None, params).await;
        assert!(!response.is_error());
        assert_eq!(ctx.state.read().await.graph.node_count(), 4);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = PersonCreateParams {
            person: PersonDraft::new("   ", Gender::Female),
            private: None,
        };

        let response = handle_person_create(&ctx, &admin(), None, params).await;
        assert_eq!(response.error.map(|e| e.code), Some(VALIDATION_FAILED));
    }

    #[tokio::test]
    async fn test_update_unknown_person() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = PersonUpdateParams {
            id: "ghost".into(),
            person: PersonDraft::new("Ghost", Gender::Male),
            private: None,
        };

        let response = handle_person_update(&ctx, &admin(), None, params).await;
        assert_eq!(response.error.map(|e| e.code), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn test_link_that_closes_a_loop_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;

        let response = handle_relationship_add(&ctx, &admin(), None, link("p3", "p1")).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, CYCLE_DETECTED);
        assert!(error.data.is_some());
        assert_eq!(ctx.state.read().await.graph.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_link_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;

        let response = handle_relationship_add(&ctx, &admin(), None, link("p1", "p3")).await;
        assert!(!response.is_error());

        let state = ctx.state.read().await;
        assert_eq!(state.dataset.relationships.len(), 3);
        assert!(state
            .dataset
            .relationships
            .iter()
            .any(|r| r.kind == RelationshipKind::BiologicalChild && r.person_b.as_str() == "p3"
                && r.person_a.as_str() == "p1"));
    }

    #[tokio::test]
    async fn test_tree_text() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = TreeParams { root_id: None, text: true };

        let response = handle_tree(&ctx, None, params).await;
        let text = response.result.unwrap()["text"].as_str().unwrap_or("").to_string();
        assert!(text.starts_with("Grandfather"));
        assert!(text.contains("Grandson"));
    }

    #[tokio::test]
    async fn test_mindmap_collapsed_by_default_below_depth() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let params = MindmapParams {
            overrides: MindmapOverrides {
                depth: Some(1),
                ..MindmapOverrides::default()
            },
            ..MindmapParams::default()
        };

        let response = handle_mindmap(&ctx, None, params).await;
        let rows = response.result.unwrap()["rows"].as_array().map(Vec::len);
        assert_eq!(rows, Some(2));
    }

    #[tokio::test]
    async fn test_member_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;
        let response =
            handle_member(&ctx, &Session::default(), None, MemberGetParams { id: "x".into() }).await;
        assert_eq!(response.error.map(|e| e.code), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn test_roots_search() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path()).await;

        let all = handle_roots_search(&ctx, None, RootsSearchParams { query: String::new(), limit: 20 }).await;
        let persons = all.result.unwrap()["persons"].clone();
        assert_eq!(persons[0]["id"], "p1");
        assert_eq!(persons.as_array().map(Vec::len), Some(3));

        let found = handle_roots_search(&ctx, None, RootsSearchParams { query: "grands".into(), limit: 20 }).await;
        assert_eq!(found.result.unwrap()["persons"][0]["name"], "Grandson");
    }
}
