//! JSON-RPC 2.0 message types and method parameters.

use kindred_core::{AppState, PersonDraft, PersonId, PrivateDraft, RelationshipDraft};
use kindred_render::{ListQuery, NodePath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub const NOT_FOUND: i32 = -32001;
pub const FORBIDDEN: i32 = -32003;
pub const VALIDATION_FAILED: i32 = -32004;
/// The family data contains, or would contain, an ancestry loop.
pub const CYCLE_DETECTED: i32 = -32010;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Option<Value>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err(e) => Self::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn error_with_data(id: Option<Value>, code: i32, message: impl Into<String>, data: Value) -> Self {
        let mut response = Self::error(id, code, message);
        if let Some(error) = response.error.as_mut() {
            error.data = Some(data);
        }
        response
    }

    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, INVALID_REQUEST, "Invalid request")
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, message)
    }

    pub fn forbidden(id: Option<Value>) -> Self {
        Self::error(id, FORBIDDEN, "Admin access required")
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Expansion overrides a client sends with mindmap requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MindmapOverrides {
    pub depth: Option<usize>,
    pub expanded: Vec<NodePath>,
    pub collapsed: Vec<NodePath>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    #[serde(flatten)]
    pub state: AppState,
    pub list: ListQuery,
    pub mindmap: MindmapOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    #[serde(rename = "rootId")]
    pub root_id: Option<PersonId>,
    /// Render as text instead of the card model.
    pub text: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MindmapParams {
    #[serde(rename = "rootId")]
    pub root_id: Option<PersonId>,
    #[serde(flatten)]
    pub overrides: MindmapOverrides,
    pub text: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberGetParams {
    pub id: PersonId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootsSearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginParams {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonCreateParams {
    pub person: PersonDraft,
    #[serde(default)]
    pub private: Option<PrivateDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonUpdateParams {
    pub id: PersonId,
    pub person: PersonDraft,
    #[serde(default)]
    pub private: Option<PrivateDraft>,
}

pub type RelationshipAddParams = RelationshipDraft;

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::ViewMode;

    #[test]
    fn test_page_params_from_query_style_json() {
        let params: PageParams = serde_json::from_value(serde_json::json!({
            "view": "tree",
            "rootId": "p1",
            "list": { "filter": "deceased" },
            "mindmap": { "expanded": ["p1/p2"] }
        }))
        .unwrap();

        assert_eq!(params.state.view, ViewMode::Tree);
        assert_eq!(params.state.root_id, Some("p1".into()));
        assert_eq!(params.mindmap.expanded.len(), 1);
    }

    #[test]
    fn test_error_response_shape() {
        let response = Response::error(Some(serde_json::json!(7)), CYCLE_DETECTED, "loop");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], -32010);
        assert_eq!(json["id"], 7);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_request_without_params() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"family.info"}"#).unwrap();
        assert_eq!(request.method, "family.info");
        assert!(request.params.is_null());
    }
}
