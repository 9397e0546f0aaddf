//! WebSocket server implementation.
//!
//! Handles client connections and routes messages to handlers.

use crate::context::SharedContext;
use crate::handlers::{
    handle_info, handle_login, handle_member, handle_members, handle_mindmap, handle_page,
    handle_person_create, handle_person_update, handle_relationship_add, handle_roots_search,
    handle_tree, Session,
};
use crate::protocol::{Request, Response};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Server configuration.
pub struct ServerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7450)),
        }
    }
}

/// The Kindred JSON-RPC server.
pub struct KindredServer {
    config: ServerConfig,
    context: SharedContext,
}

impl KindredServer {
    pub fn new(context: SharedContext, config: ServerConfig) -> Self {
        Self { config, context }
    }

    pub fn context(&self) -> SharedContext {
        self.context.clone()
    }

    /// Runs the server, accepting connections forever.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Kindred server listening on {}", self.config.addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    let context = self.context.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, context).await {
                            error!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handles a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    context: SharedContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = accept_async(stream).await?;
    info!("WebSocket connection established with {}", addr);

    let (mut write, mut read) = ws_stream.split();
    let mut session = Session::default();

    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("Message error from {}: {}", addr, e);
                break;
            }
        };

        if msg.is_close() {
            debug!("Client {} disconnected", addr);
            break;
        }

        if msg.is_ping() {
            write.send(Message::Pong(msg.into_data())).await?;
            continue;
        }

        if msg.is_text() {
            let text = msg.to_text().unwrap_or("");
            let response = process_message(text, &context, &mut session).await;
            let json = serde_json::to_string(&response)?;
            write.send(Message::Text(json)).await?;
        }
    }

    info!("Connection closed: {}", addr);
    Ok(())
}

/// Missing params count as an empty object.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, serde_json::Error> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
}

/// Processes a JSON-RPC message and returns a response.
pub(crate) async fn process_message(
    text: &str,
    context: &SharedContext,
    session: &mut Session,
) -> Response {
    let request: Request = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(_) => return Response::parse_error(),
    };

    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return Response::invalid_request(id);
    }

    let method = request.method.as_str();
    debug!("Processing method: {}", method);
    let ctx = context.as_ref();

    match method {
        "family.info" => handle_info(ctx, id).await,

        "page.render" => match parse_params(request.params) {
            Ok(params) => handle_page(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "tree.get" => match parse_params(request.params) {
            Ok(params) => handle_tree(ctx, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "mindmap.get" => match parse_params(request.params) {
            Ok(params) => handle_mindmap(ctx, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "members.list" => match parse_params(request.params) {
            Ok(params) => handle_members(ctx, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "member.get" => match parse_params(request.params) {
            Ok(params) => handle_member(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "roots.search" => match parse_params(request.params) {
            Ok(params) => handle_roots_search(ctx, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "auth.login" => match parse_params(request.params) {
            Ok(params) => handle_login(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "person.create" => match parse_params(request.params) {
            Ok(params) => handle_person_create(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "person.update" => match parse_params(request.params) {
            Ok(params) => handle_person_update(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "relationship.add" => match parse_params(request.params) {
            Ok(params) => handle_relationship_add(ctx, session, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        _ => Response::method_not_found(id, method),
    }
}
