//! Kindred Server - WebSocket access to a family snapshot
//!
//! Two servers share one [`ServerContext`]:
//!
//! - [`KindredServer`] answers JSON-RPC 2.0 requests (page rendering, tree
//!   and mindmap layouts, member lookup, login and admin edits).
//! - [`SyncServer`] watches the dataset file and pushes every new snapshot
//!   to subscribed viewers.
//!
//! The snapshot is replaced wholesale on reload or mutation. Each load is
//! tagged with a generation so a slow, older load never overwrites a newer
//! one.

mod context;
mod handlers;
mod protocol;
mod server;
mod source;
mod state;
pub mod sync_server;

pub use context::{MutationError, ServerContext, ServerSettings, SharedContext};
pub use handlers::Session;
pub use protocol::{Request, Response, RpcError};
pub use server::{KindredServer, ServerConfig};
pub use source::{FamilySource, JsonFileSource, SourceError, StoreSource};
pub use state::{install_if_newer, FamilyState, Generation, SharedState};
pub use sync_server::{
    BroadcastMessage, SnapshotUpdatePayload, SyncServer, SyncServerConfig, SyncServerHandle,
    UpdateReason,
};
