//! Server-wide context: the snapshot, its source, and the update channel.

use crate::source::{FamilySource, SourceError};
use crate::state::{install_if_newer, FamilyState, Generation, SharedState};
use crate::sync_server::{BroadcastMessage, SnapshotUpdatePayload, UpdateReason};
use kindred_core::{CoreError, FamilyDataset, KindredConfig};
use kindred_graph::{FamilyGraph, GraphError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Settings the handlers need from the project config.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub site_name: String,
    pub admin_tokens: Vec<String>,
    pub mindmap_default_depth: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from(&KindredConfig::default())
    }
}

impl From<&KindredConfig> for ServerSettings {
    fn from(config: &KindredConfig) -> Self {
        Self {
            site_name: config.site_name.clone(),
            admin_tokens: config.admin_tokens.clone(),
            mindmap_default_depth: config.mindmap_default_depth,
        }
    }
}

impl ServerSettings {
    pub fn is_admin_token(&self, token: &str) -> bool {
        !token.is_empty() && self.admin_tokens.iter().any(|t| t == token)
    }
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub struct ServerContext {
    pub state: SharedState,
    pub generation: Generation,
    pub settings: ServerSettings,
    source: Arc<dyn FamilySource>,
    updates: broadcast::Sender<BroadcastMessage>,
    /// Serializes admin mutations so none is built on a stale snapshot.
    mutation_lock: Mutex<()>,
}

pub type SharedContext = Arc<ServerContext>;

impl ServerContext {
    pub fn new(source: Arc<dyn FamilySource>, settings: ServerSettings) -> Self {
        let (updates, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(FamilyState::default())),
            generation: Generation::new(),
            settings,
            source,
            updates,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &dyn FamilySource {
        self.source.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.updates.subscribe()
    }

    pub fn publish(&self, message: BroadcastMessage) {
        // No receivers is fine.
        let _ = self.updates.send(message);
    }

    /// Loads from the source and installs the result unless a newer
    /// snapshot landed first. Returns whether it was installed.
    pub async fn reload(&self, reason: UpdateReason) -> Result<bool, SourceError> {
        let ticket = self.generation.next();
        let dataset = self.source.load().await?;
        let installed = install_if_newer(&self.state, ticket, dataset).await;

        if installed {
            self.announce(reason).await;
        }
        Ok(installed)
    }

    /// Applies an admin change: derive a new dataset from the current
    /// snapshot, persist it, then install it.
    ///
    /// The source is read first. An outside edit the watcher has not
    /// reloaded yet is installed before the change is applied, so saving
    /// never drops it.
    pub async fn mutate<T, F>(&self, change: F) -> Result<T, MutationError>
    where
        F: FnOnce(&FamilyDataset, &FamilyGraph) -> Result<(FamilyDataset, T), MutationError>,
    {
        let _guard = self.mutation_lock.lock().await;

        let on_disk = self.source.load().await?;
        let stale = self.state.read().await.dataset != on_disk;
        if stale {
            let ticket = self.generation.next();
            debug!("Source changed under snapshot; installing it as {}", ticket);
            if install_if_newer(&self.state, ticket, on_disk).await {
                self.announce(UpdateReason::FileChanged).await;
            }
        }

        let (next, output) = {
            let current = self.state.read().await;
            change(&current.dataset, &current.graph)?
        };

        self.source.save(&next).await?;
        let ticket = self.generation.next();
        if install_if_newer(&self.state, ticket, next).await {
            self.announce(UpdateReason::Mutation).await;
        } else {
            warn!("Mutation {} was overtaken by a newer snapshot", ticket);
        }
        Ok(output)
    }

    async fn announce(&self, reason: UpdateReason) {
        let state = self.state.read().await;
        let stats = state.graph.stats();
        info!(
            "Snapshot {} ready ({:?}): {} persons",
            state.generation, reason, stats.persons
        );
        self.publish(BroadcastMessage::SnapshotUpdate(SnapshotUpdatePayload::new(
            &state, reason,
        )));
    }
}
