//! Live sync for connected viewers.
//!
//! Watches the dataset file for outside edits, reloads it after a quiet
//! period, and pushes every new snapshot to all websocket subscribers.
//! Admin mutations made through the RPC server land on the same channel.

use crate::context::SharedContext;
use crate::state::FamilyState;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use kindred_core::Person;
use kindred_graph::GraphEdge;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SyncServerConfig {
    pub addr: SocketAddr,
    /// Quiet period before a changed file is reloaded.
    pub debounce_ms: u64,
}

impl Default for SyncServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7451)),
            debounce_ms: 300,
        }
    }
}

/// What caused a new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    Startup,
    FileChanged,
    Mutation,
    /// Sent once to a client that just connected.
    Initial,
}

/// Server messages broadcast to all connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum BroadcastMessage {
    SnapshotUpdate(SnapshotUpdatePayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotUpdatePayload {
    pub generation: u64,
    pub reason: UpdateReason,
    pub person_count: usize,
    pub relationship_count: usize,
    pub timestamp: DateTime<Utc>,
    pub persons: Vec<Person>,
    pub edges: Vec<GraphEdge>,
}

impl SnapshotUpdatePayload {
    /// Public records only; private details never leave through the feed.
    pub fn new(state: &FamilyState, reason: UpdateReason) -> Self {
        Self {
            generation: state.generation,
            reason,
            person_count: state.graph.node_count(),
            relationship_count: state.graph.edge_count(),
            timestamp: Utc::now(),
            persons: state.dataset.persons.clone(),
            edges: state.graph.export_edges(),
        }
    }
}

/// A cloneable handle for publishing from outside the sync server.
#[derive(Clone)]
pub struct SyncServerHandle {
    context: SharedContext,
}

impl SyncServerHandle {
    /// Re-announces the installed snapshot.
    pub async fn republish(&self, reason: UpdateReason) {
        let state = self.context.state.read().await;
        self.context
            .publish(BroadcastMessage::SnapshotUpdate(SnapshotUpdatePayload::new(
                &state, reason,
            )));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.context.subscribe()
    }
}

pub struct SyncServer {
    config: SyncServerConfig,
    context: SharedContext,
}

impl SyncServer {
    pub fn new(config: SyncServerConfig, context: SharedContext) -> Self {
        Self { config, context }
    }

    pub fn handle(&self) -> SyncServerHandle {
        SyncServerHandle {
            context: self.context.clone(),
        }
    }

    /// Runs the server, watching the dataset file when the source has one.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self.context.source().watch_path() {
            Some(path) => {
                let (changed_tx, changed_rx) = mpsc::channel::<PathBuf>(64);
                let path = path.to_path_buf();
                let debounce_ms = self.config.debounce_ms;

                tokio::spawn(async move {
                    if let Err(e) = run_file_watcher(path, debounce_ms, changed_tx).await {
                        error!("File watcher error: {}", e);
                    }
                });

                let context = self.context.clone();
                tokio::spawn(async move {
                    run_reloader(changed_rx, context).await;
                });
            }
            None => info!(
                "{} cannot be watched; only mutations will be broadcast",
                self.context.source().describe()
            ),
        }

        self.run_websocket_server().await
    }

    async fn run_websocket_server(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Sync server listening on ws://{}", self.config.addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New sync connection from {}", addr);
                    let context = self.context.clone();
                    let broadcast_rx = context.subscribe();

                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, addr, context, broadcast_rx).await {
                            warn!("Sync connection error from {}: {}", addr, e);
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

async fn handle_client(
    stream: TcpStream,
    addr: SocketAddr,
    context: SharedContext,
    mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    {
        let state = context.state.read().await;
        let snapshot = BroadcastMessage::SnapshotUpdate(SnapshotUpdatePayload::new(
            &state,
            UpdateReason::Initial,
        ));
        let json = serde_json::to_string(&snapshot)?;
        write.send(Message::Text(json)).await?;
        debug!("Sent snapshot {} to {}", state.generation, addr);
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("Error from {}: {}", addr, e);
                        break;
                    }
                    // The feed is one-way.
                    Some(Ok(_)) => {}
                }
            }

            msg = broadcast_rx.recv() => {
                match msg {
                    Ok(broadcast) => {
                        let json = serde_json::to_string(&broadcast)?;
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Snapshots are whole; the next one catches the client up.
                        warn!("Client {} lagged by {} messages", addr, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    debug!("Sync connection closed: {}", addr);
    Ok(())
}

/// Emits the dataset path once it has been quiet for `debounce_ms`.
async fn run_file_watcher(
    path: PathBuf,
    debounce_ms: u64,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<()> {
    let (notify_tx, mut notify_rx) = mpsc::channel::<notify::Result<Event>>(256);

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = notify_tx.blocking_send(res);
        },
        Config::default(),
    )?;

    // Watch the directory: editors replace the file rather than write it.
    let dir = watch_dir(&path);
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!("Watching {}", path.display());

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let debounce = Duration::from_millis(debounce_ms);

    loop {
        let now = Instant::now();
        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) >= debounce)
            .map(|(p, _)| p.clone())
            .collect();

        for changed in ready {
            pending.remove(&changed);
            if tx.send(changed).await.is_err() {
                return Ok(());
            }
        }

        match tokio::time::timeout(Duration::from_millis(50), notify_rx.recv()).await {
            Ok(Some(Ok(event))) => {
                for changed in event.paths {
                    if is_dataset_file(&changed, &path) {
                        pending.insert(changed, Instant::now());
                    }
                }
            }
            Ok(Some(Err(e))) => {
                warn!("Watch error: {}", e);
            }
            Ok(None) => break,
            Err(_) => {}
        }
    }

    Ok(())
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Matches on file name so relative and absolute spellings agree.
fn is_dataset_file(changed: &Path, dataset: &Path) -> bool {
    changed.file_name().is_some() && changed.file_name() == dataset.file_name()
}

async fn run_reloader(mut rx: mpsc::Receiver<PathBuf>, context: SharedContext) {
    while let Some(path) = rx.recv().await {
        info!("Reloading after change to {}", path.display());
        let start = Instant::now();

        match context.reload(UpdateReason::FileChanged).await {
            Ok(true) => debug!("Reload finished in {:?}", start.elapsed()),
            Ok(false) => debug!("Reload superseded by a newer snapshot"),
            // Keep serving the last good snapshot.
            Err(e) => warn!("Reload of {} failed: {}", path.display(), e),
        }
    }
}
