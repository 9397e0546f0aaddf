//! Where the family dataset is loaded from and saved to.

use async_trait::async_trait;
use kindred_core::{CoreError, FamilyDataset};
use kindred_graph::{FamilyStore, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A backing store for the family snapshot.
#[async_trait]
pub trait FamilySource: Send + Sync {
    /// Loads the whole dataset. A source with nothing in it yields an
    /// empty dataset.
    async fn load(&self) -> Result<FamilyDataset, SourceError>;

    /// Replaces the whole dataset.
    async fn save(&self, dataset: &FamilyDataset) -> Result<(), SourceError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// File to watch for outside edits, if any.
    fn watch_path(&self) -> Option<&Path> {
        None
    }
}

/// A JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FamilySource for JsonFileSource {
    async fn load(&self) -> Result<FamilyDataset, SourceError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                return Ok(FamilyDataset::default());
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(FamilyDataset::from_json(&text)?)
    }

    async fn save(&self, dataset: &FamilyDataset) -> Result<(), SourceError> {
        let json = dataset.to_json_pretty()?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| SourceError::Io { path, source }
        };

        tokio::fs::write(&tmp, json).await.map_err(io_err(&tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(io_err(&self.path))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// The local sled store.
#[derive(Clone)]
pub struct StoreSource {
    store: Arc<FamilyStore>,
    location: String,
}

impl StoreSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let location = path.as_ref().display().to_string();
        Ok(Self {
            store: Arc::new(FamilyStore::open(path)?),
            location,
        })
    }
}

#[async_trait]
impl FamilySource for StoreSource {
    async fn load(&self) -> Result<FamilyDataset, SourceError> {
        let store = self.store.clone();
        let dataset = tokio::task::spawn_blocking(move || store.load_dataset()).await??;
        Ok(dataset.unwrap_or_default())
    }

    async fn save(&self, dataset: &FamilyDataset) -> Result<(), SourceError> {
        let store = self.store.clone();
        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || store.save_dataset(&dataset)).await??;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("store at {}", self.location)
    }
}
