//! Project configuration stored in `.kindred/config.json`.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding the config file and the local store.
pub const CONFIG_DIR: &str = ".kindred";
pub const CONFIG_FILE: &str = "config.json";

/// Overrides `site_name` when set.
pub const SITE_NAME_ENV: &str = "KINDRED_SITE_NAME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindredConfig {
    pub site_name: String,
    /// JSON dataset watched by the sync server.
    pub data_file: PathBuf,
    /// Sled store directory, relative to the project root.
    pub store_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub sync_addr: SocketAddr,
    /// Tokens that log a connection in as admin.
    pub admin_tokens: Vec<String>,
    pub debounce_ms: u64,
    pub mindmap_default_depth: usize,
}

impl Default for KindredConfig {
    fn default() -> Self {
        Self {
            site_name: "Family Tree".to_string(),
            data_file: PathBuf::from("family.json"),
            store_path: PathBuf::from(CONFIG_DIR).join("store"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7450)),
            sync_addr: SocketAddr::from(([127, 0, 0, 1], 7451)),
            admin_tokens: Vec::new(),
            debounce_ms: 300,
            mindmap_default_depth: 2,
        }
    }
}

impl KindredConfig {
    /// Path of the config file under a project root.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Loads the config under `root`, falling back to defaults when the
    /// file does not exist. The environment override is applied last.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_in(root);
        let mut config = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| CoreError::read(&path, e))?;
            debug!("Loaded config from {}", path.display());
            serde_json::from_str(&text)?
        } else {
            Self::default()
        };

        if let Ok(name) = std::env::var(SITE_NAME_ENV) {
            if !name.trim().is_empty() {
                config.site_name = name;
            }
        }

        Ok(config)
    }

    /// Writes the config under `root`, creating the directory.
    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).map_err(|e| CoreError::write(&dir, e))?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?).map_err(|e| CoreError::write(&path, e))?;
        Ok(path)
    }

    pub fn is_admin_token(&self, token: &str) -> bool {
        !token.is_empty() && self.admin_tokens.iter().any(|t| t == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = KindredConfig::load(dir.path()).unwrap();
        assert_eq!(config.mindmap_default_depth, 2);
        assert_eq!(config.data_file, PathBuf::from("family.json"));
    }

    #[test]
    fn test_save_and_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = KindredConfig::default();
        config.admin_tokens = vec!["secret".to_string()];
        config.save(dir.path()).unwrap();

        let loaded = KindredConfig::load(dir.path()).unwrap();
        assert!(loaded.is_admin_token("secret"));
        assert!(!loaded.is_admin_token(""));
        assert!(!loaded.is_admin_token("guess"));

        fs::write(
            KindredConfig::path_in(dir.path()),
            r#"{"debounce_ms": 50}"#,
        )
        .unwrap();
        let partial = KindredConfig::load(dir.path()).unwrap();
        assert_eq!(partial.debounce_ms, 50);
        assert!(partial.admin_tokens.is_empty());
    }
}
