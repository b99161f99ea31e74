//! Per-site key/value settings, such as the access token written by a login.
//!
//! One [`SiteSettings`] is created per site and shared by the adapter and whoever drives the
//! login flow. Reads happen on every request; writes only happen in `authenticate`/`logout`.
//! A file backed store keeps its data as a bincode file named `<site>.settings` inside the
//! [config dir](moeloader_common::config_dir).
use bincode::{deserialize, serialize};
use moeloader_common::{log::debug, tokio};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tokio::fs::{read, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Settings key holding the bearer token of sites with account support.
pub const ACCESS_TOKEN: &str = "accessToken";

#[derive(Error, Debug)]
pub enum SettingsError {
    /// Indicates any unrecoverable IO error when trying to read or write the settings file.
    #[error("Failed to access settings file. error: {source}")]
    SettingsIOError {
        #[from]
        source: io::Error,
    },

    /// Indicates a failed attempt to serialize the settings file to `bincode`.
    #[error("Failed to encode settings file")]
    SettingsEncodeError,

    /// The settings file exists but is not a valid bincode settings map.
    #[error("Settings file {file} is corrupted")]
    SettingsDecodeError { file: String },
}

#[derive(Debug)]
pub struct SiteSettings {
    site: String,
    path: Option<PathBuf>,
    items: RwLock<HashMap<String, String>>,
}

impl SiteSettings {
    /// A store that lives only as long as the process.
    pub fn in_memory(site: &str) -> Self {
        Self {
            site: site.to_string(),
            path: None,
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Loads `<dir>/<site>.settings`, starting empty if the file doesn't exist yet.
    pub async fn open(site: &str, dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(format!("{site}.settings"));

        let items = if path.exists() {
            let bytes = read(&path).await?;
            deserialize::<HashMap<String, String>>(&bytes).map_err(|_| {
                SettingsError::SettingsDecodeError {
                    file: path.display().to_string(),
                }
            })?
        } else {
            HashMap::new()
        };

        debug!("Loaded {} settings for {}", items.len(), site);

        Ok(Self {
            site: site.to_string(),
            path: Some(path),
            items: RwLock::new(items),
        })
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Writes the current contents to disk. No-op for in-memory stores.
    pub async fn persist(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
            serialize(&*items).map_err(|_| SettingsError::SettingsEncodeError)?
        };

        let mut cfg_cache = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .await?;

        cfg_cache.write_all(&bytes).await?;
        cfg_cache.flush().await?;
        debug!("Wrote {} settings to {}", self.site, path.display());
        Ok(())
    }
}
