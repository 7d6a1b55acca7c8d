//! Persistent bridge settings and device profiles.

mod profile;
mod storage;

pub use profile::{DeviceProfile, ProfileMetadata, StreamDefaults};
pub use storage::ProfileStore;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::logger::{self, LogLevel};
use crate::native::NativeApi;
use crate::stream::StreamFormat;

/// Process-wide defaults for the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Timeout for stream reads, writes and status polls
    pub default_timeout_us: i64,
    pub default_format: StreamFormat,
    /// Native log threshold
    pub log_level: LogLevel,
    /// Directory holding one JSON file per device profile
    pub profiles_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_timeout_us: 100_000,
            default_format: StreamFormat::CS16,
            log_level: LogLevel::Info,
            profiles_dir: PathBuf::from("profiles"),
        }
    }
}

impl BridgeConfig {
    /// Load the config at `path`, writing the defaults there first if it does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
            Self::default().save(path).await?;
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        // Write to temporary file first
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .await
            .context("Failed to write temporary config file")?;

        // Atomic rename
        fs::rename(&temp_path, path)
            .await
            .context("Failed to atomically update config file")?;

        Ok(())
    }

    /// Push the native-facing settings to `api`
    pub fn apply(&self, api: &dyn NativeApi) {
        logger::set_log_level(api, self.log_level);
    }

    /// Profile store rooted at `profiles_dir`, resolved against `base` when relative
    pub fn profile_store(&self, base: &Path) -> Result<ProfileStore> {
        let dir = if self.profiles_dir.is_absolute() {
            self.profiles_dir.clone()
        } else {
            base.join(&self.profiles_dir)
        };
        ProfileStore::new(dir)
    }
}
