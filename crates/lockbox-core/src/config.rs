use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LockboxError, LockboxResult};

/// Top-level daemon configuration (loaded from lockbox.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxConfig {
    pub daemon: DaemonConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
}

impl LockboxConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> LockboxResult<Self> {
        toml::from_str(content).map_err(|e| LockboxError::Config(e.to_string()))
    }

    /// Load config from `path`, falling back to defaults if the file does not exist
    pub fn load(path: &Path) -> LockboxResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| LockboxError::Config(format!("parsing {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// HTTP listen address (default: 127.0.0.1:8080)
    pub listen: String,
    /// Prometheus metrics endpoint (default: 127.0.0.1:9100)
    pub metrics_addr: Option<String>,
    /// Per-request gate diagnostics (development/debug mode)
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Persisted signing secret, relative to the working directory
    pub secret_file: PathBuf,
    /// Environment variable that overrides the persisted secret
    pub secret_env: String,
    /// Cookie carrying the signed session token
    pub cookie_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Path prefixes that write encrypted file content
    pub upload_prefixes: Vec<String>,
    /// Path prefixes that read encrypted file content
    pub download_prefixes: Vec<String>,
    /// Path prefixes for metadata-only requests
    pub metadata_prefixes: Vec<String>,
    /// Where denial responses point the user to log in
    pub login_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".into(),
            metrics_addr: Some("127.0.0.1:9100".into()),
            verbose: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_file: PathBuf::from(".session_secret"),
            secret_env: "LOCKBOX_SESSION_SECRET".into(),
            cookie_name: "lockbox_session".into(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            upload_prefixes: vec!["/files/upload".into()],
            download_prefixes: vec!["/files/download".into()],
            metadata_prefixes: vec!["/api".into()],
            login_path: "/login".into(),
        }
    }
}
