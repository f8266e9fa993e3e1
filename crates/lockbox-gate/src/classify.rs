//! Request classification: which resource category does a request target?

use axum::http::Method;
use lockbox_core::config::GateConfig;

/// What the gate knows about an inbound request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    /// Caller network address, if known
    pub origin: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            origin: None,
            user_agent: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Resource category of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCategory {
    /// Pages and listings
    Navigation,
    /// Metadata queries that never touch file content
    Metadata,
    /// Writes encrypted file content
    Upload,
    /// Reads encrypted file content
    Download,
}

impl ResourceCategory {
    /// Uploads and downloads need the session's encryption material
    pub fn is_encryption_sensitive(self) -> bool {
        matches!(self, Self::Upload | Self::Download)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Metadata => "metadata",
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

/// Maps request paths to resource categories by configured prefix.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    upload_prefixes: Vec<String>,
    download_prefixes: Vec<String>,
    metadata_prefixes: Vec<String>,
}

impl RequestClassifier {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            upload_prefixes: config.upload_prefixes.clone(),
            download_prefixes: config.download_prefixes.clone(),
            metadata_prefixes: config.metadata_prefixes.clone(),
        }
    }

    /// Classify a request path. Encryption-sensitive categories win over
    /// metadata when prefixes overlap; anything unmatched is navigation.
    pub fn classify(&self, path: &str) -> ResourceCategory {
        if any_prefix(path, &self.upload_prefixes) {
            ResourceCategory::Upload
        } else if any_prefix(path, &self.download_prefixes) {
            ResourceCategory::Download
        } else if any_prefix(path, &self.metadata_prefixes) {
            ResourceCategory::Metadata
        } else {
            ResourceCategory::Navigation
        }
    }
}

impl Default for RequestClassifier {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

fn any_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| has_path_prefix(path, p))
}

/// Segment-aware prefix match: `/files/upload` matches `/files/upload` and
/// `/files/upload/a.txt`, but not `/files/uploads`.
fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
