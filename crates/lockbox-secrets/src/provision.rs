//! Session-signing secret provisioning: env override → persisted file → generate + persist
//!
//! Provisioning never fails. Read and write problems are logged and absorbed;
//! the worst case is an in-memory secret that does not survive a restart.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use lockbox_core::config::SessionConfig;

/// Random bytes in a generated secret (hex-encoded to 64 characters)
pub const SECRET_BYTES: usize = 32;

/// Default environment variable that overrides the persisted secret
pub const DEFAULT_SECRET_ENV: &str = "LOCKBOX_SESSION_SECRET";

/// Default secret file, relative to the working directory
pub const DEFAULT_SECRET_FILE: &str = ".session_secret";

/// Problems with the persisted secret file. Both are recovered locally.
#[derive(Debug, Error)]
pub enum SecretFileError {
    #[error("secret file {} unreadable: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("could not persist secret to {}: {source}", path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the provisioned secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    File,
    /// Freshly generated; `persisted` is false if the write failed
    Generated { persisted: bool },
}

/// The signing secret produced at startup, tagged with its origin.
pub struct ProvisionedSecret {
    secret: SecretString,
    source: SecretSource,
}

impl ProvisionedSecret {
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn source(&self) -> SecretSource {
        self.source
    }
}

impl std::fmt::Debug for ProvisionedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedSecret")
            .field("secret", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Produces the server-wide session-signing secret.
///
/// Meant to run once per process, before request handling starts. Two
/// processes provisioning against the same file at the same moment may each
/// generate a different secret; multi-instance deployments should set the
/// environment override instead.
#[derive(Debug, Clone)]
pub struct SecretProvisioner {
    env_var: String,
    path: PathBuf,
}

impl Default for SecretProvisioner {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_ENV, DEFAULT_SECRET_FILE)
    }
}

impl SecretProvisioner {
    pub fn new(env_var: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            path: path.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.secret_env.clone(), config.secret_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Obtain the session secret, consulting the process environment first.
    pub fn obtain(&self) -> ProvisionedSecret {
        let env_value = std::env::var(&self.env_var).ok();
        self.obtain_with_override(env_value.as_deref())
    }

    /// Obtain the session secret with an explicit override value.
    ///
    /// A non-empty override is returned unchanged and the secret file is not
    /// touched. An empty override counts as absent.
    pub fn obtain_with_override(&self, override_value: Option<&str>) -> ProvisionedSecret {
        if let Some(value) = override_value.filter(|v| !v.is_empty()) {
            info!(env = %self.env_var, "session secret: using environment override");
            return ProvisionedSecret {
                secret: SecretString::from(value.to_string()),
                source: SecretSource::Environment,
            };
        }

        match read_secret_file(&self.path) {
            Ok(Some(secret)) => {
                info!(path = %self.path.display(), "session secret: loaded from file");
                return ProvisionedSecret {
                    secret,
                    source: SecretSource::File,
                };
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no persisted session secret");
            }
            Err(e) => {
                warn!("{e}  (generating a new session secret)");
            }
        }

        let secret = generate_secret();
        let persisted = match persist_secret(&self.path, &secret) {
            Ok(()) => {
                info!(path = %self.path.display(), "session secret: generated and persisted");
                true
            }
            Err(e) => {
                warn!("{e}  (using in-memory secret; sessions will not survive a restart)");
                false
            }
        };

        ProvisionedSecret {
            secret,
            source: SecretSource::Generated { persisted },
        }
    }
}

/// Generate a fresh secret: 32 CSPRNG bytes as 64 lowercase hex characters.
pub fn generate_secret() -> SecretString {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let encoded = hex::encode(bytes);
    bytes.zeroize();
    SecretString::from(encoded)
}

/// Read the persisted secret. `Ok(None)` means the file does not exist.
fn read_secret_file(path: &Path) -> Result<Option<SecretString>, SecretFileError> {
    let mut content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SecretFileError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let trimmed = content.trim().to_string();
    content.zeroize();

    if trimmed.is_empty() {
        return Err(SecretFileError::Unreadable {
            path: path.to_path_buf(),
            reason: "file is empty".into(),
        });
    }
    Ok(Some(SecretString::from(trimmed)))
}

fn persist_secret(path: &Path, secret: &SecretString) -> Result<(), SecretFileError> {
    let persist_failed = |source| SecretFileError::PersistFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persist_failed)?;
    }

    let mut file = open_owner_only(path).map_err(persist_failed)?;
    file.write_all(secret.expose_secret().as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(persist_failed)
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a pre-existing (corrupt) file too
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
