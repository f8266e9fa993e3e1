use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Opaque user identifier issued by the login flow
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque session identifier, used for log correlation only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The password + salt pair needed to derive a user's file key.
///
/// Both halves are provisioned together by the login flow. A session either
/// holds the whole pair or nothing, so there is no way to represent "secret
/// without salt".
pub struct EncryptionMaterial {
    secret: SecretString,
    salt: String,
}

impl EncryptionMaterial {
    /// Pair up a secret and salt. Returns `None` if either half is missing
    /// or empty.
    pub fn from_parts(secret: Option<SecretString>, salt: Option<String>) -> Option<Self> {
        match (secret, salt) {
            (Some(secret), Some(salt))
                if !secret.expose_secret().is_empty() && !salt.is_empty() =>
            {
                Some(Self { secret, salt })
            }
            _ => None,
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }
}

impl fmt::Debug for EncryptionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionMaterial")
            .field("secret", &"[REDACTED]")
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

/// Server-side session state as seen by the credential gate.
///
/// Owned by the session subsystem; the gate only reads it.
#[derive(Debug)]
pub struct Session {
    pub session_id: SessionId,
    pub identity: Option<UserId>,
    pub display_name: Option<String>,
    pub encryption: Option<EncryptionMaterial>,
}

impl Session {
    /// A fresh session with no identity and no encryption material
    pub fn anonymous(session_id: SessionId) -> Self {
        Self {
            session_id,
            identity: None,
            display_name: None,
            encryption: None,
        }
    }

    /// Attach an identity (as the login flow does after password check)
    pub fn with_identity(mut self, identity: UserId, display_name: Option<String>) -> Self {
        self.identity = Some(identity);
        self.display_name = display_name;
        self
    }

    pub fn with_encryption(mut self, encryption: Option<EncryptionMaterial>) -> Self {
        self.encryption = encryption;
        self
    }

    /// An empty identity counts as no identity, as empty encryption halves do
    pub fn is_authenticated(&self) -> bool {
        self.identity.as_ref().is_some_and(|id| !id.as_str().is_empty())
    }

    pub fn is_encryption_ready(&self) -> bool {
        self.encryption.is_some()
    }
}
