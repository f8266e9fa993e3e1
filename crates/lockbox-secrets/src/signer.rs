//! Session token signing keyed by the provisioned secret

use secrecy::ExposeSecret;
use zeroize::Zeroize;

use lockbox_core::{LockboxError, LockboxResult, SessionId};

use crate::provision::ProvisionedSecret;

const KEY_CONTEXT: &str = "lockbox 2026-01 session token signing";

/// Signs session ids as `<id>.<hex blake3 mac>` and verifies them.
pub struct SessionSigner {
    key: [u8; 32],
}

impl SessionSigner {
    pub fn new(secret: &ProvisionedSecret) -> Self {
        let key = blake3::derive_key(KEY_CONTEXT, secret.secret().expose_secret().as_bytes());
        Self { key }
    }

    /// Produce the cookie token for a session id
    pub fn sign(&self, session_id: &SessionId) -> String {
        format!("{}.{}", session_id, self.mac(session_id.as_str()).to_hex())
    }

    /// Check a token's signature and return the session id it carries.
    pub fn verify(&self, token: &str) -> LockboxResult<SessionId> {
        let (id, mac_hex) = token
            .rsplit_once('.')
            .filter(|(id, _)| !id.is_empty())
            .ok_or_else(|| LockboxError::Session("malformed session token".into()))?;

        let presented = blake3::Hash::from_hex(mac_hex)
            .map_err(|_| LockboxError::Session("malformed session token signature".into()))?;

        // blake3::Hash equality is constant-time
        if presented != self.mac(id) {
            return Err(LockboxError::Session("session token signature mismatch".into()));
        }
        Ok(SessionId::new(id))
    }

    fn mac(&self, id: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, id.as_bytes())
    }
}

impl Drop for SessionSigner {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
