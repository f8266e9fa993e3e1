//! In-memory session store keyed by signed cookie tokens
//!
//! The login flow (external) inserts sessions; the gate middleware resolves
//! them from the request's cookie. Token verification uses the
//! [`SessionSigner`] built from the provisioned secret, so tokens issued
//! before a restart stay valid as long as the secret persisted.

use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use lockbox_core::{Session, SessionId};
use lockbox_secrets::SessionSigner;

pub struct MemorySessionStore {
    signer: SessionSigner,
    cookie_name: String,
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl MemorySessionStore {
    pub fn new(signer: SessionSigner, cookie_name: impl Into<String>) -> Self {
        Self {
            signer,
            cookie_name: cookie_name.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh random session id for the login flow to build a session around
    pub fn new_session_id() -> SessionId {
        SessionId::new(uuid::Uuid::new_v4().to_string())
    }

    /// Store a session and return its signed cookie token
    pub async fn insert(&self, session: Session) -> String {
        let token = self.signer.sign(&session.session_id);
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), Arc::new(session));
        token
    }

    /// Drop a session (logout). Returns whether it existed.
    pub async fn remove(&self, session_id: &SessionId) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Resolve the session named by the request's cookie. Missing, forged,
    /// or unknown tokens all resolve to `None`.
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        let token = cookie_value(headers, &self.cookie_name)?;
        let session_id = match self.signer.verify(token) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("rejecting session cookie: {e}");
                return None;
            }
        };
        self.get(&session_id).await
    }

    /// `Set-Cookie` value for a token
    pub fn cookie_header(&self, token: &str) -> String {
        format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Strict",
            self.cookie_name
        )
    }
}

/// First cookie named `name` across all `Cookie` headers
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
