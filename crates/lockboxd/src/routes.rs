//! HTTP routes behind the credential gate
//!
//! The middleware has already checked identity (and, for transfer routes,
//! encryption readiness) before any handler here runs, and observers have
//! seen that decision. Transfer handlers re-check readiness right before
//! touching file content without notifying observers again; the streaming
//! itself belongs to the storage backend and is not wired in this binary.

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use lockbox_core::Session;
use lockbox_gate::{credential_gate, encryption_readiness, Decision, GateState};

pub fn router(state: GateState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/session", get(session_info))
        .route("/files/upload", post(transfer))
        .route("/files/download/{name}", get(transfer))
        .layer(from_fn_with_state(state.clone(), credential_gate))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    user: String,
    display_name: Option<String>,
    encryption_ready: bool,
}

async fn index(Extension(session): Extension<Arc<Session>>) -> String {
    let name = session
        .display_name
        .clone()
        .or_else(|| session.identity.as_ref().map(|id| id.to_string()))
        .unwrap_or_default();
    format!("lockbox: signed in as {name}")
}

async fn session_info(Extension(session): Extension<Arc<Session>>) -> Json<SessionInfo> {
    Json(SessionInfo {
        user: session
            .identity
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        display_name: session.display_name.clone(),
        encryption_ready: session.is_encryption_ready(),
    })
}

async fn transfer(
    State(state): State<GateState>,
    Extension(session): Extension<Arc<Session>>,
) -> Response {
    if let Decision::Deny(denial) = encryption_readiness(&session, state.gate.login_url()) {
        return denial.into_response();
    }

    (
        StatusCode::NOT_IMPLEMENTED,
        Json(serde_json::json!({
            "error": "not_implemented",
            "message": "file transfer is handled by the storage backend",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use lockbox_core::config::GateConfig;
    use lockbox_core::{EncryptionMaterial, UserId};
    use lockbox_gate::{CredentialGate, MemorySessionStore};
    use lockbox_secrets::{SecretProvisioner, SessionSigner};
    use prometheus_client::registry::Registry;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::metrics::GateMetrics;

    fn state_with_gate(gate: CredentialGate) -> GateState {
        let secret = SecretProvisioner::new("UNUSED", "/nonexistent/.session_secret")
            .obtain_with_override(Some("routes-test"));
        GateState {
            gate: Arc::new(gate),
            sessions: Arc::new(MemorySessionStore::new(
                SessionSigner::new(&secret),
                "lockbox_session",
            )),
        }
    }

    fn state() -> GateState {
        state_with_gate(CredentialGate::new(&GateConfig::default()))
    }

    async fn cookie(state: &GateState, ready: bool) -> String {
        let material = ready
            .then(|| {
                EncryptionMaterial::from_parts(
                    Some(SecretString::from("pw".to_string())),
                    Some("salt".into()),
                )
            })
            .flatten();
        let session = Session::anonymous(MemorySessionStore::new_session_id())
            .with_identity(UserId::new("u1"), Some("User One".into()))
            .with_encryption(material);
        format!("lockbox_session={}", state.sessions.insert(session).await)
    }

    fn get(uri: &str, cookie: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_info_reports_readiness() {
        let state = state();
        let cookie = cookie(&state, false).await;

        let response = router(state)
            .oneshot(get("/api/session", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["user"], "u1");
        assert_eq!(json["encryption_ready"], false);
    }

    #[tokio::test]
    async fn test_index_greets_user() {
        let state = state();
        let cookie = cookie(&state, false).await;

        let response = router(state).oneshot(get("/", &cookie)).await.unwrap();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        assert_eq!(&body[..], b"lockbox: signed in as User One");
    }

    #[tokio::test]
    async fn test_download_reaches_transfer_when_ready() {
        let state = state();
        let cookie = cookie(&state, true).await;

        let response = router(state)
            .oneshot(get("/files/download/a.txt", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_download_blocked_when_not_ready() {
        let state = state();
        let cookie = cookie(&state, false).await;

        let response = router(state)
            .oneshot(get("/files/download/a.txt", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_transfer_counts_one_decision() {
        let mut registry = Registry::default();
        let metrics = GateMetrics::register(&mut registry);
        let state = state_with_gate(
            CredentialGate::new(&GateConfig::default()).with_observer(Arc::new(metrics.clone())),
        );
        let cookie = cookie(&state, true).await;

        let response = router(state)
            .oneshot(get("/files/download/a.txt", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(metrics.count("proceed", "download"), 1);
    }
}
