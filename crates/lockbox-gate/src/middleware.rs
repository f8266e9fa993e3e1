//! axum middleware wiring the gate in front of route handlers
//!
//! On `Proceed` the resolved session is inserted as an
//! `Extension<Arc<Session>>` for handlers; on `Deny` the denial is rendered
//! as a 401 JSON response and the handler never runs.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::classify::RequestInfo;
use crate::decision::Decision;
use crate::gate::CredentialGate;
use crate::store::MemorySessionStore;

/// Shared state for [`credential_gate`]
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<CredentialGate>,
    pub sessions: Arc<MemorySessionStore>,
}

/// Gate middleware, for use with `axum::middleware::from_fn_with_state`.
pub async fn credential_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let info = request_info(&request);
    let session = state.sessions.resolve(request.headers()).await;

    match state.gate.authorize(&info, session.as_deref()) {
        Decision::Proceed => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Decision::Deny(denial) => denial.into_response(),
    }
}

/// Build the gate's view of a request
pub fn request_info(request: &Request) -> RequestInfo {
    let mut info = RequestInfo::new(request.method().clone(), request.uri().path());

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    if let Some(origin) = client_origin(request.headers(), peer) {
        info = info.with_origin(origin);
    }

    if let Some(ua) = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        info = info.with_user_agent(ua);
    }
    info
}

/// Caller address: the direct peer when known, otherwise the rightmost valid
/// `X-Forwarded-For` entry (the hop closest to us).
fn client_origin(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    if let Some(ip) = peer {
        return Some(ip.to_string());
    }
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.rsplit(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
        .map(str::to_string)
}
