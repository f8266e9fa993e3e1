//! Decision observers: side-effect-only hooks run after every gate decision
//!
//! Observers see the request, its category, the session and the decision.
//! They cannot change the outcome. `DiagnosticsLog` only ever records the
//! presence of credential material, never its value.

use lockbox_core::Session;
use tracing::{info, warn};

use crate::classify::{RequestInfo, ResourceCategory};
use crate::decision::Decision;

/// Longest user-agent prefix written to logs
pub const USER_AGENT_LOG_CHARS: usize = 64;

/// Hook invoked identically on every decision path
pub trait DecisionObserver: Send + Sync {
    fn observe(
        &self,
        request: &RequestInfo,
        category: ResourceCategory,
        session: Option<&Session>,
        decision: &Decision,
    );
}

/// Boolean view of what a session carries, safe to log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub session: bool,
    pub identity: bool,
    pub encryption_material: bool,
}

impl Presence {
    pub fn of(session: Option<&Session>) -> Self {
        Self {
            session: session.is_some(),
            identity: session.is_some_and(Session::is_authenticated),
            encryption_material: session.is_some_and(Session::is_encryption_ready),
        }
    }
}

/// Structured gate logging.
///
/// Denials are always logged at `warn`. With `verbose` set (development or
/// debug mode) every request is logged at `info` with presence flags and
/// truncated client metadata.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsLog {
    verbose: bool,
}

impl DiagnosticsLog {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl DecisionObserver for DiagnosticsLog {
    fn observe(
        &self,
        request: &RequestInfo,
        category: ResourceCategory,
        session: Option<&Session>,
        decision: &Decision,
    ) {
        let session_id = session.map(|s| s.session_id.as_str()).unwrap_or("-");

        if self.verbose {
            let presence = Presence::of(session);
            info!(
                method = %request.method,
                path = %request.path,
                category = category.as_str(),
                session_id,
                user = session.and_then(|s| s.display_name.as_deref()).unwrap_or("-"),
                has_session = presence.session,
                has_identity = presence.identity,
                has_encryption_material = presence.encryption_material,
                origin = request.origin.as_deref().unwrap_or("unknown"),
                user_agent = %truncate_user_agent(request.user_agent.as_deref()),
                outcome = decision.outcome(),
                "gate: request"
            );
        }

        if let Decision::Deny(denial) = decision {
            warn!(
                classification = denial.classification.as_str(),
                method = %request.method,
                path = %request.path,
                category = category.as_str(),
                session_id,
                "gate: request denied"
            );
        }
    }
}

/// Bounded, char-boundary-safe prefix of a user-agent string
pub fn truncate_user_agent(user_agent: Option<&str>) -> String {
    match user_agent {
        Some(ua) => ua.chars().take(USER_AGENT_LOG_CHARS).collect(),
        None => "-".into(),
    }
}
