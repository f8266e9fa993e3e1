//! The credential gate: identity check, then encryption readiness for file I/O

use std::sync::Arc;

use lockbox_core::config::GateConfig;
use lockbox_core::Session;

use crate::classify::{RequestClassifier, RequestInfo, ResourceCategory};
use crate::decision::{Decision, Denial};
use crate::diagnostics::DecisionObserver;

/// Request-time authorization filter.
///
/// Holds only read-only configuration, so one instance is shared across all
/// in-flight requests without locking.
pub struct CredentialGate {
    classifier: RequestClassifier,
    login_url: String,
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl CredentialGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            classifier: RequestClassifier::from_config(config),
            login_url: config.login_path.clone(),
            observers: Vec::new(),
        }
    }

    /// Register an observer notified after every decision
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn classify(&self, request: &RequestInfo) -> ResourceCategory {
        self.classifier.classify(&request.path)
    }

    /// Decide whether `request` may reach its handler.
    ///
    /// 1. No session or no identity: `Unauthenticated`.
    /// 2. Upload/download without encryption material: `EncryptionNotReady`.
    /// 3. Otherwise `Proceed`.
    pub fn authorize(&self, request: &RequestInfo, session: Option<&Session>) -> Decision {
        let category = self.classify(request);

        let decision = match session.filter(|s| s.is_authenticated()) {
            None => Decision::Deny(Denial::unauthenticated(&self.login_url)),
            Some(session) if category.is_encryption_sensitive() => {
                encryption_readiness(session, &self.login_url)
            }
            Some(_) => Decision::Proceed,
        };

        self.notify(request, category, session, &decision);
        decision
    }

    /// Encryption-readiness check alone, for callers that established identity
    /// some other way. Does not look at the identity.
    pub fn require_encryption_ready(&self, request: &RequestInfo, session: &Session) -> Decision {
        let decision = encryption_readiness(session, &self.login_url);
        self.notify(request, self.classify(request), Some(session), &decision);
        decision
    }

    fn notify(
        &self,
        request: &RequestInfo,
        category: ResourceCategory,
        session: Option<&Session>,
        decision: &Decision,
    ) {
        for observer in &self.observers {
            observer.observe(request, category, session, decision);
        }
    }
}

/// Pure readiness test: the session must hold the secret + salt pair.
pub fn encryption_readiness(session: &Session, login_url: &str) -> Decision {
    if session.is_encryption_ready() {
        Decision::Proceed
    } else {
        Decision::Deny(Denial::encryption_not_ready(login_url))
    }
}
