//! Gate decisions and the denial payload handed to the rendering layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No session, or a session without an identity
    Unauthenticated,
    /// Logged in, but the session lacks the secret + salt for the file key
    EncryptionNotReady,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::EncryptionNotReady => "encryption_not_ready",
        }
    }
}

/// A classified, user-actionable denial. Never carries secret values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    #[serde(rename = "error")]
    pub classification: Classification,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_detail: Option<String>,
    /// Whether the client should offer a login affordance
    pub show_login: bool,
    pub login_url: String,
}

impl Denial {
    pub fn unauthenticated(login_url: &str) -> Self {
        Self {
            classification: Classification::Unauthenticated,
            message: "You need to log in to access your files.".into(),
            action: "Log in to continue.".into(),
            technical_detail: None,
            show_login: true,
            login_url: login_url.into(),
        }
    }

    pub fn encryption_not_ready(login_url: &str) -> Self {
        Self {
            classification: Classification::EncryptionNotReady,
            message: "Your session does not have access to your encryption key.".into(),
            action: "Log out and log back in with your original password to restore access to \
                     your encrypted files."
                .into(),
            technical_detail: Some(
                "The session is authenticated, but it holds no encryption secret and salt, so \
                 the file key cannot be derived. This is not an authentication failure: the \
                 session was created by a login that did not supply the password material \
                 (for example on another device), or that material expired separately from \
                 the identity."
                    .into(),
            ),
            show_login: true,
            login_url: login_url.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Deny(Denial),
}

impl Decision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Proceed => None,
            Self::Deny(denial) => Some(denial),
        }
    }

    pub fn classification(&self) -> Option<Classification> {
        self.denial().map(|d| d.classification)
    }

    /// Stable label for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Deny(denial) => denial.classification.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_json_shape() {
        let json = serde_json::to_value(Denial::unauthenticated("/login")).unwrap();
        assert_eq!(json["error"], "unauthenticated");
        assert_eq!(json["show_login"], true);
        assert_eq!(json["login_url"], "/login");
        assert!(json.get("technical_detail").is_none());
    }

    #[test]
    fn test_encryption_not_ready_explains_difference() {
        let denial = Denial::encryption_not_ready("/login");
        let json = serde_json::to_value(&denial).unwrap();
        assert_eq!(json["error"], "encryption_not_ready");
        assert!(denial.action.contains("log back in"));
        assert!(denial
            .technical_detail
            .as_deref()
            .unwrap()
            .contains("not an authentication failure"));
    }

    #[test]
    fn test_denials_are_unauthorized() {
        for d in [
            Denial::unauthenticated("/login"),
            Denial::encryption_not_ready("/login"),
        ] {
            assert_eq!(d.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Decision::Proceed.outcome(), "proceed");
        assert_eq!(
            Decision::Deny(Denial::encryption_not_ready("/login")).outcome(),
            "encryption_not_ready"
        );
        assert_eq!(Decision::Proceed.classification(), None);
    }
}
