//! lockbox-gate: request-time credential gate
//!
//! Every request is classified by the resource it touches. Navigation and
//! metadata requests need only an identity; uploads and downloads also need
//! the session's encryption material, without which the user's file key
//! cannot be derived.
//!
//! ```text
//! request ──▶ classify ──▶ identity? ──no──▶ Deny(Unauthenticated)
//!                             │yes
//!                             ▼
//!                   encryption-sensitive? ──no──▶ Proceed
//!                             │yes
//!                             ▼
//!                 secret + salt present? ──no──▶ Deny(EncryptionNotReady)
//!                             │yes
//!                             ▼
//!                          Proceed
//! ```

pub mod classify;
pub mod decision;
pub mod diagnostics;
pub mod gate;
pub mod middleware;
pub mod store;

pub use classify::{RequestClassifier, RequestInfo, ResourceCategory};
pub use decision::{Classification, Decision, Denial};
pub use diagnostics::{DecisionObserver, DiagnosticsLog};
pub use gate::{encryption_readiness, CredentialGate};
pub use middleware::{credential_gate, GateState};
pub use store::MemorySessionStore;
