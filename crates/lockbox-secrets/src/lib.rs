//! lockbox-secrets: the server-wide session-signing secret
//!
//! Provisioning chain (in order of precedence):
//!   1. $LOCKBOX_SESSION_SECRET  (literal secret, used unchanged)
//!   2. ./.session_secret        (persisted by a previous start)
//!   3. 32 fresh random bytes, hex-encoded and persisted to (2) with mode 0600
//!
//! The provisioned value feeds [`SessionSigner`], which signs and verifies
//! session tokens.

pub mod provision;
pub mod signer;

pub use provision::{ProvisionedSecret, SecretFileError, SecretProvisioner, SecretSource};
pub use signer::SessionSigner;
