pub mod config;
pub mod error;
pub mod types;

pub use error::{LockboxError, LockboxResult};
pub use types::{EncryptionMaterial, Session, SessionId, UserId};
