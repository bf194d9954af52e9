//! Convenience re-exports for common use.

pub use crate::auth::{
    AccountIdentity, AuthService, ClientProfile, CombinedCredential, Credential, LoginHost,
    LoginOutcome, LoginSettings, SessionEnd,
};
pub use crate::config::DuolinkConfig;
pub use crate::error::{DuolinkError, Result};
