//! OAuth2 device-authorization login, credential storage and revocation.

pub mod cache;
pub mod client;
pub mod device_code;
pub mod error;
pub mod host;
pub mod identity;
pub mod login;
pub mod profile;
pub mod revocation;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use cache::{AuthorizedClient, AuthorizedClientCache, ClientReset};
pub use client::{AuthorizationClient, Endpoints, OAuthDeviceClient};
pub use device_code::{DeviceGrant, PollOutcome};
pub use error::AuthError;
pub use host::{DefaultStrings, Localizer, LoginUi, ProgressHandle, Sleeper, TokioSleeper};
pub use identity::AccountIdentity;
pub use login::{LoginHost, LoginOrchestrator, LoginOutcome};
pub use profile::{ClientCredentials, ClientProfile, ProfileSet};
pub use revocation::{LogoutReport, RevocationManager};
pub use service::AuthService;
pub use session::{DeviceFlowSession, LoginSettings, SessionEnd, SessionResult};
pub use store::{CredentialBackend, CredentialStore, FileCredentialBackend};
pub use token::{CombinedCredential, Credential};
