//! Cached authorized client derived from the credential store.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::identity::AccountIdentity;
use super::profile::ClientProfile;
use super::store::CredentialStore;
use super::token::CombinedCredential;

/// Capability to drop any client derived from a stored credential.
///
/// Handed to the login orchestrator and the revocation manager so every
/// credential change forces the next request to re-read the store.
pub trait ClientReset: Send + Sync {
    fn reset(&self);
}

/// Bearer tokens for one account slot, snapshot from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedClient {
    pub identity: AccountIdentity,
    credential: CombinedCredential,
}

impl AuthorizedClient {
    pub fn bearer(&self, profile: ClientProfile) -> Option<&str> {
        let token = &self.credential.get(profile).access_token;
        (!token.is_empty()).then_some(token.as_str())
    }

    pub fn expires_at(&self, profile: ClientProfile) -> DateTime<Utc> {
        self.credential.get(profile).expires_at
    }
}

/// Lazily built [`AuthorizedClient`] for one account slot.
pub struct AuthorizedClientCache {
    store: Arc<CredentialStore>,
    identity: AccountIdentity,
    cached: RwLock<Option<Arc<AuthorizedClient>>>,
}

impl AuthorizedClientCache {
    pub fn new(store: Arc<CredentialStore>, identity: AccountIdentity) -> Self {
        Self {
            store,
            identity,
            cached: RwLock::new(None),
        }
    }

    /// Cached client, or a fresh one from the store. `None` when signed out.
    pub fn client(&self) -> Option<Arc<AuthorizedClient>> {
        if let Some(client) = self
            .cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Some(client.clone());
        }

        let credential = self.store.get_credential(&self.identity);
        if credential.is_empty() {
            return None;
        }
        let client = Arc::new(AuthorizedClient {
            identity: self.identity.clone(),
            credential,
        });
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(client.clone());
        Some(client)
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl ClientReset for AuthorizedClientCache {
    fn reset(&self) {
        tracing::debug!(identity = %self.identity, "Resetting authorized client");
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
