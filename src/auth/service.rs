use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::cache::{AuthorizedClient, AuthorizedClientCache};
use super::client::{AuthorizationClient, OAuthDeviceClient};
use super::error::AuthError;
use super::identity::AccountIdentity;
use super::login::{LoginHost, LoginOrchestrator, LoginOutcome};
use super::revocation::{LogoutReport, RevocationManager};
use super::session::LoginSettings;
use super::store::{CredentialStore, FileCredentialBackend};
use super::token::CombinedCredential;
use crate::config::DuolinkConfig;

/// Facade the host talks to: login, logout and credential reads.
///
/// Holds one [`AuthorizedClientCache`] per account slot and hands the
/// matching one to every login and logout as its reset capability.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use duolink::auth::{AccountIdentity, AuthService, DefaultStrings, LoginHost, TokioSleeper};
/// use duolink::config::DuolinkConfig;
/// # fn ui() -> Arc<dyn duolink::auth::LoginUi> { unimplemented!() }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let host = LoginHost {
///     ui: ui(),
///     strings: Arc::new(DefaultStrings),
///     sleeper: Arc::new(TokioSleeper),
/// };
/// let service = AuthService::from_config(&DuolinkConfig::load()?, host);
/// let outcome = service.login(&AccountIdentity::Default).await?;
/// println!("signed in: {}", outcome.is_success());
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    client: Arc<dyn AuthorizationClient>,
    store: Arc<CredentialStore>,
    host: LoginHost,
    settings: LoginSettings,
    caches: Mutex<HashMap<AccountIdentity, Arc<AuthorizedClientCache>>>,
}

impl AuthService {
    pub fn new(
        client: Arc<dyn AuthorizationClient>,
        store: Arc<CredentialStore>,
        host: LoginHost,
        settings: LoginSettings,
    ) -> Self {
        Self {
            client,
            store,
            host,
            settings,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Wire the reqwest client and file-backed store from configuration.
    pub fn from_config(config: &DuolinkConfig, host: LoginHost) -> Self {
        let client = OAuthDeviceClient::new(config.profiles.clone())
            .with_endpoints(config.endpoints.clone());
        let backend = FileCredentialBackend::new(config.store_dir.clone());
        Self::new(
            Arc::new(client),
            Arc::new(CredentialStore::new(Arc::new(backend))),
            host,
            config.login.clone(),
        )
    }

    pub async fn login(&self, identity: &AccountIdentity) -> Result<LoginOutcome, AuthError> {
        let orchestrator = LoginOrchestrator::new(
            self.client.clone(),
            self.store.clone(),
            self.cache_for(identity),
            self.host.clone(),
            self.settings.clone(),
        );
        orchestrator.login(identity).await
    }

    /// Sign out `identity` (the default account when `None`) and refresh the view.
    pub async fn logout(&self, identity: Option<&AccountIdentity>) -> LogoutReport {
        let identity = identity.cloned().unwrap_or_default();
        let revocation =
            RevocationManager::new(self.client.clone(), self.store.clone(), self.cache_for(&identity));
        let report = revocation.logout(&identity).await;
        self.host.ui.refresh_view();
        report
    }

    pub fn get_credential(&self, identity: &AccountIdentity) -> CombinedCredential {
        self.store.get_credential(identity)
    }

    /// Client derived from the stored credential, rebuilt after any change.
    pub fn authorized_client(&self, identity: &AccountIdentity) -> Option<Arc<AuthorizedClient>> {
        self.cache_for(identity).client()
    }

    pub fn flush(&self) -> Result<(), AuthError> {
        self.store.flush()
    }

    fn cache_for(&self, identity: &AccountIdentity) -> Arc<AuthorizedClientCache> {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identity.clone())
            .or_insert_with(|| {
                Arc::new(AuthorizedClientCache::new(self.store.clone(), identity.clone()))
            })
            .clone()
    }
}
