//! Dual-session login: the secondary ("TV") profile first, then the primary
//! profile, committed together or not at all.

use std::sync::Arc;

use super::cache::ClientReset;
use super::client::AuthorizationClient;
use super::error::AuthError;
use super::host::{keys, Localizer, LoginUi, Sleeper};
use super::identity::AccountIdentity;
use super::profile::ClientProfile;
use super::revocation::RevocationManager;
use super::session::{DeviceFlowSession, LoginSettings, SessionEnd};
use super::store::CredentialStore;
use super::token::{CombinedCredential, Credential};

/// Result of a login that did not fail on transport.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Both sessions granted; the pair is now stored.
    Completed(CombinedCredential),
    /// A session ended without a grant; the slot was cleared.
    NotCompleted {
        profile: ClientProfile,
        end: SessionEnd,
    },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Why the two-session sequence stopped early.
enum LoginStop {
    NotCompleted {
        profile: ClientProfile,
        end: SessionEnd,
    },
    Transport {
        profile: ClientProfile,
        error: AuthError,
    },
}

/// Host collaborators a login needs.
#[derive(Clone)]
pub struct LoginHost {
    pub ui: Arc<dyn LoginUi>,
    pub strings: Arc<dyn Localizer>,
    pub sleeper: Arc<dyn Sleeper>,
}

pub struct LoginOrchestrator {
    client: Arc<dyn AuthorizationClient>,
    store: Arc<CredentialStore>,
    reset: Arc<dyn ClientReset>,
    host: LoginHost,
    settings: LoginSettings,
    revocation: RevocationManager,
}

impl LoginOrchestrator {
    pub fn new(
        client: Arc<dyn AuthorizationClient>,
        store: Arc<CredentialStore>,
        reset: Arc<dyn ClientReset>,
        host: LoginHost,
        settings: LoginSettings,
    ) -> Self {
        let revocation = RevocationManager::new(client.clone(), store.clone(), reset.clone());
        Self {
            client,
            store,
            reset,
            host,
            settings,
            revocation,
        }
    }

    /// Run both device-flow sessions for `identity`.
    ///
    /// Only a joint grant writes to the store. A session that ends without a
    /// grant clears the slot and returns [`LoginOutcome::NotCompleted`]; a
    /// transport failure signs the slot out and is returned as the error.
    pub async fn login(&self, identity: &AccountIdentity) -> Result<LoginOutcome, AuthError> {
        let ui = self.host.ui.as_ref();
        ui.confirm(
            &self.host.strings.localize(keys::SIGN_TWICE_TITLE),
            &self.host.strings.localize(keys::SIGN_TWICE_TEXT),
        );

        match self.sign_in_both().await {
            Ok(combined) => {
                if let Err(error) = self.store.replace(identity, combined.clone()) {
                    tracing::error!(identity = %identity, error = %error, "Failed to persist credential");
                }
                self.reset.reset();
                ui.refresh_view();
                tracing::info!(identity = %identity, "Signed in");
                Ok(LoginOutcome::Completed(combined))
            }
            Err(LoginStop::NotCompleted { profile, end }) => {
                tracing::info!(identity = %identity, profile = %profile, end = %end, "Login not completed");
                if matches!(end, SessionEnd::EmptyGrant) {
                    ui.show_message(&self.host.strings.localize(keys::SIGN_NO_TOKENS));
                }
                self.reset.reset();
                if let Err(error) = self.store.clear(identity) {
                    tracing::error!(identity = %identity, error = %error, "Failed to persist cleared credential");
                }
                ui.refresh_view();
                Ok(LoginOutcome::NotCompleted { profile, end })
            }
            Err(LoginStop::Transport { profile, error }) => {
                tracing::error!(identity = %identity, profile = %profile, error = %error, "Login failed");
                let message = error.to_string();
                ui.show_notification(&format!("{}: {}", self.settings.app_name, message), &message);
                self.revocation.logout(identity).await;
                Err(error)
            }
        }
    }

    async fn sign_in_both(&self) -> Result<CombinedCredential, LoginStop> {
        let secondary = self.sign_in(ClientProfile::Secondary).await?;
        let primary = self.sign_in(ClientProfile::Primary).await?;
        Ok(CombinedCredential::new(secondary, primary))
    }

    async fn sign_in(&self, profile: ClientProfile) -> Result<Credential, LoginStop> {
        let session = DeviceFlowSession::new(
            self.client.as_ref(),
            self.host.ui.as_ref(),
            self.host.strings.as_ref(),
            self.host.sleeper.as_ref(),
            &self.settings,
        );
        let result = session.run(profile).await;
        match result.end {
            SessionEnd::Granted if result.credential.is_empty() => Err(LoginStop::NotCompleted {
                profile,
                end: SessionEnd::EmptyGrant,
            }),
            SessionEnd::Granted => Ok(result.credential),
            SessionEnd::TransportFailed(error) => Err(LoginStop::Transport { profile, error }),
            end => Err(LoginStop::NotCompleted { profile, end }),
        }
    }
}
