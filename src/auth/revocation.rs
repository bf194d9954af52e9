use std::collections::HashSet;
use std::sync::Arc;

use super::cache::ClientReset;
use super::client::AuthorizationClient;
use super::identity::AccountIdentity;
use super::store::CredentialStore;

/// Summary of one logout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutReport {
    pub revoked: usize,
    pub failed: usize,
}

/// Best-effort revocation followed by an unconditional clear.
///
/// A dead authorization server can never block a logout: revoke failures are
/// logged and skipped, and the slot is emptied regardless.
#[derive(Clone)]
pub struct RevocationManager {
    client: Arc<dyn AuthorizationClient>,
    store: Arc<CredentialStore>,
    reset: Arc<dyn ClientReset>,
}

impl RevocationManager {
    pub fn new(
        client: Arc<dyn AuthorizationClient>,
        store: Arc<CredentialStore>,
        reset: Arc<dyn ClientReset>,
    ) -> Self {
        Self {
            client,
            store,
            reset,
        }
    }

    pub async fn logout(&self, identity: &AccountIdentity) -> LogoutReport {
        let mut report = LogoutReport::default();
        let mut seen = HashSet::new();
        for token in self.store.refresh_tokens(identity) {
            if !seen.insert(token.clone()) {
                continue;
            }
            match self.client.revoke(&token).await {
                Ok(()) => report.revoked += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::debug!(identity = %identity, error = %error, "Refresh token revoke failed");
                }
            }
        }

        if let Err(error) = self.store.clear(identity) {
            tracing::error!(identity = %identity, error = %error, "Failed to persist cleared credential");
        }
        self.reset.reset();
        tracing::info!(
            identity = %identity,
            revoked = report.revoked,
            failed = report.failed,
            "Signed out"
        );
        report
    }
}
