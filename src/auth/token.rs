use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::profile::ClientProfile;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Access/refresh token pair issued to one client profile.
///
/// A credential with both tokens empty is the "no credential" value.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use duolink::auth::Credential;
///
/// let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let credential = Credential::issued("access", "refresh", Some(3600), issued_at);
/// assert_eq!(credential.expires_at.timestamp(), 1_700_003_600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn empty() -> Self {
        Self {
            access_token: String::new(),
            refresh_token: String::new(),
            expires_at: DateTime::<Utc>::default(),
        }
    }

    /// Build a credential from a token-endpoint grant received at `now`.
    ///
    /// The expiry is relative to `now`; a grant with no tokens at all is
    /// expired immediately regardless of the reported lifetime.
    pub fn issued(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        let expires_at = if access_token.is_empty() && refresh_token.is_empty() {
            now
        } else {
            expiry_after(now, expires_in.unwrap_or(DEFAULT_LIFETIME_SECS))
        };
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// `now + lifetime_secs`, falling back to the default lifetime when the
/// server-reported value does not fit a timestamp.
fn expiry_after(now: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(lifetime_secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| {
            tracing::warn!(expires_in = lifetime_secs, "Unusable token lifetime, using default");
            Duration::try_seconds(DEFAULT_LIFETIME_SECS)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .unwrap_or(now)
        })
}

impl Default for Credential {
    fn default() -> Self {
        Self::empty()
    }
}

/// Credentials from both sessions of one login, stored as a unit.
///
/// The pairing is positional: secondary first, primary second. Refresh logic
/// downstream relies on that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedCredential {
    pub secondary: Credential,
    pub primary: Credential,
}

impl CombinedCredential {
    pub fn new(secondary: Credential, primary: Credential) -> Self {
        Self { secondary, primary }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, profile: ClientProfile) -> &Credential {
        match profile {
            ClientProfile::Primary => &self.primary,
            ClientProfile::Secondary => &self.secondary,
        }
    }

    /// Both credentials in login order.
    pub fn ordered(&self) -> [&Credential; 2] {
        [&self.secondary, &self.primary]
    }

    /// Non-empty refresh tokens in login order. May contain duplicates.
    pub fn refresh_tokens(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .filter(|credential| !credential.refresh_token.is_empty())
            .map(|credential| credential.refresh_token.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.secondary.is_empty() && self.primary.is_empty()
    }

    /// Expired as soon as either half is.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.secondary.is_expired(now) || self.primary.is_expired(now)
    }
}
