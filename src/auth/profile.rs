//! OAuth client profiles used by the two device-flow sessions.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Which registered OAuth client a device-flow session runs against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClientProfile {
    /// The main application client.
    Primary,
    /// The "TV" client; always signed in first.
    Secondary,
}

impl ClientProfile {
    /// Order in which a login runs the sessions. Stored pairs follow it too.
    pub const LOGIN_ORDER: [ClientProfile; 2] = [ClientProfile::Secondary, ClientProfile::Primary];
}

/// Client id, secret and scope registered for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for ClientCredentials {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: default_scope(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

/// Credentials for both profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default)]
    pub primary: ClientCredentials,
    #[serde(default)]
    pub secondary: ClientCredentials,
}

impl ProfileSet {
    pub fn get(&self, profile: ClientProfile) -> &ClientCredentials {
        match profile {
            ClientProfile::Primary => &self.primary,
            ClientProfile::Secondary => &self.secondary,
        }
    }

    pub fn get_mut(&mut self, profile: ClientProfile) -> &mut ClientCredentials {
        match profile {
            ClientProfile::Primary => &mut self.primary,
            ClientProfile::Secondary => &mut self.secondary,
        }
    }
}

pub(crate) const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}
