use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::device_code::{normalize_verification_url, DeviceGrant, PollOutcome, AUTHORIZATION_PENDING};
use super::error::AuthError;
use super::profile::{ClientProfile, ProfileSet};

const DEFAULT_DEVICE_CODE_URL: &str = "https://accounts.google.com/o/oauth2/device/code";
const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
const DEFAULT_REVOKE_URL: &str = "https://accounts.google.com/o/oauth2/revoke";
const DEFAULT_VERIFICATION_URL: &str = "youtube.com/activate";
const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device-authorization and token endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_device_code_url")]
    pub device_code_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_revoke_url")]
    pub revoke_url: String,
    /// Shown to the user when the server does not send a verification URL.
    #[serde(default = "default_verification_url")]
    pub verification_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            device_code_url: default_device_code_url(),
            token_url: default_token_url(),
            revoke_url: default_revoke_url(),
            verification_url: default_verification_url(),
        }
    }
}

/// Stateless request/response mapping onto the authorization server.
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Ask for a device code and user code for `profile`.
    async fn request_device_grant(&self, profile: ClientProfile) -> Result<DeviceGrant, AuthError>;

    /// Poll the token endpoint once.
    async fn poll_for_token(
        &self,
        profile: ClientProfile,
        device_code: &str,
    ) -> Result<PollOutcome, AuthError>;

    /// Revoke a refresh token. Callers treat failures as best-effort.
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
}

/// `reqwest`-backed [`AuthorizationClient`].
///
/// # Example
/// ```no_run
/// use duolink::auth::{ClientCredentials, OAuthDeviceClient, ProfileSet};
///
/// let profiles = ProfileSet {
///     primary: ClientCredentials::new("primary-id", "primary-secret"),
///     secondary: ClientCredentials::new("tv-id", "tv-secret"),
/// };
/// let client = OAuthDeviceClient::new(profiles)
///     .with_token_url("https://auth.example.com/token");
/// ```
pub struct OAuthDeviceClient {
    client: reqwest::Client,
    profiles: ProfileSet,
    endpoints: Endpoints,
}

impl OAuthDeviceClient {
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            client: reqwest::Client::new(),
            profiles,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.device_code_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.token_url = url.into();
        self
    }

    pub fn with_revoke_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.revoke_url = url.into();
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl AuthorizationClient for OAuthDeviceClient {
    async fn request_device_grant(&self, profile: ClientProfile) -> Result<DeviceGrant, AuthError> {
        let credentials = self.profiles.get(profile);
        let resp = self
            .client
            .post(&self.endpoints.device_code_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("scope", credentials.scope.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if let Some(error) = server_error(status, &body) {
            return Err(error);
        }
        let payload: DeviceCodeResponse = serde_json::from_str(&body)?;
        if let Some(code) = payload.error {
            return Err(AuthError::Server {
                status: status.as_u16(),
                message: payload.error_description.unwrap_or(code),
            });
        }
        let (device_code, user_code) = match (payload.device_code, payload.user_code) {
            (Some(device_code), Some(user_code)) => (device_code, user_code),
            _ => {
                return Err(AuthError::InvalidResponse(
                    "Device code response missing device_code or user_code".to_string(),
                ))
            }
        };
        let verification_url = normalize_verification_url(
            payload
                .verification_url
                .as_deref()
                .or(payload.verification_uri.as_deref()),
            &self.endpoints.verification_url,
        );
        tracing::debug!(
            profile = %profile,
            interval = ?payload.interval,
            "Device code issued"
        );
        Ok(DeviceGrant::new(
            device_code,
            user_code,
            verification_url,
            payload.interval,
        ))
    }

    async fn poll_for_token(
        &self,
        profile: ClientProfile,
        device_code: &str,
    ) -> Result<PollOutcome, AuthError> {
        let credentials = self.profiles.get(profile);
        let resp = self
            .client
            .post(&self.endpoints.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("device_code", device_code),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ])
            .send()
            .await?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(AuthError::Server {
                status: status.as_u16(),
                message: format!("Token request failed with status {status}"),
            });
        }
        let body: Value = serde_json::from_str(&resp.text().await?)?;
        tracing::debug!(
            profile = %profile,
            status = status.as_u16(),
            data = %redact_token_payload(&body),
            "Requesting access token"
        );
        let payload: TokenResponse = serde_json::from_value(body)?;
        map_token_response(status, payload)
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(&self.endpoints.revoke_url)
            .form(&[("token", refresh_token)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Server {
                status: status.as_u16(),
                message: format!("Revoke request failed with status {status}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_url: Option<String>,
    verification_uri: Option<String>,
    interval: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

fn map_token_response(status: StatusCode, payload: TokenResponse) -> Result<PollOutcome, AuthError> {
    if let Some(code) = payload.error {
        if code == AUTHORIZATION_PENDING {
            return Ok(PollOutcome::Pending);
        }
        let message = payload.error_description.unwrap_or_else(|| code.clone());
        return Ok(PollOutcome::Denied { code, message });
    }
    if !status.is_success() {
        return Err(AuthError::Server {
            status: status.as_u16(),
            message: format!("Token request failed with status {status}"),
        });
    }
    Ok(PollOutcome::Granted {
        access_token: payload.access_token.unwrap_or_default(),
        refresh_token: payload.refresh_token.unwrap_or_default(),
        expires_in: payload.expires_in,
    })
}

/// 5xx, or a non-JSON error body, is a transport failure.
fn server_error(status: StatusCode, body: &str) -> Option<AuthError> {
    if status.is_success() {
        return None;
    }
    if status.is_server_error() || serde_json::from_str::<Value>(body).is_err() {
        return Some(AuthError::Server {
            status: status.as_u16(),
            message: format!("Device code request failed with status {status}"),
        });
    }
    None
}

/// Copy of a token payload safe to log.
pub(crate) fn redact_token_payload(value: &Value) -> Value {
    let mut redacted = value.clone();
    if let Some(map) = redacted.as_object_mut() {
        for key in ["access_token", "refresh_token", "id_token"] {
            if let Some(slot) = map.get_mut(key) {
                *slot = Value::String("<redacted>".to_string());
            }
        }
    }
    redacted
}

fn default_device_code_url() -> String {
    DEFAULT_DEVICE_CODE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_revoke_url() -> String {
    DEFAULT_REVOKE_URL.to_string()
}

fn default_verification_url() -> String {
    DEFAULT_VERIFICATION_URL.to_string()
}
