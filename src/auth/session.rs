//! One device-flow session: request a grant, then poll until a terminal state.

use bon::Builder;
use chrono::Utc;
use strum::Display;
use tracing::Instrument;
use uuid::Uuid;

use super::client::AuthorizationClient;
use super::device_code::{DeviceGrant, PollOutcome, POLL_WINDOW_SECS};
use super::error::AuthError;
use super::host::{keys, sign_in_text, Localizer, LoginUi, ProgressHandle, Sleeper};
use super::profile::ClientProfile;
use super::token::Credential;

pub const DEFAULT_APP_NAME: &str = "duolink";

/// Knobs shared by every session of a login.
///
/// # Example
/// ```
/// use duolink::auth::LoginSettings;
///
/// let settings = LoginSettings::builder()
///     .app_name("My TV App".to_string())
///     .abort_on_terminal_denial(true)
///     .build();
/// assert_eq!(settings.poll_window_secs, 600);
/// ```
#[derive(Debug, Clone, Builder, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginSettings {
    /// Prefix for denial notification titles.
    #[builder(default = DEFAULT_APP_NAME.to_string())]
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// End the session on `access_denied` / `expired_token` instead of polling on.
    #[builder(default)]
    #[serde(default)]
    pub abort_on_terminal_denial: bool,
    /// Wall-clock ceiling for one session; the poll budget is this divided by the interval.
    #[builder(default = POLL_WINDOW_SECS)]
    #[serde(default = "default_poll_window_secs")]
    pub poll_window_secs: u64,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How a session ended.
#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionEnd {
    Granted,
    /// The token endpoint granted access but returned neither token.
    EmptyGrant,
    Denied { code: String, message: String },
    TimedOut,
    Cancelled,
    TransportFailed(AuthError),
}

/// Outcome of one session. Every end other than `Granted` carries an empty credential.
#[derive(Debug)]
pub struct SessionResult {
    pub profile: ClientProfile,
    pub credential: Credential,
    pub end: SessionEnd,
    /// Token-endpoint requests made.
    pub polls: u32,
}

impl SessionResult {
    fn granted(profile: ClientProfile, credential: Credential, polls: u32) -> Self {
        Self {
            profile,
            credential,
            end: SessionEnd::Granted,
            polls,
        }
    }

    fn ended(profile: ClientProfile, end: SessionEnd, polls: u32) -> Self {
        Self {
            profile,
            credential: Credential::empty(),
            end,
            polls,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self.end, SessionEnd::Granted)
    }
}

/// Drives an [`AuthorizationClient`] through the device-flow state machine
/// for a single profile.
///
/// Polls are strictly sequential. Between polls the session waits on the
/// host [`Sleeper`]; it samples the progress dialog's cancel flag before
/// every poll and again before every wait, so a cancel lands within one
/// poll interval.
pub struct DeviceFlowSession<'a> {
    client: &'a dyn AuthorizationClient,
    ui: &'a dyn LoginUi,
    strings: &'a dyn Localizer,
    sleeper: &'a dyn Sleeper,
    settings: &'a LoginSettings,
}

impl<'a> DeviceFlowSession<'a> {
    pub fn new(
        client: &'a dyn AuthorizationClient,
        ui: &'a dyn LoginUi,
        strings: &'a dyn Localizer,
        sleeper: &'a dyn Sleeper,
        settings: &'a LoginSettings,
    ) -> Self {
        Self {
            client,
            ui,
            strings,
            sleeper,
            settings,
        }
    }

    pub async fn run(&self, profile: ClientProfile) -> SessionResult {
        let span = tracing::info_span!(
            "device_flow",
            profile = %profile,
            session = %Uuid::new_v4()
        );
        async move {
            let grant = match self.client.request_device_grant(profile).await {
                Ok(grant) => grant,
                Err(error) => {
                    tracing::error!(error = %error, "Device code request failed");
                    return SessionResult::ended(profile, SessionEnd::TransportFailed(error), 0);
                }
            };

            let heading = self.strings.localize(keys::SIGN_IN);
            let text = sign_in_text(self.strings, &grant.verification_url, &grant.user_code);
            let mut progress = self.ui.create_progress(&heading, &text);
            let result = self.poll(profile, &grant, progress.as_mut()).await;
            progress.close();

            tracing::debug!(
                end = %result.end,
                polls = result.polls,
                access_token = !result.credential.access_token.is_empty(),
                refresh_token = !result.credential.refresh_token.is_empty(),
                expires_at = %result.credential.expires_at,
                "Device flow finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn poll(
        &self,
        profile: ClientProfile,
        grant: &DeviceGrant,
        progress: &mut dyn ProgressHandle,
    ) -> SessionResult {
        let budget = grant.poll_budget(self.settings.poll_window_secs);
        progress.set_total(budget);
        tracing::debug!(
            interval_secs = grant.poll_interval.as_secs(),
            budget,
            "Polling token endpoint"
        );

        let mut polls = 0;
        let mut remaining = budget;
        while remaining > 0 {
            remaining -= 1;
            if progress.is_cancelled() {
                return SessionResult::ended(profile, SessionEnd::Cancelled, polls);
            }

            progress.update();
            polls += 1;
            match self.client.poll_for_token(profile, &grant.device_code).await {
                Err(error) => {
                    tracing::error!(attempt = polls, error = %error, "Token request failed");
                    return SessionResult::ended(profile, SessionEnd::TransportFailed(error), polls);
                }
                Ok(PollOutcome::Granted {
                    access_token,
                    refresh_token,
                    expires_in,
                }) => {
                    let credential =
                        Credential::issued(access_token, refresh_token, expires_in, Utc::now());
                    if credential.is_empty() {
                        tracing::warn!(attempt = polls, "Token endpoint granted no tokens");
                        return SessionResult {
                            profile,
                            credential,
                            end: SessionEnd::EmptyGrant,
                            polls,
                        };
                    }
                    return SessionResult::granted(profile, credential, polls);
                }
                Ok(PollOutcome::Pending) => {}
                Ok(denied @ PollOutcome::Denied { .. }) => {
                    let terminal = denied.is_terminal_denial();
                    if let PollOutcome::Denied { code, message } = denied {
                        self.report_denial(&message);
                        if terminal && self.settings.abort_on_terminal_denial {
                            return SessionResult::ended(
                                profile,
                                SessionEnd::Denied { code, message },
                                polls,
                            );
                        }
                    }
                }
            }

            if progress.is_cancelled() {
                return SessionResult::ended(profile, SessionEnd::Cancelled, polls);
            }
            self.sleeper.sleep(grant.poll_interval).await;
        }

        tracing::debug!(polls, "Poll budget exhausted");
        SessionResult::ended(profile, SessionEnd::TimedOut, polls)
    }

    fn report_denial(&self, message: &str) {
        let title = format!("{}: {}", self.settings.app_name, message);
        self.ui.show_notification(&title, message);
        tracing::error!(error = %message, "Error requesting access token");
    }
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_poll_window_secs() -> u64 {
    POLL_WINDOW_SECS
}
