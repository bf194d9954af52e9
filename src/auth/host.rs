//! Interfaces the login engine consumes from its host.
//!
//! Rendering, localization and the wait between polls belong to the host.
//! The engine only calls these traits and never owns UI state.

use std::time::Duration;

use async_trait::async_trait;

/// Localization keys used by the login flow.
pub mod keys {
    pub const SIGN_IN: &str = "sign.in";
    pub const SIGN_GO_TO: &str = "sign.go_to";
    pub const SIGN_ENTER_CODE: &str = "sign.enter_code";
    pub const SIGN_TWICE_TITLE: &str = "sign.twice.title";
    pub const SIGN_TWICE_TEXT: &str = "sign.twice.text";
    pub const SIGN_NO_TOKENS: &str = "sign.no_tokens";
}

/// User-facing notifications and dialogs.
pub trait LoginUi: Send + Sync {
    fn show_message(&self, text: &str);

    /// Transient notification; used for server-reported denials.
    fn show_notification(&self, title: &str, text: &str);

    /// Modal acknowledgement dialog.
    fn confirm(&self, title: &str, text: &str);

    fn create_progress(&self, heading: &str, text: &str) -> Box<dyn ProgressHandle>;

    /// Ask the host to re-render after a credential change.
    fn refresh_view(&self);
}

/// Progress dialog owned by the host.
///
/// `is_cancelled` is a pull-based read of host state; the session samples it
/// once per poll iteration.
pub trait ProgressHandle: Send {
    fn set_total(&mut self, total: u32);
    fn update(&mut self);
    fn is_cancelled(&self) -> bool;
    fn close(&mut self);
}

pub trait Localizer: Send + Sync {
    fn localize(&self, key: &str) -> String;
}

/// Suspension between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Built-in English strings. Unknown keys are returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStrings;

impl Localizer for DefaultStrings {
    fn localize(&self, key: &str) -> String {
        let text = match key {
            keys::SIGN_IN => "Sign in",
            keys::SIGN_GO_TO => "Go to",
            keys::SIGN_ENTER_CODE => "and enter the code",
            keys::SIGN_TWICE_TITLE => "Two sign-ins required",
            keys::SIGN_TWICE_TEXT => {
                "You will be asked to sign in twice. Both sign-ins are needed to access your account."
            }
            keys::SIGN_NO_TOKENS => "The sign-in did not return any tokens. Please sign in again.",
            other => other,
        };
        text.to_string()
    }
}

/// Text of the sign-in progress dialog.
pub(crate) fn sign_in_text(strings: &dyn Localizer, verification_url: &str, user_code: &str) -> String {
    format!(
        "{} {}\n{} {}",
        strings.localize(keys::SIGN_GO_TO),
        verification_url,
        strings.localize(keys::SIGN_ENTER_CODE),
        user_code
    )
}
