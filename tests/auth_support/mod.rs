#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use duolink::auth::{
    AccountIdentity, AuthError, AuthorizationClient, ClientProfile, ClientReset, CombinedCredential,
    Credential, CredentialBackend, DefaultStrings, DeviceGrant, LoginHost, LoginUi, PollOutcome,
    ProgressHandle, Sleeper,
};

// ---------------------------------------------------------------------------
// Authorization client
// ---------------------------------------------------------------------------

/// Replays scripted responses per profile. Polls past the script are `Pending`.
#[derive(Default)]
pub struct ScriptedClient {
    grants: Mutex<HashMap<ClientProfile, Result<DeviceGrant, AuthError>>>,
    polls: Mutex<HashMap<ClientProfile, VecDeque<Result<PollOutcome, AuthError>>>>,
    grant_requests: Mutex<Vec<ClientProfile>>,
    poll_calls: Mutex<Vec<ClientProfile>>,
    revoked: Mutex<Vec<String>>,
    fail_revokes: AtomicBool,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(self, profile: ClientProfile, interval_secs: u64) -> Self {
        let grant = DeviceGrant::new(
            format!("device-{profile}"),
            format!("CODE-{profile}"),
            "example.com/device",
            Some(interval_secs),
        );
        self.grants.lock().unwrap().insert(profile, Ok(grant));
        self
    }

    pub fn with_grant_error(self, profile: ClientProfile, error: AuthError) -> Self {
        self.grants.lock().unwrap().insert(profile, Err(error));
        self
    }

    pub fn with_polls(
        self,
        profile: ClientProfile,
        outcomes: Vec<Result<PollOutcome, AuthError>>,
    ) -> Self {
        self.polls
            .lock()
            .unwrap()
            .insert(profile, outcomes.into_iter().collect());
        self
    }

    pub fn failing_revokes(self) -> Self {
        self.fail_revokes.store(true, Ordering::SeqCst);
        self
    }

    pub fn grant_requests(&self) -> Vec<ClientProfile> {
        self.grant_requests.lock().unwrap().clone()
    }

    pub fn poll_count(&self, profile: ClientProfile) -> usize {
        self.poll_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == profile)
            .count()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthorizationClient for ScriptedClient {
    async fn request_device_grant(&self, profile: ClientProfile) -> Result<DeviceGrant, AuthError> {
        self.grant_requests.lock().unwrap().push(profile);
        match self.grants.lock().unwrap().remove(&profile) {
            Some(result) => result,
            None => Ok(DeviceGrant::new(
                format!("device-{profile}"),
                format!("CODE-{profile}"),
                "example.com/device",
                Some(5),
            )),
        }
    }

    async fn poll_for_token(
        &self,
        profile: ClientProfile,
        device_code: &str,
    ) -> Result<PollOutcome, AuthError> {
        assert_eq!(device_code, format!("device-{profile}"));
        self.poll_calls.lock().unwrap().push(profile);
        self.polls
            .lock()
            .unwrap()
            .get_mut(&profile)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(PollOutcome::Pending))
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.revoked.lock().unwrap().push(refresh_token.to_string());
        if self.fail_revokes.load(Ordering::SeqCst) {
            return Err(AuthError::Network("revoke endpoint unreachable".to_string()));
        }
        Ok(())
    }
}

pub fn granted(access: &str, refresh: &str, expires_in: Option<i64>) -> Result<PollOutcome, AuthError> {
    Ok(PollOutcome::Granted {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in,
    })
}

pub fn denied(code: &str) -> Result<PollOutcome, AuthError> {
    Ok(PollOutcome::Denied {
        code: code.to_string(),
        message: code.to_string(),
    })
}

pub fn pending() -> Result<PollOutcome, AuthError> {
    Ok(PollOutcome::Pending)
}

// ---------------------------------------------------------------------------
// Host UI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Message(String),
    Notification { title: String, text: String },
    Confirm { title: String, text: String },
    ProgressOpened { heading: String, text: String },
    ProgressTotal(u32),
    ProgressUpdated,
    ProgressClosed,
    RefreshView,
}

/// Records every UI call. Cancellation is either a flag or a paused-clock deadline.
#[derive(Default)]
pub struct RecordingUi {
    events: Arc<Mutex<Vec<UiEvent>>>,
    cancelled: Arc<AtomicBool>,
    cancel_at: Mutex<Option<tokio::time::Instant>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancel_after(&self, delay: Duration) {
        *self.cancel_at.lock().unwrap() = Some(tokio::time::Instant::now() + delay);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &UiEvent) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notification { title, text } => Some((title, text)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl LoginUi for RecordingUi {
    fn show_message(&self, text: &str) {
        self.push(UiEvent::Message(text.to_string()));
    }

    fn show_notification(&self, title: &str, text: &str) {
        self.push(UiEvent::Notification {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn confirm(&self, title: &str, text: &str) {
        self.push(UiEvent::Confirm {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn create_progress(&self, heading: &str, text: &str) -> Box<dyn ProgressHandle> {
        self.push(UiEvent::ProgressOpened {
            heading: heading.to_string(),
            text: text.to_string(),
        });
        Box::new(RecordingProgress {
            events: self.events.clone(),
            cancelled: self.cancelled.clone(),
            cancel_at: *self.cancel_at.lock().unwrap(),
        })
    }

    fn refresh_view(&self) {
        self.push(UiEvent::RefreshView);
    }
}

struct RecordingProgress {
    events: Arc<Mutex<Vec<UiEvent>>>,
    cancelled: Arc<AtomicBool>,
    cancel_at: Option<tokio::time::Instant>,
}

impl ProgressHandle for RecordingProgress {
    fn set_total(&mut self, total: u32) {
        self.events.lock().unwrap().push(UiEvent::ProgressTotal(total));
    }

    fn update(&mut self) {
        self.events.lock().unwrap().push(UiEvent::ProgressUpdated);
    }

    fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.cancel_at
            .map(|deadline| tokio::time::Instant::now() >= deadline)
            .unwrap_or(false)
    }

    fn close(&mut self) {
        self.events.lock().unwrap().push(UiEvent::ProgressClosed);
    }
}

// ---------------------------------------------------------------------------
// Sleep, reset, persistence
// ---------------------------------------------------------------------------

/// Returns immediately and records the requested waits.
#[derive(Default)]
pub struct InstantSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl InstantSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct CountingReset {
    resets: AtomicUsize,
}

impl CountingReset {
    pub fn count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ClientReset for CountingReset {
    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<AccountIdentity, CombinedCredential>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, identity: AccountIdentity, credential: CombinedCredential) {
        self.slots.lock().unwrap().insert(identity, credential);
    }

    pub fn get(&self, identity: &AccountIdentity) -> Option<CombinedCredential> {
        self.slots.lock().unwrap().get(identity).cloned()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self, identity: &AccountIdentity) -> Result<Option<CombinedCredential>, AuthError> {
        Ok(self.get(identity))
    }

    fn save(
        &self,
        identity: &AccountIdentity,
        credential: &CombinedCredential,
    ) -> Result<(), AuthError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.slots
            .lock()
            .unwrap()
            .insert(identity.clone(), credential.clone());
        Ok(())
    }

    fn clear(&self, identity: &AccountIdentity) -> Result<(), AuthError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().unwrap().remove(identity);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn host(ui: Arc<RecordingUi>, sleeper: Arc<dyn Sleeper>) -> LoginHost {
    LoginHost {
        ui,
        strings: Arc::new(DefaultStrings),
        sleeper,
    }
}

pub fn stored_pair(tag: &str, tv_refresh: &str, refresh: &str) -> CombinedCredential {
    let expires_at = Utc::now() + chrono::Duration::hours(1);
    CombinedCredential::new(
        Credential {
            access_token: format!("{tag}-tv-access"),
            refresh_token: tv_refresh.to_string(),
            expires_at,
        },
        Credential {
            access_token: format!("{tag}-access"),
            refresh_token: refresh.to_string(),
            expires_at,
        },
    )
}
