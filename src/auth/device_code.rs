use std::time::Duration;

/// Poll interval used when the server omits one or sends an implausible one.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Largest server-supplied interval that is trusted.
pub const MAX_POLL_INTERVAL_SECS: u64 = 60;
/// Wall-clock ceiling for one device-flow session.
pub const POLL_WINDOW_SECS: u64 = 10 * 60;

/// Error code the token endpoint uses while the user has not approved yet.
pub const AUTHORIZATION_PENDING: &str = "authorization_pending";
/// Denial codes that can never turn into a grant for the same device code.
pub const TERMINAL_DENIAL_CODES: &[&str] = &["access_denied", "expired_token"];

/// Device and user codes handed out by the device-authorization endpoint.
///
/// Lives for one session and is never persisted.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use duolink::auth::DeviceGrant;
///
/// let grant = DeviceGrant::new("device-code", "ABCD-EFGH", "youtube.com/activate", Some(90));
/// assert_eq!(grant.poll_interval, Duration::from_secs(5));
/// assert_eq!(grant.poll_budget(600), 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGrant {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub poll_interval: Duration,
}

impl DeviceGrant {
    /// Build a grant, clamping the server-supplied interval.
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_url: impl Into<String>,
        interval_secs: Option<u64>,
    ) -> Self {
        Self {
            device_code: device_code.into(),
            user_code: user_code.into(),
            verification_url: verification_url.into(),
            poll_interval: Duration::from_secs(clamp_interval(interval_secs)),
        }
    }

    /// Number of polls that fit in `window_secs` at this grant's interval.
    pub fn poll_budget(&self, window_secs: u64) -> u32 {
        poll_budget(window_secs, self.poll_interval.as_secs())
    }
}

/// Result of a single token-endpoint poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Granted {
        access_token: String,
        refresh_token: String,
        expires_in: Option<i64>,
    },
    Pending,
    Denied {
        code: String,
        message: String,
    },
}

impl PollOutcome {
    pub fn is_terminal_denial(&self) -> bool {
        match self {
            Self::Denied { code, .. } => TERMINAL_DENIAL_CODES.contains(&code.as_str()),
            _ => false,
        }
    }
}

/// Missing, zero or over-ceiling intervals all fall back to the default.
pub fn clamp_interval(interval_secs: Option<u64>) -> u64 {
    match interval_secs {
        Some(secs) if secs > 0 && secs <= MAX_POLL_INTERVAL_SECS => secs,
        _ => DEFAULT_POLL_INTERVAL_SECS,
    }
}

pub fn poll_budget(window_secs: u64, interval_secs: u64) -> u32 {
    let interval = interval_secs.max(1);
    u32::try_from(window_secs / interval).unwrap_or(u32::MAX)
}

/// Strip scheme and `www.` so the URL is short enough to type on a TV.
pub fn normalize_verification_url(url: Option<&str>, fallback: &str) -> String {
    let raw = match url.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => fallback,
    };
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme)
        .to_string()
}
