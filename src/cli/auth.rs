//! CLI auth command handlers for login, status, and logout.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::console::ConsoleUi;
use crate::auth::{
    AccountIdentity, AuthService, ClientProfile, DefaultStrings, LoginHost, LoginOutcome,
    TokioSleeper,
};
use crate::config::DuolinkConfig;
use crate::error::{DuolinkError, Result};

fn service(config: &DuolinkConfig, cancel: CancellationToken) -> AuthService {
    let host = LoginHost {
        ui: Arc::new(ConsoleUi::new(cancel)),
        strings: Arc::new(DefaultStrings),
        sleeper: Arc::new(TokioSleeper),
    };
    AuthService::from_config(config, host)
}

/// Handle `duolink auth login`.
pub async fn handle_login(config: &DuolinkConfig, addon_id: Option<&str>) -> Result<()> {
    config.validate()?;
    let identity = AccountIdentity::from_addon_id(addon_id);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = service(config, cancel).login(&identity).await;
    watcher.abort();

    match result? {
        LoginOutcome::Completed(credential) => {
            println!("✅ Signed in ({identity})");
            println!(
                "   Expires {}",
                credential.primary.expires_at.format("%Y-%m-%d %H:%M")
            );
            Ok(())
        }
        LoginOutcome::NotCompleted { profile, end } => Err(DuolinkError::LoginNotCompleted(
            format!("{profile} sign-in ended: {end}"),
        )),
    }
}

/// Handle `duolink auth status`.
pub async fn handle_status(config: &DuolinkConfig, addon_id: Option<&str>) -> Result<()> {
    let identity = AccountIdentity::from_addon_id(addon_id);
    let credential = service(config, CancellationToken::new()).get_credential(&identity);

    println!("🔐 Authentication Status ({identity})\n");
    let now = Utc::now();
    for profile in ClientProfile::LOGIN_ORDER {
        let entry = credential.get(profile);
        let status = if entry.is_empty() {
            "❌ Not signed in".to_string()
        } else if entry.is_expired(now) {
            "⚠️  Access token expired (refresh token kept)".to_string()
        } else {
            format!(
                "✅ Signed in (expires {})",
                entry.expires_at.format("%Y-%m-%d %H:%M")
            )
        };
        println!("  {profile}: {status}");
    }
    Ok(())
}

/// Handle `duolink auth logout`.
pub async fn handle_logout(config: &DuolinkConfig, addon_id: Option<&str>) -> Result<()> {
    let identity = AccountIdentity::from_addon_id(addon_id);
    let report = service(config, CancellationToken::new())
        .logout(Some(&identity))
        .await;

    if report.failed > 0 {
        println!(
            "⚠️  {} of {} refresh tokens could not be revoked",
            report.failed,
            report.failed + report.revoked
        );
    }
    println!("✅ Signed out ({identity})");
    Ok(())
}
