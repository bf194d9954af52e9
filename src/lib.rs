//! Dual-profile OAuth2 device-authorization login engine.
//!
//! Signs a device in through two independent device-flow sessions (a
//! secondary "TV" client profile, then the primary profile), stores the two
//! resulting credentials as one pair, and revokes them on logout.
//!
//! # Quick Start
//!
//! ```no_run
//! use duolink::prelude::*;
//!
//! # async fn example(host: LoginHost) -> Result<()> {
//! let config = DuolinkConfig::load()?;
//! config.validate()?;
//! let service = AuthService::from_config(&config, host);
//! match service.login(&AccountIdentity::Default).await? {
//!     LoginOutcome::Completed(_) => println!("signed in"),
//!     LoginOutcome::NotCompleted { end, .. } => println!("login not completed ({end})"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
