//! CLI entry point for duolink.

pub mod auth;
pub mod console;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// duolink CLI
#[derive(Parser, Debug)]
#[command(name = "duolink", version, about = "Dual-profile device-flow sign-in")]
pub struct Cli {
    /// Config file (defaults to ~/.duolink/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with both client profiles
    Login(AccountArgs),
    /// Show stored credential status
    Status(AccountArgs),
    /// Revoke and clear stored credentials
    Logout(AccountArgs),
}

/// Account slot selection shared by the auth subcommands.
#[derive(Parser, Debug)]
pub struct AccountArgs {
    /// External identity (companion add-on id) instead of the default account
    #[arg(long)]
    pub addon_id: Option<String>,
}
