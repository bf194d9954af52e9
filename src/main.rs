//! duolink CLI binary entry point.

use clap::Parser;
use duolink::cli::{AuthCommands, Cli, Commands};
use duolink::config::DuolinkConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duolink=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> duolink::error::Result<()> {
    let config = match &cli.config {
        Some(path) => DuolinkConfig::load_with_file(path)?,
        None => DuolinkConfig::load()?,
    };

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                duolink::cli::auth::handle_login(&config, args.addon_id.as_deref()).await
            }
            AuthCommands::Status(args) => {
                duolink::cli::auth::handle_status(&config, args.addon_id.as_deref()).await
            }
            AuthCommands::Logout(args) => {
                duolink::cli::auth::handle_logout(&config, args.addon_id.as_deref()).await
            }
        },
    }
}
