//! Opsdesk CLI - command-line client for session and auth management.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Opsdesk CLI - manage your session against an Opsdesk server.
#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "Opsdesk CLI for authentication and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the Opsdesk server
    #[arg(
        long,
        env = "OPSDESK_API_URL",
        default_value = "http://127.0.0.1:8600",
        global = true
    )]
    api_url: String,

    /// Token file path (defaults to ~/.opsdesk/tokens.json)
    #[arg(long, env = "OPSDESK_TOKEN_FILE", global = true)]
    token_file: Option<std::path::PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login,

    /// Logout and clear the stored session
    Logout,

    /// Check session status against the server
    Status,

    /// Show the session policy the server enforces
    Config,

    /// Run the session lifecycle in the foreground
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(true)
        .compact()
        .init();

    let manager = match commands::build_manager(&cli.api_url, cli.token_file.as_deref()) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Login => commands::login(&manager, &cli.format).await,
        Commands::Logout => commands::logout(&manager, &cli.format).await,
        Commands::Status => commands::status(&manager, &cli.format).await,
        Commands::Config => commands::config(&manager, &cli.format).await,
        Commands::Watch => commands::watch(&manager, &cli.format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
