//! Session policy command.

use anyhow::Result;
use session_lifecycle::SessionManager;

use crate::output::{self, OutputFormat};

/// Show the session policy the server enforces.
pub async fn config(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    manager.refresh_session_config().await;
    let config = manager.session_config();

    match format {
        OutputFormat::Text => {
            output::print_row(
                "Access token expiry",
                &format!("{} min", config.access_token_expiry_minutes),
            );
            output::print_row(
                "Refresh token expiry",
                &format!("{} days", config.refresh_token_expiry_days),
            );
            output::print_row(
                "Inactivity timeout",
                &format!("{} min", config.inactivity_timeout_minutes),
            );
            output::print_row("Max sessions", &config.max_concurrent_sessions.to_string());
            output::print_row(
                "Heartbeat interval",
                &format!("{} s", config.heartbeat_interval_seconds),
            );
            output::print_row(
                "Session lock",
                if config.enable_session_lock {
                    "enabled"
                } else {
                    "disabled"
                },
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
