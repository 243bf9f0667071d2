//! Authentication commands.

use std::io::{self, Write};

use anyhow::Result;
use auth_client::Credentials;
use session_lifecycle::SessionManager;

use crate::output::{self, OutputFormat};

/// Login with username and password.
pub async fn login(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    // Resume the stored session if it is still valid.
    if let Ok(true) = manager.bootstrap().await {
        let username = manager
            .snapshot()
            .user
            .map(|u| u.username)
            .unwrap_or_else(|| "unknown".into());
        output::print_success(&format!("Already logged in as {}", username), format);
        return Ok(());
    }

    print!("Username: ");
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim().to_string();

    if username.is_empty() {
        output::print_error("Username is required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;

    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    println!("Logging in...");

    match manager.login(&Credentials::new(username, password)).await {
        Ok(()) => {
            let username = manager
                .snapshot()
                .user
                .map(|u| u.username)
                .unwrap_or_else(|| "user".into());
            output::print_success(&format!("Logged in as {}", username), format);
        }
        Err(e) => {
            output::print_error(&format!("Login failed: {}", e), format);
        }
    }

    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    manager.logout().await;
    output::print_success("Logged out", format);
    Ok(())
}

/// Check session status against the server.
pub async fn status(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let _ = manager.bootstrap().await;
    let snapshot = manager.snapshot();

    match format {
        OutputFormat::Text => {
            output::print_row("State", &snapshot.state.to_string());
            if let Some(user) = &snapshot.user {
                output::print_row("User", &user.username);
                if let Some(name) = &user.display_name {
                    output::print_row("Name", name);
                }
            }
            if let Some(mode) = snapshot.mode {
                output::print_row("Mode", &mode.to_string());
            }
            if !snapshot.permissions.is_empty() {
                output::print_row("Permissions", &snapshot.permissions.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
