//! Foreground session watcher.

use anyhow::Result;
use session_lifecycle::SessionManager;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output::{self, OutputFormat};

/// Run the session lifecycle in the foreground.
///
/// Every line read from stdin counts as user activity; `unlock` prompts for
/// the password of a locked session, `quit` (or Ctrl-C) exits. State
/// transitions print as they happen.
pub async fn watch(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let print_format = *format;
    manager.set_state_callback(Box::new(move |payload| match print_format {
        OutputFormat::Text => {
            let who = payload.username.unwrap_or_else(|| "-".into());
            println!("session -> {} ({})", payload.state, who);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(&payload) {
                println!("{}", json);
            }
        }
    }));

    let active = manager.bootstrap().await.unwrap_or(false);
    if !active {
        output::print_error("Not logged in. Run 'opsdesk login' first", format);
        return Ok(());
    }

    if let Some(user) = &manager.snapshot().user {
        println!(
            "Watching session for {}. Type to record activity, 'unlock' to unlock, 'quit' to exit.",
            user.username
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim() == "quit" => break,
                    Some(line) if line.trim() == "unlock" => {
                        let password = rpassword::prompt_password("Password: ")?;
                        if let Err(e) = manager.unlock(&password).await {
                            output::print_error(&format!("Unlock failed: {}", e), format);
                        }
                    }
                    Some(_) => manager.record_activity(),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    manager.shutdown();
    Ok(())
}
