//! Status command - show configuration, reachability, and the signed-in user.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use rt_api::ApiClient;
use rt_core::config::{AppConfig, ConfigHandle};
use rt_core::error::RtResult;
use crate::OutputFormat;

/// Run the status command.
pub async fn run(config: ConfigHandle, format: OutputFormat) -> RtResult<()> {
    let cfg = config.read().await.clone();
    let backend = cfg.require_backend()?;
    let api = ApiClient::new(backend)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Checking {}...", api.origin()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let health = api.health_check().await;
    pb.finish_and_clear();

    let app = super::connect(&config).await?;
    let session = app.auth.session().await;
    let user = if session.is_some() {
        app.auth.get_current_user().await?
    } else {
        None
    };
    let session_path = AppConfig::session_path()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "project_url": api.origin(),
                "rest_url": api.rest_root(),
                "realtime_url": app.realtime().websocket_url(),
                "reachable": health.is_ok(),
                "latency_ms": health.as_ref().ok().map(|d| d.as_millis() as u64),
                "error": health.as_ref().err().map(|e| e.to_string()),
                "signed_in": user.is_some(),
                "user": user,
                "session_expires_at": session.as_ref().and_then(|s| s.expires_at),
                "session_file": session_path.display().to_string(),
            });
            super::print_json(&json)?;
        }
        OutputFormat::Text => {
            println!("{}", style("Backend").bold().underlined());
            println!("  Project:   {}", api.origin());
            println!("  Realtime:  {}", app.realtime().websocket_url());
            println!(
                "  Status:    {}",
                match &health {
                    Ok(latency) => format!("{} ({}ms)", style("reachable").green(), latency.as_millis()),
                    Err(e) => format!("{} ({e})", style("unreachable").red()),
                }
            );

            println!();
            println!("{}", style("Session").bold().underlined());
            match (&user, &session) {
                (Some(user), Some(session)) => {
                    println!(
                        "  User:      {} ({})",
                        user.email.as_deref().unwrap_or("no email"),
                        user.id
                    );
                    if let Some(at) = session.expires_at {
                        if let Some(dt) = chrono::DateTime::from_timestamp(at, 0) {
                            println!("  Expires:   {}", dt.format("%Y-%m-%d %H:%M:%S UTC"));
                        }
                    }
                }
                (None, Some(_)) => {
                    println!("  {}", style("saved session is no longer valid").yellow());
                    println!("  Run `roomthere auth login` to sign in again.");
                }
                _ => println!("  {}", style("signed out").dim()),
            }
            println!("  File:      {}", session_path.display());
        }
    }

    Ok(())
}
