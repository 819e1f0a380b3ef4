//! CLI command implementations.

pub mod status;
pub mod auth;
pub mod profile;
pub mod listings;
pub mod applications;
pub mod messages;
pub mod saved;
pub mod contact;

use std::path::Path;

use chrono::Utc;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tracing::{debug, info, warn};

use rt_api::Session;
use rt_core::config::{AppConfig, ConfigHandle};
use rt_core::error::{RtError, RtResult};
use rt_services::RoomThere;

/// Build the composition root from config and restore the saved session.
/// An expired session file is removed instead.
///
/// The outbound realtime receiver is dropped: the CLI runs no websocket
/// transport.
pub async fn connect(config: &ConfigHandle) -> RtResult<RoomThere> {
    let (app, _outbound) = {
        let cfg = config.read().await;
        RoomThere::connect(&cfg)?
    };

    let path = AppConfig::session_path()?;
    if let Some(saved) = load_session(&path)? {
        match live_session(saved, Utc::now().timestamp()) {
            Some(session) => app.auth.restore_session(Some(session)).await?,
            None => {
                info!("saved session expired; sign in again");
                save_session(&path, None)?;
            }
        }
    }
    Ok(app)
}

/// Read a persisted session. A missing file is no session; an unreadable
/// one is ignored with a warning.
pub fn load_session(path: &Path) -> RtResult<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            warn!("ignoring unreadable session file {}: {e}", path.display());
            Ok(None)
        }
    }
}

/// The session, unless it expired at or before `now` (unix seconds).
pub fn live_session(session: Session, now: i64) -> Option<Session> {
    (!session.is_expired_at(now)).then_some(session)
}

/// Persist `session`, or remove the file when signed out.
pub fn save_session(path: &Path, session: Option<&Session>) -> RtResult<()> {
    match session {
        Some(session) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(session)?)?;
            debug!("session saved to {}", path.display());
        }
        None => {
            if path.exists() {
                std::fs::remove_file(path)?;
                debug!("session file removed");
            }
        }
    }
    Ok(())
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> RtResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A table with the CLI's standard look.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Wrap a prompt failure.
pub fn prompt_error(e: dialoguer::Error) -> RtError {
    RtError::Internal(format!("prompt failed: {e}"))
}

/// Format a monthly rent as dollars.
pub fn format_rent(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("${amount:.0}/mo")
    } else {
        format!("${amount:.2}/mo")
    }
}

/// Truncate a string to at most `max_len` characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// The value, or `-` when missing or blank.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => "-".to_string(),
    }
}
