//! Per-user directories for RoomThere's files.

use std::path::PathBuf;
use crate::constants::APP_NAME;
use crate::error::{RtError, RtResult};

/// Where logs and the saved session live.
///
/// - Windows: `%APPDATA%/RoomThere`
/// - macOS: `~/Library/Application Support/RoomThere`
/// - Linux: `~/.local/share/RoomThere`
pub fn data_dir() -> RtResult<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| RtError::Config("could not determine data directory".into()))?;
    Ok(base.join(APP_NAME))
}

/// Where `config.toml` lives. On Linux this is `~/.config/RoomThere`.
pub fn config_dir() -> RtResult<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| RtError::Config("could not determine config directory".into()))?;
    Ok(base.join(APP_NAME))
}
