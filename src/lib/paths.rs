//! Home-directory expansion for the fixed dotfile locations.

use std::{ffi::OsString, path::PathBuf};

/// Environment variable holding the operator's home directory.
pub const HOME_ENV: &str = "HOME";
/// Directory under `$HOME` that holds every file the tool owns.
pub const STATE_DIR: &str = ".machine";

/// Resolve `$HOME/.machine/<file_name>` from an explicit home value.
pub fn state_file_from(home: Option<OsString>, file_name: &str) -> Result<PathBuf, &'static str> {
    match home {
        Some(home) if !home.is_empty() => {
            Ok(PathBuf::from(home).join(STATE_DIR).join(file_name))
        }
        _ => Err("HOME is unset or empty"),
    }
}
