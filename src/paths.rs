//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for persistent data (order/selection blobs).
///
/// Uses `LINEUP_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/lineup` or
/// `~/.local/share/lineup`.
pub(crate) fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LINEUP_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("lineup")
}

/// Base directory for configuration files.
///
/// Uses `LINEUP_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/lineup` or
/// `~/.config/lineup`.
pub(crate) fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LINEUP_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("lineup")
}
