//! Config loading: file layer plus env overrides.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Config, ConfigLayer};

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

/// Load the effective config: file layer (when present) + env overrides.
///
/// A broken config file is logged and ignored rather than refusing to start.
pub fn load() -> Config {
    let mut config = match read_layer(&config_path()) {
        Ok(layer) => resolve(layer),
        Err(reason) => {
            tracing::warn!("config load failed, using defaults: {reason}");
            Config::default()
        }
    };
    apply_env_overrides(&mut config);
    config
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn resolve(layer: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = layer {
        if let Some(count) = layer.item_count {
            config.item_count = count;
        }
        if let Some(dir) = layer.data_dir {
            config.data_dir = dir;
        }
    }
    config
}

/// Apply `LINEUP_ITEM_COUNT` / `LINEUP_DATA_DIR` overrides on top of the
/// resolved config.
pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_inner(
        config,
        std::env::var("LINEUP_ITEM_COUNT").ok(),
        std::env::var("LINEUP_DATA_DIR").ok(),
    );
}

fn apply_env_overrides_inner(
    config: &mut Config,
    item_count: Option<String>,
    data_dir: Option<String>,
) {
    if let Some(raw) = item_count {
        match raw.trim().parse() {
            Ok(count) => config.item_count = count,
            Err(_) => tracing::warn!("ignoring invalid LINEUP_ITEM_COUNT: {raw}"),
        }
    }
    if let Some(dir) = data_dir
        && !dir.trim().is_empty()
    {
        config.data_dir = PathBuf::from(dir);
    }
}
