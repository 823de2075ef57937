//! Config schema and defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default universe size: a million items.
pub const DEFAULT_ITEM_COUNT: u64 = 1_000_000;

/// Resolved configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of items in the universe (ids 1..=count).
    pub item_count: u64,

    /// Directory holding the persisted order/selection blobs.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_count: DEFAULT_ITEM_COUNT,
            data_dir: crate::paths::data_dir(),
        }
    }
}

/// One configuration layer (file contents); every field optional.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub item_count: Option<u64>,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}
