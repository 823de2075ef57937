//! Configuration: schema, file loading, env overrides.

mod load;
mod schema;

pub use load::{apply_env_overrides, config_path, load};
pub use schema::{Config, ConfigLayer, DEFAULT_ITEM_COUNT};
