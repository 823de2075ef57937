#![forbid(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod daemon;
pub mod error;
mod paths;
pub mod store;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{CoreError, Item, ItemId, ItemStore, ListEngine, OrderIndex, Page};
pub use crate::store::{JsonStateStore, MemoryStateStore, PersistError, StateStore};
