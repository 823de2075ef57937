//! Core capability: the ordering/selection/query engine.
//!
//! `ItemStore` holds the fixed item universe, `OrderIndex` the user-chosen
//! permutation with its derived rank map, and `ListEngine` composes the two
//! with a durable blob store into the operations the daemon serves.

mod engine;
mod error;
mod item;
mod order;

pub use engine::{ListEngine, Page};
pub use error::CoreError;
pub use item::{Item, ItemId, ItemStore};
pub use order::OrderIndex;
