//! SQLite backend for the Casefile investigation store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every logical operation is a single
//! closure on that thread, and every write runs inside one transaction.

mod encode;
mod reconcile;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
