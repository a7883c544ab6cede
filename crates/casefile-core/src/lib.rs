//! Core types and trait definitions for the Casefile investigation store.
//!
//! No database or rendering dependencies live here. [`store::CaseStore`]
//! returns `impl Future + Send` so implementations can be written with
//! `async fn` and still be driven from multi-threaded runtimes.

pub mod case;
pub mod entity;
pub mod error;
pub mod grid;
pub mod store;

pub use error::{Error, Result};
