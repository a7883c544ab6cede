//! Error type for `casefile-store-sqlite`.

use casefile_core::{case::CaseId, entity::EntityKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] casefile_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("case not found: {0}")]
  CaseNotFound(CaseId),

  /// The caller tried to link an entity with a blank natural key.
  #[error("a {0} value must not be empty")]
  EmptyValue(EntityKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
