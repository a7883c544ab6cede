//! Error types for `casefile-core`.

use thiserror::Error;

use crate::entity::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("unknown entity kind: {0:?}")]
  UnknownEntityKind(String),

  #[error("unknown column {column:?} for {kind}")]
  UnknownColumn { kind: EntityKind, column: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
