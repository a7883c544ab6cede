use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("pdf error: {0}")]
  Pdf(#[from] genpdf::error::Error),

  #[error("no font family {family:?} found in {dirs:?}")]
  FontNotFound { family: String, dirs: Vec<PathBuf> },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
