//! Error types for `studyhive-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid resource: {0}")]
  InvalidResource(String),

  #[error("invalid user: {0}")]
  InvalidUser(String),

  #[error("rating score must be between 1 and 5, got {0}")]
  InvalidScore(i64),

  #[error("comment text must not be empty")]
  EmptyComment,

  #[error("tag name must not be empty")]
  EmptyTagName,

  #[error("subject name must not be empty")]
  EmptySubjectName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
