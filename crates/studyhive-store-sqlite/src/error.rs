//! Error type for `studyhive-store-sqlite`.

use studyhive_core::store::{ErrorKind, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] studyhive_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value no enum variant maps to.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("resource not found: {0}")]
  ResourceNotFound(Uuid),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("comment {comment} does not belong to resource {resource}")]
  ParentCommentMismatch { comment: Uuid, resource: Uuid },

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("subject {0:?} already exists")]
  SubjectNameTaken(String),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(_)
      | Error::CommentNotFound(_)
      | Error::ParentCommentMismatch { .. } => ErrorKind::Invalid,
      Error::UserNotFound(_)
      | Error::ResourceNotFound(_)
      | Error::SubjectNotFound(_) => ErrorKind::NotFound,
      Error::UsernameTaken(_) | Error::SubjectNameTaken(_) => {
        ErrorKind::Conflict
      }
      Error::Database(_)
      | Error::Uuid(_)
      | Error::DateParse(_)
      | Error::UnknownValue { .. } => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
