//! Categorical labels attached to resources.
//!
//! A resource belongs to at most one [`Subject`] and carries any number of
//! [`Tag`]s. Both are unique by name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:  Uuid,
  pub name:        String,
  pub description: String,
}

/// Input to [`crate::store::LibraryStore::add_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

impl NewSubject {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::EmptySubjectName);
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id: Uuid,
  pub name:   String,
}

/// Canonical form of a tag name: trimmed and lowercased. Fails on names
/// that are blank.
pub fn normalize_tag(name: &str) -> Result<String> {
  let name = name.trim().to_lowercase();
  if name.is_empty() {
    return Err(Error::EmptyTagName);
  }
  Ok(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_names_are_trimmed_and_lowercased() {
    assert_eq!(normalize_tag("  Linear Algebra ").unwrap(), "linear algebra");
  }

  #[test]
  fn blank_tag_names_are_rejected() {
    assert!(matches!(normalize_tag(" \t"), Err(Error::EmptyTagName)));
  }

  #[test]
  fn blank_subject_names_are_rejected() {
    let s = NewSubject { name: "  ".into(), description: String::new() };
    assert!(matches!(s.validate(), Err(Error::EmptySubjectName)));
  }
}
