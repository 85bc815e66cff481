//! Records of users engaging with resources.
//!
//! Views, downloads and ratings feed the recommendation engine; comments and
//! bookmarks are user-facing only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, resource::Resource};

// ─── Engagement ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
  pub view_id:     Uuid,
  pub user_id:     Uuid,
  pub resource_id: Uuid,
  pub viewed_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
  pub download_id:   Uuid,
  pub user_id:       Uuid,
  pub resource_id:   Uuid,
  pub downloaded_at: DateTime<Utc>,
}

/// A rating score, guaranteed to lie in `1..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::InvalidScore(value))
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Score {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> { Self::new(value) }
}

impl From<Score> for i64 {
  fn from(score: Score) -> Self { i64::from(score.0) }
}

/// A user's rating of a resource. Each user holds at most one rating per
/// resource; rating again replaces the score and the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
  pub rating_id:   Uuid,
  pub user_id:     Uuid,
  pub resource_id: Uuid,
  pub score:       Score,
  pub rated_at:    DateTime<Utc>,
}

/// Any engagement record that counts towards a user's interaction set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
  View(View),
  Download(Download),
  Rating(Rating),
}

impl Interaction {
  pub fn resource_id(&self) -> Uuid {
    match self {
      Self::View(v) => v.resource_id,
      Self::Download(d) => d.resource_id,
      Self::Rating(r) => r.resource_id,
    }
  }

  pub fn at(&self) -> DateTime<Utc> {
    match self {
      Self::View(v) => v.viewed_at,
      Self::Download(d) => d.downloaded_at,
      Self::Rating(r) => r.rated_at,
    }
  }
}

// ─── Discussion ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:   Uuid,
  pub user_id:      Uuid,
  pub resource_id:  Uuid,
  pub text:         String,
  /// The comment this one replies to, on the same resource.
  pub parent_id:    Option<Uuid>,
  pub commented_at: DateTime<Utc>,
}

/// Input to [`crate::store::LibraryStore::add_comment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
  pub user_id:     Uuid,
  pub resource_id: Uuid,
  pub text:        String,
  #[serde(default)]
  pub parent_id:   Option<Uuid>,
}

impl NewComment {
  pub fn validate(&self) -> Result<()> {
    if self.text.trim().is_empty() {
      return Err(Error::EmptyComment);
    }
    Ok(())
  }
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
  pub user_id:       Uuid,
  pub resource_id:   Uuid,
  pub bookmarked_at: DateTime<Utc>,
}

/// A bookmarked resource together with when it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkedResource {
  pub resource:      Resource,
  pub bookmarked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_bounds() {
    assert!(Score::new(0).is_err());
    assert_eq!(Score::new(1).unwrap().get(), 1);
    assert_eq!(Score::new(5).unwrap().get(), 5);
    assert!(matches!(Score::new(6), Err(Error::InvalidScore(6))));
  }

  #[test]
  fn score_deserialization_is_checked() {
    assert!(serde_json::from_str::<Score>("4").is_ok());
    assert!(serde_json::from_str::<Score>("9").is_err());
  }

  #[test]
  fn blank_comment_is_rejected() {
    let c = NewComment {
      user_id:     Uuid::new_v4(),
      resource_id: Uuid::new_v4(),
      text:        "  \n".into(),
      parent_id:   None,
    };
    assert!(matches!(c.validate(), Err(Error::EmptyComment)));
  }
}
