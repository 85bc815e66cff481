//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! and a `Z` suffix, so lexical order equals chronological order. UUIDs are
//! stored as hyphenated lowercase strings. Enum columns hold their display
//! names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use studyhive_core::{
  catalog::{Subject, Tag},
  interaction::{Comment, Download, Rating, Score, View},
  resource::{FileType, Resource, ResourceType},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

pub fn decode_score(raw: i64) -> Result<Score> { Ok(Score::new(raw)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every query that yields [`RawResource`] rows.
///
/// The rating summary is derived from the `ratings` table on read; a
/// resource without ratings averages 0.0.
pub const RESOURCE_SELECT: &str = "
  SELECT r.resource_id, r.title, r.description, r.resource_type, r.file_type,
         r.file, r.video_url, r.uploader_id, r.subject_id, r.is_active,
         r.views_count, r.downloads_count, r.created_at,
         COALESCE(rs.average_rating, 0.0) AS average_rating,
         COALESCE(rs.total_ratings, 0)    AS total_ratings
  FROM resources r
  LEFT JOIN (
    SELECT resource_id, AVG(score) AS average_rating, COUNT(*) AS total_ratings
    FROM ratings
    GROUP BY resource_id
  ) rs ON rs.resource_id = r.resource_id";

/// Raw strings read directly from a [`RESOURCE_SELECT`] row plus its tags.
pub struct RawResource {
  pub resource_id:     String,
  pub title:           String,
  pub description:     Option<String>,
  pub resource_type:   String,
  pub file_type:       String,
  pub file:            Option<String>,
  pub video_url:       Option<String>,
  pub uploader_id:     String,
  pub subject_id:      Option<String>,
  pub is_active:       bool,
  pub views_count:     i64,
  pub downloads_count: i64,
  pub created_at:      String,
  pub average_rating:  f64,
  pub total_ratings:   i64,
  pub tags:            Vec<RawTag>,
}

impl RawResource {
  /// Map a [`RESOURCE_SELECT`] row; tags are attached separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      resource_id:     row.get(0)?,
      title:           row.get(1)?,
      description:     row.get(2)?,
      resource_type:   row.get(3)?,
      file_type:       row.get(4)?,
      file:            row.get(5)?,
      video_url:       row.get(6)?,
      uploader_id:     row.get(7)?,
      subject_id:      row.get(8)?,
      is_active:       row.get(9)?,
      views_count:     row.get(10)?,
      downloads_count: row.get(11)?,
      created_at:      row.get(12)?,
      average_rating:  row.get(13)?,
      total_ratings:   row.get(14)?,
      tags:            Vec::new(),
    })
  }

  pub fn into_resource(self) -> Result<Resource> {
    let tags = self
      .tags
      .into_iter()
      .map(RawTag::into_tag)
      .collect::<Result<Vec<_>>>()?;

    Ok(Resource {
      resource_id:     decode_uuid(&self.resource_id)?,
      title:           self.title,
      description:     self.description,
      resource_type:   decode_enum::<ResourceType>(
        "resource_type",
        &self.resource_type,
      )?,
      file_type:       decode_enum::<FileType>("file_type", &self.file_type)?,
      file:            self.file,
      video_url:       self.video_url,
      uploader_id:     decode_uuid(&self.uploader_id)?,
      subject_id:      decode_opt_uuid(self.subject_id)?,
      tags,
      is_active:       self.is_active,
      views_count:     self.views_count,
      downloads_count: self.downloads_count,
      average_rating:  self.average_rating,
      total_ratings:   self.total_ratings,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `tags` row.
pub struct RawTag {
  pub tag_id: String,
  pub name:   String,
}

impl RawTag {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { tag_id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag { tag_id: decode_uuid(&self.tag_id)?, name: self.name })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:  String,
  pub name:        String,
  pub description: String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:  row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:  decode_uuid(&self.subject_id)?,
      name:        self.name,
      description: self.description,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:   String,
  pub username:  String,
  pub email:     String,
  pub bio:       String,
  pub avatar:    Option<String>,
  pub joined_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(0)?,
      username:  row.get(1)?,
      email:     row.get(2)?,
      bio:       row.get(3)?,
      avatar:    row.get(4)?,
      joined_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:   decode_uuid(&self.user_id)?,
      username:  self.username,
      email:     self.email,
      bio:       self.bio,
      avatar:    self.avatar,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

/// A `views` or `downloads` row: `(id, user_id, resource_id, at)`.
pub struct RawEvent {
  pub id:          String,
  pub user_id:     String,
  pub resource_id: String,
  pub at:          String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      user_id:     row.get(1)?,
      resource_id: row.get(2)?,
      at:          row.get(3)?,
    })
  }

  pub fn into_view(self) -> Result<View> {
    Ok(View {
      view_id:     decode_uuid(&self.id)?,
      user_id:     decode_uuid(&self.user_id)?,
      resource_id: decode_uuid(&self.resource_id)?,
      viewed_at:   decode_dt(&self.at)?,
    })
  }

  pub fn into_download(self) -> Result<Download> {
    Ok(Download {
      download_id:   decode_uuid(&self.id)?,
      user_id:       decode_uuid(&self.user_id)?,
      resource_id:   decode_uuid(&self.resource_id)?,
      downloaded_at: decode_dt(&self.at)?,
    })
  }
}

/// Raw strings read directly from a `ratings` row.
pub struct RawRating {
  pub rating_id:   String,
  pub user_id:     String,
  pub resource_id: String,
  pub score:       i64,
  pub rated_at:    String,
}

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:   row.get(0)?,
      user_id:     row.get(1)?,
      resource_id: row.get(2)?,
      score:       row.get(3)?,
      rated_at:    row.get(4)?,
    })
  }

  pub fn into_rating(self) -> Result<Rating> {
    Ok(Rating {
      rating_id:   decode_uuid(&self.rating_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      resource_id: decode_uuid(&self.resource_id)?,
      score:       decode_score(self.score)?,
      rated_at:    decode_dt(&self.rated_at)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:   String,
  pub user_id:      String,
  pub resource_id:  String,
  pub text:         String,
  pub parent_id:    Option<String>,
  pub commented_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:   row.get(0)?,
      user_id:      row.get(1)?,
      resource_id:  row.get(2)?,
      text:         row.get(3)?,
      parent_id:    row.get(4)?,
      commented_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:   decode_uuid(&self.comment_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      resource_id:  decode_uuid(&self.resource_id)?,
      text:         self.text,
      parent_id:    decode_opt_uuid(self.parent_id)?,
      commented_at: decode_dt(&self.commented_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let later = base + Duration::microseconds(1_500);
    let (a, b) = (encode_dt(base), encode_dt(later));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn unknown_enum_value_is_reported() {
    let err = decode_enum::<FileType>("file_type", "EPUB").unwrap_err();
    assert!(matches!(err, Error::UnknownValue { column: "file_type", .. }));
  }
}
