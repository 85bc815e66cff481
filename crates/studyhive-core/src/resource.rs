//! Resources: the study materials users share.
//!
//! A resource is either a document (backed by an uploaded file) or a video
//! (backed by an external URL). Engagement counters and the rating summary
//! are maintained by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::{Tag, normalize_tag},
  youtube,
};

pub const MAX_TITLE_LEN: usize = 255;

// ─── Kinds ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
pub enum ResourceType {
  Document,
  Video,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
pub enum FileType {
  #[serde(rename = "PDF")]
  #[strum(serialize = "PDF")]
  Pdf,
  #[serde(rename = "PPT")]
  #[strum(serialize = "PPT")]
  Ppt,
  #[serde(rename = "DOC")]
  #[strum(serialize = "DOC")]
  Doc,
  #[serde(rename = "DOCX")]
  #[strum(serialize = "DOCX")]
  Docx,
  YouTube,
}

// ─── Resource ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub resource_id:     Uuid,
  pub title:           String,
  pub description:     Option<String>,
  pub resource_type:   ResourceType,
  pub file_type:       FileType,
  /// Path of the uploaded file relative to the media root.
  pub file:            Option<String>,
  pub video_url:       Option<String>,
  pub uploader_id:     Uuid,
  pub subject_id:      Option<Uuid>,
  pub tags:            Vec<Tag>,
  pub is_active:       bool,
  pub views_count:     i64,
  pub downloads_count: i64,
  /// Mean of all rating scores; 0.0 when the resource has no ratings.
  pub average_rating:  f64,
  pub total_ratings:   i64,
  pub created_at:      DateTime<Utc>,
}

impl Resource {
  /// The iframe-embeddable URL for video resources.
  pub fn embed_url(&self) -> Option<String> {
    self.video_url.as_deref().map(youtube::embed_url)
  }

  pub fn has_tag(&self, tag_id: Uuid) -> bool {
    self.tags.iter().any(|t| t.tag_id == tag_id)
  }
}

// ─── NewResource ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::LibraryStore::add_resource`]. Tags are given by
/// name and created on demand.
#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
  pub title:         String,
  #[serde(default)]
  pub description:   Option<String>,
  pub resource_type: ResourceType,
  pub file_type:     FileType,
  #[serde(default)]
  pub file:          Option<String>,
  #[serde(default)]
  pub video_url:     Option<String>,
  pub uploader_id:   Uuid,
  #[serde(default)]
  pub subject_id:    Option<Uuid>,
  #[serde(default)]
  pub tags:          Vec<String>,
}

impl NewResource {
  /// Check the content rules: exactly one of file or video URL, the
  /// resource type must agree with whichever was given, and every tag name
  /// must normalise to something non-empty.
  pub fn validate(&self) -> Result<()> {
    let title = self.title.trim();
    if title.is_empty() {
      return Err(Error::InvalidResource("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
      return Err(Error::InvalidResource(format!(
        "title is longer than {MAX_TITLE_LEN} characters"
      )));
    }

    for tag in &self.tags {
      normalize_tag(tag)?;
    }

    let file = self.file.as_deref().is_some_and(|f| !f.trim().is_empty());
    let video = self
      .video_url
      .as_deref()
      .is_some_and(|u| !u.trim().is_empty());

    match (file, video) {
      (false, false) => Err(Error::InvalidResource(
        "either file or video URL must be provided".into(),
      )),
      (true, true) => Err(Error::InvalidResource(
        "only one of file or video URL should be provided".into(),
      )),
      (true, false) if self.resource_type != ResourceType::Document => {
        Err(Error::InvalidResource(
          "resource type must be Document when a file is provided".into(),
        ))
      }
      (false, true) if self.resource_type != ResourceType::Video => {
        Err(Error::InvalidResource(
          "resource type must be Video when a video URL is provided".into(),
        ))
      }
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn document() -> NewResource {
    NewResource {
      title:         "Calculus notes".into(),
      description:   None,
      resource_type: ResourceType::Document,
      file_type:     FileType::Pdf,
      file:          Some("resources/calc.pdf".into()),
      video_url:     None,
      uploader_id:   Uuid::new_v4(),
      subject_id:    None,
      tags:          vec![],
    }
  }

  #[test]
  fn document_with_file_is_valid() {
    assert!(document().validate().is_ok());
  }

  #[test]
  fn video_with_url_is_valid() {
    let mut r = document();
    r.resource_type = ResourceType::Video;
    r.file_type = FileType::YouTube;
    r.file = None;
    r.video_url = Some("https://youtu.be/dQw4w9WgXcQ".into());
    assert!(r.validate().is_ok());
  }

  #[test]
  fn missing_content_is_rejected() {
    let mut r = document();
    r.file = None;
    assert!(matches!(r.validate(), Err(Error::InvalidResource(_))));
  }

  #[test]
  fn blank_file_counts_as_missing() {
    let mut r = document();
    r.file = Some("  ".into());
    assert!(r.validate().is_err());
  }

  #[test]
  fn both_file_and_url_is_rejected() {
    let mut r = document();
    r.video_url = Some("https://youtu.be/dQw4w9WgXcQ".into());
    assert!(r.validate().is_err());
  }

  #[test]
  fn file_requires_document_type() {
    let mut r = document();
    r.resource_type = ResourceType::Video;
    assert!(r.validate().is_err());
  }

  #[test]
  fn url_requires_video_type() {
    let mut r = document();
    r.file = None;
    r.video_url = Some("https://youtu.be/dQw4w9WgXcQ".into());
    assert!(r.validate().is_err());
  }

  #[test]
  fn empty_title_is_rejected() {
    let mut r = document();
    r.title = " ".into();
    assert!(r.validate().is_err());
  }

  #[test]
  fn blank_tag_is_rejected() {
    let mut r = document();
    r.tags = vec!["algebra".into(), " \t".into()];
    assert!(matches!(r.validate(), Err(Error::EmptyTagName)));
  }

  #[test]
  fn file_type_strings() {
    assert_eq!(FileType::Docx.as_ref(), "DOCX");
    assert_eq!("YouTube".parse::<FileType>().unwrap(), FileType::YouTube);
    assert_eq!(
      serde_json::to_string(&FileType::Pdf).unwrap(),
      "\"PDF\""
    );
  }
}
