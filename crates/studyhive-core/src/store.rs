//! The `LibraryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `studyhive-store-sqlite`). The API layer and the recommendation engine
//! depend on this abstraction, not on any concrete backend.

use std::{collections::HashSet, future::Future};

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  catalog::{NewSubject, Subject, Tag},
  interaction::{
    Bookmark, BookmarkedResource, Comment, Download, Interaction, NewComment,
    Rating, Score, View,
  },
  resource::{NewResource, Resource, ResourceType},
  user::{NewUser, ProfileUpdate, User},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// The column a ranked listing of active resources is sorted by, always
/// descending.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceOrder {
  Views,
  Downloads,
  /// Mean score over all ratings; unrated resources rank as 0.0.
  Rating,
  /// Creation timestamp.
  Newest,
}

/// Parameters for [`LibraryStore::related_resources`].
#[derive(Debug, Clone, Default)]
pub struct RelatedQuery {
  /// Match resources carrying any of these tags...
  pub tags:     HashSet<Uuid>,
  /// ...or filed under any of these subjects.
  pub subjects: HashSet<Uuid>,
  /// Never return these resources.
  pub exclude:  HashSet<Uuid>,
  pub limit:    usize,
}

impl RelatedQuery {
  pub fn is_empty(&self) -> bool {
    self.tags.is_empty() && self.subjects.is_empty()
  }
}

/// Parameters for [`LibraryStore::search`]. Only active resources are ever
/// returned; results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
  /// Case-insensitive match over title, description and tag names.
  pub text:          Option<String>,
  pub subject_id:    Option<Uuid>,
  pub tag_id:        Option<Uuid>,
  pub resource_type: Option<ResourceType>,
  pub uploader_id:   Option<Uuid>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

pub const DEFAULT_SEARCH_LIMIT: usize = 50;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// How a failed store operation should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The input broke a domain rule.
  Invalid,
  /// A record the operation refers to does not exist.
  NotFound,
  /// A uniqueness constraint rejected the write.
  Conflict,
  /// The backend itself failed.
  Internal,
}

/// Backend error types classify themselves so callers can respond without
/// knowing which backend is in use.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for std::convert::Infallible {
  fn kind(&self) -> ErrorKind { match *self {} }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a StudyHive library backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LibraryStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user. Fails if the username is already taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Apply a profile edit. Returns `None` if the user does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Subjects and tags ─────────────────────────────────────────────────

  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects, sorted by name.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Return the tag with this name, creating it if needed. Names are
  /// normalised with [`crate::catalog::normalize_tag`].
  fn ensure_tag<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + 'a;

  fn get_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  /// All tags, sorted by name.
  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  // ── Resources ─────────────────────────────────────────────────────────

  /// Validate and persist a new resource, creating its tags on demand.
  fn add_resource(
    &self,
    input: NewResource,
  ) -> impl Future<Output = Result<Resource, Self::Error>> + Send + '_;

  /// Retrieve a resource by id regardless of its active flag.
  fn get_resource(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Resource>, Self::Error>> + Send + '_;

  /// Retrieve several resources at once, regardless of their active flag.
  /// Unknown ids are skipped; no ordering is guaranteed.
  fn get_resources<'a>(
    &'a self,
    ids: &'a HashSet<Uuid>,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + 'a;

  /// Flip the active flag. Returns `None` if the resource does not exist.
  fn set_resource_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Option<Resource>, Self::Error>> + Send + '_;

  fn search<'a>(
    &'a self,
    query: &'a ResourceQuery,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + 'a;

  // ── Engagement ────────────────────────────────────────────────────────

  /// Record a view and bump the resource's view counter.
  fn record_view(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<View, Self::Error>> + Send + '_;

  /// Record a download and bump the resource's download counter.
  fn record_download(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<Download, Self::Error>> + Send + '_;

  /// Insert or replace the user's rating of a resource.
  fn rate(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
    score: Score,
  ) -> impl Future<Output = Result<Rating, Self::Error>> + Send + '_;

  /// Every view, download and rating recorded for the user, newest first.
  fn user_interactions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Interaction>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Add a comment. A reply's parent must be on the same resource.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// All comments on a resource, oldest first.
  fn list_comments(
    &self,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Bookmarks ─────────────────────────────────────────────────────────

  /// Bookmark a resource. Bookmarking twice returns the original bookmark.
  fn add_bookmark(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<Bookmark, Self::Error>> + Send + '_;

  /// Remove a bookmark. Returns `false` if there was none.
  fn remove_bookmark(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The user's bookmarked resources, most recently saved first.
  fn list_bookmarks(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BookmarkedResource>, Self::Error>>
  + Send
  + '_;

  // ── Ranked reads ──────────────────────────────────────────────────────

  /// The top `limit` active resources by `order`, descending. Ties go to
  /// the newer resource, then to the smaller id.
  fn top_resources(
    &self,
    order: ResourceOrder,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + '_;

  /// Active resources sharing a tag or subject with `query`, excluding
  /// `query.exclude`, ordered by view count descending with the same
  /// tie-breaks as [`LibraryStore::top_resources`].
  fn related_resources<'a>(
    &'a self,
    query: &'a RelatedQuery,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + 'a;
}
