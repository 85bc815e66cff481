//! The SQLite implementation of [`LibraryStore`].

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use rusqlite::{OptionalExtension as _, params_from_iter};
use uuid::Uuid;

use studyhive_core::{
  catalog::{NewSubject, Subject, Tag, normalize_tag},
  interaction::{
    Bookmark, BookmarkedResource, Comment, Download, Interaction, NewComment,
    Rating, Score, View,
  },
  resource::{NewResource, Resource},
  store::{
    DEFAULT_SEARCH_LIMIT, LibraryStore, RelatedQuery, ResourceOrder,
    ResourceQuery,
  },
  user::{NewUser, ProfileUpdate, User},
};

use crate::{
  Error, Result,
  encode::{
    RESOURCE_SELECT, RawComment, RawEvent, RawRating, RawResource, RawSubject,
    RawTag, RawUser, decode_dt, encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── SQL fragments ───────────────────────────────────────────────────────────

const USER_SELECT: &str =
  "SELECT user_id, username, email, bio, avatar, joined_at FROM users";
const SUBJECT_SELECT: &str =
  "SELECT subject_id, name, description FROM subjects";
const TAG_SELECT: &str = "SELECT tag_id, name FROM tags";

const USER_EXISTS: &str = "SELECT 1 FROM users WHERE user_id = ?1";
const RESOURCE_EXISTS: &str = "SELECT 1 FROM resources WHERE resource_id = ?1";
const SUBJECT_EXISTS: &str = "SELECT 1 FROM subjects WHERE subject_id = ?1";

/// Ranking for [`LibraryStore::top_resources`]: the metric, then newest,
/// then smallest id so equal metrics still order deterministically.
fn order_clause(order: ResourceOrder) -> &'static str {
  match order {
    ResourceOrder::Views => {
      "r.views_count DESC, r.created_at DESC, r.resource_id ASC"
    }
    ResourceOrder::Downloads => {
      "r.downloads_count DESC, r.created_at DESC, r.resource_id ASC"
    }
    ResourceOrder::Rating => {
      "average_rating DESC, r.created_at DESC, r.resource_id ASC"
    }
    ResourceOrder::Newest => "r.created_at DESC, r.resource_id ASC",
  }
}

/// An id set as a JSON array, bound as one parameter and expanded with
/// `json_each`. SQLite caps bound variables per statement; an interaction
/// history is not.
fn id_array(ids: &HashSet<Uuid>) -> String {
  let ids: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
  serde_json::Value::from(ids).to_string()
}

/// Membership test of `column` against an [`id_array`] parameter.
fn in_id_array(column: &str) -> String {
  format!("{column} IN (SELECT value FROM json_each(?))")
}

/// A `LIKE` pattern matching `text` anywhere, with wildcards escaped by `\`.
fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.to_lowercase().chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Connection-level helpers ────────────────────────────────────────────────

fn exists(
  conn: &rusqlite::Connection,
  sql: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, [id], |_| Ok(())).optional()?.is_some())
}

/// The lookup error for whichever side of a user/resource pair is missing.
fn missing_ref(
  conn: &rusqlite::Connection,
  user_id: Uuid,
  resource_id: Uuid,
) -> rusqlite::Result<Option<Error>> {
  if !exists(conn, USER_EXISTS, &encode_uuid(user_id))? {
    return Ok(Some(Error::UserNotFound(user_id)));
  }
  if !exists(conn, RESOURCE_EXISTS, &encode_uuid(resource_id))? {
    return Ok(Some(Error::ResourceNotFound(resource_id)));
  }
  Ok(None)
}

/// Run a [`RESOURCE_SELECT`]-based query and attach each row's tags.
fn query_resources<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawResource>> {
  let mut stmt = conn.prepare(sql)?;
  let mut raws = stmt
    .query_map(params, RawResource::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut tag_stmt = conn.prepare_cached(
    "SELECT t.tag_id, t.name
     FROM resource_tags rt
     JOIN tags t ON t.tag_id = rt.tag_id
     WHERE rt.resource_id = ?1
     ORDER BY t.name",
  )?;
  for raw in &mut raws {
    raw.tags = tag_stmt
      .query_map([&raw.resource_id], RawTag::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
  }

  Ok(raws)
}

/// Get-or-create a tag by its already-normalised name.
fn ensure_tag_in(
  conn: &rusqlite::Connection,
  name: &str,
) -> rusqlite::Result<RawTag> {
  conn.execute(
    "INSERT INTO tags (tag_id, name) VALUES (?1, ?2)
     ON CONFLICT(name) DO NOTHING",
    rusqlite::params![encode_uuid(Uuid::new_v4()), name],
  )?;
  conn.query_row(
    &format!("{TAG_SELECT} WHERE name = ?1"),
    [name],
    RawTag::from_row,
  )
}

// ─── Engagement counters ─────────────────────────────────────────────────────

/// A logged event that also bumps a counter on the resource.
#[derive(Clone, Copy)]
enum Engagement {
  View,
  Download,
}

impl Engagement {
  fn insert_sql(self) -> &'static str {
    match self {
      Self::View => {
        "INSERT INTO views (view_id, user_id, resource_id, viewed_at)
         VALUES (?1, ?2, ?3, ?4)"
      }
      Self::Download => {
        "INSERT INTO downloads (download_id, user_id, resource_id, downloaded_at)
         VALUES (?1, ?2, ?3, ?4)"
      }
    }
  }

  fn bump_sql(self) -> &'static str {
    match self {
      Self::View => {
        "UPDATE resources SET views_count = views_count + 1 WHERE resource_id = ?1"
      }
      Self::Download => {
        "UPDATE resources SET downloads_count = downloads_count + 1
         WHERE resource_id = ?1"
      }
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A StudyHive library backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a view or download row and bump the matching counter in one
  /// transaction. Returns the event id and timestamp.
  async fn log_engagement(
    &self,
    kind: Engagement,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> Result<(Uuid, chrono::DateTime<chrono::Utc>)> {
    let event_id = Uuid::new_v4();
    let at = now();

    let id_str       = encode_uuid(event_id);
    let user_str     = encode_uuid(user_id);
    let resource_str = encode_uuid(resource_id);
    let at_str       = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) = missing_ref(&tx, user_id, resource_id)? {
          return Ok(Err(err));
        }
        tx.execute(
          kind.insert_sql(),
          rusqlite::params![id_str, user_str, resource_str, at_str],
        )?;
        tx.execute(kind.bump_sql(), [&resource_str])?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok((event_id, at))
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Overwrite a resource's engagement counters without logging events.
  pub(crate) async fn set_counts(
    &self,
    id: Uuid,
    views: i64,
    downloads: i64,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE resources SET views_count = ?2, downloads_count = ?3
           WHERE resource_id = ?1",
          rusqlite::params![id_str, views, downloads],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert `count` documents filed under `subject_id`, each uploaded and
  /// viewed once by `user_id`, in one transaction.
  pub(crate) async fn seed_viewed(
    &self,
    user_id: Uuid,
    subject_id: Uuid,
    count: usize,
  ) -> Result<()> {
    let user_str    = encode_uuid(user_id);
    let subject_str = encode_uuid(subject_id);
    let at_str      = encode_dt(now());
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut resource = tx.prepare(
            "INSERT INTO resources (resource_id, title, resource_type, file_type,
                                    file, uploader_id, subject_id, views_count,
                                    created_at)
             VALUES (?1, ?2, 'Document', 'PDF', ?3, ?4, ?5, 1, ?6)",
          )?;
          let mut view = tx.prepare(
            "INSERT INTO views (view_id, user_id, resource_id, viewed_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for i in 0..count {
            let id = encode_uuid(Uuid::new_v4());
            resource.execute(rusqlite::params![
              id,
              format!("Bulk {i}"),
              format!("resources/bulk-{i}.pdf"),
              user_str,
              subject_str,
              at_str
            ])?;
            view.execute(rusqlite::params![
              encode_uuid(Uuid::new_v4()),
              user_str,
              id,
              at_str
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── LibraryStore impl ───────────────────────────────────────────────────────

impl LibraryStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;

    let user = User {
      user_id:   Uuid::new_v4(),
      username:  input.username.trim().to_owned(),
      email:     input.email.trim().to_owned(),
      bio:       String::new(),
      avatar:    None,
      joined_at: now(),
    };

    let id_str = encode_uuid(user.user_id);
    let name   = user.username.clone();
    let email  = user.email.clone();
    let at_str = encode_dt(user.joined_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO users (user_id, username, email, joined_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(username) DO NOTHING",
          rusqlite::params![id_str, name, email, at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(user.username));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{USER_SELECT} WHERE user_id = ?1"),
              [id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let name = username.trim().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{USER_SELECT} WHERE username = ?1"),
              [name],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users
           SET bio = COALESCE(?2, bio), avatar = COALESCE(?3, avatar)
           WHERE user_id = ?1",
          rusqlite::params![id_str, update.bio, update.avatar],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("{USER_SELECT} WHERE user_id = ?1"),
              [id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Subjects and tags ─────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    input.validate()?;

    let subject = Subject {
      subject_id:  Uuid::new_v4(),
      name:        input.name.trim().to_owned(),
      description: input.description,
    };

    let id_str      = encode_uuid(subject.subject_id);
    let name        = subject.name.clone();
    let description = subject.description.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO subjects (subject_id, name, description)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(name) DO NOTHING",
          rusqlite::params![id_str, name, description],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::SubjectNameTaken(subject.name));
    }
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SUBJECT_SELECT} WHERE subject_id = ?1"),
              [id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SUBJECT_SELECT} ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn ensure_tag(&self, name: &str) -> Result<Tag> {
    let name = normalize_tag(name)?;

    let raw = self
      .conn
      .call(move |conn| Ok(ensure_tag_in(conn, &name)?))
      .await?;

    raw.into_tag()
  }

  async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{TAG_SELECT} WHERE tag_id = ?1"),
              [id_str],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn list_tags(&self) -> Result<Vec<Tag>> {
    let raws: Vec<RawTag> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{TAG_SELECT} ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawTag::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  // ── Resources ─────────────────────────────────────────────────────────────

  async fn add_resource(&self, input: NewResource) -> Result<Resource> {
    input.validate()?;

    let mut tag_names: Vec<String> = Vec::with_capacity(input.tags.len());
    for name in &input.tags {
      let name = normalize_tag(name)?;
      if !tag_names.contains(&name) {
        tag_names.push(name);
      }
    }

    let resource_id = Uuid::new_v4();
    let created_at  = now();
    let uploader_id = input.uploader_id;
    let subject_id  = input.subject_id;
    let title       = input.title.trim().to_owned();

    let id_str       = encode_uuid(resource_id);
    let uploader_str = encode_uuid(uploader_id);
    let subject_str  = subject_id.map(encode_uuid);
    let type_str     = input.resource_type.as_ref().to_owned();
    let file_str     = input.file_type.as_ref().to_owned();
    let at_str       = encode_dt(created_at);
    let row_title    = title.clone();
    let description  = input.description.clone();
    let file         = input.file.clone();
    let video_url    = input.video_url.clone();

    let raw_tags: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !exists(&tx, USER_EXISTS, &uploader_str)? {
          return Ok(Err(Error::UserNotFound(uploader_id)));
        }
        if let (Some(id), Some(s)) = (subject_id, &subject_str)
          && !exists(&tx, SUBJECT_EXISTS, s)?
        {
          return Ok(Err(Error::SubjectNotFound(id)));
        }

        tx.execute(
          "INSERT INTO resources (
             resource_id, title, description, resource_type, file_type,
             file, video_url, uploader_id, subject_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            row_title,
            description,
            type_str,
            file_str,
            file,
            video_url,
            uploader_str,
            subject_str,
            at_str,
          ],
        )?;

        let mut tags = Vec::with_capacity(tag_names.len());
        for name in &tag_names {
          let tag = ensure_tag_in(&tx, name)?;
          tx.execute(
            "INSERT OR IGNORE INTO resource_tags (resource_id, tag_id)
             VALUES (?1, ?2)",
            rusqlite::params![id_str, tag.tag_id],
          )?;
          tags.push(tag);
        }

        tx.commit()?;
        Ok(Ok(tags))
      })
      .await??;

    let mut tags = raw_tags
      .into_iter()
      .map(RawTag::into_tag)
      .collect::<Result<Vec<_>>>()?;
    tags.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!(%resource_id, %title, "resource added");

    Ok(Resource {
      resource_id,
      title,
      description: input.description,
      resource_type: input.resource_type,
      file_type: input.file_type,
      file: input.file,
      video_url: input.video_url,
      uploader_id,
      subject_id,
      tags,
      is_active: true,
      views_count: 0,
      downloads_count: 0,
      average_rating: 0.0,
      total_ratings: 0,
      created_at,
    })
  }

  async fn get_resource(&self, id: Uuid) -> Result<Option<Resource>> {
    let id_str = encode_uuid(id);

    let mut raws: Vec<RawResource> = self
      .conn
      .call(move |conn| {
        Ok(query_resources(
          conn,
          &format!("{RESOURCE_SELECT} WHERE r.resource_id = ?1"),
          [id_str],
        )?)
      })
      .await?;

    raws.pop().map(RawResource::into_resource).transpose()
  }

  async fn get_resources(&self, ids: &HashSet<Uuid>) -> Result<Vec<Resource>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids = id_array(ids);

    let raws: Vec<RawResource> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("{RESOURCE_SELECT} WHERE {}", in_id_array("r.resource_id"));
        Ok(query_resources(conn, &sql, [ids])?)
      })
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }

  async fn set_resource_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> Result<Option<Resource>> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE resources SET is_active = ?2 WHERE resource_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_resource(id).await
  }

  async fn search(&self, query: &ResourceQuery) -> Result<Vec<Resource>> {
    let text = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(like_pattern);
    let subject_str  = query.subject_id.map(encode_uuid);
    let tag_str      = query.tag_id.map(encode_uuid);
    let type_str     = query.resource_type.map(|t| t.as_ref().to_owned());
    let uploader_str = query.uploader_id.map(encode_uuid);
    let limit_val    = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawResource> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{RESOURCE_SELECT}
           WHERE r.is_active = 1
             AND (?1 IS NULL
                  OR LOWER(r.title) LIKE ?1 ESCAPE '\\'
                  OR LOWER(COALESCE(r.description, '')) LIKE ?1 ESCAPE '\\'
                  OR EXISTS (
                    SELECT 1 FROM resource_tags rt
                    JOIN tags t ON t.tag_id = rt.tag_id
                    WHERE rt.resource_id = r.resource_id
                      AND t.name LIKE ?1 ESCAPE '\\'))
             AND (?2 IS NULL OR r.subject_id = ?2)
             AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM resource_tags rt
                    WHERE rt.resource_id = r.resource_id AND rt.tag_id = ?3))
             AND (?4 IS NULL OR r.resource_type = ?4)
             AND (?5 IS NULL OR r.uploader_id = ?5)
           ORDER BY {}
           LIMIT ?6 OFFSET ?7",
          order_clause(ResourceOrder::Newest)
        );
        Ok(query_resources(
          conn,
          &sql,
          rusqlite::params![
            text,
            subject_str,
            tag_str,
            type_str,
            uploader_str,
            limit_val,
            offset_val,
          ],
        )?)
      })
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }

  // ── Engagement ────────────────────────────────────────────────────────────

  async fn record_view(&self, user_id: Uuid, resource_id: Uuid) -> Result<View> {
    let (view_id, viewed_at) = self
      .log_engagement(Engagement::View, user_id, resource_id)
      .await?;
    Ok(View { view_id, user_id, resource_id, viewed_at })
  }

  async fn record_download(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> Result<Download> {
    let (download_id, downloaded_at) = self
      .log_engagement(Engagement::Download, user_id, resource_id)
      .await?;
    Ok(Download { download_id, user_id, resource_id, downloaded_at })
  }

  async fn rate(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
    score: Score,
  ) -> Result<Rating> {
    let id_str       = encode_uuid(Uuid::new_v4());
    let user_str     = encode_uuid(user_id);
    let resource_str = encode_uuid(resource_id);
    let score_val    = i64::from(score);
    let at_str       = encode_dt(now());

    let raw: RawRating = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) = missing_ref(&tx, user_id, resource_id)? {
          return Ok(Err(err));
        }
        tx.execute(
          "INSERT INTO ratings (rating_id, user_id, resource_id, score, rated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(user_id, resource_id)
           DO UPDATE SET score = excluded.score, rated_at = excluded.rated_at",
          rusqlite::params![id_str, user_str, resource_str, score_val, at_str],
        )?;
        let raw = tx.query_row(
          "SELECT rating_id, user_id, resource_id, score, rated_at
           FROM ratings WHERE user_id = ?1 AND resource_id = ?2",
          [&user_str, &resource_str],
          RawRating::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_rating()
  }

  async fn user_interactions(&self, user_id: Uuid) -> Result<Vec<Interaction>> {
    let user_str = encode_uuid(user_id);

    let (views, downloads, ratings): (Vec<RawEvent>, Vec<RawEvent>, Vec<RawRating>) =
      self
        .conn
        .call(move |conn| {
          let views = conn
            .prepare(
              "SELECT view_id, user_id, resource_id, viewed_at
               FROM views WHERE user_id = ?1",
            )?
            .query_map([&user_str], RawEvent::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          let downloads = conn
            .prepare(
              "SELECT download_id, user_id, resource_id, downloaded_at
               FROM downloads WHERE user_id = ?1",
            )?
            .query_map([&user_str], RawEvent::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          let ratings = conn
            .prepare(
              "SELECT rating_id, user_id, resource_id, score, rated_at
               FROM ratings WHERE user_id = ?1",
            )?
            .query_map([&user_str], RawRating::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok((views, downloads, ratings))
        })
        .await?;

    let mut interactions = Vec::with_capacity(
      views.len() + downloads.len() + ratings.len(),
    );
    for raw in views {
      interactions.push(Interaction::View(raw.into_view()?));
    }
    for raw in downloads {
      interactions.push(Interaction::Download(raw.into_download()?));
    }
    for raw in ratings {
      interactions.push(Interaction::Rating(raw.into_rating()?));
    }
    interactions.sort_by_key(|i| std::cmp::Reverse(i.at()));

    Ok(interactions)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    input.validate()?;

    let comment = Comment {
      comment_id:   Uuid::new_v4(),
      user_id:      input.user_id,
      resource_id:  input.resource_id,
      text:         input.text.trim().to_owned(),
      parent_id:    input.parent_id,
      commented_at: now(),
    };

    let id_str       = encode_uuid(comment.comment_id);
    let user_str     = encode_uuid(comment.user_id);
    let resource_str = encode_uuid(comment.resource_id);
    let parent_str   = comment.parent_id.map(encode_uuid);
    let text         = comment.text.clone();
    let at_str       = encode_dt(comment.commented_at);
    let (user_id, resource_id, parent_id) =
      (comment.user_id, comment.resource_id, comment.parent_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) = missing_ref(&tx, user_id, resource_id)? {
          return Ok(Err(err));
        }
        if let (Some(parent), Some(parent_str)) = (parent_id, &parent_str) {
          let parent_resource: Option<String> = tx
            .query_row(
              "SELECT resource_id FROM comments WHERE comment_id = ?1",
              [parent_str],
              |r| r.get(0),
            )
            .optional()?;
          match parent_resource {
            None => return Ok(Err(Error::CommentNotFound(parent))),
            Some(r) if r != resource_str => {
              return Ok(Err(Error::ParentCommentMismatch {
                comment:  parent,
                resource: resource_id,
              }));
            }
            Some(_) => {}
          }
        }
        tx.execute(
          "INSERT INTO comments (
             comment_id, user_id, resource_id, text, parent_id, commented_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            user_str,
            resource_str,
            text,
            parent_str,
            at_str
          ],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(comment)
  }

  async fn list_comments(&self, resource_id: Uuid) -> Result<Vec<Comment>> {
    let resource_str = encode_uuid(resource_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, user_id, resource_id, text, parent_id, commented_at
           FROM comments
           WHERE resource_id = ?1
           ORDER BY commented_at ASC, comment_id ASC",
        )?;
        let rows = stmt
          .query_map([resource_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Bookmarks ─────────────────────────────────────────────────────────────

  async fn add_bookmark(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> Result<Bookmark> {
    let user_str     = encode_uuid(user_id);
    let resource_str = encode_uuid(resource_id);
    let at_str       = encode_dt(now());

    let stored_at: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) = missing_ref(&tx, user_id, resource_id)? {
          return Ok(Err(err));
        }
        tx.execute(
          "INSERT INTO bookmarks (user_id, resource_id, bookmarked_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(user_id, resource_id) DO NOTHING",
          rusqlite::params![user_str, resource_str, at_str],
        )?;
        let at: String = tx.query_row(
          "SELECT bookmarked_at FROM bookmarks
           WHERE user_id = ?1 AND resource_id = ?2",
          [&user_str, &resource_str],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(Ok(at))
      })
      .await??;

    Ok(Bookmark { user_id, resource_id, bookmarked_at: decode_dt(&stored_at)? })
  }

  async fn remove_bookmark(
    &self,
    user_id: Uuid,
    resource_id: Uuid,
  ) -> Result<bool> {
    let user_str     = encode_uuid(user_id);
    let resource_str = encode_uuid(resource_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM bookmarks WHERE user_id = ?1 AND resource_id = ?2",
          [user_str, resource_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list_bookmarks(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<BookmarkedResource>> {
    let user_str = encode_uuid(user_id);

    let (raws, saved_at): (Vec<RawResource>, HashMap<String, String>) = self
      .conn
      .call(move |conn| {
        let raws = query_resources(
          conn,
          &format!(
            "{RESOURCE_SELECT}
             JOIN bookmarks b ON b.resource_id = r.resource_id
             WHERE b.user_id = ?1 AND r.is_active = 1
             ORDER BY b.bookmarked_at DESC, r.resource_id ASC"
          ),
          [&user_str],
        )?;
        let saved_at = conn
          .prepare(
            "SELECT resource_id, bookmarked_at FROM bookmarks WHERE user_id = ?1",
          )?
          .query_map([&user_str], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok((raws, saved_at))
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| {
        let at = saved_at
          .get(&raw.resource_id)
          .ok_or_else(|| Error::DateParse("bookmark timestamp missing".into()))?;
        let bookmarked_at = decode_dt(at)?;
        Ok(BookmarkedResource { resource: raw.into_resource()?, bookmarked_at })
      })
      .collect()
  }

  // ── Ranked reads ──────────────────────────────────────────────────────────

  async fn top_resources(
    &self,
    order: ResourceOrder,
    limit: usize,
  ) -> Result<Vec<Resource>> {
    let limit_val = limit as i64;

    let raws: Vec<RawResource> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{RESOURCE_SELECT} WHERE r.is_active = 1 ORDER BY {} LIMIT ?1",
          order_clause(order)
        );
        Ok(query_resources(conn, &sql, [limit_val])?)
      })
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }

  async fn related_resources(
    &self,
    query: &RelatedQuery,
  ) -> Result<Vec<Resource>> {
    if query.is_empty() || query.limit == 0 {
      return Ok(Vec::new());
    }

    let mut matches = Vec::with_capacity(2);
    let mut params: Vec<String> = Vec::new();

    if !query.subjects.is_empty() {
      matches.push(in_id_array("r.subject_id"));
      params.push(id_array(&query.subjects));
    }
    if !query.tags.is_empty() {
      matches.push(format!(
        "EXISTS (SELECT 1 FROM resource_tags rt
                 WHERE rt.resource_id = r.resource_id
                   AND {})",
        in_id_array("rt.tag_id")
      ));
      params.push(id_array(&query.tags));
    }

    let mut sql = format!(
      "{RESOURCE_SELECT} WHERE r.is_active = 1 AND ({})",
      matches.join(" OR ")
    );
    if !query.exclude.is_empty() {
      sql.push_str(&format!(" AND NOT {}", in_id_array("r.resource_id")));
      params.push(id_array(&query.exclude));
    }
    sql.push_str(&format!(
      " ORDER BY {} LIMIT {}",
      order_clause(ResourceOrder::Views),
      query.limit
    ));

    let raws: Vec<RawResource> = self
      .conn
      .call(move |conn| Ok(query_resources(conn, &sql, params_from_iter(params))?))
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("100%_Sure"), "%100\\%\\_sure%");
  }

  #[test]
  fn id_arrays_are_json() {
    let id = Uuid::nil();
    let ids = HashSet::from([id]);
    assert_eq!(id_array(&ids), format!("[\"{}\"]", encode_uuid(id)));
    assert_eq!(id_array(&HashSet::new()), "[]");
  }
}
