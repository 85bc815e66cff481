//! Handlers for `/resources` endpoints other than search.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/resources` | Body: [`NewResource`]; 400 on invalid content, 404 on unknown uploader or subject |
//! | `GET`   | `/resources/{id}` | Detail, including `embed_url` for videos; 404 if not found |
//! | `PATCH` | `/resources/{id}` | Body: `{"is_active":false}` |
//! | `GET`   | `/resources/{id}/comments` | Oldest first |
//! | `POST`  | `/resources/{id}/comments` | Body: `{"user_id":"...","text":"...","parent_id":null}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use studyhive_core::{
  interaction::{Comment, NewComment},
  resource::{NewResource, Resource},
  store::LibraryStore,
};
use uuid::Uuid;

use crate::{error::ApiError, users::require_user};

/// Load a resource (active or not) or fail with 404.
pub(crate) async fn require_resource<S: LibraryStore>(
  store: &S,
  id: Uuid,
) -> Result<Resource, ApiError> {
  store
    .get_resource(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("resource {id} not found")))
}

/// A resource plus the fields only the detail view carries.
#[derive(Debug, Serialize)]
pub struct ResourceDetail {
  #[serde(flatten)]
  pub resource:  Resource,
  pub embed_url: Option<String>,
}

impl From<Resource> for ResourceDetail {
  fn from(resource: Resource) -> Self {
    let embed_url = resource.embed_url();
    Self { resource, embed_url }
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// `POST /resources`
pub async fn create<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewResource>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  require_user(store.as_ref(), body.uploader_id).await?;
  if let Some(subject_id) = body.subject_id {
    store
      .get_subject(subject_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| {
        ApiError::NotFound(format!("subject {subject_id} not found"))
      })?;
  }

  let resource = store.add_resource(body).await.map_err(ApiError::store)?;
  tracing::info!(
    resource_id = %resource.resource_id,
    uploader_id = %resource.uploader_id,
    "resource uploaded"
  );
  Ok((StatusCode::CREATED, Json(ResourceDetail::from(resource))))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /resources/{id}`
pub async fn get_one<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResourceDetail>, ApiError> {
  let resource = require_resource(store.as_ref(), id).await?;
  Ok(Json(resource.into()))
}

// ─── Activate / deactivate ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub is_active: bool,
}

/// `PATCH /resources/{id}`
pub async fn update<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<ResourceDetail>, ApiError> {
  let resource = store
    .set_resource_active(id, body.is_active)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("resource {id} not found")))?;
  Ok(Json(resource.into()))
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// `GET /resources/{id}/comments`
pub async fn comments<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  require_resource(store.as_ref(), id).await?;
  let comments = store.list_comments(id).await.map_err(ApiError::store)?;
  Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub user_id:   Uuid,
  pub text:      String,
  #[serde(default)]
  pub parent_id: Option<Uuid>,
}

/// `POST /resources/{id}/comments`
pub async fn add_comment<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewComment {
    user_id:     body.user_id,
    resource_id: id,
    text:        body.text,
    parent_id:   body.parent_id,
  };
  input.validate()?;
  require_user(store.as_ref(), input.user_id).await?;
  require_resource(store.as_ref(), id).await?;

  let comment = store.add_comment(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
