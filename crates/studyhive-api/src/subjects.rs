//! Handlers for `/subjects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects` | Sorted by name |
//! | `POST` | `/subjects` | Body: `{"name":"Physics","description":"..."}`; 409 if the name exists |
//! | `GET`  | `/subjects/{id}` | 404 if not found |
//! | `GET`  | `/subjects/{id}/resources` | Active resources, newest first; `?limit=&offset=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use studyhive_core::{
  catalog::{NewSubject, Subject},
  resource::Resource,
  store::{LibraryStore, ResourceQuery},
};
use uuid::Uuid;

use crate::{error::ApiError, search::PageParams};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S: LibraryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = store.list_subjects().await.map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects`
pub async fn create<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;

  let subject = store.add_subject(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/{id}`
pub async fn get_one<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  let subject = store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Resources ────────────────────────────────────────────────────────────────

/// `GET /subjects/{id}/resources`
pub async fn resources<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  let query = ResourceQuery {
    subject_id: Some(id),
    limit: page.limit,
    offset: page.offset,
    ..Default::default()
  };
  let resources = store.search(&query).await.map_err(ApiError::store)?;
  Ok(Json(resources))
}
