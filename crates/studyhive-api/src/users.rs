//! Handlers for `/users` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/users` | Body: `{"username":"ada","email":"ada@example.com"}`; 409 if taken |
//! | `GET`   | `/users/{id}` | 404 if not found |
//! | `PATCH` | `/users/{id}` | Body: `{"bio":"...","avatar":"..."}`, both optional |
//! | `GET`   | `/users/{id}/bookmarks` | Active bookmarked resources, newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use studyhive_core::{
  interaction::BookmarkedResource,
  store::LibraryStore,
  user::{NewUser, ProfileUpdate, User},
};
use uuid::Uuid;

use crate::error::ApiError;

/// Load a user or fail with 404.
pub(crate) async fn require_user<S: LibraryStore>(
  store: &S,
  id: Uuid,
) -> Result<User, ApiError> {
  store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

// ─── Register ────────────────────────────────────────────────────────────────

/// `POST /users`
pub async fn create<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;

  let user = store.add_user(body).await.map_err(ApiError::store)?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  Ok(Json(require_user(store.as_ref(), id).await?))
}

// ─── Edit profile ────────────────────────────────────────────────────────────

/// `PATCH /users/{id}`
pub async fn update<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
  let user = store
    .update_profile(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

/// `GET /users/{id}/bookmarks`
pub async fn bookmarks<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<BookmarkedResource>>, ApiError> {
  require_user(store.as_ref(), id).await?;
  let saved = store.list_bookmarks(id).await.map_err(ApiError::store)?;
  Ok(Json(saved))
}
