//! Handlers that record a user's engagement with a resource.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/resources/{id}/views` | Body: `{"user_id":"..."}` |
//! | `POST`   | `/resources/{id}/downloads` | Body: `{"user_id":"..."}` |
//! | `PUT`    | `/resources/{id}/rating` | Body: `{"user_id":"...","score":4}`; 400 unless 1–5 |
//! | `POST`   | `/resources/{id}/bookmark` | Body: `{"user_id":"..."}`; idempotent |
//! | `DELETE` | `/resources/{id}/bookmark` | `?user_id=...`; 404 if not bookmarked |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use studyhive_core::{
  interaction::{Bookmark, Download, Rating, Score, View},
  store::LibraryStore,
};
use uuid::Uuid;

use crate::{error::ApiError, resources::require_resource, users::require_user};

/// Identifies the acting user, in a body or a query string.
#[derive(Debug, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
}

async fn require_pair<S: LibraryStore>(
  store: &S,
  user_id: Uuid,
  resource_id: Uuid,
) -> Result<(), ApiError> {
  require_user(store, user_id).await?;
  require_resource(store, resource_id).await?;
  Ok(())
}

// ─── Views and downloads ─────────────────────────────────────────────────────

/// `POST /resources/{id}/views`
pub async fn view<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(actor): Json<Actor>,
) -> Result<(StatusCode, Json<View>), ApiError> {
  require_pair(store.as_ref(), actor.user_id, id).await?;
  let view = store
    .record_view(actor.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /resources/{id}/downloads`
pub async fn download<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(actor): Json<Actor>,
) -> Result<(StatusCode, Json<Download>), ApiError> {
  require_pair(store.as_ref(), actor.user_id, id).await?;
  let download = store
    .record_download(actor.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(download)))
}

// ─── Rating ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RateBody {
  pub user_id: Uuid,
  pub score:   i64,
}

/// `PUT /resources/{id}/rating`
pub async fn rate<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RateBody>,
) -> Result<Json<Rating>, ApiError> {
  let score = Score::new(body.score)?;
  require_pair(store.as_ref(), body.user_id, id).await?;
  let rating = store
    .rate(body.user_id, id, score)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rating))
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

/// `POST /resources/{id}/bookmark`
pub async fn bookmark<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(actor): Json<Actor>,
) -> Result<Json<Bookmark>, ApiError> {
  require_pair(store.as_ref(), actor.user_id, id).await?;
  let bookmark = store
    .add_bookmark(actor.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bookmark))
}

/// `DELETE /resources/{id}/bookmark?user_id=...`
pub async fn unbookmark<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(actor): Query<Actor>,
) -> Result<impl IntoResponse, ApiError> {
  let removed = store
    .remove_bookmark(actor.user_id, id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!(
      "user {} has not bookmarked resource {id}",
      actor.user_id
    )));
  }
  Ok(StatusCode::NO_CONTENT)
}
