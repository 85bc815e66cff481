//! Handlers for `/tags` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tags` | Sorted by name |
//! | `POST` | `/tags` | Body: `{"name":"Math"}`; returns the existing tag if the normalised name is known |
//! | `GET`  | `/tags/{id}/resources` | Active resources, newest first; `?limit=&offset=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use studyhive_core::{
  catalog::{Tag, normalize_tag},
  resource::Resource,
  store::{LibraryStore, ResourceQuery},
};
use uuid::Uuid;

use crate::{error::ApiError, search::PageParams};

/// `GET /tags`
pub async fn list<S: LibraryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Tag>>, ApiError> {
  let tags = store.list_tags().await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /tags`
pub async fn ensure<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<Tag>, ApiError> {
  let name = normalize_tag(&body.name)?;
  let tag = store.ensure_tag(&name).await.map_err(ApiError::store)?;
  Ok(Json(tag))
}

/// `GET /tags/{id}/resources`
pub async fn resources<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  store
    .get_tag(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tag {id} not found")))?;

  let query = ResourceQuery {
    tag_id: Some(id),
    limit: page.limit,
    offset: page.offset,
    ..Default::default()
  };
  let resources = store.search(&query).await.map_err(ApiError::store)?;
  Ok(Json(resources))
}
