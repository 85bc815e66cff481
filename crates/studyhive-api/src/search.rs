//! Handler for `GET /resources`.
//!
//! Query params map directly to [`ResourceQuery`] fields. Only active
//! resources are returned, newest first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use studyhive_core::{
  resource::{Resource, ResourceType},
  store::{LibraryStore, ResourceQuery},
};
use uuid::Uuid;

use crate::error::ApiError;

/// `?limit=&offset=` on listing endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive match over title, description and tag names.
  pub q:             Option<String>,
  pub subject_id:    Option<Uuid>,
  pub tag_id:        Option<Uuid>,
  pub resource_type: Option<ResourceType>,
  pub uploader_id:   Option<Uuid>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

/// `GET /resources[?q=...][&subject_id=...][&tag_id=...][&resource_type=...][&uploader_id=...][&limit=...][&offset=...]`
pub async fn handler<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let query = ResourceQuery {
    text:          params.q,
    subject_id:    params.subject_id,
    tag_id:        params.tag_id,
    resource_type: params.resource_type,
    uploader_id:   params.uploader_id,
    limit:         params.limit,
    offset:        params.offset,
  };

  let resources = store.search(&query).await.map_err(ApiError::store)?;
  Ok(Json(resources))
}
