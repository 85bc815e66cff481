//! Handlers exposing the recommendation engine.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{id}/recommendations` | Combined list, at most 10 |
//! | `GET`  | `/recommendations/popular` | `?by=views\|downloads\|rating`, default `views` |
//! | `GET`  | `/recommendations/popular/merged` | All three popularity lists, deduplicated |
//! | `GET`  | `/recommendations/recent` | Newest active resources |
//! | `GET`  | `/recommendations/affinity` | `?user_id=...`; tag and subject neighbours of the user's history |
//!
//! An unknown user id is treated like a user without history rather than
//! as a 404.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use studyhive_core::{
  recommend::{Popularity, Recommender, get_recommendations},
  resource::Resource,
  store::LibraryStore,
};
use uuid::Uuid;

use crate::{engagement::Actor, error::ApiError};

/// `GET /users/{id}/recommendations`
pub async fn for_user<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let resources = get_recommendations(store.as_ref(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(resources))
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
  #[serde(default = "default_popularity")]
  pub by: Popularity,
}

fn default_popularity() -> Popularity { Popularity::Views }

/// `GET /recommendations/popular[?by=views|downloads|rating]`
pub async fn popular<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<PopularParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let resources = Recommender::new(store.as_ref())
    .popular(params.by)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(resources))
}

/// `GET /recommendations/popular/merged`
pub async fn merged_popular<S: LibraryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let resources = Recommender::new(store.as_ref())
    .merged_popular()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(resources))
}

/// `GET /recommendations/recent`
pub async fn recent<S: LibraryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let resources = Recommender::new(store.as_ref())
    .recent()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(resources))
}

/// `GET /recommendations/affinity?user_id=...`
pub async fn affinity<S: LibraryStore>(
  State(store): State<Arc<S>>,
  Query(actor): Query<Actor>,
) -> Result<Json<Vec<Resource>>, ApiError> {
  let resources = Recommender::new(store.as_ref())
    .affinity(actor.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(resources))
}
