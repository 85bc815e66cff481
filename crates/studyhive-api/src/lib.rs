//! JSON REST API for StudyHive.
//!
//! Exposes an axum [`Router`] backed by any
//! [`studyhive_core::store::LibraryStore`]. Authentication is out of scope:
//! the acting user is always passed explicitly as a `user_id`. Transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", studyhive_api::api_router(store.clone()))
//! ```

pub mod engagement;
pub mod error;
pub mod recommendations;
pub mod resources;
pub mod search;
pub mod subjects;
pub mod tags;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use studyhive_core::store::LibraryStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: LibraryStore + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>).patch(users::update::<S>))
    .route("/users/{id}/bookmarks", get(users::bookmarks::<S>))
    .route(
      "/users/{id}/recommendations",
      get(recommendations::for_user::<S>),
    )
    // Subjects and tags
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route("/subjects/{id}", get(subjects::get_one::<S>))
    .route("/subjects/{id}/resources", get(subjects::resources::<S>))
    .route("/tags", get(tags::list::<S>).post(tags::ensure::<S>))
    .route("/tags/{id}/resources", get(tags::resources::<S>))
    // Resources
    .route(
      "/resources",
      get(search::handler::<S>).post(resources::create::<S>),
    )
    .route(
      "/resources/{id}",
      get(resources::get_one::<S>).patch(resources::update::<S>),
    )
    .route(
      "/resources/{id}/comments",
      get(resources::comments::<S>).post(resources::add_comment::<S>),
    )
    // Engagement
    .route("/resources/{id}/views", post(engagement::view::<S>))
    .route("/resources/{id}/downloads", post(engagement::download::<S>))
    .route("/resources/{id}/rating", put(engagement::rate::<S>))
    .route(
      "/resources/{id}/bookmark",
      post(engagement::bookmark::<S>).delete(engagement::unbookmark::<S>),
    )
    // Recommendations
    .route("/recommendations/popular", get(recommendations::popular::<S>))
    .route(
      "/recommendations/popular/merged",
      get(recommendations::merged_popular::<S>),
    )
    .route("/recommendations/recent", get(recommendations::recent::<S>))
    .route("/recommendations/affinity", get(recommendations::affinity::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
