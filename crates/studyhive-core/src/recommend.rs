//! Recommendation engine.
//!
//! Five independent strategies each rank up to [`RECOMMENDATION_LIMIT`]
//! active resources:
//!
//! | Strategy | Ranking |
//! |----------|---------|
//! | popular by views | view count |
//! | popular by downloads | download count |
//! | popular by rating | mean rating score |
//! | recent | creation timestamp |
//! | affinity | view count among resources sharing a tag or subject with the user's history |
//!
//! A user's recommendations are affinity, then the three popularity lists,
//! then recent, deduplicated by resource id (first occurrence wins) and cut
//! to [`RECOMMENDATION_LIMIT`].
//!
//! Every call recomputes from the store; nothing is cached and nothing is
//! written.

use std::collections::HashSet;

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;
use uuid::Uuid;

use crate::{
  interaction::Interaction,
  resource::Resource,
  store::{LibraryStore, RelatedQuery, ResourceOrder},
};

pub const RECOMMENDATION_LIMIT: usize = 10;

/// The counter a popularity listing is ranked by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Popularity {
  Views,
  Downloads,
  Rating,
}

impl Popularity {
  /// The order in which popularity lists are merged.
  pub const ALL: [Self; 3] = [Self::Views, Self::Downloads, Self::Rating];
}

impl From<Popularity> for ResourceOrder {
  fn from(p: Popularity) -> Self {
    match p {
      Popularity::Views => ResourceOrder::Views,
      Popularity::Downloads => ResourceOrder::Downloads,
      Popularity::Rating => ResourceOrder::Rating,
    }
  }
}

/// Concatenate `lists` in order, keep the first occurrence of each
/// resource id, and stop after `limit` resources.
pub fn merge_unique<I>(lists: I, limit: usize) -> Vec<Resource>
where
  I: IntoIterator<Item = Vec<Resource>>,
{
  let mut seen = HashSet::new();
  let mut merged = Vec::new();

  for resource in lists.into_iter().flatten() {
    if merged.len() == limit {
      break;
    }
    if seen.insert(resource.resource_id) {
      merged.push(resource);
    }
  }

  merged
}

/// Stateless view over a store that answers recommendation queries.
#[derive(Debug)]
pub struct Recommender<'s, S> {
  store: &'s S,
  limit: usize,
}

impl<'s, S: LibraryStore> Recommender<'s, S> {
  pub fn new(store: &'s S) -> Self {
    Self { store, limit: RECOMMENDATION_LIMIT }
  }

  /// Override the per-strategy and overall result size.
  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = limit;
    self
  }

  pub async fn popular(
    &self,
    by: Popularity,
  ) -> Result<Vec<Resource>, S::Error> {
    self.store.top_resources(by.into(), self.limit).await
  }

  /// Views, downloads and rating listings merged without duplicates. Not
  /// truncated, so up to three times the limit.
  pub async fn merged_popular(&self) -> Result<Vec<Resource>, S::Error> {
    let mut lists = Vec::with_capacity(Popularity::ALL.len());
    for by in Popularity::ALL {
      lists.push(self.popular(by).await?);
    }
    Ok(merge_unique(lists, usize::MAX))
  }

  pub async fn recent(&self) -> Result<Vec<Resource>, S::Error> {
    self.store.top_resources(ResourceOrder::Newest, self.limit).await
  }

  /// Resources that share a tag or subject with anything the user viewed,
  /// downloaded or rated. Resources the user already touched are never
  /// included.
  pub async fn affinity(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Resource>, S::Error> {
    let touched: HashSet<Uuid> = self
      .store
      .user_interactions(user_id)
      .await?
      .iter()
      .map(Interaction::resource_id)
      .collect();

    if touched.is_empty() {
      return Ok(Vec::new());
    }

    let history = self.store.get_resources(&touched).await?;

    let mut query = RelatedQuery { limit: self.limit, ..Default::default() };
    for resource in &history {
      query.tags.extend(resource.tags.iter().map(|t| t.tag_id));
      query.subjects.extend(resource.subject_id);
    }
    if query.is_empty() {
      return Ok(Vec::new());
    }
    query.exclude = touched;

    self.store.related_resources(&query).await
  }

  /// The combined recommendation list for `user_id`.
  pub async fn recommend(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Resource>, S::Error> {
    let affinity = self.affinity(user_id).await?;
    let views = self.popular(Popularity::Views).await?;
    let downloads = self.popular(Popularity::Downloads).await?;
    let rating = self.popular(Popularity::Rating).await?;
    let recent = self.recent().await?;

    let counts = [
      affinity.len(),
      views.len(),
      downloads.len(),
      rating.len(),
      recent.len(),
    ];
    let merged =
      merge_unique([affinity, views, downloads, rating, recent], self.limit);

    debug!(
      %user_id,
      affinity = counts[0],
      views = counts[1],
      downloads = counts[2],
      rating = counts[3],
      recent = counts[4],
      returned = merged.len(),
      "merged recommendation strategies"
    );

    Ok(merged)
  }
}

/// Recommendations for `user_id` with the default limit.
pub async fn get_recommendations<S: LibraryStore>(
  store: &S,
  user_id: Uuid,
) -> Result<Vec<Resource>, S::Error> {
  Recommender::new(store).recommend(user_id).await
}
