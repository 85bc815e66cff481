//! HTTP process surface for StudyHive.
//!
//! Wires the JSON API from `studyhive-api` under `/api`, wraps it in request
//! tracing, and loads [`ServerConfig`] from a TOML file layered under
//! `STUDYHIVE_*` environment variables.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use studyhive_core::store::LibraryStore;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `STUDYHIVE_PORT=9000`.
pub const ENV_PREFIX: &str = "STUDYHIVE";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite database file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("studyhive.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (optional) and overlay `STUDYHIVE_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API nested under `/api`, with every request
/// traced.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: LibraryStore + 'static,
{
  Router::new()
    .nest("/api", studyhive_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use studyhive_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_config_file_uses_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/studyhive.toml"))
      .unwrap();
    assert_eq!(cfg.port, ServerConfig::default().port);
    assert_eq!(cfg.store_path, PathBuf::from("studyhive.db"));
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir()
      .join(format!("studyhive-config-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "port = 9123\nstore_path = \"~/hive.db\"").unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9123);
    assert_eq!(cfg.address(), "127.0.0.1:9123");
    assert_eq!(cfg.store_path, PathBuf::from("~/hive.db"));
  }

  #[test]
  fn tilde_expands_against_home() {
    let plain = Path::new("/var/lib/studyhive.db");
    assert_eq!(expand_tilde(plain), plain);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/hive.db")),
        PathBuf::from(home).join("hive.db")
      );
    }
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());

    let resp = app(store.clone())
      .oneshot(Request::get("/api/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app(store)
      .oneshot(Request::get("/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
