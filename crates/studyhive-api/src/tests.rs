//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use studyhive_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

async fn register(app: &Router, name: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/users",
    Some(json!({ "username": name, "email": format!("{name}@example.com") })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["user_id"].as_str().unwrap().to_owned()
}

async fn upload(app: &Router, uploader: &str, title: &str, tags: &[&str]) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/resources",
    Some(json!({
      "title": title,
      "resource_type": "Document",
      "file_type": "PDF",
      "file": format!("resources/{title}.pdf"),
      "uploader_id": uploader,
      "tags": tags,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["resource_id"].as_str().unwrap().to_owned()
}

fn titles(body: &Value) -> Vec<&str> {
  body
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["title"].as_str().unwrap())
    .collect()
}

// ── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_fetch_user() {
  let app = app().await;
  let id = register(&app, "ada").await;

  let (status, body) = send(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "ada");
  assert_eq!(body["bio"], "");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
  let app = app().await;
  register(&app, "ada").await;

  let (status, body) = send(
    &app,
    "POST",
    "/users",
    Some(json!({ "username": "ada", "email": "other@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("ada"));
}

#[tokio::test]
async fn invalid_email_is_bad_request() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/users",
    Some(json!({ "username": "ada", "email": "not-an-address" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
  let app = app().await;
  let id = uuid::Uuid::new_v4();
  let (status, body) = send(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
}

#[tokio::test]
async fn edit_profile() {
  let app = app().await;
  let id = register(&app, "ada").await;

  let (status, body) = send(
    &app,
    "PATCH",
    &format!("/users/{id}"),
    Some(json!({ "bio": "Counts things" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["bio"], "Counts things");
  assert_eq!(body["avatar"], Value::Null);
}

// ── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subjects_and_their_resources() {
  let app = app().await;
  let ada = register(&app, "ada").await;

  let (status, subject) = send(
    &app,
    "POST",
    "/subjects",
    Some(json!({ "name": "Physics" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let subject_id = subject["subject_id"].as_str().unwrap();

  let (status, body) = send(
    &app,
    "POST",
    "/subjects",
    Some(json!({ "name": " Physics " })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("already exists"));

  let (status, _) = send(
    &app,
    "POST",
    "/resources",
    Some(json!({
      "title": "Optics",
      "resource_type": "Document",
      "file_type": "PDF",
      "file": "resources/optics.pdf",
      "uploader_id": ada,
      "subject_id": subject_id,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  upload(&app, &ada, "Unfiled", &[]).await;

  let (status, body) =
    send(&app, "GET", &format!("/subjects/{subject_id}/resources"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(titles(&body), ["Optics"]);
}

#[tokio::test]
async fn tags_are_get_or_create() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  upload(&app, &ada, "Limits", &["Calculus"]).await;

  let (status, tag) =
    send(&app, "POST", "/tags", Some(json!({ "name": " CALCULUS " }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(tag["name"], "calculus");

  let (_, all) = send(&app, "GET", "/tags", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);

  let tag_id = tag["tag_id"].as_str().unwrap();
  let (_, body) = send(&app, "GET", &format!("/tags/{tag_id}/resources"), None).await;
  assert_eq!(titles(&body), ["Limits"]);

  let (status, _) = send(&app, "POST", "/tags", Some(json!({ "name": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Resources ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn video_detail_includes_embed_url() {
  let app = app().await;
  let ada = register(&app, "ada").await;

  let (status, created) = send(
    &app,
    "POST",
    "/resources",
    Some(json!({
      "title": "Lecture 1",
      "resource_type": "Video",
      "file_type": "YouTube",
      "video_url": "https://youtu.be/dQw4w9WgXcQ",
      "uploader_id": ada,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = created["resource_id"].as_str().unwrap();

  let (status, body) = send(&app, "GET", &format!("/resources/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["embed_url"], "https://www.youtube.com/embed/dQw4w9WgXcQ");
  assert_eq!(body["average_rating"], 0.0);
}

#[tokio::test]
async fn upload_rejects_bad_content_and_unknown_uploader() {
  let app = app().await;
  let ada = register(&app, "ada").await;

  let (status, _) = send(
    &app,
    "POST",
    "/resources",
    Some(json!({
      "title": "Both",
      "resource_type": "Document",
      "file_type": "PDF",
      "file": "resources/both.pdf",
      "video_url": "https://youtu.be/dQw4w9WgXcQ",
      "uploader_id": ada,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    "POST",
    "/resources",
    Some(json!({
      "title": "Orphan",
      "resource_type": "Document",
      "file_type": "PDF",
      "file": "resources/orphan.pdf",
      "uploader_id": uuid::Uuid::new_v4(),
    })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_rejects_blank_tag_names() {
  let app = app().await;
  let ada = register(&app, "ada").await;

  let (status, body) = send(
    &app,
    "POST",
    "/resources",
    Some(json!({
      "title": "Tagged",
      "resource_type": "Document",
      "file_type": "PDF",
      "file": "resources/tagged.pdf",
      "uploader_id": ada,
      "tags": ["calculus", "  "],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("tag name"));

  let (_, all) = send(&app, "GET", "/resources", None).await;
  assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_and_deactivate() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let id = upload(&app, &ada, "Thermodynamics", &["heat"]).await;
  upload(&app, &ada, "Poetry", &[]).await;

  let (_, body) = send(&app, "GET", "/resources?q=HEAT", None).await;
  assert_eq!(titles(&body), ["Thermodynamics"]);

  let (status, body) = send(
    &app,
    "PATCH",
    &format!("/resources/{id}"),
    Some(json!({ "is_active": false })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["is_active"], false);

  let (_, body) = send(&app, "GET", "/resources", None).await;
  assert_eq!(titles(&body), ["Poetry"]);
}

// ── Engagement ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn views_and_ratings_update_resource() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let bob = register(&app, "bob").await;
  let id = upload(&app, &ada, "Notes", &[]).await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/resources/{id}/views"),
    Some(json!({ "user_id": bob })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = send(
    &app,
    "PUT",
    &format!("/resources/{id}/rating"),
    Some(json!({ "user_id": bob, "score": 6 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  for score in [2, 4] {
    let (status, body) = send(
      &app,
      "PUT",
      &format!("/resources/{id}/rating"),
      Some(json!({ "user_id": bob, "score": score })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], score);
  }

  let (_, body) = send(&app, "GET", &format!("/resources/{id}"), None).await;
  assert_eq!(body["views_count"], 1);
  assert_eq!(body["total_ratings"], 1);
  assert_eq!(body["average_rating"], 4.0);
}

#[tokio::test]
async fn engagement_with_unknown_user_is_not_found() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let id = upload(&app, &ada, "Notes", &[]).await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/resources/{id}/downloads"),
    Some(json!({ "user_id": uuid::Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_threads() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let id = upload(&app, &ada, "Notes", &[]).await;
  let other = upload(&app, &ada, "Other", &[]).await;

  let (status, root) = send(
    &app,
    "POST",
    &format!("/resources/{id}/comments"),
    Some(json!({ "user_id": ada, "text": "Nice" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = send(
    &app,
    "POST",
    &format!("/resources/{other}/comments"),
    Some(json!({ "user_id": ada, "text": "Reply", "parent_id": root["comment_id"] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(
    &app,
    "POST",
    &format!("/resources/{id}/comments"),
    Some(json!({ "user_id": ada, "text": "Reply", "parent_id": uuid::Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("comment not found"));

  let (status, _) = send(
    &app,
    "POST",
    &format!("/resources/{id}/comments"),
    Some(json!({ "user_id": ada, "text": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = send(&app, "GET", &format!("/resources/{id}/comments"), None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["text"], "Nice");
}

#[tokio::test]
async fn bookmark_lifecycle() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let id = upload(&app, &ada, "Notes", &[]).await;

  for _ in 0..2 {
    let (status, _) = send(
      &app,
      "POST",
      &format!("/resources/{id}/bookmark"),
      Some(json!({ "user_id": ada })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  let (_, body) = send(&app, "GET", &format!("/users/{ada}/bookmarks"), None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["resource"]["title"], "Notes");

  let uri = format!("/resources/{id}/bookmark?user_id={ada}");
  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Recommendations ─────────────────────────────────────────────────────────

async fn view_times(app: &Router, user: &str, resource: &str, times: usize) {
  for _ in 0..times {
    let (status, _) = send(
      app,
      "POST",
      &format!("/resources/{resource}/views"),
      Some(json!({ "user_id": user })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }
}

#[tokio::test]
async fn cold_start_recommendations_follow_popularity() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let newcomer = register(&app, "newcomer").await;

  for (title, views) in [("C", 1), ("A", 3), ("B", 2)] {
    let id = upload(&app, &ada, title, &[]).await;
    view_times(&app, &ada, &id, views).await;
  }

  let (status, body) =
    send(&app, "GET", &format!("/users/{newcomer}/recommendations"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(titles(&body), ["A", "B", "C"]);

  let (_, popular) = send(&app, "GET", "/recommendations/popular", None).await;
  assert_eq!(titles(&popular), ["A", "B", "C"]);

  let (_, recent) = send(&app, "GET", "/recommendations/recent", None).await;
  assert_eq!(titles(&recent).len(), 3);

  let (_, merged) = send(&app, "GET", "/recommendations/popular/merged", None).await;
  assert_eq!(titles(&merged).len(), 3);
}

#[tokio::test]
async fn affinity_surfaces_shared_tags() {
  let app = app().await;
  let ada = register(&app, "ada").await;
  let reader = register(&app, "reader").await;

  let read = upload(&app, &ada, "R", &["math"]).await;
  upload(&app, &ada, "S", &["math"]).await;
  let hit = upload(&app, &ada, "Hit", &[]).await;
  view_times(&app, &ada, &hit, 5).await;
  view_times(&app, &reader, &read, 1).await;

  let (status, body) = send(
    &app,
    "GET",
    &format!("/recommendations/affinity?user_id={reader}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(titles(&body), ["S"]);

  let (_, body) =
    send(&app, "GET", &format!("/users/{reader}/recommendations"), None).await;
  assert_eq!(titles(&body)[0], "S");
}

#[tokio::test]
async fn recommendation_edge_cases() {
  let app = app().await;
  let stranger = uuid::Uuid::new_v4();

  let (status, body) =
    send(&app, "GET", &format!("/users/{stranger}/recommendations"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.as_array().unwrap().is_empty());

  let (status, _) =
    send(&app, "GET", "/recommendations/popular?by=comments", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    send(&app, "GET", "/recommendations/popular?by=rating", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.as_array().unwrap().is_empty());
}
