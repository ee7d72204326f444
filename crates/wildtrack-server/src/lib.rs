//! Server assembly for wildtrack.
//!
//! Wraps the store-generic API router with single-user Basic auth and
//! request tracing. Mutating methods require credentials; reads stay
//! anonymous, matching the original service's access model.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::{Request, State},
  http::Method,
  middleware::{self, Next},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use wildtrack_api::ApiState;
use wildtrack_core::store::TrackStore;

use auth::{AuthConfig, verify_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application router for `store` with `auth` guarding every
/// non-GET request.
pub fn router<S>(store: Arc<S>, auth: Arc<AuthConfig>) -> Router
where
  S: TrackStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  wildtrack_api::api_router(ApiState::new(store))
    .layer(middleware::from_fn_with_state(auth, require_auth))
    .layer(TraceLayer::new_for_http())
}

/// Reject unauthenticated mutating requests; reads pass through.
async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Response {
  if req.method() != Method::GET
    && let Err(rejection) = verify_auth(req.headers(), &auth)
  {
    return rejection.into_response();
  }
  next.run(req).await
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use wildtrack_store_sqlite::SqliteStore;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();

    router(
      Arc::new(store),
      Arc::new(AuthConfig {
        username:      "tracker".to_string(),
        password_hash: hash,
      }),
    )
  }

  fn auth_header() -> String {
    format!("Basic {}", B64.encode("tracker:secret"))
  }

  async fn send(
    app:    &Router,
    method: &str,
    uri:    &str,
    authed: bool,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if authed {
      builder = builder.header(header::AUTHORIZATION, auth_header());
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp   = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value  = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn create_point(app: &Router, lat: f64, lon: f64) -> i64 {
    let (status, body) = send(
      app,
      "POST",
      "/locations",
      true,
      Some(json!({ "latitude": lat, "longitude": lon })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "point create: {body}");
    body["id"].as_i64().unwrap()
  }

  async fn create_animal(app: &Router, chip_point: i64) -> i64 {
    let (status, body) = send(
      app,
      "POST",
      "/animals",
      true,
      Some(json!({
        "weight": 4.5,
        "length": 0.9,
        "height": 0.5,
        "gender": "FEMALE",
        "chippingLocationId": chip_point,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "animal create: {body}");
    body["id"].as_i64().unwrap()
  }

  async fn append_visit(app: &Router, animal: i64, point: i64) -> (StatusCode, Value) {
    send(app, "POST", &format!("/animals/{animal}/locations/{point}"), true, None).await
  }

  /// `(visit id, visited point id)` pairs in sequence order.
  async fn visit_list(app: &Router, animal: i64) -> Vec<(i64, i64)> {
    let (status, body) =
      send(app, "GET", &format!("/animals/{animal}/locations"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    body
      .as_array()
      .unwrap()
      .iter()
      .map(|v| (v["id"].as_i64().unwrap(), v["locationPointId"].as_i64().unwrap()))
      .collect()
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_mutations_return_401() {
    let app = app().await;

    let (status, _) = send(
      &app,
      "POST",
      "/locations",
      false,
      Some(json!({ "latitude": 0.0, "longitude": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay anonymous: a missing point is 404, not 401.
    let (status, _) = send(&app, "GET", "/locations/1", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn wrong_credentials_return_401() {
    let app = app().await;
    let bad = format!("Basic {}", B64.encode("tracker:wrong"));

    let req = Request::builder()
      .method("POST")
      .uri("/locations")
      .header(header::AUTHORIZATION, bad)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json!({ "latitude": 0.0, "longitude": 0.0 }).to_string()))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Point registry ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn point_create_get_and_duplicate_conflict() {
    let app = app().await;
    let id = create_point(&app, 52.5, 13.4).await;

    let (status, body) = send(&app, "GET", &format!("/locations/{id}"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"].as_f64(), Some(52.5));
    assert_eq!(body["longitude"].as_f64(), Some(13.4));

    let (status, _) = send(
      &app,
      "POST",
      "/locations",
      true,
      Some(json!({ "latitude": 52.5, "longitude": 13.4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn point_coordinates_are_range_checked() {
    let app = app().await;
    for (lat, lon) in [(90.5, 0.0), (-91.0, 0.0), (0.0, 180.5), (0.0, -181.0)] {
      let (status, _) = send(
        &app,
        "POST",
        "/locations",
        true,
        Some(json!({ "latitude": lat, "longitude": lon })),
      )
      .await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "({lat}, {lon})");
    }
  }

  #[tokio::test]
  async fn point_update_duplicate_check_excludes_self() {
    let app = app().await;
    let a = create_point(&app, 1.0, 1.0).await;
    let b = create_point(&app, 2.0, 2.0).await;

    // Re-asserting a point's own coordinates is fine.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/locations/{a}"),
      true,
      Some(json!({ "latitude": 1.0, "longitude": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Stealing another point's coordinates is not.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/locations/{b}"),
      true,
      Some(json!({ "latitude": 1.0, "longitude": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn point_delete_blocked_while_referenced() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let target = create_point(&app, 2.0, 2.0).await;
    let unused = create_point(&app, 3.0, 3.0).await;
    let animal = create_animal(&app, chip).await;
    append_visit(&app, animal, target).await;

    let (status, _) = send(&app, "DELETE", &format!("/locations/{chip}"), true, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "DELETE", &format!("/locations/{target}"), true, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/locations/{unused}"), true, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/locations/{unused}"), false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Animal lifecycle ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn animal_create_starts_alive() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let animal = create_animal(&app, chip).await;

    let (status, body) = send(&app, "GET", &format!("/animals/{animal}"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifeStatus"], "ALIVE");
    assert_eq!(body["chippingLocationId"].as_i64(), Some(chip));
    assert!(body["deathDateTime"].is_null());
    assert_eq!(body["visitedLocations"].as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn animal_create_rejects_bad_measurements_and_missing_point() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;

    let (status, _) = send(
      &app,
      "POST",
      "/animals",
      true,
      Some(json!({
        "weight": 0.0, "length": 0.9, "height": 0.5,
        "gender": "MALE", "chippingLocationId": chip,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
      &app,
      "POST",
      "/animals",
      true,
      Some(json!({
        "weight": 1.0, "length": 0.9, "height": 0.5,
        "gender": "MALE", "chippingLocationId": 999,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn dead_animal_cannot_be_revived_and_accepts_no_visits() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let target = create_point(&app, 2.0, 2.0).await;
    let animal = create_animal(&app, chip).await;

    let patch = |status: &str| {
      json!({
        "weight": 4.5, "length": 0.9, "height": 0.5,
        "gender": "FEMALE", "lifeStatus": status,
        "chippingLocationId": chip,
      })
    };

    let (status, body) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}"),
      true,
      Some(patch("DEAD")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifeStatus"], "DEAD");
    assert!(!body["deathDateTime"].is_null());

    // Appends are rejected outright.
    let (status, _) = append_visit(&app, animal, target).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The transition is one-way.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}"),
      true,
      Some(patch("ALIVE")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn animal_update_rejects_chip_point_matching_first_visit() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let target = create_point(&app, 2.0, 2.0).await;
    let animal = create_animal(&app, chip).await;
    append_visit(&app, animal, target).await;

    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}"),
      true,
      Some(json!({
        "weight": 4.5, "length": 0.9, "height": 0.5,
        "gender": "FEMALE", "lifeStatus": "ALIVE",
        "chippingLocationId": target,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn animal_delete_blocked_while_visits_exist() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let target = create_point(&app, 2.0, 2.0).await;
    let animal = create_animal(&app, chip).await;
    append_visit(&app, animal, target).await;

    let (status, _) = send(&app, "DELETE", &format!("/animals/{animal}"), true, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let visits = visit_list(&app, animal).await;
    let (status, _) = send(
      &app,
      "DELETE",
      &format!("/animals/{animal}/locations/{}", visits[0].0),
      true,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/animals/{animal}"), true, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/animals/{animal}"), false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Visited-sequence engine ───────────────────────────────────────────────

  #[tokio::test]
  async fn first_visit_may_not_be_the_chip_point() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let target = create_point(&app, 2.0, 2.0).await;
    let animal = create_animal(&app, chip).await;

    let (status, _) = append_visit(&app, animal, chip).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // A failed mutation leaves no trace.
    assert!(visit_list(&app, animal).await.is_empty());

    let (status, body) = append_visit(&app, animal, target).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["locationPointId"].as_i64(), Some(target));
    assert!(!body["dateTimeOfVisitLocationPoint"].is_null());

    // Once the animal has moved, returning to the chip point is legal.
    let (status, _) = append_visit(&app, animal, chip).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  #[tokio::test]
  async fn append_rejects_repeating_the_tail() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let a = create_point(&app, 2.0, 2.0).await;
    let b = create_point(&app, 3.0, 3.0).await;
    let animal = create_animal(&app, chip).await;

    append_visit(&app, animal, a).await;
    let (status, _) = append_visit(&app, animal, a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = append_visit(&app, animal, b).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
      visit_list(&app, animal).await.iter().map(|v| v.1).collect::<Vec<_>>(),
      vec![a, b]
    );
  }

  #[tokio::test]
  async fn visit_update_enforces_adjacency_and_chip_rules() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let a = create_point(&app, 2.0, 2.0).await;
    let b = create_point(&app, 3.0, 3.0).await;
    let c = create_point(&app, 4.0, 4.0).await;
    let animal = create_animal(&app, chip).await;

    append_visit(&app, animal, a).await;
    append_visit(&app, animal, b).await;
    let visits = visit_list(&app, animal).await;
    let first = visits[0].0;

    let update = |visit: i64, point: i64| {
      json!({ "visitedLocationPointId": visit, "locationPointId": point })
    };

    // Matching the successor's location.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}/locations"),
      true,
      Some(update(first, b)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // First visit onto the chip point.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}/locations"),
      true,
      Some(update(first, chip)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same location as the target currently holds.
    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}/locations"),
      true,
      Some(update(first, a)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A fresh location between distinct neighbours works, keeping id order.
    let (status, body) = send(
      &app,
      "PUT",
      &format!("/animals/{animal}/locations"),
      true,
      Some(update(first, c)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(first));
    assert_eq!(body["locationPointId"].as_i64(), Some(c));
    assert_eq!(
      visit_list(&app, animal).await.iter().map(|v| v.1).collect::<Vec<_>>(),
      vec![c, b]
    );
  }

  #[tokio::test]
  async fn visit_update_rejects_foreign_visits() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let a = create_point(&app, 2.0, 2.0).await;
    let b = create_point(&app, 3.0, 3.0).await;
    let first = create_animal(&app, chip).await;
    let second = create_animal(&app, chip).await;

    append_visit(&app, first, a).await;
    let foreign = visit_list(&app, first).await[0].0;

    let (status, _) = send(
      &app,
      "PUT",
      &format!("/animals/{second}/locations"),
      true,
      Some(json!({ "visitedLocationPointId": foreign, "locationPointId": b })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn deleting_first_visit_cascades_onto_chip_point_successor() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let a = create_point(&app, 2.0, 2.0).await;
    let animal = create_animal(&app, chip).await;

    // V = [a, chip]: the second entry sits on the chipping point.
    append_visit(&app, animal, a).await;
    append_visit(&app, animal, chip).await;
    let visits = visit_list(&app, animal).await;
    assert_eq!(visits.len(), 2);

    let (status, _) = send(
      &app,
      "DELETE",
      &format!("/animals/{animal}/locations/{}", visits[0].0),
      true,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(visit_list(&app, animal).await.is_empty());
  }

  #[tokio::test]
  async fn deleting_first_visit_without_chip_successor_removes_one() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let a = create_point(&app, 2.0, 2.0).await;
    let b = create_point(&app, 3.0, 3.0).await;
    let animal = create_animal(&app, chip).await;

    append_visit(&app, animal, a).await;
    append_visit(&app, animal, b).await;
    let visits = visit_list(&app, animal).await;

    let (status, _) = send(
      &app,
      "DELETE",
      &format!("/animals/{animal}/locations/{}", visits[0].0),
      true,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let remaining = visit_list(&app, animal).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].1, b);
  }

  #[tokio::test]
  async fn deleting_a_missing_visit_returns_404() {
    let app = app().await;
    let chip = create_point(&app, 1.0, 1.0).await;
    let animal = create_animal(&app, chip).await;

    let (status, _) = send(
      &app,
      "DELETE",
      &format!("/animals/{animal}/locations/999"),
      true,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn non_positive_ids_are_rejected() {
    let app = app().await;

    let (status, _) = send(&app, "GET", "/animals/0", false, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/locations/-3", false, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/animals/-1/locations/5", true, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
