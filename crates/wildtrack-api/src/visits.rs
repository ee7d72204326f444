//! Handlers for `/animals/:id/locations` — the visited-sequence endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/animals/:id/locations` | Ordered visit list |
//! | `POST`   | `/animals/:id/locations/:point_id` | Append; 201 + created visit |
//! | `PUT`    | `/animals/:id/locations` | Body: [`UpdateBody`]; re-points one visit |
//! | `DELETE` | `/animals/:id/locations/:visit_id` | May cascade onto the second visit |
//!
//! Every mutation runs under the animal's write lock: the invariants are
//! computed from a full read of the visit list, so concurrent mutations for
//! one animal must not interleave.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wildtrack_core::{
  Error as CoreError,
  animal::Animal,
  sequence::{self, DeletePlan},
  store::TrackStore,
  visit::VisitedPoint,
};

use crate::{ApiState, ensure_positive, error::ApiError};

// ─── DTO ─────────────────────────────────────────────────────────────────────

/// Wire form of a [`VisitedPoint`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDto {
  pub id: i64,
  pub date_time_of_visit_location_point: DateTime<Utc>,
  pub location_point_id: i64,
}

impl From<VisitedPoint> for VisitDto {
  fn from(v: VisitedPoint) -> Self {
    Self {
      id: v.visit_id,
      date_time_of_visit_location_point: v.visited_at,
      location_point_id: v.point_id,
    }
  }
}

// ─── Shared resolution ───────────────────────────────────────────────────────

async fn resolve_animal<S>(state: &ApiState<S>, animal_id: i64) -> Result<Animal, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state.store
    .get_animal(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| CoreError::AnimalNotFound(animal_id).into())
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /animals/:id/locations` — the full ordered visit list.
pub async fn list<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(animal_id): Path<i64>,
) -> Result<Json<Vec<VisitDto>>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;
  resolve_animal(&state, animal_id).await?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(visits.into_iter().map(VisitDto::from).collect()))
}

// ─── Append ──────────────────────────────────────────────────────────────────

/// `POST /animals/:id/locations/:point_id` — returns 201 + the created
/// visit with its server-assigned timestamp.
pub async fn append<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path((animal_id, point_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;
  ensure_positive("pointId", point_id)?;

  let lock = state.visit_lock(animal_id).await;
  let _guard = lock.lock().await;

  let animal = resolve_animal(&state, animal_id).await?;

  let point = state.store
    .get_point(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(point_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  sequence::check_append(&animal, &visits, point.point_id)?;

  let visit = state.store
    .append_visit(animal_id, point.point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(VisitDto::from(visit))))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /animals/:id/locations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  /// The visit record to re-point.
  pub visited_location_point_id: i64,
  /// The new location.
  pub location_point_id: i64,
}

/// `PUT /animals/:id/locations` — re-points one visit; id and timestamp
/// stay unchanged.
pub async fn update<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(animal_id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<VisitDto>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;
  ensure_positive("visitedLocationPointId", body.visited_location_point_id)?;
  ensure_positive("locationPointId", body.location_point_id)?;

  let lock = state.visit_lock(animal_id).await;
  let _guard = lock.lock().await;

  let animal = resolve_animal(&state, animal_id).await?;

  state.store
    .get_visit(body.visited_location_point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::VisitNotFound(body.visited_location_point_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let idx = sequence::position_of(&animal, &visits, body.visited_location_point_id)?;

  let point = state.store
    .get_point(body.location_point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(body.location_point_id))?;

  sequence::check_update(&animal, &visits, idx, point.point_id)?;

  let updated = state.store
    .update_visit_point(body.visited_location_point_id, point.point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(VisitDto::from(updated)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /animals/:id/locations/:visit_id`
///
/// Deleting the earliest visit also removes the second one when that second
/// visit sits on the chipping point; the pair goes in one transaction.
pub async fn remove<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path((animal_id, visit_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;
  ensure_positive("visitedPointId", visit_id)?;

  let lock = state.visit_lock(animal_id).await;
  let _guard = lock.lock().await;

  let animal = resolve_animal(&state, animal_id).await?;

  state.store
    .get_visit(visit_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::VisitNotFound(visit_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let idx = sequence::position_of(&animal, &visits, visit_id)?;

  match sequence::plan_delete(&animal, &visits, idx) {
    DeletePlan::Pair(first, second) => {
      state.store
        .delete_visit_pair(first, second)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
    }
    DeletePlan::Single(id) => {
      state.store
        .delete_visit(id)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
    }
  }

  Ok(StatusCode::OK)
}
