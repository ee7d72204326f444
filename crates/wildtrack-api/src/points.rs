//! Handlers for `/locations` (point registry) endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/locations/:id` | Single point |
//! | `POST`   | `/locations` | 409 on duplicate coordinates |
//! | `PUT`    | `/locations/:id` | Duplicate check excludes the point itself |
//! | `DELETE` | `/locations/:id` | 400 while referenced by a visit or chip location |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use wildtrack_core::{
  Error as CoreError,
  point::{Point, validate_coordinates},
  store::TrackStore,
};

use crate::{ApiState, ensure_positive, error::ApiError};

// ─── DTO ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PointDto {
  pub id:        i64,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

impl From<Point> for PointDto {
  fn from(p: Point) -> Self {
    Self { id: p.point_id, latitude: p.latitude, longitude: p.longitude }
  }
}

/// JSON body accepted by `POST /locations` and `PUT /locations/:id`.
#[derive(Debug, Deserialize)]
pub struct PointBody {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /locations/:id`
pub async fn get_one<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(point_id): Path<i64>,
) -> Result<Json<PointDto>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("pointId", point_id)?;

  let point = state.store
    .get_point(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(point_id))?;

  Ok(Json(PointDto::from(point)))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /locations` — returns 201 + the stored point.
pub async fn create<S>(
  State(state): State<Arc<ApiState<S>>>,
  Json(body): Json<PointBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  validate_coordinates(body.latitude, body.longitude)?;

  if state.store
    .find_point_at(body.latitude, body.longitude)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .is_some()
  {
    return Err(CoreError::DuplicatePoint(body.latitude, body.longitude).into());
  }

  let point = state.store
    .add_point(body.latitude, body.longitude)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(PointDto::from(point))))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /locations/:id` — duplicate-coordinate check excludes the point
/// being updated, so re-asserting its own coordinates succeeds.
pub async fn update<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(point_id): Path<i64>,
  Json(body): Json<PointBody>,
) -> Result<Json<PointDto>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("pointId", point_id)?;
  validate_coordinates(body.latitude, body.longitude)?;

  let mut point = state.store
    .get_point(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(point_id))?;

  if let Some(existing) = state.store
    .find_point_at(body.latitude, body.longitude)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    && existing.point_id != point_id
  {
    return Err(CoreError::DuplicatePoint(body.latitude, body.longitude).into());
  }

  point.latitude = body.latitude;
  point.longitude = body.longitude;
  state.store
    .update_point(&point)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(PointDto::from(point)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /locations/:id` — rejected while any animal chips here or any
/// visit references the point.
pub async fn remove<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(point_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("pointId", point_id)?;

  state.store
    .get_point(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(point_id))?;

  if state.store
    .point_referenced(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
  {
    return Err(CoreError::PointInUse(point_id).into());
  }

  state.store
    .delete_point(point_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(StatusCode::OK)
}
