//! Handlers for `/animals` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/animals/:id` | Animal with its visit ids |
//! | `POST`   | `/animals` | Body: [`CreateBody`]; returns 201 + stored animal |
//! | `PUT`    | `/animals/:id` | Body: [`UpdateBody`]; full replacement of mutable fields |
//! | `DELETE` | `/animals/:id` | 400 while visit records exist |

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
  animal::{
    self, Animal, AnimalPatch, Gender, LifeStatus, NewAnimal,
    validate_measurements,
  },
  sequence,
  store::TrackStore,
  visit::VisitedPoint,
};

use crate::{ApiState, ensure_positive, error::ApiError};

// ─── DTO ─────────────────────────────────────────────────────────────────────

/// Wire form of an [`Animal`] plus the ids of its ordered visits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalDto {
  pub id:                   i64,
  pub weight:               f32,
  pub length:               f32,
  pub height:               f32,
  pub gender:               Gender,
  pub life_status:          LifeStatus,
  pub chipping_date_time:   DateTime<Utc>,
  pub chipping_location_id: i64,
  pub visited_locations:    Vec<i64>,
  pub death_date_time:      Option<DateTime<Utc>>,
}

impl AnimalDto {
  fn new(animal: Animal, visits: &[VisitedPoint]) -> Self {
    Self {
      id:                   animal.animal_id,
      weight:               animal.weight,
      length:               animal.length,
      height:               animal.height,
      gender:               animal.gender,
      life_status:          animal.life_status,
      chipping_date_time:   animal.chipped_at,
      chipping_location_id: animal.chip_point_id,
      visited_locations:    visits.iter().map(|v| v.visit_id).collect(),
      death_date_time:      animal.death_at,
    }
  }
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /animals/:id`
pub async fn get_one<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(animal_id): Path<i64>,
) -> Result<Json<AnimalDto>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;

  let animal = state.store
    .get_animal(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::AnimalNotFound(animal_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(AnimalDto::new(animal, &visits)))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /animals`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub weight:               f32,
  pub length:               f32,
  pub height:               f32,
  pub gender:               Gender,
  pub chipping_location_id: i64,
}

/// `POST /animals` — returns 201 + the stored animal.
pub async fn create<S>(
  State(state): State<Arc<ApiState<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("chippingLocationId", body.chipping_location_id)?;
  validate_measurements(body.weight, body.length, body.height)?;

  state.store
    .get_point(body.chipping_location_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(body.chipping_location_id))?;

  let animal = state.store
    .add_animal(NewAnimal {
      weight:        body.weight,
      length:        body.length,
      height:        body.height,
      gender:        body.gender,
      chip_point_id: body.chipping_location_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(AnimalDto::new(animal, &[]))))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /animals/:id` — a full replacement of the
/// mutable fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub weight:               f32,
  pub length:               f32,
  pub height:               f32,
  pub gender:               Gender,
  pub life_status:          LifeStatus,
  pub chipping_location_id: i64,
}

/// `PUT /animals/:id`
///
/// Life status goes through the one-way transition check; reassigning the
/// chipping point is rejected when it matches the first visited location.
pub async fn update<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(animal_id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<AnimalDto>, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;
  ensure_positive("chippingLocationId", body.chipping_location_id)?;
  validate_measurements(body.weight, body.length, body.height)?;

  let animal = state.store
    .get_animal(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::AnimalNotFound(animal_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let patch = AnimalPatch {
    weight:        body.weight,
    length:        body.length,
    height:        body.height,
    gender:        body.gender,
    life_status:   body.life_status,
    chip_point_id: body.chipping_location_id,
  };
  let updated = animal::apply_patch(animal, &patch, Utc::now())?;
  sequence::check_new_chip_point(&visits, body.chipping_location_id)?;

  state.store
    .get_point(body.chipping_location_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::PointNotFound(body.chipping_location_id))?;

  state.store
    .update_animal(&updated)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(AnimalDto::new(updated, &visits)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /animals/:id` — rejected while any visit records exist.
pub async fn remove<S>(
  State(state): State<Arc<ApiState<S>>>,
  Path(animal_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ensure_positive("animalId", animal_id)?;

  state.store
    .get_animal(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(CoreError::AnimalNotFound(animal_id))?;

  let visits = state.store
    .visits_of(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !visits.is_empty() {
    return Err(CoreError::AnimalHasVisits(animal_id).into());
  }

  state.store
    .delete_animal(animal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(StatusCode::OK)
}
