//! Animal — the chipped subject whose movements the service tracks.
//!
//! Life status is a closed two-state enum; the death timestamp is derived
//! from the status transition and never written directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Gender as recorded at chipping time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
  Male,
  Female,
  Other,
}

/// Whether the animal is alive or dead.
///
/// The transition is one-way: once an update marks an animal `Dead`, a later
/// `Alive` write is rejected.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifeStatus {
  #[default]
  Alive,
  Dead,
}

/// A chipped animal.
///
/// `chipped_at` is server-assigned at creation and never changes.
/// `death_at` is `None` while alive and stamped by [`apply_life_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
  pub animal_id:     i64,
  pub weight:        f32,
  pub length:        f32,
  pub height:        f32,
  pub gender:        Gender,
  pub life_status:   LifeStatus,
  pub chipped_at:    DateTime<Utc>,
  pub chip_point_id: i64,
  pub death_at:      Option<DateTime<Utc>>,
}

/// Input to [`TrackStore::add_animal`](crate::store::TrackStore::add_animal).
/// `chipped_at` is always set by the store; life status starts `Alive`.
#[derive(Debug, Clone)]
pub struct NewAnimal {
  pub weight:        f32,
  pub length:        f32,
  pub height:        f32,
  pub gender:        Gender,
  pub chip_point_id: i64,
}

/// Replacement values for an animal's mutable fields.
#[derive(Debug, Clone)]
pub struct AnimalPatch {
  pub weight:        f32,
  pub length:        f32,
  pub height:        f32,
  pub gender:        Gender,
  pub life_status:   LifeStatus,
  pub chip_point_id: i64,
}

/// Reject non-positive or non-finite measurements.
pub fn validate_measurements(weight: f32, length: f32, height: f32) -> Result<()> {
  for (name, value) in [("weight", weight), ("length", length), ("height", height)] {
    if !value.is_finite() || value <= 0.0 {
      return Err(Error::InvalidField(format!("{name} must be a positive number")));
    }
  }
  Ok(())
}

/// Apply a life-status transition, returning the updated record.
///
/// `Alive -> Dead` stamps `death_at = now`. Re-asserting the current status
/// leaves `death_at` untouched. `Dead -> Alive` is rejected.
pub fn apply_life_status(
  mut animal: Animal,
  new_status: LifeStatus,
  now: DateTime<Utc>,
) -> Result<Animal> {
  match (animal.life_status, new_status) {
    (LifeStatus::Dead, LifeStatus::Alive) => Err(Error::DeadToAlive),
    (LifeStatus::Alive, LifeStatus::Dead) => {
      animal.life_status = LifeStatus::Dead;
      animal.death_at = Some(now);
      Ok(animal)
    }
    _ => Ok(animal),
  }
}

/// Apply a full attribute patch.
///
/// Life status goes through [`apply_life_status`]. The chip-point change is
/// validated here only for shape; whether it contradicts the recorded visit
/// history is checked against the loaded sequence by
/// [`sequence::check_new_chip_point`](crate::sequence::check_new_chip_point).
pub fn apply_patch(
  animal: Animal,
  patch: &AnimalPatch,
  now: DateTime<Utc>,
) -> Result<Animal> {
  validate_measurements(patch.weight, patch.length, patch.height)?;

  let mut animal = apply_life_status(animal, patch.life_status, now)?;
  animal.weight = patch.weight;
  animal.length = patch.length;
  animal.height = patch.height;
  animal.gender = patch.gender;
  animal.chip_point_id = patch.chip_point_id;
  Ok(animal)
}
