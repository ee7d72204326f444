//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; enums as their upper-case
//! wire strings. Measurements are stored as REAL and narrowed back to `f32`
//! on read.

use chrono::{DateTime, Utc};
use wildtrack_core::{
  animal::{Animal, Gender, LifeStatus},
  point::Point,
  visit::VisitedPoint,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str {
  match g {
    Gender::Male => "MALE",
    Gender::Female => "FEMALE",
    Gender::Other => "OTHER",
  }
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "MALE" => Ok(Gender::Male),
    "FEMALE" => Ok(Gender::Female),
    "OTHER" => Ok(Gender::Other),
    other => Err(Error::Decode(format!("unknown gender: {other:?}"))),
  }
}

// ─── LifeStatus ──────────────────────────────────────────────────────────────

pub fn encode_life_status(s: LifeStatus) -> &'static str {
  match s {
    LifeStatus::Alive => "ALIVE",
    LifeStatus::Dead => "DEAD",
  }
}

pub fn decode_life_status(s: &str) -> Result<LifeStatus> {
  match s {
    "ALIVE" => Ok(LifeStatus::Alive),
    "DEAD" => Ok(LifeStatus::Dead),
    other => Err(Error::Decode(format!("unknown life status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `animals` row.
pub struct RawAnimal {
  pub animal_id:     i64,
  pub weight:        f64,
  pub length:        f64,
  pub height:        f64,
  pub gender:        String,
  pub life_status:   String,
  pub chipped_at:    String,
  pub chip_point_id: i64,
  pub death_at:      Option<String>,
}

impl RawAnimal {
  pub fn into_animal(self) -> Result<Animal> {
    Ok(Animal {
      animal_id:     self.animal_id,
      weight:        self.weight as f32,
      length:        self.length as f32,
      height:        self.height as f32,
      gender:        decode_gender(&self.gender)?,
      life_status:   decode_life_status(&self.life_status)?,
      chipped_at:    decode_dt(&self.chipped_at)?,
      chip_point_id: self.chip_point_id,
      death_at:      self.death_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `points` row.
pub struct RawPoint {
  pub point_id:  i64,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

impl RawPoint {
  pub fn into_point(self) -> Point {
    Point {
      point_id:  self.point_id,
      latitude:  self.latitude,
      longitude: self.longitude,
    }
  }
}

/// Raw values read directly from a `visits` row.
pub struct RawVisit {
  pub visit_id:   i64,
  pub animal_id:  i64,
  pub point_id:   i64,
  pub visited_at: String,
}

impl RawVisit {
  pub fn into_visit(self) -> Result<VisitedPoint> {
    Ok(VisitedPoint {
      visit_id:   self.visit_id,
      animal_id:  self.animal_id,
      point_id:   self.point_id,
      visited_at: decode_dt(&self.visited_at)?,
    })
  }
}
