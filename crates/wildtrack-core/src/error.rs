//! Error types for `wildtrack-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("animal not found: {0}")]
  AnimalNotFound(i64),

  #[error("point not found: {0}")]
  PointNotFound(i64),

  #[error("visited point not found: {0}")]
  VisitNotFound(i64),

  #[error("animal {animal_id} has no visited point {visit_id}")]
  VisitNotOfAnimal { animal_id: i64, visit_id: i64 },

  #[error("invalid field: {0}")]
  InvalidField(String),

  #[error("animal {0} is dead and accepts no new visits")]
  AnimalDead(i64),

  #[error("the first visit cannot be the chipping point")]
  ChipPointRepeat,

  #[error("visit would repeat the adjacent location {0}")]
  AdjacentDuplicate(i64),

  #[error("visit already references point {0}")]
  SameLocation(i64),

  #[error("the first visit cannot be moved onto the chipping point")]
  FirstHopToChipPoint,

  #[error("the chipping point equals the first visited location")]
  ChipPointMatchesFirstVisit,

  #[error("a dead animal cannot be marked alive")]
  DeadToAlive,

  #[error("a point with coordinates ({0:?}, {1:?}) already exists")]
  DuplicatePoint(Option<f64>, Option<f64>),

  #[error("point {0} is referenced by an animal")]
  PointInUse(i64),

  #[error("animal {0} still has visited points")]
  AnimalHasVisits(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
