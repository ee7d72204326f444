//! Visited points — the per-animal movement log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in an animal's movement history.
///
/// `visited_at` is server-assigned, strictly increasing per animal, and
/// alone defines the visit order. Only `point_id` is ever mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitedPoint {
  pub visit_id:   i64,
  pub animal_id:  i64,
  pub point_id:   i64,
  pub visited_at: DateTime<Utc>,
}
