//! The visited-sequence engine.
//!
//! An animal's movement history is its visit list ordered by ascending
//! `visited_at`, conceptually prefixed by the chipping point. The functions
//! here validate mutations of that list and are pure over
//! `(animal, ordered visits, target)`, so every branch can be exercised
//! without a store. Callers load the full list, run the check, then issue
//! the store mutation while holding the animal's write lock.

use crate::{
  Error, Result,
  animal::{Animal, LifeStatus},
  visit::VisitedPoint,
};

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Position of `visit_id` within the animal's ordered list.
///
/// A visit that exists globally but belongs to a different animal is
/// reported as [`Error::VisitNotOfAnimal`].
pub fn position_of(
  animal: &Animal,
  visits: &[VisitedPoint],
  visit_id: i64,
) -> Result<usize> {
  visits
    .iter()
    .position(|v| v.visit_id == visit_id)
    .ok_or(Error::VisitNotOfAnimal { animal_id: animal.animal_id, visit_id })
}

// ─── Append ──────────────────────────────────────────────────────────────────

/// Validate appending `point_id` to the end of the list.
///
/// Adjacency is checked against the true last entry only; for tail
/// insertion that already is the full adjacency check. An empty list is
/// checked against the chipping point instead: the first recorded visit
/// must be an actual movement away from it.
pub fn check_append(
  animal: &Animal,
  visits: &[VisitedPoint],
  point_id: i64,
) -> Result<()> {
  if animal.life_status == LifeStatus::Dead {
    return Err(Error::AnimalDead(animal.animal_id));
  }

  match visits.last() {
    None if point_id == animal.chip_point_id => Err(Error::ChipPointRepeat),
    Some(last) if last.point_id == point_id => Err(Error::AdjacentDuplicate(point_id)),
    _ => Ok(()),
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Validate re-pointing the visit at `idx` (from [`position_of`]) at
/// `new_point_id`.
///
/// Unlike [`check_append`], both chronological neighbours are checked, and
/// the first entry may not be reduced to a no-op against the chipping point.
pub fn check_update(
  animal: &Animal,
  visits: &[VisitedPoint],
  idx: usize,
  new_point_id: i64,
) -> Result<()> {
  if idx == 0 && new_point_id == animal.chip_point_id {
    return Err(Error::FirstHopToChipPoint);
  }
  if visits[idx].point_id == new_point_id {
    return Err(Error::SameLocation(new_point_id));
  }
  if visits.len() > 1 {
    if idx > 0 && visits[idx - 1].point_id == new_point_id {
      return Err(Error::AdjacentDuplicate(new_point_id));
    }
    if idx + 1 < visits.len() && visits[idx + 1].point_id == new_point_id {
      return Err(Error::AdjacentDuplicate(new_point_id));
    }
  }
  Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// What a delete must remove from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePlan {
  /// Remove the target visit only.
  Single(i64),
  /// Remove the earliest visit and its successor. With the first hop gone,
  /// a second visit sitting on the chipping point would be a vacuous
  /// "returned to start" entry, so both are removed in one transaction.
  Pair(i64, i64),
}

/// Plan the removal of the visit at `idx` (from [`position_of`]).
pub fn plan_delete(animal: &Animal, visits: &[VisitedPoint], idx: usize) -> DeletePlan {
  if idx == 0 && visits.len() >= 2 && visits[1].point_id == animal.chip_point_id {
    return DeletePlan::Pair(visits[0].visit_id, visits[1].visit_id);
  }
  DeletePlan::Single(visits[idx].visit_id)
}

// ─── Chip-point reassignment ─────────────────────────────────────────────────

/// Validate reassigning the chipping point given the recorded history: the
/// first visited location may not equal the new chipping point, since that
/// would retroactively turn the first hop into a non-movement.
pub fn check_new_chip_point(visits: &[VisitedPoint], new_chip_point_id: i64) -> Result<()> {
  if let Some(first) = visits.first()
    && first.point_id == new_chip_point_id
  {
    return Err(Error::ChipPointMatchesFirstVisit);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};

  use super::*;
  use crate::animal::Gender;

  const CHIP: i64 = 10;

  fn animal(status: LifeStatus) -> Animal {
    Animal {
      animal_id:     1,
      weight:        12.0,
      length:        1.1,
      height:        0.7,
      gender:        Gender::Male,
      life_status:   status,
      chipped_at:    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
      chip_point_id: CHIP,
      death_at:      None,
    }
  }

  /// Build an ordered list visiting the given points, ids 100, 101, ...
  fn visits(points: &[i64]) -> Vec<VisitedPoint> {
    let base = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
    points
      .iter()
      .enumerate()
      .map(|(i, &point_id)| VisitedPoint {
        visit_id:   100 + i as i64,
        animal_id:  1,
        point_id,
        visited_at: base + Duration::minutes(i as i64),
      })
      .collect()
  }

  // ── Append ────────────────────────────────────────────────────────────────

  #[test]
  fn first_append_to_chip_point_is_rejected() {
    let a = animal(LifeStatus::Alive);
    assert_eq!(check_append(&a, &[], CHIP), Err(Error::ChipPointRepeat));
    assert_eq!(check_append(&a, &[], 20), Ok(()));
  }

  #[test]
  fn append_to_chip_point_is_allowed_once_moved() {
    // The chip point only blocks the FIRST visit; a later return is legal.
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20]);
    assert_eq!(check_append(&a, &v, CHIP), Ok(()));
  }

  #[test]
  fn append_repeating_the_tail_is_rejected() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30]);
    assert_eq!(check_append(&a, &v, 30), Err(Error::AdjacentDuplicate(30)));
    assert_eq!(check_append(&a, &v, 20), Ok(()));
  }

  #[test]
  fn dead_animal_accepts_no_appends() {
    let a = animal(LifeStatus::Dead);
    assert_eq!(check_append(&a, &[], 20), Err(Error::AnimalDead(1)));
    let v = visits(&[20]);
    assert_eq!(check_append(&a, &v, 30), Err(Error::AnimalDead(1)));
  }

  // ── Update ────────────────────────────────────────────────────────────────

  #[test]
  fn update_first_visit_to_chip_point_is_rejected() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30]);
    assert_eq!(check_update(&a, &v, 0, CHIP), Err(Error::FirstHopToChipPoint));
  }

  #[test]
  fn update_later_visit_to_chip_point_is_allowed() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30, 40]);
    assert_eq!(check_update(&a, &v, 2, CHIP), Ok(()));
  }

  #[test]
  fn update_to_same_location_is_rejected() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30]);
    assert_eq!(check_update(&a, &v, 1, 30), Err(Error::SameLocation(30)));
  }

  #[test]
  fn update_matching_predecessor_is_rejected() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30, 40]);
    assert_eq!(check_update(&a, &v, 1, 20), Err(Error::AdjacentDuplicate(20)));
  }

  #[test]
  fn update_matching_successor_is_rejected() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30, 40]);
    assert_eq!(check_update(&a, &v, 1, 40), Err(Error::AdjacentDuplicate(40)));
  }

  #[test]
  fn update_between_distinct_neighbours_is_allowed() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30, 40]);
    assert_eq!(check_update(&a, &v, 1, 50), Ok(()));
  }

  #[test]
  fn single_entry_list_skips_neighbour_checks() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20]);
    assert_eq!(check_update(&a, &v, 0, 30), Ok(()));
  }

  #[test]
  fn position_of_rejects_foreign_visits() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30]);
    assert_eq!(position_of(&a, &v, 101), Ok(1));
    assert_eq!(
      position_of(&a, &v, 999),
      Err(Error::VisitNotOfAnimal { animal_id: 1, visit_id: 999 })
    );
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  #[test]
  fn deleting_first_cascades_when_second_sits_on_chip_point() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, CHIP, 30]);
    assert_eq!(plan_delete(&a, &v, 0), DeletePlan::Pair(100, 101));
  }

  #[test]
  fn deleting_first_without_chip_successor_removes_one() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30]);
    assert_eq!(plan_delete(&a, &v, 0), DeletePlan::Single(100));
  }

  #[test]
  fn deleting_the_only_visit_removes_one() {
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20]);
    assert_eq!(plan_delete(&a, &v, 0), DeletePlan::Single(100));
  }

  #[test]
  fn deleting_a_middle_visit_never_cascades() {
    // Only the earliest entry triggers the cascade, even if its successor
    // matches the chip point.
    let a = animal(LifeStatus::Alive);
    let v = visits(&[20, 30, CHIP]);
    assert_eq!(plan_delete(&a, &v, 1), DeletePlan::Single(101));
  }

  // ── Chip-point reassignment ───────────────────────────────────────────────

  #[test]
  fn new_chip_point_may_not_equal_first_visit() {
    let v = visits(&[20, 30]);
    assert_eq!(check_new_chip_point(&v, 20), Err(Error::ChipPointMatchesFirstVisit));
    assert_eq!(check_new_chip_point(&v, 30), Ok(()));
    assert_eq!(check_new_chip_point(&[], 20), Ok(()));
  }
}
