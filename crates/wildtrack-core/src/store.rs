//! The `TrackStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `wildtrack-store-sqlite`). Higher layers (`wildtrack-api`,
//! `wildtrack-server`) depend on this abstraction, not on any concrete
//! backend.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  animal::{Animal, NewAnimal},
  point::Point,
  visit::VisitedPoint,
};

/// Abstraction over a wildtrack storage backend.
pub trait TrackStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Animals ───────────────────────────────────────────────────────────

  /// Create and persist an animal. The store assigns the id and
  /// `chipped_at`; life status starts `Alive`.
  fn add_animal(
    &self,
    input: NewAnimal,
  ) -> impl Future<Output = Result<Animal, Self::Error>> + Send + '_;

  /// Retrieve an animal by id. Returns `None` if not found.
  fn get_animal(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Animal>, Self::Error>> + Send + '_;

  /// Persist the mutable fields of an already-loaded animal row.
  fn update_animal<'a>(
    &'a self,
    animal: &'a Animal,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove an animal row. Referential checks are the caller's job.
  fn delete_animal(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Points ────────────────────────────────────────────────────────────

  /// Create and persist a point with a store-assigned id.
  fn add_point(
    &self,
    latitude: Option<f64>,
    longitude: Option<f64>,
  ) -> impl Future<Output = Result<Point, Self::Error>> + Send + '_;

  /// Retrieve a point by id. Returns `None` if not found.
  fn get_point(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Point>, Self::Error>> + Send + '_;

  /// Find the point with exactly these coordinates, if any. `None`
  /// coordinates compare equal to `None`.
  fn find_point_at(
    &self,
    latitude: Option<f64>,
    longitude: Option<f64>,
  ) -> impl Future<Output = Result<Option<Point>, Self::Error>> + Send + '_;

  /// Persist new coordinates for an existing point.
  fn update_point<'a>(
    &'a self,
    point: &'a Point,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a point row. Referential checks are the caller's job.
  fn delete_point(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// True if the point is any animal's chipping point or is referenced by
  /// any visit record.
  fn point_referenced(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Visits ────────────────────────────────────────────────────────────

  /// All visits of one animal, ordered by ascending `visited_at`.
  fn visits_of(
    &self,
    animal_id: i64,
  ) -> impl Future<Output = Result<Vec<VisitedPoint>, Self::Error>> + Send + '_;

  /// Retrieve a visit by id, regardless of owning animal.
  fn get_visit(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<VisitedPoint>, Self::Error>> + Send + '_;

  /// Append a visit with a server-assigned timestamp strictly greater than
  /// every existing entry for the animal.
  fn append_visit(
    &self,
    animal_id: i64,
    point_id: i64,
  ) -> impl Future<Output = Result<VisitedPoint, Self::Error>> + Send + '_;

  /// Re-point an existing visit; id and timestamp are unchanged.
  fn update_visit_point(
    &self,
    visit_id: i64,
    point_id: i64,
  ) -> impl Future<Output = Result<VisitedPoint, Self::Error>> + Send + '_;

  /// Remove a single visit record.
  fn delete_visit(
    &self,
    visit_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove two visit records atomically — both or neither.
  fn delete_visit_pair(
    &self,
    first_id: i64,
    second_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
