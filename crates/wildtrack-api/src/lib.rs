//! JSON REST API for wildtrack.
//!
//! Exposes an axum [`Router`] backed by any
//! [`wildtrack_core::store::TrackStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = wildtrack_api::api_router(ApiState::new(store));
//! ```

pub mod animals;
pub mod error;
pub mod points;
pub mod visits;

use std::{collections::HashMap, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use tokio::sync::Mutex;
use wildtrack_core::store::TrackStore;

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared handler state: the store plus the per-animal write locks that
/// serialise visit mutations. The sequence invariants are computed from a
/// full read of an animal's visit list followed by a conditional write, so
/// two in-flight mutations for the same animal must not interleave.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  visit_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>) -> Arc<Self> {
    Arc::new(Self {
      store,
      visit_locks: Mutex::new(HashMap::new()),
    })
  }

  /// The write lock serialising visit mutations for one animal.
  pub(crate) async fn visit_lock(&self, animal_id: i64) -> Arc<Mutex<()>> {
    let mut locks = self.visit_locks.lock().await;
    locks.entry(animal_id).or_default().clone()
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: Arc<ApiState<S>>) -> Router<()>
where
  S: TrackStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Animals
    .route("/animals", post(animals::create::<S>))
    .route(
      "/animals/{animal_id}",
      get(animals::get_one::<S>)
        .put(animals::update::<S>)
        .delete(animals::remove::<S>),
    )
    // Visited locations
    .route(
      "/animals/{animal_id}/locations",
      get(visits::list::<S>).put(visits::update::<S>),
    )
    .route(
      "/animals/{animal_id}/locations/{id}",
      post(visits::append::<S>).delete(visits::remove::<S>),
    )
    // Points
    .route("/locations", post(points::create::<S>))
    .route(
      "/locations/{point_id}",
      get(points::get_one::<S>)
        .put(points::update::<S>)
        .delete(points::remove::<S>),
    )
    .with_state(state)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Path and body ids must be positive; the original service rejected
/// non-positive ids before touching the store.
pub(crate) fn ensure_positive(name: &str, id: i64) -> Result<(), ApiError> {
  if id <= 0 {
    return Err(ApiError::BadRequest(format!("{name} must be positive")));
  }
  Ok(())
}
