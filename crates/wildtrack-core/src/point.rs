//! Geographic points referenced as chip locations and visit targets.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A geographic point. Coordinates are optional but range-checked when
/// present; the `(latitude, longitude)` pair is unique across the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub point_id:  i64,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

/// Range-check a coordinate pair: latitude in [-90, 90], longitude in
/// [-180, 180]. NaN never passes.
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
  if let Some(lat) = latitude
    && !(-90.0..=90.0).contains(&lat)
  {
    return Err(Error::InvalidField(format!("latitude {lat} out of range [-90, 90]")));
  }
  if let Some(lon) = longitude
    && !(-180.0..=180.0).contains(&lon)
  {
    return Err(Error::InvalidField(format!("longitude {lon} out of range [-180, 180]")));
  }
  Ok(())
}
