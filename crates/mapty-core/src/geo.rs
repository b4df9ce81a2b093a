//! Geographic coordinates and the geolocation collaborator.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Coordinates ─────────────────────────────────────────────────────────────

/// A latitude/longitude pair in decimal degrees.
///
/// Stored as a two-element `[lat, lng]` array in the durable format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  pub const fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude, longitude }
  }

  /// Both components are finite and inside the WGS 84 ranges.
  pub fn is_valid(&self) -> bool {
    self.latitude.is_finite()
      && self.longitude.is_finite()
      && (-90.0..=90.0).contains(&self.latitude)
      && (-180.0..=180.0).contains(&self.longitude)
  }
}

impl From<[f64; 2]> for Coordinates {
  fn from([latitude, longitude]: [f64; 2]) -> Self { Self { latitude, longitude } }
}

impl From<Coordinates> for [f64; 2] {
  fn from(c: Coordinates) -> Self { [c.latitude, c.longitude] }
}

impl fmt::Display for Coordinates {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCoordinatesError {
  #[error("expected `LAT,LNG`, got {0:?}")]
  Format(String),
  #[error("coordinates out of range: {0:?}")]
  OutOfRange(String),
}

/// Parses `"LAT,LNG"`; whitespace around either component is ignored.
impl FromStr for Coordinates {
  type Err = ParseCoordinatesError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let format_err = || ParseCoordinatesError::Format(s.to_owned());
    let (lat, lng) = s.split_once(',').ok_or_else(format_err)?;
    let latitude = lat.trim().parse::<f64>().map_err(|_| format_err())?;
    let longitude = lng.trim().parse::<f64>().map_err(|_| format_err())?;

    let coords = Self::new(latitude, longitude);
    if !coords.is_valid() {
      return Err(ParseCoordinatesError::OutOfRange(s.to_owned()));
    }
    Ok(coords)
  }
}

// ─── Geolocation ─────────────────────────────────────────────────────────────

/// The current position could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not get your position: {reason}")]
pub struct GeolocationError {
  pub reason: String,
}

impl GeolocationError {
  pub fn new(reason: impl Into<String>) -> Self {
    Self { reason: reason.into() }
  }
}

/// Source of the user's current position.
pub trait Geolocator {
  fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// A fixed, already-known position.
impl Geolocator for Coordinates {
  fn current_position(&self) -> Result<Coordinates, GeolocationError> { Ok(*self) }
}
