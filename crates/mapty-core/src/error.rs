//! Error types for `mapty-core`.

use thiserror::Error;

use crate::{factory::ValidationError, geo::GeolocationError, workout::WorkoutId};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("workout not found: {0}")]
  NotFound(WorkoutId),

  #[error(transparent)]
  Geolocation(#[from] GeolocationError),

  /// The map has not been placed yet, so nothing can be pinned or panned.
  #[error("map is unavailable until the current position is known")]
  MapUnavailable,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
