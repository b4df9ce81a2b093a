//! Settings file and environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use mapty_core::{
  geo::{Coordinates, GeolocationError, Geolocator},
  log::DEFAULT_ZOOM,
};
use serde::Deserialize;

/// Shape of the optional TOML settings file. Every key can also be set from
/// the environment with a `MAPTY_` prefix, e.g. `MAPTY_POSITION=46.52,6.63`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database holding the workouts.
  pub store_path: PathBuf,
  pub map_zoom:   u8,
  /// Where "here" is. Without one the map stays unavailable.
  pub position:   Option<Coordinates>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("mapty.db"),
      map_zoom:   DEFAULT_ZOOM,
      position:   None,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply `MAPTY_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("MAPTY")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("position"),
      )
      .build()
      .with_context(|| format!("failed to read settings from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

// ─── Position source ──────────────────────────────────────────────────────────

/// A position taken from the command line or the settings, if any was given.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredPosition(pub Option<Coordinates>);

impl Geolocator for ConfiguredPosition {
  fn current_position(&self) -> Result<Coordinates, GeolocationError> {
    self.0.ok_or_else(|| {
      GeolocationError::new("no position configured; pass --position LAT,LNG or set `position`")
    })
  }
}
