//! Workout types: the unit of the activity log.
//!
//! A workout is a recorded outing at a place on the map. Its identity,
//! creation time, position and variant never change; distance, duration and
//! the variant's own measurement may be edited, and the derived metric (pace
//! or speed) is recomputed whenever they are.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinates;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque workout identifier, unique within a log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
  /// A fresh random identifier.
  pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for WorkoutId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for WorkoutId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for WorkoutId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Variant tag ─────────────────────────────────────────────────────────────

/// The discriminant stored with every persisted workout.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkoutKind {
  Running,
  Cycling,
}

impl WorkoutKind {
  /// Capitalised name used in descriptions.
  pub fn label(self) -> &'static str {
    match self {
      Self::Running => "Running",
      Self::Cycling => "Cycling",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      Self::Running => "🏃‍♂️",
      Self::Cycling => "🚴",
    }
  }
}

/// `"<Variant> on <Month> <Day>"`, from the UTC calendar date.
pub fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
  format!("{} on {}", kind.label(), created_at.format("%B %-d"))
}

// ─── Variant payload ─────────────────────────────────────────────────────────

/// Variant-specific measurement plus its derived metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
  Running {
    /// Steps per minute.
    cadence: f64,
    /// Minutes per kilometre.
    pace:    f64,
  },
  Cycling {
    /// Metres climbed.
    elevation_gain: f64,
    /// Kilometres per hour.
    speed:          f64,
  },
}

impl Activity {
  fn new(kind: WorkoutKind, variant_field: f64, distance: f64, duration: f64) -> Self {
    let mut activity = match kind {
      WorkoutKind::Running => Self::Running { cadence: variant_field, pace: 0.0 },
      WorkoutKind::Cycling => Self::Cycling { elevation_gain: variant_field, speed: 0.0 },
    };
    activity.recompute(distance, duration);
    activity
  }

  pub fn kind(&self) -> WorkoutKind {
    match self {
      Self::Running { .. } => WorkoutKind::Running,
      Self::Cycling { .. } => WorkoutKind::Cycling,
    }
  }

  /// Cadence for running, elevation gain for cycling.
  pub fn variant_field(&self) -> f64 {
    match self {
      Self::Running { cadence, .. } => *cadence,
      Self::Cycling { elevation_gain, .. } => *elevation_gain,
    }
  }

  /// Pace for running, speed for cycling.
  pub fn derived(&self) -> f64 {
    match self {
      Self::Running { pace, .. } => *pace,
      Self::Cycling { speed, .. } => *speed,
    }
  }

  fn set_variant_field(&mut self, value: f64) {
    match self {
      Self::Running { cadence, .. } => *cadence = value,
      Self::Cycling { elevation_gain, .. } => *elevation_gain = value,
    }
  }

  fn recompute(&mut self, distance: f64, duration: f64) {
    match self {
      Self::Running { pace, .. } => *pace = duration / distance,
      Self::Cycling { speed, .. } => *speed = distance / (duration / 60.0),
    }
  }
}

// ─── Workout ─────────────────────────────────────────────────────────────────

/// A single logged workout.
///
/// Constructed only by the factory (from validated input) or by the codec
/// (from a persisted record); mutated only by the log's edit operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
  id:          WorkoutId,
  created_at:  DateTime<Utc>,
  coordinates: Coordinates,
  /// Kilometres.
  distance:    f64,
  /// Minutes.
  duration:    f64,
  description: String,
  activity:    Activity,
}

impl Workout {
  /// Assemble a workout from already-validated parts. Derived fields and the
  /// description are computed here.
  pub(crate) fn from_parts(
    id: WorkoutId,
    created_at: DateTime<Utc>,
    coordinates: Coordinates,
    kind: WorkoutKind,
    distance: f64,
    duration: f64,
    variant_field: f64,
  ) -> Self {
    Self {
      id,
      created_at,
      coordinates,
      distance,
      duration,
      description: describe(kind, created_at),
      activity: Activity::new(kind, variant_field, distance, duration),
    }
  }

  /// Keep a description that was fixed when the workout was first recorded.
  pub(crate) fn with_description(mut self, description: String) -> Self {
    self.description = description;
    self
  }

  pub fn id(&self) -> &WorkoutId { &self.id }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn coordinates(&self) -> Coordinates { self.coordinates }

  pub fn distance(&self) -> f64 { self.distance }

  pub fn duration(&self) -> f64 { self.duration }

  pub fn description(&self) -> &str { &self.description }

  pub fn kind(&self) -> WorkoutKind { self.activity.kind() }

  pub fn activity(&self) -> &Activity { &self.activity }

  pub fn cadence(&self) -> Option<f64> {
    match self.activity {
      Activity::Running { cadence, .. } => Some(cadence),
      Activity::Cycling { .. } => None,
    }
  }

  pub fn pace(&self) -> Option<f64> {
    match self.activity {
      Activity::Running { pace, .. } => Some(pace),
      Activity::Cycling { .. } => None,
    }
  }

  pub fn elevation_gain(&self) -> Option<f64> {
    match self.activity {
      Activity::Cycling { elevation_gain, .. } => Some(elevation_gain),
      Activity::Running { .. } => None,
    }
  }

  pub fn speed(&self) -> Option<f64> {
    match self.activity {
      Activity::Cycling { speed, .. } => Some(speed),
      Activity::Running { .. } => None,
    }
  }

  /// Recompute pace or speed from the current distance and duration.
  pub fn recompute_derived(&mut self) {
    self.activity.recompute(self.distance, self.duration);
  }

  /// Replace the editable measurements. Inputs must already be validated.
  pub(crate) fn apply_edit(
    &mut self,
    distance: f64,
    duration: f64,
    variant_field: Option<f64>,
  ) {
    self.distance = distance;
    self.duration = duration;
    if let Some(value) = variant_field {
      self.activity.set_variant_field(value);
    }
    self.recompute_derived();
  }
}
