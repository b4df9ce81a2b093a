//! Encoding the log to its durable text records and back.
//!
//! The workout sequence is stored under [`WORKOUTS_KEY`] as a JSON array of
//! flat records, one per workout:
//!
//! ```json
//! {"type":"running","id":"…","date":"2024-04-03T09:30:00Z","coords":[10.0,20.0],
//!  "distance":5.0,"duration":25.0,"description":"Running on April 3",
//!  "cadence":180.0,"pace":5.0}
//! ```
//!
//! Cycling records carry `elevationGain` and `speed` instead. The sort flag
//! lives under [`SORT_KEY`] as a bare JSON boolean.
//!
//! Decoding never fails: a missing or unreadable record set yields an empty
//! log, and individual records that cannot be rebuilt are skipped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::{
  Result,
  factory::{Field, FieldError, Problem, check_positive},
  geo::Coordinates,
  workout::{Activity, Workout, WorkoutId, WorkoutKind},
};

/// Key of the workout sequence record.
pub const WORKOUTS_KEY: &str = "workouts";

/// Key of the sort-flag record.
pub const SORT_KEY: &str = "sort";

// ─── Record type ─────────────────────────────────────────────────────────────

/// One workout as it appears in the durable record.
///
/// Every numeric field is optional and read leniently: older logs hold
/// numbers written as strings, and a record for one variant may carry an
/// empty value for the other variant's field.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorkout {
  #[serde(rename = "type")]
  kind:           WorkoutKind,
  id:             WorkoutId,
  date:           DateTime<Utc>,
  coords:         Coordinates,
  #[serde(default, deserialize_with = "loose_number")]
  distance:       Option<f64>,
  #[serde(default, deserialize_with = "loose_number")]
  duration:       Option<f64>,
  /// Kept as stored; rebuilt from `type` and `date` only when missing.
  #[serde(default)]
  description:    Option<String>,
  #[serde(default, deserialize_with = "variant_number", skip_serializing_if = "Option::is_none")]
  cadence:        Option<f64>,
  #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
  pace:           Option<f64>,
  #[serde(default, deserialize_with = "variant_number", skip_serializing_if = "Option::is_none")]
  elevation_gain: Option<f64>,
  #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
  speed:          Option<f64>,
}

impl From<&Workout> for StoredWorkout {
  fn from(w: &Workout) -> Self {
    let (cadence, pace, elevation_gain, speed) = match *w.activity() {
      Activity::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
      Activity::Cycling { elevation_gain, speed } => {
        (None, None, Some(elevation_gain), Some(speed))
      }
    };
    Self {
      kind: w.kind(),
      id: w.id().clone(),
      date: w.created_at(),
      coords: w.coordinates(),
      distance: Some(w.distance()),
      duration: Some(w.duration()),
      description: Some(w.description().to_owned()),
      cadence,
      pace,
      elevation_gain,
      speed,
    }
  }
}

impl StoredWorkout {
  /// Rebuild a typed workout, dispatching on the stored variant tag. Derived
  /// values are recomputed rather than read back.
  fn into_workout(self) -> Result<Workout, FieldError> {
    fn required(field: Field, value: Option<f64>) -> Result<f64, FieldError> {
      let value = value.ok_or(FieldError { field, problem: Problem::Missing })?;
      check_positive(value).map_err(|problem| FieldError { field, problem })
    }

    if !self.coords.is_valid() {
      return Err(FieldError {
        field:   Field::Coordinates,
        problem: Problem::OutOfRange,
      });
    }

    let distance = required(Field::Distance, self.distance)?;
    let duration = required(Field::Duration, self.duration)?;

    let variant_field = match self.kind {
      WorkoutKind::Running => self.cadence,
      WorkoutKind::Cycling => self.elevation_gain,
    };
    let field = Field::variant_field(self.kind);
    let variant_field = variant_field.ok_or(FieldError { field, problem: Problem::Missing })?;
    if !variant_field.is_finite() {
      return Err(FieldError { field, problem: Problem::NotFinite });
    }

    let workout = Workout::from_parts(
      self.id,
      self.date,
      self.coords,
      self.kind,
      distance,
      duration,
      variant_field,
    );
    Ok(match self.description.filter(|d| !d.trim().is_empty()) {
      Some(description) => workout.with_description(description),
      None => workout,
    })
  }
}

/// Accept a JSON number or a numeric string; anything else reads as absent.
fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Loose {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
  }

  Ok(match Option::<Loose>::deserialize(deserializer)? {
    Some(Loose::Number(n)) => Some(n),
    Some(Loose::Text(s)) => s.trim().parse().ok(),
    Some(Loose::Other(_)) | None => None,
  })
}

/// Like [`loose_number`], but a blank string reads as zero. The browser app's
/// edit form saved an empty cadence or elevation when the box was left blank.
fn variant_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::String(s)) if s.trim().is_empty() => Some(0.0),
    Some(value) => loose_number(value).unwrap_or(None),
    None => None,
  })
}

// ─── Workouts ────────────────────────────────────────────────────────────────

/// Serialise the whole sequence, in order.
pub fn encode(workouts: &[Workout]) -> Result<String> {
  let records: Vec<StoredWorkout> = workouts.iter().map(StoredWorkout::from).collect();
  Ok(serde_json::to_string(&records)?)
}

/// Rebuild the sequence from its stored text. Total: absent or malformed text
/// yields an empty sequence.
pub fn decode(text: Option<&str>) -> Vec<Workout> {
  let Some(text) = text else {
    return Vec::new();
  };

  let records: Vec<serde_json::Value> = match serde_json::from_str(text) {
    Ok(records) => records,
    Err(err) => {
      warn!(%err, "stored workouts are unreadable; starting with an empty log");
      return Vec::new();
    }
  };

  let mut seen = HashSet::new();
  let mut workouts = Vec::with_capacity(records.len());
  for (index, value) in records.into_iter().enumerate() {
    let record: StoredWorkout = match serde_json::from_value(value) {
      Ok(record) => record,
      Err(err) => {
        warn!(index, %err, "skipping unreadable workout record");
        continue;
      }
    };

    let workout = match record.into_workout() {
      Ok(workout) => workout,
      Err(err) => {
        warn!(index, %err, "skipping invalid workout record");
        continue;
      }
    };

    if !seen.insert(workout.id().clone()) {
      warn!(index, id = %workout.id(), "skipping workout with duplicate id");
      continue;
    }
    workouts.push(workout);
  }

  workouts
}

// ─── Sort flag ───────────────────────────────────────────────────────────────

pub fn encode_sort_flag(ascending_by_date: bool) -> String {
  ascending_by_date.to_string()
}

/// Absent or malformed text reads as `false`.
pub fn decode_sort_flag(text: Option<&str>) -> bool {
  match text.map(serde_json::from_str::<bool>) {
    Some(Ok(flag)) => flag,
    Some(Err(err)) => {
      warn!(%err, "stored sort flag is unreadable; treating as unset");
      false
    }
    None => false,
  }
}
