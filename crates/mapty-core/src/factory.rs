//! Turning raw, untrusted field values into workouts.
//!
//! Creation and edit share one numeric rule: every measurement must parse as
//! a finite number strictly greater than zero. Nothing is constructed unless
//! every field passes.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
  geo::Coordinates,
  workout::{Workout, WorkoutId, WorkoutKind},
};

// ─── Raw input ───────────────────────────────────────────────────────────────

/// Field values for a new workout, as typed by the user.
#[derive(Debug, Clone)]
pub struct RawWorkout {
  pub kind:          WorkoutKind,
  /// Where on the map the workout was pinned.
  pub coordinates:   Coordinates,
  pub distance:      String,
  pub duration:      String,
  /// Cadence for running, elevation gain for cycling.
  pub variant_field: String,
}

/// Replacement values for an existing workout. Distance and duration are
/// required; an absent or blank variant field keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct WorkoutEdit {
  pub distance:      Option<String>,
  pub duration:      Option<String>,
  pub variant_field: Option<String>,
}

/// Validated edit values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
  pub distance:      f64,
  pub duration:      f64,
  pub variant_field: Option<f64>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A user-supplied field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  Coordinates,
  Distance,
  Duration,
  Cadence,
  ElevationGain,
}

impl Field {
  /// The variant-specific field for `kind`.
  pub fn variant_field(kind: WorkoutKind) -> Self {
    match kind {
      WorkoutKind::Running => Self::Cadence,
      WorkoutKind::Cycling => Self::ElevationGain,
    }
  }
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Problem {
  #[strum(to_string = "is required")]
  Missing,
  #[strum(to_string = "is not a number")]
  NotANumber,
  #[strum(to_string = "must be finite")]
  NotFinite,
  #[strum(to_string = "must be positive")]
  NotPositive,
  #[strum(to_string = "is out of range")]
  OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
  pub field:   Field,
  pub problem: Problem,
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.field, self.problem)
  }
}

/// One or more fields were rejected; lists every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid workout: {}", join(.errors))]
pub struct ValidationError {
  errors: Vec<FieldError>,
}

impl ValidationError {
  pub fn errors(&self) -> &[FieldError] { &self.errors }

  /// The rejected fields, in input order.
  pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
    self.errors.iter().map(|e| e.field)
  }
}

fn join(errors: &[FieldError]) -> String {
  errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ─── Shared numeric rule ─────────────────────────────────────────────────────

/// Accept only finite values strictly greater than zero.
pub fn check_positive(value: f64) -> Result<f64, Problem> {
  if !value.is_finite() {
    Err(Problem::NotFinite)
  } else if value <= 0.0 {
    Err(Problem::NotPositive)
  } else {
    Ok(value)
  }
}

/// Parse a raw measurement under the shared rule.
pub fn parse_positive(raw: &str) -> Result<f64, Problem> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(Problem::Missing);
  }
  let value = raw.parse::<f64>().map_err(|_| Problem::NotANumber)?;
  check_positive(value)
}

/// Collects every field problem before deciding, so the caller sees them all.
#[derive(Default)]
struct Checker {
  errors: Vec<FieldError>,
}

impl Checker {
  fn measurement(&mut self, field: Field, raw: Option<&str>) -> Option<f64> {
    match parse_positive(raw.unwrap_or_default()) {
      Ok(value) => Some(value),
      Err(problem) => {
        self.errors.push(FieldError { field, problem });
        None
      }
    }
  }

  fn coordinates(&mut self, coordinates: Coordinates) {
    if !coordinates.is_valid() {
      self.errors.push(FieldError {
        field:   Field::Coordinates,
        problem: Problem::OutOfRange,
      });
    }
  }

  /// Release `value` only if no field was rejected.
  fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
    match value {
      Some(value) if self.errors.is_empty() => Ok(value),
      _ => Err(ValidationError { errors: self.errors }),
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Validate `input` and build a new workout stamped with the current time.
pub fn create_workout(input: &RawWorkout) -> Result<Workout, ValidationError> {
  create_workout_at(input, Utc::now())
}

/// Like [`create_workout`] with an explicit creation time.
pub fn create_workout_at(
  input: &RawWorkout,
  created_at: DateTime<Utc>,
) -> Result<Workout, ValidationError> {
  let mut check = Checker::default();
  check.coordinates(input.coordinates);
  let distance = check.measurement(Field::Distance, Some(&input.distance));
  let duration = check.measurement(Field::Duration, Some(&input.duration));
  let variant_field =
    check.measurement(Field::variant_field(input.kind), Some(&input.variant_field));
  let ((distance, duration), variant_field) =
    check.finish(distance.zip(duration).zip(variant_field))?;

  Ok(Workout::from_parts(
    WorkoutId::generate(),
    created_at,
    input.coordinates,
    input.kind,
    distance,
    duration,
    variant_field,
  ))
}

/// Validate an edit against a workout of variant `kind`.
pub fn validate_edit(
  kind: WorkoutKind,
  edit: &WorkoutEdit,
) -> Result<Measurements, ValidationError> {
  let mut check = Checker::default();
  let distance = check.measurement(Field::Distance, edit.distance.as_deref());
  let duration = check.measurement(Field::Duration, edit.duration.as_deref());
  let variant_field = match edit.variant_field.as_deref().map(str::trim) {
    None | Some("") => None,
    Some(raw) => check.measurement(Field::variant_field(kind), Some(raw)),
  };
  let (distance, duration) = check.finish(distance.zip(duration))?;

  Ok(Measurements { distance, duration, variant_field })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(kind: WorkoutKind, distance: &str, duration: &str, field: &str) -> RawWorkout {
    RawWorkout {
      kind,
      coordinates: Coordinates::new(10.0, 20.0),
      distance: distance.into(),
      duration: duration.into(),
      variant_field: field.into(),
    }
  }

  #[test]
  fn running_pace_matches_duration_over_distance() {
    for (d, t, c) in [(5.0, 25.0, 180.0), (0.4, 3.3, 150.0), (42.195, 181.7, 176.0)] {
      let w = create_workout(&raw(
        WorkoutKind::Running,
        &d.to_string(),
        &t.to_string(),
        &c.to_string(),
      ))
      .unwrap();
      assert_eq!(w.pace(), Some(t / d));
      assert_eq!(w.kind(), WorkoutKind::Running);
    }
  }

  #[test]
  fn cycling_speed_matches_distance_over_hours() {
    for (d, t, e) in [(27.0, 95.0, 523.0), (1.5, 7.0, 2.0), (160.0, 333.3, 1800.0)] {
      let w = create_workout(&raw(
        WorkoutKind::Cycling,
        &d.to_string(),
        &t.to_string(),
        &e.to_string(),
      ))
      .unwrap();
      assert_eq!(w.speed(), Some(d / (t / 60.0)));
    }
  }

  #[test]
  fn negative_distance_is_rejected() {
    let err = create_workout(&raw(WorkoutKind::Running, "-1", "25", "180")).unwrap_err();
    assert_eq!(err.errors(), &[FieldError {
      field:   Field::Distance,
      problem: Problem::NotPositive,
    }]);
  }

  #[test]
  fn every_offending_field_is_named() {
    let err = create_workout(&raw(WorkoutKind::Running, "", "abc", "0")).unwrap_err();
    let fields: Vec<_> = err.fields().collect();
    assert_eq!(fields, [Field::Distance, Field::Duration, Field::Cadence]);
    assert_eq!(
      err.to_string(),
      "invalid workout: distance is required, duration is not a number, cadence must be positive"
    );
  }

  #[test]
  fn non_finite_values_are_rejected() {
    let err = create_workout(&raw(WorkoutKind::Cycling, "inf", "NaN", "10")).unwrap_err();
    assert_eq!(err.errors()[0].problem, Problem::NotFinite);
    assert_eq!(err.errors()[1].problem, Problem::NotFinite);
  }

  #[test]
  fn elevation_gain_follows_the_same_rule() {
    let err = create_workout(&raw(WorkoutKind::Cycling, "10", "30", "-50")).unwrap_err();
    assert_eq!(err.fields().collect::<Vec<_>>(), [Field::ElevationGain]);
  }

  #[test]
  fn out_of_range_coordinates_are_rejected() {
    let mut input = raw(WorkoutKind::Running, "5", "25", "180");
    input.coordinates = Coordinates::new(120.0, 20.0);
    let err = create_workout(&input).unwrap_err();
    assert_eq!(err.fields().collect::<Vec<_>>(), [Field::Coordinates]);
  }

  #[test]
  fn surrounding_whitespace_is_ignored() {
    let w = create_workout(&raw(WorkoutKind::Running, " 5 ", "25\n", "180")).unwrap();
    assert_eq!(w.distance(), 5.0);
  }

  #[test]
  fn edit_requires_distance_and_duration() {
    let edit = WorkoutEdit {
      distance: Some("4".into()),
      duration: None,
      variant_field: None,
    };
    let err = validate_edit(WorkoutKind::Running, &edit).unwrap_err();
    assert_eq!(err.errors(), &[FieldError {
      field:   Field::Duration,
      problem: Problem::Missing,
    }]);
  }

  #[test]
  fn edit_applies_the_creation_rule() {
    let edit = WorkoutEdit {
      distance: Some("-3".into()),
      duration: Some("20".into()),
      variant_field: Some("-10".into()),
    };
    let err = validate_edit(WorkoutKind::Cycling, &edit).unwrap_err();
    assert_eq!(err.fields().collect::<Vec<_>>(), [
      Field::Distance,
      Field::ElevationGain
    ]);
  }

  #[test]
  fn blank_variant_field_keeps_current_value() {
    let edit = WorkoutEdit {
      distance: Some("4".into()),
      duration: Some("20".into()),
      variant_field: Some("  ".into()),
    };
    let m = validate_edit(WorkoutKind::Running, &edit).unwrap();
    assert_eq!(m, Measurements { distance: 4.0, duration: 20.0, variant_field: None });
  }
}
