//! The `WorkoutView` trait: what the log asks of whatever displays it.
//!
//! A view owns a list of workouts and a map. The log keeps the view in step
//! with its own state by calling these methods after every change; a view
//! never reads the store.

use crate::{
  geo::Coordinates,
  workout::{Workout, WorkoutId, WorkoutKind},
};

pub trait WorkoutView {
  /// Pin a workout on the map.
  fn render_marker(&mut self, coordinates: Coordinates, description: &str, kind: WorkoutKind);

  /// Add one workout to the list.
  fn render_list_entry(&mut self, workout: &Workout);

  /// Drop one workout from the list (and its marker).
  fn remove_list_entry(&mut self, id: &WorkoutId);

  /// Replace the whole list with `workouts`, in order.
  fn render_list(&mut self, workouts: &[Workout]);

  /// Zoom the map so every coordinate is visible.
  fn fit_view_to(&mut self, coordinates: &[Coordinates]);

  /// Pan the map to `coordinates` at `zoom`.
  fn center_on(&mut self, coordinates: Coordinates, zoom: u8);
}
