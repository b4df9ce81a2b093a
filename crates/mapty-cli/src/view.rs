//! Terminal view. Keeps a rendered copy of the list and the map, and writes
//! the parts a command asks for.

use std::io::{self, Write};

use mapty_core::{
  geo::Coordinates,
  view::WorkoutView,
  workout::{Activity, Workout, WorkoutId, WorkoutKind},
};

// ─── Map state ────────────────────────────────────────────────────────────────

/// Where the map is looking.
#[derive(Debug, Clone, PartialEq)]
pub enum Camera {
  Centered { at: Coordinates, zoom: u8 },
  Fitted { south_west: Coordinates, north_east: Coordinates, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct Marker {
  at:    Coordinates,
  label: String,
}

impl Marker {
  fn new(at: Coordinates, description: &str, kind: WorkoutKind) -> Self {
    Self { at, label: format!("{} {description}", kind.icon()) }
  }
}

#[derive(Debug, Clone)]
struct Entry {
  id:     WorkoutId,
  /// The marker this workout was pinned with.
  marker: Marker,
  text:   String,
}

impl Entry {
  fn new(w: &Workout) -> Self {
    Self {
      id:     w.id().clone(),
      marker: Marker::new(w.coordinates(), w.description(), w.kind()),
      text:   format_entry(w),
    }
  }
}

// ─── View ─────────────────────────────────────────────────────────────────────

/// In-memory rendering of the workout list and map.
#[derive(Debug, Default)]
pub struct TerminalView {
  /// Rendered list entries, in display order.
  entries: Vec<Entry>,
  markers: Vec<Marker>,
  camera:  Option<Camera>,
}

impl TerminalView {
  pub fn camera(&self) -> Option<&Camera> { self.camera.as_ref() }

  /// Write the whole list.
  pub fn write_list(&self, out: &mut impl Write) -> io::Result<()> {
    if self.entries.is_empty() {
      return writeln!(out, "No workouts yet.");
    }
    for entry in &self.entries {
      writeln!(out, "{}", entry.text)?;
    }
    Ok(())
  }

  /// Write one list entry, if it is rendered.
  pub fn write_entry(&self, id: &WorkoutId, out: &mut impl Write) -> io::Result<()> {
    match self.entries.iter().find(|entry| &entry.id == id) {
      Some(entry) => writeln!(out, "{}", entry.text),
      None => Ok(()),
    }
  }

  /// Write the camera position followed by every marker.
  pub fn write_map(&self, out: &mut impl Write) -> io::Result<()> {
    match self.camera() {
      Some(Camera::Centered { at, zoom }) => writeln!(out, "🗺  map centered on {at} (zoom {zoom})")?,
      Some(Camera::Fitted { south_west, north_east, count }) => writeln!(
        out,
        "🗺  map fitted to {count} workout(s) between {south_west} and {north_east}"
      )?,
      None => writeln!(out, "🗺  map not placed")?,
    }
    for marker in &self.markers {
      writeln!(out, "  📍 {} at {}", marker.label, marker.at)?;
    }
    Ok(())
  }
}

impl WorkoutView for TerminalView {
  fn render_marker(&mut self, coordinates: Coordinates, description: &str, kind: WorkoutKind) {
    self.markers.push(Marker::new(coordinates, description, kind));
  }

  fn render_list_entry(&mut self, workout: &Workout) {
    self.entries.push(Entry::new(workout));
  }

  /// Drops the entry and the marker it was pinned with.
  fn remove_list_entry(&mut self, id: &WorkoutId) {
    let Some(index) = self.entries.iter().position(|entry| &entry.id == id) else {
      return;
    };
    let entry = self.entries.remove(index);
    if let Some(pin) = self.markers.iter().position(|m| *m == entry.marker) {
      self.markers.remove(pin);
    }
  }

  fn render_list(&mut self, workouts: &[Workout]) {
    self.entries = workouts.iter().map(Entry::new).collect();
  }

  fn fit_view_to(&mut self, coordinates: &[Coordinates]) {
    let Some(first) = coordinates.first() else {
      return;
    };
    let (mut south_west, mut north_east) = (*first, *first);
    for c in coordinates {
      south_west.latitude = south_west.latitude.min(c.latitude);
      south_west.longitude = south_west.longitude.min(c.longitude);
      north_east.latitude = north_east.latitude.max(c.latitude);
      north_east.longitude = north_east.longitude.max(c.longitude);
    }
    self.camera = Some(Camera::Fitted { south_west, north_east, count: coordinates.len() });
  }

  fn center_on(&mut self, coordinates: Coordinates, zoom: u8) {
    self.camera = Some(Camera::Centered { at: coordinates, zoom });
  }
}

// ─── Formatting ───────────────────────────────────────────────────────────────

/// The first eight characters of an id; enough to address it on the command
/// line.
pub fn short_id(id: &WorkoutId) -> &str {
  let s = id.as_str();
  s.get(..8).unwrap_or(s)
}

/// Two-line list entry: title and id, then the measurements.
pub fn format_entry(w: &Workout) -> String {
  let kind = w.kind();
  let (metric, detail) = match *w.activity() {
    Activity::Running { cadence, pace } => {
      (format!("⚡️ {pace:.1} min/km"), format!("🦶🏼 {cadence} spm"))
    }
    Activity::Cycling { elevation_gain, speed } => {
      (format!("⚡️ {speed:.1} km/h"), format!("🚵 {elevation_gain} m"))
    }
  };
  format!(
    "{} {}  [{}]\n   {} {} km   ⏱ {} min   {metric}   {detail}",
    kind.icon(),
    w.description(),
    short_id(w.id()),
    kind.icon(),
    w.distance(),
    w.duration(),
  )
}
