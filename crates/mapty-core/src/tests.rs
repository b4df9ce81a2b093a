//! Tests for `WorkoutLog` against an in-memory store and a recording view.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};

use crate::{
  Error,
  codec::{self, SORT_KEY, WORKOUTS_KEY},
  factory::{Field, RawWorkout, WorkoutEdit, create_workout_at},
  geo::{Coordinates, GeolocationError, Geolocator},
  log::{SortOrder, WorkoutLog},
  store::{KeyValueStore, MemoryStore},
  view::WorkoutView,
  workout::{Workout, WorkoutId, WorkoutKind},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Event {
  Marker(String),
  Entry(WorkoutId),
  Removed(WorkoutId),
  List(Vec<WorkoutId>),
  Fit(Vec<Coordinates>),
  Center(Coordinates, u8),
}

#[derive(Debug, Default)]
struct RecordingView {
  events: Vec<Event>,
}

impl RecordingView {
  fn last(&self) -> Option<&Event> { self.events.last() }
}

impl WorkoutView for RecordingView {
  fn render_marker(&mut self, _: Coordinates, description: &str, _: WorkoutKind) {
    self.events.push(Event::Marker(description.to_owned()));
  }

  fn render_list_entry(&mut self, workout: &Workout) {
    self.events.push(Event::Entry(workout.id().clone()));
  }

  fn remove_list_entry(&mut self, id: &WorkoutId) {
    self.events.push(Event::Removed(id.clone()));
  }

  fn render_list(&mut self, workouts: &[Workout]) {
    self
      .events
      .push(Event::List(workouts.iter().map(|w| w.id().clone()).collect()));
  }

  fn fit_view_to(&mut self, coordinates: &[Coordinates]) {
    self.events.push(Event::Fit(coordinates.to_vec()));
  }

  fn center_on(&mut self, coordinates: Coordinates, zoom: u8) {
    self.events.push(Event::Center(coordinates, zoom));
  }
}

struct NoSignal;

impl Geolocator for NoSignal {
  fn current_position(&self) -> Result<Coordinates, GeolocationError> {
    Err(GeolocationError::new("permission denied"))
  }
}

/// A store whose writes always fail.
#[derive(Default)]
struct ReadOnlyStore {
  inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
  type Error = std::io::Error;

  async fn get(&self, key: &str) -> Result<Option<String>, std::io::Error> {
    Ok(self.inner.peek(key))
  }

  async fn set(&self, _: &str, _: String) -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk full"))
  }

  async fn remove(&self, _: &str) -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk full"))
  }
}

/// A store whose writes fail for one key only.
struct FailingKeyStore {
  inner: Arc<MemoryStore>,
  key:   &'static str,
}

impl FailingKeyStore {
  fn check(&self, key: &str) -> Result<(), std::io::Error> {
    if key == self.key {
      return Err(std::io::Error::other("disk full"));
    }
    Ok(())
  }
}

impl KeyValueStore for FailingKeyStore {
  type Error = std::io::Error;

  async fn get(&self, key: &str) -> Result<Option<String>, std::io::Error> {
    Ok(self.inner.peek(key))
  }

  async fn set(&self, key: &str, value: String) -> Result<(), std::io::Error> {
    self.check(key)?;
    self.inner.set(key, value).await.map_err(|never| match never {})
  }

  async fn remove(&self, key: &str) -> Result<(), std::io::Error> {
    self.check(key)?;
    self.inner.remove(key).await.map_err(|never| match never {})
  }
}

/// Reopen `store`'s contents behind a store that refuses writes to `key`.
async fn failing_on(
  store: &Arc<MemoryStore>,
  key: &'static str,
) -> WorkoutLog<FailingKeyStore, RecordingView> {
  let failing = FailingKeyStore { inner: Arc::clone(store), key };
  WorkoutLog::load(failing, RecordingView::default())
    .await
    .unwrap()
}

const HOME: Coordinates = Coordinates::new(10.0, 20.0);

type TestLog = WorkoutLog<Arc<MemoryStore>, RecordingView>;

async fn located(store: &Arc<MemoryStore>) -> TestLog {
  let mut log = WorkoutLog::load(Arc::clone(store), RecordingView::default())
    .await
    .unwrap();
  log.locate(&HOME).unwrap();
  log
}

/// A located log over running workouts with the given distances, created an
/// hour apart in the order given.
async fn seeded(store: &Arc<MemoryStore>, distances: &[&str]) -> TestLog {
  let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
  let workouts: Vec<Workout> = distances
    .iter()
    .zip(0..)
    .map(|(d, hour)| {
      create_workout_at(&running(d, "30", "170"), start + TimeDelta::hours(hour)).unwrap()
    })
    .collect();
  store
    .set(WORKOUTS_KEY, codec::encode(&workouts).unwrap())
    .await
    .unwrap();
  located(store).await
}

fn running(distance: &str, duration: &str, cadence: &str) -> RawWorkout {
  RawWorkout {
    kind:          WorkoutKind::Running,
    coordinates:   HOME,
    distance:      distance.into(),
    duration:      duration.into(),
    variant_field: cadence.into(),
  }
}

fn cycling(distance: &str, duration: &str, elevation: &str) -> RawWorkout {
  RawWorkout {
    kind:          WorkoutKind::Cycling,
    coordinates:   Coordinates::new(10.5, 20.5),
    distance:      distance.into(),
    duration:      duration.into(),
    variant_field: elevation.into(),
  }
}

fn edit(distance: &str, duration: &str, field: Option<&str>) -> WorkoutEdit {
  WorkoutEdit {
    distance:      Some(distance.into()),
    duration:      Some(duration.into()),
    variant_field: field.map(Into::into),
  }
}

fn distances(log: &TestLog) -> Vec<f64> {
  log.list().iter().map(Workout::distance).collect()
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_running_workout_in_empty_log() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  assert!(log.is_empty());

  let w = log.create(&running("5", "25", "180")).await.unwrap().clone();

  assert_eq!(log.len(), 1);
  assert_eq!(w.pace(), Some(5.0));
  assert_eq!(w.coordinates(), HOME);
  assert_eq!(
    w.description(),
    format!("Running on {}", w.created_at().format("%B %-d"))
  );

  let events = &log.view().events;
  assert_eq!(events[events.len() - 2], Event::Marker(w.description().to_owned()));
  assert_eq!(events[events.len() - 1], Event::Entry(w.id().clone()));
  assert!(store.peek(WORKOUTS_KEY).unwrap().contains(w.id().as_str()));
}

#[tokio::test]
async fn create_rejects_invalid_input_without_mutation() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  let events_before = log.view().events.len();

  let err = log.create(&running("-1", "25", "180")).await.unwrap_err();
  match err {
    Error::Validation(e) => assert_eq!(e.fields().collect::<Vec<_>>(), [Field::Distance]),
    other => panic!("expected validation error, got {other:?}"),
  }

  assert_eq!(log.len(), 0);
  assert!(store.peek(WORKOUTS_KEY).is_none());
  assert_eq!(log.view().events.len(), events_before);
}

#[tokio::test]
async fn create_requires_a_located_map() {
  let store = Arc::new(MemoryStore::new());
  let mut log = WorkoutLog::load(Arc::clone(&store), RecordingView::default())
    .await
    .unwrap();

  let err = log.locate(&NoSignal).unwrap_err();
  assert_eq!(err.reason, "permission denied");
  assert!(log.map_position().is_none());

  let err = log.create(&running("5", "25", "180")).await.unwrap_err();
  assert!(matches!(err, Error::MapUnavailable));
  assert!(matches!(log.show_all(), Err(Error::MapUnavailable)));
  assert!(log.is_empty());
}

#[tokio::test]
async fn locate_centers_map_and_pins_loaded_workouts() {
  let store = Arc::new(MemoryStore::new());
  {
    let mut log = located(&store).await;
    log.create(&running("5", "25", "180")).await.unwrap();
    log.create(&cycling("20", "60", "300")).await.unwrap();
  }

  let mut log = WorkoutLog::load(Arc::clone(&store), RecordingView::default())
    .await
    .unwrap()
    .with_zoom(15);
  log.locate(&HOME).unwrap();

  let events = &log.view().events;
  assert!(matches!(&events[0], Event::List(ids) if ids.len() == 2));
  assert_eq!(events[1], Event::Center(HOME, 15));
  assert!(matches!(&events[2], Event::Marker(d) if d.starts_with("Running on")));
  assert!(matches!(&events[3], Event::Marker(d) if d.starts_with("Cycling on")));
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reload_restores_typed_workouts() {
  let store = Arc::new(MemoryStore::new());
  let (run_id, ride_id) = {
    let mut log = located(&store).await;
    let run = log.create(&running("5", "25", "180")).await.unwrap().id().clone();
    let ride = log.create(&cycling("20", "60", "300")).await.unwrap().id().clone();
    (run, ride)
  };

  let mut log = located(&store).await;
  assert_eq!(log.len(), 2);
  assert_eq!(log.get(&run_id).unwrap().kind(), WorkoutKind::Running);
  assert_eq!(log.get(&ride_id).unwrap().speed(), Some(20.0));

  // Reloaded entries still recompute on edit.
  let ride = log.edit(&ride_id, &edit("30", "60", None)).await.unwrap();
  assert_eq!(ride.speed(), Some(30.0));
}

#[tokio::test]
async fn load_of_corrupt_record_starts_empty() {
  let store = Arc::new(MemoryStore::new());
  store.set(WORKOUTS_KEY, "[{]".into()).await.unwrap();

  let log = WorkoutLog::load(Arc::clone(&store), RecordingView::default())
    .await
    .unwrap();
  assert!(log.is_empty());
  assert_eq!(log.view().last(), Some(&Event::List(vec![])));
}

#[tokio::test]
async fn failed_write_leaves_log_untouched() {
  let mut log = WorkoutLog::load(ReadOnlyStore::default(), RecordingView::default())
    .await
    .unwrap();
  log.locate(&HOME).unwrap();
  let events_before = log.view().events.len();

  let err = log.create(&running("5", "25", "180")).await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));
  assert!(log.is_empty());
  assert_eq!(log.view().events.len(), events_before);
}

// ─── Edit ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_updates_measurements_and_recomputes() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  let id = log.create(&running("5", "25", "180")).await.unwrap().id().clone();

  let w = log.edit(&id, &edit("10", "45", Some("172"))).await.unwrap();
  assert_eq!(w.distance(), 10.0);
  assert_eq!(w.pace(), Some(4.5));
  assert_eq!(w.cadence(), Some(172.0));
  assert_eq!(w.id(), &id);

  let w = log.edit(&id, &edit("8", "40", None)).await.unwrap();
  assert_eq!(w.cadence(), Some(172.0));
  assert_eq!(w.pace(), Some(5.0));

  assert_eq!(log.view().last(), Some(&Event::List(vec![id.clone()])));
  assert!(store.peek(WORKOUTS_KEY).unwrap().contains("\"distance\":8.0"));
}

#[tokio::test]
async fn edit_of_unknown_id_is_not_found() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;

  let err = log
    .edit(&WorkoutId::from("missing"), &edit("1", "1", None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(id) if id.as_str() == "missing"));
}

#[tokio::test]
async fn edit_rejects_missing_or_invalid_values_atomically() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  let id = log.create(&cycling("20", "60", "300")).await.unwrap().id().clone();
  let stored = store.peek(WORKOUTS_KEY);

  let missing = WorkoutEdit {
    distance: Some("12".into()),
    duration: Some(" ".into()),
    variant_field: Some("100".into()),
  };
  assert!(matches!(log.edit(&id, &missing).await, Err(Error::Validation(_))));

  let negative = edit("-12", "30", Some("100"));
  assert!(matches!(log.edit(&id, &negative).await, Err(Error::Validation(_))));

  let bad_elevation = edit("12", "30", Some("-5"));
  assert!(matches!(log.edit(&id, &bad_elevation).await, Err(Error::Validation(_))));

  let w = log.get(&id).unwrap();
  assert_eq!(w.distance(), 20.0);
  assert_eq!(w.elevation_gain(), Some(300.0));
  assert_eq!(store.peek(WORKOUTS_KEY), stored);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_exactly_one_then_noops() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  let first = log.create(&running("5", "25", "180")).await.unwrap().id().clone();
  log.create(&cycling("20", "60", "300")).await.unwrap();

  assert!(log.delete(&first).await.unwrap());
  assert_eq!(log.len(), 1);
  assert!(log.get(&first).is_none());
  assert_eq!(log.view().last(), Some(&Event::Removed(first.clone())));

  assert!(!log.delete(&first).await.unwrap());
  assert_eq!(log.len(), 1);

  let reloaded = located(&store).await;
  assert_eq!(reloaded.len(), 1);
}

// ─── Sort ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_sort_orders_by_distance_then_by_date() {
  let store = Arc::new(MemoryStore::new());
  let mut log = seeded(&store, &["5", "3"]).await;
  assert!(store.peek(SORT_KEY).is_none());

  assert_eq!(log.sort_toggle().await.unwrap(), SortOrder::Distance);
  assert_eq!(distances(&log), [3.0, 5.0]);
  assert_eq!(store.peek(SORT_KEY).as_deref(), Some("true"));

  assert_eq!(log.sort_toggle().await.unwrap(), SortOrder::Date);
  assert_eq!(distances(&log), [5.0, 3.0]);
  assert_eq!(store.peek(SORT_KEY).as_deref(), Some("false"));
}

#[tokio::test]
async fn sort_twice_restores_creation_order() {
  let store = Arc::new(MemoryStore::new());
  let mut log = seeded(&store, &["5", "3", "8", "1"]).await;

  log.sort_toggle().await.unwrap();
  assert_eq!(distances(&log), [1.0, 3.0, 5.0, 8.0]);
  log.sort_toggle().await.unwrap();
  assert_eq!(distances(&log), [5.0, 3.0, 8.0, 1.0]);

  let ids: Vec<_> = log.list().iter().map(|w| w.id().clone()).collect();
  assert_eq!(log.view().last(), Some(&Event::List(ids)));
}

#[tokio::test]
async fn sort_order_is_persisted() {
  let store = Arc::new(MemoryStore::new());
  {
    let mut log = seeded(&store, &["5", "3"]).await;
    log.sort_toggle().await.unwrap();
  }

  let mut log = located(&store).await;
  assert_eq!(distances(&log), [3.0, 5.0]);
  assert_eq!(log.sort_toggle().await.unwrap(), SortOrder::Date);
}

#[tokio::test]
async fn sort_with_unwritable_flag_changes_nothing() {
  let store = Arc::new(MemoryStore::new());
  seeded(&store, &["5", "3"]).await;
  let stored_before = store.peek(WORKOUTS_KEY);

  let mut log = failing_on(&store, SORT_KEY).await;
  let events_before = log.view().events.len();

  assert!(matches!(log.sort_toggle().await, Err(Error::Store(_))));
  assert_eq!(
    log.list().iter().map(Workout::distance).collect::<Vec<_>>(),
    [5.0, 3.0]
  );
  assert_eq!(store.peek(WORKOUTS_KEY), stored_before);
  assert!(store.peek(SORT_KEY).is_none());
  assert_eq!(log.view().events.len(), events_before);
}

#[tokio::test]
async fn sort_with_unwritable_workouts_restores_flag() {
  let store = Arc::new(MemoryStore::new());
  seeded(&store, &["5", "3"]).await;
  let stored_before = store.peek(WORKOUTS_KEY);

  let mut log = failing_on(&store, WORKOUTS_KEY).await;
  let events_before = log.view().events.len();

  assert!(matches!(log.sort_toggle().await, Err(Error::Store(_))));
  assert_eq!(
    log.list().iter().map(Workout::distance).collect::<Vec<_>>(),
    [5.0, 3.0]
  );
  assert_eq!(store.peek(WORKOUTS_KEY), stored_before);
  assert!(store.peek(SORT_KEY).is_none());
  assert_eq!(log.view().events.len(), events_before);
}

// ─── Reset ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_clears_workouts_and_sort_flag() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  log.create(&running("5", "25", "180")).await.unwrap();
  log.sort_toggle().await.unwrap();

  log.reset().await.unwrap();
  assert!(log.is_empty());
  assert!(store.peek(WORKOUTS_KEY).is_none());
  assert!(store.peek(SORT_KEY).is_none());
  assert_eq!(log.view().last(), Some(&Event::List(vec![])));

  // The flag starts over from its default.
  log.create(&running("5", "25", "180")).await.unwrap();
  assert_eq!(log.sort_toggle().await.unwrap(), SortOrder::Distance);
}

#[tokio::test]
async fn reset_with_unremovable_flag_keeps_everything() {
  let store = Arc::new(MemoryStore::new());
  seeded(&store, &["5"]).await;
  store.set(SORT_KEY, codec::encode_sort_flag(true)).await.unwrap();
  let stored_before = store.peek(WORKOUTS_KEY);

  let mut log = failing_on(&store, SORT_KEY).await;
  assert!(matches!(log.reset().await, Err(Error::Store(_))));

  assert_eq!(log.len(), 1);
  assert_eq!(store.peek(WORKOUTS_KEY), stored_before);
  assert_eq!(store.peek(SORT_KEY).as_deref(), Some("true"));
}

#[tokio::test]
async fn reset_with_unremovable_workouts_restores_flag() {
  let store = Arc::new(MemoryStore::new());
  seeded(&store, &["5"]).await;
  store.set(SORT_KEY, codec::encode_sort_flag(true)).await.unwrap();
  let stored_before = store.peek(WORKOUTS_KEY);

  let mut log = failing_on(&store, WORKOUTS_KEY).await;
  let events_before = log.view().events.len();
  assert!(matches!(log.reset().await, Err(Error::Store(_))));

  assert_eq!(log.len(), 1);
  assert_eq!(store.peek(WORKOUTS_KEY), stored_before);
  assert_eq!(store.peek(SORT_KEY).as_deref(), Some("true"));
  assert_eq!(log.view().events.len(), events_before);
}

// ─── Map navigation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn show_pans_to_workout_and_show_all_fits_every_workout() {
  let store = Arc::new(MemoryStore::new());
  let mut log = located(&store).await;
  log.show_all().unwrap();
  assert!(!matches!(log.view().last(), Some(Event::Fit(_))));

  let id = log.create(&cycling("20", "60", "300")).await.unwrap().id().clone();
  log.create(&running("5", "25", "180")).await.unwrap();

  log.show(&id).unwrap();
  assert_eq!(
    log.view().last(),
    Some(&Event::Center(Coordinates::new(10.5, 20.5), 13))
  );

  log.show_all().unwrap();
  assert_eq!(
    log.view().last(),
    Some(&Event::Fit(vec![Coordinates::new(10.5, 20.5), HOME]))
  );

  assert!(matches!(
    log.show(&WorkoutId::from("nope")),
    Err(Error::NotFound(_))
  ));
}
