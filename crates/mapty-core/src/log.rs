//! [`WorkoutLog`], the single owner of a session's workouts.
//!
//! Every change to the sequence goes through here. Each mutating operation
//! builds the next state on a copy, writes it to the store, and only then
//! commits it in memory and tells the view; a failure at any step leaves the
//! log exactly as it was.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  codec::{self, SORT_KEY, WORKOUTS_KEY},
  factory::{self, RawWorkout, WorkoutEdit},
  geo::{Coordinates, GeolocationError, Geolocator},
  store::KeyValueStore,
  view::WorkoutView,
  workout::{Workout, WorkoutId},
};

/// Map zoom used when none is configured.
pub const DEFAULT_ZOOM: u8 = 13;

// ─── Sort order ──────────────────────────────────────────────────────────────

/// The ordering applied by [`WorkoutLog::sort_toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
  /// Shortest first.
  Distance,
  /// Oldest first.
  Date,
}

impl SortOrder {
  /// The order selected by the persisted `sortAscendingByDate` flag.
  fn from_flag(ascending_by_date: bool) -> Self {
    if ascending_by_date { Self::Date } else { Self::Distance }
  }

  /// Stable sort, so equal keys keep their relative order.
  fn apply(self, workouts: &mut [Workout]) {
    match self {
      Self::Distance => workouts.sort_by(|a, b| a.distance().total_cmp(&b.distance())),
      Self::Date => workouts.sort_by_key(Workout::created_at),
    }
  }
}

// ─── Log ─────────────────────────────────────────────────────────────────────

/// The session's ordered workouts, wired to a store and a view.
pub struct WorkoutLog<S, V> {
  store:        S,
  view:         V,
  workouts:     Vec<Workout>,
  /// Set once the current position is known and the map has been placed.
  map_position: Option<Coordinates>,
  zoom:         u8,
}

impl<S: KeyValueStore, V: WorkoutView> WorkoutLog<S, V> {
  /// Load the persisted workouts (an empty log if there are none or they are
  /// unreadable) and render the list.
  pub async fn load(store: S, mut view: V) -> Result<Self> {
    let text = store.get(WORKOUTS_KEY).await.map_err(Error::store)?;
    let workouts = codec::decode(text.as_deref());
    debug!(count = workouts.len(), "loaded workouts");

    view.render_list(&workouts);
    Ok(Self {
      store,
      view,
      workouts,
      map_position: None,
      zoom: DEFAULT_ZOOM,
    })
  }

  /// Zoom level used when placing or panning the map.
  pub fn with_zoom(mut self, zoom: u8) -> Self {
    self.zoom = zoom;
    self
  }

  // ── Map ───────────────────────────────────────────────────────────────────

  /// Ask `geolocator` for the current position, center the map there and pin
  /// every loaded workout.
  ///
  /// On failure the log stays usable for listing, sorting, editing and
  /// deleting; creating and map navigation remain unavailable.
  pub fn locate(&mut self, geolocator: &impl Geolocator) -> Result<Coordinates, GeolocationError> {
    let position = geolocator
      .current_position()
      .inspect_err(|err| warn!(%err, "map disabled"))?;

    self.map_position = Some(position);
    self.view.center_on(position, self.zoom);
    for w in &self.workouts {
      self.view.render_marker(w.coordinates(), w.description(), w.kind());
    }
    Ok(position)
  }

  /// The position the map was placed at, if it has been.
  pub fn map_position(&self) -> Option<Coordinates> { self.map_position }

  fn require_map(&self) -> Result<()> {
    match self.map_position {
      Some(_) => Ok(()),
      None => Err(Error::MapUnavailable),
    }
  }

  /// Pan the map to a workout.
  pub fn show(&mut self, id: &WorkoutId) -> Result<&Workout> {
    self.require_map()?;
    let index = self.index_of(id).ok_or_else(|| Error::NotFound(id.clone()))?;
    let workout = &self.workouts[index];
    self.view.center_on(workout.coordinates(), self.zoom);
    Ok(workout)
  }

  /// Fit the map to every workout. Nothing happens for an empty log.
  pub fn show_all(&mut self) -> Result<()> {
    self.require_map()?;
    if self.workouts.is_empty() {
      return Ok(());
    }
    let bounds: Vec<Coordinates> = self.workouts.iter().map(Workout::coordinates).collect();
    self.view.fit_view_to(&bounds);
    Ok(())
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Validate `input`, append the new workout, persist, and pin it.
  pub async fn create(&mut self, input: &RawWorkout) -> Result<&Workout> {
    self.require_map()?;
    let workout = factory::create_workout(input)?;

    let mut next = self.workouts.clone();
    next.push(workout);
    self.persist(&next).await?;
    self.workouts = next;

    let workout = &self.workouts[self.workouts.len() - 1];
    self.view.render_marker(workout.coordinates(), workout.description(), workout.kind());
    self.view.render_list_entry(workout);
    info!(id = %workout.id(), kind = %workout.kind(), "workout created");
    Ok(workout)
  }

  /// Replace a workout's distance, duration and (optionally) its variant
  /// field, then recompute its derived metric.
  pub async fn edit(&mut self, id: &WorkoutId, edit: &WorkoutEdit) -> Result<&Workout> {
    let index = self.index_of(id).ok_or_else(|| Error::NotFound(id.clone()))?;
    let m = factory::validate_edit(self.workouts[index].kind(), edit)?;

    let mut next = self.workouts.clone();
    next[index].apply_edit(m.distance, m.duration, m.variant_field);
    self.persist(&next).await?;
    self.workouts = next;

    self.view.render_list(&self.workouts);
    info!(%id, "workout edited");
    Ok(&self.workouts[index])
  }

  /// Remove a workout. Returns `false` (and writes nothing) if it was already
  /// gone.
  pub async fn delete(&mut self, id: &WorkoutId) -> Result<bool> {
    let Some(index) = self.index_of(id) else {
      debug!(%id, "delete of unknown workout ignored");
      return Ok(false);
    };

    let mut next = self.workouts.clone();
    next.remove(index);
    self.persist(&next).await?;
    self.workouts = next;

    self.view.remove_list_entry(id);
    info!(%id, "workout deleted");
    Ok(true)
  }

  /// Reorder by the persisted flag (date when set, distance otherwise),
  /// persist the new order, and flip the flag for next time.
  ///
  /// The flag is written first; if the reordered workouts then fail to
  /// persist, the previous flag is put back.
  pub async fn sort_toggle(&mut self) -> Result<SortOrder> {
    let stored = self.store.get(SORT_KEY).await.map_err(Error::store)?;
    let ascending_by_date = codec::decode_sort_flag(stored.as_deref());
    let order = SortOrder::from_flag(ascending_by_date);

    let mut next = self.workouts.clone();
    order.apply(&mut next);

    self
      .store
      .set(SORT_KEY, codec::encode_sort_flag(!ascending_by_date))
      .await
      .map_err(Error::store)?;
    if let Err(err) = self.persist(&next).await {
      self.restore(SORT_KEY, stored).await;
      return Err(err);
    }

    self.workouts = next;
    self.view.render_list(&self.workouts);
    info!(%order, "workouts sorted");
    Ok(order)
  }

  /// Forget everything: both durable records and the in-memory sequence.
  ///
  /// The sort flag goes first and is put back if the workouts cannot be
  /// removed, so a failure leaves both records as they were.
  pub async fn reset(&mut self) -> Result<()> {
    let stored = self.store.get(SORT_KEY).await.map_err(Error::store)?;
    self.store.remove(SORT_KEY).await.map_err(Error::store)?;
    if let Err(err) = self.store.remove(WORKOUTS_KEY).await {
      self.restore(SORT_KEY, stored).await;
      return Err(Error::store(err));
    }

    self.workouts.clear();
    self.view.render_list(&self.workouts);
    info!("workout log reset");
    Ok(())
  }

  /// Put `key` back to `previous` after a later write failed.
  async fn restore(&self, key: &str, previous: Option<String>) {
    let result = match previous {
      Some(value) => self.store.set(key, value).await,
      None => self.store.remove(key).await,
    };
    if let Err(err) = result {
      warn!(key, %err, "could not roll back after a failed write");
    }
  }

  async fn persist(&self, workouts: &[Workout]) -> Result<()> {
    let text = codec::encode(workouts)?;
    self.store.set(WORKOUTS_KEY, text).await.map_err(Error::store)?;
    debug!(count = workouts.len(), "persisted workouts");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// The current workouts, in order.
  pub fn list(&self) -> &[Workout] { &self.workouts }

  pub fn get(&self, id: &WorkoutId) -> Option<&Workout> {
    self.workouts.iter().find(|w| w.id() == id)
  }

  pub fn len(&self) -> usize { self.workouts.len() }

  pub fn is_empty(&self) -> bool { self.workouts.is_empty() }

  pub fn view(&self) -> &V { &self.view }

  pub fn store(&self) -> &S { &self.store }

  fn index_of(&self, id: &WorkoutId) -> Option<usize> {
    self.workouts.iter().position(|w| w.id() == id)
  }
}
