//! `mapty`: log running and cycling workouts from the terminal.
//!
//! # Usage
//!
//! ```
//! mapty --position 46.52,6.63 add running --at 46.51,6.62 --distance 5.2 --duration 24 --cadence 178
//! mapty list
//! mapty edit 3f2a9c1b --distance 6 --duration 30
//! mapty sort
//! mapty --config ~/.config/mapty/config.toml show-all
//! ```

mod settings;
mod view;

use std::{
  io::{self, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use mapty_core::{
  factory::{RawWorkout, WorkoutEdit},
  geo::Coordinates,
  log::WorkoutLog,
  workout::{Workout, WorkoutId, WorkoutKind},
};
use mapty_store_sqlite::SqliteStore;
use settings::{ConfiguredPosition, Settings};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use view::TerminalView;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mapty", version, about = "Map-based workout log")]
struct Cli {
  /// Path to a TOML settings file (store_path, map_zoom, position).
  #[arg(short, long, value_name = "FILE", default_value = "mapty.toml")]
  config: PathBuf,

  /// SQLite database to use instead of the configured one.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Current position; overrides the configured one.
  #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
  position: Option<Coordinates>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Record a new workout at a point on the map.
  Add(AddArgs),
  /// Print every workout in its current order.
  List,
  /// Change a workout's distance, duration, cadence or elevation gain.
  Edit(EditArgs),
  /// Delete a workout.
  Delete {
    /// Workout id, or a unique prefix of one.
    id: String,
  },
  /// Reorder by distance, or by date on alternate calls.
  Sort,
  /// Pan the map to a workout.
  Show {
    /// Workout id, or a unique prefix of one.
    id: String,
  },
  /// Fit the map to every workout.
  ShowAll,
  /// Delete every workout and the sort preference.
  Reset,
}

#[derive(Args, Debug)]
struct AddArgs {
  /// `running` or `cycling`.
  kind: WorkoutKind,

  /// Where the workout happened.
  #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
  at: Coordinates,

  /// Kilometres.
  #[arg(long, allow_hyphen_values = true)]
  distance: String,

  /// Minutes.
  #[arg(long, allow_hyphen_values = true)]
  duration: String,

  /// Steps per minute (running).
  #[arg(long, allow_hyphen_values = true)]
  cadence: Option<String>,

  /// Metres climbed (cycling).
  #[arg(long, allow_hyphen_values = true)]
  elevation: Option<String>,
}

/// Pick the measurement that belongs to `kind`, refusing the other one.
fn variant_field(
  kind: WorkoutKind,
  cadence: Option<String>,
  elevation: Option<String>,
) -> anyhow::Result<Option<String>> {
  Ok(match (kind, cadence, elevation) {
    (WorkoutKind::Running, _, Some(_)) => bail!("--elevation only applies to cycling"),
    (WorkoutKind::Cycling, Some(_), _) => bail!("--cadence only applies to running"),
    (WorkoutKind::Running, cadence, None) => cadence,
    (WorkoutKind::Cycling, None, elevation) => elevation,
  })
}

impl AddArgs {
  fn into_raw(self) -> anyhow::Result<RawWorkout> {
    let variant_field = variant_field(self.kind, self.cadence, self.elevation)?;
    Ok(RawWorkout {
      kind:          self.kind,
      coordinates:   self.at,
      distance:      self.distance,
      duration:      self.duration,
      // Left blank so validation reports it as missing.
      variant_field: variant_field.unwrap_or_default(),
    })
  }
}

#[derive(Args, Debug)]
struct EditArgs {
  /// Workout id, or a unique prefix of one.
  id: String,

  #[arg(long, allow_hyphen_values = true)]
  distance: Option<String>,

  #[arg(long, allow_hyphen_values = true)]
  duration: Option<String>,

  #[arg(long, allow_hyphen_values = true)]
  cadence: Option<String>,

  #[arg(long, allow_hyphen_values = true)]
  elevation: Option<String>,
}

impl EditArgs {
  /// Build the edit for a workout of `kind`. An unknown workout gets no
  /// variant field; the log reports it as not found.
  fn into_edit(self, kind: Option<WorkoutKind>) -> anyhow::Result<WorkoutEdit> {
    let variant_field = match kind {
      Some(kind) => variant_field(kind, self.cadence, self.elevation)?,
      None => None,
    };
    Ok(WorkoutEdit {
      distance: self.distance,
      duration: self.duration,
      variant_field,
    })
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store_path = expand_tilde(cli.store.as_deref().unwrap_or(&settings.store_path));
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mut log = WorkoutLog::load(store, TerminalView::default())
    .await
    .context("failed to load workouts")?
    .with_zoom(settings.map_zoom);

  let position = ConfiguredPosition(cli.position.or(settings.position));
  let mut out = io::stdout().lock();

  match cli.command {
    Command::Add(args) => {
      let raw = args.into_raw()?;
      locate(&mut log, &position);
      let id = log.create(&raw).await?.id().clone();
      log.view().write_entry(&id, &mut out)?;
    }
    Command::List => {
      log.view().write_list(&mut out)?;
    }
    Command::Edit(args) => {
      let id = resolve_id(log.list(), &args.id)?;
      let edit = args.into_edit(log.get(&id).map(Workout::kind))?;
      log.edit(&id, &edit).await?;
      log.view().write_entry(&id, &mut out)?;
    }
    Command::Delete { id } => {
      let id = resolve_id(log.list(), &id)?;
      if log.delete(&id).await? {
        writeln!(out, "Deleted {id}.")?;
      } else {
        writeln!(out, "No workout {id}; nothing deleted.")?;
      }
    }
    Command::Sort => {
      let order = log.sort_toggle().await?;
      writeln!(out, "Sorted by {order}.")?;
      log.view().write_list(&mut out)?;
    }
    Command::Show { id } => {
      let id = resolve_id(log.list(), &id)?;
      locate(&mut log, &position);
      log.show(&id)?;
      log.view().write_entry(&id, &mut out)?;
      log.view().write_map(&mut out)?;
    }
    Command::ShowAll => {
      locate(&mut log, &position);
      log.show_all()?;
      log.view().write_map(&mut out)?;
    }
    Command::Reset => {
      let count = log.len();
      log.reset().await?;
      writeln!(out, "Removed {count} workout(s).")?;
    }
  }

  out.flush()?;
  Ok(())
}

/// Place the map. A missing position is reported but not fatal; commands that
/// need the map fail on their own.
fn locate(log: &mut WorkoutLog<SqliteStore, TerminalView>, position: &ConfiguredPosition) {
  if let Err(err) = log.locate(position) {
    eprintln!("warning: {err}");
  }
}

/// Match `raw` against a full id first, then against a unique id prefix.
/// Unmatched input is returned as-is so the log reports it.
fn resolve_id(workouts: &[Workout], raw: &str) -> anyhow::Result<WorkoutId> {
  if let Some(w) = workouts.iter().find(|w| w.id().as_str() == raw) {
    return Ok(w.id().clone());
  }

  let mut matches = workouts.iter().filter(|w| w.id().as_str().starts_with(raw));
  match (matches.next(), matches.next()) {
    (Some(w), None) => Ok(w.id().clone()),
    (Some(_), Some(_)) => bail!("{raw:?} matches more than one workout"),
    (None, _) => Ok(WorkoutId::from(raw)),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
