use chrono::Duration;
use std::env;
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "store.json";
pub const DATABASE_FILE: &str = "savr.db";
pub const UNDO_WINDOW_SECONDS: i64 = 5;

const CATALOG_URL_VAR: &str = "SAVR_CATALOG_URL";
const UNDO_WINDOW_VAR: &str = "SAVR_UNDO_WINDOW_SECS";
const TRACKING_MODE_VAR: &str = "SAVR_TRACKING_MODE";

/// Where the static product list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
  File(PathBuf),
  Url(String),
}

impl CatalogSource {
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
      CatalogSource::Url(trimmed.to_string())
    } else {
      CatalogSource::File(PathBuf::from(trimmed))
    }
  }
}

/// Which products make up the tracked view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
  /// Every catalog product is tracked.
  #[default]
  WholeCatalog,
  /// Only products the user picked are tracked.
  Explicit,
}

impl TrackingMode {
  fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_lowercase().as_str() {
      "catalog" | "whole_catalog" | "all" => Some(TrackingMode::WholeCatalog),
      "explicit" | "selected" => Some(TrackingMode::Explicit),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub catalog_source: CatalogSource,
  pub database_path: PathBuf,
  pub undo_window: Duration,
  pub tracking_mode: TrackingMode,
}

impl Config {
  /// Defaults rooted at `base_dir`: catalog and database files live side by side.
  pub fn new(base_dir: &Path) -> Self {
    Self {
      catalog_source: CatalogSource::File(base_dir.join(CATALOG_FILE)),
      database_path: base_dir.join(DATABASE_FILE),
      undo_window: Duration::seconds(UNDO_WINDOW_SECONDS),
      tracking_mode: TrackingMode::default(),
    }
  }

  /// Defaults overridden by `SAVR_*` environment variables. Malformed values
  /// are logged and ignored.
  pub fn from_env(base_dir: &Path) -> Self {
    let mut config = Self::new(base_dir);

    if let Ok(raw) = env::var(CATALOG_URL_VAR) {
      if !raw.trim().is_empty() {
        config.catalog_source = CatalogSource::parse(&raw);
      }
    }

    if let Ok(raw) = env::var(UNDO_WINDOW_VAR) {
      match raw.trim().parse::<i64>() {
        Ok(seconds) if seconds > 0 => config.undo_window = Duration::seconds(seconds),
        _ => log::warn!("ignoring {}={:?}, expected a positive number of seconds", UNDO_WINDOW_VAR, raw),
      }
    }

    if let Ok(raw) = env::var(TRACKING_MODE_VAR) {
      match TrackingMode::parse(&raw) {
        Some(mode) => config.tracking_mode = mode,
        None => log::warn!("ignoring {}={:?}, expected 'catalog' or 'explicit'", TRACKING_MODE_VAR, raw),
      }
    }

    config
  }
}
