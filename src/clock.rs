//! Time source for undo deadlines and load timestamps.
//!
//! Production code uses [`SystemClock`]; tests inject a [`ManualClock`] and
//! advance it instead of sleeping.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Mutex;

pub trait Clock: Send + Sync + fmt::Debug {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      current: Mutex::new(start),
    }
  }

  pub fn advance(&self, by: Duration) {
    let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *current += by;
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new(DateTime::<Utc>::UNIX_EPOCH)
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
