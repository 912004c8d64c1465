use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};

/// The source of "now" for entry ages.
pub trait Clock: Send + Sync + 'static {
  fn now(&self) -> Instant;
}

/// The wall clock, via `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// A clock that only moves when told to.
///
/// Useful for hosts that own time themselves, and for deterministic tests
/// of expiry together with [`ResourceCache::sweep`](crate::ResourceCache::sweep).
pub struct ManualClock {
  origin: Instant,
  elapsed: Mutex<Duration>,
}

impl ManualClock {
  /// Creates a clock frozen at the current instant.
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
      elapsed: Mutex::new(Duration::ZERO),
    }
  }

  /// Moves the clock forward by `by`.
  pub fn advance(&self, by: Duration) {
    *self.elapsed.lock() += by;
  }

  /// Moves the clock to `elapsed` past its origin. The clock never runs
  /// backwards; earlier targets are ignored.
  pub fn set_elapsed(&self, elapsed: Duration) {
    let mut current = self.elapsed.lock();
    if elapsed > *current {
      *current = elapsed;
    }
  }

  /// Time elapsed since the clock was created.
  pub fn elapsed(&self) -> Duration {
    *self.elapsed.lock()
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Instant {
    self.origin + *self.elapsed.lock()
  }
}

impl fmt::Debug for ManualClock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManualClock")
      .field("elapsed", &self.elapsed())
      .finish()
  }
}
