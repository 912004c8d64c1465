use crate::builder::DEFAULT_SWEEP_INTERVAL;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The tunables of a [`ResourceCache`](crate::ResourceCache), in a form that
/// can be read from configuration files.
///
/// Durations are written in human-readable form:
///
/// ```yaml
/// time_to_live: 5s
/// sweep_interval: 1s
/// shards: 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Maximum entry age. Absent means entries never expire.
  #[serde(with = "humantime_serde")]
  pub time_to_live: Option<Duration>,
  /// How often expired entries are swept.
  #[serde(with = "humantime_serde")]
  pub sweep_interval: Duration,
  /// Number of shards. Absent means the builder's default.
  pub shards: Option<usize>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      time_to_live: None,
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
      shards: None,
    }
  }
}
