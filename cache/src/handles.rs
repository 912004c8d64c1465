use crate::key::NormalizedKey;
use crate::shared::CacheShared;
use crate::{MetricsSnapshot, SuspendingResource};

use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

/// A deduplicating, time-bounded cache of [`SuspendingResource`]s.
///
/// At most one resource exists per normalized key. A miss creates the
/// resource through the configured factory, which starts its computation;
/// a hit returns the very same resource. Entries are removed only by the
/// sweep, once older than the time-to-live. Reading an entry never
/// refreshes its age.
///
/// Cloning the cache is cheap and every clone shares the same entries.
/// The background sweep stops when the last clone is dropped.
pub struct ResourceCache<K, T, E, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, T, E, H>>,
}

impl<K, T, E, H> Clone for ResourceCache<K, T, E, H> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, T, E, H> fmt::Debug for ResourceCache<K, T, E, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResourceCache")
      .field("shared", &self.shared)
      .finish()
  }
}

impl<K, T, E, H> ResourceCache<K, T, E, H>
where
  K: NormalizedKey,
  H: BuildHasher + Clone,
{
  /// Returns the resource for `key`, creating it if the cache has none.
  ///
  /// The key is normalized first, so `get("Pikachu")` and `get("pikachu ")`
  /// return the same resource for `String` keys.
  pub fn get<Q>(&self, key: &Q) -> SuspendingResource<T, E>
  where
    Q: ToOwned<Owned = K> + ?Sized,
  {
    self.shared.get_or_create(key.to_owned().normalize())
  }

  /// Returns `true` if an entry for `key` is currently held.
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    Q: ToOwned<Owned = K> + ?Sized,
  {
    self.shared.contains_normalized(&key.to_owned().normalize())
  }

  /// Runs one sweep pass now and returns the number of entries evicted.
  ///
  /// This is the same pass the background sweep runs. Without a TTL nothing
  /// ever expires and this returns `0`.
  pub fn sweep(&self) -> usize {
    match &self.shared.sweeper {
      Some(sweeper) => sweeper.sweep(),
      None => 0,
    }
  }

  /// The number of entries currently held.
  pub fn len(&self) -> usize {
    self.shared.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn num_shards(&self) -> usize {
    self.shared.store.num_shards()
  }
}

impl<K, T, E, H> ResourceCache<K, T, E, H> {
  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  pub fn time_to_live(&self) -> Option<Duration> {
    self.shared.time_to_live
  }

  pub fn sweep_interval(&self) -> Duration {
    self.shared.sweep_interval
  }

  /// Returns `true` while the background sweep thread is running.
  pub fn is_sweeping(&self) -> bool {
    self
      .shared
      .janitor
      .as_ref()
      .is_some_and(|janitor| janitor.is_running())
  }
}
