use crate::key::NormalizedKey;
use crate::loader::Factory;
use crate::metrics::Metrics;
use crate::store::ShardedStore;
use crate::task::janitor::{Janitor, JanitorContext};
use crate::time::Clock;
use crate::SuspendingResource;

use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<K, T, E, H> {
  pub(crate) store: Arc<ShardedStore<K, T, E, H>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) factory: Factory<K, T, E>,
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) sweep_interval: Duration,
  /// Present whenever a TTL is configured; shared with the janitor thread.
  pub(crate) sweeper: Option<Arc<JanitorContext<K, T, E, H>>>,
  pub(crate) janitor: Option<Janitor>,
}

impl<K, T, E, H> fmt::Debug for CacheShared<K, T, E, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("time_to_live", &self.time_to_live)
      .field("sweep_interval", &self.sweep_interval)
      .field("sweeper_running", &self.janitor.is_some())
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<K, T, E, H> Drop for CacheShared<K, T, E, H> {
  fn drop(&mut self) {
    if let Some(janitor) = self.janitor.take() {
      janitor.stop();
    }
  }
}

impl<K, T, E, H> CacheShared<K, T, E, H>
where
  K: NormalizedKey,
  H: BuildHasher + Clone,
{
  /// Returns the resource for an already normalized key, creating it on a miss.
  pub(crate) fn get_or_create(&self, key: K) -> SuspendingResource<T, E> {
    let shard = self.store.get_shard(&key);
    let mut guard = shard.lock();

    if let Some(entry) = guard.get(&key) {
      self.metrics.hits.fetch_add(1, Ordering::Relaxed);
      tracing::trace!("resource cache hit");
      return entry.resource();
    }

    // The factory runs under the shard lock so that the miss check and the
    // insert are one step.
    self.metrics.misses.fetch_add(1, Ordering::Relaxed);
    let resource = (self.factory)(&key);
    guard.insert(
      key,
      crate::entry::CacheEntry::new(resource.clone(), self.clock.now()),
    );
    // Counted while the shard is still locked, so a sweep can never
    // subtract this entry before it was added.
    self
      .metrics
      .resources_created
      .fetch_add(1, Ordering::Relaxed);
    self
      .metrics
      .current_entries
      .fetch_add(1, Ordering::Relaxed);
    drop(guard);

    tracing::debug!("resource cache miss; created a new resource");
    resource
  }

  pub(crate) fn contains_normalized(&self, key: &K) -> bool {
    self.store.get_shard(key).lock().contains_key(key)
  }
}
