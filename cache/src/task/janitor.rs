use crate::entry::CacheEntry;
use crate::listener::{EvictionListener, EvictionReason};
use crate::metrics::Metrics;
use crate::resource::panic_message;
use crate::store::ShardedStore;
use crate::time::Clock;

use std::hash::{BuildHasher, Hash};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A context object holding the thread-safe parts of the cache that the
/// sweep needs to access.
pub(crate) struct JanitorContext<K, T, E, H> {
  pub(crate) store: Arc<ShardedStore<K, T, E, H>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) time_to_live: Duration,
  pub(crate) listener: Option<Arc<dyn EvictionListener<K, T, E>>>,
}

impl<K, T, E, H> JanitorContext<K, T, E, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher + Clone,
{
  /// Removes every entry older than the TTL and returns how many were removed.
  ///
  /// Evicted resources are only dropped from the map; anyone holding a
  /// handle keeps a valid resource and its computation keeps running.
  pub(crate) fn sweep(&self) -> usize {
    let now = self.clock.now();
    let mut evicted: Vec<(K, CacheEntry<T, E>)> = Vec::new();

    for shard in self.store.iter_shards() {
      let mut guard = shard.lock();
      if guard.is_empty() {
        continue;
      }

      let expired_keys: Vec<K> = guard
        .iter()
        .filter(|(_, entry)| entry.is_expired(now, self.time_to_live))
        .map(|(key, _)| key.clone())
        .collect();

      for key in expired_keys {
        if let Some(entry) = guard.remove(&key) {
          evicted.push((key, entry));
        }
      }
    }

    let count = evicted.len();
    self.metrics.sweeps.fetch_add(1, Ordering::Relaxed);
    if count > 0 {
      self
        .metrics
        .evicted_by_ttl
        .fetch_add(count as u64, Ordering::Relaxed);
      self
        .metrics
        .current_entries
        .fetch_sub(count as u64, Ordering::Relaxed);
      tracing::debug!(evicted = count, "sweep removed expired entries");
    }

    // Listeners run with no shard lock held.
    if let Some(listener) = &self.listener {
      for (key, entry) in evicted {
        // A panicking listener must not take the sweep down with it.
        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
          listener.on_evict(key, entry.resource(), EvictionReason::Expired)
        }));
        if let Err(payload) = notified {
          tracing::error!(
            panic = panic_message(payload.as_ref()),
            "eviction listener panicked"
          );
        }
      }
    }

    count
  }
}

/// The background thread that periodically sweeps expired entries.
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  stop_flag: Arc<AtomicBool>,
}

impl Janitor {
  /// Spawns a new janitor thread ticking every `tick_interval`.
  pub(crate) fn spawn<K, T, E, H>(
    context: Arc<JanitorContext<K, T, E, H>>,
    tick_interval: Duration,
  ) -> std::io::Result<Self>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
  {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_clone = stop_flag.clone();

    let handle = thread::Builder::new()
      .name("suspense-janitor".into())
      .spawn(move || {
        tracing::debug!(?tick_interval, "janitor started");
        // `None` means the interval is too large to schedule, so we only
        // wake up to stop.
        let mut next_tick = Instant::now().checked_add(tick_interval);

        loop {
          // `stop` unparks us, so a pending stop is seen without waiting
          // out the rest of the tick.
          let now = Instant::now();
          match next_tick {
            Some(tick) if now < tick => thread::park_timeout(tick - now),
            Some(_) => {}
            None => thread::park(),
          }
          if stop_clone.load(Ordering::Acquire) {
            break;
          }
          let Some(tick) = next_tick else {
            continue;
          };
          if Instant::now() < tick {
            continue;
          }

          context.sweep();
          // Don't try to catch up on ticks missed while sweeping or suspended.
          let now = Instant::now();
          next_tick = match tick.checked_add(tick_interval) {
            Some(next) if next >= now => Some(next),
            _ => now.checked_add(tick_interval),
          };
        }
        tracing::debug!("janitor stopped");
      })?;

    Ok(Self {
      handle: Some(handle),
      stop_flag,
    })
  }

  pub(crate) fn is_running(&self) -> bool {
    self
      .handle
      .as_ref()
      .is_some_and(|handle| !handle.is_finished())
  }

  /// Signals the janitor thread to stop and waits for it to exit.
  pub(crate) fn stop(mut self) {
    self.shutdown();
  }

  fn shutdown(&mut self) {
    let Some(handle) = self.handle.take() else {
      return;
    };
    self.stop_flag.store(true, Ordering::Release);
    handle.thread().unpark();

    // A listener may drop the last cache handle on the janitor thread
    // itself; joining there would deadlock.
    if handle.thread().id() != thread::current().id() {
      let _ = handle.join();
    }
  }
}

impl Drop for Janitor {
  fn drop(&mut self) {
    self.shutdown();
  }
}
