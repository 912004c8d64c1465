use crate::error::BuildError;
use crate::handles::ResourceCache;
use crate::key::NormalizedKey;
use crate::loader::Loader;
use crate::metrics::Metrics;
use crate::shared::CacheShared;
use crate::store::ShardedStore;
use crate::task::janitor::{Janitor, JanitorContext};
use crate::time::{Clock, SystemClock};
use crate::{EvictionListener, SuspendingResource, TaskSpawner};

use core::fmt;
use std::future::Future;
use std::hash::BuildHasher;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// The sweep interval used when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// A builder for creating [`ResourceCache`] instances.
///
/// ```no_run
/// use std::time::Duration;
/// use suspense_cache::ResourceCacheBuilder;
///
/// # async fn fetch(name: String) -> Result<String, std::io::Error> { Ok(name) }
/// # #[tokio::main] async fn main() {
/// let cache = ResourceCacheBuilder::<String, String, std::io::Error>::new()
///   .time_to_live(Duration::from_secs(5))
///   .async_loader(fetch)
///   .build()
///   .unwrap();
///
/// let resource = cache.get("Pikachu");
/// # }
/// ```
pub struct ResourceCacheBuilder<K, T, E, H = ahash::RandomState> {
  pub(crate) shards: usize,
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) sweep_interval: Duration,
  pub(crate) hasher: H,
  clock: Option<Arc<dyn Clock>>,
  listener: Option<Arc<dyn EvictionListener<K, T, E>>>,
  loader: Option<Loader<K, T, E>>,
  spawner: Option<Arc<dyn TaskSpawner>>,
  background_sweep: bool,
  _marker: PhantomData<fn() -> (K, T, E)>,
}

impl<K, T, E, H> fmt::Debug for ResourceCacheBuilder<K, T, E, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResourceCacheBuilder")
      .field("shards", &self.shards)
      .field("time_to_live", &self.time_to_live)
      .field("sweep_interval", &self.sweep_interval)
      .field("has_loader", &self.loader.is_some())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, T, E, H> ResourceCacheBuilder<K, T, E, H> {
  /// Sets the number of independently locked shards.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = shards;
    self
  }

  /// Sets the time-to-live, measured from the moment an entry is created.
  ///
  /// Without a TTL the cache never expires entries and no background sweep
  /// is started.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = Some(duration);
    self
  }

  /// Sets how often the background sweep looks for expired entries.
  ///
  /// Defaults to [`DEFAULT_SWEEP_INTERVAL`].
  pub fn sweep_interval(mut self, interval: Duration) -> Self {
    self.sweep_interval = interval;
    self
  }

  /// Disables the background sweep thread. Expired entries are then only
  /// removed by explicit [`ResourceCache::sweep`] calls, for hosts that
  /// drive their own timers.
  pub fn manual_sweep(mut self) -> Self {
    self.background_sweep = false;
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, T, E> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets the clock entry ages are measured against.
  #[doc(hidden)]
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  /// Sets the spawner used to drive `async_loader` computations.
  pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
    self.spawner = Some(spawner);
    self
  }

  /// Sets the function that creates a resource on a cache miss.
  ///
  /// The factory is called with the normalized key while that key's shard
  /// is locked, so it must not call back into the same cache.
  pub fn factory<F>(mut self, f: F) -> Self
  where
    F: Fn(&K) -> SuspendingResource<T, E> + Send + Sync + 'static,
  {
    self.loader = Some(Loader::Factory(Arc::new(f)));
    self
  }

  /// Sets a blocking fetch; each miss runs it on a dedicated thread.
  pub fn loader<F>(mut self, f: F) -> Self
  where
    F: Fn(K) -> Result<T, E> + Send + Sync + 'static,
  {
    self.loader = Some(Loader::Sync(Arc::new(f)));
    self
  }

  /// Sets an async fetch; each miss spawns it on the configured spawner,
  /// or on the current Tokio runtime when none is set.
  pub fn async_loader<F, Fut>(mut self, f: F) -> Self
  where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let load_fn =
      move |key| Box::pin(f(key)) as Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;
    self.loader = Some(Loader::Async(Arc::new(load_fn)));
    self
  }

  /// Applies the tunables from a [`CacheConfig`](crate::config::CacheConfig).
  #[cfg(feature = "serde")]
  pub fn with_config(mut self, config: &crate::config::CacheConfig) -> Self {
    self.time_to_live = config.time_to_live;
    self.sweep_interval = config.sweep_interval;
    if let Some(shards) = config.shards {
      self.shards = shards;
    }
    self
  }
}

// --- Default Constructor ---
impl<K, T, E, H: BuildHasher + Default> ResourceCacheBuilder<K, T, E, H> {
  /// Creates a new builder with default settings.
  pub fn new() -> Self {
    Self {
      shards: (num_cpus::get() * 4).max(1).next_power_of_two(),
      time_to_live: None,
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
      hasher: H::default(),
      clock: None,
      listener: None,
      loader: None,
      spawner: None,
      background_sweep: true,
      _marker: PhantomData,
    }
  }
}

impl<K, T, E> Default for ResourceCacheBuilder<K, T, E, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, T, E, H> ResourceCacheBuilder<K, T, E, H>
where
  K: NormalizedKey,
  T: Send + Sync + 'static,
  E: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Sets the hasher used to pick a key's shard.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Builds the cache and, if a TTL is set, starts its background sweep.
  pub fn build(mut self) -> Result<ResourceCache<K, T, E, H>, BuildError> {
    self.validate()?;

    let loader = self.loader.take().ok_or(BuildError::FactoryRequired)?;
    let mut spawner = self.spawner.take();
    if loader.requires_spawner() && spawner.is_none() {
      #[cfg(feature = "tokio")]
      {
        spawner = crate::runtime::TokioSpawner::try_current()
          .map(|s| Arc::new(s) as Arc<dyn TaskSpawner>);
      }
    }
    let factory = loader.into_factory(spawner)?;

    let clock = self.clock.take().unwrap_or_else(|| Arc::new(SystemClock));
    let store = Arc::new(ShardedStore::new(self.shards, self.hasher.clone()));
    let metrics = Arc::new(Metrics::new());

    let sweeper = self.time_to_live.map(|time_to_live| {
      Arc::new(JanitorContext {
        store: Arc::clone(&store),
        metrics: Arc::clone(&metrics),
        clock: Arc::clone(&clock),
        time_to_live,
        listener: self.listener.take(),
      })
    });

    let janitor = match &sweeper {
      Some(context) if self.background_sweep => {
        match Janitor::spawn(Arc::clone(context), self.sweep_interval) {
          Ok(janitor) => Some(janitor),
          Err(err) => {
            // Entries can still be swept by hand; only the timer is lost.
            tracing::error!(error = %err, "failed to start the background sweep");
            None
          }
        }
      }
      _ => None,
    };

    tracing::debug!(
      time_to_live = ?self.time_to_live,
      sweep_interval = ?self.sweep_interval,
      shards = self.shards,
      "resource cache built"
    );

    Ok(ResourceCache {
      shared: Arc::new(CacheShared {
        store,
        metrics,
        clock,
        factory,
        time_to_live: self.time_to_live,
        sweep_interval: self.sweep_interval,
        sweeper,
        janitor,
      }),
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    if self.sweep_interval.is_zero() {
      return Err(BuildError::ZeroSweepInterval);
    }
    Ok(())
  }
}
