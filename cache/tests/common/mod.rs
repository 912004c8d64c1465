#![allow(dead_code)]

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use suspense_cache::{ManualClock, ResourceCache, ResourceCacheBuilder, TaskSpawner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
  pub name: String,
  pub image: String,
}

impl Pokemon {
  pub fn named(name: &str) -> Self {
    Self {
      name: name.to_string(),
      image: format!("/img/pokemon/{}.jpg", name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  NotFound(String),
}

impl fmt::Display for FetchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FetchError::NotFound(name) => write!(f, "no pokemon named {:?}", name),
    }
  }
}

impl std::error::Error for FetchError {}

/// An in-process stand-in for the remote data source. Knows a handful of
/// names and counts every fetch.
#[derive(Debug, Default)]
pub struct FakePokeApi {
  calls: AtomicUsize,
}

const KNOWN: &[&str] = &["pikachu", "bulbasaur", "charmander", "squirtle", "mew"];

impl FakePokeApi {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn fetch_now(&self, name: &str) -> Result<Pokemon, FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if KNOWN.contains(&name) {
      Ok(Pokemon::named(name))
    } else {
      Err(FetchError::NotFound(name.to_string()))
    }
  }

  /// Fetches after yielding once, so a fresh resource is always observed pending.
  pub async fn fetch(self: Arc<Self>, name: String) -> Result<Pokemon, FetchError> {
    tokio::task::yield_now().await;
    self.fetch_now(&name)
  }
}

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A spawner that parks spawned computations until the test runs them.
#[derive(Default)]
pub struct ManualSpawner {
  tasks: Mutex<Vec<Task>>,
}

impl ManualSpawner {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn queued(&self) -> usize {
    self.tasks.lock().len()
  }

  /// Runs every queued computation to completion, in spawn order.
  pub fn run_all(&self) -> usize {
    let tasks = std::mem::take(&mut *self.tasks.lock());
    let count = tasks.len();
    for task in tasks {
      futures_executor::block_on(task);
    }
    count
  }
}

impl TaskSpawner for ManualSpawner {
  fn spawn(&self, future: Task) {
    self.tasks.lock().push(future);
  }
}

pub type PokemonCache = ResourceCache<String, Pokemon, FetchError>;

/// A cache on a manual clock and manual spawner, with sweeps run by hand.
pub fn manual_cache(
  ttl: Duration,
) -> (PokemonCache, Arc<ManualClock>, Arc<ManualSpawner>, Arc<FakePokeApi>) {
  let clock = Arc::new(ManualClock::new());
  let spawner = ManualSpawner::new();
  let api = FakePokeApi::new();

  let cache = ResourceCacheBuilder::new()
    .shards(4)
    .time_to_live(ttl)
    .manual_sweep()
    .clock(clock.clone())
    .spawner(spawner.clone())
    .async_loader({
      let api = api.clone();
      move |name: String| {
        let api = api.clone();
        async move { api.fetch_now(&name) }
      }
    })
    .build()
    .unwrap();

  (cache, clock, spawner, api)
}
