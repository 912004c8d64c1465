use crate::error::BuildError;
use crate::{SuspendingResource, TaskSpawner};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Creates the resource for a key on a cache miss.
pub(crate) type Factory<K, T, E> = Arc<dyn Fn(&K) -> SuspendingResource<T, E> + Send + Sync>;

pub(crate) type AsyncLoadFn<K, T, E> =
  Arc<dyn Fn(K) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync>;

/// How the cache turns a missing key into a resource.
///
/// Held by the `ResourceCacheBuilder` and resolved into a [`Factory`] when
/// the cache is built.
pub(crate) enum Loader<K, T, E> {
  /// A caller-supplied factory, used as is.
  Factory(Factory<K, T, E>),
  /// A blocking fetch, run on its own thread per resource.
  Sync(Arc<dyn Fn(K) -> Result<T, E> + Send + Sync>),
  /// An async fetch, driven by a `TaskSpawner`.
  Async(AsyncLoadFn<K, T, E>),
}

impl<K, T, E> Clone for Loader<K, T, E> {
  fn clone(&self) -> Self {
    match self {
      Loader::Factory(f) => Loader::Factory(f.clone()),
      Loader::Sync(f) => Loader::Sync(f.clone()),
      Loader::Async(f) => Loader::Async(f.clone()),
    }
  }
}

impl<K, T, E> Loader<K, T, E>
where
  K: Clone + Send + 'static,
  T: Send + Sync + 'static,
  E: Send + Sync + 'static,
{
  pub(crate) fn requires_spawner(&self) -> bool {
    matches!(self, Loader::Async(_))
  }

  /// Resolves the loader into a factory. Async loaders need a spawner.
  pub(crate) fn into_factory(
    self,
    spawner: Option<Arc<dyn TaskSpawner>>,
  ) -> Result<Factory<K, T, E>, BuildError> {
    match self {
      Loader::Factory(factory) => Ok(factory),
      Loader::Sync(fetch) => Ok(Arc::new(move |key: &K| {
        let fetch = fetch.clone();
        let key = key.clone();
        SuspendingResource::spawn_blocking(move || fetch(key))
      })),
      Loader::Async(fetch) => {
        let spawner = spawner.ok_or(BuildError::SpawnerRequired)?;
        Ok(Arc::new(move |key: &K| {
          SuspendingResource::spawn(fetch(key.clone()), spawner.as_ref())
        }))
      }
    }
  }
}
