use crate::SuspendingResource;

use std::fmt;

/// Describes the reason an entry was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvictionReason {
  /// The entry outlived the cache's time-to-live and was swept.
  Expired,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Expired => write!(f, "evicted due to expiration (TTL)"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when entries are evicted.
///
/// `on_evict` runs on the thread performing the sweep, after the shard locks
/// have been released. The resource handed over is the evicted one; it stays
/// valid, and its computation is not cancelled.
pub trait EvictionListener<K, T, E>: Send + Sync {
  fn on_evict(&self, key: K, resource: SuspendingResource<T, E>, reason: EvictionReason);
}

impl<K, T, E, F> EvictionListener<K, T, E> for F
where
  F: Fn(K, SuspendingResource<T, E>, EvictionReason) + Send + Sync,
{
  fn on_evict(&self, key: K, resource: SuspendingResource<T, E>, reason: EvictionReason) {
    self(key, resource, reason)
  }
}
