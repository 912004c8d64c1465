use crate::SuspendingResource;

use std::time::{Duration, Instant};

/// A resource together with the moment it was cached.
pub(crate) struct CacheEntry<T, E> {
  resource: SuspendingResource<T, E>,
  /// Set once at insertion. Reads never refresh it.
  created_at: Instant,
}

impl<T, E> CacheEntry<T, E> {
  pub(crate) fn new(resource: SuspendingResource<T, E>, created_at: Instant) -> Self {
    Self {
      resource,
      created_at,
    }
  }

  /// Returns a new handle to the cached resource.
  #[inline]
  pub(crate) fn resource(&self) -> SuspendingResource<T, E> {
    self.resource.clone()
  }

  #[inline]
  pub(crate) fn age(&self, now: Instant) -> Duration {
    now.saturating_duration_since(self.created_at)
  }

  /// An entry is expired once its age is strictly greater than the TTL.
  #[inline]
  pub(crate) fn is_expired(&self, now: Instant, time_to_live: Duration) -> bool {
    self.age(now) > time_to_live
  }
}
