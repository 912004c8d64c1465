use crate::entry::CacheEntry;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

pub(crate) type ShardMap<K, T, E, H> = HashMap<K, CacheEntry<T, E>, H>;

/// A helper function to hash a key using a `BuildHasher`.
#[inline]
pub(crate) fn hash_key<K: Hash, H: BuildHasher>(hasher: &H, key: &K) -> u64 {
  hasher.hash_one(key)
}

/// The cache's entry map, partitioned into independently locked shards.
///
/// A lookup and the insert that follows a miss happen under the same shard
/// lock, which is what keeps at most one resource per key.
pub(crate) struct ShardedStore<K, T, E, H> {
  shards: Box<[CachePadded<Mutex<ShardMap<K, T, E, H>>>]>,
  hasher: H,
}

impl<K, T, E, H> fmt::Debug for ShardedStore<K, T, E, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShardedStore")
      .field("num_shards", &self.shards.len())
      .finish()
  }
}

impl<K, T, E, H> ShardedStore<K, T, E, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Creates a new `ShardedStore` with the specified number of shards and hasher.
  pub(crate) fn new(num_shards: usize, hasher: H) -> Self {
    let shards = (0..num_shards)
      .map(|_| CachePadded::new(Mutex::new(HashMap::with_hasher(hasher.clone()))))
      .collect::<Vec<_>>();

    Self {
      shards: shards.into_boxed_slice(),
      hasher,
    }
  }

  /// Returns the lock guarding the shard that owns `key`.
  #[inline]
  pub(crate) fn get_shard(&self, key: &K) -> &Mutex<ShardMap<K, T, E, H>> {
    // The builder guarantees at least one shard.
    let index = hash_key(&self.hasher, key) as usize % self.shards.len();
    &self.shards[index]
  }

  /// Returns an iterator over all the shard locks.
  pub(crate) fn iter_shards(&self) -> impl Iterator<Item = &Mutex<ShardMap<K, T, E, H>>> {
    self.shards.iter().map(|padded| &**padded)
  }

  pub(crate) fn num_shards(&self) -> usize {
    self.shards.len()
  }

  /// Counts entries across all shards, locking one shard at a time.
  pub(crate) fn len(&self) -> usize {
    self.iter_shards().map(|shard| shard.lock().len()).sum()
  }
}
