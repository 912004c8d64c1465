use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use std::time::Duration;

use suspense_cache::{ResourceCacheBuilder, SuspendingResource};

mod common;
use common::{manual_cache, FakePokeApi, FetchError, Pokemon};

const TTL: Duration = Duration::from_secs(60);

#[test]
fn test_get_twice_returns_the_same_resource() {
  let (cache, _clock, spawner, _api) = manual_cache(TTL);

  let first = cache.get("pikachu");
  let second = cache.get("pikachu");

  assert!(first.ptr_eq(&second));
  assert_eq!(spawner.queued(), 1, "factory must run exactly once");

  let metrics = cache.metrics();
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.resources_created, 1);
  assert_eq!(metrics.current_entries, 1);
}

#[test]
fn test_distinct_keys_get_distinct_resources() {
  let (cache, _clock, spawner, _api) = manual_cache(TTL);

  let pikachu = cache.get("pikachu");
  let mew = cache.get("mew");

  assert!(!pikachu.ptr_eq(&mew));
  assert_eq!(spawner.queued(), 2);
  assert_eq!(cache.len(), 2);
}

#[test]
fn test_keys_are_normalized() {
  let (cache, _clock, spawner, api) = manual_cache(TTL);

  let upper = cache.get("Pikachu");
  let lower = cache.get("pikachu");
  let padded = cache.get("  PIKACHU ");

  assert!(upper.ptr_eq(&lower));
  assert!(upper.ptr_eq(&padded));
  assert!(cache.contains_key("pIkAcHu"));
  assert_eq!(cache.len(), 1);

  spawner.run_all();
  assert_eq!(api.calls(), 1);
  // The factory saw the normalized key.
  assert_eq!(upper.wait().unwrap().name, "pikachu");
}

#[test]
fn test_get_on_a_settled_resource_does_not_refetch() {
  let (cache, _clock, spawner, api) = manual_cache(TTL);

  let resource = cache.get("bulbasaur");
  spawner.run_all();
  assert!(resource.is_fulfilled());

  let again = cache.get("bulbasaur");
  assert!(again.ptr_eq(&resource));
  assert_eq!(spawner.queued(), 0);
  assert_eq!(api.calls(), 1);
}

#[test]
fn test_failed_resource_is_not_retried_by_get() {
  let (cache, _clock, spawner, api) = manual_cache(TTL);

  let resource = cache.get("missingmon");
  spawner.run_all();
  assert!(resource.is_rejected());

  let again = cache.get("missingmon");
  assert!(again.ptr_eq(&resource));
  assert!(again.is_rejected());
  assert_eq!(api.calls(), 1);
}

#[test]
fn test_concurrent_gets_share_one_resource() {
  let num_threads = 16;
  let created = Arc::new(AtomicUsize::new(0));
  let api = FakePokeApi::new();

  let cache = Arc::new(
    ResourceCacheBuilder::<String, Pokemon, FetchError>::new()
      .shards(2)
      .factory({
        let created = created.clone();
        let api = api.clone();
        move |name: &String| {
          created.fetch_add(1, Ordering::SeqCst);
          let api = api.clone();
          let name = name.clone();
          SuspendingResource::spawn_blocking(move || api.fetch_now(&name))
        }
      })
      .build()
      .unwrap(),
  );

  let barrier = Arc::new(Barrier::new(num_threads));
  let handles: Vec<_> = (0..num_threads)
    .map(|i| {
      let cache = cache.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        let key = if i % 2 == 0 { "Charmander" } else { "charmander" };
        cache.get(key)
      })
    })
    .collect();

  let resources: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
  for resource in &resources[1..] {
    assert!(resource.ptr_eq(&resources[0]));
  }
  assert_eq!(created.load(Ordering::SeqCst), 1);

  let pokemon = resources[0].wait().unwrap();
  assert_eq!(pokemon.name, "charmander");
  assert_eq!(api.calls(), 1);
  assert_eq!(cache.metrics().hits, (num_threads - 1) as u64);
}

#[test]
fn test_integer_keys_are_used_as_is() {
  let cache = ResourceCacheBuilder::<u32, u32, FetchError>::new()
    .loader(|id: u32| Ok(id * 10))
    .build()
    .unwrap();

  let first = cache.get(&25_u32);
  assert!(first.ptr_eq(&cache.get(&25_u32)));
  assert!(!first.ptr_eq(&cache.get(&26_u32)));
  assert_eq!(*first.wait().unwrap(), 250);
}

#[test]
fn test_cache_without_ttl_never_expires() {
  let cache = ResourceCacheBuilder::<String, Pokemon, FetchError>::new()
    .loader(|name: String| Ok(Pokemon::named(&name)))
    .build()
    .unwrap();

  assert_eq!(cache.time_to_live(), None);
  assert!(!cache.is_sweeping());

  let resource = cache.get("squirtle");
  assert_eq!(cache.sweep(), 0);
  assert!(cache.get("squirtle").ptr_eq(&resource));
}
