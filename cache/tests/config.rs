#![cfg(feature = "serde")]

use std::time::Duration;

use pretty_assertions::assert_eq;
use suspense_cache::config::CacheConfig;
use suspense_cache::ResourceCacheBuilder;

#[test]
fn test_config_parses_human_readable_durations() {
  let yaml = "time_to_live: 5s\nsweep_interval: 250ms\nshards: 8\n";
  let config: CacheConfig = serde_yaml::from_str(yaml).unwrap();

  assert_eq!(
    config,
    CacheConfig {
      time_to_live: Some(Duration::from_secs(5)),
      sweep_interval: Duration::from_millis(250),
      shards: Some(8),
    }
  );
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
  let config: CacheConfig = serde_yaml::from_str("shards: 2\n").unwrap();
  assert_eq!(config.time_to_live, None);
  assert_eq!(config.sweep_interval, Duration::from_secs(1));
  assert_eq!(config.shards, Some(2));
}

#[test]
fn test_builder_applies_config() {
  let config: CacheConfig =
    serde_yaml::from_str("time_to_live: 100ms\nsweep_interval: 50ms\nshards: 3\n").unwrap();

  let cache = ResourceCacheBuilder::<String, u32, std::io::Error>::new()
    .with_config(&config)
    .loader(|key: String| Ok(key.len() as u32))
    .build()
    .unwrap();

  assert_eq!(cache.time_to_live(), Some(Duration::from_millis(100)));
  assert_eq!(cache.sweep_interval(), Duration::from_millis(50));
  assert_eq!(cache.num_shards(), 3);
  assert!(cache.is_sweeping());
}
