//! Looks pokemon up through a resource cache, rendering each lookup with a
//! suspense host the way a UI would: show a fallback while suspended, the
//! data once ready, and an error view on failure.
//!
//! Run with `RUST_LOG=debug cargo run --example pokemon` to see the cache at work.

use std::fmt;
use std::time::Duration;

use suspense_cache::config::CacheConfig;
use suspense_cache::{Interrupt, RenderError, ResourceCacheBuilder, Suspense};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
time_to_live: 2s
sweep_interval: 500ms
"#;

#[derive(Debug, Clone)]
struct Pokemon {
  name: String,
  number: u32,
  image: String,
}

#[derive(Debug)]
struct NotFound(String);

impl fmt::Display for NotFound {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unsupported pokemon: {:?}", self.0)
  }
}

impl std::error::Error for NotFound {}

/// Stands in for the remote API: a little latency, a little data.
async fn fetch_pokemon(name: String) -> Result<Pokemon, NotFound> {
  tracing::info!(%name, "fetching");
  sleep(Duration::from_millis(300)).await;
  let number = match name.as_str() {
    "pikachu" => 25,
    "charizard" => 6,
    "mew" => 151,
    _ => return Err(NotFound(name)),
  };
  Ok(Pokemon {
    image: format!("/img/pokemon/{}.jpg", name),
    name,
    number,
  })
}

async fn show(cache: &suspense_cache::ResourceCache<String, Pokemon, NotFound>, name: &str) {
  let resource = cache.get(name);
  if resource.is_pending() {
    println!("[{}] loading...", name);
  }

  let rendered = Suspense::new()
    .render(|| -> Result<String, Interrupt<NotFound>> {
      let pokemon = resource.try_read()?;
      Ok(format!(
        "#{:03} {} ({})",
        pokemon.number, pokemon.name, pokemon.image
      ))
    })
    .await;

  match rendered {
    Ok(view) => println!("[{}] {}", name, view.output),
    Err(RenderError::Failed(err)) => println!("[{}] there was an error: {}", name, err),
    Err(err) => println!("[{}] gave up: {}", name, err),
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config: CacheConfig = serde_yaml::from_str(CONFIG)?;
  let cache = ResourceCacheBuilder::new()
    .with_config(&config)
    .async_loader(fetch_pokemon)
    .build()?;

  // The second lookup joins the first one's fetch.
  tokio::join!(show(&cache, "Pikachu"), show(&cache, "pikachu"));

  // Cached: no fetch, renders in one pass.
  show(&cache, "PIKACHU").await;

  // Failures are served from the cache too, until they expire.
  show(&cache, "missingmon").await;
  show(&cache, "missingmon").await;

  sleep(config.time_to_live.unwrap_or_default() + config.sweep_interval * 2).await;

  // Expired: fetched again.
  show(&cache, "pikachu").await;

  println!("{:#?}", cache.metrics());
  Ok(())
}
