//! Suspending resources and a deduplicating, time-bounded cache for them.
//!
//! A [`SuspendingResource`] wraps one asynchronous computation, started the
//! moment the resource is created, and exposes a non-blocking
//! [`read`](SuspendingResource::read): the value once fulfilled, the error
//! once rejected, or a [`Suspension`] telling the caller to retry after the
//! computation settles. Hosts that render units of work cooperatively can
//! drive such reads with [`Suspense`].
//!
//! A [`ResourceCache`] hands out at most one resource per normalized key and
//! forgets entries older than its time-to-live in a periodic background
//! sweep.
//!
//! # Features
//! - **Deduplication**: concurrent lookups of one key share one computation.
//! - **Sync & Async**: resources can be driven by a blocking thread or any
//!   async runtime through [`TaskSpawner`], and waited on either way.
//! - **Age-based expiry**: entries expire by age since creation; reads never
//!   refresh them.
//! - **Observability**: exposes metrics and eviction notifications.
//! - **Configuration**: optional `serde` feature for loading [`config::CacheConfig`].

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod resource;
pub mod runtime;
pub mod suspense;
pub mod time;

// Internal, crate-only modules
mod entry;
mod key;
mod loader;
mod shared;
mod signal;
mod store;
mod task;

#[cfg(feature = "serde")]
pub mod config;

// Re-export the primary user-facing types for convenience
pub use builder::ResourceCacheBuilder;
pub use error::{BuildError, Interrupt, RenderError, ResourceError};
pub use handles::ResourceCache;
pub use key::NormalizedKey;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use resource::{Read, SuspendingResource};
pub use runtime::TaskSpawner;
#[cfg(feature = "tokio")]
pub use runtime::TokioSpawner;
pub use signal::Suspension;
pub use suspense::{Rendered, Suspense};
pub use time::{Clock, ManualClock, SystemClock};
