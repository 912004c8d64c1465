use crate::signal::Suspension;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
  /// The cache was configured with zero shards, which is not allowed.
  #[error("shard count cannot be zero")]
  ZeroShards,
  /// The background sweep was configured with a zero interval.
  #[error("sweep interval cannot be zero")]
  ZeroSweepInterval,
  /// Neither a `factory`, a `loader` nor an `async_loader` was configured.
  #[error("a resource factory or loader must be configured")]
  FactoryRequired,
  /// An `async_loader` was provided, but no `TaskSpawner` was configured
  /// and no Tokio runtime is available to fall back on.
  #[error("an async loader requires a task spawner or a running tokio runtime")]
  SpawnerRequired,
}

/// The terminal failure of a [`SuspendingResource`](crate::SuspendingResource).
///
/// The error is shared through an `Arc`, so every read of a rejected
/// resource hands back the very same error instance.
pub enum ResourceError<E> {
  /// The underlying computation failed with `E`.
  Fetch(Arc<E>),
  /// The underlying computation panicked, or its executor dropped it before
  /// it could settle. This is a defect in the computation or its host, not
  /// a fetch failure.
  Abandoned,
}

impl<E> ResourceError<E> {
  /// Returns the fetch error, if this is a fetch failure.
  pub fn fetch_error(&self) -> Option<&Arc<E>> {
    match self {
      ResourceError::Fetch(err) => Some(err),
      ResourceError::Abandoned => None,
    }
  }

  /// Returns `true` if the computation never settled on its own.
  pub fn is_abandoned(&self) -> bool {
    matches!(self, ResourceError::Abandoned)
  }
}

impl<E> Clone for ResourceError<E> {
  fn clone(&self) -> Self {
    match self {
      ResourceError::Fetch(err) => ResourceError::Fetch(err.clone()),
      ResourceError::Abandoned => ResourceError::Abandoned,
    }
  }
}

impl<E: fmt::Debug> fmt::Debug for ResourceError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResourceError::Fetch(err) => f.debug_tuple("Fetch").field(err).finish(),
      ResourceError::Abandoned => f.write_str("Abandoned"),
    }
  }
}

impl<E: fmt::Display> fmt::Display for ResourceError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResourceError::Fetch(err) => write!(f, "resource failed: {}", err),
      ResourceError::Abandoned => write!(f, "resource computation was abandoned before settling"),
    }
  }
}

impl<E: Error + 'static> Error for ResourceError<E> {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      ResourceError::Fetch(err) => Some(&**err),
      ResourceError::Abandoned => None,
    }
  }
}

/// Why a read did not produce a value.
///
/// This is the `Err` side of [`SuspendingResource::try_read`](crate::SuspendingResource::try_read),
/// which lets a unit of work chain several reads with `?` and hand the first
/// interruption back to its host.
pub enum Interrupt<E> {
  /// The resource is still pending. Retry once the suspension completes.
  Suspend(Suspension),
  /// The resource was rejected.
  Fail(ResourceError<E>),
}

impl<E> Interrupt<E> {
  /// Returns `true` if this is a suspension rather than a failure.
  pub fn is_suspend(&self) -> bool {
    matches!(self, Interrupt::Suspend(_))
  }
}

impl<E> From<ResourceError<E>> for Interrupt<E> {
  fn from(err: ResourceError<E>) -> Self {
    Interrupt::Fail(err)
  }
}

impl<E: fmt::Debug> fmt::Debug for Interrupt<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Interrupt::Suspend(suspension) => f.debug_tuple("Suspend").field(suspension).finish(),
      Interrupt::Fail(err) => f.debug_tuple("Fail").field(err).finish(),
    }
  }
}

/// Errors returned by [`Suspense`](crate::Suspense) when driving a unit of work.
pub enum RenderError<E> {
  /// A resource read by the unit of work was rejected.
  Failed(ResourceError<E>),
  /// The unit of work was still suspending after the configured number of passes.
  TooManyPasses(usize),
}

impl<E> RenderError<E> {
  /// Returns the resource error, if the render failed because of one.
  pub fn resource_error(&self) -> Option<&ResourceError<E>> {
    match self {
      RenderError::Failed(err) => Some(err),
      RenderError::TooManyPasses(_) => None,
    }
  }
}

impl<E: fmt::Debug> fmt::Debug for RenderError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RenderError::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
      RenderError::TooManyPasses(passes) => f.debug_tuple("TooManyPasses").field(passes).finish(),
    }
  }
}

impl<E: fmt::Display> fmt::Display for RenderError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RenderError::Failed(err) => write!(f, "render failed: {}", err),
      RenderError::TooManyPasses(passes) => {
        write!(f, "unit of work still suspended after {} passes", passes)
      }
    }
  }
}

impl<E: Error + 'static> Error for RenderError<E> {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      RenderError::Failed(err) => Some(err),
      RenderError::TooManyPasses(_) => None,
    }
  }
}
