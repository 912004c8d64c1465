use crate::error::{Interrupt, ResourceError};
use crate::signal::{Signal, Suspension};
use crate::TaskSpawner;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use futures_util::FutureExt;
use parking_lot::Mutex;

/// The lifecycle of a resource. Transitions exactly once, out of `Pending`.
pub(crate) enum State<T, E> {
  Pending,
  Fulfilled(Arc<T>),
  Rejected(ResourceError<E>),
}

impl<T, E> State<T, E> {
  fn name(&self) -> &'static str {
    match self {
      State::Pending => "pending",
      State::Fulfilled(_) => "fulfilled",
      State::Rejected(_) => "rejected",
    }
  }
}

struct Inner<T, E> {
  state: Mutex<State<T, E>>,
  signal: Arc<Signal>,
}

impl<T, E> Inner<T, E> {
  /// Records the terminal state and wakes everyone suspended on it.
  /// A second settlement is an invariant violation and is ignored.
  fn settle(&self, terminal: State<T, E>) -> bool {
    {
      let mut state = self.state.lock();
      if !matches!(*state, State::Pending) {
        tracing::error!(
          current = state.name(),
          attempted = terminal.name(),
          "resource settled more than once; ignoring the later settlement"
        );
        return false;
      }
      tracing::debug!(state = terminal.name(), "resource settled");
      *state = terminal;
    }
    self.signal.fire();
    true
  }
}

/// The write half of a resource, owned by whatever drives its computation.
///
/// If the settler is dropped without settling (the computation panicked,
/// or the executor discarded the task) the resource is rejected with
/// [`ResourceError::Abandoned`] so nobody stays suspended forever.
struct Settler<T, E> {
  inner: Option<Arc<Inner<T, E>>>,
}

impl<T, E> Settler<T, E> {
  fn new(inner: Arc<Inner<T, E>>) -> Self {
    Self { inner: Some(inner) }
  }

  fn settle(mut self, outcome: Result<Result<T, E>, Box<dyn Any + Send>>) {
    let Some(inner) = self.inner.take() else {
      return;
    };

    let terminal = match outcome {
      Ok(Ok(value)) => State::Fulfilled(Arc::new(value)),
      Ok(Err(err)) => State::Rejected(ResourceError::Fetch(Arc::new(err))),
      Err(payload) => {
        tracing::error!(
          panic = panic_message(payload.as_ref()),
          "resource computation panicked"
        );
        State::Rejected(ResourceError::Abandoned)
      }
    };
    inner.settle(terminal);
  }
}

impl<T, E> Drop for Settler<T, E> {
  fn drop(&mut self) {
    if let Some(inner) = self.inner.take() {
      tracing::error!("resource computation was dropped before settling");
      inner.settle(State::Rejected(ResourceError::Abandoned));
    }
  }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "<non-string panic payload>"
  }
}

/// The outcome of [`SuspendingResource::read`].
pub enum Read<T, E> {
  /// The computation was fulfilled.
  Ready(Arc<T>),
  /// The computation is still running. Retry once the suspension completes.
  Suspended(Suspension),
  /// The computation was rejected.
  Failed(ResourceError<E>),
}

impl<T, E> Read<T, E> {
  /// Converts the outcome into a `Result`, folding both the suspended and
  /// failed cases into an [`Interrupt`].
  pub fn into_result(self) -> Result<Arc<T>, Interrupt<E>> {
    match self {
      Read::Ready(value) => Ok(value),
      Read::Suspended(suspension) => Err(Interrupt::Suspend(suspension)),
      Read::Failed(err) => Err(Interrupt::Fail(err)),
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, Read::Ready(_))
  }

  pub fn is_suspended(&self) -> bool {
    matches!(self, Read::Suspended(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Read::Failed(_))
  }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Read<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Read::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
      Read::Suspended(suspension) => f.debug_tuple("Suspended").field(suspension).finish(),
      Read::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
    }
  }
}

/// A handle to one asynchronous computation, readable synchronously.
///
/// The computation starts the moment the resource is constructed and runs
/// exactly once. [`read`](Self::read) never blocks and never starts work:
/// it only projects the current state, returning the value, the error, or
/// a [`Suspension`] to wait on.
///
/// Cloning is cheap and every clone observes the same computation; use
/// [`ptr_eq`](Self::ptr_eq) to check whether two handles are the same
/// resource.
pub struct SuspendingResource<T, E> {
  inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for SuspendingResource<T, E> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T, E> SuspendingResource<T, E>
where
  T: Send + Sync + 'static,
  E: Send + Sync + 'static,
{
  /// Starts `computation` on `spawner` and returns a resource tracking it.
  pub fn spawn<F>(computation: F, spawner: &dyn TaskSpawner) -> Self
  where
    F: Future<Output = Result<T, E>> + Send + 'static,
  {
    let (resource, settler) = Self::pending();
    spawner.spawn(Box::pin(async move {
      let outcome = AssertUnwindSafe(computation).catch_unwind().await;
      settler.settle(outcome);
    }));
    resource
  }

  /// Runs the blocking `computation` on a dedicated thread and returns a
  /// resource tracking it.
  pub fn spawn_blocking<F>(computation: F) -> Self
  where
    F: FnOnce() -> Result<T, E> + Send + 'static,
  {
    let (resource, settler) = Self::pending();
    let spawned = thread::Builder::new()
      .name("suspense-resource".into())
      .spawn(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(computation));
        settler.settle(outcome);
      });

    // On failure the closure, and the settler inside it, are dropped,
    // which rejects the resource as abandoned.
    if let Err(err) = spawned {
      tracing::error!(error = %err, "failed to spawn resource thread");
    }
    resource
  }

  /// Returns a resource that is already fulfilled with `value`.
  ///
  /// Useful for caching a bundle of resources that start together under
  /// one key.
  pub fn fulfilled(value: T) -> Self {
    let (resource, settler) = Self::pending();
    settler.settle(Ok(Ok(value)));
    resource
  }

  fn pending() -> (Self, Settler<T, E>) {
    let inner = Arc::new(Inner {
      state: Mutex::new(State::Pending),
      signal: Arc::new(Signal::new()),
    });
    let settler = Settler::new(inner.clone());
    (Self { inner }, settler)
  }
}

impl<T, E> SuspendingResource<T, E> {
  /// Projects the current state without side effects.
  pub fn read(&self) -> Read<T, E> {
    match &*self.inner.state.lock() {
      State::Pending => Read::Suspended(Suspension::new(self.inner.signal.clone())),
      State::Fulfilled(value) => Read::Ready(value.clone()),
      State::Rejected(err) => Read::Failed(err.clone()),
    }
  }

  /// Shorthand for `read().into_result()`, for chaining reads with `?`.
  pub fn try_read(&self) -> Result<Arc<T>, Interrupt<E>> {
    self.read().into_result()
  }

  /// Waits until the computation settles and returns its outcome.
  pub async fn settled(&self) -> Result<Arc<T>, ResourceError<E>> {
    loop {
      match self.read() {
        Read::Ready(value) => return Ok(value),
        Read::Failed(err) => return Err(err),
        Read::Suspended(suspension) => suspension.await,
      }
    }
  }

  /// Blocks the current thread until the computation settles and returns
  /// its outcome.
  pub fn wait(&self) -> Result<Arc<T>, ResourceError<E>> {
    loop {
      match self.read() {
        Read::Ready(value) => return Ok(value),
        Read::Failed(err) => return Err(err),
        Read::Suspended(suspension) => suspension.wait(),
      }
    }
  }

  pub fn is_pending(&self) -> bool {
    matches!(*self.inner.state.lock(), State::Pending)
  }

  pub fn is_fulfilled(&self) -> bool {
    matches!(*self.inner.state.lock(), State::Fulfilled(_))
  }

  pub fn is_rejected(&self) -> bool {
    matches!(*self.inner.state.lock(), State::Rejected(_))
  }

  /// Returns `true` if both handles refer to the same resource.
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl<T, E> fmt::Debug for SuspendingResource<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SuspendingResource")
      .field("state", &self.inner.state.lock().name())
      .finish_non_exhaustive()
  }
}
