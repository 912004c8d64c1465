use crate::error::{Interrupt, RenderError};

use std::fmt;

/// The result of a successful render: the unit of work's output and how
/// many passes it took to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<R> {
  pub output: R,
  pub passes: usize,
}

/// A minimal host for units of work that read suspending resources.
///
/// A unit of work is any `FnMut() -> Result<R, Interrupt<E>>`, typically a
/// closure that calls [`try_read`](crate::SuspendingResource::try_read) on
/// one or more resources with `?`. The host runs it; when it suspends, the
/// host waits for the signalled computation to settle and runs it again.
/// A failure is handed back to the caller untouched.
#[derive(Clone, Default)]
pub struct Suspense {
  max_passes: Option<usize>,
}

impl fmt::Debug for Suspense {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Suspense")
      .field("max_passes", &self.max_passes)
      .finish()
  }
}

impl Suspense {
  pub fn new() -> Self {
    Self::default()
  }

  /// Gives up with [`RenderError::TooManyPasses`] once the unit of work has
  /// run `passes` times and still suspends.
  pub fn max_passes(mut self, passes: usize) -> Self {
    self.max_passes = Some(passes.max(1));
    self
  }

  /// Drives `work` to completion, awaiting every suspension.
  pub async fn render<R, E, W>(&self, mut work: W) -> Result<Rendered<R>, RenderError<E>>
  where
    W: FnMut() -> Result<R, Interrupt<E>>,
  {
    let mut passes = 0;
    loop {
      passes += 1;
      match work() {
        Ok(output) => return Ok(Rendered { output, passes }),
        Err(Interrupt::Fail(err)) => return Err(RenderError::Failed(err)),
        Err(Interrupt::Suspend(suspension)) => {
          if self.exhausted(passes) {
            return Err(RenderError::TooManyPasses(passes));
          }
          tracing::trace!(passes, "unit of work suspended");
          suspension.await;
        }
      }
    }
  }

  /// Drives `work` to completion, blocking the current thread on every
  /// suspension.
  pub fn render_blocking<R, E, W>(&self, mut work: W) -> Result<Rendered<R>, RenderError<E>>
  where
    W: FnMut() -> Result<R, Interrupt<E>>,
  {
    let mut passes = 0;
    loop {
      passes += 1;
      match work() {
        Ok(output) => return Ok(Rendered { output, passes }),
        Err(Interrupt::Fail(err)) => return Err(RenderError::Failed(err)),
        Err(Interrupt::Suspend(suspension)) => {
          if self.exhausted(passes) {
            return Err(RenderError::TooManyPasses(passes));
          }
          tracing::trace!(passes, "unit of work suspended");
          suspension.wait();
        }
      }
    }
  }

  fn exhausted(&self, passes: usize) -> bool {
    let exhausted = self.max_passes.is_some_and(|max| passes >= max);
    if exhausted {
      tracing::debug!(passes, "giving up on a unit of work that keeps suspending");
    }
    exhausted
  }
}
