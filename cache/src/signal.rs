use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};

/// Represents a party waiting for a resource to settle.
enum Waiter {
  Sync(Thread),
  Async(Waker),
}

impl Waiter {
  fn wake(self) {
    match self {
      Waiter::Sync(thread) => thread.unpark(),
      Waiter::Async(waker) => waker.wake(),
    }
  }
}

/// Each waiter owns one slot until it is woken or gives up.
struct Inner {
  settled: bool,
  next_slot: u64,
  waiters: Vec<(u64, Waiter)>,
}

impl Inner {
  fn register(&mut self, waiter: Waiter) -> u64 {
    let slot = self.next_slot;
    self.next_slot += 1;
    self.waiters.push((slot, waiter));
    slot
  }

  fn slot_mut(&mut self, slot: u64) -> Option<&mut Waiter> {
    self
      .waiters
      .iter_mut()
      .find(|(id, _)| *id == slot)
      .map(|(_, waiter)| waiter)
  }

  fn release(&mut self, slot: u64) {
    self.waiters.retain(|(id, _)| *id != slot);
  }
}

/// A latch that flips exactly once, when a resource's computation settles.
///
/// Sync threads and async tasks may wait on it at the same time.
pub(crate) struct Signal {
  inner: Mutex<Inner>,
}

impl Signal {
  pub(crate) fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        settled: false,
        next_slot: 0,
        waiters: Vec::new(),
      }),
    }
  }

  pub(crate) fn is_settled(&self) -> bool {
    self.inner.lock().settled
  }

  /// Flips the latch and wakes every waiter. Returns `false` if it had
  /// already been fired.
  pub(crate) fn fire(&self) -> bool {
    let waiters = {
      let mut inner = self.inner.lock();
      if inner.settled {
        return false;
      }
      inner.settled = true;
      mem::take(&mut inner.waiters)
    };

    // Wake outside the lock so woken parties can immediately re-check.
    for (_, waiter) in waiters {
      waiter.wake();
    }
    true
  }

  /// Polls for settlement, keeping at most one queued waker per `slot`.
  fn poll_settled(&self, slot: &mut Option<u64>, cx: &mut Context<'_>) -> Poll<()> {
    let mut inner = self.inner.lock();
    if inner.settled {
      *slot = None;
      return Poll::Ready(());
    }

    if let Some(Waiter::Async(existing)) = slot.and_then(|id| inner.slot_mut(id)) {
      if !existing.will_wake(cx.waker()) {
        *existing = cx.waker().clone();
      }
      return Poll::Pending;
    }
    *slot = Some(inner.register(Waiter::Async(cx.waker().clone())));
    Poll::Pending
  }

  fn release(&self, slot: u64) {
    self.inner.lock().release(slot);
  }

  fn wait(&self) {
    let slot = {
      let mut inner = self.inner.lock();
      if inner.settled {
        return;
      }
      inner.register(Waiter::Sync(thread::current()))
    };

    // The slot stays queued across spurious unparks; `fire` drains it.
    while !self.is_settled() {
      thread::park();
    }
    self.release(slot);
  }

  #[cfg(test)]
  fn waiter_count(&self) -> usize {
    self.inner.lock().waiters.len()
  }
}

/// The "not ready yet" signal handed out by a pending read.
///
/// A host that receives a `Suspension` should set the current unit of work
/// aside and retry it once the suspension completes. Completion only means
/// the underlying computation has settled; the retried read reports whether
/// it was fulfilled or rejected.
///
/// `Suspension` is a `Future<Output = ()>` for async hosts and offers a
/// blocking [`wait`](Suspension::wait) for synchronous ones.
pub struct Suspension {
  signal: Arc<Signal>,
  slot: Option<u64>,
}

impl Suspension {
  pub(crate) fn new(signal: Arc<Signal>) -> Self {
    Self { signal, slot: None }
  }

  /// Returns `true` once the underlying computation has settled.
  pub fn is_settled(&self) -> bool {
    self.signal.is_settled()
  }

  /// Blocks the current thread until the underlying computation settles.
  pub fn wait(&self) {
    self.signal.wait();
  }

  /// Returns `true` if both suspensions wait on the same computation.
  pub fn same_signal(&self, other: &Suspension) -> bool {
    Arc::ptr_eq(&self.signal, &other.signal)
  }
}

impl Future for Suspension {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    this.signal.poll_settled(&mut this.slot, cx)
  }
}

// A clone waits on the same computation but registers its own waker.
impl Clone for Suspension {
  fn clone(&self) -> Self {
    Self::new(self.signal.clone())
  }
}

// A future dropped before settlement must not leave its waker queued.
impl Drop for Suspension {
  fn drop(&mut self) {
    if let Some(slot) = self.slot.take() {
      self.signal.release(slot);
    }
  }
}

impl fmt::Debug for Suspension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Suspension")
      .field("settled", &self.is_settled())
      .finish()
  }
}
