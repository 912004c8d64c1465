use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

use suspense_cache::{Interrupt, Read, ResourceError, SuspendingResource, TaskSpawner};

mod common;
use common::{FetchError, ManualSpawner, Pokemon};

#[test]
fn test_pending_read_suspends_without_restarting_the_computation() {
  let starts = Arc::new(AtomicUsize::new(0));
  let (release_tx, release_rx) = mpsc::channel::<()>();

  let resource = SuspendingResource::<u32, FetchError>::spawn_blocking({
    let starts = starts.clone();
    move || {
      starts.fetch_add(1, Ordering::SeqCst);
      release_rx.recv().unwrap();
      Ok(42)
    }
  });

  for _ in 0..10 {
    assert!(resource.read().is_suspended());
  }
  assert!(resource.is_pending());

  release_tx.send(()).unwrap();
  assert_eq!(*resource.wait().unwrap(), 42);
  assert_eq!(starts.load(Ordering::SeqCst), 1, "computation must start exactly once");
}

#[test]
fn test_computation_starts_at_construction_not_at_read() {
  let spawner = ManualSpawner::new();
  let _resource = SuspendingResource::<u32, FetchError>::spawn(async { Ok(1) }, spawner.as_ref());
  assert_eq!(spawner.queued(), 1, "construction must hand the computation to the spawner");
}

#[test]
fn test_fulfilled_reads_return_the_same_value() {
  let spawner = ManualSpawner::new();
  let resource = SuspendingResource::<Pokemon, FetchError>::spawn(
    async { Ok(Pokemon::named("pikachu")) },
    spawner.as_ref(),
  );
  spawner.run_all();

  let first = match resource.read() {
    Read::Ready(value) => value,
    other => panic!("expected ready, got {:?}", other),
  };
  for _ in 0..5 {
    match resource.read() {
      Read::Ready(value) => assert!(Arc::ptr_eq(&first, &value)),
      other => panic!("expected ready, got {:?}", other),
    }
  }
  assert_eq!(first.name, "pikachu");
  assert!(resource.is_fulfilled());
}

#[test]
fn test_rejected_reads_return_the_same_error() {
  let spawner = ManualSpawner::new();
  let resource = SuspendingResource::<Pokemon, FetchError>::spawn(
    async { Err(FetchError::NotFound("missingmon".into())) },
    spawner.as_ref(),
  );
  spawner.run_all();

  let first = match resource.read() {
    Read::Failed(ResourceError::Fetch(err)) => err,
    other => panic!("expected fetch failure, got {:?}", other),
  };
  assert_eq!(*first, FetchError::NotFound("missingmon".into()));

  for _ in 0..5 {
    match resource.read() {
      Read::Failed(ResourceError::Fetch(err)) => assert!(Arc::ptr_eq(&first, &err)),
      other => panic!("expected fetch failure, got {:?}", other),
    }
  }
  assert!(resource.is_rejected());
}

#[test]
fn test_suspension_completes_when_the_computation_settles() {
  let spawner = ManualSpawner::new();
  let resource =
    SuspendingResource::<u32, FetchError>::spawn(async { Ok(7) }, spawner.as_ref());

  let suspension = match resource.read() {
    Read::Suspended(suspension) => suspension,
    other => panic!("expected suspension, got {:?}", other),
  };
  assert!(!suspension.is_settled());

  spawner.run_all();
  assert!(suspension.is_settled());
  futures_executor::block_on(suspension);
  assert_eq!(*resource.try_read().unwrap(), 7);
}

#[test]
fn test_clones_share_one_resource() {
  let spawner = ManualSpawner::new();
  let resource =
    SuspendingResource::<u32, FetchError>::spawn(async { Ok(3) }, spawner.as_ref());
  let clone = resource.clone();
  assert!(resource.ptr_eq(&clone));

  let other =
    SuspendingResource::<u32, FetchError>::spawn(async { Ok(3) }, spawner.as_ref());
  assert!(!resource.ptr_eq(&other));

  spawner.run_all();
  assert!(clone.is_fulfilled());
}

#[test]
fn test_try_read_chains_with_question_mark() {
  let spawner = ManualSpawner::new();
  let data = SuspendingResource::<Pokemon, FetchError>::spawn(
    async { Ok(Pokemon::named("mew")) },
    spawner.as_ref(),
  );
  let image = SuspendingResource::<String, FetchError>::spawn(
    async { Ok("/img/pokemon/mew.jpg".to_string()) },
    spawner.as_ref(),
  );

  let view = || -> Result<String, Interrupt<FetchError>> {
    let pokemon = data.try_read()?;
    let src = image.try_read()?;
    Ok(format!("<img src={} alt={}>", src, pokemon.name))
  };

  assert!(view().unwrap_err().is_suspend());
  spawner.run_all();
  assert_eq!(view().unwrap(), "<img src=/img/pokemon/mew.jpg alt=mew>");
}

#[tokio::test]
async fn test_settled_awaits_the_outcome() {
  let resource = SuspendingResource::<u32, FetchError>::spawn(
    async {
      tokio::task::yield_now().await;
      Ok(11)
    },
    &suspense_cache::TokioSpawner::new(),
  );
  assert!(resource.is_pending());
  assert_eq!(*resource.settled().await.unwrap(), 11);
}

/// A spawner whose executor throws away everything it is given.
struct Discard;

impl TaskSpawner for Discard {
  fn spawn(&self, _future: Pin<Box<dyn Future<Output = ()> + Send>>) {}
}

#[test]
fn test_dropped_computation_is_abandoned() {
  let resource = SuspendingResource::<u32, FetchError>::spawn(async { Ok(1) }, &Discard);

  // The rejection is recorded, not left pending forever.
  let err = resource.wait().unwrap_err();
  assert!(err.is_abandoned());
  assert!(resource.is_rejected());
  assert!(resource.read().is_failed());
}
