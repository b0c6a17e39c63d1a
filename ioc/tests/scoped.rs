use fibre_inject::{CancellationToken, Component, Container, Context, Error, Lifecycle, Members};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

// --- Test Fixtures ---

// Counts how many instances are alive, so teardown can be observed.
struct Tracked {
  live: Arc<AtomicUsize>,
}

impl Drop for Tracked {
  fn drop(&mut self) {
    self.live.fetch_sub(1, Ordering::SeqCst);
  }
}

fn tracked_container() -> (Container, Arc<AtomicUsize>, Arc<AtomicUsize>) {
  let container = Container::new();
  let live = Arc::new(AtomicUsize::new(0));
  let built = Arc::new(AtomicUsize::new(0));
  let (live_in, built_in) = (live.clone(), built.clone());
  container.add_factory(Lifecycle::Scoped, move |_| {
    live_in.fetch_add(1, Ordering::SeqCst);
    built_in.fetch_add(1, Ordering::SeqCst);
    Ok::<_, Error>(Arc::new(Tracked { live: live_in.clone() }))
  });
  (container, live, built)
}

#[derive(Default)]
struct RequestContext;
impl Component for RequestContext {}

#[derive(Default)]
struct Handler {
  request: Option<Arc<RequestContext>>,
}
impl Component for Handler {
  fn members(members: &mut Members<Self>) {
    members.inject("request", |s: &mut Self, r: Arc<RequestContext>| s.request = Some(r));
  }
}

// --- Scoped Tests ---

#[test]
fn test_scoped_instances_are_shared_within_a_scope() {
  // Arrange
  let container = Container::new();
  container.add_scoped::<RequestContext>();
  container.add_transient::<Handler>();
  let scope = container.begin_scope();

  // Act
  let direct = container.get_scoped::<RequestContext>(&scope, None).unwrap();
  let h1 = container.get_scoped::<Handler>(&scope, None).unwrap();
  let h2 = container.get_scoped::<Handler>(&scope, None).unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&h1, &h2));
  assert!(Arc::ptr_eq(h1.request.as_ref().unwrap(), &direct));
  assert!(Arc::ptr_eq(h2.request.as_ref().unwrap(), &direct));
}

#[test]
fn test_scoped_instances_are_isolated_between_scopes() {
  let container = Container::new();
  container.add_scoped::<RequestContext>();

  let first = container.begin_scope();
  let second = container.begin_scope();
  let a = container.get_scoped::<RequestContext>(&first, None).unwrap();
  let b = container.get_scoped::<RequestContext>(&second, None).unwrap();

  assert_ne!(first.id(), second.id());
  assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_get_without_scope_uses_a_private_scope() {
  let (container, live, built) = tracked_container();

  let first = container.get::<Tracked>(None).unwrap();
  let second = container.get::<Tracked>(None).unwrap();

  assert!(!Arc::ptr_eq(&first, &second));
  assert_eq!(built.load(Ordering::SeqCst), 2);
  assert_eq!(container.scopes().active_scopes(), 0);
  drop((first, second));
  assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_ending_a_scope_releases_its_instances() {
  // Arrange
  let (container, live, _) = tracked_container();
  let scope = container.begin_scope();
  let id = scope.id();
  container.get_scoped::<Tracked>(&scope, None).unwrap();
  assert_eq!(live.load(Ordering::SeqCst), 1);

  // Act
  scope.end();

  // Assert
  assert_eq!(live.load(Ordering::SeqCst), 0);
  assert!(!container.scopes().is_active(id));
  assert!(!container.end_scope(id));
}

#[test]
fn test_dropping_the_handle_ends_the_scope() {
  let (container, live, _) = tracked_container();

  {
    let scope = container.begin_scope();
    container.get_scoped::<Tracked>(&scope, None).unwrap();
    assert_eq!(container.scopes().active_scopes(), 1);
  }

  assert_eq!(container.scopes().active_scopes(), 0);
  assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancellation_ends_the_scope_once() {
  // Arrange
  let (container, live, _) = tracked_container();
  let token = CancellationToken::new();
  let scope = container.begin_scope_with(token.clone());
  container.get_scoped::<Tracked>(&scope, None).unwrap();

  // Act
  token.cancel();

  // Assert
  assert!(!scope.is_active());
  assert_eq!(live.load(Ordering::SeqCst), 0);
  match container.get_scoped::<Tracked>(&scope, None) {
    Err(Error::ScopeNotActive(id)) => assert_eq!(id, scope.id()),
    other => panic!("expected an inactive scope error, got {:?}", other.err()),
  }
  // Explicit end after cancellation is a no-op.
  assert!(!container.end_scope(scope.id()));
  scope.end();
}

#[test]
fn test_context_exposes_scope_and_cancellation() {
  let container = Container::new();
  container.add_factory(Lifecycle::Scoped, |ctx: &Context| {
    Ok::<_, Error>(Arc::new((ctx.scope().get(), ctx.is_cancelled())))
  });
  let token = CancellationToken::new();
  let scope = container.begin_scope_with(token);

  let seen = container.get_scoped::<(u64, bool)>(&scope, None).unwrap();

  assert_eq!(seen.0, scope.id().get());
  assert!(!seen.1);
}

#[test]
fn test_scope_store_get_and_put() {
  let container = Container::new();
  let scope = container.begin_scope();
  let store = container.scopes();

  assert!(store.get(scope.id(), "manual").is_none());
  store.put(scope.id(), "manual", Arc::new(Arc::new(7_u8))).unwrap();

  let value = store.get(scope.id(), "manual").unwrap();
  assert_eq!(**value.downcast_ref::<Arc<u8>>().unwrap(), 7);

  let id = scope.id();
  scope.end();
  assert!(matches!(
    store.put(id, "manual", Arc::new(Arc::new(8_u8))),
    Err(Error::ScopeNotActive(_))
  ));
}

#[test]
fn test_scoped_instance_is_constructed_once_under_concurrency() {
  let (container, _, built) = tracked_container();
  let scope = container.begin_scope();

  thread::scope(|s| {
    for _ in 0..16 {
      s.spawn(|| {
        container.get_scoped::<Tracked>(&scope, None).unwrap();
      });
    }
  });

  assert_eq!(built.load(Ordering::SeqCst), 1);
}
