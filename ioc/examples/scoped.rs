use fibre_inject::{CancellationToken, Component, Container, Members};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// One per request.
struct RequestId(u64);

impl Default for RequestId {
  fn default() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    RequestId(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}
impl Component for RequestId {}

#[derive(Default)]
struct AuditLog {
  request: Option<Arc<RequestId>>,
}
impl Component for AuditLog {
  fn members(members: &mut Members<Self>) {
    members.inject("request", |s: &mut Self, r: Arc<RequestId>| s.request = Some(r));
  }
}

#[derive(Default)]
struct Handler {
  request: Option<Arc<RequestId>>,
  audit: Option<Arc<AuditLog>>,
}
impl Component for Handler {
  fn members(members: &mut Members<Self>) {
    members.inject("request", |s: &mut Self, r: Arc<RequestId>| s.request = Some(r));
    members.inject("audit", |s: &mut Self, a: Arc<AuditLog>| s.audit = Some(a));
  }
}

fn request_of(handler: &Handler) -> u64 {
  handler.request.as_ref().map_or(0, |r| r.0)
}

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();
  container.add_scoped::<RequestId>();
  container.add_transient::<AuditLog>();
  container.add_transient::<Handler>();

  // Two handlers in the same scope share the request id, also through the audit log.
  let scope = container.begin_scope();
  let first = container.get_scoped::<Handler>(&scope, None)?;
  let second = container.get_scoped::<Handler>(&scope, None)?;
  println!(
    "scope {}: handlers see requests {} and {}",
    scope.id(),
    request_of(&first),
    request_of(&second)
  );
  scope.end();

  // A scope tied to a cancellation token ends when the token is cancelled.
  let token = CancellationToken::new();
  let scope = container.begin_scope_with(token.clone());
  let third = container.get_scoped::<Handler>(&scope, None)?;
  println!("scope {}: handler sees request {}", scope.id(), request_of(&third));
  token.cancel();
  println!("after cancel, scope active: {}", scope.is_active());

  if let Err(err) = container.get_scoped::<Handler>(&scope, None) {
    println!("resolving in a cancelled scope fails: {err}");
  }
  Ok(())
}
