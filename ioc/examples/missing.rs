use fibre_inject::{resolve, Component, Container, ContainerConfig, Error, Members};
use std::panic;
use std::sync::Arc;

struct UnregisteredService;

#[derive(Default)]
struct Mailer {
  transport: Option<Arc<UnregisteredService>>,
}

impl Component for Mailer {
  fn members(members: &mut Members<Self>) {
    members.inject("transport", |s: &mut Self, t: Arc<UnregisteredService>| s.transport = Some(t));
  }
}

fn main() {
  tracing_subscriber::fmt().with_target(true).init();

  let container = Container::new();

  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a dependency that was never registered...");

  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    let _service = resolve!(container, UnregisteredService);
  }));

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the non-panicking `get()` method ---
  match container.get::<UnregisteredService>(None) {
    Ok(_) => panic!("Should not have found the dependency!"),
    Err(err) => println!("Correctly received an error: {err}"),
  }

  // --- Missing members: strict versus permissive ---
  container.add_transient::<Mailer>();
  match container.get::<Mailer>(None) {
    Err(Error::MissingDependency { owner, dependency }) => {
      println!("Strict container refused to build {owner}: {dependency} is missing")
    }
    other => panic!("unexpected result: {:?}", other.err()),
  }

  // The permissive container logs a warning through tracing and leaves the member unset.
  let permissive = Container::with_config(ContainerConfig::permissive("permissive"));
  permissive.add_transient::<Mailer>();
  let mailer = permissive.get::<Mailer>(None).expect("permissive resolution");
  assert!(mailer.transport.is_none());
  println!("Permissive container built a Mailer without a transport.");
}
