use fibre_inject::{Component, ContainerConfig, ContainerStore, Lifecycle, Members, WeakContainer};
use std::sync::Arc;

struct Greeting(String);

#[derive(Default)]
struct Dispatcher {
  jobs: Option<WeakContainer>,
}

impl Component for Dispatcher {
  fn members(members: &mut Members<Self>) {
    members
      .container("jobs", |s: &mut Self, c: WeakContainer| s.jobs = Some(c))
      .named("jobs");
  }
}

fn main() -> fibre_inject::Result<()> {
  let store = ContainerStore::new();
  let api = store.create(ContainerConfig::new("api"))?;
  let jobs = store.create(ContainerConfig::new("jobs"))?;

  api.add_instance(Greeting("hello from the api".to_string()));
  jobs.add_factory(Lifecycle::Singleton, |_| {
    Ok::<_, std::convert::Infallible>(Arc::new(Greeting("hello from the jobs".to_string())))
  });
  api.add_transient::<Dispatcher>();

  // The first container created is the default one.
  let default_greeting = store.container(None)?.get::<Greeting>(None)?;
  println!("default: {}", default_greeting.0);

  let jobs_greeting = store.container(Some("jobs"))?.get::<Greeting>(None)?;
  println!("jobs: {}", jobs_greeting.0);

  // Containers in the same store can be injected into each other's components.
  let dispatcher = api.get::<Dispatcher>(None)?;
  if let Some(jobs) = dispatcher.jobs.as_ref().and_then(WeakContainer::upgrade) {
    println!("dispatcher reaches: {}", jobs.get::<Greeting>(None)?.0);
  }

  // The declared graph can be inspected without constructing anything.
  print!("{}", api.dependency_tree(std::any::type_name::<Dispatcher>())?);
  Ok(())
}
