use fibre_inject::{
  Component, Container, ContainerConfig, ContainerStore, Error, Lifecycle, Members,
  WeakContainer, DEFAULT_CONTAINER_ID,
};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Default)]
struct Worker {
  jobs: Option<WeakContainer>,
}

impl Component for Worker {
  fn members(members: &mut Members<Self>) {
    members
      .container("jobs", |s: &mut Self, c: WeakContainer| s.jobs = Some(c))
      .named("jobs");
  }
}

#[derive(Default)]
struct Repository;
impl Component for Repository {}

#[derive(Default)]
struct Service {
  repository: Option<Arc<Repository>>,
}
impl Component for Service {
  fn members(members: &mut Members<Self>) {
    members.inject("repository", |s: &mut Self, r: Arc<Repository>| s.repository = Some(r));
  }
}

// --- Store Tests ---

#[test]
fn test_first_container_is_the_default() {
  // Arrange
  let store = ContainerStore::new();
  assert!(store.default_container().is_none());

  // Act
  store.create(ContainerConfig::new("app")).unwrap();
  store.create(ContainerConfig::new("jobs")).unwrap();

  // Assert
  assert_eq!(store.default_id().as_deref(), Some("app"));
  assert_eq!(store.container(None).unwrap().id(), "app");
  assert_eq!(store.ids(), vec!["app".to_string(), "jobs".to_string()]);
  assert_eq!(store.len(), 2);
}

#[test]
fn test_set_default_switches_the_default() {
  let store = ContainerStore::new();
  store.create(ContainerConfig::new("app")).unwrap();
  store.create(ContainerConfig::new("jobs")).unwrap();

  store.set_default("jobs").unwrap();

  assert_eq!(store.default_container().unwrap().id(), "jobs");
  assert!(matches!(store.set_default("missing"), Err(Error::UnknownContainer(id)) if id == "missing"));
  assert!(matches!(store.set_default(""), Err(Error::EmptyContainerId)));
}

#[test]
fn test_invalid_container_ids_are_rejected() {
  let store = ContainerStore::new();
  store.add(Container::new()).unwrap();

  assert!(matches!(
    store.create(ContainerConfig::new("")),
    Err(Error::EmptyContainerId)
  ));
  assert!(matches!(
    store.add(Container::new()),
    Err(Error::DuplicateContainer(id)) if id == DEFAULT_CONTAINER_ID
  ));
  assert!(matches!(
    store.container(Some("nope")),
    Err(Error::UnknownContainer(_))
  ));
}

#[test]
fn test_per_call_container_override() {
  let store = ContainerStore::new();
  let app = store.create(ContainerConfig::new("app")).unwrap();
  let jobs = store.create(ContainerConfig::new("jobs")).unwrap();
  app.add_instance(1_u32);
  jobs.add_instance(2_u32);

  let default_value = store.container(None).unwrap().get::<u32>(None).unwrap();
  let jobs_value = store.container(Some("jobs")).unwrap().get::<u32>(None).unwrap();

  assert_eq!(*default_value, 1);
  assert_eq!(*jobs_value, 2);
}

#[test]
fn test_container_member_with_id_comes_from_the_store() {
  // Arrange
  let store = ContainerStore::new();
  let app = store.create(ContainerConfig::new("app")).unwrap();
  let jobs = store.create(ContainerConfig::new("jobs")).unwrap();
  jobs.add_instance(String::from("queue"));
  app.add_transient::<Worker>();

  // Act
  let worker = app.get::<Worker>(None).unwrap();

  // Assert
  let injected = worker.jobs.as_ref().and_then(WeakContainer::upgrade).unwrap();
  assert_eq!(injected.id(), "jobs");
  assert_eq!(*injected.get::<String>(None).unwrap(), "queue");
  assert_eq!(app.get::<Container>(Some("jobs")).unwrap().id(), "jobs");
}

#[test]
fn test_container_member_with_unknown_id_fails() {
  // A container outside any store only knows itself.
  let container = Container::new();
  container.add_transient::<Worker>();

  assert!(matches!(
    container.get::<Worker>(None),
    Err(Error::UnknownContainer(id)) if id == "jobs"
  ));
}

// --- Dependency Tree Tests ---

#[test]
fn test_dependency_tree_lists_declared_dependencies() {
  let container = Container::new();
  container.add_singleton::<Repository>();
  container.add_transient::<Service>();

  let tree = container
    .dependency_tree(std::any::type_name::<Service>())
    .unwrap();

  assert_eq!(tree.lifecycle(), Some(Lifecycle::Transient));
  assert_eq!(tree.children().len(), 1);
  let child = tree.find(std::any::type_name::<Repository>()).unwrap();
  assert_eq!(child.lifecycle(), Some(Lifecycle::Singleton));
  assert!(tree.validate_lifecycles().is_ok());
  assert!(tree.to_string().contains("(singleton)"));
}

#[test]
fn test_dependency_tree_detects_captive_dependencies() {
  let container = Container::new();
  container.add_transient::<Repository>();
  container.add_singleton::<Service>();

  let tree = container
    .dependency_tree(std::any::type_name::<Service>())
    .unwrap();

  assert!(matches!(
    tree.validate_lifecycles(),
    Err(Error::CaptiveDependency {
      lifecycle: Lifecycle::Transient,
      ancestor_lifecycle: Lifecycle::Singleton,
      ..
    })
  ));
  // Nothing was constructed while building the tree.
  assert!(!container.lookup(std::any::type_name::<Service>()).unwrap().is_cached());
}

#[test]
fn test_dependency_tree_detects_cycles_and_missing_members() {
  let container = Container::new();
  container
    .register::<Repository>()
    .constructor(|_service: Arc<Service>| Ok::<_, Error>(Arc::new(Repository)))
    .register()
    .unwrap();
  container.add_transient::<Service>();

  let err = container
    .dependency_tree(std::any::type_name::<Service>())
    .unwrap_err();
  assert_eq!(err.chain().unwrap().len(), 3);

  let lonely = Container::new();
  lonely.add_transient::<Service>();
  assert!(matches!(
    lonely.dependency_tree(std::any::type_name::<Service>()),
    Err(Error::MissingDependency { .. })
  ));

  let permissive = Container::with_config(ContainerConfig::default().allow_missing_dependencies(true));
  permissive.add_transient::<Service>();
  let tree = permissive
    .dependency_tree(std::any::type_name::<Service>())
    .unwrap();
  assert!(!tree.children()[0].is_registered());
}

// Each layer depends on both components of the next one.
macro_rules! diamond_layers {
  ($container:expr, $($name:ident => $left:ident $right:ident),+ $(,)?) => {
    $(
      $container
        .register::<$name>()
        .constructor(|_: Arc<$left>, _: Arc<$right>| Ok::<_, Error>(Arc::new($name)))
        .register()
        .unwrap();
    )+
  };
}

#[test]
fn test_dependency_tree_shares_subtrees_of_diamond_graphs() {
  struct A0; struct A1; struct A2; struct A3; struct A4; struct A5; struct A6; struct A7; struct A8; struct A9; struct A10; struct A11; struct A12; struct A13; struct A14; struct A15; struct A16; struct A17; struct A18; struct A19; struct A20;
  struct B0; struct B1; struct B2; struct B3; struct B4; struct B5; struct B6; struct B7; struct B8; struct B9; struct B10; struct B11; struct B12; struct B13; struct B14; struct B15; struct B16; struct B17; struct B18; struct B19; struct B20;

  // Arrange: 20 layers of diamonds, about a million paths from the root.
  let container = Container::new();
  container.add_instance(A20);
  container.add_instance(B20);
  diamond_layers!(
    container,
    A0 => A1 B1,
    B0 => A1 B1,
    A1 => A2 B2,
    B1 => A2 B2,
    A2 => A3 B3,
    B2 => A3 B3,
    A3 => A4 B4,
    B3 => A4 B4,
    A4 => A5 B5,
    B4 => A5 B5,
    A5 => A6 B6,
    B5 => A6 B6,
    A6 => A7 B7,
    B6 => A7 B7,
    A7 => A8 B8,
    B7 => A8 B8,
    A8 => A9 B9,
    B8 => A9 B9,
    A9 => A10 B10,
    B9 => A10 B10,
    A10 => A11 B11,
    B10 => A11 B11,
    A11 => A12 B12,
    B11 => A12 B12,
    A12 => A13 B13,
    B12 => A13 B13,
    A13 => A14 B14,
    B13 => A14 B14,
    A14 => A15 B15,
    B14 => A15 B15,
    A15 => A16 B16,
    B15 => A16 B16,
    A16 => A17 B17,
    B16 => A17 B17,
    A17 => A18 B18,
    B17 => A18 B18,
    A18 => A19 B19,
    B18 => A19 B19,
    A19 => A20 B20,
    B19 => A20 B20,
  );

  // Act
  let tree = container.dependency_tree(&fibre_inject::type_key::<A0>()).unwrap();

  // Assert
  assert!(tree.validate_lifecycles().is_ok());
  let (left, right) = (&tree.children()[0], &tree.children()[1]);
  assert_eq!(left.name(), fibre_inject::type_key::<A1>());
  assert!(Arc::ptr_eq(&left.children()[0], &right.children()[0]));
  assert!(Arc::ptr_eq(&left.children()[1], &right.children()[1]));
  let bottom = tree.find(&fibre_inject::type_key::<A20>()).unwrap();
  assert_eq!(bottom.lifecycle(), Some(Lifecycle::Singleton));

  // A singleton root still reports the transient layer below it.
  container
    .register::<A0>()
    .lifecycle(Lifecycle::Singleton)
    .constructor(|_: Arc<A1>, _: Arc<B1>| Ok::<_, Error>(Arc::new(A0)))
    .register()
    .unwrap();
  let tree = container.dependency_tree(&fibre_inject::type_key::<A0>()).unwrap();
  assert!(matches!(
    tree.validate_lifecycles(),
    Err(Error::CaptiveDependency {
      lifecycle: Lifecycle::Transient,
      ancestor_lifecycle: Lifecycle::Singleton,
      ..
    })
  ));
}
