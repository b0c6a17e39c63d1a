//! A store of named containers with one default.

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct StoreShared {
  containers: RwLock<HashMap<String, Container>>,
  default_id: RwLock<Option<String>>,
}

impl StoreShared {
  pub(crate) fn get(&self, id: &str) -> Option<Container> {
    self.containers.read().get(id).cloned()
  }
}

/// Containers looked up by id.
///
/// The first container added becomes the default one. Containers added to a
/// store can inject each other through container members with an explicit
/// id.
///
/// # Examples
///
/// ```
/// use fibre_inject::{ContainerConfig, ContainerStore};
///
/// let store = ContainerStore::new();
/// let app = store.create(ContainerConfig::new("app")).unwrap();
/// let jobs = store.create(ContainerConfig::new("jobs")).unwrap();
///
/// app.add_instance(String::from("app"));
/// jobs.add_instance(String::from("jobs"));
///
/// assert_eq!(*store.container(None).unwrap().get::<String>(None).unwrap(), "app");
/// assert_eq!(*store.container(Some("jobs")).unwrap().get::<String>(None).unwrap(), "jobs");
/// ```
#[derive(Clone, Default)]
pub struct ContainerStore {
  shared: Arc<StoreShared>,
}

impl ContainerStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a container from `config` and adds it to the store.
  pub fn create(&self, config: ContainerConfig) -> Result<Container> {
    let container = Container::with_config(config);
    self.add(container.clone())?;
    Ok(container)
  }

  /// Adds `container` under its id.
  pub fn add(&self, container: Container) -> Result<()> {
    let id = container.id().to_owned();
    if id.is_empty() {
      return Err(Error::EmptyContainerId);
    }

    {
      let mut containers = self.shared.containers.write();
      if containers.contains_key(&id) {
        return Err(Error::DuplicateContainer(id));
      }
      container.attach(Arc::downgrade(&self.shared));
      containers.insert(id.clone(), container);
    }

    let mut default_id = self.shared.default_id.write();
    if default_id.is_none() {
      tracing::debug!(target: "fibre_inject", container = %id, "default container set");
      *default_id = Some(id);
    }
    Ok(())
  }

  pub fn get(&self, id: &str) -> Option<Container> {
    self.shared.get(id)
  }

  /// The default container, if any container has been added.
  pub fn default_container(&self) -> Option<Container> {
    let id = self.shared.default_id.read().clone()?;
    self.get(&id)
  }

  pub fn default_id(&self) -> Option<String> {
    self.shared.default_id.read().clone()
  }

  /// Makes the container `id` the default one.
  pub fn set_default(&self, id: &str) -> Result<()> {
    if id.is_empty() {
      return Err(Error::EmptyContainerId);
    }
    if !self.shared.containers.read().contains_key(id) {
      return Err(Error::UnknownContainer(id.to_owned()));
    }
    *self.shared.default_id.write() = Some(id.to_owned());
    Ok(())
  }

  /// The container `id`, or the default container when `id` is `None`.
  pub fn container(&self, id: Option<&str>) -> Result<Container> {
    match id {
      Some(id) => self.get(id).ok_or_else(|| Error::UnknownContainer(id.to_owned())),
      None => self
        .default_container()
        .ok_or_else(|| Error::UnknownContainer(crate::DEFAULT_CONTAINER_ID.to_owned())),
    }
  }

  /// The ids of every container, sorted.
  pub fn ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.shared.containers.read().keys().cloned().collect();
    ids.sort();
    ids
  }

  pub fn len(&self) -> usize {
    self.shared.containers.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Debug for ContainerStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerStore")
      .field("containers", &self.ids())
      .field("default", &self.default_id())
      .finish()
  }
}
