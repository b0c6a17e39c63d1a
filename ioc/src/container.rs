//! The main `Container` struct and its associated methods.

use crate::config::ContainerConfig;
use crate::context::Context;
use crate::core::{downcast, erase, type_key, Instance, TypeInfo};
use crate::descriptor::{Descriptor, Strategy};
use crate::error::{BoxError, Error, Result};
use crate::inject::{Component, ComponentPlan};
use crate::lifecycle::Lifecycle;
use crate::logging::Logger;
use crate::registry::{factory_strategy, Registration, Registry};
use crate::resolver;
use crate::scope::{CancellationToken, ScopeHandle, ScopeId, ScopeStore};
use crate::store::StoreShared;
use crate::tree::DependencyTree;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

struct Shared {
  // Distinguishes containers on the resolution chain, even ones sharing an id.
  uid: u64,
  config: ContainerConfig,
  logger: Logger,
  registry: Registry,
  scopes: Arc<ScopeStore>,
  store: OnceCell<Weak<StoreShared>>,
}

/// The Inversion of Control (IoC) container.
///
/// Holds the registrations of one dependency graph together with the scopes
/// opened against it. `Container` is a cheap handle: clones share the same
/// registry, caches and scopes, and may be sent to other threads.
///
/// Registration may happen at any time, including after resolution has
/// started. Re-registering a name replaces the previous registration and
/// drops its cached singleton.
#[derive(Clone)]
pub struct Container {
  shared: Arc<Shared>,
}

/// A non-owning handle to a [`Container`].
///
/// Container members and constructor parameters receive this handle. An
/// instance cached by a container may keep it without keeping the container
/// alive, so dropping the last `Container` releases every registration.
#[derive(Clone)]
pub struct WeakContainer {
  shared: Weak<Shared>,
}

impl WeakContainer {
  /// The container, if a `Container` handle to it still exists.
  pub fn upgrade(&self) -> Option<Container> {
    self.shared.upgrade().map(|shared| Container { shared })
  }
}

impl fmt::Debug for WeakContainer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.upgrade() {
      Some(container) => f.debug_tuple("WeakContainer").field(&container.id()).finish(),
      None => f.write_str("WeakContainer(dropped)"),
    }
  }
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates an empty container with the strict default configuration.
  pub fn new() -> Self {
    Self::with_config(ContainerConfig::default())
  }

  pub fn with_config(config: ContainerConfig) -> Self {
    let logger = Logger::new(config.logger.clone());
    Self {
      shared: Arc::new(Shared {
        uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
        config,
        logger,
        registry: Registry::default(),
        scopes: Arc::default(),
        store: OnceCell::new(),
      }),
    }
  }

  pub fn id(&self) -> &str {
    &self.shared.config.id
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.shared.config
  }

  pub fn downgrade(&self) -> WeakContainer {
    WeakContainer {
      shared: Arc::downgrade(&self.shared),
    }
  }

  /// The scopes currently open against this container.
  pub fn scopes(&self) -> &ScopeStore {
    &self.shared.scopes
  }

  pub(crate) fn uid(&self) -> u64 {
    self.shared.uid
  }

  pub(crate) fn logger(&self) -> &Logger {
    &self.shared.logger
  }

  pub(crate) fn registry(&self) -> &Registry {
    &self.shared.registry
  }

  /// Records the store this container was added to. Only the first store
  /// is kept.
  pub(crate) fn attach(&self, store: Weak<StoreShared>) -> bool {
    self.shared.store.set(store).is_ok()
  }

  // --- Registration ---

  /// Starts a registration of the interface type `I`.
  pub fn register<I: ?Sized + Any + Send + Sync>(&self) -> Registration<'_, I> {
    Registration::new(self)
  }

  pub(crate) fn insert<I: ?Sized + Any + Send + Sync>(
    &self,
    name: String,
    lifecycle: Lifecycle,
    strategy: Strategy,
    value_type: TypeInfo,
  ) {
    self.logger().info(format!(
      "registered {lifecycle} dependency {name} ({})",
      value_type.name()
    ));
    self.registry().insert(Descriptor::new(
      name,
      TypeInfo::of::<I>(),
      value_type,
      lifecycle,
      strategy,
    ));
  }

  fn add_component<T: Component>(&self, name: Option<&str>, lifecycle: Lifecycle) {
    let name = name.map_or_else(type_key::<T>, str::to_owned);
    let plan = ComponentPlan::new::<T, T, _>(|value: Arc<T>| value);
    self.insert::<T>(name, lifecycle, Strategy::Component(plan), TypeInfo::of::<T>());
  }

  // --- Instance Registration ---
  pub fn add_instance<T: Any + Send + Sync>(&self, instance: T) {
    self.add_instance_arc(Arc::new(instance));
  }
  pub fn add_instance_with_name<T: Any + Send + Sync>(&self, name: &str, instance: T) {
    self.add_instance_arc_with_name(name, Arc::new(instance));
  }

  /// Registers a ready value under `type_key::<I>()`. Works for trait objects.
  pub fn add_instance_arc<I: ?Sized + Any + Send + Sync>(&self, instance: Arc<I>) {
    self.insert::<I>(
      type_key::<I>(),
      Lifecycle::Singleton,
      Strategy::Instance(erase(instance)),
      TypeInfo::of::<I>(),
    );
  }
  pub fn add_instance_arc_with_name<I: ?Sized + Any + Send + Sync>(&self, name: &str, instance: Arc<I>) {
    self.insert::<I>(
      name.to_owned(),
      Lifecycle::Singleton,
      Strategy::Instance(erase(instance)),
      TypeInfo::of::<I>(),
    );
  }

  // --- Component Registration ---
  pub fn add_singleton<T: Component>(&self) {
    self.add_component::<T>(None, Lifecycle::Singleton);
  }
  pub fn add_singleton_with_name<T: Component>(&self, name: &str) {
    self.add_component::<T>(Some(name), Lifecycle::Singleton);
  }
  pub fn add_scoped<T: Component>(&self) {
    self.add_component::<T>(None, Lifecycle::Scoped);
  }
  pub fn add_scoped_with_name<T: Component>(&self, name: &str) {
    self.add_component::<T>(Some(name), Lifecycle::Scoped);
  }
  pub fn add_transient<T: Component>(&self) {
    self.add_component::<T>(None, Lifecycle::Transient);
  }
  pub fn add_transient_with_name<T: Component>(&self, name: &str) {
    self.add_component::<T>(Some(name), Lifecycle::Transient);
  }

  // --- Factory Registration ---
  pub fn add_factory<I, F, E>(&self, lifecycle: Lifecycle, factory: F)
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&Context) -> std::result::Result<Arc<I>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
  {
    let strategy = factory_strategy::<I, F, E>(factory);
    self.insert::<I>(type_key::<I>(), lifecycle, strategy, TypeInfo::of::<I>());
  }
  pub fn add_factory_with_name<I, F, E>(&self, name: &str, lifecycle: Lifecycle, factory: F)
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&Context) -> std::result::Result<Arc<I>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
  {
    let strategy = factory_strategy::<I, F, E>(factory);
    self.insert::<I>(name.to_owned(), lifecycle, strategy, TypeInfo::of::<I>());
  }

  // --- Lookup ---
  pub fn lookup(&self, name: &str) -> Option<Arc<Descriptor>> {
    self.registry().lookup(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.registry().contains(name)
  }

  /// Every registered name, sorted.
  pub fn names(&self) -> Vec<String> {
    self.registry().names()
  }

  pub fn len(&self) -> usize {
    self.registry().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  // --- Scopes ---

  /// Opens a scope. It ends when the handle is ended or dropped.
  pub fn begin_scope(&self) -> ScopeHandle {
    ScopeHandle::new(self.shared.scopes.clone(), None)
  }

  /// Opens a scope that also ends when `token` is cancelled.
  pub fn begin_scope_with(&self, token: CancellationToken) -> ScopeHandle {
    ScopeHandle::new(self.shared.scopes.clone(), Some(token))
  }

  /// Ends the scope `id`. Returns `false` if it had already ended.
  pub fn end_scope(&self, id: ScopeId) -> bool {
    self.shared.scopes.end(id)
  }

  // --- Resolution ---

  /// Resolves `T`, by `type_key::<T>()` or by `name`.
  ///
  /// `Scoped` dependencies are cached in a private scope that ends when this
  /// call returns. Use [`get_scoped`](Self::get_scoped) to share them.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, name: Option<&str>) -> Result<Arc<T>> {
    let scope = self.begin_scope();
    let ctx = Context::new(self.clone(), scope.id(), None);
    self.get_in_context(&ctx, name)
  }

  /// Resolves `T` within `scope`.
  pub fn get_scoped<T: ?Sized + Any + Send + Sync>(
    &self,
    scope: &ScopeHandle,
    name: Option<&str>,
  ) -> Result<Arc<T>> {
    let ctx = Context::new(self.clone(), scope.id(), scope.cancellation().cloned());
    self.get_in_context(&ctx, name)
  }

  /// Resolves the dependency registered as `name` without downcasting it.
  pub fn resolve(&self, name: &str, scope: Option<&ScopeHandle>) -> Result<Instance> {
    match scope {
      Some(scope) => {
        let ctx = Context::new(self.clone(), scope.id(), scope.cancellation().cloned());
        self.resolve_in_context(&ctx, name)
      }
      None => {
        let scope = self.begin_scope();
        let ctx = Context::new(self.clone(), scope.id(), None);
        self.resolve_in_context(&ctx, name)
      }
    }
  }

  pub(crate) fn get_in_context<T: ?Sized + Any + Send + Sync>(
    &self,
    ctx: &Context,
    name: Option<&str>,
  ) -> Result<Arc<T>> {
    let key = name.map_or_else(type_key::<T>, str::to_owned);
    let Some(descriptor) = self.lookup(&key) else {
      // An unregistered container request is served by the container itself.
      if TypeId::of::<T>() == TypeId::of::<Container>() {
        let container = match name {
          Some(id) => self.sibling(id)?,
          None => self.clone(),
        };
        return downcast::<T>(&erase(Arc::new(container))).ok_or(Error::TypeMismatch {
          name: key,
          expected: std::any::type_name::<T>(),
          actual: std::any::type_name::<Container>(),
        });
      }
      return Err(Error::UnregisteredDependency(key));
    };

    let instance = resolver::resolve(ctx, &descriptor)?;
    downcast::<T>(&instance).ok_or_else(|| Error::TypeMismatch {
      name: key,
      expected: std::any::type_name::<T>(),
      actual: descriptor.interface().name(),
    })
  }

  pub(crate) fn resolve_in_context(&self, ctx: &Context, name: &str) -> Result<Instance> {
    let descriptor = self
      .lookup(name)
      .ok_or_else(|| Error::UnregisteredDependency(name.to_owned()))?;
    resolver::resolve(ctx, &descriptor)
  }

  /// This container if `id` is its own id, otherwise the container with
  /// that id from the store this container belongs to.
  pub(crate) fn sibling(&self, id: &str) -> Result<Container> {
    if id == self.id() {
      return Ok(self.clone());
    }
    self
      .shared
      .store
      .get()
      .and_then(Weak::upgrade)
      .and_then(|store| store.get(id))
      .ok_or_else(|| Error::UnknownContainer(id.to_owned()))
  }

  /// Builds the declared dependency tree of `name` without constructing
  /// anything.
  ///
  /// Each registration is expanded once per call and shared by every owner
  /// that declares it, so the cost is linear in the size of the reachable
  /// graph. `Display` and `find` still walk every path.
  pub fn dependency_tree(&self, name: &str) -> Result<DependencyTree> {
    DependencyTree::build(self, name)
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id())
      .field("registered", &self.len())
      .field("active_scopes", &self.scopes().active_scopes())
      .finish()
  }
}
