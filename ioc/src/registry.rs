//! The type registry and the registration builder.

use crate::constructor::{Constructor, ConstructorPlan};
use crate::container::Container;
use crate::context::Context;
use crate::core::{erase, type_key, TypeInfo};
use crate::descriptor::{Descriptor, Strategy};
use crate::error::{BoxError, Error, Result};
use crate::inject::{Component, ComponentPlan};
use crate::lifecycle::Lifecycle;
use dashmap::DashMap;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Maps dependency names to their descriptors.
#[derive(Default)]
pub(crate) struct Registry {
  descriptors: DashMap<String, Arc<Descriptor>>,
}

impl Registry {
  /// Stores `descriptor`, replacing any previous registration of its name.
  pub(crate) fn insert(&self, descriptor: Descriptor) {
    self
      .descriptors
      .insert(descriptor.name().to_owned(), Arc::new(descriptor));
  }

  /// Looks up `name`. The map guard is released before returning, so the
  /// caller may run user code with the descriptor.
  pub(crate) fn lookup(&self, name: &str) -> Option<Arc<Descriptor>> {
    self.descriptors.get(name).map(|entry| entry.value().clone())
  }

  pub(crate) fn contains(&self, name: &str) -> bool {
    self.descriptors.contains_key(name)
  }

  pub(crate) fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.descriptors.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
  }

  pub(crate) fn len(&self) -> usize {
    self.descriptors.len()
  }
}

/// A pending registration of the interface type `I`.
///
/// Created by `Container::register`. Choose a creation strategy with
/// [`factory`](Self::factory), [`constructor`](Self::constructor),
/// [`implemented_by`](Self::implemented_by), [`as_component`](Self::as_component)
/// or [`instance`](Self::instance), then call [`register`](Self::register).
///
/// # Examples
///
/// ```
/// use fibre_inject::{Container, Lifecycle};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///   fn now(&self) -> u64;
/// }
/// struct FixedClock;
/// impl Clock for FixedClock {
///   fn now(&self) -> u64 {
///     42
///   }
/// }
///
/// let container = Container::new();
/// container
///   .register::<dyn Clock>()
///   .lifecycle(Lifecycle::Singleton)
///   .constructor(|| Ok::<_, std::convert::Infallible>(Arc::new(FixedClock) as Arc<dyn Clock>))
///   .register()
///   .unwrap();
///
/// assert_eq!(container.get::<dyn Clock>(None).unwrap().now(), 42);
/// ```
#[must_use = "a registration does nothing until `register` is called"]
pub struct Registration<'c, I: ?Sized> {
  container: &'c Container,
  names: Vec<String>,
  lifecycle: std::result::Result<Lifecycle, String>,
  strategy: Option<(Strategy, TypeInfo)>,
  _interface: PhantomData<fn() -> Arc<I>>,
}

impl<'c, I: ?Sized + Any + Send + Sync> Registration<'c, I> {
  pub(crate) fn new(container: &'c Container) -> Self {
    Self {
      container,
      names: Vec::new(),
      lifecycle: Ok(Lifecycle::Transient),
      strategy: None,
      _interface: PhantomData,
    }
  }

  /// Registers under `name` instead of `type_key::<I>()`.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    match self.names.first_mut() {
      Some(first) => *first = name.into(),
      None => self.names.push(name.into()),
    }
    self
  }

  /// Registers the same strategy under an additional name. Each name gets its
  /// own descriptor, so singletons are cached per name.
  pub fn also_named(mut self, name: impl Into<String>) -> Self {
    if self.names.is_empty() {
      self.names.push(type_key::<I>());
    }
    self.names.push(name.into());
    self
  }

  /// Sets the lifecycle. Defaults to `Lifecycle::Transient`.
  pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
    self.lifecycle = Ok(lifecycle);
    self
  }

  /// Sets the lifecycle from its textual tag. An unknown tag makes
  /// `register` fail with `Error::InvalidLifecycle`.
  pub fn lifecycle_tag(mut self, tag: &str) -> Self {
    self.lifecycle = tag.parse::<Lifecycle>().map_err(|_| tag.to_owned());
    self
  }

  /// Produces instances with a custom factory.
  pub fn factory<F, E>(mut self, factory: F) -> Self
  where
    F: Fn(&Context) -> std::result::Result<Arc<I>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
  {
    self.strategy = Some((factory_strategy::<I, F, E>(factory), TypeInfo::of::<I>()));
    self
  }

  /// Produces instances with a declared constructor whose parameters are
  /// resolved first.
  pub fn constructor<Args, C>(mut self, ctor: C) -> Self
  where
    C: Constructor<I, Args>,
  {
    let strategy = Strategy::Constructor(ConstructorPlan::new::<I, Args, C>(ctor));
    self.strategy = Some((strategy, TypeInfo::of::<I>()));
    self
  }

  /// Builds the component `V` by member injection and exposes it as `I`.
  pub fn implemented_by<V, U>(mut self, upcast: U) -> Self
  where
    V: Component,
    U: Fn(Arc<V>) -> Arc<I> + Send + Sync + 'static,
  {
    let strategy = Strategy::Component(ComponentPlan::new::<I, V, U>(upcast));
    self.strategy = Some((strategy, TypeInfo::of::<V>()));
    self
  }

  /// Registers a ready value. Instances are always singletons, even if
  /// `lifecycle` is called afterwards.
  pub fn instance(mut self, value: Arc<I>) -> Self {
    self.strategy = Some((Strategy::Instance(erase(value)), TypeInfo::of::<I>()));
    self
  }

  /// Stores the descriptor, replacing previous registrations of its names.
  pub fn register(self) -> Result<()> {
    let lifecycle = self.lifecycle.map_err(Error::InvalidLifecycle)?;
    let mut names = self.names;
    if names.is_empty() {
      names.push(type_key::<I>());
    }

    let Some((strategy, value_type)) = self.strategy else {
      return Err(Error::NotAStruct {
        name: names.swap_remove(0),
        type_name: std::any::type_name::<I>(),
      });
    };
    let lifecycle = match strategy {
      Strategy::Instance(_) => Lifecycle::Singleton,
      _ => lifecycle,
    };

    for name in names {
      self
        .container
        .insert::<I>(name, lifecycle, strategy.clone(), value_type);
    }
    Ok(())
  }
}

impl<'c, V: Component> Registration<'c, V> {
  /// Builds `V` itself by member injection.
  pub fn as_component(self) -> Self {
    self.implemented_by::<V, _>(|value| value)
  }
}

/// Wraps a typed factory into an erased strategy. Errors from the factory
/// are attributed to the dependency being constructed.
pub(crate) fn factory_strategy<I, F, E>(factory: F) -> Strategy
where
  I: ?Sized + Any + Send + Sync,
  F: Fn(&Context) -> std::result::Result<Arc<I>, E> + Send + Sync + 'static,
  E: Into<BoxError>,
{
  Strategy::Factory(Arc::new(move |ctx: &Context, owner: &str| {
    factory(ctx)
      .map(erase)
      .map_err(|err| Error::construction(owner, err))
  }))
}
