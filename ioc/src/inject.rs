//! Member injection for plain components.
//!
//! A [`Component`] is built from its `Default` value and then has each of
//! its declared members resolved and assigned, in declaration order. Members
//! are declared explicitly through setters; nothing is written behind the
//! component author's back.

use crate::config::ContainerConfig;
use crate::container::WeakContainer;
use crate::context::Context;
use crate::core::{downcast, erase, type_key, Instance};
use crate::error::{Error, Result};
use crate::resolver;
use std::any::Any;
use std::sync::Arc;

/// A type the container can build and inject without a factory.
///
/// # Examples
///
/// ```
/// use fibre_inject::{Component, Container, Members};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Component for Database {}
///
/// #[derive(Default)]
/// struct UserService {
///   db: Option<Arc<Database>>,
/// }
///
/// impl Component for UserService {
///   fn members(members: &mut Members<Self>) {
///     members.inject("db", |s: &mut Self, db: Arc<Database>| s.db = Some(db));
///   }
/// }
///
/// let container = Container::new();
/// container.add_singleton::<Database>();
/// container.add_transient::<UserService>();
///
/// let service = container.get::<UserService>(None).unwrap();
/// assert!(service.db.is_some());
/// ```
pub trait Component: Default + Send + Sync + 'static {
  /// Declares the injectable members of the component.
  fn members(members: &mut Members<Self>) {
    let _ = members;
  }
}

/// What a member is injected with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemberTarget {
  Dependency(String),
  /// The resolving container, or the container with this id from the same store.
  Container(Option<String>),
}

/// The declaration of one member, without its setter.
#[derive(Debug, Clone)]
pub(crate) struct MemberInfo {
  pub(crate) field: &'static str,
  pub(crate) target: MemberTarget,
  pub(crate) expected: &'static str,
  pub(crate) tagged: bool,
  pub(crate) excluded: bool,
  pub(crate) private: bool,
}

impl MemberInfo {
  pub(crate) fn is_injectable(&self, config: &ContainerConfig) -> bool {
    if self.excluded || (config.require_inject_tag && !self.tagged) {
      return false;
    }
    !self.private || config.allow_private_injection
  }

  pub(crate) fn dependency(&self) -> Option<&str> {
    match &self.target {
      MemberTarget::Dependency(name) => Some(name),
      MemberTarget::Container(_) => None,
    }
  }
}

enum Assigned {
  Instance(Instance),
  Container(WeakContainer),
}

type Setter<S> = Arc<dyn Fn(&mut S, Assigned) -> bool + Send + Sync>;

/// One declared member of a component.
pub struct Member<S> {
  info: MemberInfo,
  assign: Setter<S>,
}

impl<S> Member<S> {
  /// Injects the dependency registered as `name` instead of the type-derived default.
  ///
  /// On a container member, selects the container with id `name` from the
  /// store the resolving container belongs to.
  pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
    let name = name.into();
    self.info.target = match self.info.target {
      MemberTarget::Dependency(_) => MemberTarget::Dependency(name),
      MemberTarget::Container(_) => MemberTarget::Container(Some(name)),
    };
    self
  }

  /// Marks the member as explicitly requesting injection.
  pub fn tagged(&mut self) -> &mut Self {
    self.info.tagged = true;
    self
  }

  /// Marks the member as internal. It is only injected by containers that
  /// allow private injection.
  pub fn private(&mut self) -> &mut Self {
    self.info.private = true;
    self
  }

  /// Excludes the member from injection.
  pub fn exclude(&mut self) -> &mut Self {
    self.info.excluded = true;
    self
  }
}

/// The member declarations of a component, in declaration order.
pub struct Members<S> {
  items: Vec<Member<S>>,
}

impl<S: 'static> Members<S> {
  pub(crate) fn of() -> Self
  where
    S: Component,
  {
    let mut members = Self { items: Vec::new() };
    S::members(&mut members);
    members
  }

  /// Declares a member holding an `Arc<T>`, injected with the dependency
  /// named `type_key::<T>()`.
  pub fn inject<T, F>(&mut self, field: &'static str, set: F) -> &mut Member<S>
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&mut S, Arc<T>) + Send + Sync + 'static,
  {
    let assign: Setter<S> = Arc::new(move |target: &mut S, value: Assigned| match value {
      Assigned::Instance(instance) => match downcast::<T>(&instance) {
        Some(value) => {
          set(target, value);
          true
        }
        None => false,
      },
      Assigned::Container(_) => false,
    });
    self.push(field, MemberTarget::Dependency(type_key::<T>()), std::any::type_name::<T>(), assign)
  }

  /// Declares a member holding a handle to the resolving container.
  ///
  /// The handle is weak: the component does not keep the container alive.
  pub fn container<F>(&mut self, field: &'static str, set: F) -> &mut Member<S>
  where
    F: Fn(&mut S, WeakContainer) + Send + Sync + 'static,
  {
    let assign: Setter<S> = Arc::new(move |target: &mut S, value: Assigned| match value {
      Assigned::Container(container) => {
        set(target, container);
        true
      }
      Assigned::Instance(_) => false,
    });
    self.push(field, MemberTarget::Container(None), std::any::type_name::<WeakContainer>(), assign)
  }

  fn push(
    &mut self,
    field: &'static str,
    target: MemberTarget,
    expected: &'static str,
    assign: Setter<S>,
  ) -> &mut Member<S> {
    self.items.push(Member {
      info: MemberInfo {
        field,
        target,
        expected,
        tagged: false,
        excluded: false,
        private: false,
      },
      assign,
    });
    let last = self.items.len() - 1;
    &mut self.items[last]
  }
}

/// A component strategy stored on a descriptor.
#[derive(Clone)]
pub(crate) struct ComponentPlan {
  pub(crate) members: Arc<Vec<MemberInfo>>,
  build: Arc<dyn Fn(&Context, &str) -> Result<Instance> + Send + Sync>,
}

impl ComponentPlan {
  pub(crate) fn new<I, V, U>(upcast: U) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    V: Component,
    U: Fn(Arc<V>) -> Arc<I> + Send + Sync + 'static,
  {
    let members = Members::<V>::of().items;
    let infos = members.iter().map(|member| member.info.clone()).collect();
    Self {
      members: Arc::new(infos),
      build: Arc::new(move |ctx: &Context, owner: &str| {
        let mut value = V::default();
        inject(ctx, owner, &mut value, &members)?;
        Ok(erase(upcast(Arc::new(value))))
      }),
    }
  }

  pub(crate) fn build(&self, ctx: &Context, owner: &str) -> Result<Instance> {
    (self.build)(ctx, owner)
  }
}

/// Resolves and assigns every injectable member of `target`, stopping at the
/// first unrecoverable error.
fn inject<S>(ctx: &Context, owner: &str, target: &mut S, members: &[Member<S>]) -> Result<()> {
  let container = ctx.container();
  let config = container.config();

  for member in members {
    let info = &member.info;
    if !info.is_injectable(config) {
      tracing::trace!(target: "fibre_inject", owner, field = info.field, "member skipped");
      continue;
    }

    let (name, value, actual) = match &info.target {
      MemberTarget::Container(id) => {
        let resolved = match id {
          Some(id) => container.sibling(id)?,
          None => container.clone(),
        };
        (resolved.id().to_owned(), Assigned::Container(resolved.downgrade()), info.expected)
      }
      MemberTarget::Dependency(name) => {
        let Some(descriptor) = container.lookup(name) else {
          if config.allow_missing_dependencies {
            container.logger().warn(format!(
              "{owner} has a dependency on {name}, but it is not registered"
            ));
            continue;
          }
          return Err(Error::MissingDependency {
            owner: owner.to_owned(),
            dependency: name.clone(),
          });
        };
        let instance = resolver::resolve(ctx, &descriptor)?;
        (name.clone(), Assigned::Instance(instance), descriptor.interface().name())
      }
    };

    if !(member.assign)(target, value) {
      return Err(Error::TypeMismatch {
        name,
        expected: info.expected,
        actual,
      });
    }
  }

  Ok(())
}
