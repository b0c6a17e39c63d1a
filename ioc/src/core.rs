//! Core, mostly non-public data structures shared by the resolver, the
//! injector and the registry.

use crate::lifecycle::Lifecycle;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A type-erased resolved value.
///
/// The erased value is always an `Arc<T>` for the interface type `T` of its
/// descriptor, which is what allows unsized trait objects to be stored.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) fn erase<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Instance {
  Arc::new(value)
}

pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(instance: &Instance) -> Option<Arc<T>> {
  (**instance).downcast_ref::<Arc<T>>().cloned()
}

/// The default dependency name of a type.
pub fn type_key<T: ?Sized + Any>() -> String {
  std::any::type_name::<T>().to_owned()
}

/// Identity of a registered type: its `TypeId` and its readable name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
  id: TypeId,
  name: &'static str,
}

impl TypeInfo {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeInfo({})", self.name)
  }
}

thread_local! {
  // The dependencies currently being resolved on this thread, outermost
  // first. Factories and constructors that resolve further dependencies run
  // on the same call stack, so they extend the same chain.
  static RESOLUTION_CHAIN: RefCell<Vec<Link>> = const { RefCell::new(Vec::new()) };
}

/// One entry of the resolution chain.
#[derive(Debug, Clone)]
pub(crate) struct Link {
  pub(crate) container: u64,
  pub(crate) name: String,
  pub(crate) lifecycle: Lifecycle,
}

/// An RAII guard that keeps a dependency on the resolution chain.
///
/// Dropping the guard truncates the chain back to the length it had before
/// the dependency was entered, so error and panic paths unwind it as well.
pub(crate) struct ResolutionGuard {
  depth: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(link: Link) -> Self {
    RESOLUTION_CHAIN.with(|chain| {
      let mut chain = chain.borrow_mut();
      let depth = chain.len();
      chain.push(link);
      Self { depth }
    })
  }

  /// The in-progress resolutions of `container` on this thread, outermost first.
  pub(crate) fn ancestors(container: u64) -> Vec<Link> {
    RESOLUTION_CHAIN.with(|chain| {
      chain
        .borrow()
        .iter()
        .filter(|link| link.container == container)
        .cloned()
        .collect()
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLUTION_CHAIN.with(|chain| {
      chain.borrow_mut().truncate(self.depth);
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link(container: u64, name: &str) -> Link {
    Link {
      container,
      name: name.to_owned(),
      lifecycle: Lifecycle::Transient,
    }
  }

  #[test]
  fn guards_unwind_the_chain_in_order() {
    let outer = ResolutionGuard::enter(link(1, "a"));
    {
      let _inner = ResolutionGuard::enter(link(1, "b"));
      let _other = ResolutionGuard::enter(link(2, "x"));
      let names: Vec<_> = ResolutionGuard::ancestors(1).into_iter().map(|l| l.name).collect();
      assert_eq!(names, vec!["a", "b"]);
    }
    assert_eq!(ResolutionGuard::ancestors(1).len(), 1);
    assert!(ResolutionGuard::ancestors(2).is_empty());
    drop(outer);
    assert!(ResolutionGuard::ancestors(1).is_empty());
  }

  #[test]
  fn erased_values_round_trip_through_trait_objects() {
    trait Speak: Send + Sync {
      fn speak(&self) -> &'static str;
    }
    struct Dog;
    impl Speak for Dog {
      fn speak(&self) -> &'static str {
        "woof"
      }
    }

    let instance = erase::<dyn Speak>(Arc::new(Dog));
    assert_eq!(downcast::<dyn Speak>(&instance).unwrap().speak(), "woof");
    assert!(downcast::<Dog>(&instance).is_none());
  }
}
