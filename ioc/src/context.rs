//! The resolution context handed to factories and constructors.

use crate::container::Container;
use crate::core::Instance;
use crate::error::Result;
use crate::scope::{CancellationToken, ScopeId};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The active resolution context: the container, the scope and the optional
/// cancellation token of the unit of work being resolved.
///
/// Dependencies resolved through a context share its scope, and when they are
/// resolved from inside a factory or a constructor they continue the
/// caller's resolution chain, so cycles and captive dependencies through
/// factories are detected as well.
///
/// A context holds its container strongly. Use it during construction and
/// keep a [`WeakContainer`](crate::WeakContainer) instead of storing it in a
/// cached instance, or the container can never be dropped.
#[derive(Clone)]
pub struct Context {
  container: Container,
  scope: ScopeId,
  cancellation: Option<CancellationToken>,
}

impl Context {
  pub(crate) fn new(
    container: Container,
    scope: ScopeId,
    cancellation: Option<CancellationToken>,
  ) -> Self {
    Self {
      container,
      scope,
      cancellation,
    }
  }

  pub fn container(&self) -> &Container {
    &self.container
  }

  pub fn scope(&self) -> ScopeId {
    self.scope
  }

  pub fn cancellation(&self) -> Option<&CancellationToken> {
    self.cancellation.as_ref()
  }

  pub fn is_cancelled(&self) -> bool {
    self
      .cancellation
      .as_ref()
      .is_some_and(CancellationToken::is_cancelled)
  }

  /// Resolves `T` in this context's scope.
  ///
  /// Without a name the dependency is looked up by `type_key::<T>()`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, name: Option<&str>) -> Result<Arc<T>> {
    self.container.get_in_context(self, name)
  }

  /// Resolves the dependency registered as `name` without downcasting it.
  pub fn resolve(&self, name: &str) -> Result<Instance> {
    self.container.resolve_in_context(self, name)
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("container", &self.container.id())
      .field("scope", &self.scope)
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}
