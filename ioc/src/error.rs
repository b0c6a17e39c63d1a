use crate::lifecycle::Lifecycle;
use crate::scope::ScopeId;
use thiserror::Error;

/// A boxed error returned by user factories and constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for every fallible `fibre_inject` operation.
#[derive(Debug, Error)]
pub enum Error {
  /// A top-level lookup named a dependency that was never registered.
  #[error("dependency '{0}' is not registered")]
  UnregisteredDependency(String),

  /// An injectable member or constructor parameter has no registration.
  #[error("'{owner}' has a dependency on '{dependency}', but it is not registered")]
  MissingDependency { owner: String, dependency: String },

  /// The dependency re-entered its own resolution chain.
  #[error("circular dependency detected for '{name}'. Dependency chain: {}", .chain.join(" -> "))]
  CircularDependency { name: String, chain: Vec<String> },

  /// A shorter-lived dependency was requested by a longer-lived ancestor.
  #[error(
    "captive dependency error: {lifecycle} dependency '{name}' is required by {ancestor_lifecycle} '{ancestor}'"
  )]
  CaptiveDependency {
    name: String,
    lifecycle: Lifecycle,
    ancestor: String,
    ancestor_lifecycle: Lifecycle,
  },

  #[error("invalid lifecycle '{0}', must be one of transient, scoped, singleton")]
  InvalidLifecycle(String),

  /// A registration was finished without a factory, constructor or component strategy.
  #[error(
    "dependency '{name}' has type '{type_name}' which is not a component. Register it with a factory, a constructor or as an instance"
  )]
  NotAStruct { name: String, type_name: &'static str },

  /// A factory or constructor returned an error.
  #[error("failed to construct '{name}': {source}")]
  Construction { name: String, source: BoxError },

  #[error("dependency '{name}' resolves to '{actual}', which is not '{expected}'")]
  TypeMismatch {
    name: String,
    expected: &'static str,
    actual: &'static str,
  },

  #[error("{0} is not active")]
  ScopeNotActive(ScopeId),

  #[error("container id cannot be empty")]
  EmptyContainerId,

  #[error("container with id '{0}' already exists")]
  DuplicateContainer(String),

  #[error("container with id '{0}' does not exist")]
  UnknownContainer(String),

  #[error("invalid log level '{0}', must be one of info, warn, error, fatal")]
  InvalidLogLevel(String),
}

impl Error {
  /// Wraps an error produced by user code while constructing `name`.
  ///
  /// Errors that already are an `Error` (for example a failed nested
  /// resolution bubbled up with `?`) are returned unchanged.
  pub(crate) fn construction(name: &str, err: impl Into<BoxError>) -> Self {
    match err.into().downcast::<Error>() {
      Ok(inner) => *inner,
      Err(source) => Error::Construction {
        name: name.to_owned(),
        source,
      },
    }
  }

  /// The resolution chain of a `CircularDependency` error.
  pub fn chain(&self) -> Option<&[String]> {
    match self {
      Error::CircularDependency { chain, .. } => Some(chain),
      _ => None,
    }
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
