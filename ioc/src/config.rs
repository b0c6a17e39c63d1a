//! Behavioral configuration of a `Container`.

use crate::logging::LoggerConfig;

/// Identifier given to containers created without an explicit id.
pub const DEFAULT_CONTAINER_ID: &str = "default";

/// Configuration of a `Container`.
///
/// Every flag defaults to the strict behavior: captive and missing
/// dependencies are errors, untagged members are injected and private
/// members are skipped.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerConfig {
  /// Identifier of the container inside a `ContainerStore`.
  pub id: String,
  /// Downgrades captive dependency errors to warnings. The shorter-lived
  /// dependency is then held at its owner's lifetime.
  pub allow_captive_dependencies: bool,
  /// Leaves members without a registration unset instead of failing.
  pub allow_missing_dependencies: bool,
  /// Only injects members declared with `Member::tagged`.
  pub require_inject_tag: bool,
  /// Injects members declared with `Member::private`.
  pub allow_private_injection: bool,
  pub logger: LoggerConfig,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      id: DEFAULT_CONTAINER_ID.to_owned(),
      allow_captive_dependencies: false,
      allow_missing_dependencies: false,
      require_inject_tag: false,
      allow_private_injection: false,
      logger: LoggerConfig::default(),
    }
  }
}

impl ContainerConfig {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  /// A configuration that downgrades captive and missing dependencies to
  /// warnings.
  pub fn permissive(id: impl Into<String>) -> Self {
    Self::new(id)
      .allow_captive_dependencies(true)
      .allow_missing_dependencies(true)
  }

  pub fn id(mut self, id: impl Into<String>) -> Self {
    self.id = id.into();
    self
  }

  pub fn allow_captive_dependencies(mut self, allow: bool) -> Self {
    self.allow_captive_dependencies = allow;
    self
  }

  pub fn allow_missing_dependencies(mut self, allow: bool) -> Self {
    self.allow_missing_dependencies = allow;
    self
  }

  pub fn require_inject_tag(mut self, require: bool) -> Self {
    self.require_inject_tag = require;
    self
  }

  pub fn allow_private_injection(mut self, allow: bool) -> Self {
    self.allow_private_injection = allow;
    self
  }

  pub fn logger(mut self, logger: LoggerConfig) -> Self {
    self.logger = logger;
    self
  }
}
