//! Dependency descriptors: what the registry stores for each name.

use crate::config::ContainerConfig;
use crate::constructor::{ConstructorPlan, ParamKind};
use crate::context::Context;
use crate::core::{Instance, TypeInfo};
use crate::error::Result;
use crate::inject::ComponentPlan;
use crate::lifecycle::Lifecycle;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

pub(crate) type FactoryFn = Arc<dyn Fn(&Context, &str) -> Result<Instance> + Send + Sync>;

/// How a descriptor produces its instance.
#[derive(Clone)]
pub(crate) enum Strategy {
  /// A ready value supplied at registration.
  Instance(Instance),
  Factory(FactoryFn),
  Constructor(ConstructorPlan),
  Component(ComponentPlan),
}

/// The public view of a descriptor's creation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
  Instance,
  Factory,
  Constructor,
  Component,
}

/// The registration of one dependency name.
pub struct Descriptor {
  name: String,
  interface: TypeInfo,
  value_type: TypeInfo,
  lifecycle: Lifecycle,
  pub(crate) strategy: Strategy,
  /// The singleton instance, once produced.
  pub(crate) cached: OnceCell<Instance>,
}

impl Descriptor {
  pub(crate) fn new(
    name: String,
    interface: TypeInfo,
    value_type: TypeInfo,
    lifecycle: Lifecycle,
    strategy: Strategy,
  ) -> Self {
    let cached = match &strategy {
      Strategy::Instance(value) => OnceCell::with_value(value.clone()),
      _ => OnceCell::new(),
    };
    Self {
      name,
      interface,
      value_type,
      lifecycle,
      strategy,
      cached,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The type callers ask for.
  pub fn interface(&self) -> TypeInfo {
    self.interface
  }

  /// The concrete type that is instantiated.
  pub fn value_type(&self) -> TypeInfo {
    self.value_type
  }

  pub fn lifecycle(&self) -> Lifecycle {
    self.lifecycle
  }

  pub fn strategy(&self) -> StrategyKind {
    match self.strategy {
      Strategy::Instance(_) => StrategyKind::Instance,
      Strategy::Factory(_) => StrategyKind::Factory,
      Strategy::Constructor(_) => StrategyKind::Constructor,
      Strategy::Component(_) => StrategyKind::Component,
    }
  }

  /// Returns `true` once a singleton instance has been produced.
  pub fn is_cached(&self) -> bool {
    self.cached.get().is_some()
  }

  /// The names this descriptor depends on, as declared by its constructor
  /// parameters or its injectable members. Factories declare nothing.
  pub(crate) fn declared_dependencies(&self, config: &ContainerConfig) -> Vec<String> {
    match &self.strategy {
      Strategy::Instance(_) | Strategy::Factory(_) => Vec::new(),
      Strategy::Constructor(plan) => plan
        .params
        .iter()
        .filter_map(|param| match param {
          ParamKind::Dependency { name, .. } => Some(name.clone()),
          ParamKind::Container | ParamKind::Context => None,
        })
        .collect(),
      Strategy::Component(plan) => plan
        .members
        .iter()
        .filter(|member| member.is_injectable(config))
        .filter_map(|member| member.dependency().map(str::to_owned))
        .collect(),
    }
  }
}

impl fmt::Debug for Descriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Descriptor")
      .field("name", &self.name)
      .field("interface", &self.interface)
      .field("value_type", &self.value_type)
      .field("lifecycle", &self.lifecycle)
      .field("strategy", &self.strategy())
      .field("cached", &self.is_cached())
      .finish()
  }
}
