//! Static dependency trees.
//!
//! A tree is built from the declared dependencies of each registration
//! (component members and constructor parameters) without constructing
//! anything. Factories are opaque and appear as leaves.
//!
//! A dependency reached along several edges is expanded once per build and
//! shared between its owners, so diamond-shaped graphs stay linear in the
//! number of registrations.

use crate::container::Container;
use crate::error::{Error, Result};
use crate::lifecycle::Lifecycle;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

type Built = HashMap<String, Arc<DependencyTree>>;

/// The declared dependencies of one registration, recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
  name: String,
  /// `None` for a dependency that is declared but not registered.
  lifecycle: Option<Lifecycle>,
  children: Vec<Arc<DependencyTree>>,
}

impl DependencyTree {
  pub(crate) fn build(container: &Container, name: &str) -> Result<Self> {
    if !container.contains(name) {
      return Err(Error::UnregisteredDependency(name.to_owned()));
    }
    let mut built = Built::new();
    let root = Self::node(container, name, &mut Vec::new(), &mut built)?;
    drop(built);
    Ok(Arc::try_unwrap(root).unwrap_or_else(|shared| (*shared).clone()))
  }

  fn node(
    container: &Container,
    name: &str,
    path: &mut Vec<String>,
    built: &mut Built,
  ) -> Result<Arc<Self>> {
    // A finished subtree never reaches a name still on the path.
    if let Some(done) = built.get(name) {
      return Ok(done.clone());
    }
    if let Some(start) = path.iter().position(|ancestor| ancestor == name) {
      let mut chain = path[start..].to_vec();
      chain.push(name.to_owned());
      return Err(Error::CircularDependency {
        name: name.to_owned(),
        chain,
      });
    }

    let Some(descriptor) = container.lookup(name) else {
      let owner = path.last().cloned().unwrap_or_default();
      if !container.config().allow_missing_dependencies {
        return Err(Error::MissingDependency {
          owner,
          dependency: name.to_owned(),
        });
      }
      return Ok(Arc::new(Self {
        name: name.to_owned(),
        lifecycle: None,
        children: Vec::new(),
      }));
    };

    path.push(name.to_owned());
    let children = descriptor
      .declared_dependencies(container.config())
      .iter()
      .map(|dependency| Self::node(container, dependency, path, built))
      .collect::<Result<Vec<_>>>();
    path.pop();

    let node = Arc::new(Self {
      name: name.to_owned(),
      lifecycle: Some(descriptor.lifecycle()),
      children: children?,
    });
    built.insert(name.to_owned(), node.clone());
    Ok(node)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn lifecycle(&self) -> Option<Lifecycle> {
    self.lifecycle
  }

  /// The direct dependencies. A dependency shared by several owners is the
  /// same `Arc` in each of them.
  pub fn children(&self) -> &[Arc<DependencyTree>] {
    &self.children
  }

  pub fn is_registered(&self) -> bool {
    self.lifecycle.is_some()
  }

  /// The first node named `name`, depth first.
  pub fn find(&self, name: &str) -> Option<&DependencyTree> {
    if self.name == name {
      return Some(self);
    }
    self.children.iter().find_map(|child| child.find(name))
  }

  /// Checks every node against all of its ancestors for captive
  /// dependencies. Returns the first violation found, depth first.
  pub fn validate_lifecycles(&self) -> Result<()> {
    self.validate_under(&mut Vec::new(), &mut HashSet::new())
  }

  // Whether a subtree passes depends only on its longest-lived ancestor, so
  // each (name, strictest ancestor) pair is checked once.
  fn validate_under<'a>(
    &'a self,
    ancestors: &mut Vec<(&'a str, Lifecycle)>,
    passed: &mut HashSet<(&'a str, usize)>,
  ) -> Result<()> {
    let strictest = ancestors.iter().map(|(_, owner)| rank(*owner)).max().unwrap_or(0);
    if passed.contains(&(self.name.as_str(), strictest)) {
      return Ok(());
    }
    if let Some(lifecycle) = self.lifecycle {
      if let Some((ancestor, ancestor_lifecycle)) = ancestors
        .iter()
        .find(|(_, owner)| !lifecycle.can_be_held_by(*owner))
      {
        return Err(Error::CaptiveDependency {
          name: self.name.clone(),
          lifecycle,
          ancestor: (*ancestor).to_owned(),
          ancestor_lifecycle: *ancestor_lifecycle,
        });
      }
      ancestors.push((self.name.as_str(), lifecycle));
    }

    let result = self
      .children
      .iter()
      .try_for_each(|child| child.validate_under(ancestors, passed));
    if self.lifecycle.is_some() {
      ancestors.pop();
    }
    if result.is_ok() {
      passed.insert((self.name.as_str(), strictest));
    }
    result
  }

  fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let lifecycle = self.lifecycle.map_or("missing", |l| l.as_str());
    writeln!(f, "{:indent$}{} ({})", "", self.name, lifecycle, indent = depth * 2)?;
    for child in &self.children {
      child.write_indented(f, depth + 1)?;
    }
    Ok(())
  }
}

/// Position of `lifecycle` from shortest to longest lived. An owner of higher
/// rank accepts a subset of the dependencies a lower one accepts.
fn rank(lifecycle: Lifecycle) -> usize {
  Lifecycle::ALL
    .iter()
    .position(|candidate| *candidate == lifecycle)
    .unwrap_or(0)
}

impl fmt::Display for DependencyTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.write_indented(f, 0)
  }
}
