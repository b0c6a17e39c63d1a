//! Lifecycle policies and the captive dependency rule.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The caching policy of a registered dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lifecycle {
  /// A new instance is created for every resolution.
  Transient,
  /// One instance per scope, released when the scope ends.
  Scoped,
  /// One instance for the lifetime of the container.
  Singleton,
}

impl Lifecycle {
  /// Every lifecycle, shortest-lived first.
  pub const ALL: [Lifecycle; 3] = [Lifecycle::Transient, Lifecycle::Scoped, Lifecycle::Singleton];

  pub fn as_str(&self) -> &'static str {
    match self {
      Lifecycle::Transient => "transient",
      Lifecycle::Scoped => "scoped",
      Lifecycle::Singleton => "singleton",
    }
  }

  /// Returns `true` if a dependency with this lifecycle may be held by an
  /// owner with the `owner` lifecycle without outliving its intended scope.
  ///
  /// Transient dependencies may only be held by transient owners, scoped ones
  /// by scoped or transient owners. Singletons may be held by anyone.
  pub fn can_be_held_by(&self, owner: Lifecycle) -> bool {
    match self {
      Lifecycle::Transient => owner == Lifecycle::Transient,
      Lifecycle::Scoped => owner != Lifecycle::Singleton,
      Lifecycle::Singleton => true,
    }
  }
}

impl fmt::Display for Lifecycle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Lifecycle {
  type Err = Error;

  fn from_str(tag: &str) -> Result<Self> {
    match tag.trim().to_ascii_lowercase().as_str() {
      "transient" => Ok(Lifecycle::Transient),
      "scoped" => Ok(Lifecycle::Scoped),
      "singleton" => Ok(Lifecycle::Singleton),
      _ => Err(Error::InvalidLifecycle(tag.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_tags_case_insensitively() {
    assert_eq!("Singleton".parse::<Lifecycle>().unwrap(), Lifecycle::Singleton);
    assert_eq!(" scoped ".parse::<Lifecycle>().unwrap(), Lifecycle::Scoped);
    assert_eq!("TRANSIENT".parse::<Lifecycle>().unwrap(), Lifecycle::Transient);
  }

  #[test]
  fn rejects_unknown_tags() {
    let err = "request".parse::<Lifecycle>().unwrap_err();
    assert!(matches!(err, Error::InvalidLifecycle(tag) if tag == "request"));
  }

  #[test]
  fn captive_rule_matrix() {
    use Lifecycle::*;
    assert!(Transient.can_be_held_by(Transient));
    assert!(!Transient.can_be_held_by(Scoped));
    assert!(!Transient.can_be_held_by(Singleton));
    assert!(Scoped.can_be_held_by(Transient));
    assert!(Scoped.can_be_held_by(Scoped));
    assert!(!Scoped.can_be_held_by(Singleton));
    for owner in Lifecycle::ALL {
      assert!(Singleton.can_be_held_by(owner));
    }
  }
}
