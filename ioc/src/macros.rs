//! Public macros for ergonomic resolution.

/// Resolves a dependency from a container or a resolution context, panicking
/// if it cannot be resolved.
///
/// The first argument is anything with a `get::<T>(Option<&str>)` method,
/// which covers [`Container`](crate::Container) and
/// [`Context`](crate::Context).
///
/// # Panics
///
/// Panics with the resolution error if the dependency cannot be resolved.
/// For a non-panicking version, call `get` directly.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve, Container};
///
/// let container = Container::new();
/// container.add_instance(String::from("hello"));
///
/// let message = resolve!(container, String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use fibre_inject::{resolve, Container};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container.add_instance_arc_with_name::<dyn Greeter>("english", Arc::new(EnglishGreeter));
///
/// let greeter = resolve!(container, trait Greeter, "english");
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // Trait arms come first: `trait Foo` would otherwise be tried as a type.
  ($source:expr, trait $trait_ident:ident) => {
    $source
      .get::<dyn $trait_ident>(None)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required trait dependency {}: {}",
          std::any::type_name::<dyn $trait_ident>(),
          err
        )
      })
  };

  ($source:expr, trait $trait_ident:ident, $name:expr) => {
    $source
      .get::<dyn $trait_ident>(Some($name))
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required trait dependency with name '{}': {}",
          $name, err
        )
      })
  };

  ($source:expr, $type:ty) => {
    $source
      .get::<$type>(None)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required dependency {}: {}",
          std::any::type_name::<$type>(),
          err
        )
      })
  };

  ($source:expr, $type:ty, $name:expr) => {
    $source
      .get::<$type>(Some($name))
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required dependency with name '{}': {}",
          $name, err
        )
      })
  };
}
