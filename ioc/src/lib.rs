//! # Fibre Inject
//!
//! A thread-safe dependency injection container for Rust.
//!
//! Fibre Inject resolves a request for a root type into a fully wired
//! instance, recursively constructing and injecting its declared
//! dependencies according to their lifecycle.
//!
//! ## Core Concepts
//!
//! - **Container**: The registry of one dependency graph. Registration may
//!   happen at any time, and a `Container` handle can be cloned and shared
//!   across threads.
//! - **Lifecycles**: `Transient` dependencies are built on every request,
//!   `Scoped` ones once per scope and `Singleton` ones once per container.
//! - **Strategies**: A dependency is produced by a ready instance, a
//!   factory, a declared constructor whose parameters are resolved first, or
//!   a [`Component`] whose members are injected after construction.
//! - **Safety checks**: Circular dependencies and shorter-lived dependencies
//!   captured by longer-lived owners are reported as errors. Both the
//!   captive check and missing member dependencies can be relaxed to
//!   warnings through [`ContainerConfig`].
//! - **Stores**: A [`ContainerStore`] holds several containers by id, one of
//!   them the default.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Component, Container, Lifecycle, Members};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     (*self.message).clone()
//!   }
//! }
//!
//! #[derive(Default)]
//! struct App {
//!   greeter: Option<Arc<dyn Greeter>>,
//! }
//!
//! impl Component for App {
//!   fn members(members: &mut Members<Self>) {
//!     members.inject("greeter", |app: &mut Self, greeter: Arc<dyn Greeter>| {
//!       app.greeter = Some(greeter)
//!     });
//!   }
//! }
//!
//! fn main() -> fibre_inject::Result<()> {
//!   let container = Container::new();
//!   container.add_instance(String::from("Hello, World!"));
//!
//!   // The constructor's parameters are resolved before it is called.
//!   container
//!     .register::<dyn Greeter>()
//!     .lifecycle(Lifecycle::Singleton)
//!     .constructor(|message: Arc<String>| {
//!       Ok::<_, std::convert::Infallible>(Arc::new(EnglishGreeter { message }) as Arc<dyn Greeter>)
//!     })
//!     .register()?;
//!
//!   container.add_transient::<App>();
//!
//!   let app = container.get::<App>(None)?;
//!   assert_eq!(app.greeter.as_ref().unwrap().greet(), "Hello, World!");
//!   Ok(())
//! }
//! ```

mod config;
mod constructor;
mod container;
mod context;
mod core;
mod descriptor;
mod error;
mod inject;
mod lifecycle;
mod logging;
mod macros;
mod registry;
mod resolver;
mod scope;
mod store;
mod tree;

pub use config::{ContainerConfig, DEFAULT_CONTAINER_ID};
pub use constructor::{Arg, Constructor, Param, ParamKind};
pub use container::{Container, WeakContainer};
pub use context::Context;
pub use core::{type_key, Instance, TypeInfo};
pub use descriptor::{Descriptor, StrategyKind};
pub use error::{BoxError, Error, Result};
pub use inject::{Component, Member, Members};
pub use lifecycle::Lifecycle;
pub use logging::{LogFn, LogLevel, LoggerConfig};
pub use registry::Registration;
pub use scope::{CancellationToken, ScopeHandle, ScopeId, ScopeStore};
pub use store::ContainerStore;
pub use tree::DependencyTree;
