//! Weave DI builds a graph of named services from their declarative definitions.
//!
//! A build runs in the following steps:
//! 1. Every definition is validated and turned into the [`DependencyGraph`],
//!    a service depends on every `@name` found in its arguments
//! 2. The graph is checked for circular dependencies and assigned to [`Levels`]
//! 3. Services are constructed in dependency order, either level by level or
//!    along a [`DependencyTree`], with `$scalar` and `@service` placeholders substituted
//! 4. The built services end up in a [`DiContainer`], keyed by name
//!
//! What a `module` / `class` pair refers to is decided by a [`ConstructorRegistry`].
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use weave_di::{from_fn, DiBuilder, Instance, StaticRegistry};
//!
//! struct Greeter(String);
//!
//! let registry = StaticRegistry::new().add_constructor(
//!     "app",
//!     "Greeter",
//!     from_fn(|args: weave_di::CallArgs| {
//!         let name = args.get(0, "name").and_then(|arg| arg.as_str()).unwrap_or("world");
//!         Ok::<_, std::convert::Infallible>(Instance::new(Greeter(format!("Hello {name}"))))
//!     }),
//! );
//!
//! let builder = DiBuilder::from_value(
//!     registry,
//!     &json!({
//!         "scalars": { "name": "weave" },
//!         "services": { "greeter": { "module": "app", "class": "Greeter", "args": ["$name"] } },
//!     }),
//! )
//! .unwrap();
//!
//! let container = futures::executor::block_on(builder.build()).unwrap();
//! assert_eq!(container.require::<Greeter>("greeter").unwrap().0, "Hello weave");
//! ```

pub mod arguments;
pub mod builder;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
mod initiator;
pub mod levels;
pub mod reference;
pub mod registry;
pub mod tree;
pub mod types;

pub use arguments::{Argument, CallArgs};
pub use builder::{BuildOrder, DiBuilder};
pub use container::DiContainer;
pub use dependency_graph::{DependencyGraph, DependencyGraphError};
pub use errors::{ConstructorNotFound, InitError, ReferenceError, RequireError, UnknownMethod};
pub use factories::{from_fn, Constructible, Constructor, DynConstructible, Invocable};
pub use levels::{Levels, Solution};
pub use reference::ReferenceResolver;
pub use registry::{ConstructorRegistry, StaticRegistry, Symbol};
pub use tree::{DependencyTree, NodeId, TreeNode};
pub use types::{DynError, Injectable, Instance, TypeInfo};

pub use weave_config;
