//! Weave Config holds the declarative input of a service graph: what every service is
//! built from and which plain values it may refer to.
//!
//! Weave Config is split into the following parts:
//! 1. Definitions: one [`ServiceDefinition`] per service name, in declaration order
//! 2. ScalarProvider: the registry of scalar values referenced by `$name`
//! 3. Reference: recognition of `$name` / `@name` placeholders inside arguments
//! 4. Errors - for malformed or incomplete configurations
//!
//! Reading configuration files is up to the caller, definitions are taken from an
//! already parsed [`serde_json::Value`] or built directly.
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use weave_config::{Definitions, ScalarProvider};
//!
//! let definitions = Definitions::from_value(&json!({
//!     "transport": { "module": "app.mail", "class": "SmtpTransport", "args": ["$host"] },
//!     "mailer": { "module": "app.mail", "class": "Mailer", "args": ["@transport"] },
//! }))
//! .unwrap();
//!
//! let mut scalars = ScalarProvider::initialize();
//! scalars.add_scalar("host", "localhost").unwrap();
//!
//! let mailer = definitions.get("mailer").unwrap();
//! assert!(mailer.dependencies().contains("transport"));
//! assert!(scalars.contains("host"));
//! ```

pub mod definition;
pub mod errors;
pub mod provider;
pub mod reference;

pub use definition::{CallSpec, Definitions, ServiceDefinition};
pub use errors::ConfigError;
pub use provider::ScalarProvider;
pub use reference::Reference;
