use std::sync::Arc;

use thiserror::Error;
use weave_config::ConfigError;

use crate::{dependency_graph::DependencyGraphError, types::DynError};

/// A placeholder could not be substituted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// `$name` names no registered scalar - the configuration is invalid
    #[error("Invalid service argument scalar '${0}' (not found)")]
    UnknownScalar(String),
    /// `@name` names a service which was not built yet
    ///
    /// With dependency ordered construction this only happens on an internal bug
    #[error("Service '@{0}' was referenced before it was instantiated")]
    UninstantiatedService(String),
}

/// The registry has no symbol for the reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No constructor found for '{module}{}'", .symbol.as_ref().map(|s| format!(".{s}")).unwrap_or_default())]
pub struct ConstructorNotFound {
    pub module: String,
    pub symbol: Option<String>,
}

/// Returned by [`Invocable`](crate::factories::Invocable) implementations for unknown methods
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{type_name}' has no method '{method}'")]
pub struct UnknownMethod {
    pub type_name: &'static str,
    pub method: String,
}
impl UnknownMethod {
    pub fn of<T: ?Sized>(method: &str) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            method: method.to_string(),
        }
    }
}

/// Errors when trying to require a built service
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    /// The required service is not known
    #[error("The required service '{0}' is not known.")]
    Missing(String),

    #[error("Failed to downcast '{name}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        name: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors while building the services
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// A service definition is malformed or incomplete
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraph(#[from] DependencyGraphError),

    /// An argument placeholder could not be substituted
    #[error("Service '{component}' has an unresolvable argument: {source}")]
    Reference {
        component: String,
        source: ReferenceError,
    },

    /// The registry does not know the service's module or class
    #[error("Service '{component}' could not be resolved: {source}")]
    MissingConstructor {
        component: String,
        source: ConstructorNotFound,
    },

    /// A non-static service resolved to a plain value
    #[error("Service '{component}' is not static, but its symbol is not constructible")]
    NotConstructible { component: String },

    /// A constructor failed to build
    #[error("Constructor for '{component}' failed - error: {error}")]
    ConstructionFailed {
        component: String,
        error: Arc<DynError>,
    },

    /// A method was called on a service which does not accept calls
    #[error("Service '{component}' ({type_name}) does not accept method calls, tried '{method}'")]
    NotInvocable {
        component: String,
        method: String,
        type_name: &'static str,
    },

    /// A factory method or post-construction call failed
    #[error("Call '{method}' on '{component}' failed - error: {error}")]
    CallFailed {
        component: String,
        method: String,
        error: Arc<DynError>,
    },

    #[error("Factory method '{method}' of '{component}' returned nothing")]
    FactoryReturnedNothing { component: String, method: String },

    /// A service was recorded twice during one run
    #[error("Service '{0}' was instantiated twice")]
    AlreadyInstantiated(String),

    /// Initiation timed out
    #[error("Initiation timed out")]
    Timeout,
}
