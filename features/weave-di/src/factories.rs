use std::{future::Future, sync::Arc};

use crate::{
    arguments::CallArgs,
    types::{DynError, Injectable, Instance},
};

/// A constructor providing instances of a given type
///
/// This is what a `module` / `class` pair of a service definition resolves to.
pub trait Constructible: Send + Sync + 'static {
    type Provides: Injectable;

    /// Constructs a new instance from the resolved arguments
    ///
    /// Returns the constructed value, or an error if the arguments don't fit or the construction failed
    fn construct(
        &self,
        args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_;

    /// Wraps the constructed value
    ///
    /// Override with [`Instance::invocable`] if the provided type accepts method calls
    fn instance(provided: Self::Provides) -> Instance {
        Instance::new(provided)
    }
}

/// Wrapper Trait for constructors, providing instances of Any
pub trait DynConstructible: Send + Sync {
    /// Constructs a new instance from the resolved arguments
    fn construct(
        &self,
        args: CallArgs,
    ) -> Box<dyn Future<Output = Result<Instance, DynError>> + Send + '_>;
}
// Impl DynConstructible for any Constructible
impl<SpecificConstructor: Constructible> DynConstructible for SpecificConstructor {
    fn construct(
        &self,
        args: CallArgs,
    ) -> Box<dyn Future<Output = Result<Instance, DynError>> + Send + '_> {
        let construction_fut = async move {
            // Forward the call to the specific implementation
            <SpecificConstructor as Constructible>::construct(self, args)
                .await
                .map(<SpecificConstructor as Constructible>::instance)
                .map_err(|e| -> DynError { e.into() })
        };

        Box::new(construction_fut)
    }
}

/// Shared handle to a registered constructor
pub type Constructor = Arc<dyn DynConstructible>;

/// Methods of a built service, called by name
///
/// Used for factory methods, whose returned instance replaces the service,
/// and for post-construction calls, whose result is ignored.
pub trait Invocable: Injectable {
    fn invoke(&self, method: &str, args: CallArgs) -> Result<Option<Instance>, DynError>;
}

/// Constructor backed by a synchronous closure, see [`from_fn`]
pub struct FnConstructor<F>(F);

/// Creates a constructor from a closure building the instance directly
pub fn from_fn<F, E>(constructor: F) -> FnConstructor<F>
where
    F: Fn(CallArgs) -> Result<Instance, E> + Send + Sync + 'static,
    E: Into<DynError> + Send + 'static,
{
    FnConstructor(constructor)
}

impl<F, E> Constructible for FnConstructor<F>
where
    F: Fn(CallArgs) -> Result<Instance, E> + Send + Sync + 'static,
    E: Into<DynError> + Send + 'static,
{
    type Provides = Instance;

    fn construct(
        &self,
        args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_ {
        let result = (self.0)(args);
        async move { result }
    }

    fn instance(provided: Instance) -> Instance {
        provided
    }
}
