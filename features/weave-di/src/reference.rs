use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use weave_config::{Reference, ScalarProvider};

use crate::{
    arguments::{Argument, CallArgs},
    errors::ReferenceError,
    types::Instance,
};

/// Substitutes `$scalar` and `@service` placeholders inside argument values
///
/// Works on any nesting of sequences and mappings, the input is left untouched.
/// Scalars are inserted as they are, placeholders inside a scalar value stay literal.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    scalars: &'a ScalarProvider,
    instances: &'a HashMap<String, Instance>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(scalars: &'a ScalarProvider, instances: &'a HashMap<String, Instance>) -> Self {
        Self { scalars, instances }
    }

    pub fn resolve(&self, value: &Value) -> Result<Argument, ReferenceError> {
        match value {
            Value::String(raw) => match Reference::parse(raw) {
                Some(Reference::Scalar(name)) => {
                    let scalar = self
                        .scalars
                        .get_scalar(name)
                        .ok_or_else(|| ReferenceError::UnknownScalar(name.to_string()))?;
                    tracing::trace!("Substituted scalar '{raw}'");
                    Ok(Argument::from(scalar))
                }
                Some(Reference::Service(name)) => {
                    let instance = self
                        .instances
                        .get(name)
                        .ok_or_else(|| ReferenceError::UninstantiatedService(name.to_string()))?;
                    tracing::trace!("Injected service '{raw}' ({})", instance.info);
                    Ok(Argument::Service(instance.clone()))
                }
                None => Ok(Argument::String(raw.clone())),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<_, _>>()
                .map(Argument::Sequence),
            Value::Object(map) => self.resolve_kwargs(map).map(Argument::Mapping),
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(Argument::from(value)),
        }
    }

    pub fn resolve_args(&self, args: &[Value]) -> Result<Vec<Argument>, ReferenceError> {
        args.iter().map(|arg| self.resolve(arg)).collect()
    }

    pub fn resolve_kwargs(
        &self,
        kwargs: &Map<String, Value>,
    ) -> Result<IndexMap<String, Argument>, ReferenceError> {
        kwargs
            .iter()
            .map(|(name, value)| Ok((name.clone(), self.resolve(value)?)))
            .collect()
    }

    /// Resolves the argument lists of one call
    pub fn resolve_call(
        &self,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<CallArgs, ReferenceError> {
        Ok(CallArgs {
            args: self.resolve_args(args)?,
            kwargs: self.resolve_kwargs(kwargs)?,
        })
    }
}
