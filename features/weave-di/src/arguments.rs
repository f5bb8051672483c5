use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::types::{Injectable, Instance};

/// An argument value after all placeholders have been substituted
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Argument>),
    /// Entries keep the order they were written in
    Mapping(IndexMap<String, Argument>),
    /// An already built service, injected through `@name`
    Service(Instance),
}

impl Argument {
    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Argument::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Argument::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Argument]> {
        match self {
            Argument::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Argument>> {
        match self {
            Argument::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Argument::Service(instance) => Some(instance),
            _ => None,
        }
    }

    /// The injected service, if this is a service of type `T`
    pub fn service<T: Injectable>(&self) -> Option<Arc<T>> {
        self.as_instance()?.downcast().ok()
    }
}

/// Plain conversion, placeholders are kept as they are
impl From<&Value> for Argument {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Argument::Null,
            Value::Bool(value) => Argument::Bool(*value),
            Value::Number(number) => Argument::Number(number.clone()),
            Value::String(value) => Argument::String(value.clone()),
            Value::Array(items) => Argument::Sequence(items.iter().map(Argument::from).collect()),
            Value::Object(map) => Argument::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), Argument::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::String(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::String(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Number(value.into())
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Bool(value)
    }
}

impl From<Instance> for Argument {
    fn from(instance: Instance) -> Self {
        Argument::Service(instance)
    }
}

/// Resolved positional and named arguments of one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub args: Vec<Argument>,
    pub kwargs: IndexMap<String, Argument>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(&self, index: usize) -> Option<&Argument> {
        self.args.get(index)
    }

    pub fn named(&self, name: &str) -> Option<&Argument> {
        self.kwargs.get(name)
    }

    /// A parameter passed either by position or by name
    pub fn get(&self, index: usize, name: &str) -> Option<&Argument> {
        self.positional(index).or_else(|| self.named(name))
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}
