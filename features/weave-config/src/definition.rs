use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{errors::ConfigError, reference::collect_services};

/// How to construct a single service
///
/// Mirrors one entry of the `services` section of a configuration:
///
/// ```yaml
/// mailer:
///   module: app.mail
///   class: Mailer
///   args: ["@transport", "$sender"]
///   calls:
///     - method: set_retries
///       args: [3]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub module: Option<String>,
    pub class: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    pub factory_method: Option<String>,
    #[serde(default)]
    pub factory_args: Vec<Value>,
    #[serde(default)]
    pub factory_kwargs: Map<String, Value>,
    /// Hand out the looked up symbol itself instead of calling it
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub calls: Vec<CallSpec>,
}

/// A method invoked on a service after it has been constructed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallSpec {
    pub method: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ServiceDefinition {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Default::default()
        }
    }

    /// Parses and validates the definition of service `name`
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ConfigError> {
        let definition: ServiceDefinition = serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::validation(format!("service '{name}'"), e))?;

        definition.validate(name)?;
        Ok(definition)
    }

    /// Checks that all required fields are present
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let module = match self.module.as_deref() {
            Some(module) if !module.is_empty() => module,
            _ => {
                return Err(ConfigError::invalid(
                    name,
                    "service configurations must define a module",
                ))
            }
        };

        if !self.is_static && self.class.is_none() {
            return Err(ConfigError::invalid(
                name,
                format!("non-static service configurations must define a class: module is {module}"),
            ));
        }

        for call in &self.calls {
            call.method_name(name)?;
        }

        Ok(())
    }

    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or_default()
    }

    /// Names of all services referenced anywhere in the arguments
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies = BTreeSet::new();

        let calls = self
            .calls
            .iter()
            .flat_map(|call| call.args.iter().chain(call.kwargs.values()));

        self.args
            .iter()
            .chain(self.kwargs.values())
            .chain(self.factory_args.iter())
            .chain(self.factory_kwargs.values())
            .chain(calls)
            .for_each(|value| collect_services(value, &mut dependencies));

        dependencies
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn with_factory_method(mut self, method: impl Into<String>) -> Self {
        self.factory_method = Some(method.into());
        self
    }

    pub fn with_factory_arg(mut self, arg: impl Into<Value>) -> Self {
        self.factory_args.push(arg.into());
        self
    }

    pub fn with_factory_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.factory_kwargs.insert(name.into(), value.into());
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_call(mut self, call: CallSpec) -> Self {
        self.calls.push(call);
        self
    }
}

impl CallSpec {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Default::default()
        }
    }

    /// Method to invoke on the service `service`
    pub fn method_name(&self, service: &str) -> Result<&str, ConfigError> {
        self.method
            .as_deref()
            .ok_or_else(|| ConfigError::invalid(service, "service call must define a method"))
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

/// All service definitions, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    entries: Vec<(String, ServiceDefinition)>,
    index: HashMap<String, usize>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a mapping of service name to definition
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(services) = value else {
            return Err(ConfigError::validation(
                "services",
                "expected a mapping of service name to definition",
            ));
        };

        let mut definitions = Self::new();
        for (name, definition) in services {
            definitions.add(name.clone(), ServiceDefinition::from_value(name, definition)?)?;
        }

        tracing::debug!("Parsed {} service definitions", definitions.len());
        Ok(definitions)
    }

    /// Adds a definition, rejecting duplicate names
    pub fn add(
        &mut self,
        name: impl Into<String>,
        definition: ServiceDefinition,
    ) -> Result<&mut Self, ConfigError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateService(name));
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, definition));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceDefinition)> {
        self.entries.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Definitions {
    type Item = (String, ServiceDefinition);
    type IntoIter = std::vec::IntoIter<(String, ServiceDefinition)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
