use std::collections::HashMap;

use serde_json::Value;

use crate::errors::ConfigError;

/// A provider to register all scalars.
///
/// Scalars are plain configuration values which services refer to
/// with `$name` placeholders in their arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarProvider {
    scalars: HashMap<String, Value>,
}

impl ScalarProvider {
    /// Initializes an empty Scalar Provider
    pub fn initialize() -> Self {
        Self {
            scalars: HashMap::new(),
        }
    }

    /// Builds a provider from a mapping of scalar name to value
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::validation(
                "scalars",
                "expected a mapping of scalar name to value",
            ));
        };

        let mut provider = Self::initialize();
        for (name, value) in map {
            provider.add_scalar(name.clone(), value.clone())?;
        }

        Ok(provider)
    }

    /// Retrieve a scalar by name
    pub fn get_scalar(&self, name: &str) -> Option<&Value> {
        self.scalars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Add a scalar to the registry.
    ///
    /// If the name is already registered, it will return a
    /// [`ConfigError::ScalarAlreadyRegistered`] error
    pub fn add_scalar(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConfigError> {
        let name = name.into();

        if self.scalars.contains_key(&name) {
            return Err(ConfigError::ScalarAlreadyRegistered(name));
        }

        tracing::trace!("Registered scalar '{name}'");
        self.scalars.insert(name, value.into());
        Ok(self)
    }

    /// Can optionally add a scalar to the registry.
    ///
    /// If the value provided is `Some(V)`, it will be the same as calling [`ScalarProvider::add_scalar`]
    /// If the value provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_scalar<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Result<&mut Self, ConfigError> {
        match value {
            Some(v) => self.add_scalar(name, v),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_and_get_scalar() {
        let mut provider = ScalarProvider::initialize();
        provider
            .add_scalar("flib", "FLIB")
            .unwrap()
            .add_scalar("port", 8080)
            .unwrap();

        assert_eq!(provider.get_scalar("flib"), Some(&json!("FLIB")));
        assert_eq!(provider.get_scalar("port"), Some(&json!(8080)));
        assert_eq!(provider.get_scalar("missing"), None);
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn test_duplicate_scalar_error() {
        let mut provider = ScalarProvider::initialize();
        provider.add_scalar("flib", "FLIB").unwrap();

        let result = provider.add_scalar("flib", "FLUB");
        assert_eq!(
            result.unwrap_err(),
            ConfigError::ScalarAlreadyRegistered("flib".to_string())
        );
        assert_eq!(provider.get_scalar("flib"), Some(&json!("FLIB")));
    }

    #[test]
    fn test_maybe_add_scalar() {
        let mut provider = ScalarProvider::default();
        provider
            .maybe_add_scalar("set", Some(true))
            .unwrap()
            .maybe_add_scalar::<bool>("unset", None)
            .unwrap();

        assert!(provider.contains("set"));
        assert!(!provider.contains("unset"));
    }

    #[test]
    fn test_from_value() {
        let provider = ScalarProvider::from_value(&json!({
            "flib": "FLIB",
            "nested": { "a": [1, 2] },
        }))
        .unwrap();

        assert_eq!(provider.get_scalar("nested"), Some(&json!({ "a": [1, 2] })));
        assert!(matches!(
            ScalarProvider::from_value(&json!(["flib"])),
            Err(ConfigError::Validation { .. })
        ));
    }
}
