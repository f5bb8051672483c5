/// Errors in the declarative service configuration
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration does not have the expected shape
    #[error("Malformed {context}: {reason}")]
    Validation { context: String, reason: String },

    /// A required field is absent or contradicts another one
    #[error("Invalid service configuration for '{name}': {reason}")]
    InvalidConfiguration { name: String, reason: String },

    /// The scalar name is already registered
    #[error("The scalar '{0}' is already registered")]
    ScalarAlreadyRegistered(String),

    /// The service name is defined twice
    #[error("The service '{0}' is defined twice")]
    DuplicateService(String),
}

impl ConfigError {
    pub(crate) fn validation(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Validation {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
