use thiserror::Error;

/// Rejections from the service selection registry.
///
/// "No provider available" is deliberately not here: selection reports it as a
/// [`crate::registry::SelectionOutcome`] value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Service provider '{name}' not found in registry")]
    UnknownProvider { name: String },

    #[error("Service provider '{name}' is already registered")]
    DuplicateProvider { name: String },

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },
}

impl RegistryError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
