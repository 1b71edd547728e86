//! Error types for the custom field registry

use thiserror::Error;

/// Result type for registry and store operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in field registry operations.
///
/// Validation of submitted values never produces one of these; see
/// [`crate::validation::ValidationResult`].
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A definition with the same `(module, api_name)` already exists,
    /// active or not.
    #[error("duplicate field: {module}.{api_name} already exists")]
    DuplicateField { module: String, api_name: String },

    /// Definition not found by id
    #[error("field definition not found: {id}")]
    NotFound { id: String },

    /// The definition breaks a structural rule (empty options, bad regex, ...)
    #[error("invalid definition '{api_name}': {message}")]
    InvalidDefinition { api_name: String, message: String },

    /// A reorder request named ids that cannot be ordered within the module
    #[error("invalid reorder for module '{module}': {message}")]
    InvalidReorder { module: String, message: String },

    /// A form edit cannot be applied to the field it names
    #[error("invalid change to '{api_name}': {message}")]
    InvalidChange { api_name: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FieldsError {
    pub fn duplicate(module: impl Into<String>, api_name: impl Into<String>) -> Self {
        Self::DuplicateField {
            module: module.into(),
            api_name: api_name.into(),
        }
    }

    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn invalid_definition(api_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            api_name: api_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_reorder(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReorder {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn invalid_change(api_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidChange {
            api_name: api_name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::duplicate("Student", "passport_no");
        assert_eq!(
            err.to_string(),
            "duplicate field: Student.passport_no already exists"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = FieldsError::not_found("01J0000000000000000000000A");
        assert!(err.to_string().contains("01J0000000000000000000000A"));
    }
}
