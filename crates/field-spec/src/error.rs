use thiserror::Error;

use crate::datastore::DatastoreError;

/// Result type for field operations.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors raised while configuring or persisting a field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("unknown field type \"{type_name}\"")]
    UnknownType { type_name: String },
    #[error("field name can't be empty")]
    EmptyName,
    #[error(
        "field names can only contain lowercase alphanumeric characters, dashes and underscores (\"{name}\" passed)"
    )]
    InvalidName { name: String },
    #[error("conditional logic rules argument should be a mapping")]
    InvalidRules,
    #[error("conditional logic rule {index} is invalid: {reason}")]
    InvalidRule { index: usize, reason: String },
    #[error("invalid conditional logic compare operator \"{compare}\"; allowed operators are: {allowed}")]
    InvalidCompare { compare: String, allowed: String },
    #[error("invalid conditional logic value format; a sequence is expected with the \"{compare}\" operator")]
    ExpectedSequence { compare: String },
    #[error("invalid relation type \"{relation}\"; expected \"AND\" or \"OR\"")]
    InvalidRelation { relation: String },
    #[error("field type \"{type_name}\" does not support {option}")]
    UnsupportedOption {
        type_name: String,
        option: &'static str,
    },
    #[error("field \"{name}\" has no datastore")]
    MissingDatastore { name: String },
    #[error("datastore failure: {0}")]
    Datastore(#[from] DatastoreError),
}

impl FieldError {
    /// True for configuration mistakes detected while setting a field up.
    pub fn is_syntax(&self) -> bool {
        !matches!(
            self,
            FieldError::MissingDatastore { .. } | FieldError::Datastore(_)
        )
    }
}
