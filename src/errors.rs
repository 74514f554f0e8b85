use serde::Serialize;

use crate::store::StorageError;
use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    StorageError(
        #[from]
        #[serde(skip)]
        StorageError,
    ),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::ValidationError(errors)
    }
}

impl ServiceError {
    /// Field-level messages when the failure came from validation.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ValidationError(errors) => Some(errors),
            _ => None,
        }
    }

    /// Validation and lookup failures leave stored data untouched and can be fixed by the user.
    /// Storage and serialization failures cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::NotFound(_) | Self::InvalidOperation(_)
        )
    }

    /// Message suitable for showing to the person entering data.
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageError(_) => "Could not save changes to storage".to_string(),
            Self::SerializationError(_) => "Stored data could not be encoded".to_string(),
            _ => self.to_string(),
        }
    }
}

// Result extensions for easier error handling
pub trait ResultExt<T> {
    fn map_err_to_service(self) -> Result<T, ServiceError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<ServiceError>,
{
    fn map_err_to_service(self) -> Result<T, ServiceError> {
        self.map_err(|e| e.into())
    }
}
