//! Audit Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),
}

impl AuditError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// True for errors caused by caller input rather than storage
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Forbidden { .. })
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
