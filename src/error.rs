use thiserror::Error;

use crate::diagnostics::{ClassifiedError, ErrorCategory};

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The pool could not be opened.
    #[error("Failed to connect to Microsoft SQL Server, {0}")]
    Connection(ClassifiedError),

    /// A statement failed after the pool was obtained.
    #[error("{action}: {cause}")]
    Operation {
        action: String,
        cause: ClassifiedError,
    },

    /// Action input rejected before any pool interaction.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConnectorError {
    /// Category of the underlying driver error, if there is one.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        self.classified().map(|c| c.category)
    }

    #[must_use]
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            ConnectorError::Connection(cause) | ConnectorError::Operation { cause, .. } => {
                Some(cause)
            }
            ConnectorError::Validation(_) | ConnectorError::Config(_) => None,
        }
    }

    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ConnectorError::Connection(_))
    }

    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, ConnectorError::Operation { .. })
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Validation(err.to_string())
    }
}
