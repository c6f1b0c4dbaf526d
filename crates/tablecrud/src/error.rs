//! Error types for tablecrud

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tablecrud operations
pub type CrudResult<T> = Result<T, CrudError>;

/// The point in the compile-bind-execute sequence where an execution error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    /// Compiling SQL text into a prepared statement.
    Compile,
    /// Coercing and binding parameter values.
    Bind,
    /// Running the bound statement.
    Execute,
    /// Releasing a compiled statement.
    Release,
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStage::Compile => "compile",
            ExecutionStage::Bind => "bind",
            ExecutionStage::Execute => "execute",
            ExecutionStage::Release => "release",
        };
        f.write_str(s)
    }
}

/// Error types for binding validation and statement execution
#[derive(Debug, Error)]
pub enum CrudError {
    /// A binding triple has the wrong shape (arity, field order, empty column).
    #[error("Malformed binding: {0}")]
    MalformedBinding(String),

    /// The type tag is not recognized at all.
    #[error("Unknown type ({0})")]
    UnknownType(String),

    /// The type tag is recognized but not implemented (e.g. binary data).
    #[error("Unsupported type ({0})")]
    UnsupportedType(String),

    /// Compile, bind, execute or release failed against the live connection.
    #[error("Execution error ({stage}): {message}")]
    Execution {
        stage: ExecutionStage,
        message: String,
    },

    /// Rejected by an opt-in safety policy before reaching the connection.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CrudError {
    /// Create a malformed binding error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBinding(message.into())
    }

    /// Create an execution error for a given stage
    pub fn execution(stage: ExecutionStage, message: impl Into<String>) -> Self {
        Self::Execution {
            stage,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error for an expired query timeout
    pub fn timeout(duration: Duration) -> Self {
        Self::execution(
            ExecutionStage::Execute,
            format!("query timeout after {duration:?}"),
        )
    }

    /// Check if this is a malformed binding error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedBinding(_))
    }

    /// Check if this is an unknown type error
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }

    /// Check if this is an unsupported type error
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedType(_))
    }

    /// Check if this is an execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The execution stage, if this is an execution error
    pub fn stage(&self) -> Option<ExecutionStage> {
        match self {
            Self::Execution { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Map a tokio_postgres error into an execution error, keeping SQLSTATE and constraint
    pub fn from_db_error(stage: ExecutionStage, err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code().code();
            let message = match db_err.constraint() {
                Some(constraint) => format!("[{code}] {constraint}: {}", db_err.message()),
                None => format!("[{code}] {}", db_err.message()),
            };
            return Self::execution(stage, message);
        }
        Self::execution(stage, err.to_string())
    }
}
