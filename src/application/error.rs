//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("invalid blueprint {path}: {message}")]
    Blueprint { path: PathBuf, message: String },

    #[error("unknown function {function:?} referenced at {location}")]
    UnknownFunction { function: String, location: String },

    #[error("unknown authorizer {authorizer:?} referenced at {location}")]
    UnknownAuthorizer { authorizer: String, location: String },

    #[error("custom authorization without authorizer at {location}")]
    MissingAuthorizer { location: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
