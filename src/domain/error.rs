//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent a definition tree that cannot be built.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A `path_part` with no non-empty segment, e.g. `""` or `"/"`.
    #[error("invalid resource definition at {location}: path part {path_part:?} has no segments")]
    InvalidDefinition { path_part: String, location: String },

    /// The provisioner refused a node creation or method attachment.
    #[error("{operation} failed: {source}")]
    Provisioner {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DomainError {
    pub fn provisioner<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provisioner {
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}
