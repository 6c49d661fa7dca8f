//! Infrastructure layer: I/O implementations, the REST API model and DI container
//!
//! This layer implements I/O boundary traits and the provisioning collaborator,
//! and wires up services.

pub mod di;
pub mod error;
pub mod rest_api;
pub mod traits;

pub use error::InfraError;
pub use rest_api::{ModelError, ModelSnapshot, ResourceSnapshot, RestApiModel};
