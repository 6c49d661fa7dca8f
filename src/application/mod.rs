//! Application layer: blueprints and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod blueprint;
pub mod error;
pub mod error_ext;
pub mod services;

pub use blueprint::{AuthorizerSpec, Blueprint, DeployedFunction, FunctionSpec, SelfLink};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
