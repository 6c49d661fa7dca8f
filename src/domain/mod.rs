//! Domain layer: definitions, the resource tree builder and its arena
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod definition;
pub mod error;
pub mod provisioner;

pub use arena::{AttachedMethod, NodeData, ResourceArena, TreeNode};
pub use builder::{HierarchicalResources, TreeResult};
pub use definition::{
    split_path_part, AuthorizationType, CorsOptions, Integration, MethodDefinition,
    MethodOptions, ResourceDefinition, ResourceOptions, ALL_METHODS,
};
pub use error::DomainError;
pub use provisioner::ResourceProvisioner;

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
