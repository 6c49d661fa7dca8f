//! Contract between the tree builder and whatever owns the resource nodes.

use std::fmt::Debug;

use crate::domain::definition::{MethodDefinition, ResourceOptions};

/// Creates resource nodes and attaches methods to them.
///
/// Both calls are synchronous and either succeed or fail fatally. The builder
/// never retries and never rolls back nodes that were already created.
pub trait ResourceProvisioner {
    /// Handle to a node owned by the provisioner.
    type Node: Copy + Eq + Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a child of `parent` for a single path segment.
    fn create_child(
        &mut self,
        parent: Self::Node,
        path_part: &str,
        options: Option<&ResourceOptions>,
    ) -> Result<Self::Node, Self::Error>;

    /// Bind an HTTP verb, its integration and options to `node`.
    fn attach_method(
        &mut self,
        node: Self::Node,
        method: &MethodDefinition,
    ) -> Result<(), Self::Error>;
}
