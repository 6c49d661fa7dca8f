use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::definition::{CorsOptions, Integration, MethodOptions, ResourceOptions};

/// A method as it ended up on a resource, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedMethod {
    pub http_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<Integration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<MethodOptions>,
    /// Preflight response settings, only on generated `OPTIONS` methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsOptions>,
}

impl fmt::Display for AttachedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.integration {
            Some(integration) => write!(f, "{} -> {}", self.http_method, integration.label()),
            None => write!(f, "{}", self.http_method),
        }
    }
}

/// Data payload for tree nodes representing one path segment.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    /// Path segment, empty for the root
    pub path_part: String,
    /// Options the resource was created with
    pub options: Option<ResourceOptions>,
    /// Methods in attachment order
    pub methods: Vec<AttachedMethod>,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path_part.is_empty() {
            write!(f, "/")?;
        } else {
            write!(f, "{}", self.path_part)?;
        }
        if !self.methods.is_empty() {
            write!(
                f,
                " [{}]",
                self.methods.iter().map(|m| m.http_method.as_str()).join(", ")
            )?;
        }
        Ok(())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in creation order
    pub children: Vec<Index>,
}

/// Arena-based resource tree.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are never removed, so indices stay valid for the arena's lifetime.
#[derive(Debug)]
pub struct ResourceArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for ResourceArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order iteration, children left to right.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    /// Child of `parent` whose path part equals `path_part`.
    #[instrument(level = "trace", skip(self))]
    pub fn find_child(&self, parent: Index, path_part: &str) -> Option<Index> {
        self.get_node(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| {
                self.get_node(child)
                    .is_some_and(|node| node.data.path_part == path_part)
            })
    }

    /// URL path of a node: `/` for the root, `/a/b` below it.
    pub fn full_path(&self, idx: Index) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = Some(idx);
        while let Some(current_idx) = current {
            let node = self.get_node(current_idx)?;
            if node.parent.is_some() {
                parts.push(node.data.path_part.as_str());
            }
            current = node.parent;
        }
        parts.reverse();
        Some(format!("/{}", parts.join("/")))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Full paths of all nodes without children.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .filter_map(|(idx, _)| self.full_path(idx))
            .collect()
    }

    /// Render the tree, one line per resource with its methods.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(arena: &ResourceArena, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = arena.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = arena.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.data.to_string());
                        build_tree(arena, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        match self.root.and_then(|idx| self.get_node(idx).map(|n| (idx, n))) {
            Some((root_idx, root)) => {
                let mut tree = Tree::new(root.data.to_string());
                build_tree(self, root_idx, &mut tree);
                tree
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

pub struct TreeIterator<'a> {
    arena: &'a ResourceArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a ResourceArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
