//! Declarative REST API resource trees.
//!
//! A blueprint declares an API's path hierarchy, where one declaration may
//! span several segments (`"a/b/c"`). [`domain::HierarchicalResources`]
//! expands it into concrete resources on a [`domain::ResourceProvisioner`]
//! and keeps an ordered inventory of every node created.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
