//! Declarative REST API model
//!
//! In-memory stand-in for an API Gateway `RestApi`: it owns the resource
//! arena and implements [`ResourceProvisioner`] for the tree builder.

use generational_arena::Index;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{
    AttachedMethod, CorsOptions, Integration, MethodDefinition, NodeData, ResourceArena,
    ResourceOptions, ResourceProvisioner, ALL_METHODS,
};

/// Errors raised by the model while resources are added.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("resource {path_part:?} already exists under {parent}")]
    DuplicateResource { parent: String, path_part: String },

    #[error("method {http_method} already defined on {path}")]
    DuplicateMethod { path: String, http_method: String },

    #[error("unsupported HTTP method: {0:?}")]
    InvalidHttpMethod(String),

    #[error("unknown resource node: {0:?}")]
    UnknownNode(Index),
}

/// A REST API with its resource tree.
#[derive(Debug)]
pub struct RestApiModel {
    name: String,
    description: Option<String>,
    stage: String,
    region: String,
    default_cors: Option<CorsOptions>,
    arena: ResourceArena,
    root: Index,
}

impl RestApiModel {
    /// Create an API with only its root resource.
    pub fn new(name: impl Into<String>, stage: impl Into<String>, region: impl Into<String>) -> Self {
        let mut arena = ResourceArena::new();
        let root = arena.insert_node(NodeData::default(), None);
        Self {
            name: name.into(),
            description: None,
            stage: stage.into(),
            region: region.into(),
            default_cors: None,
            arena,
            root,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an `OPTIONS` preflight to the root now and to every resource
    /// created afterwards, unless the resource brings its own CORS options.
    pub fn with_default_cors(mut self, cors: CorsOptions) -> Self {
        if let Some(root) = self.arena.get_node_mut(self.root) {
            if !root.data.methods.iter().any(|m| m.http_method == "OPTIONS") {
                root.data.methods.push(preflight(&cors));
            }
        }
        self.default_cors = Some(cors);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn arena(&self) -> &ResourceArena {
        &self.arena
    }

    /// Stable id derived from name and stage: 10 lowercase hex characters.
    pub fn rest_api_id(&self) -> String {
        let digest = Sha256::digest(format!("{}:{}", self.name, self.stage).as_bytes());
        hex::encode(digest)[..10].to_string()
    }

    /// Invoke URL of the deployed stage, with trailing slash.
    pub fn endpoint_url(&self) -> String {
        format!(
            "https://{}.execute-api.{}.amazonaws.com/{}/",
            self.rest_api_id(),
            self.region,
            self.stage
        )
    }

    /// Every (path, method) pair in pre-order.
    pub fn routes(&self) -> Vec<(String, &AttachedMethod)> {
        self.arena
            .iter()
            .flat_map(|(idx, node)| {
                let path = self.arena.full_path(idx).unwrap_or_default();
                node.data.methods.iter().map(move |m| (path.clone(), m))
            })
            .collect()
    }

    /// Serializable view of the whole API.
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            stage: self.stage.clone(),
            endpoint: self.endpoint_url(),
            resources: self
                .arena
                .iter()
                .map(|(idx, node)| ResourceSnapshot {
                    path: self.arena.full_path(idx).unwrap_or_default(),
                    methods: node.data.methods.clone(),
                })
                .collect(),
        }
    }
}

impl ResourceProvisioner for RestApiModel {
    type Node = Index;
    type Error = ModelError;

    #[instrument(level = "debug", skip(self, options))]
    fn create_child(
        &mut self,
        parent: Index,
        path_part: &str,
        options: Option<&ResourceOptions>,
    ) -> Result<Index, ModelError> {
        let parent_path = self
            .arena
            .full_path(parent)
            .ok_or(ModelError::UnknownNode(parent))?;
        if self.arena.find_child(parent, path_part).is_some() {
            return Err(ModelError::DuplicateResource {
                parent: parent_path,
                path_part: path_part.to_string(),
            });
        }

        let mut data = NodeData {
            path_part: path_part.to_string(),
            options: options.cloned(),
            methods: Vec::new(),
        };
        let cors = options
            .and_then(|o| o.cors.as_ref())
            .or(self.default_cors.as_ref());
        if let Some(cors) = cors {
            data.methods.push(preflight(cors));
        }

        let idx = self.arena.insert_node(data, Some(parent));
        debug!("created resource {:?} under {}", path_part, parent_path);
        Ok(idx)
    }

    #[instrument(level = "debug", skip(self, method), fields(http_method = %method.http_method))]
    fn attach_method(&mut self, node: Index, method: &MethodDefinition) -> Result<(), ModelError> {
        let http_method = method.http_method.to_uppercase();
        if !ALL_METHODS.contains(&http_method.as_str()) {
            return Err(ModelError::InvalidHttpMethod(method.http_method.clone()));
        }

        let path = self
            .arena
            .full_path(node)
            .ok_or(ModelError::UnknownNode(node))?;
        let resource = self
            .arena
            .get_node_mut(node)
            .ok_or(ModelError::UnknownNode(node))?;
        if resource.data.methods.iter().any(|m| m.http_method == http_method) {
            return Err(ModelError::DuplicateMethod { path, http_method });
        }

        let defaults = resource.data.options.as_ref();
        let integration = method
            .integration
            .clone()
            .or_else(|| defaults.and_then(|o| o.default_integration.clone()));
        let options = method
            .options
            .clone()
            .or_else(|| defaults.and_then(|o| o.default_method_options.clone()));

        resource.data.methods.push(AttachedMethod {
            http_method,
            integration,
            options,
            cors: None,
        });
        debug!("attached method to {}", path);
        Ok(())
    }
}

fn preflight(cors: &CorsOptions) -> AttachedMethod {
    AttachedMethod {
        http_method: "OPTIONS".into(),
        integration: Some(Integration::mock(cors.status_code, None)),
        options: None,
        cors: Some(cors.clone()),
    }
}

/// Exported form of a [`RestApiModel`].
#[derive(Debug, Clone, Serialize)]
pub struct ModelSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stage: String,
    pub endpoint: String,
    pub resources: Vec<ResourceSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    pub path: String,
    pub methods: Vec<AttachedMethod>,
}
