//! Gateway synthesis service
//!
//! Loads a blueprint, builds its resource tree on a [`RestApiModel`] and
//! publishes the API's own endpoint as a late-added resource.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{
    ApplicationError, ApplicationResult, AuthorizerSpec, Blueprint, DeployedFunction,
    IoResultExt,
};
use crate::config::Settings;
use crate::domain::{CorsOptions, HierarchicalResources};
use crate::infrastructure::rest_api::{ModelSnapshot, RestApiModel};
use crate::infrastructure::traits::FileSystem;

/// A synthesized API.
pub struct GatewayOutput {
    pub blueprint: Blueprint,
    /// Resource tree with its inventory, root first
    pub resources: HierarchicalResources<RestApiModel>,
    pub endpoint: String,
}

impl GatewayOutput {
    pub fn model(&self) -> &RestApiModel {
        self.resources.provisioner()
    }

    /// Everything needed to deploy the API: resources, functions and
    /// authorizers.
    pub fn export(&self) -> GatewayExport {
        let name = &self.blueprint.name;
        GatewayExport {
            api: self.model().snapshot(),
            functions: self
                .blueprint
                .functions
                .iter()
                .map(|(key, spec)| (key.clone(), spec.deployed(name, key)))
                .collect(),
            authorizers: self.blueprint.authorizers.clone(),
        }
    }
}

/// Serializable deployment view of a [`GatewayOutput`].
#[derive(Debug, Clone, Serialize)]
pub struct GatewayExport {
    pub api: ModelSnapshot,
    pub functions: BTreeMap<String, DeployedFunction>,
    pub authorizers: BTreeMap<String, AuthorizerSpec>,
}

/// Service turning blueprints into REST API models.
pub struct GatewayService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl GatewayService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read, parse and validate a blueprint file.
    #[instrument(level = "debug", skip(self))]
    pub fn load_blueprint(&self, path: &Path) -> ApplicationResult<Blueprint> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("blueprint not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read blueprint", path)?;
        let blueprint = Blueprint::parse(&content).map_err(|e| ApplicationError::Blueprint {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        blueprint.validate()?;

        debug!(
            "loaded blueprint {:?}: {} functions, {} resources",
            blueprint.name,
            blueprint.functions.len(),
            blueprint.resource_count()
        );
        Ok(blueprint)
    }

    /// Load a blueprint file and synthesize it.
    pub fn synthesize(&self, path: &Path) -> ApplicationResult<GatewayOutput> {
        let blueprint = self.load_blueprint(path)?;
        self.synthesize_blueprint(blueprint)
    }

    /// Build the API described by `blueprint`.
    ///
    /// The self-link, if any, is added after the initial build because its
    /// response depends on the finished API's endpoint.
    #[instrument(level = "debug", skip_all, fields(name = %blueprint.name))]
    pub fn synthesize_blueprint(&self, blueprint: Blueprint) -> ApplicationResult<GatewayOutput> {
        let mut model = RestApiModel::new(
            blueprint.name.clone(),
            self.settings.stage.clone(),
            self.settings.region.clone(),
        );
        if let Some(description) = &blueprint.description {
            model = model.with_description(description.clone());
        }
        if let Some(cors) = self.effective_cors(&blueprint) {
            model = model.with_default_cors(cors);
        }

        let root = model.root();
        let mut resources = HierarchicalResources::build(
            model,
            root,
            &blueprint.root_methods,
            &blueprint.resources,
        )?;
        let endpoint = resources.provisioner().endpoint_url();

        if let Some(self_link) = &blueprint.self_link {
            resources.add_resources(&[self_link.definition(&endpoint)])?;
        }

        info!(
            "synthesized {} with {} resources at {}",
            blueprint.name,
            resources.resources().len(),
            endpoint
        );
        Ok(GatewayOutput {
            blueprint,
            resources,
            endpoint,
        })
    }

    fn effective_cors(&self, blueprint: &Blueprint) -> Option<CorsOptions> {
        blueprint.cors.clone().or_else(|| {
            self.settings
                .cors
                .enabled
                .then(|| self.settings.cors.to_options())
        })
    }
}
