//! Blueprint: the TOML document declaring one REST API.
//!
//! ```toml
//! name = "primo-gateway"
//! description = "Primo Gateway API"
//!
//! [functions.query]
//! handler = "query.handler"
//!
//! [[resources]]
//! path_part = "query"
//!
//! [[resources.methods]]
//! http_method = "GET"
//! integration = { type = "lambda", function = "query" }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    AuthorizationType, CorsOptions, Integration, MethodDefinition, MethodOptions,
    ResourceDefinition,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Lambda functions usable as integration targets, by key
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSpec>,
    /// Token authorizers usable from method options, by key
    #[serde(default)]
    pub authorizers: BTreeMap<String, AuthorizerSpec>,
    /// Default preflight for every resource; overrides the configured default
    #[serde(default)]
    pub cors: Option<CorsOptions>,
    #[serde(default)]
    pub root_methods: Vec<MethodDefinition>,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
    /// Resource added after the build that serves the API's own URL
    #[serde(default)]
    pub self_link: Option<SelfLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub handler: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

impl FunctionSpec {
    /// Deployed function name: `<api>-<key>`.
    pub fn function_name(api_name: &str, key: &str) -> String {
        format!("{api_name}-{key}")
    }

    /// The function as deployed for API `api_name`.
    pub fn deployed(&self, api_name: &str, key: &str) -> DeployedFunction {
        DeployedFunction {
            function_name: Self::function_name(api_name, key),
            handler: self.handler.clone(),
            description: self.description.clone(),
            memory_size: self.memory_size,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// A Lambda function with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedFunction {
    pub function_name: String,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub memory_size: u32,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizerSpec {
    /// Name of the (external) authorizer function
    pub function: String,
    #[serde(default = "default_identity_source")]
    pub identity_source: String,
    #[serde(default = "default_results_cache_ttl_secs")]
    pub results_cache_ttl_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelfLink {
    #[serde(default = "default_self_link_path")]
    pub path_part: String,
}

impl Default for SelfLink {
    fn default() -> Self {
        Self {
            path_part: default_self_link_path(),
        }
    }
}

impl SelfLink {
    /// Resource whose `GET` answers with `endpoint`.
    pub fn definition(&self, endpoint: &str) -> ResourceDefinition {
        ResourceDefinition::new(self.path_part.clone()).with_method(
            MethodDefinition::new("GET")
                .with_integration(Integration::mock(200, Some(endpoint.to_string()))),
        )
    }
}

fn default_memory_size() -> u32 {
    1024
}

fn default_timeout_secs() -> u32 {
    30
}

fn default_identity_source() -> String {
    "method.request.header.Authorization".into()
}

fn default_results_cache_ttl_secs() -> u32 {
    300
}

fn default_self_link_path() -> String {
    "meta/endpoint".into()
}

impl Blueprint {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check that every function and authorizer reference resolves.
    #[instrument(level = "debug", skip(self), fields(name = %self.name))]
    pub fn validate(&self) -> ApplicationResult<()> {
        for (i, method) in self.root_methods.iter().enumerate() {
            self.check_method(method, &format!("root_methods[{i}]"))?;
        }
        self.check_resources(&self.resources, "resources")
    }

    /// Number of nodes the resource list expands to, root excluded.
    pub fn resource_count(&self) -> usize {
        self.resources
            .iter()
            .map(ResourceDefinition::node_count)
            .sum()
    }

    fn check_resources(
        &self,
        resources: &[ResourceDefinition],
        location: &str,
    ) -> ApplicationResult<()> {
        for (i, resource) in resources.iter().enumerate() {
            let here = format!("{location}[{i}]");
            if let Some(options) = &resource.options {
                if let Some(integration) = &options.default_integration {
                    self.check_integration(integration, &format!("{here}.options"))?;
                }
                if let Some(method_options) = &options.default_method_options {
                    self.check_options(method_options, &format!("{here}.options"))?;
                }
            }
            for (j, method) in resource.methods.iter().enumerate() {
                self.check_method(method, &format!("{here}.methods[{j}]"))?;
            }
            self.check_resources(&resource.children, &format!("{here}.children"))?;
        }
        Ok(())
    }

    fn check_method(&self, method: &MethodDefinition, location: &str) -> ApplicationResult<()> {
        if let Some(integration) = &method.integration {
            self.check_integration(integration, location)?;
        }
        if let Some(options) = &method.options {
            self.check_options(options, location)?;
        }
        Ok(())
    }

    fn check_integration(&self, integration: &Integration, location: &str) -> ApplicationResult<()> {
        match integration {
            Integration::Lambda { function, .. } if !self.functions.contains_key(function) => {
                Err(ApplicationError::UnknownFunction {
                    function: function.clone(),
                    location: location.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_options(&self, options: &MethodOptions, location: &str) -> ApplicationResult<()> {
        match (&options.authorizer, options.authorization_type) {
            (Some(name), _) if !self.authorizers.contains_key(name) => {
                Err(ApplicationError::UnknownAuthorizer {
                    authorizer: name.clone(),
                    location: location.to_string(),
                })
            }
            (None, AuthorizationType::Custom) => Err(ApplicationError::MissingAuthorizer {
                location: location.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMO: &str = r#"
name = "primo-gateway"
description = "Primo Gateway API"

[functions.query]
handler = "query.handler"
description = "Query primo for documents by id."

[functions.favorites]
handler = "favorites.handler"
memory_size = 512

[authorizers.jwt]
function = "lambda-auth-dev"

[self_link]

[[resources]]
path_part = "query"

[[resources.methods]]
http_method = "GET"
integration = { type = "lambda", function = "query", cache_key_parameters = ["method.request.querystring.docids"] }
options = { request_parameters = { "method.request.querystring.docids" = true } }

[[resources]]
path_part = "favorites"

[[resources.methods]]
http_method = "GET"
integration = { type = "lambda", function = "favorites" }

[resources.methods.options]
authorization_type = "custom"
authorizer = "jwt"
request_parameters = { "method.request.header.Authorization" = true }
"#;

    #[test]
    fn given_primo_blueprint_when_parsing_then_reads_all_sections() {
        let bp = Blueprint::parse(PRIMO).unwrap();

        assert_eq!(bp.name, "primo-gateway");
        assert_eq!(bp.functions["query"].memory_size, 1024);
        assert_eq!(bp.functions["favorites"].memory_size, 512);
        assert_eq!(bp.functions["favorites"].timeout_secs, 30);
        assert_eq!(
            bp.authorizers["jwt"].identity_source,
            "method.request.header.Authorization"
        );
        assert_eq!(bp.self_link, Some(SelfLink::default()));
        assert_eq!(bp.resources.len(), 2);
        assert_eq!(bp.resource_count(), 2);
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn given_unknown_key_when_parsing_then_errors() {
        let result = Blueprint::parse("name = \"api\"\nresourcez = []\n");

        assert!(result.is_err());
    }

    #[test]
    fn given_unknown_function_when_validating_then_reports_location() {
        let bp = Blueprint::parse(
            r#"
name = "api"

[[resources]]
path_part = "a/b"

[[resources.children]]
path_part = "c"
methods = [{ http_method = "GET", integration = { type = "lambda", function = "missing" } }]
"#,
        )
        .unwrap();

        match bp.validate() {
            Err(ApplicationError::UnknownFunction { function, location }) => {
                assert_eq!(function, "missing");
                assert_eq!(location, "resources[0].children[0].methods[0]");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn given_unknown_authorizer_when_validating_then_errors() {
        let bp = Blueprint::parse(
            r#"
name = "api"
root_methods = [{ http_method = "GET", options = { authorization_type = "custom", authorizer = "nope" } }]
"#,
        )
        .unwrap();

        assert!(matches!(
            bp.validate(),
            Err(ApplicationError::UnknownAuthorizer { ref location, .. }) if location == "root_methods[0]"
        ));
    }

    #[test]
    fn given_custom_authorization_without_authorizer_when_validating_then_errors() {
        let bp = Blueprint::parse(
            r#"
name = "api"

[[resources]]
path_part = "secure"
options = { default_method_options = { authorization_type = "custom" } }
"#,
        )
        .unwrap();

        assert!(matches!(
            bp.validate(),
            Err(ApplicationError::MissingAuthorizer { ref location }) if location == "resources[0].options"
        ));
    }

    #[test]
    fn given_self_link_when_building_definition_then_get_returns_endpoint() {
        let def = SelfLink::default().definition("https://x.example/dev/");

        assert_eq!(def.path_part, "meta/endpoint");
        assert_eq!(
            def.methods[0].integration,
            Some(Integration::mock(200, Some("https://x.example/dev/".into())))
        );
    }

    #[test]
    fn given_function_spec_when_deploying_then_name_is_prefixed_with_api() {
        let spec = FunctionSpec {
            handler: "query.handler".into(),
            description: None,
            memory_size: default_memory_size(),
            timeout_secs: default_timeout_secs(),
        };

        let deployed = spec.deployed("primo-gateway", "query");

        assert_eq!(deployed.function_name, "primo-gateway-query");
        assert_eq!(deployed.handler, "query.handler");
        assert_eq!((deployed.memory_size, deployed.timeout_secs), (1024, 30));
    }
}
