//! Declarative resource and method definitions
//!
//! These are the immutable inputs of the tree builder. They deserialize
//! straight from the blueprint TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A requested resource node.
///
/// `path_part` may contain several `/`-delimited segments; only the node of
/// the last segment receives `methods` and `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub path_part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ResourceOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceDefinition>,
}

impl ResourceDefinition {
    pub fn new(path_part: impl Into<String>) -> Self {
        Self {
            path_part: path_part.into(),
            options: None,
            methods: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ResourceOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_child(mut self, child: ResourceDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Non-empty segments of `path_part`, in order.
    pub fn segments(&self) -> Vec<&str> {
        split_path_part(&self.path_part)
    }

    /// Number of nodes this definition creates, nested children included.
    pub fn node_count(&self) -> usize {
        self.segments().len()
            + self
                .children
                .iter()
                .map(ResourceDefinition::node_count)
                .sum::<usize>()
    }
}

/// Split a path part on `/`, dropping empty segments.
///
/// `"a//b"` and `"/a/b/"` both yield `["a", "b"]`.
pub fn split_path_part(path_part: &str) -> Vec<&str> {
    path_part.split('/').filter(|s| !s.is_empty()).collect()
}

/// An HTTP verb bound to a resource, with an optional integration target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<Integration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MethodOptions>,
}

impl MethodDefinition {
    pub fn new(http_method: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            integration: None,
            options: None,
        }
    }

    pub fn with_integration(mut self, integration: Integration) -> Self {
        self.integration = Some(integration);
        self
    }

    pub fn with_options(mut self, options: MethodOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Options applied when a resource node is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOptions {
    /// Integration used by methods that declare none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_integration: Option<Integration>,
    /// Method options used by methods that declare none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_method_options: Option<MethodOptions>,
    /// Preflight settings for this resource, overriding the API default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsOptions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationType {
    #[default]
    None,
    Custom,
    Iam,
    Cognito,
}

/// Per-method options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodOptions {
    pub authorization_type: AuthorizationType,
    /// Name of a blueprint authorizer, required for `Custom`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<String>,
    /// Request parameter name -> required
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, bool>,
    pub api_key_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

/// Backend target of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Integration {
    Lambda {
        /// Key of a function declared in the blueprint
        function: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cache_key_parameters: Vec<String>,
        #[serde(default = "default_true")]
        proxy: bool,
    },
    Http {
        url: String,
        #[serde(default = "default_http_method")]
        http_method: String,
    },
    Mock {
        #[serde(default = "default_status_code")]
        status_code: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_body: Option<String>,
    },
}

impl Integration {
    pub fn lambda(function: impl Into<String>) -> Self {
        Integration::Lambda {
            function: function.into(),
            cache_key_parameters: Vec::new(),
            proxy: true,
        }
    }

    pub fn mock(status_code: u16, response_body: Option<String>) -> Self {
        Integration::Mock {
            status_code,
            response_body,
        }
    }

    /// Short label for listings, e.g. `lambda:query`.
    pub fn label(&self) -> String {
        match self {
            Integration::Lambda { function, .. } => format!("lambda:{function}"),
            Integration::Http { url, http_method } => format!("http:{http_method} {url}"),
            Integration::Mock { status_code, .. } => format!("mock:{status_code}"),
        }
    }
}

/// CORS preflight settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsOptions {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub status_code: u16,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".into()],
            allow_methods: ALL_METHODS.iter().map(|m| m.to_string()).collect(),
            allow_headers: vec![
                "Content-Type".into(),
                "X-Amz-Date".into(),
                "Authorization".into(),
                "X-Api-Key".into(),
            ],
            allow_credentials: false,
            status_code: 200,
        }
    }
}

/// HTTP verbs accepted by the gateway. `ANY` matches every verb.
pub const ALL_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "ANY",
];

fn default_true() -> bool {
    true
}

fn default_http_method() -> String {
    "GET".into()
}

fn default_status_code() -> u16 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("query", vec!["query"])]
    #[case("a/b/c", vec!["a", "b", "c"])]
    #[case("a//b", vec!["a", "b"])]
    #[case("/a/b/", vec!["a", "b"])]
    #[case("{id}", vec!["{id}"])]
    #[case("", vec![])]
    #[case("/", vec![])]
    #[case("//", vec![])]
    fn given_path_part_when_splitting_then_drops_empty_segments(
        #[case] input: &str,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(split_path_part(input), expected);
    }

    #[test]
    fn given_nested_definition_when_counting_nodes_then_includes_synthetic_segments() {
        let def = ResourceDefinition::new("a/b")
            .with_child(ResourceDefinition::new("c"))
            .with_child(ResourceDefinition::new("d/e/f"));

        assert_eq!(def.node_count(), 6);
    }

    #[test]
    fn given_lambda_integration_toml_when_parsing_then_defaults_proxy() {
        let method: MethodDefinition = toml::from_str(
            r#"
http_method = "GET"
integration = { type = "lambda", function = "query", cache_key_parameters = ["method.request.querystring.docids"] }
"#,
        )
        .unwrap();

        assert_eq!(
            method.integration,
            Some(Integration::Lambda {
                function: "query".into(),
                cache_key_parameters: vec!["method.request.querystring.docids".into()],
                proxy: true,
            })
        );
        assert_eq!(method.options, None);
    }

    #[test]
    fn given_method_options_toml_when_parsing_then_reads_request_parameters() {
        let options: MethodOptions = toml::from_str(
            r#"
authorization_type = "custom"
authorizer = "jwt"

[request_parameters]
"method.request.header.Authorization" = true
"method.request.querystring.alephId" = false
"#,
        )
        .unwrap();

        assert_eq!(options.authorization_type, AuthorizationType::Custom);
        assert_eq!(options.authorizer.as_deref(), Some("jwt"));
        assert_eq!(
            options.request_parameters.get("method.request.header.Authorization"),
            Some(&true)
        );
        assert!(!options.api_key_required);
    }

    #[test]
    fn given_integrations_when_labelling_then_names_target() {
        assert_eq!(Integration::lambda("query").label(), "lambda:query");
        assert_eq!(Integration::mock(200, None).label(), "mock:200");
    }
}
