//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/restree/restree.toml`
//! 3. Local config: `<blueprint_dir>/.restree.toml`
//! 4. Environment variables: `RESTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, CorsOptions};

/// Default CORS preflight configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Add a preflight to every resource when the blueprint has no `[cors]`
    pub enabled: bool,
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub status_code: u16,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let options = CorsOptions::default();
        Self {
            enabled: false,
            allow_origins: options.allow_origins,
            allow_methods: options.allow_methods,
            allow_headers: options.allow_headers,
            allow_credentials: options.allow_credentials,
            status_code: options.status_code,
        }
    }
}

/// Raw CORS config for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCorsConfig {
    pub enabled: Option<bool>,
    pub allow_origins: Option<Vec<String>>,
    pub allow_methods: Option<Vec<String>>,
    pub allow_headers: Option<Vec<String>>,
    pub allow_credentials: Option<bool>,
    pub status_code: Option<u16>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub stage: Option<String>,
    pub region: Option<String>,
    pub blueprint: Option<PathBuf>,
    #[serde(default)]
    pub cors: RawCorsConfig,
}

impl CorsConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["GET", "POST"], &["PUT"])        // → ["GET", "POST", "PUT"]
    /// merge_array(&["GET", "POST"], &["!GET", "PUT"]) // → ["POST", "PUT"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Arrays: union merge with negation support (if overlay specified)
    pub fn merge(&self, overlay: &RawCorsConfig) -> Self {
        let merge = |base: &Vec<String>, over: &Option<Vec<String>>| {
            over.as_ref()
                .map(|o| Self::merge_array(base, o))
                .unwrap_or_else(|| base.clone())
        };
        Self {
            enabled: overlay.enabled.unwrap_or(self.enabled),
            allow_origins: merge(&self.allow_origins, &overlay.allow_origins),
            allow_methods: merge(&self.allow_methods, &overlay.allow_methods),
            allow_headers: merge(&self.allow_headers, &overlay.allow_headers),
            allow_credentials: overlay.allow_credentials.unwrap_or(self.allow_credentials),
            status_code: overlay.status_code.unwrap_or(self.status_code),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()` which uses union semantics for arrays, this method
    /// uses REPLACE semantics: if global config specifies an array, it completely
    /// replaces the default array.
    pub fn apply_global(&self, global: &RawCorsConfig) -> Self {
        Self {
            enabled: global.enabled.unwrap_or(self.enabled),
            allow_origins: global
                .allow_origins
                .clone()
                .unwrap_or_else(|| self.allow_origins.clone()),
            allow_methods: global
                .allow_methods
                .clone()
                .unwrap_or_else(|| self.allow_methods.clone()),
            allow_headers: global
                .allow_headers
                .clone()
                .unwrap_or_else(|| self.allow_headers.clone()),
            allow_credentials: global.allow_credentials.unwrap_or(self.allow_credentials),
            status_code: global.status_code.unwrap_or(self.status_code),
        }
    }

    /// Preflight options for the REST API model.
    pub fn to_options(&self) -> CorsOptions {
        CorsOptions {
            allow_origins: self.allow_origins.clone(),
            allow_methods: self.allow_methods.clone(),
            allow_headers: self.allow_headers.clone(),
            allow_credentials: self.allow_credentials,
            status_code: self.status_code,
        }
    }
}

/// Unified configuration for restree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Deployment stage (default: dev)
    pub stage: String,
    /// AWS region (default: $AWS_REGION or us-east-1)
    pub region: String,
    /// Blueprint file used when none is given on the command line
    pub blueprint: PathBuf,
    /// Default CORS preflight settings
    pub cors: CorsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());

        Self {
            stage: "dev".into(),
            region,
            blueprint: PathBuf::from("gateway.toml"),
            cors: CorsConfig::default(),
        }
    }
}

/// Get the XDG config directory for restree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "restree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("restree.toml"))
}

/// Get the path to the local config file next to a blueprint.
pub fn local_config_path(blueprint_dir: &Path) -> PathBuf {
    blueprint_dir.join(".restree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.blueprint.to_string_lossy().as_ref());
        self.blueprint = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            stage: overlay.stage.clone().unwrap_or_else(|| self.stage.clone()),
            region: overlay.region.clone().unwrap_or_else(|| self.region.clone()),
            blueprint: overlay
                .blueprint
                .clone()
                .unwrap_or_else(|| self.blueprint.clone()),
            cors: self.cors.merge(&overlay.cors),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            stage: global.stage.clone().unwrap_or_else(|| self.stage.clone()),
            region: global.region.clone().unwrap_or_else(|| self.region.clone()),
            blueprint: global
                .blueprint
                .clone()
                .unwrap_or_else(|| self.blueprint.clone()),
            cors: self.cors.apply_global(&global.cors),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional blueprint directory holding a `.restree.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply RESTREE_* environment variables as explicit overrides.
    ///
    /// Env vars replace values (not merge) - they are explicit user overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("RESTREE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allow_origins")
                .with_list_parse_key("cors.allow_methods")
                .with_list_parse_key("cors.allow_headers"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("stage") {
            settings.stage = val;
        }
        if let Ok(val) = config.get_string("region") {
            settings.region = val;
        }
        if let Ok(val) = config.get_string("blueprint") {
            settings.blueprint = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("cors.enabled") {
            settings.cors.enabled = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("cors.allow_origins") {
            settings.cors.allow_origins = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("cors.allow_methods") {
            settings.cors.allow_methods = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("cors.allow_headers") {
            settings.cors.allow_headers = val;
        }
        if let Ok(val) = config.get_bool("cors.allow_credentials") {
            settings.cors.allow_credentials = val;
        }
        if let Ok(val) = config.get::<u16>("cors.status_code") {
            settings.cors.status_code = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# restree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/restree/restree.toml  (defines your baseline)
#   Local:  <blueprint_dir>/.restree.toml   (project-specific additions)
#   Env:    RESTREE_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item:
#     allow_methods = ["!DELETE"]  # removes DELETE from the preflight

# Deployment stage, part of the endpoint URL
# stage = "dev"

# AWS region, part of the endpoint URL
# region = "us-east-1"

# Blueprint used when none is given
# blueprint = "gateway.toml"

[cors]
# Add an OPTIONS preflight to every resource (blueprint [cors] wins)
# enabled = false

# allow_origins = ["*"]
# allow_methods = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "ANY"]
# allow_headers = ["Content-Type", "X-Amz-Date", "Authorization", "X-Api-Key"]
# allow_credentials = false
# status_code = 200
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert!(!settings.stage.is_empty());
        assert!(!settings.region.is_empty());
        assert!(!settings.cors.allow_methods.is_empty());
    }

    #[test]
    fn given_negation_when_merging_arrays_then_removes_item() {
        let base = vec!["GET".to_string(), "POST".to_string()];
        let overlay = vec!["!GET".to_string(), "PUT".to_string()];

        assert_eq!(CorsConfig::merge_array(&base, &overlay), vec!["POST", "PUT"]);
    }

    #[test]
    fn given_global_arrays_when_applying_then_replaces_defaults() {
        let global = RawCorsConfig {
            allow_origins: Some(vec!["https://example.edu".into()]),
            ..Default::default()
        };

        let cors = CorsConfig::default().apply_global(&global);

        assert_eq!(cors.allow_origins, vec!["https://example.edu"]);
        assert_eq!(cors.allow_methods, CorsConfig::default().allow_methods);
    }

    #[test]
    fn given_defaults_when_loading_cors_then_preflight_status_is_200() {
        let settings = Settings::default();

        assert_eq!(settings.cors.status_code, 200);
        assert_eq!(settings.cors.to_options(), CorsOptions::default());
    }

    #[test]
    fn given_local_arrays_when_merging_then_unions_and_keeps_scalars() {
        let local = RawCorsConfig {
            enabled: Some(true),
            allow_origins: Some(vec!["https://example.edu".into()]),
            ..Default::default()
        };

        let cors = CorsConfig::default().merge(&local);

        assert!(cors.enabled);
        assert_eq!(cors.allow_origins, vec!["*", "https://example.edu"]);
        assert_eq!(cors.status_code, 200);
    }

    #[test]
    fn given_tilde_in_blueprint_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            blueprint: PathBuf::from("~/api/gateway.toml"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let blueprint = settings.blueprint.to_string_lossy();
        assert!(blueprint.starts_with(&home), "blueprint: {}", blueprint);
        assert!(!blueprint.contains('~'), "blueprint: {}", blueprint);
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("parse template");
        assert!(raw.stage.is_none());
        assert!(raw.cors.enabled.is_none());
    }

    #[test]
    fn given_settings_when_rendering_toml_then_round_trips() {
        let settings = Settings::default();
        let rendered = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }
}
