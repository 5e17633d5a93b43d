//! Project-level generation configuration loaded from YAML.
//!
//! Externalizes project-specific knobs (document metadata, route prefix,
//! parameter toggles, security schemes) so they live next to the project
//! files instead of being hardcoded in Rust source.
//!
//! # File format
//!
//! ```yaml
//! # openapi-config.yaml
//! title: Pet Store
//! version: "2.1.0"
//! dialect: swagger2
//! route_prefix: api
//!
//! # Synthesize path parameters for placeholders no parameter matched.
//! add_missing_path_parameters: true
//!
//! # Security schemes to register and match against handler annotations.
//! security:
//!   - name: Bearer
//!     kind: open_id_connect
//!     description: "JWT bearer token"
//!   - name: ApiKey
//!     kind: api_key
//!     location: query
//!     parameter_name: api_key
//!
//! # Scheme name the role-scope requirements attach under.
//! scope_scheme: Bearer
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::document::SchemaDialect;
use crate::processor::{ApiKeyLocation, SecuritySchemeKind};

/// Project-level generation config.
///
/// Loaded from a YAML file via [`ProjectConfig::load`], then applied to a
/// [`GeneratorSettings`](crate::GeneratorSettings) via
/// [`with_project_config`](crate::GeneratorSettings::with_project_config).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Document title; falls back to the generator default when absent.
    pub title: Option<String>,

    /// Document description.
    pub description: Option<String>,

    /// API version string; falls back to the generator default when absent.
    pub version: Option<String>,

    /// Target schema dialect.
    pub dialect: SchemaDialect,

    /// Canonical route prefix (e.g., `api`).
    pub route_prefix: String,

    /// Synthesize required path parameters for unmatched placeholders.
    pub add_missing_path_parameters: bool,

    /// Allow nullable body parameter types to be marked nullable.
    pub allow_nullable_body_parameters: bool,

    /// Security schemes to register and match against handler annotations.
    pub security: Vec<SecurityEntry>,

    /// Scheme name the role-scope requirements attach under (e.g., `Bearer`).
    pub scope_scheme: String,
}

/// One configured security scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityEntry {
    /// Definition key and requirement name (e.g., `Bearer`).
    pub name: String,
    /// Scheme type matched against handler authorization annotations.
    pub kind: SecuritySchemeKind,
    /// API-key location; header when absent.
    pub location: Option<ApiKeyLocation>,
    /// Header or query parameter carrying the credential; `Authorization`
    /// when absent.
    pub parameter_name: Option<String>,
    /// Human-readable description copied into the scheme definition.
    pub description: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            version: None,
            dialect: SchemaDialect::default(),
            route_prefix: "api".to_string(),
            add_missing_path_parameters: false,
            allow_nullable_body_parameters: true,
            security: Vec::new(),
            scope_scheme: "Bearer".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}

impl SecurityEntry {
    /// Scheme definition value for the target dialect.
    ///
    /// Swagger 2.0 has no bearer scheme type, so OAuth2 and OpenID Connect
    /// entries fall back to the conventional `apiKey`-in-header form there.
    #[must_use]
    pub fn scheme_value(&self, dialect: SchemaDialect) -> Value {
        let parameter = self.parameter_name.as_deref().unwrap_or("Authorization");
        let location = match self.location.unwrap_or(ApiKeyLocation::Header) {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "query",
        };

        let mut scheme = match (dialect, self.kind) {
            (SchemaDialect::Swagger2, SecuritySchemeKind::Basic) => json!({ "type": "basic" }),
            (SchemaDialect::OpenApi3, SecuritySchemeKind::Basic) => {
                json!({ "type": "http", "scheme": "basic" })
            }
            (_, SecuritySchemeKind::ApiKey) => {
                json!({ "type": "apiKey", "name": parameter, "in": location })
            }
            (
                SchemaDialect::Swagger2,
                SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect,
            ) => {
                json!({ "type": "apiKey", "name": parameter, "in": "header" })
            }
            (
                SchemaDialect::OpenApi3,
                SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect,
            ) => {
                json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" })
            }
        };
        if let (Some(description), Some(map)) = (&self.description, scheme.as_object_mut()) {
            map.insert("description".to_string(), Value::String(description.clone()));
        }
        scheme
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deserialize_defaults() {
        let config: ProjectConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert!(config.title.is_none());
        assert!(config.version.is_none());
        assert_eq!(config.dialect, SchemaDialect::Swagger2);
        assert_eq!(config.route_prefix, "api");
        assert!(!config.add_missing_path_parameters);
        assert!(config.allow_nullable_body_parameters);
        assert!(config.security.is_empty());
        assert_eq!(config.scope_scheme, "Bearer");
    }

    #[test]
    fn deserialize_full() {
        let yaml = r#"
title: Pet Store
description: "Pets and their toys"
version: "2.1.0"
dialect: openapi3
route_prefix: v2
add_missing_path_parameters: true
allow_nullable_body_parameters: false
security:
  - name: Bearer
    kind: open_id_connect
    description: "JWT bearer token"
  - name: ApiKey
    kind: api_key
    location: query
    parameter_name: api_key
scope_scheme: Bearer
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.title.as_deref(), Some("Pet Store"));
        assert_eq!(config.version.as_deref(), Some("2.1.0"));
        assert_eq!(config.dialect, SchemaDialect::OpenApi3);
        assert_eq!(config.route_prefix, "v2");
        assert!(config.add_missing_path_parameters);
        assert!(!config.allow_nullable_body_parameters);
        assert_eq!(config.security.len(), 2);
        assert_eq!(config.security[0].name, "Bearer");
        assert_eq!(config.security[0].kind, SecuritySchemeKind::OpenIdConnect);
        assert!(config.security[0].location.is_none());
        assert_eq!(config.security[1].kind, SecuritySchemeKind::ApiKey);
        assert_eq!(config.security[1].location, Some(ApiKeyLocation::Query));
        assert_eq!(config.security[1].parameter_name.as_deref(), Some("api_key"));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("handler-openapi-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test-config.yaml");
        std::fs::write(&path, "title: Loaded\nroute_prefix: v1\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.title.as_deref(), Some("Loaded"));
        assert_eq!(config.route_prefix, "v1");
        // Defaults still apply
        assert!(config.allow_nullable_body_parameters);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = ProjectConfig::load(Path::new("/nonexistent/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_yaml_returns_error() {
        let dir = std::env::temp_dir().join("handler-openapi-config-test-invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.yaml");
        std::fs::write(&path, "security: [[[invalid").unwrap();

        let result = ProjectConfig::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn bearer_scheme_falls_back_to_api_key_in_swagger2() {
        let entry = SecurityEntry {
            name: "Bearer".to_string(),
            kind: SecuritySchemeKind::OpenIdConnect,
            location: None,
            parameter_name: None,
            description: Some("JWT bearer token".to_string()),
        };
        assert_eq!(
            entry.scheme_value(SchemaDialect::Swagger2),
            serde_json::json!({
                "type": "apiKey",
                "name": "Authorization",
                "in": "header",
                "description": "JWT bearer token",
            })
        );
        assert_eq!(
            entry.scheme_value(SchemaDialect::OpenApi3),
            serde_json::json!({
                "type": "http",
                "scheme": "bearer",
                "bearerFormat": "JWT",
                "description": "JWT bearer token",
            })
        );
    }

    #[test]
    fn api_key_scheme_honors_location_and_name() {
        let entry = SecurityEntry {
            name: "ApiKey".to_string(),
            kind: SecuritySchemeKind::ApiKey,
            location: Some(ApiKeyLocation::Query),
            parameter_name: Some("api_key".to_string()),
            description: None,
        };
        assert_eq!(
            entry.scheme_value(SchemaDialect::Swagger2),
            serde_json::json!({ "type": "apiKey", "name": "api_key", "in": "query" })
        );
    }
}
