//! Security requirement derivation from authorization annotations.
//!
//! Two deliberately independent passes: per-scheme processors
//! ([`SecurityProcessor`]) each append their own named scheme when any
//! authorization annotation maps to it, and a companion
//! [`SecurityScopeProcessor`] attaches role-derived scopes under a fixed
//! scheme name. The passes overlap by design and are not reconciled.

use handler_openapi_core::{AuthScheme, GroupDescriptor, HandlerAnnotation, HandlerDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::SecurityRequirement;
use crate::error::Result;
use crate::processor::{DocumentContext, DocumentProcessor, OperationContext, OperationProcessor};

/// Scheme type a [`SecurityProcessor`] is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecuritySchemeKind {
    /// HTTP Basic authentication.
    Basic,
    /// API key (header or query, per [`ApiKeyLocation`]).
    ApiKey,
    /// OAuth2 flows.
    #[serde(rename = "oauth2")]
    OAuth2,
    /// OpenID Connect (bearer JWT).
    OpenIdConnect,
}

/// Where an API-key scheme carries its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    /// Key in a request header.
    Header,
    /// Key in a query parameter.
    Query,
}

/// Authorization schemes named by either annotation family, method level
/// unioned with group level.
fn authorize_schemes(group: &GroupDescriptor, handler: &HandlerDescriptor) -> Vec<AuthScheme> {
    group
        .annotations
        .iter()
        .chain(handler.annotations.iter())
        .filter_map(|annotation| match annotation {
            HandlerAnnotation::Authorize { scheme }
            | HandlerAnnotation::AuthorizePolicy { scheme, .. } => Some(*scheme),
            _ => None,
        })
        .collect()
}

/// Appends one named security requirement when the handler's authorization
/// annotations map to the bound scheme type.
///
/// One instance per scheme actually used; each only ever adds its own scheme.
#[derive(Debug, Clone)]
pub struct SecurityProcessor {
    name: String,
    kind: SecuritySchemeKind,
    location: Option<ApiKeyLocation>,
}

impl SecurityProcessor {
    /// Processor bound to `name` with the given scheme type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SecuritySchemeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            location: None,
        }
    }

    /// Bind an API-key location (defaults to header when unset).
    #[must_use]
    pub const fn location(mut self, location: ApiKeyLocation) -> Self {
        self.location = Some(location);
        self
    }

    fn applies_to(&self, scheme: AuthScheme) -> bool {
        match (self.kind, scheme) {
            (SecuritySchemeKind::Basic, AuthScheme::Basic) => true,
            (SecuritySchemeKind::ApiKey, AuthScheme::HeaderApiKey) => {
                self.location.unwrap_or(ApiKeyLocation::Header) == ApiKeyLocation::Header
            }
            (SecuritySchemeKind::ApiKey, AuthScheme::QueryApiKey) => {
                self.location == Some(ApiKeyLocation::Query)
            }
            (
                SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect,
                AuthScheme::OAuth2 | AuthScheme::Jwt,
            ) => true,
            _ => false,
        }
    }
}

impl OperationProcessor for SecurityProcessor {
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool> {
        let applies = authorize_schemes(ctx.group, ctx.handler)
            .into_iter()
            .any(|scheme| self.applies_to(scheme));
        if applies {
            ctx.description
                .operation
                .security
                .push(SecurityRequirement::new(self.name.clone()));
        }
        Ok(true)
    }
}

/// Attaches role-derived scopes under one configured scheme name.
///
/// Reads the richer authorization annotation family only; when any is
/// present (method or group level), a requirement naming the configured
/// scheme is appended whose scopes are the comma-split role tokens, trimmed,
/// de-duplicated preserving first occurrence, with empty tokens dropped.
/// Runs regardless of which per-scheme processors also fired.
#[derive(Debug, Clone)]
pub struct SecurityScopeProcessor {
    name: String,
}

impl SecurityScopeProcessor {
    /// Scope processor attaching under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SecurityScopeProcessor {
    fn default() -> Self {
        Self::new("Bearer")
    }
}

impl OperationProcessor for SecurityScopeProcessor {
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool> {
        let policies: Vec<&HandlerAnnotation> = ctx
            .group
            .annotations
            .iter()
            .chain(ctx.handler.annotations.iter())
            .filter(|a| matches!(a, HandlerAnnotation::AuthorizePolicy { .. }))
            .collect();
        if policies.is_empty() {
            return Ok(true);
        }

        let mut scopes: Vec<String> = Vec::new();
        for annotation in policies {
            let HandlerAnnotation::AuthorizePolicy {
                roles: Some(roles), ..
            } = annotation
            else {
                continue;
            };
            for token in roles.split(',') {
                let token = token.trim();
                if !token.is_empty() && !scopes.iter().any(|s| s == token) {
                    scopes.push(token.to_string());
                }
            }
        }

        ctx.description.operation.security.push(SecurityRequirement {
            scheme: self.name.clone(),
            scopes,
        });
        Ok(true)
    }
}

/// Registers one named security scheme definition on the finished document.
///
/// Existing definitions with the same name (for example from a document
/// template) are left untouched.
#[derive(Debug, Clone)]
pub struct SecurityDefinitionAppender {
    name: String,
    scheme: Value,
}

impl SecurityDefinitionAppender {
    /// Appender registering `scheme` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, scheme: Value) -> Self {
        Self {
            name: name.into(),
            scheme,
        }
    }
}

impl DocumentProcessor for SecurityDefinitionAppender {
    fn process(&self, ctx: &mut DocumentContext<'_>) -> Result<()> {
        if !ctx.document.security_definitions().contains_key(&self.name) {
            ctx.document
                .add_security_definition(self.name.clone(), self.scheme.clone());
        }
        Ok(())
    }
}
