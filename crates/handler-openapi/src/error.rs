//! Typed error enum for the `handler-openapi` library API.
//!
//! Library consumers can match on specific variants. The CLI (`main.rs`)
//! converts these to `anyhow::Error` at the binary boundary for richer
//! context messages.

use handler_openapi_core::HttpMethod;

/// Errors produced by `handler-openapi` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading catalog, config, or template files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing or serialization failure (document template or output).
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Two handlers resolved to the same `(path, method)` pair.
    ///
    /// Overlapping routes are a defect in the handler catalog; fix the route
    /// templates rather than relying on registration order.
    #[error(
        "duplicate route registration for {method} '{path}': \
         '{first}' and '{second}' resolve to the same path and method"
    )]
    DuplicateRoute {
        /// The colliding path.
        path: String,
        /// The colliding HTTP method.
        method: HttpMethod,
        /// Operation id of the handler registered first.
        first: String,
        /// Operation id of the handler that collided.
        second: String,
    },

    /// The schema service could not resolve a referenced type.
    #[error("schema generation failed for type '{type_name}': {reason}")]
    Schema {
        /// Name of the unresolvable type.
        type_name: String,
        /// What went wrong.
        reason: String,
    },
}

impl Error {
    /// Schema-service failure for `type_name`.
    #[must_use]
    pub fn schema(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;
