#![allow(clippy::doc_markdown)] // README uses "OpenAPI" proper noun throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod discover;
mod document;
mod error;
mod generate;
mod processor;
mod route;
mod schema;

/// Handler metadata descriptor types re-exported from [`handler_openapi_core`].
pub use handler_openapi_core::descriptor;

pub use config::{ProjectConfig, SecurityEntry};
pub use document::{
    CollectionFormat, Definitions, Document, Info, Operation, OperationDescription, Parameter,
    ParameterKind, Response, SchemaDialect, SecurityRequirement,
};
pub use error::{Error, Result};
pub use generate::{DocumentGenerator, GeneratorSettings};
pub use processor::{
    ApiKeyLocation, DocumentContext, DocumentProcessor, OperationContext, OperationInfoProcessor,
    OperationParameterProcessor, OperationProcessor, OperationResponseProcessor,
    SecurityDefinitionAppender, SecurityProcessor, SecurityScopeProcessor, SecuritySchemeKind,
};
pub use schema::{SchemaService, StructuralSchemaService, TypeDescription};
