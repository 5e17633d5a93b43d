//! Operation and document processors.
//!
//! Processors are the extension seam of the generator. Operation processors
//! run once per `(path, method)` candidate and mutate the operation in
//! place; returning `Ok(false)` vetoes the candidate and stops its pipeline.
//! Document processors run once after assembly over the finished document.
//!
//! The built-in pipeline is [`OperationInfoProcessor`],
//! [`OperationParameterProcessor`], [`OperationResponseProcessor`]; security
//! processors are registered per project on top of it.

use handler_openapi_core::{GroupDescriptor, HandlerDescriptor};

use crate::document::{Definitions, Document, OperationDescription};
use crate::error::Result;
use crate::generate::GeneratorSettings;
use crate::schema::SchemaService;

mod info;
mod parameters;
mod responses;
mod security;

pub use info::OperationInfoProcessor;
pub use parameters::OperationParameterProcessor;
pub use responses::OperationResponseProcessor;
pub use security::{
    ApiKeyLocation, SecurityDefinitionAppender, SecurityProcessor, SecurityScopeProcessor,
    SecuritySchemeKind,
};

/// Mutable view of one operation candidate handed to operation processors.
pub struct OperationContext<'a> {
    /// Group declaring the handler.
    pub group: &'a GroupDescriptor,
    /// Handler the candidate was derived from.
    pub handler: &'a HandlerDescriptor,
    /// The candidate under construction (path, method, operation).
    pub description: &'a mut OperationDescription,
    /// Shared definition table of the document being assembled.
    pub definitions: &'a mut Definitions,
    /// Schema service for the document's dialect.
    pub schema: &'a dyn SchemaService,
    /// Generator settings in effect.
    pub settings: &'a GeneratorSettings,
}

/// A per-operation pipeline stage.
pub trait OperationProcessor {
    /// Mutate the candidate operation.
    ///
    /// Return `Ok(false)` to veto the candidate: it is discarded, later
    /// stages do not run, and nothing it produced reaches the document.
    ///
    /// # Errors
    /// Any error aborts the whole generation run.
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool>;
}

/// Mutable view of the assembled document handed to document processors.
pub struct DocumentContext<'a> {
    /// The document after all operations were inserted.
    pub document: &'a mut Document,
    /// The full catalog the document was generated from.
    pub catalog: &'a [GroupDescriptor],
    /// Schema service for the document's dialect.
    pub schema: &'a dyn SchemaService,
    /// Generator settings in effect.
    pub settings: &'a GeneratorSettings,
}

/// A whole-document pipeline stage, run after assembly.
pub trait DocumentProcessor {
    /// Mutate the finished document.
    ///
    /// # Errors
    /// Any error aborts the whole generation run.
    fn process(&self, ctx: &mut DocumentContext<'_>) -> Result<()>;
}
