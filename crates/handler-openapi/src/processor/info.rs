//! Descriptive operation metadata from annotations.

use handler_openapi_core::HandlerAnnotation;

use crate::error::Result;
use crate::processor::{OperationContext, OperationProcessor};

/// Applies summary, description and tags from the handler's operation
/// annotation. Operations without declared tags are tagged with their group
/// name so rendered docs group them sensibly.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationInfoProcessor;

impl OperationProcessor for OperationInfoProcessor {
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool> {
        let operation = &mut ctx.description.operation;

        for annotation in &ctx.handler.annotations {
            let HandlerAnnotation::Operation {
                summary,
                description,
                tags,
                ..
            } = annotation
            else {
                continue;
            };
            if let Some(summary) = summary {
                operation.summary = Some(summary.clone());
            }
            if let Some(description) = description {
                operation.description = Some(description.clone());
            }
            for tag in tags {
                if !operation.tags.contains(tag) {
                    operation.tags.push(tag.clone());
                }
            }
        }

        if operation.tags.is_empty() {
            operation.tags.push(ctx.group.name.clone());
        }
        Ok(true)
    }
}
