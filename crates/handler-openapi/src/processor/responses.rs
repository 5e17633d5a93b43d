//! Response resolution from declared response annotations.

use handler_openapi_core::{HandlerAnnotation, TypeInfo};

use crate::document::Response;
use crate::error::Result;
use crate::processor::{OperationContext, OperationProcessor};

/// Emits one response entry per declared status code.
///
/// Two annotation families are honored, read from the handler and its return
/// position in declaration order; the first declaration of a status code
/// wins. A handler declaring nothing gets a degraded default: the configured
/// no-content status when its return carries no payload, otherwise a `200`
/// with the return type's schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationResponseProcessor;

impl OperationProcessor for OperationResponseProcessor {
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool> {
        let handler = ctx.handler;
        let declared: Vec<(u16, Option<&TypeInfo>, Option<&str>)> = handler
            .annotations
            .iter()
            .chain(handler.returns.annotations.iter())
            .filter_map(|annotation| match annotation {
                HandlerAnnotation::Response {
                    status,
                    ty,
                    description,
                } => Some((*status, ty.as_ref(), description.as_deref())),
                HandlerAnnotation::Produces { status, ty } => Some((*status, ty.as_ref(), None)),
                _ => None,
            })
            .collect();

        if declared.is_empty() {
            let (status, schema) = match &handler.returns.ty {
                Some(ty) => {
                    let schema = ctx.schema.generate_schema(ty, &[], false, ctx.definitions)?;
                    ("200".to_string(), Some(schema))
                }
                None => (ctx.settings.no_content_status.to_string(), None),
            };
            ctx.description.operation.responses.insert(
                status,
                Response {
                    description: String::new(),
                    schema,
                },
            );
            return Ok(true);
        }

        for (status, ty, description) in declared {
            let key = status.to_string();
            if ctx.description.operation.responses.contains_key(&key) {
                continue;
            }
            let schema = match ty {
                Some(ty) => Some(ctx.schema.generate_schema(ty, &[], false, ctx.definitions)?),
                None => None,
            };
            ctx.description.operation.responses.insert(
                key,
                Response {
                    description: description.unwrap_or_default().to_string(),
                    schema,
                },
            );
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use handler_openapi_core::{FieldInfo, GroupDescriptor, HandlerDescriptor, HttpMethod};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::{Definitions, OperationDescription, SchemaDialect};
    use crate::generate::GeneratorSettings;
    use crate::schema::StructuralSchemaService;

    fn run(handler: &HandlerDescriptor, settings: &GeneratorSettings) -> OperationDescription {
        let group = GroupDescriptor::new("Api");
        let schema = StructuralSchemaService::new(SchemaDialect::Swagger2);
        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let mut description = OperationDescription::new("api/pets", HttpMethod::Get);

        let keep = OperationResponseProcessor
            .process(&mut OperationContext {
                group: &group,
                handler,
                description: &mut description,
                definitions: &mut definitions,
                schema: &schema,
                settings,
            })
            .expect("response processor");
        assert!(keep);
        description
    }

    fn pet_type() -> TypeInfo {
        TypeInfo::object("Pet", vec![FieldInfo::new("name", TypeInfo::String)])
    }

    #[test]
    fn declared_response_with_type_and_description() {
        let handler = HandlerDescriptor::new("Get").annotation(HandlerAnnotation::Response {
            status: 200,
            ty: Some(pet_type()),
            description: Some("the pet".to_string()),
        });
        let description = run(&handler, &GeneratorSettings::default());

        let responses = &description.operation.responses;
        assert_eq!(responses.len(), 1);
        let ok = &responses["200"];
        assert_eq!(ok.description, "the pet");
        assert_eq!(
            ok.schema.as_ref().expect("schema")["$ref"],
            "#/definitions/Pet"
        );
    }

    #[test]
    fn terse_family_is_honored_alongside_rich_family() {
        let handler = HandlerDescriptor::new("Get")
            .annotation(HandlerAnnotation::Produces {
                status: 404,
                ty: None,
            })
            .annotation(HandlerAnnotation::Response {
                status: 200,
                ty: Some(pet_type()),
                description: None,
            });
        let description = run(&handler, &GeneratorSettings::default());

        let responses = &description.operation.responses;
        assert_eq!(responses.len(), 2);
        assert!(responses["404"].schema.is_none());
        assert_eq!(responses["404"].description, "");
    }

    #[test]
    fn return_position_annotations_are_read_after_handler_annotations() {
        let handler = HandlerDescriptor::new("Get").return_annotation(HandlerAnnotation::Produces {
            status: 201,
            ty: Some(pet_type()),
        });
        let description = run(&handler, &GeneratorSettings::default());
        assert!(description.operation.responses.contains_key("201"));
    }

    #[test]
    fn first_declaration_of_a_status_wins() {
        let handler = HandlerDescriptor::new("Get")
            .annotation(HandlerAnnotation::Response {
                status: 200,
                ty: None,
                description: Some("first".to_string()),
            })
            .annotation(HandlerAnnotation::Response {
                status: 200,
                ty: Some(pet_type()),
                description: Some("second".to_string()),
            });
        let description = run(&handler, &GeneratorSettings::default());

        let responses = &description.operation.responses;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses["200"].description, "first");
        assert!(responses["200"].schema.is_none());
    }

    #[test]
    fn undeclared_with_payload_defaults_to_200() {
        let handler = HandlerDescriptor::new("Get").returns(pet_type());
        let description = run(&handler, &GeneratorSettings::default());

        let responses = &description.operation.responses;
        assert_eq!(responses.len(), 1);
        assert_eq!(
            responses["200"].schema.as_ref().expect("schema")["$ref"],
            "#/definitions/Pet"
        );
    }

    #[test]
    fn undeclared_without_payload_defaults_to_no_content_status() {
        let handler = HandlerDescriptor::new("Delete");
        let description = run(&handler, &GeneratorSettings::default());

        let responses = &description.operation.responses;
        assert_eq!(responses.len(), 1);
        assert!(responses.contains_key("204"));
        assert!(responses["204"].schema.is_none());
    }

    #[test]
    fn no_content_status_is_configurable() {
        let settings = GeneratorSettings::default().no_content_status(202);
        let description = run(&HandlerDescriptor::new("Queue"), &settings);
        assert!(description.operation.responses.contains_key("202"));
    }
}
