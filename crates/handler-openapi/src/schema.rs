//! Schema generation from declared handler types.
//!
//! [`SchemaService`] is the seam between the pipeline and type reflection:
//! processors only ever ask it to describe a type or produce a schema
//! fragment. [`StructuralSchemaService`] is the built-in implementation that
//! walks [`TypeInfo`] trees, registering each named object type once in the
//! shared [`Definitions`] table and referencing it everywhere else.

use handler_openapi_core::{FieldInfo, ParamAnnotation, TypeInfo};
use serde_json::{json, Map, Value};

use crate::document::{Definitions, SchemaDialect};
use crate::error::{Error, Result};

/// Shape facts the parameter resolver needs before committing to a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeDescription {
    /// The declared type admits an absent value.
    pub is_nullable: bool,
    /// The type is an uploaded file or a collection of them.
    pub is_file: bool,
    /// The type is an array.
    pub is_array: bool,
}

/// Produces schema fragments and type descriptions for declared types.
///
/// Implementations must be deterministic: the same type yields the same
/// fragment, and named definitions are registered at most once per document.
pub trait SchemaService {
    /// Shape facts for a declared type in the context of its annotations.
    fn describe(&self, ty: &TypeInfo, annotations: &[ParamAnnotation]) -> TypeDescription;

    /// Schema fragment for a declared type.
    ///
    /// Named object types are registered in `definitions` and returned as a
    /// `$ref`; everything else inlines. When `is_nullable` is set the
    /// fragment carries the dialect's nullability marker.
    ///
    /// # Errors
    /// Fails for types that cannot appear in a document, such as framework
    /// marker types.
    fn generate_schema(
        &self,
        ty: &TypeInfo,
        annotations: &[ParamAnnotation],
        is_nullable: bool,
        definitions: &mut Definitions,
    ) -> Result<Value>;
}

/// Built-in [`SchemaService`] over the descriptor type model.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralSchemaService {
    dialect: SchemaDialect,
}

impl StructuralSchemaService {
    /// Service producing fragments for the given dialect.
    #[must_use]
    pub const fn new(dialect: SchemaDialect) -> Self {
        Self { dialect }
    }

    fn nullable_key(self) -> &'static str {
        match self.dialect {
            SchemaDialect::Swagger2 => "x-nullable",
            SchemaDialect::OpenApi3 => "nullable",
        }
    }

    fn mark_nullable(self, fragment: Value) -> Value {
        match fragment {
            Value::Object(mut map) => {
                if map.contains_key("$ref") {
                    // A $ref must stand alone; wrap it instead of annotating it.
                    let mut wrapper = Map::new();
                    wrapper.insert(
                        "allOf".to_string(),
                        Value::Array(vec![Value::Object(map)]),
                    );
                    wrapper.insert(self.nullable_key().to_string(), Value::Bool(true));
                    Value::Object(wrapper)
                } else {
                    map.insert(self.nullable_key().to_string(), Value::Bool(true));
                    Value::Object(map)
                }
            }
            other => other,
        }
    }

    fn object_schema(
        self,
        name: &str,
        fields: &[FieldInfo],
        definitions: &mut Definitions,
    ) -> Result<Value> {
        if !definitions.contains(name) {
            // Placeholder first so self-referential types terminate.
            definitions.register(name, json!({"type": "object"}));

            let mut properties = Map::new();
            let mut required = Vec::new();
            for field in fields {
                let field_nullable = field.ty.is_nullable();
                let fragment =
                    self.fragment(field.ty.strip_optional(), field_nullable, definitions)?;
                properties.insert(field.name.clone(), fragment);
                if field.required {
                    required.push(Value::String(field.name.clone()));
                }
            }

            let mut schema = Map::new();
            schema.insert("type".to_string(), Value::String("object".to_string()));
            if !required.is_empty() {
                schema.insert("required".to_string(), Value::Array(required));
            }
            schema.insert("properties".to_string(), Value::Object(properties));
            definitions.register(name, Value::Object(schema));
        }
        Ok(definitions.schema_ref(name))
    }

    fn fragment(
        self,
        ty: &TypeInfo,
        is_nullable: bool,
        definitions: &mut Definitions,
    ) -> Result<Value> {
        let plain = match ty {
            TypeInfo::String => json!({"type": "string"}),
            TypeInfo::Integer => json!({"type": "integer", "format": "int32"}),
            TypeInfo::Long => json!({"type": "integer", "format": "int64"}),
            TypeInfo::Float => json!({"type": "number", "format": "float"}),
            TypeInfo::Double => json!({"type": "number", "format": "double"}),
            TypeInfo::Boolean => json!({"type": "boolean"}),
            TypeInfo::Uuid => json!({"type": "string", "format": "uuid"}),
            TypeInfo::DateTime => json!({"type": "string", "format": "date-time"}),
            TypeInfo::Bytes => json!({"type": "string", "format": "byte"}),
            TypeInfo::Xml => json!({"type": "string"}),
            TypeInfo::File | TypeInfo::FileCollection => json!({"type": "file"}),
            TypeInfo::Optional(inner) => {
                return self.fragment(inner, is_nullable, definitions);
            }
            TypeInfo::Array(item) => {
                let item_nullable = item.is_nullable();
                let items = self.fragment(item.strip_optional(), item_nullable, definitions)?;
                json!({"type": "array", "items": items})
            }
            TypeInfo::Object { name, fields } => {
                let reference = self.object_schema(name, fields, definitions)?;
                if is_nullable {
                    return Ok(self.mark_nullable(reference));
                }
                return Ok(reference);
            }
            TypeInfo::HttpValue(_)
            | TypeInfo::Request
            | TypeInfo::Logger
            | TypeInfo::Cancellation
            | TypeInfo::Principal => {
                return Err(Error::schema(
                    type_name(ty),
                    "framework types have no document schema",
                ));
            }
        };
        if is_nullable {
            Ok(self.mark_nullable(plain))
        } else {
            Ok(plain)
        }
    }
}

fn type_name(ty: &TypeInfo) -> String {
    match ty {
        TypeInfo::Object { name, .. } => name.clone(),
        TypeInfo::HttpValue(inner) => format!("HttpValue<{}>", type_name(inner)),
        TypeInfo::Optional(inner) => format!("Optional<{}>", type_name(inner)),
        TypeInfo::Array(item) => format!("Array<{}>", type_name(item)),
        other => format!("{other:?}"),
    }
}

impl SchemaService for StructuralSchemaService {
    fn describe(&self, ty: &TypeInfo, _annotations: &[ParamAnnotation]) -> TypeDescription {
        let stripped = ty.strip_optional();
        TypeDescription {
            is_nullable: ty.is_nullable(),
            is_file: stripped.is_file_like(),
            is_array: matches!(stripped, TypeInfo::Array(_)),
        }
    }

    fn generate_schema(
        &self,
        ty: &TypeInfo,
        _annotations: &[ParamAnnotation],
        is_nullable: bool,
        definitions: &mut Definitions,
    ) -> Result<Value> {
        self.fragment(ty.strip_optional(), is_nullable, definitions)
    }
}

#[cfg(test)]
mod tests {
    use handler_openapi_core::FieldInfo;
    use pretty_assertions::assert_eq;

    use super::*;

    fn service() -> StructuralSchemaService {
        StructuralSchemaService::new(SchemaDialect::Swagger2)
    }

    fn generate(ty: &TypeInfo) -> (Value, Definitions) {
        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let fragment = service()
            .generate_schema(ty, &[], false, &mut definitions)
            .expect("schema");
        (fragment, definitions)
    }

    #[test]
    fn primitive_fragments() {
        assert_eq!(generate(&TypeInfo::String).0, json!({"type": "string"}));
        assert_eq!(
            generate(&TypeInfo::Integer).0,
            json!({"type": "integer", "format": "int32"})
        );
        assert_eq!(
            generate(&TypeInfo::Uuid).0,
            json!({"type": "string", "format": "uuid"})
        );
        assert_eq!(
            generate(&TypeInfo::Bytes).0,
            json!({"type": "string", "format": "byte"})
        );
    }

    #[test]
    fn object_registers_once_and_refs() {
        let person = TypeInfo::object(
            "Person",
            vec![
                FieldInfo::new("name", TypeInfo::String).required(true),
                FieldInfo::new("age", TypeInfo::Integer),
            ],
        );

        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let first = service()
            .generate_schema(&person, &[], false, &mut definitions)
            .expect("schema");
        let second = service()
            .generate_schema(&person, &[], false, &mut definitions)
            .expect("schema");

        assert_eq!(first, json!({"$ref": "#/definitions/Person"}));
        assert_eq!(first, second);
        assert_eq!(definitions.len(), 1);
        let registered = definitions.get("Person").expect("registered");
        assert_eq!(registered["properties"]["name"], json!({"type": "string"}));
        assert_eq!(registered["required"], json!(["name"]));
    }

    #[test]
    fn self_referential_object_terminates() {
        let node = TypeInfo::object(
            "Node",
            vec![FieldInfo::new(
                "next",
                TypeInfo::optional(TypeInfo::object("Node", Vec::new())),
            )],
        );
        let (fragment, definitions) = generate(&node);
        assert_eq!(fragment, json!({"$ref": "#/definitions/Node"}));
        assert!(definitions.contains("Node"));
    }

    #[test]
    fn array_of_objects() {
        let pets = TypeInfo::array(TypeInfo::object(
            "Pet",
            vec![FieldInfo::new("name", TypeInfo::String)],
        ));
        let (fragment, definitions) = generate(&pets);
        assert_eq!(fragment["type"], "array");
        assert_eq!(fragment["items"], json!({"$ref": "#/definitions/Pet"}));
        assert!(definitions.contains("Pet"));
    }

    #[test]
    fn nullable_ref_wraps_in_all_of() {
        let person = TypeInfo::object("Person", Vec::new());
        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let fragment = service()
            .generate_schema(&person, &[], true, &mut definitions)
            .expect("schema");
        assert_eq!(fragment["allOf"][0], json!({"$ref": "#/definitions/Person"}));
        assert_eq!(fragment["x-nullable"], true);
    }

    #[test]
    fn nullable_primitive_gets_flag_inline() {
        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let fragment = service()
            .generate_schema(&TypeInfo::String, &[], true, &mut definitions)
            .expect("schema");
        assert_eq!(fragment, json!({"type": "string", "x-nullable": true}));
    }

    #[test]
    fn openapi3_uses_nullable_key() {
        let service = StructuralSchemaService::new(SchemaDialect::OpenApi3);
        let mut definitions = Definitions::new(SchemaDialect::OpenApi3);
        let fragment = service
            .generate_schema(&TypeInfo::String, &[], true, &mut definitions)
            .expect("schema");
        assert_eq!(fragment, json!({"type": "string", "nullable": true}));
    }

    #[test]
    fn optional_wrapper_is_stripped_and_needs_the_explicit_flag() {
        // Callers decide nullability via describe(); the wrapper alone does
        // not mark the fragment.
        let (fragment, _) = generate(&TypeInfo::optional(TypeInfo::Integer));
        assert_eq!(fragment, json!({"type": "integer", "format": "int32"}));

        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let marked = service()
            .generate_schema(
                &TypeInfo::optional(TypeInfo::Integer),
                &[],
                true,
                &mut definitions,
            )
            .expect("schema");
        assert_eq!(
            marked,
            json!({"type": "integer", "format": "int32", "x-nullable": true})
        );
    }

    #[test]
    fn framework_types_are_rejected() {
        let mut definitions = Definitions::new(SchemaDialect::Swagger2);
        let err = service()
            .generate_schema(&TypeInfo::Request, &[], false, &mut definitions)
            .expect_err("framework type");
        assert!(err.to_string().contains("no document schema"));
    }

    #[test]
    fn describe_reports_shape_facts() {
        let files = TypeInfo::optional(TypeInfo::FileCollection);
        let description = service().describe(&files, &[]);
        assert!(description.is_nullable);
        assert!(description.is_file);

        let list = service().describe(&TypeInfo::array(TypeInfo::String), &[]);
        assert!(list.is_array);
        assert!(!list.is_nullable);
    }
}
