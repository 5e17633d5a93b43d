//! The generated API description document and its building blocks.
//!
//! [`Document`] owns the path → method → [`Operation`] map, the shared
//! [`Definitions`] table and the security scheme definitions. Insertion goes
//! through [`Document::insert`], which enforces the fatal `(path, method)`
//! collision rule. Serialization is dialect-aware: Swagger 2.0 emits
//! `swagger: "2.0"` with a root `definitions` table, OpenAPI 3 emits
//! `openapi: "3.0.3"` with `components.schemas`.

use std::collections::BTreeMap;

use handler_openapi_core::HttpMethod;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Which description dialect the document targets.
///
/// The dialects differ in how nullability is represented: Swagger 2.0 uses a
/// raw `x-nullable` flag, OpenAPI 3 expresses it structurally inside the
/// schema fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaDialect {
    /// Swagger 2.0 (`swagger: "2.0"`, `#/definitions/` references).
    #[default]
    Swagger2,
    /// OpenAPI 3.0 (`openapi: "3.0.3"`, `#/components/schemas/` references).
    OpenApi3,
}

impl SchemaDialect {
    /// Reference prefix for named schema definitions.
    #[must_use]
    pub const fn ref_prefix(self) -> &'static str {
        match self {
            Self::Swagger2 => "#/definitions/",
            Self::OpenApi3 => "#/components/schemas/",
        }
    }
}

/// Shared schema definition table, keyed by type identity.
///
/// Mutated by reference across every operation of one document so each
/// distinct type gets at most one named definition. Not designed for
/// concurrent mutation; one instance per document.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    dialect: SchemaDialect,
    schemas: BTreeMap<String, Value>,
}

impl Definitions {
    /// Empty table for the given dialect.
    #[must_use]
    pub const fn new(dialect: SchemaDialect) -> Self {
        Self {
            dialect,
            schemas: BTreeMap::new(),
        }
    }

    /// Dialect the table produces references for.
    #[must_use]
    pub const fn dialect(&self) -> SchemaDialect {
        self.dialect
    }

    /// `true` when a definition with this name is already registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Register (or overwrite) a named definition.
    pub fn register(&mut self, name: impl Into<String>, schema: Value) {
        self.schemas.insert(name.into(), schema);
    }

    /// `$ref` fragment pointing at a named definition.
    #[must_use]
    pub fn schema_ref(&self, name: &str) -> Value {
        let mut map = Map::new();
        map.insert(
            "$ref".to_string(),
            Value::String(format!("{}{name}", self.dialect.ref_prefix())),
        );
        Value::Object(map)
    }

    /// Registered definition body, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Registered definition names, in serialization order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// `true` when no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn to_value(&self) -> Value {
        Value::Object(self.schemas.clone().into_iter().collect())
    }
}

/// Binding kind of a resolved parameter.
///
/// `File` is a form-data parameter whose schema type is `file`; it shares the
/// `formData` location on the wire but is tracked separately so media-type
/// side effects can tell uploads apart from plain form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Path placeholder parameter.
    Path,
    /// Query-string parameter.
    Query,
    /// Request-header parameter.
    Header,
    /// URL-encoded form field.
    FormData,
    /// Request body.
    Body,
    /// Uploaded file (multipart form data).
    File,
}

impl ParameterKind {
    /// Wire location (`in` field) for this kind.
    #[must_use]
    pub const fn location(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::FormData | Self::File => "formData",
            Self::Body => "body",
        }
    }
}

/// Wire encoding for array-valued non-body parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// Comma-separated values.
    Csv,
    /// Space-separated values.
    Ssv,
    /// Tab-separated values.
    Tsv,
    /// Pipe-separated values.
    Pipes,
    /// The parameter repeats once per value (also: multiple uploaded files).
    Multi,
}

impl CollectionFormat {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Ssv => "ssv",
            Self::Tsv => "tsv",
            Self::Pipes => "pipes",
            Self::Multi => "multi",
        }
    }
}

/// One resolved operation parameter.
///
/// `schema` is the opaque fragment produced by the schema service. Body
/// parameters serialize it under a `schema` key; every other kind flattens the
/// fragment into the parameter object, Swagger 2.0 style.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name in the document.
    pub name: String,
    /// Binding kind; never changes after insertion.
    pub kind: ParameterKind,
    /// Required flag (always `true` for path parameters).
    pub required: bool,
    /// Free-text description.
    pub description: Option<String>,
    /// 1-based declaration position (`x-position`); unset for synthesized
    /// parameters.
    pub position: Option<u32>,
    /// Raw nullability flag (`x-nullable`); cleared in the OpenAPI 3 dialect.
    pub nullable: Option<bool>,
    /// Collection format; set to [`CollectionFormat::Multi`] for multi-file
    /// uploads, unset otherwise.
    pub collection_format: Option<CollectionFormat>,
    /// Schema fragment from the schema service.
    pub schema: Value,
}

impl Parameter {
    /// New parameter with the mandatory fields; everything else unset.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind, schema: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            position: None,
            nullable: None,
            collection_format: None,
            schema,
        }
    }

    /// `true` for uploaded-file parameters.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == ParameterKind::File
    }
}

impl Serialize for Parameter {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert(
            "in".to_string(),
            Value::String(self.kind.location().to_string()),
        );
        map.insert("required".to_string(), Value::Bool(self.required));
        if let Some(description) = &self.description {
            map.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(position) = self.position {
            map.insert("x-position".to_string(), Value::Number(position.into()));
        }
        if let Some(nullable) = self.nullable {
            map.insert("x-nullable".to_string(), Value::Bool(nullable));
        }
        if let Some(format) = self.collection_format {
            map.insert(
                "collectionFormat".to_string(),
                Value::String(format.as_str().to_string()),
            );
        }
        if self.kind == ParameterKind::Body {
            map.insert("schema".to_string(), self.schema.clone());
        } else if let Value::Object(fragment) = &self.schema {
            for (key, value) in fragment {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        map.serialize(serializer)
    }
}

/// One response entry, keyed by status code in [`Operation::responses`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    /// Human-readable description (may be empty).
    pub description: String,
    /// Response payload schema, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Named security scheme reference with scope strings.
///
/// Serialized as the standard single-entry map `{scheme: [scopes]}`. An
/// operation with an empty security list simply declares nothing — presence
/// or absence is the only signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirement {
    /// Referenced scheme name.
    pub scheme: String,
    /// Granted scope strings; empty for scope-less schemes.
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Requirement naming `scheme` with no scopes.
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: Vec::new(),
        }
    }
}

impl Serialize for SecurityRequirement {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.scheme, &self.scopes)?;
        map.end()
    }
}

/// One fully-resolved operation: parameters, responses, security, metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Operation {
    /// Document-wide unique id.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Short summary line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for grouping in rendered docs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Consumed media types; `None` inherits the document default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    /// Produced media types; `None` inherits the document default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    /// Deprecation marker.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Resolved parameters in position order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code string.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Response>,
    /// Security requirements; empty means none declared.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    /// First parameter with the given name, if any.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// An operation candidate in flight: concrete path, method, and the
/// in-progress [`Operation`] the pipeline mutates.
#[derive(Debug, Clone)]
pub struct OperationDescription {
    /// Concrete path template (no optional markers).
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Operation under construction.
    pub operation: Operation,
}

impl OperationDescription {
    /// New candidate with an empty operation.
    #[must_use]
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            operation: Operation::default(),
        }
    }
}

/// `info` block of the generated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// API version string.
    #[serde(default)]
    pub version: String,
}

/// The generated API description document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    dialect: SchemaDialect,
    /// Info block.
    pub info: Info,
    /// Document-default consumed media types.
    pub consumes: Vec<String>,
    /// Document-default produced media types.
    pub produces: Vec<String>,
    /// Generator banner (`x-generator`).
    pub generator: Option<String>,
    paths: BTreeMap<String, BTreeMap<HttpMethod, Operation>>,
    definitions: Definitions,
    security_definitions: BTreeMap<String, Value>,
    used_handlers: Vec<String>,
    extra: BTreeMap<String, Value>,
}

impl Document {
    /// Fresh empty document for the given dialect.
    #[must_use]
    pub fn new(dialect: SchemaDialect) -> Self {
        Self {
            dialect,
            definitions: Definitions::new(dialect),
            ..Self::default()
        }
    }

    /// Pre-seed a document from a JSON template.
    ///
    /// Consumes the template's `info`, media-type defaults, schema definitions
    /// and security definitions; unrecognized top-level keys are preserved
    /// verbatim in the output. Template `paths` are not merged — operations
    /// only ever come from the handler catalog.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when the template is not a JSON object or a
    /// recognized section has the wrong shape.
    pub fn from_template(template: &str, dialect: SchemaDialect) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(template)?;
        let mut document = Self::new(dialect);

        for (key, value) in map {
            match key.as_str() {
                "info" => document.info = serde_json::from_value(value)?,
                "consumes" => document.consumes = serde_json::from_value(value)?,
                "produces" => document.produces = serde_json::from_value(value)?,
                "definitions" => {
                    let schemas: Map<String, Value> = serde_json::from_value(value)?;
                    for (name, schema) in schemas {
                        document.definitions.register(name, schema);
                    }
                }
                "securityDefinitions" => {
                    document.security_definitions = serde_json::from_value(value)?;
                }
                "components" => {
                    let mut components: Map<String, Value> = serde_json::from_value(value)?;
                    if let Some(schemas) = components.remove("schemas") {
                        let schemas: Map<String, Value> = serde_json::from_value(schemas)?;
                        for (name, schema) in schemas {
                            document.definitions.register(name, schema);
                        }
                    }
                    if let Some(schemes) = components.remove("securitySchemes") {
                        document.security_definitions = serde_json::from_value(schemes)?;
                    }
                    if !components.is_empty() {
                        document
                            .extra
                            .insert("components".to_string(), Value::Object(components));
                    }
                }
                // Dialect markers, the banner, and paths are always rebuilt.
                "swagger" | "openapi" | "x-generator" | "paths" => {}
                _ => {
                    document.extra.insert(key, value);
                }
            }
        }
        Ok(document)
    }

    /// Dialect the document targets.
    #[must_use]
    pub const fn dialect(&self) -> SchemaDialect {
        self.dialect
    }

    /// Insert a finished operation.
    ///
    /// Duplicate slashes in the path are collapsed first.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateRoute`] when the `(path, method)` pair is
    /// already registered, naming both operations.
    pub fn insert(&mut self, description: OperationDescription) -> Result<()> {
        let mut path = description.path;
        while path.contains("//") {
            path = path.replace("//", "/");
        }

        let methods = self.paths.entry(path.clone()).or_default();
        if let Some(existing) = methods.get(&description.method) {
            return Err(Error::DuplicateRoute {
                path,
                method: description.method,
                first: existing.operation_id.clone().unwrap_or_default(),
                second: description.operation.operation_id.unwrap_or_default(),
            });
        }
        methods.insert(description.method, description.operation);
        Ok(())
    }

    /// Raw path map.
    #[must_use]
    pub const fn paths(&self) -> &BTreeMap<String, BTreeMap<HttpMethod, Operation>> {
        &self.paths
    }

    /// Flattened `(path, method, operation)` view, in path order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, methods)| {
            methods
                .iter()
                .map(move |(method, operation)| (path.as_str(), *method, operation))
        })
    }

    /// `true` when any operation already carries this id.
    #[must_use]
    pub fn has_operation_id(&self, id: &str) -> bool {
        self.operations()
            .any(|(_, _, op)| op.operation_id.as_deref() == Some(id))
    }

    /// Shared definition table.
    #[must_use]
    pub const fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Mutable access to the shared definition table.
    pub fn definitions_mut(&mut self) -> &mut Definitions {
        &mut self.definitions
    }

    /// Registered security scheme definitions.
    #[must_use]
    pub const fn security_definitions(&self) -> &BTreeMap<String, Value> {
        &self.security_definitions
    }

    /// Register a named security scheme definition (overwrites).
    pub fn add_security_definition(&mut self, name: impl Into<String>, scheme: Value) {
        self.security_definitions.insert(name.into(), scheme);
    }

    /// Idents of handlers that contributed at least one operation.
    #[must_use]
    pub fn used_handlers(&self) -> &[String] {
        &self.used_handlers
    }

    pub(crate) fn record_used_handler(&mut self, ident: impl Into<String>) {
        self.used_handlers.push(ident.into());
    }

    /// JSON value form of the document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        match self.dialect {
            SchemaDialect::Swagger2 => {
                root.insert("swagger".to_string(), Value::String("2.0".to_string()));
            }
            SchemaDialect::OpenApi3 => {
                root.insert("openapi".to_string(), Value::String("3.0.3".to_string()));
            }
        }
        if let Some(generator) = &self.generator {
            root.insert("x-generator".to_string(), Value::String(generator.clone()));
        }
        root.insert(
            "info".to_string(),
            serde_json::to_value(&self.info).unwrap_or_default(),
        );
        if !self.consumes.is_empty() {
            root.insert(
                "consumes".to_string(),
                serde_json::to_value(&self.consumes).unwrap_or_default(),
            );
        }
        if !self.produces.is_empty() {
            root.insert(
                "produces".to_string(),
                serde_json::to_value(&self.produces).unwrap_or_default(),
            );
        }

        let mut paths = Map::new();
        for (path, methods) in &self.paths {
            let mut item = Map::new();
            for (method, operation) in methods {
                item.insert(
                    method.as_str().to_string(),
                    serde_json::to_value(operation).unwrap_or_default(),
                );
            }
            paths.insert(path.clone(), Value::Object(item));
        }
        root.insert("paths".to_string(), Value::Object(paths));

        match self.dialect {
            SchemaDialect::Swagger2 => {
                if !self.definitions.is_empty() {
                    root.insert("definitions".to_string(), self.definitions.to_value());
                }
                if !self.security_definitions.is_empty() {
                    root.insert(
                        "securityDefinitions".to_string(),
                        Value::Object(self.security_definitions.clone().into_iter().collect()),
                    );
                }
            }
            SchemaDialect::OpenApi3 => {
                let mut components = match self.extra.get("components") {
                    Some(Value::Object(existing)) => existing.clone(),
                    _ => Map::new(),
                };
                if !self.definitions.is_empty() {
                    components.insert("schemas".to_string(), self.definitions.to_value());
                }
                if !self.security_definitions.is_empty() {
                    components.insert(
                        "securitySchemes".to_string(),
                        Value::Object(self.security_definitions.clone().into_iter().collect()),
                    );
                }
                if !components.is_empty() {
                    root.insert("components".to_string(), Value::Object(components));
                }
            }
        }

        for (key, value) in &self.extra {
            if key == "components" && self.dialect == SchemaDialect::OpenApi3 {
                continue; // merged above
            }
            root.entry(key.clone()).or_insert_with(|| value.clone());
        }

        Value::Object(root)
    }

    /// Pretty-printed JSON text of the document.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
