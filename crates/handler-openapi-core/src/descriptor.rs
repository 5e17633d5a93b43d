//! Plain descriptor values for HTTP handler metadata.
//!
//! A host describes each HTTP entry point as a [`HandlerDescriptor`] inside a
//! [`GroupDescriptor`] (the declaring class/module). Annotations are closed
//! tagged enums with strongly-typed fields — the generator never inspects
//! open-ended attribute objects, it matches on variants produced once by the
//! metadata provider.
//!
//! All types derive serde so a catalog can be written as YAML and loaded with
//! [`Catalog`]; builder methods cover programmatic construction.

use serde::{Deserialize, Serialize};

/// HTTP methods a handler trigger can declare.
///
/// Serialized lowercase (`get`, `post`, …) both in catalog files and as the
/// per-path operation keys of the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
    /// HTTP HEAD.
    Head,
    /// HTTP OPTIONS.
    Options,
}

impl HttpMethod {
    /// Lowercase wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization scheme named by an authorize annotation.
///
/// The default is [`AuthScheme::Jwt`], matching an annotation written without
/// an explicit scheme argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// HTTP Basic authentication.
    Basic,
    /// API key carried in a request header.
    HeaderApiKey,
    /// API key carried in a query parameter.
    QueryApiKey,
    /// OAuth2 flows.
    #[serde(rename = "oauth2")]
    OAuth2,
    /// Bearer JWT (OpenID Connect style).
    #[default]
    Jwt,
}

/// Closed descriptor for a parameter, field or payload type.
///
/// Primitives map directly to schema fragments. The framework markers
/// ([`Request`](Self::Request), [`Logger`](Self::Logger),
/// [`Cancellation`](Self::Cancellation), [`Principal`](Self::Principal)) mark
/// infrastructure parameters the generator must skip. [`HttpValue`](Self::HttpValue)
/// is the typed HTTP value wrapper whose binding source comes from a
/// [`ParamAnnotation::Source`] annotation on the same parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeInfo {
    /// UTF-8 string.
    String,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Boolean.
    Boolean,
    /// UUID string.
    Uuid,
    /// RFC 3339 date-time string.
    DateTime,
    /// Raw byte stream payload (base64 on the wire).
    Bytes,
    /// XML document payload.
    Xml,
    /// Single uploaded file.
    File,
    /// Collection of uploaded files.
    FileCollection,
    /// The inbound HTTP request marker.
    Request,
    /// Framework logger marker.
    Logger,
    /// Cancellation signal marker.
    Cancellation,
    /// Caller principal/identity marker.
    Principal,
    /// Nullable wrapper around a value type.
    Optional(Box<TypeInfo>),
    /// Homogeneous array.
    Array(Box<TypeInfo>),
    /// Typed HTTP value wrapper around its inner value type.
    HttpValue(Box<TypeInfo>),
    /// Named object type with (possibly empty) declared fields.
    Object {
        /// Definition name, unique per distinct type.
        name: String,
        /// Declared fields; may be empty for opaque types.
        #[serde(default)]
        fields: Vec<FieldInfo>,
    },
}

impl Default for TypeInfo {
    /// Annotations that omit a type mean "string".
    fn default() -> Self {
        Self::String
    }
}

impl TypeInfo {
    /// Nullable wrapper.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Array of `inner`.
    #[must_use]
    pub fn array(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Typed HTTP value wrapper around `inner`.
    #[must_use]
    pub fn http_value(inner: Self) -> Self {
        Self::HttpValue(Box::new(inner))
    }

    /// Named object type.
    #[must_use]
    pub fn object(name: impl Into<String>, fields: Vec<FieldInfo>) -> Self {
        Self::Object {
            name: name.into(),
            fields,
        }
    }

    /// `true` for the inbound HTTP request marker.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request)
    }

    /// `true` for any framework/infrastructure marker type.
    #[must_use]
    pub const fn is_framework_marker(&self) -> bool {
        matches!(
            self,
            Self::Request | Self::Logger | Self::Cancellation | Self::Principal
        )
    }

    /// `true` when the type is wrapped in [`TypeInfo::Optional`].
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The value type with any `Optional` wrappers peeled off.
    #[must_use]
    pub fn strip_optional(&self) -> &Self {
        let mut ty = self;
        while let Self::Optional(inner) = ty {
            ty = inner;
        }
        ty
    }

    /// `true` for file or file-collection types (optional wrappers ignored).
    #[must_use]
    pub fn is_file_like(&self) -> bool {
        matches!(self.strip_optional(), Self::File | Self::FileCollection)
    }
}

/// One declared field of an [`TypeInfo::Object`] type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name as serialized.
    pub name: String,
    /// Field type.
    pub ty: TypeInfo,
    /// Whether the field is required in the object schema.
    #[serde(default)]
    pub required: bool,
}

impl FieldInfo {
    /// New optional field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeInfo) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
        }
    }

    /// Set the required flag.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Binding source declared by a [`ParamAnnotation::Source`] annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// Query-string parameter.
    Query,
    /// Request header.
    Header,
    /// Form field.
    Form,
    /// Request body.
    Body,
}

/// Fields shared by the virtual header/query/form-field annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualParam {
    /// Parameter name in the document.
    pub name: String,
    /// Declared value type; defaults to string.
    #[serde(default)]
    pub ty: TypeInfo,
    /// Required flag; defaults to false.
    #[serde(default)]
    pub required: bool,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl VirtualParam {
    /// New string-typed, optional virtual parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeInfo::String,
            required: false,
            description: None,
        }
    }

    /// Set the value type.
    #[must_use]
    pub fn ty(mut self, ty: TypeInfo) -> Self {
        self.ty = ty;
        self
    }

    /// Set the required flag.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Annotation attached to a handler, its declaring group, or its return
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerAnnotation {
    /// Marks the handler as a registered entry point; `name` overrides the
    /// declared ident as the registered handler name.
    EntryPoint {
        /// Registered name; falls back to the handler ident when absent.
        #[serde(default)]
        name: Option<String>,
    },
    /// Excludes the handler (or, at group level, every handler in the group)
    /// from the generated document.
    Ignore,
    /// Marks the operation as deprecated.
    Deprecated,
    /// Operation naming and descriptive metadata.
    Operation {
        /// Explicit operation id; overrides the `<group>_<handler>` default.
        #[serde(default)]
        operation_id: Option<String>,
        /// Short summary line.
        #[serde(default)]
        summary: Option<String>,
        /// Longer description.
        #[serde(default)]
        description: Option<String>,
        /// Tag list; defaults to the declaring group name when empty.
        #[serde(default)]
        tags: Vec<String>,
    },
    /// Typed request body that has no matching signature parameter.
    RequestBody {
        /// Body payload type.
        ty: TypeInfo,
        /// Parameter name; defaults to `Body`.
        #[serde(default)]
        name: Option<String>,
        /// Required flag, honored as declared.
        #[serde(default)]
        required: bool,
        /// Free-text description.
        #[serde(default)]
        description: Option<String>,
    },
    /// Uploaded file (or files) carried as multipart form data.
    UploadFile {
        /// Parameter name; defaults to `file`.
        #[serde(default)]
        name: Option<String>,
        /// Whether multiple files may be uploaded under this name.
        #[serde(default)]
        multi: bool,
        /// Required flag; defaults to false.
        #[serde(default)]
        required: bool,
        /// Free-text description.
        #[serde(default)]
        description: Option<String>,
    },
    /// Virtual request-header parameter.
    Header(VirtualParam),
    /// Virtual query parameter.
    Query(VirtualParam),
    /// Virtual form-data field.
    FormField(VirtualParam),
    /// Declared response (rich family: status, payload type, description).
    Response {
        /// HTTP status code.
        status: u16,
        /// Response payload type, if any.
        #[serde(default)]
        ty: Option<TypeInfo>,
        /// Free-text description.
        #[serde(default)]
        description: Option<String>,
    },
    /// Declared response (terse family: status and payload type only).
    Produces {
        /// HTTP status code.
        status: u16,
        /// Response payload type, if any.
        #[serde(default)]
        ty: Option<TypeInfo>,
    },
    /// Authorization requirement (simple family: scheme only).
    Authorize {
        /// Scheme the handler requires.
        #[serde(default)]
        scheme: AuthScheme,
    },
    /// Authorization requirement (rich family: scheme plus roles/policy).
    AuthorizePolicy {
        /// Scheme the handler requires.
        #[serde(default)]
        scheme: AuthScheme,
        /// Named policy, if any.
        #[serde(default)]
        policy: Option<String>,
        /// Comma-separated role list.
        #[serde(default)]
        roles: Option<String>,
    },
}

impl HandlerAnnotation {
    /// Entry-point marker with an explicit registered name.
    #[must_use]
    pub fn entry_point(name: impl Into<String>) -> Self {
        Self::EntryPoint {
            name: Some(name.into()),
        }
    }

    /// Entry-point marker registering the handler under its declared ident.
    #[must_use]
    pub const fn entry_point_ident() -> Self {
        Self::EntryPoint { name: None }
    }
}

/// Inbound-request trigger metadata: declared methods and optional route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    /// Declared HTTP methods; empty means GET.
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
    /// Explicit route template; absent means the default name route.
    #[serde(default)]
    pub route: Option<String>,
}

/// Binding-source metadata for a typed HTTP value wrapper parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Where the value is bound from.
    pub source: ParamSource,
    /// Document name override; falls back to the parameter name when empty.
    #[serde(default)]
    pub name: Option<String>,
    /// Required flag.
    #[serde(default)]
    pub required: bool,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Annotation attached to a declared signature parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamAnnotation {
    /// Marks the inbound-request parameter and carries route/method metadata.
    Trigger(TriggerInfo),
    /// Excludes this parameter from the document.
    Ignore,
    /// Opaque framework binding (queue, blob, …); excludes the parameter.
    Binding {
        /// Binding name, kept for diagnostics only.
        binding: String,
    },
    /// Binding source for a typed HTTP value wrapper parameter.
    Source(SourceInfo),
}

impl ParamAnnotation {
    /// Trigger annotation with the given methods and optional route.
    #[must_use]
    pub fn trigger(methods: Vec<HttpMethod>, route: Option<&str>) -> Self {
        Self::Trigger(TriggerInfo {
            methods,
            route: route.map(str::to_owned),
        })
    }

    /// Source annotation with defaults (no name override, not required).
    #[must_use]
    pub const fn source(source: ParamSource) -> Self {
        Self::Source(SourceInfo {
            source,
            name: None,
            required: false,
            description: None,
        })
    }
}

/// One declared signature parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter name as declared.
    pub name: String,
    /// Declared type.
    pub ty: TypeInfo,
    /// Attached annotations.
    #[serde(default)]
    pub annotations: Vec<ParamAnnotation>,
}

impl ParamDescriptor {
    /// New parameter without annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeInfo) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation.
    #[must_use]
    pub fn annotation(mut self, annotation: ParamAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// `true` when the parameter carries an ignore annotation.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, ParamAnnotation::Ignore))
    }

    /// `true` when the parameter carries an opaque framework binding.
    #[must_use]
    pub fn has_blocking_binding(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, ParamAnnotation::Binding { .. }))
    }

    /// Binding-source annotation, if any.
    #[must_use]
    pub fn source(&self) -> Option<&SourceInfo> {
        self.annotations.iter().find_map(|a| match a {
            ParamAnnotation::Source(info) => Some(info),
            _ => None,
        })
    }

    /// Trigger annotation, if any.
    #[must_use]
    pub fn trigger(&self) -> Option<&TriggerInfo> {
        self.annotations.iter().find_map(|a| match a {
            ParamAnnotation::Trigger(info) => Some(info),
            _ => None,
        })
    }
}

/// Return-position metadata: payload type plus response annotations.
///
/// A handler returning an opaque framework result (no documented payload) is
/// modeled with `ty: None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnDescriptor {
    /// Documented payload type, if any.
    #[serde(default)]
    pub ty: Option<TypeInfo>,
    /// Response annotations attached at the return position.
    #[serde(default)]
    pub annotations: Vec<HandlerAnnotation>,
}

/// One candidate operation source: a declared handler with its parameters,
/// return descriptor and annotations. Immutable once captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// Declared name (the identifier in source code).
    pub ident: String,
    /// Handler-level annotations.
    #[serde(default)]
    pub annotations: Vec<HandlerAnnotation>,
    /// Declared signature parameters, in declaration order.
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    /// Return-position metadata.
    #[serde(default)]
    pub returns: ReturnDescriptor,
}

impl HandlerDescriptor {
    /// New handler with the given declared ident.
    #[must_use]
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }

    /// Attach a handler-level annotation.
    #[must_use]
    pub fn annotation(mut self, annotation: HandlerAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Append a signature parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Set the documented return payload type.
    #[must_use]
    pub fn returns(mut self, ty: TypeInfo) -> Self {
        self.returns.ty = Some(ty);
        self
    }

    /// Attach a response annotation at the return position.
    #[must_use]
    pub fn return_annotation(mut self, annotation: HandlerAnnotation) -> Self {
        self.returns.annotations.push(annotation);
        self
    }

    /// Registered name: the entry-point annotation's name, or the ident.
    #[must_use]
    pub fn registered_name(&self) -> &str {
        self.annotations
            .iter()
            .find_map(|a| match a {
                HandlerAnnotation::EntryPoint { name: Some(name) } => Some(name.as_str()),
                _ => None,
            })
            .unwrap_or(&self.ident)
    }

    /// `true` when the handler carries the entry-point marker.
    #[must_use]
    pub fn is_entry_point(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, HandlerAnnotation::EntryPoint { .. }))
    }

    /// `true` when the handler carries the ignore marker.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, HandlerAnnotation::Ignore))
    }

    /// `true` when the handler carries the deprecation marker.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, HandlerAnnotation::Deprecated))
    }

    /// `true` when any declared parameter is the inbound-request marker.
    #[must_use]
    pub fn has_request_param(&self) -> bool {
        self.params.iter().any(|p| p.ty.is_request())
    }

    /// Trigger metadata from the inbound-request parameter, if present.
    #[must_use]
    pub fn trigger(&self) -> Option<&TriggerInfo> {
        self.params
            .iter()
            .find(|p| p.ty.is_request())
            .and_then(ParamDescriptor::trigger)
    }

    /// Explicit operation-id override from an operation annotation.
    #[must_use]
    pub fn operation_id_override(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            HandlerAnnotation::Operation {
                operation_id: Some(id),
                ..
            } => Some(id.as_str()),
            _ => None,
        })
    }
}

/// A declaring group of handlers (a class or module in the host).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    /// Group name; the first half of default operation ids.
    pub name: String,
    /// Group-level annotations, inherited by every handler.
    #[serde(default)]
    pub annotations: Vec<HandlerAnnotation>,
    /// Handlers declared in this group.
    #[serde(default)]
    pub handlers: Vec<HandlerDescriptor>,
}

impl GroupDescriptor {
    /// New empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach a group-level annotation.
    #[must_use]
    pub fn annotation(mut self, annotation: HandlerAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Append a handler.
    #[must_use]
    pub fn handler(mut self, handler: HandlerDescriptor) -> Self {
        self.handlers.push(handler);
        self
    }

    /// `true` when the group carries the ignore marker.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, HandlerAnnotation::Ignore))
    }
}

/// Root of a catalog file: every handler group the host declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// All declared groups.
    #[serde(default)]
    pub groups: Vec<GroupDescriptor>,
}

impl Catalog {
    /// Total number of handlers across all groups.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.groups.iter().map(|g| g.handlers.len()).sum()
    }
}
