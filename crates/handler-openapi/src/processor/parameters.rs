//! Parameter classification and resolution.
//!
//! Builds the operation's parameter list from two candidate sources: the
//! handler's declared signature parameters and the virtual parameters its
//! handler-level annotations describe. Each candidate is classified into a
//! binding kind in a fixed order (path match first, then the virtual kinds,
//! then typed-wrapper unwrapping); unclassifiable candidates are dropped
//! silently. Post-passes synthesize missing path parameters, strip dangling
//! placeholders from the path, and adjust consumed media types.

use handler_openapi_core::{
    HandlerAnnotation, HandlerDescriptor, ParamAnnotation, ParamDescriptor, ParamSource, TypeInfo,
    VirtualParam,
};
use serde_json::{json, Value};

use crate::document::{CollectionFormat, Operation, Parameter, ParameterKind, SchemaDialect};
use crate::error::Result;
use crate::processor::{OperationContext, OperationProcessor};

/// Resolves every candidate parameter of the handler into the operation.
///
/// Must run after the operation path is final in shape (route resolution) and
/// before the response processor, which may read the resolved list.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationParameterProcessor;

impl OperationProcessor for OperationParameterProcessor {
    fn process(&self, ctx: &mut OperationContext<'_>) -> Result<bool> {
        let path = ctx.description.path.clone();
        let candidates = collect_candidates(ctx.handler);

        let mut position: u32 = 0;
        for candidate in &candidates {
            if let Some(mut parameter) = classify(ctx, &path, candidate)? {
                position += 1;
                parameter.position = Some(position);
                ctx.description.operation.parameters.push(parameter);
            }
        }

        if ctx.settings.add_missing_path_parameters {
            add_missing_path_parameters(ctx, &path);
        }
        ctx.description.path = strip_unmatched_placeholders(&path, &ctx.description.operation);
        update_consumed_types(&mut ctx.description.operation);

        // The flag dialect carries nullability on the parameter itself; the
        // structural dialect carries it inside the schema fragment only.
        if ctx.settings.dialect == SchemaDialect::OpenApi3 {
            for parameter in &mut ctx.description.operation.parameters {
                parameter.nullable = None;
            }
        }
        Ok(true)
    }
}

/// One parameter candidate, in resolution order.
enum Candidate<'a> {
    /// Declared signature parameter.
    Signature(&'a ParamDescriptor),
    /// Virtual uploaded file from an upload-file annotation.
    Upload {
        name: &'a str,
        multi: bool,
        required: bool,
        description: Option<&'a str>,
    },
    /// Virtual typed request body from a request-body annotation.
    Body {
        ty: &'a TypeInfo,
        name: &'a str,
        required: bool,
        description: Option<&'a str>,
    },
    /// Virtual header/query/form-field parameter.
    Virtual {
        kind: ParameterKind,
        param: &'a VirtualParam,
    },
}

impl Candidate<'_> {
    fn name(&self) -> &str {
        match self {
            Self::Signature(param) => &param.name,
            Self::Upload { name, .. } | Self::Body { name, .. } => name,
            Self::Virtual { param, .. } => &param.name,
        }
    }

    fn description(&self) -> Option<&str> {
        match self {
            Self::Signature(_) => None,
            Self::Upload { description, .. } | Self::Body { description, .. } => *description,
            Self::Virtual { param, .. } => param.description.as_deref(),
        }
    }
}

fn collect_candidates(handler: &HandlerDescriptor) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    for param in &handler.params {
        if param.ty.strip_optional().is_framework_marker() || param.is_ignored() {
            continue;
        }
        // The typed HTTP value wrapper is technically a binding type; it is
        // the one binding allowed through.
        if param.has_blocking_binding()
            && !matches!(param.ty.strip_optional(), TypeInfo::HttpValue(_))
        {
            continue;
        }
        candidates.push(Candidate::Signature(param));
    }

    let mut upload = None;
    let mut body = None;
    let mut headers = Vec::new();
    let mut queries = Vec::new();
    let mut form_fields = Vec::new();
    for annotation in &handler.annotations {
        match annotation {
            HandlerAnnotation::UploadFile {
                name,
                multi,
                required,
                description,
            } => {
                if upload.is_none() {
                    upload = Some(Candidate::Upload {
                        name: name.as_deref().unwrap_or("file"),
                        multi: *multi,
                        required: *required,
                        description: description.as_deref(),
                    });
                }
            }
            HandlerAnnotation::RequestBody {
                ty,
                name,
                required,
                description,
            } => {
                if body.is_none() {
                    body = Some(Candidate::Body {
                        ty,
                        name: name.as_deref().unwrap_or("Body"),
                        required: *required,
                        description: description.as_deref(),
                    });
                }
            }
            HandlerAnnotation::Header(param) => headers.push(Candidate::Virtual {
                kind: ParameterKind::Header,
                param,
            }),
            HandlerAnnotation::Query(param) => queries.push(Candidate::Virtual {
                kind: ParameterKind::Query,
                param,
            }),
            HandlerAnnotation::FormField(param) => form_fields.push(Candidate::Virtual {
                kind: ParameterKind::FormData,
                param,
            }),
            _ => {}
        }
    }

    // An upload-file annotation wins over a typed-body annotation.
    match (upload, body) {
        (Some(file), _) => candidates.push(file),
        (None, Some(typed_body)) => candidates.push(typed_body),
        (None, None) => {}
    }
    candidates.extend(headers);
    candidates.extend(queries);
    candidates.extend(form_fields);
    candidates
}

fn classify(
    ctx: &mut OperationContext<'_>,
    path: &str,
    candidate: &Candidate<'_>,
) -> Result<Option<Parameter>> {
    let name = candidate.name();
    if path_contains_placeholder(path, name) {
        return path_parameter(ctx, name, candidate).map(Some);
    }

    match candidate {
        Candidate::Upload {
            name,
            multi,
            required,
            description,
        } => Ok(Some(file_parameter(name, *multi, *required, *description))),
        Candidate::Body {
            ty,
            name,
            required,
            description,
        } => body_parameter(ctx, name, ty, &[], *required, *description).map(Some),
        Candidate::Virtual { kind, param } => primitive_parameter(
            ctx,
            &param.name,
            *kind,
            &param.ty,
            &[],
            param.required,
            param.description.as_deref(),
        )
        .map(Some),
        Candidate::Signature(param) => {
            let TypeInfo::HttpValue(inner) = param.ty.strip_optional() else {
                return Ok(None);
            };
            let Some(source) = param.source() else {
                return Ok(None);
            };
            let name = source
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or(&param.name);
            let description = source.description.as_deref();

            match source.source {
                ParamSource::Form if inner.is_file_like() => Ok(Some(file_parameter(
                    name,
                    matches!(inner.strip_optional(), TypeInfo::FileCollection),
                    source.required,
                    description,
                ))),
                ParamSource::Body => {
                    body_parameter(ctx, name, inner, &param.annotations, source.required, description)
                        .map(Some)
                }
                ParamSource::Query => primitive_parameter(
                    ctx,
                    name,
                    ParameterKind::Query,
                    inner,
                    &param.annotations,
                    source.required,
                    description,
                )
                .map(Some),
                ParamSource::Header => primitive_parameter(
                    ctx,
                    name,
                    ParameterKind::Header,
                    inner,
                    &param.annotations,
                    source.required,
                    description,
                )
                .map(Some),
                ParamSource::Form => primitive_parameter(
                    ctx,
                    name,
                    ParameterKind::FormData,
                    inner,
                    &param.annotations,
                    source.required,
                    description,
                )
                .map(Some),
            }
        }
    }
}

/// `{name}` or `{name:constraint}` present in the path, case-insensitive.
fn path_contains_placeholder(path: &str, name: &str) -> bool {
    let path = path.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    path.contains(&format!("{{{name}}}")) || path.contains(&format!("{{{name}:"))
}

fn path_parameter(
    ctx: &mut OperationContext<'_>,
    name: &str,
    candidate: &Candidate<'_>,
) -> Result<Parameter> {
    let file_ty;
    let (ty, annotations): (&TypeInfo, &[ParamAnnotation]) = match candidate {
        Candidate::Signature(param) => {
            let ty = match param.ty.strip_optional() {
                TypeInfo::HttpValue(inner) => inner.strip_optional(),
                other => other,
            };
            (ty, &param.annotations)
        }
        Candidate::Upload { .. } => {
            file_ty = TypeInfo::File;
            (&file_ty, &[])
        }
        Candidate::Body { ty, .. } => (ty.strip_optional(), &[]),
        Candidate::Virtual { param, .. } => (param.ty.strip_optional(), &[]),
    };

    let schema = ctx
        .schema
        .generate_schema(ty, annotations, false, ctx.definitions)?;
    let mut parameter = Parameter::new(name, ParameterKind::Path, schema);
    parameter.required = true;
    if ctx.settings.dialect == SchemaDialect::Swagger2 {
        parameter.nullable = Some(false);
    }
    parameter.description = candidate.description().map(str::to_string);
    Ok(parameter)
}

fn file_parameter(name: &str, multi: bool, required: bool, description: Option<&str>) -> Parameter {
    let mut parameter = Parameter::new(name, ParameterKind::File, json!({"type": "file"}));
    parameter.required = required;
    parameter.description = description.map(str::to_string);
    if multi {
        parameter.collection_format = Some(CollectionFormat::Multi);
    }
    parameter
}

fn body_parameter(
    ctx: &mut OperationContext<'_>,
    name: &str,
    ty: &TypeInfo,
    annotations: &[ParamAnnotation],
    required: bool,
    description: Option<&str>,
) -> Result<Parameter> {
    let mut parameter = match ty.strip_optional() {
        TypeInfo::Xml => {
            ctx.description.operation.consumes = Some(vec!["application/xml".to_string()]);
            Parameter::new(name, ParameterKind::Body, json!({"type": "string"}))
        }
        TypeInfo::Bytes => {
            ctx.description.operation.consumes = Some(vec!["application/octet-stream".to_string()]);
            Parameter::new(
                name,
                ParameterKind::Body,
                json!({"type": "string", "format": "byte"}),
            )
        }
        _ => {
            let type_description = ctx.schema.describe(ty, annotations);
            let is_nullable =
                ctx.settings.allow_nullable_body_parameters && type_description.is_nullable;
            let schema = ctx
                .schema
                .generate_schema(ty, annotations, is_nullable, ctx.definitions)?;
            let mut parameter = Parameter::new(name, ParameterKind::Body, schema);
            if is_nullable {
                parameter.nullable = Some(true);
            }
            parameter
        }
    };
    parameter.required = required;
    parameter.description = description.map(str::to_string);
    Ok(parameter)
}

fn primitive_parameter(
    ctx: &mut OperationContext<'_>,
    name: &str,
    kind: ParameterKind,
    ty: &TypeInfo,
    annotations: &[ParamAnnotation],
    required: bool,
    description: Option<&str>,
) -> Result<Parameter> {
    let schema = ctx
        .schema
        .generate_schema(ty, annotations, false, ctx.definitions)?;
    let mut parameter = Parameter::new(name, kind, schema);
    parameter.required = required;
    parameter.description = description.map(str::to_string);
    Ok(parameter)
}

/// Synthesize a required path parameter for every placeholder no resolved
/// path parameter matched, typed from the placeholder's constraint token.
/// Synthesized parameters carry no declaration position.
fn add_missing_path_parameters(ctx: &mut OperationContext<'_>, path: &str) {
    for (name, constraint) in placeholders(path) {
        let matched = ctx.description.operation.parameters.iter().any(|p| {
            p.kind == ParameterKind::Path && p.name.eq_ignore_ascii_case(name)
        });
        if matched {
            continue;
        }
        let mut parameter =
            Parameter::new(name, ParameterKind::Path, constraint_schema(constraint));
        parameter.required = true;
        if ctx.settings.dialect == SchemaDialect::Swagger2 {
            parameter.nullable = Some(false);
        }
        ctx.description.operation.parameters.push(parameter);
    }
}

/// `(name, constraint)` for each `{...}` token in the path. The optional
/// marker is already stripped by route expansion but tolerated here.
fn placeholders(path: &str) -> Vec<(&str, Option<&str>)> {
    let mut found = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        rest = &rest[start + 1..];
        let Some(end) = rest.find('}') else { break };
        let token = rest[..end].trim_end_matches('?');
        rest = &rest[end + 1..];
        match token.split_once(':') {
            Some((name, constraint)) => found.push((name, Some(constraint.trim_end_matches('?')))),
            None => found.push((token, None)),
        }
    }
    found
}

fn constraint_schema(constraint: Option<&str>) -> Value {
    let token = constraint
        .and_then(|c| c.split(['(', ':']).next())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match token.as_str() {
        "int" | "integer" | "long" => json!({"type": "integer"}),
        "bool" | "boolean" => json!({"type": "boolean"}),
        "decimal" | "double" | "float" => json!({"type": "number"}),
        _ => json!({"type": "string"}),
    }
}

/// Rewrite matched placeholders to bare `{name}` (constraints dropped) and
/// remove placeholders no path parameter matched; trim the trailing slash
/// stripping can leave behind.
fn strip_unmatched_placeholders(path: &str, operation: &Operation) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let token = after[..end].trim_end_matches('?');
        let name = token.split(':').next().unwrap_or(token);
        rest = &after[end + 1..];

        let matched = operation
            .parameters
            .iter()
            .any(|p| p.kind == ParameterKind::Path && p.name.eq_ignore_ascii_case(name));
        if matched {
            result.push('{');
            result.push_str(name);
            result.push('}');
        }
    }
    result.push_str(rest);
    result.trim_end_matches('/').to_string()
}

fn update_consumed_types(operation: &mut Operation) {
    if operation.parameters.iter().any(Parameter::is_file) {
        operation.consumes = Some(vec!["multipart/form-data".to_string()]);
    } else if operation
        .parameters
        .iter()
        .any(|p| p.kind == ParameterKind::FormData)
    {
        operation.consumes = Some(vec!["application/x-www-form-urlencoded".to_string()]);
    }
}
