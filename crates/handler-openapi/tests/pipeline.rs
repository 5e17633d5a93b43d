//! End-to-end tests for the full generation pipeline.
//!
//! Each test builds a small handler catalog, runs
//! [`handler_openapi::DocumentGenerator`], and asserts on the serialized
//! document.

use pretty_assertions::assert_eq;
use serde_json::json;

use handler_openapi::{
    Document, DocumentGenerator, GeneratorSettings, SecurityProcessor, SecurityScopeProcessor,
    SecuritySchemeKind,
};
use handler_openapi_core::{
    AuthScheme, FieldInfo, GroupDescriptor, HandlerAnnotation, HandlerDescriptor, HttpMethod,
    ParamAnnotation, ParamDescriptor, TypeInfo,
};

/// Entry-point handler with a trigger request parameter.
fn entry_handler(ident: &str, methods: Vec<HttpMethod>, route: Option<&str>) -> HandlerDescriptor {
    HandlerDescriptor::new(ident)
        .annotation(HandlerAnnotation::entry_point_ident())
        .param(
            ParamDescriptor::new("req", TypeInfo::Request)
                .annotation(ParamAnnotation::trigger(methods, route)),
        )
}

/// Run the generator with default settings over one group.
fn generate(group: GroupDescriptor) -> Document {
    DocumentGenerator::new(GeneratorSettings::default())
        .generate(&[group])
        .expect("generation should succeed")
}

#[test]
fn typed_path_parameters() {
    let handler = entry_handler(
        "TwoParams",
        vec![HttpMethod::Get],
        Some("api/{num}/{str}"),
    )
    .param(ParamDescriptor::new("num", TypeInfo::Integer))
    .param(ParamDescriptor::new("str", TypeInfo::String));

    let document = generate(GroupDescriptor::new("Basics").handler(handler));
    let value = document.to_value();

    let operation = &value["paths"]["api/{num}/{str}"]["get"];
    assert_eq!(operation["operationId"], "Basics_TwoParams");

    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 2);

    assert_eq!(parameters[0]["name"], "num");
    assert_eq!(parameters[0]["in"], "path");
    assert_eq!(parameters[0]["required"], true);
    assert_eq!(parameters[0]["type"], "integer");
    assert_eq!(parameters[0]["x-position"], 1);

    assert_eq!(parameters[1]["name"], "str");
    assert_eq!(parameters[1]["in"], "path");
    assert_eq!(parameters[1]["required"], true);
    assert_eq!(parameters[1]["type"], "string");
    assert_eq!(parameters[1]["x-position"], 2);
}

#[test]
fn default_route_and_method() {
    let handler = entry_handler("Basics", Vec::new(), None);
    let document = generate(GroupDescriptor::new("Demo").handler(handler));
    let value = document.to_value();

    let operation = &value["paths"]["api/Basics"]["get"];
    assert_eq!(operation["operationId"], "Demo_Basics");

    // No declared responses and no return payload: the no-content default.
    assert_eq!(operation["responses"]["204"]["description"], "");
}

#[test]
fn virtual_body_parameter_references_definition() {
    let person = TypeInfo::object(
        "Person",
        vec![
            FieldInfo::new("name", TypeInfo::String).required(true),
            FieldInfo::new("age", TypeInfo::optional(TypeInfo::Integer)),
        ],
    );
    let handler = entry_handler("Create", vec![HttpMethod::Post], Some("persons")).annotation(
        HandlerAnnotation::RequestBody {
            ty: person,
            name: Some("Body".to_string()),
            required: true,
            description: None,
        },
    );

    let document = generate(GroupDescriptor::new("Persons").handler(handler));
    let value = document.to_value();

    let operation = &value["paths"]["api/persons"]["post"];
    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["name"], "Body");
    assert_eq!(parameters[0]["in"], "body");
    assert_eq!(parameters[0]["required"], true);
    assert_eq!(parameters[0]["schema"], json!({ "$ref": "#/definitions/Person" }));

    let person_schema = &value["definitions"]["Person"];
    assert_eq!(person_schema["type"], "object");
    assert_eq!(person_schema["required"], json!(["name"]));
    assert_eq!(person_schema["properties"]["name"]["type"], "string");
    assert_eq!(person_schema["properties"]["age"]["x-nullable"], true);
}

#[test]
fn single_file_upload_forces_multipart() {
    let handler = entry_handler("Upload", vec![HttpMethod::Post], Some("upload")).annotation(
        HandlerAnnotation::UploadFile {
            name: None,
            multi: false,
            required: false,
            description: None,
        },
    );

    let document = generate(GroupDescriptor::new("Files").handler(handler));
    let value = document.to_value();

    let operation = &value["paths"]["api/upload"]["post"];
    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["name"], "file");
    assert_eq!(parameters[0]["in"], "formData");
    assert_eq!(parameters[0]["type"], "file");
    assert_eq!(parameters[0]["required"], false);
    assert!(parameters[0].get("collectionFormat").is_none());

    assert_eq!(operation["consumes"], json!(["multipart/form-data"]));
}

#[test]
fn ignored_handler_produces_nothing() {
    let group = GroupDescriptor::new("Pets")
        .handler(entry_handler("Visible", vec![HttpMethod::Get], Some("pets")))
        .handler(
            entry_handler("Hidden", vec![HttpMethod::Get], Some("hidden"))
                .annotation(HandlerAnnotation::Ignore),
        );

    let document = generate(group);

    assert_eq!(document.operations().count(), 1);
    assert_eq!(document.used_handlers(), ["Visible"]);
    assert!(document.to_value()["paths"].get("api/hidden").is_none());
}

#[test]
fn security_processors_add_independent_requirements() {
    let handler = entry_handler("Secured", vec![HttpMethod::Get], Some("secured"))
        .annotation(HandlerAnnotation::Authorize {
            scheme: AuthScheme::default(),
        })
        .annotation(HandlerAnnotation::AuthorizePolicy {
            scheme: AuthScheme::Jwt,
            policy: None,
            roles: Some("admin,ops".to_string()),
        });
    let settings = GeneratorSettings::default()
        .operation_processor(SecurityProcessor::new(
            "Bearer",
            SecuritySchemeKind::OpenIdConnect,
        ))
        .operation_processor(SecurityScopeProcessor::default());

    let document = DocumentGenerator::new(settings)
        .generate(&[GroupDescriptor::new("Auth").handler(handler)])
        .expect("generation should succeed");
    let value = document.to_value();

    let security = &value["paths"]["api/secured"]["get"]["security"];
    assert_eq!(
        *security,
        json!([{ "Bearer": [] }, { "Bearer": ["admin", "ops"] }])
    );
}

#[test]
fn optional_segment_expands_into_both_paths() {
    let handler = entry_handler("Find", vec![HttpMethod::Get], Some("pets/{id?}"))
        .param(ParamDescriptor::new("id", TypeInfo::Integer));

    let document = generate(GroupDescriptor::new("Pets").handler(handler));
    let value = document.to_value();

    let with_id = &value["paths"]["api/pets/{id}"]["get"];
    let parameters = with_id["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["name"], "id");
    assert_eq!(parameters[0]["in"], "path");

    // The absent variant drops the unmatched declared parameter entirely.
    let without_id = &value["paths"]["api/pets"]["get"];
    assert!(without_id.get("parameters").is_none());
    assert_eq!(without_id["operationId"], "Pets_Find_2");
}

#[test]
fn declared_responses_override_default() {
    let pet = TypeInfo::object("Pet", vec![FieldInfo::new("name", TypeInfo::String)]);
    let handler = entry_handler("Find", vec![HttpMethod::Get], Some("pets/{id}"))
        .param(ParamDescriptor::new("id", TypeInfo::Integer))
        .annotation(HandlerAnnotation::Response {
            status: 200,
            ty: Some(pet),
            description: Some("The pet".to_string()),
        })
        .annotation(HandlerAnnotation::Produces {
            status: 404,
            ty: None,
        });

    let document = generate(GroupDescriptor::new("Pets").handler(handler));
    let value = document.to_value();

    let responses = &value["paths"]["api/pets/{id}"]["get"]["responses"];
    assert_eq!(responses["200"]["description"], "The pet");
    assert_eq!(responses["200"]["schema"], json!({ "$ref": "#/definitions/Pet" }));
    assert_eq!(responses["404"]["description"], "");
    assert!(responses.get("204").is_none());
}

#[test]
fn allow_list_restricts_generation() {
    let group = GroupDescriptor::new("Pets")
        .handler(entry_handler("Keep", vec![HttpMethod::Get], Some("keep")))
        .handler(entry_handler("Drop", vec![HttpMethod::Get], Some("drop")));

    let document = DocumentGenerator::new(GeneratorSettings::default())
        .generate_filtered(&[group], Some(&["keep".to_string()]))
        .expect("generation should succeed");

    assert_eq!(document.operations().count(), 1);
    assert_eq!(document.used_handlers(), ["Keep"]);
}

#[test]
fn template_seeds_definitions_and_extra_keys() {
    let template = json!({
        "info": { "title": "Seeded", "version": "9.9.9" },
        "definitions": {
            "Existing": { "type": "object" }
        },
        "securityDefinitions": {
            "Bearer": { "type": "apiKey", "name": "Authorization", "in": "header" }
        },
        "host": "pets.example.com"
    })
    .to_string();
    let settings = GeneratorSettings::default()
        .title("Ignored")
        .document_template(template);

    let handler = entry_handler("List", vec![HttpMethod::Get], Some("pets"));
    let document = DocumentGenerator::new(settings)
        .generate(&[GroupDescriptor::new("Pets").handler(handler)])
        .expect("generation should succeed");
    let value = document.to_value();

    assert_eq!(value["info"]["title"], "Seeded");
    assert_eq!(value["info"]["version"], "9.9.9");
    assert_eq!(value["definitions"]["Existing"], json!({ "type": "object" }));
    assert_eq!(value["securityDefinitions"]["Bearer"]["type"], "apiKey");
    assert_eq!(value["host"], "pets.example.com");

    // The banner and media-type defaults are always the generator's own.
    assert_eq!(value["consumes"], json!(["application/json"]));
    assert_eq!(value["produces"], json!(["application/json"]));
    assert!(value["x-generator"]
        .as_str()
        .unwrap()
        .starts_with("handler-openapi v"));
}

// --- Error path tests ---

#[test]
fn duplicate_route_is_fatal_and_names_both() {
    let group = GroupDescriptor::new("Pets")
        .handler(entry_handler("List", vec![HttpMethod::Get], Some("pets")))
        .handler(entry_handler("ListAll", vec![HttpMethod::Get], Some("pets")));

    let result = DocumentGenerator::new(GeneratorSettings::default()).generate(&[group]);
    assert!(result.is_err(), "colliding routes should produce an error");
    let err = result.unwrap_err().to_string();
    assert!(err.contains("api/pets"), "error should name the path: {err}");
    assert!(
        err.contains("Pets_List") && err.contains("Pets_ListAll"),
        "error should name both operations: {err}",
    );
}

#[test]
fn invalid_template_is_fatal() {
    let settings = GeneratorSettings::default().document_template("{{not json");
    let result = DocumentGenerator::new(settings).generate(&[]);
    assert!(result.is_err(), "invalid template should produce an error");
}
