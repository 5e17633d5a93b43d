//! Document generation: settings and the generator.
//!
//! [`DocumentGenerator`] drives the whole pass: scan the catalog, resolve
//! routes and methods, run each candidate through the processor pipeline,
//! and assemble the final [`Document`].

use handler_openapi_core::{GroupDescriptor, HandlerDescriptor};

use crate::discover;
use crate::document::{Document, Info, OperationDescription, SchemaDialect};
use crate::error::Result;
use crate::processor::{
    DocumentContext, DocumentProcessor, OperationContext, OperationInfoProcessor,
    OperationParameterProcessor, OperationProcessor, OperationResponseProcessor,
    SecurityDefinitionAppender, SecurityProcessor, SecurityScopeProcessor,
};
use crate::route;
use crate::schema::{SchemaService, StructuralSchemaService};

type BoxedOperationProcessor = Box<dyn OperationProcessor + Send + Sync>;
type BoxedDocumentProcessor = Box<dyn DocumentProcessor + Send + Sync>;

/// Generator configuration.
///
/// Construct with [`GeneratorSettings::new`] and chain builder methods. The
/// operation-processor list starts with the built-in pipeline (info,
/// parameters, responses); [`operation_processor`](Self::operation_processor)
/// appends after it. Extension processors scoped to one group or handler are
/// registered with [`group_processor`](Self::group_processor) and
/// [`handler_processor`](Self::handler_processor) and run after the global
/// list, in that order.
pub struct GeneratorSettings {
    pub(crate) dialect: SchemaDialect,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) document_template: Option<String>,
    pub(crate) route_prefix: String,
    pub(crate) add_missing_path_parameters: bool,
    pub(crate) allow_nullable_body_parameters: bool,
    pub(crate) no_content_status: u16,
    pub(crate) operation_processors: Vec<BoxedOperationProcessor>,
    pub(crate) document_processors: Vec<BoxedDocumentProcessor>,
    pub(crate) group_processors: Vec<(String, BoxedOperationProcessor)>,
    pub(crate) handler_processors: Vec<(String, BoxedOperationProcessor)>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            dialect: SchemaDialect::default(),
            title: None,
            description: None,
            version: None,
            document_template: None,
            route_prefix: "api".to_string(),
            add_missing_path_parameters: false,
            allow_nullable_body_parameters: true,
            no_content_status: 204,
            operation_processors: vec![
                Box::new(OperationInfoProcessor),
                Box::new(OperationParameterProcessor),
                Box::new(OperationResponseProcessor),
            ],
            document_processors: Vec::new(),
            group_processors: Vec::new(),
            handler_processors: Vec::new(),
        }
    }
}

impl GeneratorSettings {
    /// Settings with defaults: Swagger 2.0 dialect, `api` prefix, the
    /// built-in processor pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target schema dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: SchemaDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the document title (ignored when a template is set).
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document description (ignored when a template is set).
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the API version string (ignored when a template is set).
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Pre-seed the document from a JSON template. When set, the
    /// title/description/version overrides are not applied.
    #[must_use]
    pub fn document_template(mut self, template: impl Into<String>) -> Self {
        self.document_template = Some(template.into());
        self
    }

    /// Set the canonical route prefix (default `api`).
    #[must_use]
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    /// Synthesize required path parameters for unmatched placeholders
    /// instead of stripping them (default off).
    #[must_use]
    pub const fn add_missing_path_parameters(mut self, enabled: bool) -> Self {
        self.add_missing_path_parameters = enabled;
        self
    }

    /// Allow nullable body parameter types to be marked nullable
    /// (default on).
    #[must_use]
    pub const fn allow_nullable_body_parameters(mut self, enabled: bool) -> Self {
        self.allow_nullable_body_parameters = enabled;
        self
    }

    /// Status code for the default response of payload-less handlers
    /// (default 204).
    #[must_use]
    pub const fn no_content_status(mut self, status: u16) -> Self {
        self.no_content_status = status;
        self
    }

    /// Append a globally-run operation processor.
    #[must_use]
    pub fn operation_processor(
        mut self,
        processor: impl OperationProcessor + Send + Sync + 'static,
    ) -> Self {
        self.operation_processors.push(Box::new(processor));
        self
    }

    /// Append a document processor (runs once after assembly).
    #[must_use]
    pub fn document_processor(
        mut self,
        processor: impl DocumentProcessor + Send + Sync + 'static,
    ) -> Self {
        self.document_processors.push(Box::new(processor));
        self
    }

    /// Append an extension processor scoped to one declaring group.
    #[must_use]
    pub fn group_processor(
        mut self,
        group: impl Into<String>,
        processor: impl OperationProcessor + Send + Sync + 'static,
    ) -> Self {
        self.group_processors.push((group.into(), Box::new(processor)));
        self
    }

    /// Append an extension processor scoped to one handler ident.
    #[must_use]
    pub fn handler_processor(
        mut self,
        ident: impl Into<String>,
        processor: impl OperationProcessor + Send + Sync + 'static,
    ) -> Self {
        self.handler_processors.push((ident.into(), Box::new(processor)));
        self
    }

    /// Apply a file-based project config: scalar fields overwrite the
    /// current values and each security entry registers its requirement
    /// processor plus a definition appender. Builder methods called after
    /// this override the config values.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let project = ProjectConfig::load(Path::new("openapi-config.yaml"))?;
    /// let settings = GeneratorSettings::new().with_project_config(&project);
    /// ```
    #[must_use]
    pub fn with_project_config(mut self, project: &crate::config::ProjectConfig) -> Self {
        self.dialect = project.dialect;
        self.title.clone_from(&project.title);
        self.description.clone_from(&project.description);
        self.version.clone_from(&project.version);
        self.route_prefix.clone_from(&project.route_prefix);
        self.add_missing_path_parameters = project.add_missing_path_parameters;
        self.allow_nullable_body_parameters = project.allow_nullable_body_parameters;

        for entry in &project.security {
            let mut processor = SecurityProcessor::new(entry.name.clone(), entry.kind);
            if let Some(location) = entry.location {
                processor = processor.location(location);
            }
            self.operation_processors.push(Box::new(processor));
            self.document_processors.push(Box::new(SecurityDefinitionAppender::new(
                entry.name.clone(),
                entry.scheme_value(project.dialect),
            )));
        }
        if !project.security.is_empty() {
            self.operation_processors
                .push(Box::new(SecurityScopeProcessor::new(project.scope_scheme.clone())));
        }
        self
    }
}

impl std::fmt::Debug for GeneratorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorSettings")
            .field("dialect", &self.dialect)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("version", &self.version)
            .field("route_prefix", &self.route_prefix)
            .field("add_missing_path_parameters", &self.add_missing_path_parameters)
            .field(
                "allow_nullable_body_parameters",
                &self.allow_nullable_body_parameters,
            )
            .field("no_content_status", &self.no_content_status)
            .field("operation_processors", &self.operation_processors.len())
            .field("document_processors", &self.document_processors.len())
            .field("group_processors", &self.group_processors.len())
            .field("handler_processors", &self.handler_processors.len())
            .finish_non_exhaustive()
    }
}

/// Generates an API description document from a handler catalog.
///
/// # Pass ordering
///
/// Per eligible handler, in catalog order:
/// 1. route templates and methods are resolved, giving the candidate set;
/// 2. each candidate gets its operation id assigned against the ids already
///    in the document (first-registered wins the unsuffixed id) and its
///    deprecation flag set;
/// 3. the candidate runs through the pipeline (global processors in
///    configured order, then group-scoped, then handler-scoped); any `false`
///    discards the candidate without touching the document;
/// 4. survivors are inserted; a `(path, method)` collision aborts the run.
///
/// Document processors run once at the end over the finished document.
pub struct DocumentGenerator {
    settings: GeneratorSettings,
    schema: Box<dyn SchemaService + Send + Sync>,
}

impl DocumentGenerator {
    /// Generator with the built-in structural schema service.
    #[must_use]
    pub fn new(settings: GeneratorSettings) -> Self {
        let schema = Box::new(StructuralSchemaService::new(settings.dialect));
        Self { settings, schema }
    }

    /// Generator with a caller-provided schema service.
    #[must_use]
    pub fn with_schema_service(
        settings: GeneratorSettings,
        schema: Box<dyn SchemaService + Send + Sync>,
    ) -> Self {
        Self { settings, schema }
    }

    /// Generate a document covering every eligible handler in the catalog.
    ///
    /// # Errors
    /// Fails on `(path, method)` collisions, schema-service failures, an
    /// invalid document template, or an error from a registered processor.
    pub fn generate(&self, catalog: &[GroupDescriptor]) -> Result<Document> {
        self.generate_filtered(catalog, None)
    }

    /// Generate a document restricted to handlers whose ident matches the
    /// allow-list (case-insensitive); `None` admits everything.
    ///
    /// # Errors
    /// Same failure modes as [`generate`](Self::generate).
    pub fn generate_filtered(
        &self,
        catalog: &[GroupDescriptor],
        allow: Option<&[String]>,
    ) -> Result<Document> {
        let mut document = self.create_document()?;

        for eligible in discover::scan(catalog, allow) {
            let routes = route::resolve_routes(eligible.handler, &self.settings.route_prefix);
            let methods = route::resolve_methods(eligible.handler);

            let mut contributed = false;
            for path in &routes {
                for method in &methods {
                    let mut description = OperationDescription::new(path.clone(), *method);
                    description.operation.operation_id =
                        Some(self.assign_operation_id(&document, eligible.group, eligible.handler));
                    description.operation.deprecated = eligible.handler.is_deprecated();

                    if self.run_pipeline(
                        &mut document,
                        eligible.group,
                        eligible.handler,
                        &mut description,
                    )? {
                        document.insert(description)?;
                        contributed = true;
                    }
                }
            }
            if contributed {
                document.record_used_handler(eligible.handler.ident.clone());
            }
        }

        {
            let mut ctx = DocumentContext {
                document: &mut document,
                catalog,
                schema: self.schema.as_ref(),
                settings: &self.settings,
            };
            for processor in &self.settings.document_processors {
                processor.process(&mut ctx)?;
            }
        }
        Ok(document)
    }

    fn create_document(&self) -> Result<Document> {
        let mut document = match &self.settings.document_template {
            Some(template) => Document::from_template(template, self.settings.dialect)?,
            None => {
                let mut document = Document::new(self.settings.dialect);
                document.info = Info {
                    title: self
                        .settings
                        .title
                        .clone()
                        .unwrap_or_else(|| "API documentation".to_string()),
                    description: self.settings.description.clone(),
                    version: self
                        .settings
                        .version
                        .clone()
                        .unwrap_or_else(|| "1.0.0".to_string()),
                };
                document
            }
        };
        document.consumes = vec!["application/json".to_string()];
        document.produces = vec!["application/json".to_string()];
        document.generator = Some(format!("handler-openapi v{}", env!("CARGO_PKG_VERSION")));
        Ok(document)
    }

    /// Base id `<group>_<registered-name>` (or the explicit override), with
    /// an incrementing numeric suffix from 2 against ids already present.
    fn assign_operation_id(
        &self,
        document: &Document,
        group: &GroupDescriptor,
        handler: &HandlerDescriptor,
    ) -> String {
        let base = handler.operation_id_override().map_or_else(
            || format!("{}_{}", group.name, handler.registered_name()),
            str::to_string,
        );
        if !document.has_operation_id(&base) {
            return base;
        }
        let mut suffix: u32 = 2;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !document.has_operation_id(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn run_pipeline(
        &self,
        document: &mut Document,
        group: &GroupDescriptor,
        handler: &HandlerDescriptor,
        description: &mut OperationDescription,
    ) -> Result<bool> {
        let mut ctx = OperationContext {
            group,
            handler,
            description,
            definitions: document.definitions_mut(),
            schema: self.schema.as_ref(),
            settings: &self.settings,
        };

        for processor in &self.settings.operation_processors {
            if !processor.process(&mut ctx)? {
                return Ok(false);
            }
        }
        for (name, processor) in &self.settings.group_processors {
            if name == &group.name && !processor.process(&mut ctx)? {
                return Ok(false);
            }
        }
        for (ident, processor) in &self.settings.handler_processors {
            if ident == &handler.ident && !processor.process(&mut ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
