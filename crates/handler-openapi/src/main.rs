//! CLI for `handler-openapi`.
//!
//! Standalone binary — reads a serialized handler catalog and writes the
//! generated document.
//!
//! # Subcommands
//!
//! ```text
//! # Generate a document from a catalog file
//! handler-openapi generate \
//!   --catalog handlers.yaml \
//!   --config openapi-config.yaml \
//!   --output swagger.json
//!
//! # Print the operations a catalog resolves to
//! handler-openapi inspect --catalog handlers.yaml
//! ```

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use handler_openapi::{DocumentGenerator, GeneratorSettings, ProjectConfig, SchemaDialect};
use handler_openapi_core::Catalog;

/// Swagger/OpenAPI document generator for annotated HTTP handler catalogs.
#[derive(Parser)]
#[command(name = "handler-openapi", version, about)]
enum Cli {
    /// Generate a document from a handler catalog.
    Generate(GenerateArgs),

    /// Print the operations, definitions, and unused handlers a catalog
    /// resolves to, without writing a document.
    Inspect(InspectArgs),
}

#[derive(Parser)]
struct GenerateArgs {
    /// Path to the handler catalog YAML file.
    #[arg(short = 'C', long)]
    catalog: PathBuf,

    /// Path to a project config YAML file.
    ///
    /// Provides document metadata, parameter toggles, and security schemes.
    /// CLI flags override values from the config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the output JSON file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a JSON document template to pre-seed info, definitions, and
    /// security definitions.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Document title. Overrides `title` from the config file.
    #[arg(long)]
    title: Option<String>,

    /// API version string. Overrides `version` from the config file.
    #[arg(long, conflicts_with = "cargo_toml")]
    api_version: Option<String>,

    /// Read the API version from this `Cargo.toml` instead of
    /// `--api-version`.
    #[arg(long)]
    cargo_toml: Option<PathBuf>,

    /// Route prefix. Overrides `route_prefix` from the config file.
    #[arg(long)]
    prefix: Option<String>,

    /// Target dialect: `swagger2` or `openapi3`.
    /// Overrides `dialect` from the config file.
    #[arg(long)]
    dialect: Option<String>,

    /// Comma-separated handler idents to restrict generation to.
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Synthesize required path parameters for unmatched placeholders.
    #[arg(long)]
    add_missing_path_parameters: bool,

    /// Never mark body parameter types nullable.
    #[arg(long)]
    no_nullable_bodies: bool,
}

#[derive(Parser)]
struct InspectArgs {
    /// Path to the handler catalog YAML file.
    #[arg(short = 'C', long)]
    catalog: PathBuf,

    /// Path to a project config YAML file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route prefix. Overrides `route_prefix` from the config file.
    #[arg(long)]
    prefix: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli {
        Cli::Generate(args) => run_generate(&args),
        Cli::Inspect(args) => run_inspect(&args),
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    eprintln!(
        "Loaded {} groups, {} handlers",
        catalog.groups.len(),
        catalog.handler_count(),
    );

    // Build settings: start from project config, then apply CLI overrides
    let project = load_project_config(args.config.as_ref())?;
    let mut settings = GeneratorSettings::new().with_project_config(&project);

    if let Some(path) = &args.template {
        let template = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        settings = settings.document_template(template);
    }
    if let Some(title) = &args.title {
        settings = settings.title(title.clone());
    }
    if let Some(version) = resolve_version(args.api_version.as_ref(), args.cargo_toml.as_ref())? {
        settings = settings.version(version);
    }
    if let Some(prefix) = &args.prefix {
        settings = settings.route_prefix(prefix.clone());
    }
    if let Some(dialect) = &args.dialect {
        settings = settings.dialect(parse_dialect(dialect)?);
    }
    if args.add_missing_path_parameters {
        settings = settings.add_missing_path_parameters(true);
    }
    if args.no_nullable_bodies {
        settings = settings.allow_nullable_body_parameters(false);
    }

    let generator = DocumentGenerator::new(settings);
    let allow = (!args.only.is_empty()).then_some(args.only.as_slice());
    let document = generator
        .generate_filtered(&catalog.groups, allow)
        .context("Failed to generate document")?;

    let operations = document.operations().count();
    eprintln!(
        "Generated {} operations across {} paths ({} definitions)",
        operations,
        document.paths().len(),
        document.definitions().len(),
    );

    let mut json = document
        .to_json_pretty()
        .context("Failed to serialize document")?;
    json.push('\n');

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("Wrote document to {}", path.display());
        }
        None => print!("{json}"),
    }
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;

    let project = load_project_config(args.config.as_ref())?;
    let mut settings = GeneratorSettings::new().with_project_config(&project);
    if let Some(prefix) = &args.prefix {
        settings = settings.route_prefix(prefix.clone());
    }

    let document = DocumentGenerator::new(settings)
        .generate(&catalog.groups)
        .context("Failed to generate document")?;

    println!("=== Operations ===");
    println!();
    for (path, method, operation) in document.operations() {
        println!(
            "  {:<7} {}  {}",
            method.as_str().to_uppercase(),
            path,
            operation.operation_id.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!("Definitions: {}", document.definitions().len());
    for name in document.definitions().names() {
        println!("  {name}");
    }

    let used = document.used_handlers();
    let skipped: Vec<&str> = catalog
        .groups
        .iter()
        .flat_map(|group| &group.handlers)
        .filter(|handler| !used.iter().any(|ident| ident == &handler.ident))
        .map(|handler| handler.ident.as_str())
        .collect();

    println!();
    println!(
        "Handlers used: {} of {}",
        used.len(),
        catalog.handler_count()
    );
    if !skipped.is_empty() {
        println!("  skipped: {}", skipped.join(", "));
    }

    Ok(())
}

/// Load and parse a handler catalog YAML file.
fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse catalog: {}", path.display()))
}

/// Load the project config, or defaults when no path was given.
fn load_project_config(path: Option<&PathBuf>) -> anyhow::Result<ProjectConfig> {
    match path {
        Some(path) => {
            eprintln!("Loading config: {}", path.display());
            ProjectConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(ProjectConfig::default()),
    }
}

/// Resolve the API version from the explicit flag or a Cargo.toml; `None`
/// when neither was given (the config or generator default applies).
fn resolve_version(
    explicit: Option<&String>,
    cargo_toml: Option<&PathBuf>,
) -> anyhow::Result<Option<String>> {
    match (explicit, cargo_toml) {
        (Some(v), _) => Ok(Some(v.clone())),
        (_, Some(path)) => read_cargo_version(path).map(Some),
        (None, None) => Ok(None),
    }
}

fn parse_dialect(value: &str) -> anyhow::Result<SchemaDialect> {
    match value {
        "swagger2" => Ok(SchemaDialect::Swagger2),
        "openapi3" => Ok(SchemaDialect::OpenApi3),
        _ => bail!("Unknown dialect '{value}' (expected 'swagger2' or 'openapi3')"),
    }
}

/// Read `version` from a Cargo.toml `[package]` or `[workspace.package]`.
fn read_cargo_version(path: &Path) -> anyhow::Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let doc: toml::Table =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(v) = doc
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(toml::Value::as_str)
    {
        return Ok(v.to_string());
    }

    if let Some(v) = doc
        .get("workspace")
        .and_then(|w| w.get("package"))
        .and_then(|p| p.get("version"))
        .and_then(toml::Value::as_str)
    {
        return Ok(v.to_string());
    }

    bail!("No version found in {}", path.display());
}
