//! Templar - build, validate and browse document template catalogs
//!
//! Authoring commands (`build`, `validate`, `init`, `new`) work on a local
//! `templates/` tree; browsing commands (`search`, `list`) read a published
//! catalog over HTTP.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use templar_core::assets::{ARCHIVE_FILE, METADATA_FILE, PREVIEW_FILE};
use templar_core::util::{generate_template_metadata, sanitize_template_id};
use templar_core::validator::{Severity, ValidationIssue, ValidationReport};
use templar_core::{
    validate_template_metadata, CatalogConfig, CategoryRegistry, IndexBuilder,
};

mod catalog_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "templar",
    about = "Build, validate and browse document template catalogs",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Configuration file (defaults to ./templar.yml when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Build the catalog artifact from the templates directory
    Build {
        /// Root of the <category>/<template>/ tree
        #[clap(long)]
        templates_dir: Option<PathBuf>,

        /// Category registry file
        #[clap(long)]
        categories: Option<PathBuf>,

        /// Where to write the artifact
        #[clap(long)]
        output: Option<PathBuf>,

        /// Public base URL used for download and preview links
        #[clap(long)]
        base_url: Option<String>,

        /// Write the default category registry if none exists
        #[clap(long)]
        bootstrap_categories: bool,
    },

    /// Validate every template and the category registry
    Validate {
        /// Root of the <category>/<template>/ tree
        #[clap(long)]
        templates_dir: Option<PathBuf>,

        /// Category registry file
        #[clap(long)]
        categories: Option<PathBuf>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Create the default category registry and templates directory
    Init {
        /// Root of the <category>/<template>/ tree
        #[clap(long)]
        templates_dir: Option<PathBuf>,

        /// Category registry file
        #[clap(long)]
        categories: Option<PathBuf>,
    },

    /// Scaffold metadata for a new template
    New {
        /// Human-readable template name
        #[clap(long)]
        name: String,

        /// Category the template is filed under
        #[clap(long)]
        category: String,

        /// Template author
        #[clap(long)]
        author: String,

        /// Short description
        #[clap(long)]
        description: String,

        /// Tags (comma-separated)
        #[clap(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Template id (derived from the name when omitted)
        #[clap(long)]
        id: Option<String>,

        /// Root of the <category>/<template>/ tree
        #[clap(long)]
        templates_dir: Option<PathBuf>,

        /// Category registry file
        #[clap(long)]
        categories: Option<PathBuf>,
    },

    /// Search templates in a published catalog
    Search {
        /// Search query (searches name, description, tags, author)
        query: Option<String>,

        /// Only show templates in this category
        #[clap(long)]
        category: Option<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,

        /// Bypass the catalog cache
        #[clap(long)]
        refresh: bool,

        /// Catalog base URL
        #[clap(long)]
        base_url: Option<String>,
    },

    /// List the categories of a published catalog
    List {
        /// Output results as JSON
        #[clap(long)]
        json: bool,

        /// Catalog base URL
        #[clap(long)]
        base_url: Option<String>,
    },
}

/// Initialize tracing from --log-level
///
/// Logs go to stderr so that stdout only carries reports and JSON output.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let mut config = CatalogConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!("Using configuration: {:?}", config);

    match cli.command {
        Command::Build {
            templates_dir,
            categories,
            output,
            base_url,
            bootstrap_categories,
        } => {
            apply_paths(&mut config, templates_dir, categories);
            if let Some(output) = output {
                config.output_file = output;
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            build_command(&config, bootstrap_categories)
        }
        Command::Validate {
            templates_dir,
            categories,
            json,
        } => {
            apply_paths(&mut config, templates_dir, categories);
            validate_command(&config, json)
        }
        Command::Init {
            templates_dir,
            categories,
        } => {
            apply_paths(&mut config, templates_dir, categories);
            init_command(&config)
        }
        Command::New {
            name,
            category,
            author,
            description,
            tags,
            id,
            templates_dir,
            categories,
        } => {
            apply_paths(&mut config, templates_dir, categories);
            new_command(&config, NewTemplate {
                name,
                category,
                author,
                description,
                tags,
                id,
            })
        }
        Command::Search {
            query,
            category,
            json,
            refresh,
            base_url,
        } => {
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            catalog_cli::execute_search(&config, query.as_deref(), category.as_deref(), json, refresh).await
        }
        Command::List { json, base_url } => {
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            catalog_cli::execute_list(&config, json).await
        }
    }
}

fn apply_paths(config: &mut CatalogConfig, templates_dir: Option<PathBuf>, categories: Option<PathBuf>) {
    if let Some(templates_dir) = templates_dir {
        config.templates_dir = templates_dir;
    }
    if let Some(categories) = categories {
        config.categories_file = categories;
    }
}

fn build_command(config: &CatalogConfig, bootstrap_categories: bool) -> Result<()> {
    let registry = if bootstrap_categories {
        CategoryRegistry::load_or_bootstrap(&config.categories_file)
    } else {
        CategoryRegistry::load(&config.categories_file)
    }
    .context("Failed to load category registry")?;

    let outcome = IndexBuilder::from_config(config)
        .build(&registry)
        .context("Failed to build templates index")?;
    outcome.write_artifact(&config.output_file)?;

    println!("✅ Templates API built successfully!");
    println!("Total templates: {}", outcome.templates_included());
    println!(
        "Categories: {} active of {}",
        outcome.api.active_category_count(),
        outcome.api.categories.len()
    );
    if outcome.templates_seen > outcome.templates_included() {
        println!(
            "Skipped: {} (run 'templar validate' for details)",
            outcome.templates_seen - outcome.templates_included()
        );
        for result in outcome.report.templates.iter().filter(|t| t.error_count > 0) {
            for issue in result.issues.iter().filter(|i| i.is_error()) {
                println!("  ❌ {}/{}: {}", result.category_id, result.template_id, issue.message);
            }
        }
    }
    println!("Output: {}", config.output_file.display());

    if outcome.templates_included() == 0 {
        println!();
        println!("⚠️  No templates were included in the catalog");
    }

    Ok(())
}

fn validate_command(config: &CatalogConfig, json: bool) -> Result<()> {
    info!("Validating templates in {}", config.templates_dir.display());

    let (registry, registry_issues) = CategoryRegistry::audit(&config.categories_file);

    let mut report = match registry {
        Some(registry) if config.templates_dir.is_dir() => IndexBuilder::from_config(config)
            .build(&registry)
            .context("Failed to scan templates")?
            .report,
        Some(_) => {
            let mut report = ValidationReport::new();
            report.add_registry_issue(ValidationIssue::error(
                "templates-root",
                None,
                format!("Templates directory not found: {}", config.templates_dir.display()),
            ));
            report
        }
        None => ValidationReport::new(),
    };
    for issue in registry_issues {
        report.add_registry_issue(issue);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report_to_json(&report))?);
    } else {
        print_validation_report(&report);
    }

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn report_to_json(report: &ValidationReport) -> serde_json::Value {
    let issue_json = |i: &ValidationIssue| {
        serde_json::json!({
            "severity": format!("{:?}", i.severity),
            "rule_id": i.rule_id,
            "field": i.field,
            "message": i.message,
        })
    };

    serde_json::json!({
        "total_templates": report.templates.len(),
        "valid_templates": report.valid_template_count(),
        "total_errors": report.total_errors,
        "total_warnings": report.total_warnings,
        "registry": report.registry_issues.iter().map(issue_json).collect::<Vec<_>>(),
        "templates": report.templates.iter().map(|t| {
            serde_json::json!({
                "category": t.category_id,
                "id": t.template_id,
                "error_count": t.error_count,
                "warning_count": t.warning_count,
                "issues": t.issues.iter().map(issue_json).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    })
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "❌",
        Severity::Warning => "⚠️ ",
    }
}

fn print_validation_report(report: &ValidationReport) {
    for issue in &report.registry_issues {
        println!("{} {}", marker(issue.severity), issue.message);
    }

    let mut current_category: Option<&str> = None;
    for template in &report.templates {
        if current_category != Some(template.category_id.as_str()) {
            println!("\nValidating category: {}", template.category_id);
            current_category = Some(template.category_id.as_str());
        }

        println!("\n  {}", template.template_id);
        for issue in &template.issues {
            println!(
                "{} {}: {}",
                marker(issue.severity),
                template.template_id,
                issue.message
            );
        }
        if !template.has_errors() {
            println!("✅ {}: Template validation passed", template.template_id);
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("VALIDATION SUMMARY");
    println!("{}", "=".repeat(50));
    println!("Total templates: {}", report.templates.len());
    println!("Valid templates: {}", report.valid_template_count());
    println!("Errors: {}", report.total_errors);
    println!("Warnings: {}", report.total_warnings);

    println!();
    if report.passed() {
        println!("All validations passed!");
    } else {
        println!("Validation failed - please fix errors above");
    }
}

fn init_command(config: &CatalogConfig) -> Result<()> {
    let path = &config.categories_file;
    if path.exists() {
        bail!(
            "{} already exists. Remove it first to recreate the default registry",
            path.display()
        );
    }

    let registry = CategoryRegistry::bootstrap_default(path)?;

    for category in registry.categories() {
        let dir = config.templates_dir.join(&category.id);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    println!("✅ Created {}", path.display());
    println!(
        "Categories: {}",
        registry.ids().join(", ")
    );
    println!("Templates directory: {}", config.templates_dir.display());
    println!("\nNext: run 'templar new' to scaffold your first template");

    Ok(())
}

/// Fields collected by `templar new`
struct NewTemplate {
    name: String,
    category: String,
    author: String,
    description: String,
    tags: Vec<String>,
    id: Option<String>,
}

fn new_command(config: &CatalogConfig, args: NewTemplate) -> Result<()> {
    let id = match args.id {
        Some(id) => id,
        None => sanitize_template_id(&args.name),
    };
    if id.is_empty() {
        bail!("Cannot derive a template id from '{}', pass --id", args.name);
    }

    // Membership is only checked when a registry exists
    if config.categories_file.exists() {
        let registry = CategoryRegistry::load(&config.categories_file)?;
        if !registry.contains(&args.category) {
            bail!(
                "Unknown category '{}'. Known categories: {}",
                args.category,
                registry.ids().join(", ")
            );
        }
    }

    let tags: Vec<String> = args
        .tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let metadata = generate_template_metadata(
        &id,
        &args.name,
        &args.description,
        &args.category,
        &args.author,
        &tags,
    );
    let value = serde_json::to_value(&metadata)?;
    validate_template_metadata(&value).context("Generated metadata is invalid")?;

    let template_dir = config.templates_dir.join(&args.category).join(&id);
    let metadata_path = template_dir.join(METADATA_FILE);
    if metadata_path.exists() {
        bail!("{} already exists", metadata_path.display());
    }

    fs::create_dir_all(&template_dir)
        .with_context(|| format!("Failed to create {}", template_dir.display()))?;
    write_metadata(&metadata_path, &value)?;

    println!("✅ Created {}", metadata_path.display());
    println!("\nNext steps:");
    println!("  1. Add {}", template_dir.join(ARCHIVE_FILE).display());
    println!("  2. Add {} (recommended)", template_dir.join(PREVIEW_FILE).display());
    println!("  3. Run 'templar validate'");

    Ok(())
}

fn write_metadata(path: &Path, value: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content + "\n").with_context(|| format!("Failed to write {}", path.display()))
}
