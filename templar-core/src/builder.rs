//! Catalog index builder
//!
//! Walks `templates/<category>/<template>/`, validates every template and
//! assembles the published [`TemplatesApi`] artifact. Every run is a full
//! rebuild. Only a missing templates root aborts the build; problems with a
//! single template just leave it out.
//!
//! Per-template issues go into the [`ValidationReport`] and are only echoed
//! at debug level; callers decide how to present them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::assets::{self, METADATA_FILE, PREVIEW_FILE};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::model::{CatalogCategory, Template, TemplateMetadata, TemplatesApi};
use crate::registry::CategoryRegistry;
use crate::util::create_template_url;
use crate::validator::{MetadataValidator, TemplateValidation, ValidationIssue, ValidationReport};

/// Builds the catalog artifact from a templates directory
pub struct IndexBuilder {
    templates_dir: PathBuf,
    base_url: String,
    validator: MetadataValidator,
}

/// Everything a build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The artifact to publish
    pub api: TemplatesApi,
    /// Issues found per template and about the registry layout
    pub report: ValidationReport,
    /// Template directories examined
    pub templates_seen: usize,
}

impl BuildOutcome {
    pub fn templates_included(&self) -> usize {
        self.api.template_count()
    }

    /// Write the artifact as pretty-printed JSON, creating parent directories
    pub fn write_artifact(&self, path: &Path) -> Result<()> {
        let content = self.api.to_json_pretty()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CatalogError::ArtifactWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, content).map_err(|source| CatalogError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Wrote catalog artifact to {}", path.display());
        Ok(())
    }
}

/// Immediate subdirectory names of `dir`, sorted
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CatalogError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}

impl IndexBuilder {
    pub fn new(templates_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            base_url: base_url.into(),
            validator: MetadataValidator::new(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(&config.templates_dir, &config.base_url)
    }

    /// Build the catalog for `registry`
    pub fn build(&self, registry: &CategoryRegistry) -> Result<BuildOutcome> {
        info!("Building templates index from {}", self.templates_dir.display());

        if !self.templates_dir.is_dir() {
            return Err(CatalogError::TemplatesRootNotFound {
                path: self.templates_dir.clone(),
            });
        }

        let mut report = ValidationReport::new();
        let mut api = TemplatesApi::new(
            registry
                .categories()
                .iter()
                .map(CatalogCategory::from_category)
                .collect(),
        );

        let discovered = subdirectories(&self.templates_dir)?;
        info!(
            "Configured categories: {}",
            registry.ids().join(", ")
        );
        info!("Discovered category directories: {}", discovered.join(", "));

        if discovered.is_empty() {
            debug!("No category directories under {}", self.templates_dir.display());
            report.add_registry_issue(ValidationIssue::error(
                "no-categories",
                None,
                "No template categories found",
            ));
        }

        for category in registry.categories() {
            if !discovered.contains(&category.id) {
                debug!("Category '{}' is defined but has no template directory", category.id);
                report.add_registry_issue(ValidationIssue::warning(
                    "empty-category",
                    None,
                    format!("Category '{}' is defined but has no template directory", category.id),
                ));
            }
        }

        let valid_categories = registry.ids();
        let mut templates_seen = 0;

        for category_id in &discovered {
            let Some(entry) = api.categories.iter_mut().find(|c| &c.id == category_id) else {
                debug!("Skipping category directory '{}' - not defined in the registry", category_id);
                report.add_registry_issue(ValidationIssue::warning(
                    "unknown-category",
                    None,
                    format!("Category directory \"{category_id}\" not found in categories.yml"),
                ));
                continue;
            };

            let category_dir = self.templates_dir.join(category_id);
            let template_ids = subdirectories(&category_dir)?;
            info!(
                "Processing category '{}': {} templates",
                category_id,
                template_ids.len()
            );

            for template_id in &template_ids {
                templates_seen += 1;
                let template_dir = category_dir.join(template_id);
                let (template, result) =
                    self.process_template(&template_dir, template_id, category_id, &valid_categories);

                if let Some(template) = template {
                    info!("  Added template: {}", template.name);
                    entry.templates.push(template);
                }
                report.add_template(result);
            }
        }

        for issue in duplicate_id_issues(&api) {
            debug!("{}", issue.message);
            report.add_registry_issue(issue);
        }

        info!(
            "Included {} of {} templates ({}/{} categories active)",
            api.template_count(),
            templates_seen,
            api.active_category_count(),
            api.categories.len()
        );

        Ok(BuildOutcome {
            api,
            report,
            templates_seen,
        })
    }

    /// Validate one template directory and publish it if it has no errors
    fn process_template(
        &self,
        template_dir: &Path,
        template_id: &str,
        category_id: &str,
        valid_categories: &[String],
    ) -> (Option<Template>, TemplateValidation) {
        let mut result = TemplateValidation::new(template_id, category_id);

        result.extend(assets::check_required_files(template_dir));
        if result.has_errors() {
            log_skipped(&result);
            return (None, result);
        }

        let metadata_path = template_dir.join(METADATA_FILE);
        let raw = match read_metadata(&metadata_path) {
            Ok(raw) => raw,
            Err(issue) => {
                result.push(issue);
                log_skipped(&result);
                return (None, result);
            }
        };

        let validation = self
            .validator
            .validate(&raw, template_id, category_id, valid_categories);
        result.extend(validation.issues);
        result.extend(assets::check_archive(template_dir));
        result.extend(assets::check_preview(template_dir));

        for issue in result.issues.iter().filter(|i| !i.is_error()) {
            debug!("  {}: {}", template_id, issue.message);
        }

        if result.has_errors() {
            log_skipped(&result);
            return (None, result);
        }

        let metadata: TemplateMetadata = match serde_json::from_value(raw) {
            Ok(metadata) => metadata,
            Err(e) => {
                result.push(ValidationIssue::error(
                    "schema",
                    None,
                    format!("Invalid metadata: {e}"),
                ));
                log_skipped(&result);
                return (None, result);
            }
        };

        let download_url = create_template_url(&self.base_url, category_id, template_id, assets::ARCHIVE_FILE);
        let preview_url = template_dir
            .join(PREVIEW_FILE)
            .is_file()
            .then(|| create_template_url(&self.base_url, category_id, template_id, PREVIEW_FILE));

        let template = Template::from_metadata(metadata, category_id, download_url, preview_url);
        (Some(template), result)
    }
}

/// Read and parse `metadata.json`
fn read_metadata(path: &Path) -> std::result::Result<serde_json::Value, ValidationIssue> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ValidationIssue::error("metadata-read", None, format!("Error reading {METADATA_FILE}: {e}"))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        ValidationIssue::error(
            "metadata-json",
            None,
            format!("Invalid JSON in {METADATA_FILE}: {e}"),
        )
    })
}

fn log_skipped(result: &TemplateValidation) {
    for issue in result.issues.iter().filter(|i| i.is_error()) {
        debug!("  {}: {}", result.template_id, issue.message);
    }
    debug!(
        "Skipped template '{}/{}'",
        result.category_id, result.template_id
    );
}

/// Template ids published under more than one category
///
/// Ids are only required to be unique within a category, so this is a
/// warning.
fn duplicate_id_issues(api: &TemplatesApi) -> Vec<ValidationIssue> {
    let mut seen: HashMap<&str, Vec<&str>> = HashMap::new();
    for category in &api.categories {
        for template in &category.templates {
            seen.entry(template.id.as_str())
                .or_default()
                .push(category.id.as_str());
        }
    }

    let mut duplicates: Vec<_> = seen
        .into_iter()
        .filter(|(_, categories)| categories.len() > 1)
        .collect();
    duplicates.sort();

    duplicates
        .into_iter()
        .map(|(id, categories)| {
            ValidationIssue::warning(
                "duplicate-id",
                None,
                format!(
                    "Template id '{id}' is published in several categories: {}",
                    categories.join(", ")
                ),
            )
        })
        .collect()
}
