//! Category registry (`categories.yml`)
//!
//! The registry lists the categories templates may be filed under. Loading
//! is all-or-nothing: one malformed entry rejects the whole file. Auditing
//! keeps the well-formed entries and reports the rest. Creating the default
//! registry is a separate, explicit operation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::model::Category;
use crate::validator::{validate_category, ValidationIssue};

/// Default registry file name
pub const CATEGORIES_FILE: &str = "categories.yml";

/// Registry file as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile<T> {
    categories: Vec<T>,
}

/// A validated set of categories, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self {
            categories: vec![
                Category {
                    id: "academic".to_string(),
                    name: "Academic Papers".to_string(),
                    description: "Research papers, theses, and academic documents".to_string(),
                },
                Category {
                    id: "presentations".to_string(),
                    name: "Presentations".to_string(),
                    description: "Slides and presentation templates for conferences and meetings"
                        .to_string(),
                },
            ],
        }
    }
}

impl CategoryRegistry {
    /// Wrap an already validated list of categories
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Load and validate the registry at `path`
    ///
    /// Fails when the file is absent; see [`CategoryRegistry::load_or_bootstrap`]
    /// for callers that want the default registry created instead.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_registry_file(path)?;
        let registry = Self::from_yaml(&content, path)?;
        debug!(
            "Loaded {} categories from {}",
            registry.categories.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse registry YAML; `path` is only used in error messages
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let categories = parse_entries(content, path)?
            .iter()
            .map(|raw| {
                validate_category(raw).map_err(|e| CatalogError::InvalidCategory {
                    path: path.to_path_buf(),
                    reason: format!("{e}: {raw}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { categories })
    }

    /// Write the default registry to `path` and return it
    pub fn bootstrap_default(path: &Path) -> Result<Self> {
        let registry = Self::default();
        registry.save(path)?;
        info!("Created default {}", path.display());
        Ok(registry)
    }

    /// Load the registry, creating the default one first if it is absent
    pub fn load_or_bootstrap(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Categories file not found: {}", path.display());
            Self::bootstrap_default(path)?;
        }
        Self::load(path)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(&RegistryFile {
            categories: self.categories.clone(),
        })
    }

    /// Persist the registry to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self
            .to_yaml()
            .map_err(|source| CatalogError::RegistrySerialize { source })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CatalogError::RegistryWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, content).map_err(|source| CatalogError::RegistryWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the registry for `templar validate`, reporting problems as issues
    ///
    /// Unlike [`CategoryRegistry::load`], a malformed entry does not reject
    /// the file: it becomes an error issue and the remaining entries are
    /// kept so templates can still be checked against them. Returns `None`
    /// when the file is missing or unparseable, or when no valid category
    /// is left.
    pub fn audit(path: &Path) -> (Option<Self>, Vec<ValidationIssue>) {
        let entries = match read_registry_file(path).and_then(|content| parse_entries(&content, path)) {
            Ok(entries) => entries,
            Err(e) => return (None, vec![ValidationIssue::error("registry", None, e.to_string())]),
        };

        let mut issues = Vec::new();
        let mut categories = Vec::new();
        for (index, raw) in entries.iter().enumerate() {
            match validate_category(raw) {
                Ok(category) => categories.push(category),
                Err(e) => {
                    debug!("Rejected category entry {} in {}: {}", index + 1, path.display(), e);
                    issues.push(ValidationIssue::error(
                        "invalid-category",
                        None,
                        format!("Invalid category entry #{} in {}: {e}: {raw}", index + 1, path.display()),
                    ));
                }
            }
        }

        if categories.is_empty() {
            issues.push(ValidationIssue::error(
                "registry",
                None,
                format!("No categories defined in {}", path.display()),
            ));
            return (None, issues);
        }

        (Some(Self { categories }), issues)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category ids, in registry order
    pub fn ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Read the registry file, failing with `RegistryNotFound` when it is absent
fn read_registry_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CatalogError::RegistryNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| CatalogError::RegistryRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the file structure, leaving each entry unvalidated
fn parse_entries(content: &str, path: &Path) -> Result<Vec<serde_json::Value>> {
    let file: RegistryFile<serde_json::Value> =
        serde_yaml_ng::from_str(content).map_err(|source| CatalogError::RegistryParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.categories)
}
