//! Catalog data model
//!
//! `metadata.json` files deserialize into [`TemplateMetadata`]; the builder
//! turns accepted metadata into [`Template`]s and groups them under
//! [`CatalogCategory`] entries of the published [`TemplatesApi`] document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};

/// Schema version stamped on every published artifact
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A category from the registry (`categories.yml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Identifier, lowercase alphanumeric with hyphens
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Author-supplied template metadata (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    /// Semantic version (x.y.z)
    pub version: String,
    /// ISO-8601 date or timestamp
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    /// Any additional keys, passed through to the published template
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A template as published in the catalog artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub version: String,
    pub last_updated: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A registry category together with its published templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// The published catalog artifact (`api/templates.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesApi {
    /// Build timestamp
    pub last_updated: String,
    /// Artifact schema version
    pub version: String,
    pub categories: Vec<CatalogCategory>,
}

impl Template {
    /// Publish metadata under the directory-derived category.
    ///
    /// The directory always wins over the declared `category`. Explicit
    /// URLs in the metadata take precedence over the computed defaults; an
    /// empty string counts as absent.
    pub fn from_metadata(
        metadata: TemplateMetadata,
        category_id: &str,
        default_download_url: String,
        default_preview_image: Option<String>,
    ) -> Self {
        Self {
            id: metadata.id,
            name: metadata.name,
            description: metadata.description,
            category: category_id.to_string(),
            tags: metadata.tags,
            author: metadata.author,
            version: metadata.version,
            last_updated: metadata.last_updated,
            download_url: metadata
                .download_url
                .filter(|url| !url.is_empty())
                .unwrap_or(default_download_url),
            preview_image: metadata
                .preview_image
                .filter(|url| !url.is_empty())
                .or(default_preview_image),
            extra: metadata.extra,
        }
    }

    /// Case-insensitive match against name, description, tags and author.
    ///
    /// `query_lower` must already be lowercased.
    fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(query_lower))
            || self.author.to_lowercase().contains(query_lower)
    }
}

impl CatalogCategory {
    /// Start an output entry for a registry category with no templates
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            description: category.description.clone(),
            templates: Vec::new(),
        }
    }

    /// The registry view of this entry, without templates
    pub fn category(&self) -> Category {
        Category {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl TemplatesApi {
    /// Create an empty artifact stamped with the current time
    pub fn new(categories: Vec<CatalogCategory>) -> Self {
        Self {
            last_updated: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            version: SCHEMA_VERSION.to_string(),
            categories,
        }
    }

    /// Parse an artifact from JSON
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| CatalogError::Serialize { source })
    }

    /// Find a category entry by id
    pub fn find_category(&self, category_id: &str) -> Option<&CatalogCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Templates published under a category; empty for unknown ids
    pub fn templates_in(&self, category_id: &str) -> &[Template] {
        self.find_category(category_id)
            .map(|c| c.templates.as_slice())
            .unwrap_or(&[])
    }

    /// Every template across every category, in artifact order
    pub fn all_templates(&self) -> impl Iterator<Item = &Template> {
        self.categories.iter().flat_map(|c| c.templates.iter())
    }

    /// Search templates by query string
    ///
    /// Matches against name, description, tags and author (case-insensitive).
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Template> {
        let query_lower = query.to_lowercase();
        self.all_templates()
            .filter(|t| t.matches(&query_lower))
            .collect()
    }

    /// Registry view of the artifact's categories
    pub fn categories(&self) -> Vec<Category> {
        self.categories.iter().map(CatalogCategory::category).collect()
    }

    /// Total number of published templates
    pub fn template_count(&self) -> usize {
        self.categories.iter().map(|c| c.templates.len()).sum()
    }

    /// Number of categories with at least one template
    pub fn active_category_count(&self) -> usize {
        self.categories
            .iter()
            .filter(|c| !c.templates.is_empty())
            .count()
    }
}
