//! Catalog configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Command line flags
//! 2. `templar.yml` in the working directory (or `--config <path>`)
//! 3. Built-in defaults
//!
//! ```yaml
//! templatesDir: ./templates
//! categoriesFile: ./categories.yml
//! outputFile: ./api/templates.json
//! baseUrl: https://texlyre.github.io/texlyre-templates
//! cacheTtlSeconds: 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CatalogError, Result};

/// Default configuration file name
pub const CONFIG_FILE: &str = "templar.yml";

/// Public location the catalog is served from
pub const DEFAULT_BASE_URL: &str = "https://texlyre.github.io/texlyre-templates";

/// Path of the artifact relative to the base URL
pub const API_PATH: &str = "api/templates.json";

/// How long the client trusts a fetched artifact (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Paths and URLs shared by the builder, the validator and the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Root of the `<category>/<template>/` tree
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Category registry
    #[serde(default = "default_categories_file")]
    pub categories_file: PathBuf,

    /// Where the build writes the artifact
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Public base URL used for default download/preview links and by the client
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client cache freshness window
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            categories_file: default_categories_file(),
            output_file: default_output_file(),
            base_url: default_base_url(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./templates")
}

fn default_categories_file() -> PathBuf {
    PathBuf::from("./categories.yml")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("./api/templates.json")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

impl CatalogConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml_ng::from_str(&content).map_err(|source| CatalogError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else `templar.yml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Full URL of the published artifact
    pub fn api_url(&self) -> String {
        format!("{}/{API_PATH}", self.base_url.trim_end_matches('/'))
    }
}
