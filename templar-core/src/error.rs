//! Catalog error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the catalog builder, registry loader and client
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The category registry file does not exist
    #[error("Categories file not found: {path}\n\nTo create the default registry, run:\n  templar init")]
    RegistryNotFound { path: PathBuf },

    /// Failed to read the category registry
    #[error("Failed to read categories file {path}")]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The category registry is not valid YAML or has the wrong shape
    #[error("Invalid categories file {path}. Expected {{ categories: [...] }}")]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// A registry entry failed validation; the whole load is rejected
    #[error("Invalid category structure in {path}: {reason}")]
    InvalidCategory { path: PathBuf, reason: String },

    /// Failed to persist the category registry
    #[error("Failed to write categories file {path}")]
    RegistryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the category registry
    #[error("Failed to serialize categories")]
    RegistrySerialize {
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The configuration file is not valid YAML
    #[error("Invalid configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The templates root directory is missing
    #[error("Templates directory not found: {path}")]
    TemplatesRootNotFound { path: PathBuf },

    /// Generic filesystem failure while scanning
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the published artifact
    #[error("Failed to write catalog artifact to {path}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a catalog document
    #[error("Failed to serialize catalog document")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a non-success status
    #[error("Failed to fetch {url}: HTTP {status}")]
    Retrieval { url: String, status: u16 },

    /// The request never produced a response
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body was not a valid catalog document
    #[error("Failed to parse catalog document from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Strict metadata validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// First violation reported by strict validation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    /// Rule that rejected the input
    pub rule_id: &'static str,
    /// Offending field, when the rule targets one
    pub field: Option<&'static str>,
    /// Human-readable description
    pub message: String,
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
