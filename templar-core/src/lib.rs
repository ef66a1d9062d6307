//! Templar core library
//!
//! Builds, validates and reads catalogs of document templates laid out as
//! `templates/<category>/<template>/` directories next to a `categories.yml`
//! registry. The builder aggregates every valid template into a single
//! `api/templates.json` artifact which [`client::CatalogClient`] fetches,
//! caches and queries.

pub mod assets;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod util;
pub mod validator;

pub use builder::{BuildOutcome, IndexBuilder};
pub use client::{CatalogClient, FetchResponse, Fetcher};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result, ValidationError};
pub use model::{CatalogCategory, Category, Template, TemplateMetadata, TemplatesApi};
pub use registry::CategoryRegistry;
pub use validator::{
    validate_category, validate_template_metadata, MetadataValidator, Severity, ValidationIssue,
    ValidationReport,
};
