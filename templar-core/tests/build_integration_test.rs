//! End-to-end tests for building a catalog from a templates tree
//!
//! Each test lays out a real `categories.yml` and `templates/` directory in a
//! temp dir, runs the builder and reads the written artifact back.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use templar_core::assets::{ARCHIVE_FILE, METADATA_FILE, PNG_SIGNATURE, PREVIEW_FILE, ZIP_SIGNATURE};
use templar_core::registry::CATEGORIES_FILE;
use templar_core::{CatalogError, CategoryRegistry, IndexBuilder, TemplatesApi};

const BASE_URL: &str = "https://texlyre.github.io/texlyre-templates";

struct Workspace {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join("templates")).unwrap();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    fn categories_file(&self) -> PathBuf {
        self.root.join(CATEGORIES_FILE)
    }

    fn output_file(&self) -> PathBuf {
        self.root.join("api").join("templates.json")
    }

    fn template_dir(&self, category: &str, id: &str) -> PathBuf {
        let dir = self.templates_dir().join(category).join(id);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn add_template(&self, category: &str, id: &str, metadata: Value) -> PathBuf {
        let dir = self.template_dir(category, id);
        fs::write(dir.join(METADATA_FILE), serde_json::to_vec_pretty(&metadata).unwrap()).unwrap();
        write_with_header(&dir.join(ARCHIVE_FILE), &ZIP_SIGNATURE);
        write_with_header(&dir.join(PREVIEW_FILE), &PNG_SIGNATURE);
        dir
    }

    fn build(&self) -> TemplatesApi {
        let registry = CategoryRegistry::load_or_bootstrap(&self.categories_file()).unwrap();
        let outcome = IndexBuilder::new(self.templates_dir(), BASE_URL)
            .build(&registry)
            .unwrap();
        outcome.write_artifact(&self.output_file()).unwrap();

        let written = fs::read_to_string(self.output_file()).unwrap();
        TemplatesApi::from_json(&written).unwrap()
    }
}

fn write_with_header(path: &Path, header: &[u8]) {
    let mut bytes = header.to_vec();
    bytes.extend_from_slice(&[0u8; 128]);
    fs::write(path, bytes).unwrap();
}

fn paper_metadata() -> Value {
    json!({
        "id": "my-paper",
        "name": "My Paper",
        "description": "A journal article template with bibliography support",
        "category": "academic",
        "tags": ["thesis"],
        "author": "A. Author",
        "version": "1.2.0",
        "lastUpdated": "2025-01-15"
    })
}

#[test]
fn test_valid_template_is_published_with_default_urls() {
    let ws = Workspace::new();
    ws.add_template("academic", "my-paper", paper_metadata());

    let api = ws.build();

    assert_eq!(api.version, "1.0.0");
    assert_eq!(api.template_count(), 1);
    assert_eq!(
        api.categories().iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["academic", "presentations"]
    );

    let template = &api.templates_in("academic")[0];
    assert_eq!(template.id, "my-paper");
    assert_eq!(template.category, "academic");
    assert_eq!(
        template.download_url,
        "https://texlyre.github.io/texlyre-templates/templates/academic/my-paper/template.zip"
    );
    assert_eq!(
        template.preview_image.as_deref(),
        Some("https://texlyre.github.io/texlyre-templates/templates/academic/my-paper/preview.png")
    );
    assert!(api.templates_in("presentations").is_empty());
}

#[test]
fn test_bad_archive_is_excluded_and_build_succeeds() {
    let ws = Workspace::new();
    let dir = ws.add_template("academic", "my-paper", paper_metadata());
    fs::write(dir.join(ARCHIVE_FILE), b"not a zip archive").unwrap();

    let api = ws.build();

    assert_eq!(api.template_count(), 0);
    assert!(ws.output_file().exists());
}

#[test]
fn test_artifact_uses_camel_case_and_omits_missing_preview() {
    let ws = Workspace::new();
    let dir = ws.add_template("academic", "my-paper", paper_metadata());
    fs::remove_file(dir.join(PREVIEW_FILE)).unwrap();

    ws.build();

    let raw: Value = serde_json::from_str(&fs::read_to_string(ws.output_file()).unwrap()).unwrap();
    assert!(raw.get("lastUpdated").is_some());
    let template = &raw["categories"][0]["templates"][0];
    assert_eq!(template["lastUpdated"], json!("2025-01-15"));
    assert!(template.get("downloadUrl").is_some());
    assert!(template.get("previewImage").is_none());
}

#[test]
fn test_mixed_tree() {
    let ws = Workspace::new();
    fs::write(
        ws.categories_file(),
        "categories:\n  - id: academic\n    name: Academic Papers\n    description: Research papers\n",
    )
    .unwrap();

    ws.add_template("academic", "my-paper", paper_metadata());

    // Declared id is kept, the mismatch only warns
    let mut renamed = paper_metadata();
    renamed["id"] = json!("old-name");
    ws.add_template("academic", "renamed", renamed);

    // Missing author is an error
    let mut incomplete = paper_metadata();
    incomplete.as_object_mut().unwrap().remove("author");
    ws.add_template("academic", "incomplete", incomplete);

    // Missing archive skips the template
    let dir = ws.add_template("academic", "no-archive", paper_metadata());
    fs::remove_file(dir.join(ARCHIVE_FILE)).unwrap();

    // Category directory outside the registry is ignored
    ws.add_template("posters", "a0-poster", paper_metadata());

    let registry = CategoryRegistry::load(&ws.categories_file()).unwrap();
    let outcome = IndexBuilder::new(ws.templates_dir(), BASE_URL)
        .build(&registry)
        .unwrap();

    assert_eq!(outcome.templates_seen, 4);
    assert_eq!(outcome.templates_included(), 2);

    let published: Vec<_> = outcome.api.templates_in("academic").iter().map(|t| t.id.as_str()).collect();
    assert_eq!(published, vec!["my-paper", "old-name"]);
    assert!(outcome
        .report
        .registry_issues
        .iter()
        .any(|i| i.rule_id == "unknown-category"));
    assert_eq!(outcome.report.valid_template_count(), 2);
    assert!(!outcome.report.passed());
}

#[test]
fn test_missing_templates_root_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let builder = IndexBuilder::new(temp_dir.path().join("templates"), BASE_URL);

    let err = builder.build(&CategoryRegistry::default()).unwrap_err();
    assert!(matches!(err, CatalogError::TemplatesRootNotFound { .. }));
}

#[test]
fn test_rebuild_reflects_removed_templates() {
    let ws = Workspace::new();
    let dir = ws.add_template("academic", "my-paper", paper_metadata());
    assert_eq!(ws.build().template_count(), 1);

    fs::remove_dir_all(dir).unwrap();
    assert_eq!(ws.build().template_count(), 0);
}
