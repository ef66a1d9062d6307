//! Small helpers shared by the builder, the CLI and library users

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Map;

use crate::model::TemplateMetadata;

/// Version stamped on freshly generated metadata
pub const INITIAL_VERSION: &str = "1.0.0";

static NON_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Public URL of a file inside a template directory
///
/// `{base_url}/templates/{category_id}/{template_id}/{filename}`
pub fn create_template_url(
    base_url: &str,
    category_id: &str,
    template_id: &str,
    filename: &str,
) -> String {
    format!(
        "{}/templates/{category_id}/{template_id}/{filename}",
        base_url.trim_end_matches('/')
    )
}

/// Render a byte count with one decimal and a binary unit (B, KB, MB, GB)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.1} {}", UNITS[unit])
}

/// Derive a directory-safe template id from a display name
///
/// "My Fancy Paper (v2)!" becomes "my-fancy-paper-v2".
pub fn sanitize_template_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_ID_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Build metadata for a new template
///
/// Tags are deduplicated keeping first occurrence order. The version starts
/// at [`INITIAL_VERSION`] and `lastUpdated` is the current time.
pub fn generate_template_metadata(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    author: &str,
    tags: &[String],
) -> TemplateMetadata {
    let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique_tags.contains(tag) {
            unique_tags.push(tag.clone());
        }
    }

    TemplateMetadata {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        tags: unique_tags,
        author: author.to_string(),
        version: INITIAL_VERSION.to_string(),
        last_updated: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        download_url: None,
        preview_image: None,
        extra: Map::new(),
    }
}
