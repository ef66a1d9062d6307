//! Validation rules for template metadata

use super::{Severity, ValidationContext, ValidationIssue, ValidationMode, ValidationRule};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Fields every `metadata.json` must carry, in check order
pub const REQUIRED_FIELDS: [&str; 8] = [
    "id",
    "name",
    "description",
    "category",
    "tags",
    "author",
    "version",
    "lastUpdated",
];

/// Fields every registry category must carry
pub const CATEGORY_FIELDS: [&str; 3] = ["id", "name", "description"];

/// Descriptions shorter than this draw a warning
pub const MIN_DESCRIPTION_CHARS: usize = 20;

static SEMVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());
static CATEGORY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// A value counts as present unless it is absent, null, false, zero or ""
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Whether `id` is lowercase alphanumeric with hyphens
pub fn is_valid_category_id(id: &str) -> bool {
    CATEGORY_ID.is_match(id)
}

/// Whether `version` is plain `major.minor.patch`
pub fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// Attempt to parse a date; anything unparseable is invalid
///
/// Accepts RFC 3339 timestamps, RFC 2822 dates, plain `YYYY-MM-DD` dates and
/// timestamps without an offset.
pub fn is_valid_date(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

/// Render a metadata value for messages; strings without quotes
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rule: All required fields are present and non-empty
pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn rule_id(&self) -> &'static str {
        "required-field"
    }

    fn description(&self) -> &'static str {
        "Metadata must define id, name, description, category, tags, author, version and lastUpdated"
    }

    fn check(&self, metadata: &Map<String, Value>, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !is_present(metadata.get(*field)))
            .map(|field| {
                ValidationIssue::error(
                    self.rule_id(),
                    Some(field),
                    format!("Missing required field: {field}"),
                )
            })
            .collect()
    }
}

/// Rule: Declared id matches the template directory name
pub struct IdMatchesDirectoryRule;

impl ValidationRule for IdMatchesDirectoryRule {
    fn rule_id(&self) -> &'static str {
        "id-mismatch"
    }

    fn description(&self) -> &'static str {
        "metadata.id should equal the template directory name"
    }

    fn check(&self, metadata: &Map<String, Value>, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let (Some(dir_name), Some(id)) = (ctx.template_id, metadata.get("id")) else {
            return Vec::new();
        };
        if !is_present(Some(id)) || id.as_str() == Some(dir_name) {
            return Vec::new();
        }

        vec![ValidationIssue::warning(
            self.rule_id(),
            Some("id"),
            format!(
                "ID mismatch: metadata.id ({}) != directory name ({dir_name})",
                display(id)
            ),
        )]
    }
}

/// Rule: Declared category matches the enclosing category directory
pub struct CategoryMatchesDirectoryRule;

impl ValidationRule for CategoryMatchesDirectoryRule {
    fn rule_id(&self) -> &'static str {
        "category-mismatch"
    }

    fn description(&self) -> &'static str {
        "metadata.category should equal the parent directory name"
    }

    fn check(&self, metadata: &Map<String, Value>, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let (Some(dir_name), Some(category)) = (ctx.category_id, metadata.get("category")) else {
            return Vec::new();
        };
        if !is_present(Some(category)) || category.as_str() == Some(dir_name) {
            return Vec::new();
        }

        vec![ValidationIssue::warning(
            self.rule_id(),
            Some("category"),
            format!(
                "Category mismatch: metadata.category ({}) != parent directory ({dir_name})",
                display(category)
            ),
        )]
    }
}

/// Rule: Declared category exists in the registry
pub struct CategoryMembershipRule;

impl ValidationRule for CategoryMembershipRule {
    fn rule_id(&self) -> &'static str {
        "invalid-category"
    }

    fn description(&self) -> &'static str {
        "metadata.category must be defined in categories.yml"
    }

    fn check(&self, metadata: &Map<String, Value>, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let (Some(valid), Some(category)) = (ctx.valid_categories, metadata.get("category")) else {
            return Vec::new();
        };
        if !is_present(Some(category)) {
            return Vec::new();
        }

        let known = category
            .as_str()
            .is_some_and(|c| valid.iter().any(|v| v == c));
        if known {
            return Vec::new();
        }

        vec![ValidationIssue::error(
            self.rule_id(),
            Some("category"),
            format!("Invalid category: {}", display(category)),
        )]
    }
}

/// Rule: Tags are an array of strings, ideally non-empty
pub struct TagsRule;

impl ValidationRule for TagsRule {
    fn rule_id(&self) -> &'static str {
        "tags"
    }

    fn description(&self) -> &'static str {
        "tags must be an array of strings"
    }

    fn check(&self, metadata: &Map<String, Value>, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let Some(tags) = metadata.get("tags").filter(|v| is_present(Some(*v))) else {
            return Vec::new();
        };

        match tags.as_array() {
            None => vec![ValidationIssue::error(
                self.rule_id(),
                Some("tags"),
                "Tags must be an array",
            )],
            Some(items) if items.is_empty() => vec![ValidationIssue::warning(
                self.rule_id(),
                Some("tags"),
                "No tags specified",
            )],
            Some(items) if !items.iter().all(Value::is_string) => vec![ValidationIssue::error(
                self.rule_id(),
                Some("tags"),
                "Tags must be strings",
            )],
            Some(_) => Vec::new(),
        }
    }
}

/// Rule: lastUpdated parses as a date
pub struct LastUpdatedRule;

impl ValidationRule for LastUpdatedRule {
    fn rule_id(&self) -> &'static str {
        "last-updated"
    }

    fn description(&self) -> &'static str {
        "lastUpdated must be an ISO-8601 date"
    }

    fn check(&self, metadata: &Map<String, Value>, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let Some(value) = metadata.get("lastUpdated").filter(|v| is_present(Some(*v))) else {
            return Vec::new();
        };

        if value.as_str().is_some_and(is_valid_date) {
            return Vec::new();
        }

        vec![ValidationIssue::error(
            self.rule_id(),
            Some("lastUpdated"),
            "Invalid lastUpdated date format",
        )]
    }
}

/// Rule: version follows x.y.z
///
/// Only a warning when scanning a catalog; malformed in strict mode.
pub struct VersionFormatRule;

impl ValidationRule for VersionFormatRule {
    fn rule_id(&self) -> &'static str {
        "version-format"
    }

    fn description(&self) -> &'static str {
        "version should follow semantic versioning (x.y.z)"
    }

    fn check(&self, metadata: &Map<String, Value>, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let Some(version) = metadata.get("version").filter(|v| is_present(Some(*v))) else {
            return Vec::new();
        };

        if version.as_str().is_some_and(is_semver) {
            return Vec::new();
        }

        let issue = match ctx.mode {
            ValidationMode::Report => ValidationIssue {
                severity: Severity::Warning,
                rule_id: self.rule_id(),
                field: Some("version"),
                message: "Version should follow semantic versioning (x.y.z)".to_string(),
            },
            ValidationMode::Strict => ValidationIssue {
                severity: Severity::Error,
                rule_id: self.rule_id(),
                field: Some("version"),
                message: "Version must follow semantic versioning (x.y.z)".to_string(),
            },
        };
        vec![issue]
    }
}

/// Rule: description is long enough to be useful
pub struct DescriptionLengthRule;

impl ValidationRule for DescriptionLengthRule {
    fn rule_id(&self) -> &'static str {
        "short-description"
    }

    fn description(&self) -> &'static str {
        "description should be at least 20 characters"
    }

    fn check(&self, metadata: &Map<String, Value>, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let Some(description) = metadata.get("description").and_then(Value::as_str) else {
            return Vec::new();
        };
        if description.is_empty() || description.chars().count() >= MIN_DESCRIPTION_CHARS {
            return Vec::new();
        }

        vec![ValidationIssue::warning(
            self.rule_id(),
            Some("description"),
            "Description is quite short, consider adding more detail",
        )]
    }
}
