//! Template metadata validator
//!
//! Checks a template's `metadata.json` against the catalog's structural and
//! semantic rules. The rule set is shared by two entry points:
//!
//! - [`MetadataValidator::validate`] runs every rule and collects the issues
//!   (used by the index builder and `templar validate`).
//! - [`MetadataValidator::validate_strict`] stops at the first error and
//!   returns it (used when metadata is built programmatically).

use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

pub mod rules;

#[cfg(test)]
mod tests;

use crate::error::ValidationError;
use crate::model::{Category, TemplateMetadata};
use rules::*;

/// Severity levels for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,   // Template is excluded from the catalog
    Warning, // Template is published, but should be fixed
}

/// How strictly a rule should treat soft problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Bulk scan: accumulate everything, only hard problems are errors
    Report,
    /// Library use: malformed fields are errors
    Strict,
}

/// A validation issue found in a template or in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Severity of the issue
    pub severity: Severity,
    /// Unique identifier for the rule that raised it
    pub rule_id: &'static str,
    /// Metadata field the issue is about, if any
    pub field: Option<&'static str>,
    /// Human-readable description
    pub message: String,
}

/// Inputs a rule may consult besides the metadata itself
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Directory name the template was found in
    pub template_id: Option<&'a str>,
    /// Directory name of the enclosing category
    pub category_id: Option<&'a str>,
    /// Category ids accepted by the registry
    pub valid_categories: Option<&'a [String]>,
    pub mode: ValidationMode,
}

/// Trait for metadata validation rules
pub trait ValidationRule: Send + Sync {
    /// Check metadata for issues
    fn check(&self, metadata: &Map<String, Value>, ctx: &ValidationContext) -> Vec<ValidationIssue>;

    /// Rule identifier
    fn rule_id(&self) -> &'static str;

    /// Rule description
    fn description(&self) -> &'static str;
}

/// Main metadata validator
pub struct MetadataValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

/// Validation results for a single template
#[derive(Debug, Clone, Default)]
pub struct TemplateValidation {
    pub template_id: String,
    pub category_id: String,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Validation results for a whole catalog
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Issues about the registry itself
    pub registry_issues: Vec<ValidationIssue>,
    pub templates: Vec<TemplateValidation>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl ValidationIssue {
    pub fn error(rule_id: &'static str, field: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule_id,
            field,
            message: message.into(),
        }
    }

    pub fn warning(rule_id: &'static str, field: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule_id,
            field,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationIssue> for ValidationError {
    fn from(issue: ValidationIssue) -> Self {
        ValidationError {
            rule_id: issue.rule_id,
            field: issue.field,
            message: issue.message,
        }
    }
}

impl<'a> ValidationContext<'a> {
    /// Context for a template found at `<category_id>/<template_id>`
    pub fn for_directory(
        template_id: &'a str,
        category_id: &'a str,
        valid_categories: &'a [String],
    ) -> Self {
        Self {
            template_id: Some(template_id),
            category_id: Some(category_id),
            valid_categories: Some(valid_categories),
            mode: ValidationMode::Report,
        }
    }

    /// Context for metadata with no on-disk location
    pub fn strict() -> Self {
        Self {
            template_id: None,
            category_id: None,
            valid_categories: None,
            mode: ValidationMode::Strict,
        }
    }
}

impl TemplateValidation {
    pub fn new(template_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            category_id: category_id.into(),
            ..Default::default()
        }
    }

    /// Record an issue, keeping the counters in step
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_registry_issue(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.total_errors += 1,
            Severity::Warning => self.total_warnings += 1,
        }
        self.registry_issues.push(issue);
    }

    pub fn add_template(&mut self, result: TemplateValidation) {
        self.total_errors += result.error_count;
        self.total_warnings += result.warning_count;
        self.templates.push(result);
    }

    /// Number of templates that produced no errors
    pub fn valid_template_count(&self) -> usize {
        self.templates.iter().filter(|t| !t.has_errors()).count()
    }

    /// True when no error-level issue was recorded anywhere
    pub fn passed(&self) -> bool {
        self.total_errors == 0
    }
}

impl MetadataValidator {
    /// Create validator with the default catalog rules
    pub fn new() -> Self {
        let rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(RequiredFieldsRule),
            Box::new(IdMatchesDirectoryRule),
            Box::new(CategoryMatchesDirectoryRule),
            Box::new(CategoryMembershipRule),
            Box::new(TagsRule),
            Box::new(LastUpdatedRule),
            Box::new(VersionFormatRule),
            Box::new(DescriptionLengthRule),
        ];

        Self { rules }
    }

    /// Evaluate the rules lazily, in order
    fn evaluate<'s>(
        &'s self,
        metadata: &'s Value,
        ctx: &'s ValidationContext<'s>,
    ) -> Box<dyn Iterator<Item = ValidationIssue> + 's> {
        match metadata.as_object() {
            Some(object) => Box::new(self.rules.iter().flat_map(move |rule| rule.check(object, ctx))),
            None => Box::new(std::iter::once(ValidationIssue::error(
                "metadata-shape",
                None,
                "Metadata must be a JSON object",
            ))),
        }
    }

    /// Validate a template's metadata, collecting every issue
    pub fn validate(
        &self,
        metadata: &Value,
        template_id: &str,
        category_id: &str,
        valid_categories: &[String],
    ) -> TemplateValidation {
        debug!("Validating metadata for {}/{}", category_id, template_id);

        let ctx = ValidationContext::for_directory(template_id, category_id, valid_categories);
        let mut result = TemplateValidation::new(template_id, category_id);
        result.extend(self.evaluate(metadata, &ctx));
        result
    }

    /// Validate metadata, failing on the first error
    ///
    /// Warnings are logged and do not fail validation. On success the
    /// metadata is returned in its typed form.
    pub fn validate_strict(&self, metadata: &Value) -> Result<TemplateMetadata, ValidationError> {
        let ctx = ValidationContext::strict();

        for issue in self.evaluate(metadata, &ctx) {
            match issue.severity {
                Severity::Error => return Err(issue.into()),
                Severity::Warning => warn!("{}", issue.message),
            }
        }

        serde_json::from_value(metadata.clone()).map_err(|e| ValidationError {
            rule_id: "schema",
            field: None,
            message: format!("Invalid metadata: {e}"),
        })
    }
}

impl Default for MetadataValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate template metadata with the default rules, failing fast
pub fn validate_template_metadata(metadata: &Value) -> Result<TemplateMetadata, ValidationError> {
    MetadataValidator::new().validate_strict(metadata)
}

/// Validate a single registry category, failing fast
pub fn validate_category(category: &Value) -> Result<Category, ValidationError> {
    for field in CATEGORY_FIELDS {
        let present = category
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !present {
            return Err(ValidationError {
                rule_id: "category-fields",
                field: Some(field),
                message: format!("Missing required category field: {field}"),
            });
        }
    }

    let id = category.get("id").and_then(Value::as_str).unwrap_or_default();
    if !is_valid_category_id(id) {
        return Err(ValidationError {
            rule_id: "category-id-format",
            field: Some("id"),
            message: format!(
                "Category ID '{id}' must contain only lowercase letters, numbers, and hyphens"
            ),
        });
    }

    serde_json::from_value(category.clone()).map_err(|e| ValidationError {
        rule_id: "schema",
        field: None,
        message: format!("Invalid category: {e}"),
    })
}
