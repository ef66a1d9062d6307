//! Tests for the metadata validator

use super::rules::*;
use super::*;
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_metadata() -> Value {
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

    fn registry_ids() -> Vec<String> {
        vec!["academic".to_string(), "presentations".to_string()]
    }

    fn validate(metadata: &Value) -> TemplateValidation {
        MetadataValidator::new().validate(metadata, "my-paper", "academic", &registry_ids())
    }

    fn rule_ids(result: &TemplateValidation) -> Vec<&'static str> {
        result.issues.iter().map(|i| i.rule_id).collect()
    }

    #[test]
    fn test_valid_metadata_has_no_issues() {
        let result = validate(&valid_metadata());
        assert!(result.issues.is_empty(), "unexpected issues: {:?}", result.issues);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 0);
    }

    #[test]
    fn test_each_missing_field_is_an_error_in_both_modes() {
        for field in REQUIRED_FIELDS {
            let mut metadata = valid_metadata();
            metadata.as_object_mut().unwrap().remove(field);

            let result = validate(&metadata);
            assert!(
                result
                    .issues
                    .iter()
                    .any(|i| i.is_error() && i.field == Some(field) && i.message.contains(field)),
                "bulk mode did not flag missing {field}: {:?}",
                result.issues
            );

            let err = MetadataValidator::new().validate_strict(&metadata).unwrap_err();
            assert_eq!(err.field, Some(field), "strict mode flagged the wrong field");
            assert_eq!(err.message, format!("Missing required field: {field}"));
        }
    }

    #[test]
    fn test_falsy_values_count_as_missing() {
        for falsy in [json!(""), json!(null), json!(false), json!(0)] {
            let mut metadata = valid_metadata();
            metadata["author"] = falsy;

            let result = validate(&metadata);
            assert_eq!(result.error_count, 1);
            assert_eq!(result.issues[0].field, Some("author"));
        }
    }

    #[test]
    fn test_bulk_mode_accumulates_everything() {
        let metadata = json!({
            "id": "other-id",
            "category": "nonexistent",
            "tags": "thesis",
            "version": "v1",
            "lastUpdated": "not a date",
            "description": "Too short"
        });

        let result = validate(&metadata);
        let ids = rule_ids(&result);

        // name and author missing
        assert_eq!(ids.iter().filter(|id| **id == "required-field").count(), 2);
        assert!(ids.contains(&"id-mismatch"));
        assert!(ids.contains(&"category-mismatch"));
        assert!(ids.contains(&"invalid-category"));
        assert!(ids.contains(&"tags"));
        assert!(ids.contains(&"last-updated"));
        assert!(ids.contains(&"version-format"));
        assert!(ids.contains(&"short-description"));

        // missing x2, invalid category, tags type, date
        assert_eq!(result.error_count, 5);
        // id mismatch, category mismatch, version, description
        assert_eq!(result.warning_count, 4);
    }

    #[test]
    fn test_directory_mismatches_are_warnings() {
        let mut metadata = valid_metadata();
        metadata["id"] = json!("renamed-paper");
        metadata["category"] = json!("presentations");

        let result = validate(&metadata);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 2);
        assert_eq!(rule_ids(&result), vec!["id-mismatch", "category-mismatch"]);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let mut metadata = valid_metadata();
        metadata["category"] = json!("posters");

        let result = validate(&metadata);
        let issue = result
            .issues
            .iter()
            .find(|i| i.rule_id == "invalid-category")
            .expect("invalid category should be reported");
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.message, "Invalid category: posters");
    }

    #[test]
    fn test_empty_tags_is_a_warning() {
        let mut metadata = valid_metadata();
        metadata["tags"] = json!([]);

        let result = validate(&metadata);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.issues[0].message, "No tags specified");
    }

    #[test]
    fn test_non_string_tags_are_rejected() {
        let mut metadata = valid_metadata();
        metadata["tags"] = json!(["ok", 3]);

        let result = validate(&metadata);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.issues[0].message, "Tags must be strings");
    }

    #[test]
    fn test_version_format_is_a_warning_when_scanning() {
        let mut metadata = valid_metadata();
        metadata["version"] = json!("1.2");

        let result = validate(&metadata);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.issues[0].rule_id, "version-format");
    }

    #[test]
    fn test_version_format_fails_strict_mode() {
        let mut metadata = valid_metadata();
        metadata["version"] = json!("1.2.0-beta");

        let err = validate_template_metadata(&metadata).unwrap_err();
        assert_eq!(err.rule_id, "version-format");
        assert!(err.message.contains("semantic versioning"));
    }

    #[test]
    fn test_accepted_date_formats() {
        for date in [
            "2025-01-15",
            "2025-01-15T10:30:00Z",
            "2025-01-15T10:30:00.123+02:00",
            "2025-01-15T10:30:00",
            "Wed, 15 Jan 2025 10:30:00 +0000",
        ] {
            assert!(is_valid_date(date), "{date} should parse");
        }

        for date in ["yesterday", "2025-13-40", "15/01/2025"] {
            assert!(!is_valid_date(date), "{date} should not parse");
        }
    }

    #[test]
    fn test_non_string_date_is_invalid() {
        let mut metadata = valid_metadata();
        metadata["lastUpdated"] = json!(20250115);

        let result = validate(&metadata);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.issues[0].rule_id, "last-updated");
    }

    #[test]
    fn test_short_description_only_warns_in_strict_mode() {
        let mut metadata = valid_metadata();
        metadata["description"] = json!("Short one");

        let parsed = validate_template_metadata(&metadata).unwrap();
        assert_eq!(parsed.description, "Short one");

        let result = validate(&metadata);
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.issues[0].rule_id, "short-description");
    }

    #[test]
    fn test_strict_mode_stops_at_first_error() {
        let metadata = json!({
            "id": "my-paper",
            "description": "A journal article template with bibliography support",
            "category": "academic",
            "tags": "not-an-array",
            "author": "A. Author",
            "version": "bad",
            "lastUpdated": "2025-01-15"
        });

        let err = validate_template_metadata(&metadata).unwrap_err();
        assert_eq!(err.rule_id, "required-field");
        assert_eq!(err.field, Some("name"));
    }

    #[test]
    fn test_strict_mode_skips_directory_rules() {
        let mut metadata = valid_metadata();
        metadata["category"] = json!("anything-goes");

        let parsed = validate_template_metadata(&metadata).unwrap();
        assert_eq!(parsed.category, "anything-goes");
    }

    #[test]
    fn test_non_object_metadata() {
        let result = validate(&json!(["not", "an", "object"]));
        assert_eq!(result.error_count, 1);
        assert_eq!(result.issues[0].rule_id, "metadata-shape");

        let err = validate_template_metadata(&json!("string")).unwrap_err();
        assert_eq!(err.rule_id, "metadata-shape");
    }

    #[test]
    fn test_strict_mode_rejects_wrong_types() {
        let mut metadata = valid_metadata();
        metadata["author"] = json!({"name": "A. Author"});

        let err = validate_template_metadata(&metadata).unwrap_err();
        assert_eq!(err.rule_id, "schema");
    }

    #[test]
    fn test_validate_category() {
        let category = validate_category(&json!({
            "id": "lab-reports",
            "name": "Lab Reports",
            "description": "Experiment write-ups"
        }))
        .unwrap();
        assert_eq!(category.id, "lab-reports");

        let err = validate_category(&json!({"id": "x", "name": "X"})).unwrap_err();
        assert_eq!(err.field, Some("description"));

        let err = validate_category(&json!({
            "id": "Lab Reports",
            "name": "Lab Reports",
            "description": "Experiment write-ups"
        }))
        .unwrap_err();
        assert_eq!(err.rule_id, "category-id-format");
        assert!(err.message.contains("lowercase"));
    }

    #[test]
    fn test_report_totals() {
        let mut report = ValidationReport::new();
        report.add_template(validate(&valid_metadata()));

        let mut broken = valid_metadata();
        broken.as_object_mut().unwrap().remove("author");
        report.add_template(validate(&broken));

        report.add_registry_issue(ValidationIssue::warning("registry", None, "Unused category"));

        assert_eq!(report.total_errors, 1);
        assert_eq!(report.total_warnings, 1);
        assert_eq!(report.valid_template_count(), 1);
        assert!(!report.passed());
    }

    #[test]
    fn test_rules_are_documented() {
        let validator = MetadataValidator::new();
        for rule in &validator.rules {
            assert!(!rule.rule_id().is_empty());
            assert!(!rule.description().is_empty());
        }
    }
}
