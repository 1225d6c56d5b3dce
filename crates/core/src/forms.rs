//! Form template field schemas and submission validation.
//!
//! A template stores its fields as a JSON array. Submissions are checked
//! against it field by field and every problem is reported at once.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Upper bound on the number of fields in one template.
pub const MAX_FIELDS: usize = 100;

static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

static TEMPLATE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{1,15}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Date,
    Select,
    Boolean,
}

impl FieldKind {
    fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Textarea)
    }
}

/// One field of a form template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Template codes prefix reference numbers: 2 to 16 alphanumerics.
pub fn validate_template_code(code: &str) -> Result<(), CoreError> {
    if TEMPLATE_CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Template code '{code}' must be 2-16 letters or digits, starting with a letter"
        )))
    }
}

/// Deserialize a stored schema and check it.
pub fn parse_schema(value: &serde_json::Value) -> Result<Vec<FormField>, CoreError> {
    let fields: Vec<FormField> = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid field schema: {e}")))?;
    validate_schema(&fields)?;
    Ok(fields)
}

/// Check a template's field list.
pub fn validate_schema(fields: &[FormField]) -> Result<(), CoreError> {
    if fields.is_empty() {
        return Err(CoreError::Validation(
            "A form template needs at least one field".to_string(),
        ));
    }
    if fields.len() > MAX_FIELDS {
        return Err(CoreError::Validation(format!(
            "A form template may have at most {MAX_FIELDS} fields"
        )));
    }

    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for field in fields {
        if !FIELD_NAME_RE.is_match(&field.name) {
            problems.push(format!("'{}': invalid field name", field.name));
        }
        if !seen.insert(field.name.as_str()) {
            problems.push(format!("'{}': duplicate field name", field.name));
        }
        if field.label.trim().is_empty() {
            problems.push(format!("'{}': label is required", field.name));
        }
        match field.kind {
            FieldKind::Select => {
                if field.options.is_empty() || field.options.iter().any(|o| o.trim().is_empty()) {
                    problems.push(format!("'{}': select fields need non-empty options", field.name));
                }
            }
            _ if !field.options.is_empty() => {
                problems.push(format!("'{}': only select fields take options", field.name));
            }
            _ => {}
        }
        if field.max_length.is_some() && !field.kind.is_textual() {
            problems.push(format!("'{}': max_length applies to text fields only", field.name));
        }
        if field.max_length == Some(0) {
            problems.push(format!("'{}': max_length must be positive", field.name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

/// Check submitted form data against the template fields.
pub fn validate_submission(fields: &[FormField], data: &serde_json::Value) -> Result<(), CoreError> {
    let serde_json::Value::Object(map) = data else {
        return Err(CoreError::Validation(
            "Form data must be a JSON object".to_string(),
        ));
    };

    let mut problems = Vec::new();

    for key in map.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            problems.push(format!("'{key}': unknown field"));
        }
    }

    for field in fields {
        match map.get(&field.name) {
            None | Some(serde_json::Value::Null) => {
                if field.required {
                    problems.push(format!("'{}': is required", field.name));
                }
            }
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                if field.required {
                    problems.push(format!("'{}': is required", field.name));
                }
            }
            Some(value) => {
                if let Err(problem) = check_value(field, value) {
                    problems.push(format!("'{}': {problem}", field.name));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

fn check_value(field: &FormField, value: &serde_json::Value) -> Result<(), String> {
    use serde_json::Value;

    match (field.kind, value) {
        (FieldKind::Text | FieldKind::Textarea, Value::String(s)) => match field.max_length {
            Some(max) if s.chars().count() > max => {
                Err(format!("must be at most {max} characters"))
            }
            _ => Ok(()),
        },
        (FieldKind::Number, Value::Number(_)) => Ok(()),
        (FieldKind::Number, Value::String(s)) if is_numeric_text(s) => Ok(()),
        (FieldKind::Date, Value::String(s))
            if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() =>
        {
            Ok(())
        }
        (FieldKind::Date, _) => Err("must be a date (YYYY-MM-DD)".to_string()),
        (FieldKind::Select, Value::String(s)) if field.options.iter().any(|o| o == s) => Ok(()),
        (FieldKind::Select, _) => Err(format!("must be one of: {}", field.options.join(", "))),
        (FieldKind::Boolean, Value::Bool(_)) => Ok(()),
        (FieldKind::Number, _) => Err("must be a number".to_string()),
        (FieldKind::Boolean, _) => Err("must be true or false".to_string()),
        (FieldKind::Text | FieldKind::Textarea, _) => Err("must be text".to_string()),
    }
}

/// Finite decimal text. `f64` parsing alone would also take `NaN` and `inf`.
fn is_numeric_text(s: &str) -> bool {
    s.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Empty `allowed_roles` means every role may submit.
pub fn role_may_submit(allowed_roles: &[String], role: &str) -> bool {
    allowed_roles.is_empty() || allowed_roles.iter().any(|r| r == role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn leave_form() -> Vec<FormField> {
        parse_schema(&json!([
            {"name": "reason", "label": "Reason", "kind": "textarea", "required": true, "max_length": 20},
            {"name": "from_date", "label": "From", "kind": "date", "required": true},
            {"name": "days", "label": "Days", "kind": "number", "required": true},
            {"name": "leave_type", "label": "Type", "kind": "select", "required": true,
             "options": ["annual", "sick"]},
            {"name": "paid", "label": "Paid", "kind": "boolean"},
            {"name": "notes", "label": "Notes", "kind": "text"}
        ]))
        .unwrap()
    }

    fn message(err: CoreError) -> String {
        match err {
            CoreError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_submission_passes() {
        let data = json!({
            "reason": "Family visit",
            "from_date": "2026-04-01",
            "days": 3,
            "leave_type": "annual",
            "paid": true
        });
        assert!(validate_submission(&leave_form(), &data).is_ok());
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let data = json!({
            "reason": "x", "from_date": "2026-04-01", "days": "2.5", "leave_type": "sick"
        });
        assert!(validate_submission(&leave_form(), &data).is_ok());

        for days in ["NaN", "inf", "-infinity"] {
            let data = json!({
                "reason": "x", "from_date": "2026-04-01", "days": days, "leave_type": "sick"
            });
            let msg = message(validate_submission(&leave_form(), &data).unwrap_err());
            assert!(msg.contains("'days': must be a number"), "{days}: {msg}");
        }
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let msg = message(validate_submission(&leave_form(), &json!({"reason": "  "})).unwrap_err());
        assert!(msg.contains("'reason': is required"));
        assert!(msg.contains("'from_date': is required"));
        assert!(msg.contains("'days': is required"));
        assert!(msg.contains("'leave_type': is required"));
        assert!(!msg.contains("paid"));
    }

    #[test]
    fn wrong_types_and_unknown_fields_are_reported() {
        let data = json!({
            "reason": "this reason is far too long for the field",
            "from_date": "01/04/2026",
            "days": "three",
            "leave_type": "unpaid",
            "paid": "yes",
            "extra": 1
        });
        let msg = message(validate_submission(&leave_form(), &data).unwrap_err());
        for needle in [
            "'extra': unknown field",
            "'reason': must be at most 20 characters",
            "'from_date': must be a date",
            "'days': must be a number",
            "'leave_type': must be one of: annual, sick",
            "'paid': must be true or false",
        ] {
            assert!(msg.contains(needle), "missing {needle} in {msg}");
        }
    }

    #[test]
    fn non_object_data_is_rejected() {
        assert_matches!(
            validate_submission(&leave_form(), &json!(["a"])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn schema_problems_are_reported() {
        let msg = message(
            parse_schema(&json!([
                {"name": "Bad Name", "label": "x", "kind": "text"},
                {"name": "dup", "label": "x", "kind": "text"},
                {"name": "dup", "label": "x", "kind": "text"},
                {"name": "choice", "label": "x", "kind": "select"},
                {"name": "count", "label": "x", "kind": "number", "max_length": 3}
            ]))
            .unwrap_err(),
        );
        assert!(msg.contains("'Bad Name': invalid field name"));
        assert!(msg.contains("'dup': duplicate field name"));
        assert!(msg.contains("'choice': select fields need non-empty options"));
        assert!(msg.contains("'count': max_length applies to text fields only"));
    }

    #[test]
    fn empty_and_malformed_schemas_are_rejected() {
        assert_matches!(parse_schema(&json!([])), Err(CoreError::Validation(_)));
        assert_matches!(
            parse_schema(&json!([{"name": "a", "label": "A", "kind": "file"}])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn template_codes() {
        assert!(validate_template_code("LEAVE").is_ok());
        assert!(validate_template_code("Cert2").is_ok());
        assert!(validate_template_code("L").is_err());
        assert!(validate_template_code("2LEAVE").is_err());
        assert!(validate_template_code("LE-AVE").is_err());
    }

    #[test]
    fn allowed_roles() {
        assert!(role_may_submit(&[], "student"));
        let roles = vec!["employee".to_string()];
        assert!(role_may_submit(&roles, "employee"));
        assert!(!role_may_submit(&roles, "student"));
    }
}
