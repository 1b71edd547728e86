//! Validation of submitted values against field definitions.
//!
//! One pass over the definitions, at most one message per field. Within a
//! field the checks run in a fixed order (required, type, regex, min, max,
//! min length, max length) and a later failure overwrites an earlier one.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::types::{FieldDefinition, FieldType, ValidationRules};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-+()]+$").expect("valid phone pattern"));

/// Outcome of [`validate`]. `errors` is keyed by api name, in definition order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: IndexMap<String, String>,
}

impl ValidationResult {
    pub fn error_for(&self, api_name: &str) -> Option<&str> {
        self.errors.get(api_name).map(String::as_str)
    }
}

/// Validate `data` against `definitions`.
///
/// Keys in `data` without a definition are ignored.
pub fn validate(data: &Map<String, Value>, definitions: &[FieldDefinition]) -> ValidationResult {
    let mut errors = IndexMap::new();

    for def in definitions {
        if let Some(message) = check_field(def, data.get(&def.api_name)) {
            errors.insert(def.api_name.clone(), message);
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

/// Absent, `null` and `""` all count as "no value".
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn check_field(def: &FieldDefinition, value: Option<&Value>) -> Option<String> {
    let label = &def.label;

    let value = match value {
        v if is_empty_value(v) => {
            return def.is_required.then(|| format!("{label} is required"));
        }
        Some(v) => v,
        None => return None,
    };

    let mut message = check_type(&def.field_type, label, value);

    if let Some(rules) = &def.validation {
        for failure in check_rules(rules, label, value, &def.api_name) {
            message = Some(failure);
        }
    }

    message
}

fn check_type(field_type: &FieldType, label: &str, value: &Value) -> Option<String> {
    match field_type {
        FieldType::Email => {
            (!EMAIL.is_match(&as_text(value))).then(|| format!("{label} must be a valid email address"))
        }
        FieldType::Url => {
            url::Url::parse(&as_text(value))
                .is_err()
                .then(|| format!("{label} must be a valid URL"))
        }
        FieldType::Number => as_number(value)
            .is_none()
            .then(|| format!("{label} must be a number")),
        FieldType::Phone => {
            (!PHONE.is_match(&as_text(value))).then(|| format!("{label} must be a valid phone number"))
        }
        FieldType::Select { options } => {
            let member = value
                .as_str()
                .is_some_and(|s| options.iter().any(|o| o == s));
            (!member).then(|| format!("{label} must be one of: {}", options.join(", ")))
        }
        FieldType::MultiSelect { options } => match value.as_array() {
            None => Some(format!("{label} must be a list of options")),
            Some(items) => {
                let invalid: Vec<String> = items
                    .iter()
                    .filter(|item| {
                        !item
                            .as_str()
                            .is_some_and(|s| options.iter().any(|o| o == s))
                    })
                    .map(as_text)
                    .collect();
                (!invalid.is_empty())
                    .then(|| format!("{label} contains invalid options: {}", invalid.join(", ")))
            }
        },
        FieldType::Text | FieldType::Textarea | FieldType::Boolean | FieldType::Date => None,
    }
}

/// Every failing rule, in evaluation order. The caller keeps the last one.
fn check_rules(rules: &ValidationRules, label: &str, value: &Value, api_name: &str) -> Vec<String> {
    let mut failures = Vec::new();
    let text = as_text(value);

    if let Some(rule) = &rules.regex {
        match Regex::new(&rule.pattern) {
            Ok(re) if !re.is_match(&text) => failures.push(
                rule.message
                    .clone()
                    .unwrap_or_else(|| format!("{label} format is invalid")),
            ),
            Ok(_) => {}
            Err(e) => warn!(api_name, %e, "ignoring unusable regex rule"),
        }
    }

    if let Some(n) = as_number(value) {
        if let Some(min) = rules.min {
            if n < min {
                failures.push(format!("{label} must be at least {min}"));
            }
        }
        if let Some(max) = rules.max {
            if n > max {
                failures.push(format!("{label} must be at most {max}"));
            }
        }
    }

    let length = text.chars().count();
    if let Some(min_length) = rules.min_length {
        if length < min_length {
            failures.push(format!("{label} must be at least {min_length} characters"));
        }
    }
    if let Some(max_length) = rules.max_length {
        if length > max_length {
            failures.push(format!("{label} must be at most {max_length} characters"));
        }
    }

    failures
}

/// Textual form of a submitted value, as a form would have sent it.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(as_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Numeric coercion: numbers, numeric strings and booleans; finite only.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}
