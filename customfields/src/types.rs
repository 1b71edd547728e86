//! Field definition types.
//!
//! A [`FieldDefinition`] is the schema record for one admin-defined field on a
//! module (entity type). All types round-trip through serde so they can live
//! in YAML on disk and travel as JSON through the CLI.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

use crate::error::{FieldsError, Result};

static API_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid api name pattern"));

/// The type of a field. Options exist only on the variants that use them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Select { options: Vec<String> },
    MultiSelect { options: Vec<String> },
    Boolean,
    Textarea,
    Url,
}

impl FieldType {
    /// Wire name of the type (`"multiselect"`, `"email"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select { .. } => "select",
            FieldType::MultiSelect { .. } => "multiselect",
            FieldType::Boolean => "boolean",
            FieldType::Textarea => "textarea",
            FieldType::Url => "url",
        }
    }

    /// Allowed values for select/multiselect; empty for every other type.
    pub fn options(&self) -> &[String] {
        match self {
            FieldType::Select { options } | FieldType::MultiSelect { options } => options,
            _ => &[],
        }
    }

    fn options_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            FieldType::Select { options } | FieldType::MultiSelect { options } => Some(options),
            _ => None,
        }
    }
}

/// Pattern rule with an optional custom failure message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegexRule {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Optional per-field rules evaluated after the type check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn default_true() -> bool {
    true
}

/// The complete schema record for one dynamic field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub id: Ulid,
    pub module: String,
    pub api_name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_indexed: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldDefinition {
    /// Check the structural rules every stored definition must satisfy.
    pub fn check(&self) -> Result<()> {
        let invalid = |message: &str| Err(FieldsError::invalid_definition(&self.api_name, message));

        if self.module.trim().is_empty() {
            return invalid("module cannot be empty");
        }
        if !API_NAME.is_match(&self.api_name) {
            return invalid("api name must start with a letter or underscore and contain only letters, digits and underscores");
        }
        if self.label.trim().is_empty() {
            return invalid("label cannot be empty");
        }

        if let FieldType::Select { options } | FieldType::MultiSelect { options } = &self.field_type
        {
            if options.is_empty() {
                return invalid("select fields need at least one option");
            }
            for (i, option) in options.iter().enumerate() {
                if options[..i].contains(option) {
                    return Err(FieldsError::invalid_definition(
                        &self.api_name,
                        format!("duplicate option '{option}'"),
                    ));
                }
            }
        }

        if let Some(rules) = &self.validation {
            if let Some(rule) = &rules.regex {
                if let Err(e) = Regex::new(&rule.pattern) {
                    return Err(FieldsError::invalid_definition(
                        &self.api_name,
                        format!("invalid regex: {e}"),
                    ));
                }
            }
            if let (Some(min), Some(max)) = (rules.min, rules.max) {
                if min > max {
                    return invalid("min exceeds max");
                }
            }
            if let (Some(min), Some(max)) = (rules.min_length, rules.max_length) {
                if min > max {
                    return invalid("min_length exceeds max_length");
                }
            }
        }

        Ok(())
    }

    /// True if this definition is keyed by `(module, api_name)`.
    pub fn same_key(&self, module: &str, api_name: &str) -> bool {
        self.module == module && self.api_name == api_name
    }
}

/// Input for creating a definition. Unset flags fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFieldDefinition {
    pub module: String,
    pub api_name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_indexed: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

impl NewFieldDefinition {
    pub fn new(
        module: impl Into<String>,
        api_name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            module: module.into(),
            api_name: api_name.into(),
            label: label.into(),
            field_type,
            is_required: None,
            is_indexed: None,
            is_active: None,
            placeholder: None,
            help_text: None,
            validation: None,
            display_order: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.is_required = Some(required);
        self
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.is_indexed = Some(indexed);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn with_validation(mut self, validation: ValidationRules) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = Some(order);
        self
    }

    /// Materialize a stored definition with a fresh id.
    pub fn into_definition(self, now: DateTime<Utc>) -> FieldDefinition {
        FieldDefinition {
            id: Ulid::new(),
            module: self.module,
            api_name: self.api_name,
            label: self.label,
            field_type: self.field_type,
            is_required: self.is_required.unwrap_or(false),
            is_indexed: self.is_indexed.unwrap_or(false),
            is_active: self.is_active.unwrap_or(true),
            placeholder: self.placeholder,
            help_text: self.help_text,
            validation: self.validation.filter(|rules| !rules.is_empty()),
            display_order: self.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Absent means "leave alone", `null` means "clear".
fn nullable<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Partial update. `id`, `module` and `api_name` are not part of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinitionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,
    /// Replaces the options of a select/multiselect definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_indexed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub placeholder: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub help_text: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub validation: Option<Option<ValidationRules>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl FieldDefinitionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.is_required = Some(required);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn with_placeholder(mut self, placeholder: Option<String>) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn with_validation(mut self, validation: Option<ValidationRules>) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = Some(order);
        self
    }

    /// Apply onto `def` and re-check it. `def` is untouched on error.
    pub fn apply(&self, def: &FieldDefinition, now: DateTime<Utc>) -> Result<FieldDefinition> {
        let mut next = def.clone();

        if let Some(label) = &self.label {
            next.label = label.clone();
        }
        if let Some(field_type) = &self.field_type {
            next.field_type = field_type.clone();
        }
        if let Some(options) = &self.options {
            let api_name = next.api_name.clone();
            let type_name = next.field_type.name();
            match next.field_type.options_mut() {
                Some(current) => *current = options.clone(),
                None => {
                    return Err(FieldsError::invalid_definition(
                        api_name,
                        format!("{type_name} fields do not take options"),
                    ))
                }
            }
        }
        if let Some(required) = self.is_required {
            next.is_required = required;
        }
        if let Some(indexed) = self.is_indexed {
            next.is_indexed = indexed;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        if let Some(placeholder) = &self.placeholder {
            next.placeholder = placeholder.clone();
        }
        if let Some(help_text) = &self.help_text {
            next.help_text = help_text.clone();
        }
        if let Some(validation) = &self.validation {
            next.validation = validation.clone().filter(|rules| !rules.is_empty());
        }
        if let Some(order) = self.display_order {
            next.display_order = order;
        }

        next.check()?;
        next.updated_at = now;
        Ok(next)
    }
}
