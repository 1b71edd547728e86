//! Form binding contract.
//!
//! A UI renders dynamic fields from `(definitions, current values, errors)`
//! and reports edits back as [`FormChange`]s. This module owns the parts of
//! that contract that are not presentation: which editor each field type
//! gets, the per-field render model, and how edits land in the value map.
//!
//! - Select and multiselect editors list exactly the definition's options,
//!   in order, with no implicit "none" entry.
//! - Multiselect values are edited one option at a time ([`MultiSelectState`]).
//! - Date values are edited as [`NaiveDate`]s through a picker and stored as
//!   `YYYY-MM-DD` strings; there is no free-text date entry.

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldsError, Result};
use crate::types::{FieldDefinition, FieldType};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a field value is edited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Editor {
    TextInput,
    EmailInput,
    PhoneInput,
    NumberInput,
    DatePicker,
    Select,
    CheckboxGroup,
    Toggle,
    TextArea,
    UrlInput,
}

impl FieldDefinition {
    /// The editor a renderer must present for this field.
    pub fn editor(&self) -> Editor {
        match &self.field_type {
            FieldType::Text => Editor::TextInput,
            FieldType::Email => Editor::EmailInput,
            FieldType::Phone => Editor::PhoneInput,
            FieldType::Number => Editor::NumberInput,
            FieldType::Date => Editor::DatePicker,
            FieldType::Select { .. } => Editor::Select,
            FieldType::MultiSelect { .. } => Editor::CheckboxGroup,
            FieldType::Boolean => Editor::Toggle,
            FieldType::Textarea => Editor::TextArea,
            FieldType::Url => Editor::UrlInput,
        }
    }
}

/// One entry of a select or checkbox group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub selected: bool,
}

/// Everything a renderer needs for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView<'a> {
    pub definition: &'a FieldDefinition,
    pub editor: Editor,
    pub value: Option<&'a Value>,
    /// Options in definition order; empty for non-choice editors.
    pub choices: Vec<Choice>,
    /// Parsed current value for the date picker.
    pub date: Option<NaiveDate>,
    pub error: Option<&'a str>,
}

impl FieldView<'_> {
    pub fn api_name(&self) -> &str {
        &self.definition.api_name
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }

    pub fn is_required(&self) -> bool {
        self.definition.is_required
    }
}

/// Build render models for the active definitions, in display order.
pub fn field_views<'a>(
    definitions: &'a [FieldDefinition],
    values: &'a Map<String, Value>,
    errors: &'a IndexMap<String, String>,
) -> Vec<FieldView<'a>> {
    let mut active: Vec<&FieldDefinition> = definitions.iter().filter(|d| d.is_active).collect();
    active.sort_by_key(|d| d.display_order);

    active
        .into_iter()
        .map(|def| {
            let value = values.get(&def.api_name);
            let choices = match &def.field_type {
                FieldType::Select { options } => options
                    .iter()
                    .map(|o| Choice {
                        value: o.clone(),
                        selected: value.and_then(Value::as_str) == Some(o.as_str()),
                    })
                    .collect(),
                FieldType::MultiSelect { options } => {
                    let state = MultiSelectState::new(options, value);
                    options
                        .iter()
                        .map(|o| Choice {
                            value: o.clone(),
                            selected: state.is_selected(o),
                        })
                        .collect()
                }
                _ => Vec::new(),
            };
            let date = match def.field_type {
                FieldType::Date => value.and_then(parse_date),
                _ => None,
            };
            FieldView {
                definition: def,
                editor: def.editor(),
                value,
                choices,
                date,
                error: errors.get(&def.api_name).map(String::as_str),
            }
        })
        .collect()
}

/// Parse a stored date value (`YYYY-MM-DD`, or an RFC 3339 timestamp).
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Set-valued model of a multiselect field.
///
/// Values outside `options` that are already stored are kept, so toggling
/// one option never drops data the renderer cannot show.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSelectState<'a> {
    options: &'a [String],
    selected: Vec<String>,
}

impl<'a> MultiSelectState<'a> {
    pub fn new(options: &'a [String], current: Option<&Value>) -> Self {
        let mut selected: Vec<String> = Vec::new();
        if let Some(items) = current.and_then(Value::as_array) {
            for s in items.iter().filter_map(Value::as_str) {
                if !selected.iter().any(|x| x == s) {
                    selected.push(s.to_string());
                }
            }
        }
        Self { options, selected }
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.selected.iter().any(|s| s == option)
    }

    pub fn add(&mut self, option: &str) {
        if !self.is_selected(option) {
            self.selected.push(option.to_string());
        }
    }

    pub fn remove(&mut self, option: &str) {
        self.selected.retain(|s| s != option);
    }

    pub fn toggle(&mut self, option: &str, selected: bool) {
        if selected {
            self.add(option);
        } else {
            self.remove(option);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected values: known options in option order, then any others.
    pub fn values(&self) -> Vec<String> {
        let known = self
            .options
            .iter()
            .filter(|o| self.is_selected(o))
            .cloned();
        let unknown = self
            .selected
            .iter()
            .filter(|s| !self.options.contains(s))
            .cloned();
        known.chain(unknown).collect()
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.values().into_iter().map(Value::String).collect())
    }
}

/// An edit reported by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum FormChange {
    /// Replace the value of a single-valued field.
    Set { api_name: String, value: Value },
    /// Check or uncheck one option of a multiselect field.
    Toggle {
        api_name: String,
        option: String,
        selected: bool,
    },
    /// Pick or clear a date.
    Date {
        api_name: String,
        date: Option<NaiveDate>,
    },
    /// Remove the value entirely.
    Clear { api_name: String },
}

impl FormChange {
    pub fn api_name(&self) -> &str {
        match self {
            FormChange::Set { api_name, .. }
            | FormChange::Toggle { api_name, .. }
            | FormChange::Date { api_name, .. }
            | FormChange::Clear { api_name } => api_name,
        }
    }
}

/// Apply `change` to `values`. The edit must fit the named field's editor.
pub fn apply_change(
    values: &mut Map<String, Value>,
    definitions: &[FieldDefinition],
    change: FormChange,
) -> Result<()> {
    let api_name = change.api_name().to_string();
    let def = definitions
        .iter()
        .find(|d| d.api_name == api_name)
        .ok_or_else(|| FieldsError::invalid_change(&api_name, "no such field"))?;

    match (change, &def.field_type) {
        (FormChange::Clear { .. }, _) => {
            values.remove(&api_name);
        }
        (FormChange::Toggle { option, selected, .. }, FieldType::MultiSelect { options }) => {
            if !options.contains(&option) {
                return Err(FieldsError::invalid_change(
                    &api_name,
                    format!("'{option}' is not an option"),
                ));
            }
            let mut state = MultiSelectState::new(options, values.get(&api_name));
            state.toggle(&option, selected);
            // Nothing checked means no value, so `is required` still fires.
            if state.is_empty() {
                values.remove(&api_name);
            } else {
                values.insert(api_name, state.into_value());
            }
        }
        (FormChange::Toggle { .. }, _) => {
            return Err(FieldsError::invalid_change(
                &api_name,
                "only multiselect fields take toggles",
            ));
        }
        (FormChange::Date { date, .. }, FieldType::Date) => match date {
            Some(date) => {
                values.insert(api_name, Value::String(date.format(DATE_FORMAT).to_string()));
            }
            None => {
                values.remove(&api_name);
            }
        },
        (FormChange::Date { .. }, _) | (FormChange::Set { .. }, FieldType::Date) => {
            return Err(FieldsError::invalid_change(
                &api_name,
                "dates are set through the date picker",
            ));
        }
        (FormChange::Set { .. }, FieldType::MultiSelect { .. }) => {
            return Err(FieldsError::invalid_change(
                &api_name,
                "multiselect values are edited one option at a time",
            ));
        }
        (FormChange::Set { value, .. }, _) => {
            values.insert(api_name, value);
        }
    }

    Ok(())
}

/// The interface a UI implements to render dynamic fields.
pub trait FormRenderer {
    type Output;

    /// Render every field; `fields` is already in display order.
    fn render(&mut self, fields: &[FieldView<'_>]) -> Self::Output;
}

/// Build views and hand them to `renderer`.
pub fn render_form<R: FormRenderer>(
    renderer: &mut R,
    definitions: &[FieldDefinition],
    values: &Map<String, Value>,
    errors: &IndexMap<String, String>,
) -> R::Output {
    let views = field_views(definitions, values, errors);
    renderer.render(&views)
}
