//! Splitting form submissions between fixed columns and the metadata bag,
//! and flattening stored rows back into a single view.
//!
//! Both directions are name-based only: no definitions are consulted and no
//! values are validated here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::FieldDefinition;

/// Name of the JSON column holding dynamic field values on an entity row.
///
/// The name is reserved: a fixed column of the same name is replaced by the
/// bag in [`SeparatedData::into_entity_row`] and hidden by [`merge`], so no
/// module may declare one.
pub const METADATA_COLUMN: &str = "metadata";

/// A submission split into fixed-column values and dynamic-field values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeparatedData {
    pub fixed: Map<String, Value>,
    pub metadata: Map<String, Value>,
}

impl SeparatedData {
    /// Build the entity row to persist: the fixed values plus the metadata
    /// bag under [`METADATA_COLUMN`]. A fixed value named [`METADATA_COLUMN`]
    /// is overwritten by the bag.
    pub fn into_entity_row(self) -> Map<String, Value> {
        let mut row = self.fixed;
        row.insert(METADATA_COLUMN.to_string(), Value::Object(self.metadata));
        row
    }
}

/// Partition `form_data` by key: names in `fixed_field_names` go to `fixed`,
/// everything else to `metadata`.
pub fn separate<I, K>(form_data: &Map<String, Value>, fixed_field_names: I) -> SeparatedData
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let fixed_names: HashSet<String> = fixed_field_names
        .into_iter()
        .map(|k| k.as_ref().to_string())
        .collect();

    let mut separated = SeparatedData::default();
    for (key, value) in form_data {
        let target = if fixed_names.contains(key) {
            &mut separated.fixed
        } else {
            &mut separated.metadata
        };
        target.insert(key.clone(), value.clone());
    }
    separated
}

/// Flatten a stored entity row: its fixed attributes, then every key of its
/// metadata object on top. Metadata wins on a name collision.
///
/// `active_definitions` does not filter which metadata keys surface; keys of
/// deleted or deactivated definitions are returned as stored.
pub fn merge(entity_row: &Map<String, Value>, _active_definitions: &[FieldDefinition]) -> Map<String, Value> {
    let mut view: Map<String, Value> = entity_row
        .iter()
        .filter(|(key, _)| key.as_str() != METADATA_COLUMN)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Some(Value::Object(metadata)) = entity_row.get(METADATA_COLUMN) {
        for (key, value) in metadata {
            view.insert(key.clone(), value.clone());
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn separate_by_name() {
        let out = separate(&obj(json!({"a": 1, "b": 2, "c": 3})), ["a", "c"]);
        assert_eq!(Value::Object(out.fixed), json!({"a": 1, "c": 3}));
        assert_eq!(Value::Object(out.metadata), json!({"b": 2}));
    }

    #[test]
    fn separate_with_no_fixed_names() {
        let out = separate(&obj(json!({"a": 1})), Vec::<String>::new());
        assert!(out.fixed.is_empty());
        assert_eq!(out.metadata.len(), 1);
    }

    #[test]
    fn fixed_names_absent_from_data_are_ignored() {
        let out = separate(&obj(json!({"a": 1})), ["a", "zzz"]);
        assert_eq!(out.fixed.len(), 1);
        assert!(!out.fixed.contains_key("zzz"));
    }

    #[test]
    fn bag_replaces_a_fixed_value_under_the_reserved_name() {
        let row = separate(
            &obj(json!({"metadata": "typed by hand", "gpa": 3.9})),
            [METADATA_COLUMN],
        )
        .into_entity_row();
        assert_eq!(Value::Object(row), json!({"metadata": {"gpa": 3.9}}));
    }

    #[test]
    fn entity_row_carries_metadata_column() {
        let row = separate(&obj(json!({"first_name": "Ana", "gpa": 3.9})), ["first_name"])
            .into_entity_row();
        assert_eq!(
            Value::Object(row),
            json!({"first_name": "Ana", "metadata": {"gpa": 3.9}})
        );
    }

    #[test]
    fn merge_overlays_metadata() {
        let row = obj(json!({
            "id": 7,
            "first_name": "Ana",
            "metadata": {"gpa": 3.9, "first_name": "Anita"}
        }));
        let view = merge(&row, &[]);
        assert_eq!(
            Value::Object(view),
            json!({"id": 7, "first_name": "Anita", "gpa": 3.9})
        );
    }

    #[test]
    fn merge_ignores_missing_or_non_object_metadata() {
        let view = merge(&obj(json!({"id": 1})), &[]);
        assert_eq!(Value::Object(view), json!({"id": 1}));

        let view = merge(&obj(json!({"id": 1, "metadata": "oops"})), &[]);
        assert_eq!(Value::Object(view), json!({"id": 1}));

        let view = merge(&obj(json!({"id": 1, "metadata": null})), &[]);
        assert_eq!(Value::Object(view), json!({"id": 1}));
    }

    #[test]
    fn round_trip() {
        let form = obj(json!({"first_name": "Ana", "email": "a@b.co", "gpa": 3.9, "langs": ["en"]}));
        let view = merge(&separate(&form, ["first_name", "email"]).into_entity_row(), &[]);
        assert_eq!(view, form);
    }
}
