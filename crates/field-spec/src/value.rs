//! Value container owned by every field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key used for rows holding a single scalar.
pub const VALUE_KEY: &str = "value";

/// Cardinality of a field's stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// One scalar.
    Single,
    /// One row of named properties.
    MultipleProperties,
    /// An ordered sequence of rows (the entry-set).
    MultipleValues,
}

impl ValueShape {
    /// Shapes whose stored value is overwritten in place on save.
    pub fn is_single_row(self) -> bool {
        matches!(self, ValueShape::Single | ValueShape::MultipleProperties)
    }
}

pub type Row = Map<String, Value>;

/// Holds a field's current value as a list of rows.
///
/// `rows` is `None` until a value has been set. A set container may still be
/// empty, which is how an explicit `null` or a missing form input is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    shape: ValueShape,
    properties: Vec<String>,
    rows: Option<Vec<Row>>,
}

impl ValueSet {
    pub fn new(shape: ValueShape) -> Self {
        Self {
            shape,
            properties: vec![VALUE_KEY.to_string()],
            rows: None,
        }
    }

    /// Container for a single row restricted to the given property keys.
    pub fn with_properties<I, S>(shape: ValueShape, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        Self {
            shape,
            properties: if properties.is_empty() {
                vec![VALUE_KEY.to_string()]
            } else {
                properties
            },
            rows: None,
        }
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Whether any value, including an empty one, has been assigned.
    pub fn is_set(&self) -> bool {
        self.rows.is_some()
    }

    pub fn rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or_default()
    }

    /// Stores `value`, normalized to this container's shape.
    pub fn set(&mut self, value: Value) {
        let rows = match (self.shape, value) {
            (_, Value::Null) => Vec::new(),
            (ValueShape::Single, value) => vec![scalar_row(value)],
            (ValueShape::MultipleProperties, Value::Object(object)) => {
                vec![self.property_row(object)]
            }
            (ValueShape::MultipleProperties, value) => vec![scalar_row(value)],
            (ValueShape::MultipleValues, Value::Array(items)) => {
                items.into_iter().map(entry_row).collect()
            }
            (ValueShape::MultipleValues, value) => vec![entry_row(value)],
        };
        self.rows = Some(rows);
    }

    /// Marks the container as set with no rows.
    pub fn clear(&mut self) {
        self.rows = Some(Vec::new());
    }

    /// The value as seen by consumers, projected through the shape.
    pub fn get_value(&self) -> Value {
        let Some(rows) = &self.rows else {
            return Value::Null;
        };
        match self.shape {
            ValueShape::Single => rows
                .first()
                .and_then(|row| row.get(VALUE_KEY))
                .cloned()
                .unwrap_or(Value::Null),
            ValueShape::MultipleProperties => rows
                .first()
                .map(|row| Value::Object(row.clone()))
                .unwrap_or(Value::Null),
            ValueShape::MultipleValues => Value::Array(rows.iter().map(unwrap_row).collect()),
        }
    }

    /// Every stored row, unprojected.
    pub fn get_full_value(&self) -> Value {
        match &self.rows {
            Some(rows) => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
            None => Value::Null,
        }
    }

    fn property_row(&self, mut object: Row) -> Row {
        if self.properties.len() == 1 && self.properties[0] == VALUE_KEY {
            return object;
        }
        self.properties
            .iter()
            .map(|property| {
                let value = object
                    .remove(property)
                    .unwrap_or_else(|| Value::String(String::new()));
                (property.clone(), value)
            })
            .collect()
    }
}

fn scalar_row(value: Value) -> Row {
    let mut row = Map::new();
    row.insert(VALUE_KEY.into(), value);
    row
}

fn entry_row(value: Value) -> Row {
    match value {
        Value::Object(object) => object,
        other => scalar_row(other),
    }
}

fn unwrap_row(row: &Row) -> Value {
    match row.get(VALUE_KEY) {
        Some(value) if row.len() == 1 => value.clone(),
        _ => Value::Object(row.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unset_container_reports_null() {
        let set = ValueSet::new(ValueShape::Single);
        assert!(!set.is_set());
        assert_eq!(set.get_value(), Value::Null);
        assert_eq!(set.get_full_value(), Value::Null);
    }

    #[test]
    fn explicit_null_is_kept_as_set() {
        let mut set = ValueSet::new(ValueShape::Single);
        set.set(Value::Null);
        assert!(set.is_set());
        assert_eq!(set.get_value(), Value::Null);
        assert_eq!(set.get_full_value(), json!([]));
    }

    #[test]
    fn single_value_wraps_scalar() {
        let mut set = ValueSet::new(ValueShape::Single);
        set.set(json!("hello"));
        assert_eq!(set.get_value(), json!("hello"));
        assert_eq!(set.get_full_value(), json!([{ "value": "hello" }]));
    }

    #[test]
    fn multiple_properties_keeps_declared_keys() {
        let mut set =
            ValueSet::with_properties(ValueShape::MultipleProperties, ["lat", "lng", "zoom"]);
        set.set(json!({ "lat": 42.1, "lng": 23.3, "extra": true }));
        assert_eq!(set.get_value(), json!({ "lat": 42.1, "lng": 23.3, "zoom": "" }));
    }

    #[test]
    fn multiple_values_unwraps_scalar_rows() {
        let mut set = ValueSet::new(ValueShape::MultipleValues);
        set.set(json!([1, 2, { "_type": "entry", "title": "x" }]));
        assert_eq!(set.get_value(), json!([1, 2, { "_type": "entry", "title": "x" }]));
        assert_eq!(set.rows().len(), 3);
    }

    #[test]
    fn clear_yields_empty_entry_set() {
        let mut set = ValueSet::new(ValueShape::MultipleValues);
        set.clear();
        assert!(set.is_set());
        assert_eq!(set.get_value(), json!([]));
    }

    #[test]
    fn only_entry_sets_are_multi_row() {
        assert!(ValueShape::Single.is_single_row());
        assert!(ValueShape::MultipleProperties.is_single_row());
        assert!(!ValueShape::MultipleValues.is_single_row());
    }
}
