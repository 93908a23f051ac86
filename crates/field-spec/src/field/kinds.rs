//! Built-in field kinds.

use std::any::Any;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};

use super::{Field, FieldKind};
use crate::projection;
use crate::value::ValueShape;

macro_rules! kind_plumbing {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn clone_kind(&self) -> Box<dyn FieldKind> {
            Box::new(self.clone())
        }
    };
}

/// Kind with no behaviour beyond its name and shape: text inputs, media
/// pickers, hidden values.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicKind {
    type_name: &'static str,
    shape: ValueShape,
}

impl BasicKind {
    pub fn single(type_name: &'static str) -> Self {
        Self {
            type_name,
            shape: ValueShape::Single,
        }
    }

    pub fn multiple(type_name: &'static str) -> Self {
        Self {
            type_name,
            shape: ValueShape::MultipleValues,
        }
    }
}

impl FieldKind for BasicKind {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn value_shape(&self) -> ValueShape {
        self.shape
    }

    fn default_value(&self) -> Value {
        match self.shape {
            ValueShape::MultipleValues => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        }
    }

    kind_plumbing!();
}

/// Stored value of a ticked checkbox unless configured otherwise.
pub const DEFAULT_OPTION_VALUE: &str = "yes";

/// Single checkbox; formats to a boolean.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxKind {
    pub option_value: String,
}

impl Default for CheckboxKind {
    fn default() -> Self {
        Self {
            option_value: DEFAULT_OPTION_VALUE.to_string(),
        }
    }
}

impl FieldKind for CheckboxKind {
    fn type_name(&self) -> &'static str {
        "checkbox"
    }

    fn format_value(&self, value: Value) -> Value {
        Value::Bool(value.as_str() == Some(self.option_value.as_str()))
    }

    fn extend_json(&self, projection: &mut Map<String, Value>) {
        projection.insert(
            "option_value".into(),
            Value::String(self.option_value.clone()),
        );
    }

    kind_plumbing!();
}

/// One predefined choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Select, radio, set and multiselect fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceKind {
    type_name: &'static str,
    shape: ValueShape,
    options: Vec<FieldOption>,
}

impl ChoiceKind {
    /// One choice out of many (`select`, `radio`).
    pub fn single(type_name: &'static str) -> Self {
        Self {
            type_name,
            shape: ValueShape::Single,
            options: Vec::new(),
        }
    }

    /// Any number of choices (`set`, `multiselect`).
    pub fn multiple(type_name: &'static str) -> Self {
        Self {
            type_name,
            shape: ValueShape::MultipleValues,
            options: Vec::new(),
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    pub fn set_options(&mut self, options: Vec<FieldOption>) {
        self.options = options;
    }

    pub fn add_option(&mut self, option: FieldOption) {
        self.options.push(option);
    }
}

impl FieldKind for ChoiceKind {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn value_shape(&self) -> ValueShape {
        self.shape
    }

    fn default_value(&self) -> Value {
        match self.shape {
            ValueShape::MultipleValues => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        }
    }

    fn extend_json(&self, projection: &mut Map<String, Value>) {
        let options = self
            .options
            .iter()
            .map(|option| json!({ "value": option.value, "label": option.label }))
            .collect();
        projection.insert("options".into(), Value::Array(options));
    }

    kind_plumbing!();
}

/// Property keys of a map location.
pub const MAP_PROPERTIES: [&str; 4] = ["lat", "lng", "zoom", "address"];

/// Geographic location with a zoom level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapKind;

impl FieldKind for MapKind {
    fn type_name(&self) -> &'static str {
        "map"
    }

    fn value_shape(&self) -> ValueShape {
        ValueShape::MultipleProperties
    }

    fn value_properties(&self) -> &[&'static str] {
        &MAP_PROPERTIES
    }

    fn default_value(&self) -> Value {
        json!({
            "lat": 40.346544,
            "lng": -101.645507,
            "zoom": 10,
            "address": "",
        })
    }

    /// Coordinates become numbers, zoom an integer.
    fn format_value(&self, value: Value) -> Value {
        let Value::Object(mut location) = value else {
            return value;
        };
        for key in ["lat", "lng"] {
            if let Some(number) = location
                .get(key)
                .and_then(numeric)
                .and_then(Number::from_f64)
            {
                location.insert(key.into(), Value::Number(number));
            }
        }
        if let Some(zoom) = location.get("zoom").and_then(numeric) {
            location.insert("zoom".into(), Value::from(zoom as i64));
        }
        Value::Object(location)
    }

    kind_plumbing!();
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Repeating group of child fields; each entry is one row.
#[derive(Debug, Clone, Default)]
pub struct ComplexKind {
    fields: Vec<Field>,
}

impl ComplexKind {
    pub fn add_fields(&mut self, fields: Vec<Field>) {
        self.fields.extend(fields);
    }
}

impl FieldKind for ComplexKind {
    fn type_name(&self) -> &'static str {
        "complex"
    }

    fn value_shape(&self) -> ValueShape {
        ValueShape::MultipleValues
    }

    fn default_value(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn extend_json(&self, projection_map: &mut Map<String, Value>) {
        let fields = self
            .fields
            .iter()
            .map(|field| projection::project(&mut field.clone()))
            .collect();
        projection_map.insert("fields".into(), Value::Array(fields));
    }

    fn children(&self) -> &[Field] {
        &self.fields
    }

    fn children_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    kind_plumbing!();
}

/// Stand-in returned when a requested type is not registered.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenKind {
    pub requested_type: String,
}

impl BrokenKind {
    pub fn new(requested_type: impl Into<String>) -> Self {
        Self {
            requested_type: requested_type.into(),
        }
    }
}

impl FieldKind for BrokenKind {
    fn type_name(&self) -> &'static str {
        "broken"
    }

    fn extend_json(&self, projection: &mut Map<String, Value>) {
        projection.insert(
            "requested_type".into(),
            Value::String(self.requested_type.clone()),
        );
    }

    kind_plumbing!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_formats_to_bool() {
        let mut field =
            Field::new(Box::new(CheckboxKind::default()), "agree", None).expect("valid");
        field.set_value(json!("yes"));
        assert_eq!(field.get_formatted_value(), json!(true));
        field.set_option_value("on").expect("checkbox");
        assert_eq!(field.get_formatted_value(), json!(false));
        assert_eq!(field.get_value(), json!("yes"));
    }

    #[test]
    fn map_defaults_and_formats_coordinates() {
        let mut field = Field::new(Box::new(MapKind), "location", None).expect("valid");
        assert_eq!(field.get_value()["zoom"], json!(10));

        field.set_value(json!({ "lat": "42.5", "lng": "23.25", "zoom": "7", "address": "Sofia" }));
        let formatted = field.get_formatted_value();
        assert_eq!(formatted["lat"], json!(42.5));
        assert_eq!(formatted["lng"], json!(23.25));
        assert_eq!(formatted["zoom"], json!(7));
        assert_eq!(formatted["address"], json!("Sofia"));
        assert_eq!(field.get_value()["lat"], json!("42.5"));
    }

    #[test]
    fn choice_projection_lists_options() {
        let mut field = Field::new(Box::new(ChoiceKind::single("select")), "color", None)
            .expect("valid");
        field
            .set_options(vec![FieldOption::new("red", "Red"), FieldOption::new("blue", "Blue")])
            .expect("choice");
        let json = field.to_json(false).expect("project");
        assert_eq!(json["options"][1], json!({ "value": "blue", "label": "Blue" }));
        assert_eq!(
            field.kind_as::<ChoiceKind>().map(|kind| kind.options().len()),
            Some(2)
        );
    }

    #[test]
    fn multiple_kinds_default_to_empty_list() {
        let mut set =
            Field::new(Box::new(ChoiceKind::multiple("set")), "tags", None).expect("valid");
        assert_eq!(set.get_value(), json!([]));
        let mut gallery =
            Field::new(Box::new(BasicKind::multiple("media_gallery")), "gallery", None)
                .expect("valid");
        assert_eq!(gallery.get_value(), json!([]));
    }
}
