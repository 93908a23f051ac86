//! JSON projection handed to the rendering layer.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::conditional::ConditionalLogic;
use crate::field::Field;

/// Attributes of a field the rendering layer may read.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FieldProjection {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
    pub name: String,
    pub base_name: String,
    pub value: Value,
    pub default_value: Value,
    pub help_text: String,
    pub context: Option<String>,
    pub required: bool,
    pub lazyload: bool,
    pub width: u8,
    pub classes: Vec<String>,
    /// Parsed rule set, or an empty list when the field has none.
    #[schemars(with = "Option<ConditionalLogic>")]
    pub conditional_logic: Value,
}

impl FieldProjection {
    pub fn from_field(field: &mut Field) -> Self {
        let conditional_logic = field
            .conditional_logic()
            .and_then(|logic| serde_json::to_value(logic).ok())
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Self {
            id: field.id().to_string(),
            type_name: field.type_name().to_string(),
            label: field.label().to_string(),
            name: field.name().to_string(),
            base_name: field.base_name().to_string(),
            value: field.get_formatted_value(),
            default_value: field.default_value().clone(),
            help_text: field.help_text().to_string(),
            context: field.context().map(str::to_string),
            required: field.is_required(),
            lazyload: field.lazyload(),
            width: field.width(),
            classes: field.classes().to_vec(),
            conditional_logic,
        }
    }
}

/// Base projection plus the kind's extra keys.
pub fn project(field: &mut Field) -> Value {
    let projection = FieldProjection::from_field(field);
    let mut map = match serde_json::to_value(projection) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    field.kind().extend_json(&mut map);
    Value::Object(map)
}

/// JSON Schema of the base projection.
pub fn projection_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FieldProjection)).unwrap_or(Value::Null)
}
