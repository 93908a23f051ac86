//! Declarative field configuration read from definition files.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::FieldOption;

/// CSS classes, given either as one whitespace-separated string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Classes {
    Text(String),
    List(Vec<String>),
}

/// Declarative field configuration, as read from container setup files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Classes>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub autoload: bool,
    #[serde(default)]
    pub lazyload: bool,
    #[serde(default)]
    pub visible_in_rest_api: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_value: Option<String>,
    /// Child definitions of a complex field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDefinition>,
}

impl FieldDefinition {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            label: None,
            help_text: None,
            default_value: None,
            width: None,
            classes: None,
            required: false,
            autoload: false,
            lazyload: false,
            visible_in_rest_api: false,
            context: None,
            name_prefix: None,
            conditional_logic: None,
            options: None,
            option_value: None,
            fields: Vec::new(),
        }
    }
}

/// JSON Schema of a field definition file entry.
pub fn definition_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FieldDefinition)).unwrap_or(Value::Null)
}
