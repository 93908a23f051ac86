//! Policy callbacks consulted while saving fields and parsing rules.

use serde_json::{Map, Value};

use crate::conditional::Relation;
use crate::error::Result;
use crate::field::Field;

/// Filter points consulted while saving a field and parsing its rules.
///
/// Every method receives the default decision and returns the decision to
/// use. Override only the points you need; the rest pass the default through.
pub trait FieldHooks {
    /// Whether stored values are deleted before writing.
    fn should_delete_field_value_on_save(&self, default: bool, _field: &Field) -> bool {
        default
    }

    /// Whether the field writes to its datastore at all.
    fn should_save_field_value(&self, default: bool, _value: &Value, _field: &Field) -> bool {
        default
    }

    /// Relation used when parsing conditional rules.
    fn relation_type_from_rules(&self, rules: &Map<String, Value>) -> Result<Relation> {
        Relation::from_rules(rules)
    }
}

/// Hooks that never alter the default decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl FieldHooks for DefaultHooks {}
