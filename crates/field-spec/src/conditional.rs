//! Conditional visibility rules.
//!
//! Rules arrive as loosely shaped JSON and are normalized into a
//! [`ConditionalLogic`] value by [`parse_conditional_rules`]. The parsed form
//! is what the browser layer receives and what [`ConditionalLogic::evaluate`]
//! checks against sibling values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldError, Result};
use crate::field::Field;

/// Operators accepted in a rule's `compare` slot.
pub const ALLOWED_OPERATORS: [&str; 8] = ["=", "!=", ">", ">=", "<", "<=", "IN", "NOT IN"];

/// How the rules of a set combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Relation {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::And => "AND",
            Relation::Or => "OR",
        }
    }

    /// Reads the `relation` key of a rule mapping, defaulting to `AND`.
    pub fn from_rules(rules: &Map<String, Value>) -> Result<Relation> {
        match rules.get("relation") {
            None | Some(Value::Null) => Ok(Relation::And),
            Some(Value::String(relation)) => relation.parse(),
            Some(other) => Err(FieldError::InvalidRelation {
                relation: other.to_string(),
            }),
        }
    }
}

impl FromStr for Relation {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_uppercase().as_str() {
            "AND" => Ok(Relation::And),
            "OR" => Ok(Relation::Or),
            _ => Err(FieldError::InvalidRelation {
                relation: value.to_uppercase(),
            }),
        }
    }
}

/// Comparison applied between a sibling's value and the rule's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Compare {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
}

impl Compare {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compare::Eq => "=",
            Compare::NotEq => "!=",
            Compare::Gt => ">",
            Compare::Gte => ">=",
            Compare::Lt => "<",
            Compare::Lte => "<=",
            Compare::In => "IN",
            Compare::NotIn => "NOT IN",
        }
    }

    /// `IN` and `NOT IN` take a sequence of candidates.
    pub fn expects_sequence(&self) -> bool {
        matches!(self, Compare::In | Compare::NotIn)
    }
}

impl FromStr for Compare {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "=" => Ok(Compare::Eq),
            "!=" => Ok(Compare::NotEq),
            ">" => Ok(Compare::Gt),
            ">=" => Ok(Compare::Gte),
            "<" => Ok(Compare::Lt),
            "<=" => Ok(Compare::Lte),
            "IN" => Ok(Compare::In),
            "NOT IN" => Ok(Compare::NotIn),
            other => Err(FieldError::InvalidCompare {
                compare: other.to_string(),
                allowed: ALLOWED_OPERATORS.join(", "),
            }),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalRule {
    pub field: String,
    pub compare: Compare,
    pub value: Value,
}

impl ConditionalRule {
    /// Checks `actual` (the sibling's current value) against this rule.
    pub fn matches(&self, actual: &Value) -> bool {
        match self.compare {
            Compare::Eq => loose_eq(actual, &self.value),
            Compare::NotEq => !loose_eq(actual, &self.value),
            Compare::Gt => compare_numbers(actual, &self.value, |a, b| a > b),
            Compare::Gte => compare_numbers(actual, &self.value, |a, b| a >= b),
            Compare::Lt => compare_numbers(actual, &self.value, |a, b| a < b),
            Compare::Lte => compare_numbers(actual, &self.value, |a, b| a <= b),
            Compare::In => contains(&self.value, actual),
            Compare::NotIn => !contains(&self.value, actual),
        }
    }
}

/// Canonical rule set attached to a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalLogic {
    pub relation: Relation,
    pub rules: Vec<ConditionalRule>,
}

impl ConditionalLogic {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates the set against sibling values keyed by base name.
    ///
    /// Missing siblings compare as `null`. An empty set is always satisfied.
    pub fn evaluate(&self, values: &Map<String, Value>) -> bool {
        let mut results = self
            .rules
            .iter()
            .map(|rule| rule.matches(values.get(&rule.field).unwrap_or(&Value::Null)));
        match self.relation {
            Relation::And => results.all(|matched| matched),
            Relation::Or => self.rules.is_empty() || results.any(|matched| matched),
        }
    }
}

/// Normalizes a rule mapping using [`Relation::from_rules`] for the relation.
pub fn parse_conditional_rules(rules: &Value) -> Result<ConditionalLogic> {
    parse_conditional_rules_with(rules, Relation::from_rules)
}

/// Normalizes a rule mapping with a caller-supplied relation resolver.
///
/// Accepts `{ "relation": .., "rules": [..] }`, a mapping whose non-`relation`
/// entries are rules, or a bare sequence of rules.
pub fn parse_conditional_rules_with<F>(
    rules: &Value,
    resolve_relation: F,
) -> Result<ConditionalLogic>
where
    F: FnOnce(&Map<String, Value>) -> Result<Relation>,
{
    let (relation, entries) = match rules {
        Value::Object(object) => {
            let relation = resolve_relation(object)?;
            let entries = match object.get("rules") {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(_) => return Err(FieldError::InvalidRules),
                None => keyed_entries(object),
            };
            (relation, entries)
        }
        Value::Array(items) => (resolve_relation(&Map::new())?, items.iter().collect()),
        _ => return Err(FieldError::InvalidRules),
    };

    let rules = entries
        .into_iter()
        .enumerate()
        .map(|(index, rule)| parse_rule(index, rule))
        .collect::<Result<Vec<_>>>()?;

    Ok(ConditionalLogic { relation, rules })
}

/// Rules stored directly under the mapping, numeric keys in numeric order.
fn keyed_entries(object: &Map<String, Value>) -> Vec<&Value> {
    let mut entries: Vec<(&String, &Value)> = object
        .iter()
        .filter(|(key, _)| key.as_str() != "relation")
        .collect();
    entries.sort_by_key(|(key, _)| key.parse::<usize>().ok());
    entries.into_iter().map(|(_, value)| value).collect()
}

fn parse_rule(index: usize, rule: &Value) -> Result<ConditionalRule> {
    let Value::Object(rule) = rule else {
        return Err(FieldError::InvalidRule {
            index,
            reason: "each rule must be a mapping".into(),
        });
    };

    let field = match rule.get("field") {
        Some(Value::String(field)) if !field.is_empty() => field.clone(),
        _ => {
            return Err(FieldError::InvalidRule {
                index,
                reason: "a non-empty \"field\" is required".into(),
            });
        }
    };

    let compare = match rule.get("compare") {
        None | Some(Value::Null) => Compare::default(),
        Some(Value::String(compare)) => compare.parse()?,
        Some(other) => {
            return Err(FieldError::InvalidCompare {
                compare: other.to_string(),
                allowed: ALLOWED_OPERATORS.join(", "),
            });
        }
    };

    let value = match rule.get("value") {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(value) => value.clone(),
    };

    if compare.expects_sequence() && !value.is_array() {
        return Err(FieldError::ExpectedSequence {
            compare: compare.to_string(),
        });
    }

    Ok(ConditionalRule {
        field,
        compare,
        value,
    })
}

pub type VisibilityMap = BTreeMap<String, bool>;

/// Visibility of every field given sibling values keyed by base name.
pub fn resolve_visibility(fields: &[Field], values: &Map<String, Value>) -> VisibilityMap {
    fields
        .iter()
        .map(|field| {
            let visible = field
                .conditional_logic()
                .map(|logic| logic.evaluate(values))
                .unwrap_or(true);
            (field.base_name().to_string(), visible)
        })
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    if let (Some(left), Some(right)) = (as_number(left), as_number(right)) {
        return left == right;
    }
    as_text(left) == as_text(right)
}

fn compare_numbers(left: &Value, right: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => op(left, right),
        _ => false,
    }
}

fn contains(candidates: &Value, actual: &Value) -> bool {
    candidates
        .as_array()
        .map(|items| items.iter().any(|item| loose_eq(actual, item)))
        .unwrap_or(false)
}
