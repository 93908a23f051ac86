//! The field entity and its kind seam.

pub mod hierarchy;
pub mod kinds;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::conditional::{ConditionalLogic, parse_conditional_rules_with};
use crate::datastore::Datastore;
use crate::error::{FieldError, Result};
use crate::hooks::{DefaultHooks, FieldHooks};
use crate::naming::{self, DEFAULT_NAME_PREFIX};
use crate::projection;
use crate::value::{ValueSet, ValueShape};

pub use kinds::{
    BasicKind, BrokenKind, CheckboxKind, ChoiceKind, ComplexKind, FieldOption, MapKind,
};

/// Widest a field may be, in percent of its container row.
pub const MAX_WIDTH: u8 = 100;

/// Behaviour that differs between field types.
///
/// A kind decides the value shape, the default value, display formatting
/// and any extra keys of the JSON projection. Everything else lives on
/// [`Field`].
pub trait FieldKind: fmt::Debug + Send + Sync {
    /// Type name as exposed to the browser layer, e.g. `rich_text`.
    fn type_name(&self) -> &'static str;

    fn value_shape(&self) -> ValueShape {
        ValueShape::Single
    }

    /// Property keys kept for [`ValueShape::MultipleProperties`] values.
    fn value_properties(&self) -> &[&'static str] {
        &[]
    }

    fn default_value(&self) -> Value {
        Value::String(String::new())
    }

    /// Display-only transformation of the stored value.
    fn format_value(&self, value: Value) -> Value {
        value
    }

    /// Adds kind-specific keys to the JSON projection.
    fn extend_json(&self, _projection: &mut Map<String, Value>) {}

    /// Child field templates, for kinds that nest fields.
    fn children(&self) -> &[Field] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Field] {
        &mut []
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_kind(&self) -> Box<dyn FieldKind>;
}

impl Clone for Box<dyn FieldKind> {
    fn clone(&self) -> Self {
        self.clone_kind()
    }
}

/// One declared input of a container.
#[derive(Clone)]
pub struct Field {
    kind: Box<dyn FieldKind>,
    id: String,
    name: String,
    base_name: String,
    name_prefix: String,
    label: String,
    help_text: String,
    default_value: Value,
    width: u8,
    classes: Vec<String>,
    required: bool,
    autoload: bool,
    lazyload: bool,
    visible_in_rest_api: bool,
    context: Option<String>,
    conditional_logic: Option<ConditionalLogic>,
    hierarchy: Vec<String>,
    hierarchy_index: Vec<usize>,
    value_set: ValueSet,
    datastore: Option<Arc<dyn Datastore>>,
    has_default_datastore: bool,
    activated: bool,
}

impl Field {
    /// Creates a field of `kind`. A missing label is derived from the name.
    pub fn new(kind: Box<dyn FieldKind>, name: &str, label: Option<&str>) -> Result<Field> {
        let value_set = match kind.value_properties() {
            [] => ValueSet::new(kind.value_shape()),
            properties => ValueSet::with_properties(kind.value_shape(), properties.iter().copied()),
        };
        let default_value = kind.default_value();
        let mut field = Field {
            kind,
            id: String::new(),
            name: String::new(),
            base_name: String::new(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            label: String::new(),
            help_text: String::new(),
            default_value,
            width: 0,
            classes: Vec::new(),
            required: false,
            autoload: false,
            lazyload: false,
            visible_in_rest_api: false,
            context: None,
            conditional_logic: None,
            hierarchy: Vec::new(),
            hierarchy_index: vec![0],
            value_set,
            datastore: None,
            has_default_datastore: false,
            activated: false,
        };
        field.set_base_name(name)?;
        field.set_name(name)?;
        field.set_label(label);
        field.id = naming::generate_id(&field.name, &field.label);
        Ok(field)
    }

    pub fn kind(&self) -> &dyn FieldKind {
        self.kind.as_ref()
    }

    /// Downcasts the kind, e.g. to reach [`ChoiceKind`] options.
    pub fn kind_as<K: FieldKind + 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    pub fn kind_as_mut<K: FieldKind + 'static>(&mut self) -> Option<&mut K> {
        self.kind.as_any_mut().downcast_mut::<K>()
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates `name` and stores it with the name prefix applied once.
    pub fn set_name(&mut self, name: &str) -> Result<&mut Self> {
        naming::validate_name(name)?;
        self.name = naming::apply_prefix(name, &self.name_prefix);
        Ok(self)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn set_base_name(&mut self, name: &str) -> Result<&mut Self> {
        naming::validate_name(name)?;
        self.base_name = name.to_string();
        Ok(self)
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Swaps the prefix of the current name. `base_name` is untouched.
    ///
    /// The new prefix is always prepended, even when the unprefixed name
    /// already starts with it, so swapping back restores the old name.
    pub fn set_name_prefix(&mut self, prefix: &str) -> Result<&mut Self> {
        let unprefixed = self
            .name
            .strip_prefix(self.name_prefix.as_str())
            .unwrap_or(&self.name);
        let name = format!("{prefix}{unprefixed}");
        naming::validate_name(&name)?;
        self.name_prefix = prefix.to_string();
        self.name = name;
        Ok(self)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sets the label, deriving it from the name when `None`.
    pub fn set_label(&mut self, label: Option<&str>) -> &mut Self {
        self.label = match label {
            Some(label) => label.to_string(),
            None => naming::normalize_label(&self.name),
        };
        self
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn set_help_text(&mut self, help_text: impl Into<String>) -> &mut Self {
        self.help_text = help_text.into();
        self
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn set_default_value(&mut self, value: Value) -> &mut Self {
        self.default_value = value;
        self
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Width in percent, clamped to `0..=100`.
    pub fn set_width(&mut self, width: u32) -> &mut Self {
        self.width = width.min(u32::from(MAX_WIDTH)) as u8;
        self
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Replaces the CSS classes. Items are split on whitespace and deduplicated.
    pub fn set_classes<I, S>(&mut self, classes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.classes.clear();
        for item in classes {
            for class in item.as_ref().split_whitespace() {
                if !self.classes.iter().any(|existing| existing == class) {
                    self.classes.push(class.to_string());
                }
            }
        }
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn autoload(&self) -> bool {
        self.autoload
    }

    pub fn set_autoload(&mut self, autoload: bool) -> &mut Self {
        self.autoload = autoload;
        self
    }

    pub fn lazyload(&self) -> bool {
        self.lazyload
    }

    pub fn set_lazyload(&mut self, lazyload: bool) -> &mut Self {
        self.lazyload = lazyload;
        self
    }

    pub fn visible_in_rest_api(&self) -> bool {
        self.visible_in_rest_api
    }

    pub fn set_visible_in_rest_api(&mut self, visible: bool) -> &mut Self {
        self.visible_in_rest_api = visible;
        self
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn set_context(&mut self, context: impl Into<String>) -> &mut Self {
        self.context = Some(context.into());
        self
    }

    pub fn conditional_logic(&self) -> Option<&ConditionalLogic> {
        self.conditional_logic.as_ref()
    }

    pub fn set_conditional_logic(&mut self, rules: &Value) -> Result<&mut Self> {
        self.set_conditional_logic_with(rules, &DefaultHooks)
    }

    /// Parses and attaches visibility rules, resolving the relation via `hooks`.
    pub fn set_conditional_logic_with(
        &mut self,
        rules: &Value,
        hooks: &dyn FieldHooks,
    ) -> Result<&mut Self> {
        let logic =
            parse_conditional_rules_with(rules, |rules| hooks.relation_type_from_rules(rules))?;
        self.conditional_logic = Some(logic);
        Ok(self)
    }

    pub fn value_set(&self) -> &ValueSet {
        &self.value_set
    }

    pub fn value_shape(&self) -> ValueShape {
        self.value_set.shape()
    }

    /// No ancestors and a single-row value.
    pub fn is_simple_root_field(&self) -> bool {
        self.hierarchy.is_empty() && self.value_shape().is_single_row()
    }

    /// Current value, installing the default the first time none is set.
    pub fn get_value(&mut self) -> Value {
        self.apply_default_once();
        self.value_set.get_value()
    }

    /// Every stored row, installing the default the first time none is set.
    pub fn get_full_value(&mut self) -> Value {
        self.apply_default_once();
        self.value_set.get_full_value()
    }

    /// Current value without the default fallback.
    pub fn current_value(&self) -> Value {
        self.value_set.get_value()
    }

    pub fn set_value(&mut self, value: Value) -> &mut Self {
        self.value_set.set(value);
        self
    }

    /// Sets an explicitly empty value.
    pub fn clear_value(&mut self) -> &mut Self {
        self.value_set.clear();
        self
    }

    /// Reads this field's entry from flat form input; absence clears the value.
    pub fn set_value_from_input(&mut self, input: &Map<String, Value>) -> &mut Self {
        match input.get(&self.name) {
            Some(value) => self.value_set.set(value.clone()),
            None => self.value_set.clear(),
        }
        self
    }

    pub fn get_formatted_value(&mut self) -> Value {
        let value = self.get_value();
        self.kind.format_value(value)
    }

    fn apply_default_once(&mut self) {
        if !self.value_set.is_set() {
            self.value_set.set(self.default_value.clone());
        }
    }

    pub fn datastore(&self) -> Option<&Arc<dyn Datastore>> {
        self.datastore.as_ref()
    }

    /// Whether the current datastore came from container default wiring.
    pub fn has_default_datastore(&self) -> bool {
        self.has_default_datastore
    }

    /// Assigns a datastore. A default assignment never replaces a
    /// caller-supplied one.
    pub fn set_datastore(&mut self, datastore: Arc<dyn Datastore>, as_default: bool) -> &mut Self {
        if as_default && self.datastore.is_some() && !self.has_default_datastore {
            return self;
        }
        self.datastore = Some(datastore);
        self.has_default_datastore = as_default;
        self
    }

    fn require_datastore(&self) -> Result<Arc<dyn Datastore>> {
        self.datastore
            .clone()
            .ok_or_else(|| FieldError::MissingDatastore {
                name: self.name.clone(),
            })
    }

    /// Replaces the value with what the datastore holds, or the default.
    pub fn load(&mut self) -> Result<()> {
        let datastore = self.require_datastore()?;
        let tree = datastore.load(self)?;
        let value = tree
            .value_set
            .unwrap_or_else(|| self.default_value.clone());
        self.value_set.set(value);
        Ok(())
    }

    pub fn save(&mut self) -> Result<()> {
        self.save_with(&DefaultHooks)
    }

    /// Saves through the datastore, letting `hooks` veto the delete and the write.
    pub fn save_with(&mut self, hooks: &dyn FieldHooks) -> Result<()> {
        let datastore = self.require_datastore()?;

        let delete_first = !self.value_shape().is_single_row();
        if hooks.should_delete_field_value_on_save(delete_first, self) {
            datastore.delete(self)?;
        }

        let value = self.get_value();
        if hooks.should_save_field_value(true, &value, self) {
            datastore.save(self)?;
        } else {
            debug!(name = %self.name, "save skipped by hook");
        }
        Ok(())
    }

    pub fn delete(&mut self) -> Result<()> {
        let datastore = self.require_datastore()?;
        datastore.delete(self)?;
        Ok(())
    }

    /// JSON projection consumed by the rendering layer.
    pub fn to_json(&mut self, load: bool) -> Result<Value> {
        if load {
            self.load()?;
        }
        Ok(projection::project(self))
    }

    pub fn children(&self) -> &[Field] {
        self.kind.children()
    }

    pub fn children_mut(&mut self) -> &mut [Field] {
        self.kind.children_mut()
    }

    /// Appends child templates to a complex field.
    pub fn add_fields(&mut self, fields: Vec<Field>) -> Result<&mut Self> {
        let type_name = self.type_name();
        let complex = self
            .kind_as_mut::<ComplexKind>()
            .ok_or(FieldError::UnsupportedOption {
                type_name: type_name.to_string(),
                option: "child fields",
            })?;
        complex.add_fields(fields);
        Ok(self)
    }

    /// Replaces the predefined options of a choice field.
    pub fn set_options(&mut self, options: Vec<FieldOption>) -> Result<&mut Self> {
        let type_name = self.type_name();
        let choice = self
            .kind_as_mut::<ChoiceKind>()
            .ok_or(FieldError::UnsupportedOption {
                type_name: type_name.to_string(),
                option: "options",
            })?;
        choice.set_options(options);
        Ok(self)
    }

    /// Sets the value a checkbox stores when ticked.
    pub fn set_option_value(&mut self, option_value: impl Into<String>) -> Result<&mut Self> {
        let type_name = self.type_name();
        let checkbox = self
            .kind_as_mut::<CheckboxKind>()
            .ok_or(FieldError::UnsupportedOption {
                type_name: type_name.to_string(),
                option: "an option value",
            })?;
        checkbox.option_value = option_value.into();
        Ok(self)
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Flags the field active; `false` if it already was.
    pub(crate) fn mark_activated(&mut self) -> bool {
        !std::mem::replace(&mut self.activated, true)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("type", &self.type_name())
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_name", &self.base_name)
            .field("label", &self.label)
            .field("hierarchy", &self.hierarchy)
            .field("hierarchy_index", &self.hierarchy_index)
            .field("value_set", &self.value_set)
            .field("has_datastore", &self.datastore.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(name: &str) -> Field {
        Field::new(Box::new(BasicKind::single("text")), name, None).expect("valid name")
    }

    #[test]
    fn construction_prefixes_name_and_derives_label() {
        let field = text("crb_my_field_name");
        assert_eq!(field.name(), "_crb_my_field_name");
        assert_eq!(field.base_name(), "crb_my_field_name");
        assert_eq!(field.label(), "My Field Name");
        assert!(field.id().starts_with("carbon-"));
        assert_eq!(field.hierarchy_index(), &[0]);
    }

    #[test]
    fn set_name_is_idempotent() {
        let mut field = text("title");
        field.set_name("title").expect("valid");
        field.set_name("_title").expect("valid");
        assert_eq!(field.name(), "_title");
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut field = text("title");
        assert!(matches!(field.set_name(""), Err(FieldError::EmptyName)));
        assert!(matches!(
            field.set_name("Title"),
            Err(FieldError::InvalidName { .. })
        ));
        assert_eq!(field.name(), "_title");
        assert!(Field::new(Box::new(BasicKind::single("text")), "no spaces", None).is_err());
    }

    #[test]
    fn name_prefix_swaps_only_the_prefix() {
        let mut field = text("title");
        field.set_name_prefix("crb_").expect("valid");
        assert_eq!(field.name(), "crb_title");
        assert_eq!(field.base_name(), "title");
        field.set_name_prefix("_").expect("valid");
        assert_eq!(field.name(), "_title");
        field.set_name_prefix("").expect("valid");
        assert_eq!(field.name(), "title");
    }

    #[test]
    fn name_prefix_round_trips_when_name_starts_with_it() {
        let mut field = text("crb_title");
        assert_eq!(field.name(), "_crb_title");

        field.set_name_prefix("crb_").expect("valid");
        assert_eq!(field.name(), "crb_crb_title");
        field.set_name_prefix("_").expect("valid");
        assert_eq!(field.name(), "_crb_title");
        assert_eq!(field.base_name(), "crb_title");
        assert_eq!(field.storage_key(), "_crb_title");
    }

    #[test]
    fn invalid_name_prefix_leaves_field_untouched() {
        let mut field = text("title");
        assert!(matches!(
            field.set_name_prefix("Bad "),
            Err(FieldError::InvalidName { .. })
        ));
        assert_eq!(field.name(), "_title");
        assert_eq!(field.name_prefix(), "_");
    }

    #[test]
    fn explicit_label_is_kept() {
        let field = Field::new(Box::new(BasicKind::single("text")), "title", Some("Heading"))
            .expect("valid");
        assert_eq!(field.label(), "Heading");
    }

    #[test]
    fn default_value_is_applied_once() {
        let mut field = text("title");
        field.set_default_value(json!("x"));
        assert_eq!(field.get_value(), json!("x"));
        field.set_value(Value::Null);
        assert_eq!(field.get_value(), Value::Null);
        assert_eq!(field.get_value(), Value::Null);
    }

    #[test]
    fn missing_input_yields_empty_entry_set() {
        let mut field = text("title");
        field.set_default_value(json!("x"));
        field.set_value_from_input(&Map::new());
        assert!(field.value_set().is_set());
        assert_eq!(field.get_full_value(), json!([]));

        let input = json!({ "_title": "Hello" });
        field.set_value_from_input(input.as_object().expect("object"));
        assert_eq!(field.get_value(), json!("Hello"));
    }

    #[test]
    fn width_is_clamped_and_classes_deduplicated() {
        let mut field = text("title");
        field.set_width(250).set_classes(["wide half", "wide", "tall"]);
        assert_eq!(field.width(), 100);
        assert_eq!(field.classes(), &["wide", "half", "tall"]);
    }

    #[test]
    fn clone_does_not_alias_value() {
        let mut original =
            Field::new(Box::new(BasicKind::multiple("media_gallery")), "gallery", None)
                .expect("valid");
        original.set_value(json!([1, 2, 3]));
        let mut copy = original.clone();
        copy.set_value(json!([4]));
        assert_eq!(original.get_value(), json!([1, 2, 3]));
        assert_eq!(copy.get_value(), json!([4]));
    }

    #[test]
    fn simple_root_field_depends_on_shape_and_hierarchy() {
        let mut field = text("title");
        assert!(field.is_simple_root_field());
        field.set_hierarchy(vec!["slides".into()]);
        assert!(!field.is_simple_root_field());

        let gallery = Field::new(Box::new(BasicKind::multiple("media_gallery")), "gallery", None)
            .expect("valid");
        assert!(!gallery.is_simple_root_field());
    }

    #[test]
    fn options_are_rejected_on_plain_kinds() {
        let mut field = text("title");
        let err = field.set_options(vec![]).unwrap_err();
        assert!(matches!(err, FieldError::UnsupportedOption { .. }));
        assert!(field.set_option_value("on").is_err());
        assert!(field.add_fields(vec![]).is_err());
    }

    #[test]
    fn activation_flag_flips_once() {
        let mut field = text("title");
        assert!(field.mark_activated());
        assert!(!field.mark_activated());
        assert!(field.is_activated());
    }
}
