//! Type registry and field factory.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::definition::{Classes, FieldDefinition};
use crate::error::{FieldError, Result};
use crate::field::{
    BasicKind, BrokenKind, CheckboxKind, ChoiceKind, ComplexKind, Field, FieldKind, MapKind,
};
use crate::host::{Host, TracingHost};
use crate::naming::normalize_type;

/// Builds a fresh kind instance for each field.
pub type KindFactory = Box<dyn Fn() -> Box<dyn FieldKind> + Send + Sync>;

/// Maps type names to field kinds.
///
/// Lookups normalize the type name, so `rich_text`, `Rich_Text` and
/// `rich text` resolve to the same entry.
pub struct FieldRegistry {
    kinds: BTreeMap<String, KindFactory>,
    host: Arc<dyn Host>,
}

impl FieldRegistry {
    /// Registry with no kinds registered.
    pub fn empty(host: Arc<dyn Host>) -> Self {
        Self {
            kinds: BTreeMap::new(),
            host,
        }
    }

    /// Registry holding every built-in kind.
    pub fn with_host(host: Arc<dyn Host>) -> Self {
        let mut registry = Self::empty(host);
        for type_name in [
            "text", "textarea", "rich_text", "hidden", "color", "date", "image", "file",
        ] {
            registry.register(type_name, move || Box::new(BasicKind::single(type_name)));
        }
        registry
            .register("media_gallery", || Box::new(BasicKind::multiple("media_gallery")))
            .register("checkbox", || Box::new(CheckboxKind::default()))
            .register("select", || Box::new(ChoiceKind::single("select")))
            .register("radio", || Box::new(ChoiceKind::single("radio")))
            .register("set", || Box::new(ChoiceKind::multiple("set")))
            .register("multiselect", || Box::new(ChoiceKind::multiple("multiselect")))
            .register("map", || Box::new(MapKind))
            .register("complex", || Box::new(ComplexKind::default()));
        registry
    }

    /// Adds or replaces the kind behind `type_name`.
    pub fn register<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn FieldKind> + Send + Sync + 'static,
    {
        self.kinds.insert(normalize_type(type_name), Box::new(factory));
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.kinds.contains_key(&normalize_type(type_name))
    }

    /// Normalized names of every registered kind.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Strict lookup.
    pub fn try_resolve(&self, type_name: &str) -> Result<Box<dyn FieldKind>> {
        self.kinds
            .get(&normalize_type(type_name))
            .map(|factory| factory())
            .ok_or_else(|| FieldError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Lookup that reports unknown types to the host and falls back to
    /// [`BrokenKind`].
    pub fn resolve(&self, type_name: &str) -> Box<dyn FieldKind> {
        self.try_resolve(type_name).unwrap_or_else(|error| {
            warn!(type_name, "unknown field type, using broken field");
            self.host.report_error(&error);
            Box::new(BrokenKind::new(type_name))
        })
    }

    /// Creates a field of `type_name`. Unknown types yield a broken field;
    /// invalid names are returned as errors.
    pub fn factory(&self, type_name: &str, name: &str, label: Option<&str>) -> Result<Field> {
        Field::new(self.resolve(type_name), name, label)
    }

    /// Alias of [`FieldRegistry::factory`].
    pub fn make(&self, type_name: &str, name: &str, label: Option<&str>) -> Result<Field> {
        self.factory(type_name, name, label)
    }

    /// Creates and configures a field from a declarative definition.
    pub fn build(&self, definition: &FieldDefinition) -> Result<Field> {
        let mut field = self.factory(
            &definition.kind,
            &definition.name,
            definition.label.as_deref(),
        )?;

        if let Some(prefix) = &definition.name_prefix {
            field.set_name_prefix(prefix)?;
        }
        if let Some(help_text) = &definition.help_text {
            field.set_help_text(help_text.clone());
        }
        if let Some(default_value) = &definition.default_value {
            field.set_default_value(default_value.clone());
        }
        if let Some(width) = definition.width {
            field.set_width(width);
        }
        match &definition.classes {
            Some(Classes::Text(classes)) => {
                field.set_classes([classes]);
            }
            Some(Classes::List(classes)) => {
                field.set_classes(classes);
            }
            None => {}
        }
        if let Some(context) = &definition.context {
            field.set_context(context.clone());
        }
        field
            .set_required(definition.required)
            .set_autoload(definition.autoload)
            .set_lazyload(definition.lazyload)
            .set_visible_in_rest_api(definition.visible_in_rest_api);

        if let Some(options) = &definition.options {
            field.set_options(options.clone())?;
        }
        if let Some(option_value) = &definition.option_value {
            field.set_option_value(option_value.clone())?;
        }
        if let Some(rules) = definition
            .conditional_logic
            .as_ref()
            .filter(|rules| !rules.is_null())
        {
            field.set_conditional_logic(rules)?;
        }
        if !definition.fields.is_empty() {
            let children = definition
                .fields
                .iter()
                .map(|child| self.build(child))
                .collect::<Result<Vec<_>>>()?;
            field.add_fields(children)?;
        }
        Ok(field)
    }

    /// Builds every definition, stopping at the first error.
    pub fn build_all(&self, definitions: &[FieldDefinition]) -> Result<Vec<Field>> {
        definitions.iter().map(|definition| self.build(definition)).collect()
    }

    /// Parses definitions from a JSON array and builds them.
    pub fn build_from_json(
        &self,
        definitions: &Value,
    ) -> std::result::Result<Vec<Field>, BuildError> {
        let definitions: Vec<FieldDefinition> = serde_json::from_value(definitions.clone())?;
        Ok(self.build_all(&definitions)?)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_host(Arc::new(TracingHost))
    }
}

/// Failure while turning raw JSON definitions into fields.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to parse field definitions: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Field(#[from] FieldError),
}
