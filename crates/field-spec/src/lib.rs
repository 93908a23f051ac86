#![allow(missing_docs)]

pub mod conditional;
pub mod datastore;
pub mod definition;
pub mod error;
pub mod field;
pub mod hooks;
pub mod host;
pub mod naming;
pub mod projection;
pub mod registry;
pub mod value;

pub use conditional::{
    Compare, ConditionalLogic, ConditionalRule, Relation, VisibilityMap, parse_conditional_rules,
    parse_conditional_rules_with, resolve_visibility,
};
pub use datastore::{Datastore, DatastoreError, MemoryDatastore, ValueTree};
pub use definition::{Classes, FieldDefinition, definition_schema};
pub use error::{FieldError, Result};
pub use field::{
    BasicKind, BrokenKind, CheckboxKind, ChoiceKind, ComplexKind, Field, FieldKind, FieldOption,
    MapKind,
};
pub use hooks::{DefaultHooks, FieldHooks};
pub use host::{Activator, Host, TracingHost};
pub use projection::{FieldProjection, projection_schema};
pub use registry::{BuildError, FieldRegistry, KindFactory};
pub use value::{ValueSet, ValueShape};
