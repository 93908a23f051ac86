//! Host platform seam.
//!
//! Template registration, asset enqueueing and error surfacing belong to the
//! surrounding application. The core only promises that a field is activated
//! once and that each type's template and assets are registered once.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::FieldError;
use crate::field::Field;

pub trait Host: Send + Sync {
    /// Registers the render template for a field type.
    fn register_template(&self, type_name: &str);

    /// Enqueues scripts and styles needed by a field type.
    fn enqueue_assets(&self, type_name: &str);

    /// Surfaces a configuration error to the developer.
    fn report_error(&self, error: &FieldError) {
        warn!(error = %error, "field configuration error");
    }
}

/// Host that only logs what it is asked to do.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHost;

impl Host for TracingHost {
    fn register_template(&self, type_name: &str) {
        debug!(type_name, "register field template");
    }

    fn enqueue_assets(&self, type_name: &str) {
        debug!(type_name, "enqueue field assets");
    }
}

/// Tracks which fields and field types have been activated.
pub struct Activator {
    host: Arc<dyn Host>,
    activated_types: BTreeSet<String>,
}

impl Activator {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            activated_types: BTreeSet::new(),
        }
    }

    /// Activates `field`. Returns `false` when it was already active.
    pub fn activate(&mut self, field: &mut Field) -> bool {
        if !field.mark_activated() {
            return false;
        }
        let type_name = field.type_name();
        if self.activated_types.insert(type_name.to_string()) {
            self.host.register_template(type_name);
            self.host.enqueue_assets(type_name);
        }
        debug!(id = field.id(), type_name, "field activated");
        true
    }

    /// Activates a field and every child template it carries.
    pub fn activate_tree(&mut self, field: &mut Field) {
        self.activate(field);
        for child in field.children_mut() {
            self.activate_tree(child);
        }
    }

    pub fn is_type_activated(&self, type_name: &str) -> bool {
        self.activated_types.contains(type_name)
    }
}

impl Default for Activator {
    fn default() -> Self {
        Self::new(Arc::new(TracingHost))
    }
}
