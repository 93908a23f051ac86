use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use field_spec::{
    Activator, FieldDefinition, FieldError, FieldRegistry, Host, resolve_visibility,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "post_meta" => include_str!("../tests/fixtures/post_meta.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn post_meta() -> Vec<FieldDefinition> {
    serde_json::from_str(fixture("post_meta")).expect("deserialize")
}

#[derive(Default)]
struct CountingHost {
    templates: Mutex<Vec<String>>,
    assets: Mutex<Vec<String>>,
}

impl Host for CountingHost {
    fn register_template(&self, type_name: &str) {
        self.templates.lock().expect("lock").push(type_name.into());
    }

    fn enqueue_assets(&self, type_name: &str) {
        self.assets.lock().expect("lock").push(type_name.into());
    }

    fn report_error(&self, _error: &FieldError) {}
}

#[test]
fn fixture_builds_every_field() {
    let registry = FieldRegistry::default();
    let fields = registry.build_all(&post_meta()).expect("build");
    let types: Vec<_> = fields.iter().map(|field| field.type_name()).collect();
    assert_eq!(types, vec!["text", "checkbox", "media_gallery", "complex"]);
    assert_eq!(fields[3].children().len(), 2);
    assert_eq!(fields[3].classes(), &["slides", "wide"]);
}

#[test]
fn projections_follow_the_contract() {
    let registry = FieldRegistry::default();
    let mut fields = registry.build_all(&post_meta()).expect("build");

    let subtitle = fields[0].to_json(false).expect("project");
    assert_eq!(subtitle["name"], "_crb_subtitle");
    assert_eq!(subtitle["base_name"], "crb_subtitle");
    assert_eq!(subtitle["label"], "Subtitle");
    assert_eq!(subtitle["value"], "Untitled");
    assert_eq!(subtitle["help_text"], "Shown below the post title");

    let checkbox = fields[1].to_json(false).expect("project");
    assert_eq!(checkbox["value"], Value::Bool(false));
    assert_eq!(checkbox["option_value"], "yes");

    let gallery = fields[2].to_json(false).expect("project");
    assert_eq!(gallery["conditional_logic"]["relation"], "AND");
    assert_eq!(gallery["conditional_logic"]["rules"][0]["compare"], "=");

    let slides = fields[3].to_json(false).expect("project");
    let children = slides["fields"].as_array().expect("fields");
    assert_eq!(children.len(), 2);
    assert_eq!(children[1]["type"], "image");
}

#[test]
fn visibility_follows_sibling_values() {
    let registry = FieldRegistry::default();
    let fields = registry.build_all(&post_meta()).expect("build");

    let values = json!({ "crb_show_gallery": "" });
    let hidden = resolve_visibility(&fields, values.as_object().expect("object"));
    assert_eq!(hidden.get("crb_gallery"), Some(&false));
    assert_eq!(hidden.get("crb_subtitle"), Some(&true));

    let values = json!({ "crb_show_gallery": "yes" });
    let shown = resolve_visibility(&fields, values.as_object().expect("object"));
    assert_eq!(shown.get("crb_gallery"), Some(&true));
}

#[test]
fn activation_registers_each_type_once() {
    let host = Arc::new(CountingHost::default());
    let registry = FieldRegistry::with_host(host.clone());
    let mut fields = registry
        .build_all(&[
            FieldDefinition::new("text", "first"),
            FieldDefinition::new("text", "second"),
            FieldDefinition::new("map", "location"),
        ])
        .expect("build");

    let mut activator = Activator::new(host.clone());
    for field in fields.iter_mut() {
        assert!(activator.activate(field));
        assert!(!activator.activate(field));
    }

    assert_eq!(*host.templates.lock().expect("lock"), vec!["text", "map"]);
    assert_eq!(*host.assets.lock().expect("lock"), vec!["text", "map"]);
    assert!(activator.is_type_activated("map"));
}

#[test]
fn activating_a_complex_tree_reaches_children() {
    let host = Arc::new(CountingHost::default());
    let registry = FieldRegistry::with_host(host.clone());
    let mut fields = registry.build_all(&post_meta()).expect("build");
    let mut activator = Activator::new(host.clone());
    activator.activate_tree(&mut fields[3]);

    assert_eq!(
        *host.templates.lock().expect("lock"),
        vec!["complex", "text", "image"]
    );
    assert!(fields[3].children().iter().all(|child| child.is_activated()));
}

#[test]
fn invalid_rules_in_definitions_are_rejected() {
    let registry = FieldRegistry::default();
    let mut definition = FieldDefinition::new("text", "title");
    definition.conditional_logic = Some(json!({
        "rules": [{ "field": "kind", "compare": "IN", "value": "x" }]
    }));
    assert!(matches!(
        registry.build(&definition),
        Err(FieldError::ExpectedSequence { .. })
    ));
}
