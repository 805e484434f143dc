//! Tests for the validation cascade: nested schema-bearing attributes,
//! aggregate validity, and on-invalid callback semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use triage::{Attr, FieldError, Format, Instance, Kind, MappingSchema};

fn treasure_schema() -> Arc<MappingSchema> {
    MappingSchema::builder()
        .requires("type", Kind::Str)
        .requires("weight", Kind::Int)
        .requires("unit", Kind::Str)
        .build()
        .unwrap()
}

fn chest_schema(treasure: Arc<MappingSchema>) -> Arc<MappingSchema> {
    MappingSchema::builder()
        .root("['ocean']['sea_floor']['treasure_chest']['hidden_compartment']")
        .requires("treasure", Kind::nested(treasure))
        .build()
        .unwrap()
}

const WITH_TREASURE: &str = r#"{"ocean":{"sea_floor":{"treasure_chest":{"hidden_compartment":{"treasure":{"type":"Gold","weight":1,"unit":"Ton"}}}}}}"#;
const WITHOUT_TREASURE: &str = r#"{"ocean":{"sea_floor":{"treasure_chest":{"hidden_compartment":{"treasure":{"type":null,"weight":null,"unit":null}}}}}}"#;

#[test]
fn test_nested_attribute_is_mapped_and_typed() {
    let schema = chest_schema(treasure_schema());
    let chest = Instance::new(schema, Format::Json, WITH_TREASURE).unwrap();

    let treasure = chest.get("treasure").and_then(Attr::as_nested).unwrap();
    assert_eq!(treasure.get("type").and_then(Attr::as_str), Some("Gold"));
    assert_eq!(treasure.get("weight").and_then(Attr::as_int), Some(1));
    assert_eq!(treasure.get("unit").and_then(Attr::as_str), Some("Ton"));
}

#[test]
fn test_valid_nested_object_makes_outer_valid() {
    let schema = chest_schema(treasure_schema());
    let chest = Instance::new(schema, Format::Json, WITH_TREASURE).unwrap();
    assert!(chest.is_valid(true));
    assert!(!chest.is_invalid(true));
}

#[test]
fn test_invalid_nested_object_makes_outer_invalid() {
    let schema = chest_schema(treasure_schema());
    let chest = Instance::new(schema, Format::Json, WITHOUT_TREASURE).unwrap();
    assert!(!chest.is_valid(false));

    // leaf-level detail is still reachable on the nested instance
    let treasure = chest.get("treasure").and_then(Attr::as_nested).unwrap();
    assert_eq!(treasure.errors().len(), 3);
}

#[test]
fn test_missing_nested_subtree_is_invalid() {
    let schema = chest_schema(treasure_schema());
    let chest = Instance::new(schema, Format::Json, r#"{"ocean":{}}"#).unwrap();
    assert!(chest.get("treasure").unwrap().is_blank());
    assert!(!chest.is_valid(false));
}

#[test]
fn test_nested_validity_overrides_own_field_rules() {
    // With at least one nested-validatable attribute, the instance is valid
    // whenever all of them are, even though its own required field is blank.
    // Deliberate, long-standing behavior; see the schema docs.
    let schema = MappingSchema::builder()
        .root("['ocean']['sea_floor']['treasure_chest']['hidden_compartment']")
        .requires("captain", Kind::Str)
        .requires("treasure", Kind::nested(treasure_schema()))
        .build()
        .unwrap();

    let chest = Instance::new(schema, Format::Json, WITH_TREASURE).unwrap();
    assert!(chest.is_valid(true));
    // the field-level aggregate still reports the blank field
    assert_eq!(chest.errors().len(), 1);
    assert_eq!(chest.errors()[0].attribute, "captain");
}

#[test]
fn test_base_case_reduces_to_field_rules() {
    // no nested-validatable attributes: validity is exactly the rule aggregate
    let schema = treasure_schema();
    let valid = Instance::new(
        schema.clone(),
        Format::Json,
        r#"{"type":"Gold","weight":1,"unit":"Ton"}"#,
    )
    .unwrap();
    assert!(valid.is_valid(true));

    let invalid = Instance::new(schema, Format::Json, r#"{"type":"Gold"}"#).unwrap();
    assert!(!invalid.is_valid(true));
}

#[test]
fn test_callback_fires_exactly_once_when_invalid() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let schema = MappingSchema::builder()
        .root("['ocean']['sea_floor']['treasure_chest']['hidden_compartment']")
        .requires("treasure", Kind::nested(treasure_schema()))
        .on_invalid(move |_tree, _errors| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let chest = Instance::new(schema, Format::Json, WITHOUT_TREASURE).unwrap();
    assert!(!chest.is_valid(true));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // each query re-fires at most once
    assert!(chest.is_invalid(true));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_callback_suppressed_when_disabled() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let schema = MappingSchema::builder()
        .requires("foo", Kind::Str)
        .on_invalid(move |_tree, _errors| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let instance = Instance::new(schema, Format::Json, r#"{"foo":null}"#).unwrap();
    assert!(!instance.is_valid(false));
    assert!(instance.is_invalid(false));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_callback_not_fired_when_valid() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let schema = MappingSchema::builder()
        .requires("foo", Kind::Str)
        .on_invalid(move |_tree, _errors| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let instance = Instance::new(schema, Format::Json, r#"{"foo":"bar"}"#).unwrap();
    assert!(instance.is_valid(true));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_absent_callback_is_a_no_op() {
    let schema = MappingSchema::builder()
        .requires("foo", Kind::Str)
        .build()
        .unwrap();
    let instance = Instance::new(schema, Format::Json, r#"{"foo":null}"#).unwrap();
    // no callback declared; querying must not panic
    assert!(instance.is_invalid(true));
}

#[test]
fn test_only_top_level_callback_fires() {
    let nested_count = Arc::new(AtomicUsize::new(0));
    let nested_seen = Arc::clone(&nested_count);
    let treasure = MappingSchema::builder()
        .requires("type", Kind::Str)
        .requires("weight", Kind::Int)
        .requires("unit", Kind::Str)
        .on_invalid(move |_tree, _errors| {
            nested_seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let outer_count = Arc::new(AtomicUsize::new(0));
    let outer_seen = Arc::clone(&outer_count);
    let schema = MappingSchema::builder()
        .root("['ocean']['sea_floor']['treasure_chest']['hidden_compartment']")
        .requires("treasure", Kind::nested(treasure))
        .on_invalid(move |_tree, _errors| {
            outer_seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let chest = Instance::new(schema, Format::Json, WITHOUT_TREASURE).unwrap();
    assert!(!chest.is_valid(true));
    assert_eq!(outer_count.load(Ordering::SeqCst), 1);
    assert_eq!(nested_count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_callback_receives_tree_and_field_errors() {
    let captured: Arc<Mutex<Option<(Value, Vec<FieldError>)>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let schema = MappingSchema::builder()
        .requires("foo", Kind::Str)
        .requires("n", Kind::Int)
        .on_invalid(move |tree, errors| {
            *sink.lock().unwrap() = Some((tree.clone(), errors.to_vec()));
        })
        .build()
        .unwrap();

    let instance = Instance::new(schema, Format::Json, r#"{"foo":null}"#).unwrap();
    assert!(!instance.is_valid(true));

    let (tree, errors) = captured.lock().unwrap().take().unwrap();
    assert_eq!(tree, json!({"foo": null}));
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.attribute == "foo"));
    assert!(errors.iter().any(|e| e.attribute == "n"));
}

#[test]
fn test_xml_end_to_end_cascade() {
    let schema = MappingSchema::builder()
        .root("['chest']")
        .requires("treasure", Kind::nested(treasure_schema()))
        .build()
        .unwrap();

    let payload = "<chest><treasure><type>Gold</type><weight>1</weight><unit>Ton</unit></treasure></chest>";
    let chest = Instance::new(schema.clone(), Format::Xml, payload).unwrap();
    assert!(chest.is_valid(true));

    let empty = "<chest><treasure><type></type><weight></weight><unit></unit></treasure></chest>";
    let chest = Instance::new(schema, Format::Xml, empty).unwrap();
    assert!(!chest.is_valid(true));
}
