use std::sync::Arc;

use saphyr_bind::{
    Decoder, DocumentMeta, Error, Flavor, LiveEvents, Options, Schema, SchemaRegistry, Shape,
    Value, Version, YamlSchema,
};

#[test]
fn list_orders_by_priority_then_registration() {
    let registry = SchemaRegistry::new();
    registry
        .register(Arc::new(YamlSchema::custom("failsafe", &[], 0, Flavor::Failsafe)))
        .unwrap();
    registry
        .register(Arc::new(YamlSchema::custom("1.1", &[], 1, Flavor::V1_1)))
        .unwrap();
    registry
        .register(Arc::new(YamlSchema::custom("core", &[], 10, Flavor::Core)))
        .unwrap();
    registry
        .register(Arc::new(YamlSchema::custom("legacy", &[], 1, Flavor::V1_1)))
        .unwrap();
    assert_eq!(registry.list(), ["core", "1.1", "legacy", "failsafe"]);
}

#[test]
fn duplicate_registration_fails() {
    let registry = SchemaRegistry::with_builtins();
    let err = registry.register(Arc::new(YamlSchema::core())).unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }));
    assert!(matches!(
        registry.lookup("missing"),
        Err(Error::SchemaNotFound { .. })
    ));
}

#[test]
fn custom_registry_drives_auto_selection() {
    // Without `auto`, the highest priority schema handles every document.
    let registry = Arc::new(SchemaRegistry::new());
    registry.register(Arc::new(YamlSchema::failsafe())).unwrap();
    registry
        .register(Arc::new(YamlSchema::custom("legacy", &[], 5, Flavor::V1_1)))
        .unwrap();
    let decoder = Decoder::with_registry(Options::default(), Arc::clone(&registry));
    let value = decoder
        .decode_value(LiveEvents::from_str("on"), &Shape::Any)
        .unwrap();
    assert_eq!(value, Value::Bool(true));

    let legacy = registry.lookup("legacy").unwrap();
    registry.unregister(legacy.as_ref());
    let value = decoder
        .decode_value(LiveEvents::from_str("on"), &Shape::Any)
        .unwrap();
    assert_eq!(value, Value::from("on"));
}

#[test]
fn empty_registry_cannot_bind() {
    let decoder = Decoder::with_registry(Options::default(), Arc::new(SchemaRegistry::new()));
    let err = decoder
        .decode_value(LiveEvents::from_str("1"), &Shape::Any)
        .unwrap_err();
    assert!(matches!(err, Error::NoSchemaAvailable { .. }), "{err}");
}

#[test]
fn auto_selects_by_version_and_json_flag() {
    let registry = SchemaRegistry::with_builtins();
    let pick = |version, json| {
        registry
            .select("auto", &DocumentMeta { version, json })
            .unwrap()
            .name()
            .to_string()
    };
    assert_eq!(pick(Version::V1_2, false), "core");
    assert_eq!(pick(Version::V1_1, false), "1.1");
    assert_eq!(pick(Version::V1_3, false), "1.3");
    assert_eq!(pick(Version::V1_2, true), "json");
}

#[test]
fn explicit_schema_name_wins_over_metadata() {
    let options = saphyr_bind::options! {
        schema: "core".to_string(),
        version: Some(Version::V1_1),
    };
    let value: Value = saphyr_bind::from_str_with_options("yes", options).unwrap();
    assert_eq!(value, Value::from("yes"));
}

#[test]
fn explicit_tags_override_implicit_typing() {
    let value: Value = saphyr_bind::from_str("[!!str 12, !!int '7', !!float 3]").unwrap();
    let items = value.as_seq().unwrap().items();
    assert_eq!(items[0], Value::from("12"));
    assert_eq!(items[1], Value::from(7i64));
    assert_eq!(items[2], Value::from(3.0));

    let err = saphyr_bind::from_str::<Value>("!!bool maybe").unwrap_err();
    assert!(matches!(err, Error::InvalidScalarLiteral { .. }), "{err}");

    let err = saphyr_bind::from_str::<String>("!!int 5").unwrap_err();
    assert!(matches!(err, Error::TargetKindMismatch { .. }), "{err}");
}

#[test]
fn schemas_are_shareable_across_threads() {
    let registry = Arc::new(SchemaRegistry::with_builtins());
    let decoder = Decoder::with_registry(Options::default(), registry);
    std::thread::scope(|scope| {
        for i in 0..4 {
            let decoder = &decoder;
            scope.spawn(move || {
                let text = format!("[{i}, {i}]");
                let value = decoder
                    .decode_value(LiveEvents::from_str(&text), &Shape::Any)
                    .unwrap();
                assert_eq!(value.as_seq().unwrap().len(), 2);
            });
        }
    });
}

#[test]
fn schema_trait_exposes_metadata() {
    let core = YamlSchema::core();
    assert_eq!(core.name(), "core");
    assert_eq!(core.aliases(), ["1.2"]);
    assert!(core.priority() > YamlSchema::yaml_1_1().priority());
    assert!(!core.description().is_empty());
}
