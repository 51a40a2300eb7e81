use std::collections::BTreeMap;

use indoc::indoc;
use saphyr_bind::{
    EventKind, Field, ScalarStyle, SerializerOptions, Shape, Shaped, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Config {
    name: String,
    version: String,
    port: u16,
    ratio: f64,
    enabled: bool,
    note: Option<String>,
    tags: Vec<String>,
    limits: BTreeMap<String, i64>,
}

impl Shaped for Config {
    fn shape() -> Shape {
        Shape::record::<Self>(|| {
            vec![
                Field::of::<String>("name"),
                Field::of::<String>("version"),
                Field::of::<u16>("port"),
                Field::of::<f64>("ratio"),
                Field::of::<bool>("enabled"),
                Field::of::<Option<String>>("note"),
                Field::of::<Vec<String>>("tags"),
                Field::of::<BTreeMap<String, i64>>("limits"),
            ]
        })
    }
}

fn sample() -> Config {
    Config {
        name: "api: v2".into(),
        version: "1.10".into(),
        port: 8443,
        ratio: 0.75,
        enabled: true,
        note: None,
        tags: vec!["yes".into(), "".into(), "plain".into()],
        limits: BTreeMap::from([("cpu".into(), -2), ("mem".into(), 512)]),
    }
}

#[test]
fn typed_value_round_trips() {
    let original = sample();
    let events = saphyr_bind::to_events(&original).unwrap();
    let back: Config = saphyr_bind::from_events(events).unwrap();
    assert_eq!(back, original);
}

#[test]
fn generic_value_round_trips() {
    let yaml = indoc! {"
        name: demo
        count: 3
        ratio: 2.5
        flags: [true, false]
        nothing: ~
        quoted: '123'
        nested:
          - {a: 1}
          - [x, 2]
    "};
    let value: Value = saphyr_bind::from_str(yaml).unwrap();
    let events = saphyr_bind::value_to_events(&value, SerializerOptions::default()).unwrap();
    let back: Value = saphyr_bind::from_events(events).unwrap();
    assert_eq!(back, value);
}

#[test]
fn bound_record_round_trips_through_value_events() {
    let yaml = indoc! {"
        name: n
        version: '2'
        port: 1
        ratio: 1.0
        enabled: false
        note: hello
        tags: []
        limits: {}
    "};
    let value = saphyr_bind::Decoder::new(Default::default())
        .decode_value(saphyr_bind::LiveEvents::from_str(yaml), &Config::shape())
        .unwrap();
    let events = saphyr_bind::value_to_events(&value, SerializerOptions::default()).unwrap();
    let back: Config = saphyr_bind::from_events(events).unwrap();
    assert_eq!(back, saphyr_bind::from_value::<Config>(value).unwrap());
    assert_eq!(back.version, "2");
}

#[test]
fn record_flags_shape_the_output() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Flagged {
        id: u32,
        secret: String,
        comment: String,
    }

    impl Shaped for Flagged {
        fn shape() -> Shape {
            Shape::record::<Self>(|| {
                vec![
                    Field::of::<u32>("id").rename("ID").as_string(),
                    Field::of::<String>("secret").ignored(),
                    Field::of::<String>("comment").omit_empty(),
                ]
            })
        }
    }

    let value = saphyr_bind::Decoder::new(Default::default())
        .decode_value(saphyr_bind::LiveEvents::from_str("ID: '7'\n"), &Flagged::shape())
        .unwrap();
    let events = saphyr_bind::value_to_events(&value, SerializerOptions::default()).unwrap();
    let body: Vec<(EventKind, Option<&str>, ScalarStyle)> = events[2..events.len() - 2]
        .iter()
        .map(|e| (e.kind, e.text(), e.style))
        .collect();
    assert_eq!(
        body,
        [
            (EventKind::MappingStart, None, ScalarStyle::Plain),
            (EventKind::Scalar, Some("ID"), ScalarStyle::Plain),
            (EventKind::Scalar, Some("7"), ScalarStyle::DoubleQuoted),
            (EventKind::MappingEnd, None, ScalarStyle::Plain),
        ]
    );
}

#[test]
fn float_text_keeps_its_type() {
    let events = saphyr_bind::to_events(&vec![1.0f64, 4.0e-6, f64::NEG_INFINITY]).unwrap();
    let texts: Vec<&str> = events.iter().filter_map(|e| e.text()).collect();
    assert_eq!(texts[0], "1.0");
    assert!(texts[1].contains('.'), "{}", texts[1]);
    assert_eq!(texts[2], "-.inf");

    let back: Vec<f64> = saphyr_bind::from_events(events).unwrap();
    assert_eq!(back[1], 4.0e-6);
}

#[test]
fn cyclic_depth_is_rejected() {
    let mut value = Value::Null;
    for _ in 0..64 {
        value = Value::Seq(saphyr_bind::Sequence::from_items(Shape::Any, vec![value]));
    }
    let options = saphyr_bind::ser_options! { max_depth: 16 };
    assert!(saphyr_bind::value_to_events(&value, options).is_err());
}

#[test]
fn bound_values_feed_other_serde_formats() {
    let value: Value = saphyr_bind::from_str("{name: demo, ports: [80, 443], tls: ~}").unwrap();
    let json: serde_json::Value = saphyr_bind::from_value(value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"name": "demo", "ports": [80, 443], "tls": null})
    );
}
