use indoc::indoc;
use saphyr_bind::{Budget, BudgetBreach, DocumentMeta, Error, Event, Value};

fn wrapped(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![
        Event::stream_start(),
        Event::document_start(DocumentMeta::default()),
    ];
    events.extend(body);
    events.push(Event::document_end());
    events.push(Event::stream_end());
    events
}

#[test]
fn parse_errors_have_locations() {
    let err = saphyr_bind::from_str::<Value>("a: [1, 2\nb: 3\n").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
    assert!(err.location().is_some());
}

#[test]
fn display_mentions_path_and_position() {
    let yaml = indoc! {"
        a:
          b: not-a-number
    "};
    let err = saphyr_bind::from_str::<std::collections::HashMap<String, std::collections::HashMap<String, i32>>>(yaml)
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("/a/b"), "{text}");
    assert!(text.contains("line 2"), "{text}");
}

#[test]
fn mismatched_collection_end_is_a_structure_error() {
    let events = wrapped(vec![Event::sequence_start(), Event::mapping_end()]);
    let err = saphyr_bind::from_events::<Value, _>(events).unwrap_err();
    assert!(matches!(err, Error::Structure { .. }), "{err}");
}

#[test]
fn truncated_stream_is_a_structure_error() {
    let events = vec![
        Event::stream_start(),
        Event::document_start(DocumentMeta::default()),
        Event::scalar("1"),
    ];
    let err = saphyr_bind::from_events::<Value, _>(events).unwrap_err();
    assert!(matches!(err, Error::Structure { .. }), "{err}");
}

#[test]
fn dangling_key_is_a_structure_error() {
    let events = wrapped(vec![
        Event::mapping_start(),
        Event::scalar("k"),
        Event::mapping_end(),
    ]);
    let err = saphyr_bind::from_events::<Value, _>(events).unwrap_err();
    assert!(matches!(err, Error::Structure { .. }), "{err}");
}

#[test]
fn empty_input_yields_the_zero_value() {
    let v: Value = saphyr_bind::from_str("").unwrap();
    assert_eq!(v, Value::Null);
    let v: Option<u8> = saphyr_bind::from_str("# only a comment\n").unwrap();
    assert_eq!(v, None);
}

#[test]
fn only_the_first_document_is_bound() {
    let v: Vec<u8> = saphyr_bind::from_str("[1]\n---\nnot: [a, sequence]\n").unwrap();
    assert_eq!(v, [1]);
}

#[test]
fn deep_nesting_trips_the_budget() {
    let yaml = format!("{}{}", "[".repeat(50), "]".repeat(50));
    let options = saphyr_bind::options! {
        budget: Some(Budget {
            max_depth: 10,
            ..Budget::default()
        }),
    };
    match saphyr_bind::from_str_with_options::<Value>(&yaml, options).unwrap_err() {
        Error::Budget { breach, .. } => assert!(matches!(breach, BudgetBreach::Depth { .. })),
        other => panic!("expected a budget error, got {other}"),
    }
}

#[test]
fn serde_errors_surface_as_messages() {
    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Port(u16);

    let value = Value::from("eighty");
    let err = saphyr_bind::from_value::<Port>(value).unwrap_err();
    assert!(matches!(err, Error::Message { .. }), "{err}");
}
