use saphyr_bind::{SerializerOptions, Value};

#[test]
fn json_null() {
    let original: Option<String> = None;
    let options = saphyr_bind::ser_options! { json_null: true };
    let events = saphyr_bind::to_events_with_options(&original, options).unwrap();
    assert_eq!(events[2].text(), Some("null"));

    let into_option: Option<String> = saphyr_bind::from_events(events.clone()).unwrap();
    let into_value: Value = saphyr_bind::from_events(events).unwrap();
    assert_eq!(into_option, None);
    assert_eq!(into_value, Value::Null);
}

#[test]
fn tilde_by_default() {
    let events = saphyr_bind::to_events(&()).unwrap();
    assert_eq!(events[2].text(), Some("~"));

    let events = saphyr_bind::value_to_events(&Value::Null, SerializerOptions::default()).unwrap();
    assert_eq!(events[2].text(), Some("~"));
}

#[test]
fn json_schema_only_reads_null_spelled_out() {
    let options = saphyr_bind::options! { json: saphyr_bind::JsonMode::Force };
    let value: Value = saphyr_bind::from_str_with_options("[null, ~]", options).unwrap();
    let items = value.as_seq().unwrap().items();
    assert_eq!(items[0], Value::Null);
    assert_eq!(items[1], Value::from("~"));
}
