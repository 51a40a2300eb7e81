use indoc::indoc;
use saphyr_bind::{Number, Options, Value, Version};

fn bind(yaml: &str, options: Options) -> Value {
    saphyr_bind::from_str_with_options(yaml, options).expect("valid YAML")
}

#[test]
fn core_schema_literals() {
    let yaml = indoc! {r#"
        hex: 0x1F
        octal: 0o17
        nan: .NaN
        null_word: Null
        tilde: ~
        yes_word: yes
        truthy: True
        negative: -12
        exponent: 1e3
        leading_zero: "012"
        plain_leading_zero: 012
        fraction: .5
    "#};
    let v = bind(yaml, Options::default());

    assert_eq!(v.get("hex"), Some(&Value::Number(Number::U64(31))));
    assert_eq!(v.get("octal").and_then(Value::as_u64), Some(15));
    assert!(v.get("nan").and_then(Value::as_f64).is_some_and(f64::is_nan));
    assert_eq!(v.get("null_word"), Some(&Value::Null));
    assert_eq!(v.get("tilde"), Some(&Value::Null));
    assert_eq!(v.get("yes_word"), Some(&Value::from("yes")));
    assert_eq!(v.get("truthy"), Some(&Value::Bool(true)));
    assert_eq!(v.get("negative"), Some(&Value::from(-12i64)));
    assert_eq!(v.get("exponent"), Some(&Value::from(1000.0)));
    assert_eq!(v.get("leading_zero"), Some(&Value::from("012")));
    assert_eq!(v.get("plain_leading_zero"), Some(&Value::from("012")));
    assert_eq!(v.get("fraction"), Some(&Value::from(0.5)));
}

#[test]
fn missing_value_is_null() {
    let v = bind("a:\nb: 1\n", Options::default());
    assert_eq!(v.get("a"), Some(&Value::Null));
}

#[test]
fn quoting_suppresses_implicit_typing() {
    let yaml = indoc! {"
        - '1'
        - \"true\"
        - |
          null
    "};
    let v = bind(yaml, Options::default());
    let items = v.as_seq().expect("sequence").items();
    assert_eq!(items[0], Value::from("1"));
    assert_eq!(items[1], Value::from("true"));
    assert_eq!(items[2], Value::from("null\n"));
}

#[test]
fn yaml_1_1_booleans_follow_the_version() {
    let yaml = "[yes, Off, on, n]";
    let core = bind(yaml, Options::default());
    assert_eq!(core.as_seq().unwrap().items()[0], Value::from("yes"));

    let legacy = bind(
        yaml,
        saphyr_bind::options! { version: Some(Version::V1_1) },
    );
    let items: Vec<Option<bool>> = legacy
        .as_seq()
        .unwrap()
        .items()
        .iter()
        .map(Value::as_bool)
        .collect();
    assert_eq!(items, [Some(true), Some(false), Some(true), Some(false)]);
}

#[test]
fn failsafe_reads_everything_as_strings() {
    let v = bind(
        "[1, true, ~]",
        saphyr_bind::options! { schema: "failsafe".to_string() },
    );
    let items = v.as_seq().unwrap().items();
    assert_eq!(items, [Value::from("1"), Value::from("true"), Value::from("~")]);
}

#[test]
fn unknown_schema_falls_back_to_failsafe() {
    let v = bind(
        "42",
        saphyr_bind::options! { schema: "no-such-schema".to_string() },
    );
    assert_eq!(v, Value::from("42"));
}

#[test]
fn json_mode_uses_json_literals() {
    let options = || saphyr_bind::options! { json: saphyr_bind::JsonMode::Force };
    let v = bind("[true, True, 0x10, null]", options());
    let items = v.as_seq().unwrap().items();
    assert_eq!(items[0], Value::Bool(true));
    assert_eq!(items[1], Value::from("True"));
    assert_eq!(items[2], Value::from("0x10"));
    assert_eq!(items[3], Value::Null);

    let err = saphyr_bind::from_str_with_options::<Value>("a: &x 1\nb: *x\n", options())
        .unwrap_err();
    assert!(
        matches!(err, saphyr_bind::Error::CannotInferType { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn long_digit_runs_are_strings() {
    let digits = "1".repeat(300);
    let v = bind(&digits, Options::default());
    assert_eq!(v, Value::String(digits));
}

#[test]
fn signed_zero_is_a_string() {
    let v = bind("[-0, +0, 0, -0.5]", Options::default());
    let items = v.as_seq().unwrap().items();
    assert_eq!(items[0], Value::from("-0"));
    assert_eq!(items[1], Value::from("+0"));
    assert_eq!(items[2], Value::from(0i64));
    assert_eq!(items[3], Value::from(-0.5));
}
