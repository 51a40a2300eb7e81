use saphyr_bind::{Error, Number, Value};

#[test]
fn precision_boundaries() {
    let err = saphyr_bind::from_str::<u8>("256").unwrap_err();
    match err {
        Error::NumericOverflow { text, .. } => assert_eq!(text, "256"),
        other => panic!("expected NumericOverflow, got {other}"),
    }
    assert_eq!(saphyr_bind::from_str::<u8>("255").unwrap(), 255);
    assert_eq!(saphyr_bind::from_str::<i8>("-128").unwrap(), -128);
    assert!(saphyr_bind::from_str::<i8>("128").is_err());

    let generic: Value = saphyr_bind::from_str("256").unwrap();
    assert_eq!(generic, Value::Number(Number::I64(256)));
}

#[test]
fn generic_integers_widen_to_unsigned() {
    let v: Value = saphyr_bind::from_str("[-1, 18446744073709551615]").unwrap();
    let items = v.as_seq().unwrap().items();
    assert_eq!(items[0], Value::Number(Number::I64(-1)));
    assert_eq!(items[1], Value::Number(Number::U64(u64::MAX)));

    let err = saphyr_bind::from_str::<Value>("18446744073709551616").unwrap_err();
    assert!(matches!(err, Error::NumericOverflow { .. }), "{err}");
}

#[test]
fn prefixed_integers() {
    assert_eq!(saphyr_bind::from_str::<u8>("0xff").unwrap(), 255);
    assert_eq!(saphyr_bind::from_str::<u16>("0o777").unwrap(), 511);
    assert!(saphyr_bind::from_str::<u8>("0x100").is_err());
}

#[test]
fn floats_by_target_precision() {
    assert_eq!(saphyr_bind::from_str::<f32>("1.5").unwrap(), 1.5f32);
    assert_eq!(saphyr_bind::from_str::<f64>("-2.5e-3").unwrap(), -0.0025);
    assert!(saphyr_bind::from_str::<f64>(".inf").unwrap().is_infinite());
    assert!(saphyr_bind::from_str::<f64>("-.Inf").unwrap().is_sign_negative());
    assert!(saphyr_bind::from_str::<f64>(".nan").unwrap().is_nan());
    // Integer text fits a float slot.
    assert_eq!(saphyr_bind::from_str::<f64>("42").unwrap(), 42.0);
}

#[test]
fn malformed_numbers_are_invalid_literals() {
    let err = saphyr_bind::from_str::<i32>("12abc").unwrap_err();
    assert!(matches!(err, Error::InvalidScalarLiteral { .. }), "{err}");

    let err = saphyr_bind::from_str::<f64>("1.2.3").unwrap_err();
    assert!(matches!(err, Error::InvalidScalarLiteral { .. }), "{err}");

    let err = saphyr_bind::from_str::<bool>("maybe").unwrap_err();
    assert!(matches!(err, Error::InvalidScalarLiteral { .. }), "{err}");
}

#[test]
fn optional_numbers() {
    assert_eq!(saphyr_bind::from_str::<Option<u8>>("~").unwrap(), None);
    assert_eq!(saphyr_bind::from_str::<Option<u8>>("7").unwrap(), Some(7));
    assert_eq!(saphyr_bind::from_str::<Vec<Option<i32>>>("[1, null, 3]").unwrap(), [Some(1), None, Some(3)]);
}
