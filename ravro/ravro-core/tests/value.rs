use ravro_core::Value;

#[test]
fn value_string_creates_arc_str_value() {
    let Value::String(s) = Value::string("hello") else {
        panic!("unexpected value variant");
    };
    assert_eq!(&*s, "hello");
}

#[test]
fn record_keeps_field_order() {
    let value = Value::record([("b", Value::Int(1)), ("a", Value::Int(2))]);
    let Value::Record(fields) = &value else {
        panic!("expected record");
    };
    assert_eq!(fields[0].0, "b");
    assert_eq!(value.field("a"), Some(&Value::Int(2)));
    assert_eq!(value.field("c"), None);
}

#[test]
fn typed_accessors_widen_where_lossless() {
    assert_eq!(Value::Int(5).try_i64(), Ok(Some(5)));
    assert_eq!(Value::Float(0.5).try_f64(), Ok(Some(0.5)));
    assert_eq!(Value::symbol("RED").try_str(), Ok(Some("RED")));
    assert_eq!(Value::Null.try_bool(), Ok(None));
}

#[test]
fn typed_accessors_report_mismatch() {
    let err = Value::Long(1).try_i32().unwrap_err();
    assert_eq!(err.expected, "Int");
    assert_eq!(err.actual, "Long");
}
