use std::collections::BTreeMap;

use ravro::{Schema, Value, default_api, marshal, unmarshal};

#[test]
fn default_api_is_a_single_instance() {
    assert!(std::ptr::eq(default_api(), default_api()));
    assert_eq!(default_api().config(), &ravro::Config::default());
}

#[test]
fn free_functions_use_the_default_api() {
    let schema = Schema::map(Schema::string());
    let value = Value::Map(BTreeMap::from([("k".to_string(), Value::string("v"))]));
    let data = marshal(&schema, &value).unwrap();
    assert_eq!(&data[..], [0x02, 0x02, b'k', 0x02, b'v', 0x00]);

    let mut back = Value::Null;
    unmarshal(&schema, data, &mut back).unwrap();
    assert_eq!(back, value);
    assert!(default_api().stats().encoders >= 1);
}
