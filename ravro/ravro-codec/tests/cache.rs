use std::{sync::Arc, thread};

use proptest::prelude::*;
use ravro_codec::{Api, Config, Descriptor, Field, Reader, Schema, Value};

#[test]
fn repeated_lookups_share_one_codec() {
    let api = Api::default();
    let schema = Schema::array(Schema::long());
    let first = api.decoder_of(&schema, Descriptor::of::<Vec<i64>>());
    let second = api.decoder_of(&schema, Descriptor::of::<Vec<i64>>());
    assert!(Arc::ptr_eq(&first, &second));

    let stats = api.stats();
    assert_eq!(stats.builds, 1);
    assert_eq!(stats.decoders, 1);
    assert_eq!(stats.encoders, 0);
}

#[test]
fn structurally_equal_schemas_share_a_cache_entry() {
    let api = Api::default();
    let a = api.encoder_of(&Schema::map(Schema::int()), Descriptor::of::<Value>());
    let b = api.encoder_of(&Schema::map(Schema::int()), Descriptor::of::<Value>());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(api.stats().builds, 1);
}

#[test]
fn native_type_is_part_of_the_key() {
    let api = Api::default();
    let schema = Schema::long();
    let wide = api.decoder_of(&schema, Descriptor::of::<i64>());
    let generic = api.decoder_of(&schema, Descriptor::of::<Value>());
    assert!(!Arc::ptr_eq(&wide, &generic));
    assert_eq!(api.stats().decoders, 2);
}

#[test]
fn defaults_are_part_of_the_key() {
    let api = Api::default();
    let point = |default: i32| {
        Schema::record(
            "P",
            [Field::new("x", Schema::int()).with_default(Value::Int(default))],
        )
    };
    let one = api.encoder_of(&point(1), Descriptor::of::<Value>());
    let two = api.encoder_of(&point(2), Descriptor::of::<Value>());
    assert!(!Arc::ptr_eq(&one, &two));

    let data = api.marshal(&point(2), &Value::Record(Vec::new())).unwrap();
    assert_eq!(&data[..], [0x04]);
}

#[test]
fn clones_share_the_cache_and_separate_apis_do_not() {
    let api = Api::default();
    let clone = api.clone();
    let schema = Schema::string();
    let a = api.decoder_of(&schema, Descriptor::of::<String>());
    let b = clone.decoder_of(&schema, Descriptor::of::<String>());
    assert!(Arc::ptr_eq(&a, &b));

    let other = Api::default();
    let c = other.decoder_of(&schema, Descriptor::of::<String>());
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn scratch_writers_return_to_the_pool() {
    let api = Api::default();
    assert_eq!(api.stats().idle_writers, 0);
    api.marshal(&Schema::array(Schema::int()), &vec![1i32, 2])
        .unwrap();
    assert!(api.stats().idle_writers >= 1);
}

#[test]
fn concurrent_calls_share_one_configuration() {
    let api = Config::builder().with_block_length(3).freeze();
    let schema = Schema::array(Schema::long());

    let handles: Vec<_> = (0..8i64)
        .map(|worker| {
            let api = api.clone();
            let schema = schema.clone();
            thread::spawn(move || {
                for round in 0..20 {
                    let values: Vec<i64> = (0..round).map(|n| n * worker).collect();
                    let data = api.marshal(&schema, &values).unwrap();
                    let back: Vec<i64> = api.decode(&schema, data).unwrap();
                    assert_eq!(back, values);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = api.stats();
    assert_eq!(stats.encoders, 1);
    assert_eq!(stats.decoders, 1);
    assert!(stats.builds >= 2);
}

proptest! {
    #[test]
    fn blocks_respect_the_configured_length(
        values in prop::collection::vec(any::<i64>(), 0..40),
        block_length in 1usize..8,
    ) {
        let api = Config::builder().with_block_length(block_length).freeze();
        let schema = Schema::array(Schema::long());
        let data = api.marshal(&schema, &values).unwrap();

        let mut reader = Reader::new(data.clone());
        let mut seen = 0;
        loop {
            let header = reader.read_block_header().unwrap();
            if header.is_end() {
                break;
            }
            prop_assert!(header.byte_size.is_none());
            prop_assert!(header.count <= block_length);
            if seen + header.count < values.len() {
                prop_assert_eq!(header.count, block_length);
            }
            for _ in 0..header.count {
                reader.read_long().unwrap();
            }
            seen += header.count;
        }
        prop_assert_eq!(seen, values.len());
        prop_assert!(reader.is_empty());

        let back: Vec<i64> = api.decode(&schema, data).unwrap();
        prop_assert_eq!(back, values);
    }
}
