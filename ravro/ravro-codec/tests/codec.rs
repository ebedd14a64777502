use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use ravro_codec::{
    Api, CodecError, Config, DEFAULT_MAX_SLICE_ALLOC_SIZE, Schema, Value, Writer, native_enum,
    native_union,
};

fn api() -> Api {
    Api::default()
}

// ── primitives ───────────────────────────────────────────────────────────────

#[test]
fn primitives_use_zigzag_varints() {
    let api = api();
    assert_eq!(&api.marshal(&Schema::int(), &1i32).unwrap()[..], [0x02]);
    assert_eq!(&api.marshal(&Schema::int(), &-1i32).unwrap()[..], [0x01]);
    assert_eq!(&api.marshal(&Schema::long(), &64i64).unwrap()[..], [0x80, 0x01]);
    assert_eq!(&api.marshal(&Schema::boolean(), &true).unwrap()[..], [0x01]);
    assert_eq!(
        &api.marshal(&Schema::string(), &"hi".to_string()).unwrap()[..],
        [0x04, b'h', b'i']
    );
    assert!(api.marshal(&Schema::null(), &()).unwrap().is_empty());
}

#[test]
fn primitives_decode_back() {
    let api = api();
    let v: i64 = api.decode(&Schema::long(), vec![0x80, 0x01]).unwrap();
    assert_eq!(v, 64);
    let s: String = api.decode(&Schema::string(), vec![0x04, b'o', b'k']).unwrap();
    assert_eq!(s, "ok");
    let d: f64 = api
        .decode(&Schema::double(), 1.5f64.to_le_bytes().to_vec())
        .unwrap();
    assert_eq!(d, 1.5);
    let b: Bytes = api.decode(&Schema::bytes(), vec![0x02, 0xff]).unwrap();
    assert_eq!(&b[..], [0xff]);
}

#[test]
fn int_schema_widens_into_i64_and_long_narrows_with_range_check() {
    let api = api();
    let wide: i64 = api.decode(&Schema::int(), vec![0x01]).unwrap();
    assert_eq!(wide, -1);

    let narrow: i32 = api.decode(&Schema::long(), vec![0x02]).unwrap();
    assert_eq!(narrow, 1);

    let big = api.marshal(&Schema::long(), &(i64::from(i32::MAX) + 1)).unwrap();
    let err = api.decode::<i32>(&Schema::long(), big).unwrap_err();
    assert!(matches!(err, CodecError::IntegerRange { target: "i32", .. }));
}

#[test]
fn unsupported_pairing_reports_on_use() {
    let api = api();
    let err = api.decode::<i32>(&Schema::string(), vec![0x00]).unwrap_err();
    assert!(matches!(err, CodecError::Unsupported { ref schema, .. } if schema == "string"));
    let again = api.decode::<i32>(&Schema::string(), vec![0x00]).unwrap_err();
    assert_eq!(err, again);
}

#[test]
fn double_into_float_schema_must_be_exact() {
    let api = api();
    let data = api.marshal(&Schema::float(), &1.5f64).unwrap();
    assert_eq!(&data[..], 1.5f32.to_le_bytes());

    let err = api.marshal(&Schema::float(), &0.1f64).unwrap_err();
    assert_eq!(err, CodecError::FloatPrecision(0.1));
    let err = api
        .marshal(&Schema::float(), &Value::Double(0.1))
        .unwrap_err();
    assert_eq!(err, CodecError::FloatPrecision(0.1));
}

#[test]
fn truncated_input_is_an_error() {
    let err = api().decode::<String>(&Schema::string(), vec![0x08, b'a']).unwrap_err();
    assert_eq!(err, CodecError::UnexpectedEof);
}

// ── arrays ───────────────────────────────────────────────────────────────────

#[test]
fn array_is_written_in_blocks_of_configured_length() {
    let api = Config::builder().with_block_length(2).freeze();
    let schema = Schema::array(Schema::int());
    let data = api.marshal(&schema, &vec![1i32, 2, 3]).unwrap();
    assert_eq!(&data[..], [0x04, 0x02, 0x04, 0x02, 0x06, 0x00]);

    let back: Vec<i32> = api.decode(&schema, data).unwrap();
    assert_eq!(back, [1, 2, 3]);
}

#[test]
fn empty_array_is_a_single_terminator() {
    let schema = Schema::array(Schema::long());
    let data = api().marshal(&schema, &Vec::<i64>::new()).unwrap();
    assert_eq!(&data[..], [0x00]);
}

#[test]
fn negative_block_count_carries_a_byte_size() {
    // count -2 (zigzag 0x03), byte size 2, items 1 and 2, end.
    let schema = Schema::array(Schema::int());
    let back: Vec<i32> = api()
        .decode(&schema, vec![0x03, 0x04, 0x02, 0x04, 0x00])
        .unwrap();
    assert_eq!(back, [1, 2]);
}

#[test]
fn missing_terminator_ends_the_array() {
    let schema = Schema::array(Schema::int());
    let back: Vec<i32> = api().decode(&schema, vec![0x02, 0x0a]).unwrap();
    assert_eq!(back, [5]);
}

#[test]
fn end_of_input_inside_an_item_is_an_error() {
    let schema = Schema::array(Schema::string());
    let err = api()
        .decode::<Vec<String>>(&schema, vec![0x04, 0x02, b'a'])
        .unwrap_err();
    assert_eq!(err.root(), &CodecError::UnexpectedEof);
    assert!(
        matches!(&err, CodecError::Context { context, .. } if context.contains("Vec<")),
        "{err:?}"
    );
}

/// A block header claiming 2^40 items with nothing after it.
fn oversized_block() -> Bytes {
    let mut writer = Writer::new();
    writer.write_block_header(1 << 40);
    writer.into_bytes()
}

#[test]
fn oversized_block_count_hits_the_default_limit() {
    let schema = Schema::array(Schema::long());
    let err = api()
        .decode::<Vec<i64>>(&schema, oversized_block())
        .unwrap_err();
    assert_eq!(
        err.root(),
        &CodecError::SizeLimit {
            what: "array",
            size: 1 << 40,
            limit: DEFAULT_MAX_SLICE_ALLOC_SIZE as u64
        }
    );
}

#[test]
fn oversized_block_count_without_limit_runs_out_of_input() {
    let api = Config::builder()
        .with_max_slice_alloc_size(usize::MAX)
        .freeze();
    let schema = Schema::array(Schema::long());
    let mut existing = vec![7i64; 3];
    let err = api
        .unmarshal(&schema, oversized_block(), &mut existing)
        .unwrap_err();
    assert_eq!(err.root(), &CodecError::UnexpectedEof);
    assert!(existing.len() <= 3);
}

#[test]
fn decoding_into_a_longer_vec_truncates_it() {
    let api = api();
    let schema = Schema::array(Schema::int());
    let mut existing = vec![9i32, 9, 9, 9];
    api.unmarshal(&schema, vec![0x02, 0x02, 0x00], &mut existing)
        .unwrap();
    assert_eq!(existing, [1]);
}

#[test]
fn array_growth_is_bounded_by_the_allocation_limit() {
    let api = Config::builder().with_max_slice_alloc_size(2).freeze();
    let schema = Schema::array(Schema::int());
    let err = api
        .decode::<Vec<i32>>(&schema, vec![0x06, 0x02, 0x02, 0x02, 0x00])
        .unwrap_err();
    assert_eq!(
        err.root(),
        &CodecError::SizeLimit {
            what: "array",
            size: 3,
            limit: 2
        }
    );
}

#[test]
fn nested_arrays_round_trip() {
    let api = api();
    let schema = Schema::array(Schema::array(Schema::string()));
    let value = vec![vec!["a".to_string()], vec![], vec!["b".into(), "c".into()]];
    let data = api.marshal(&schema, &value).unwrap();
    let back: Vec<Vec<String>> = api.decode(&schema, data).unwrap();
    assert_eq!(back, value);
}

#[test]
fn failing_item_leaves_a_consistent_partial_block() {
    // The third item does not fit an int; the first two are still framed.
    let api = api();
    let schema = Schema::array(Schema::int());
    let mut writer = api.borrow_writer();
    let err = api
        .write_value(&schema, &mut writer, &vec![1i64, 2, i64::MAX])
        .unwrap_err();
    assert!(matches!(err.root(), CodecError::IntegerRange { .. }));
    assert_eq!(writer.buffer(), [0x04, 0x02, 0x04]);
}

// ── maps ─────────────────────────────────────────────────────────────────────

#[test]
fn map_writes_key_then_value() {
    let api = api();
    let schema = Schema::map(Schema::long());
    let value = BTreeMap::from([("a".to_string(), 1i64), ("b".to_string(), 2)]);
    let data = api.marshal(&schema, &value).unwrap();
    assert_eq!(
        &data[..],
        [0x04, 0x02, b'a', 0x02, 0x02, b'b', 0x04, 0x00]
    );

    let back: HashMap<String, i64> = api.decode(&schema, data).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back["b"], 2);
}

#[test]
fn map_decode_merges_into_existing_entries() {
    let api = api();
    let schema = Schema::map(Schema::int());
    let mut existing = BTreeMap::from([("keep".to_string(), 7i32), ("a".to_string(), 0)]);
    api.unmarshal(&schema, vec![0x02, 0x02, b'a', 0x0a, 0x00], &mut existing)
        .unwrap();
    assert_eq!(existing["a"], 5);
    assert_eq!(existing["keep"], 7);
}

#[test]
fn map_growth_is_bounded_by_the_allocation_limit() {
    let api = Config::builder().with_max_slice_alloc_size(1).freeze();
    let schema = Schema::map(Schema::null());
    let err = api
        .decode::<BTreeMap<String, ()>>(&schema, vec![0x04, 0x00, 0x00, 0x00])
        .unwrap_err();
    assert!(matches!(err.root(), CodecError::SizeLimit { what: "map", .. }));
}

// ── enums and fixed ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Suit {
    #[default]
    Spades,
    Hearts,
}

native_enum!(Suit { Spades => "SPADES", Hearts => "HEARTS" });

fn suit_schema() -> Schema {
    Schema::enumeration("Suit", ["HEARTS", "SPADES"])
}

#[test]
fn enum_maps_variants_by_symbol() {
    let api = api();
    assert_eq!(&api.marshal(&suit_schema(), &Suit::Spades).unwrap()[..], [0x02]);
    let back: Suit = api.decode(&suit_schema(), vec![0x00]).unwrap();
    assert_eq!(back, Suit::Hearts);
}

#[test]
fn enum_decodes_into_symbol_string() {
    let symbol: String = api().decode(&suit_schema(), vec![0x02]).unwrap();
    assert_eq!(symbol, "SPADES");
}

#[test]
fn enum_rejects_bad_ordinal_and_unknown_symbol() {
    let api = api();
    let err = api.decode::<Suit>(&suit_schema(), vec![0x04]).unwrap_err();
    assert_eq!(
        err,
        CodecError::EnumOrdinalOutOfRange {
            ordinal: 2,
            symbols: 2
        }
    );
    let err = api
        .marshal(&suit_schema(), &"CLUBS".to_string())
        .unwrap_err();
    assert_eq!(err, CodecError::UnknownEnumSymbol("CLUBS".into()));
}

#[test]
fn fixed_round_trips_through_byte_arrays() {
    let api = api();
    let schema = Schema::fixed("quad", 4);
    let data = api.marshal(&schema, &[1u8, 2, 3, 4]).unwrap();
    assert_eq!(&data[..], [1, 2, 3, 4]);
    let back: [u8; 4] = api.decode(&schema, data).unwrap();
    assert_eq!(back, [1, 2, 3, 4]);
}

#[test]
fn fixed_checks_length_of_bytes() {
    let err = api()
        .marshal(&Schema::fixed("quad", 4), &Bytes::from_static(b"abc"))
        .unwrap_err();
    assert_eq!(
        err,
        CodecError::FixedLength {
            expected: 4,
            actual: 3
        }
    );
}

// ── pointers and unions ──────────────────────────────────────────────────────

#[test]
fn optional_string_uses_the_null_branch() {
    let api = api();
    let schema = Schema::union([Schema::null(), Schema::string()]);
    let some = api.marshal(&schema, &Some("x".to_string())).unwrap();
    assert_eq!(&some[..], [0x02, 0x02, b'x']);
    let none = api.marshal(&schema, &None::<String>).unwrap();
    assert_eq!(&none[..], [0x00]);

    let back: Option<String> = api.decode(&schema, some).unwrap();
    assert_eq!(back.as_deref(), Some("x"));
    let mut cleared = Some("old".to_string());
    api.unmarshal(&schema, none, &mut cleared).unwrap();
    assert_eq!(cleared, None);
}

#[test]
fn union_index_out_of_range() {
    let api = api();
    let schema = Schema::union([Schema::null(), Schema::string()]);
    let err = api.decode::<Option<String>>(&schema, vec![0x04]).unwrap_err();
    assert_eq!(
        err,
        CodecError::UnionBranchOutOfRange {
            index: 2,
            branches: 2
        }
    );
    let err = api.decode::<Option<String>>(&schema, vec![0x01]).unwrap_err();
    assert_eq!(
        err,
        CodecError::UnionBranchOutOfRange {
            index: -1,
            branches: 2
        }
    );
}

#[test]
fn null_pointer_without_null_branch_is_rejected() {
    let api = api();
    let err = api.marshal(&Schema::long(), &None::<i64>).unwrap_err();
    assert_eq!(err.root(), &CodecError::NullReference);

    let data = api.marshal(&Schema::long(), &Some(3i64)).unwrap();
    assert_eq!(&data[..], [0x06]);
    let back: Option<i64> = api.decode(&Schema::long(), data).unwrap();
    assert_eq!(back, Some(3));
}

#[test]
fn boxed_values_are_transparent() {
    let api = api();
    let data = api.marshal(&Schema::int(), &Box::new(2i32)).unwrap();
    assert_eq!(&data[..], [0x04]);
    let back: Box<i32> = api.decode(&Schema::int(), data).unwrap();
    assert_eq!(*back, 2);
}

#[test]
fn plain_scalar_picks_its_natural_branch() {
    let api = api();
    let schema = Schema::union([Schema::int(), Schema::long()]);
    let data = api.marshal(&schema, &5i64).unwrap();
    assert_eq!(&data[..], [0x02, 0x0a]);
}

#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Nothing(()),
    Number(i64),
    Text(String),
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Nothing(())
    }
}

native_union!(Scalar {
    Nothing(()) => "null",
    Number(i64) => "long",
    Text(String) => "string",
});

#[test]
fn native_union_matches_branches_by_name() {
    let api = api();
    // Branch order differs from variant order.
    let schema = Schema::union([Schema::string(), Schema::null(), Schema::long()]);
    let data = api.marshal(&schema, &Scalar::Number(5)).unwrap();
    assert_eq!(&data[..], [0x04, 0x0a]);
    let back: Scalar = api.decode(&schema, data).unwrap();
    assert_eq!(back, Scalar::Number(5));

    let text: Scalar = api.decode(&schema, vec![0x00, 0x04, b'h', b'i']).unwrap();
    assert_eq!(text, Scalar::Text("hi".into()));
    let nothing: Scalar = api.decode(&schema, vec![0x02]).unwrap();
    assert_eq!(nothing, Scalar::Nothing(()));
}

#[test]
fn native_union_without_matching_branch_fails() {
    let api = api();
    let schema = Schema::union([Schema::null(), Schema::long()]);
    let err = api
        .marshal(&schema, &Scalar::Text("x".into()))
        .unwrap_err();
    assert!(matches!(err, CodecError::NoUnionBranch(_)));
}

#[test]
fn generic_values_choose_union_branch_by_type() {
    let api = api();
    let schema = Schema::union([Schema::null(), Schema::long(), Schema::string()]);
    let cases = [
        (Value::Null, vec![0x00]),
        (Value::Long(1), vec![0x02, 0x02]),
        (Value::Int(1), vec![0x02, 0x02]),
        (Value::string("a"), vec![0x04, 0x02, b'a']),
    ];
    for (value, expected) in cases {
        let data = api.marshal(&schema, &value).unwrap();
        assert_eq!(data.to_vec(), expected, "{value:?}");
    }

    let back: Value = api.decode(&schema, vec![0x04, 0x02, b'a']).unwrap();
    assert_eq!(back, Value::string("a"));

    let err = api.marshal(&schema, &Value::Boolean(true)).unwrap_err();
    assert!(matches!(err, CodecError::NoUnionBranch(_)));
}
