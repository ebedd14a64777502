use std::cell::Cell;

use bytes::Bytes;
use ravro_core::{
    CodecError, Field, FieldAction, Schema, SchemaKind, SchemaNode, Value, canonical_form,
    rabin_fingerprint,
};

// ── helpers ──────────────────────────────────────────────────────────────────

/// `Node { value: int, next: [null, Node] }`
fn linked_list() -> Schema {
    Schema::record(
        "Node",
        [
            Field::new("value", Schema::int()),
            Field::new(
                "next",
                Schema::union([Schema::null(), Schema::reference("Node")]),
            ),
        ],
    )
}

fn point(default_x: Option<i32>) -> Schema {
    let mut x = Field::new("x", Schema::int());
    if let Some(d) = default_x {
        x = x.with_default(Value::Int(d));
    }
    Schema::record("Point", [x, Field::new("y", Schema::int())])
}

// ── construction ─────────────────────────────────────────────────────────────

#[test]
fn primitive_constructors_report_their_kind() {
    assert_eq!(Schema::null().kind(), SchemaKind::Null);
    assert_eq!(Schema::long().kind(), SchemaKind::Long);
    assert_eq!(Schema::string().type_name(), "string");
    assert!(SchemaKind::Double.is_primitive());
    assert!(!SchemaKind::Record.is_primitive());
}

#[test]
fn named_types_expose_their_parts() {
    let color = Schema::enumeration("Color", ["RED", "GREEN"]);
    assert_eq!(color.name(), Some("Color"));
    assert_eq!(color.symbols().map(<[String]>::len), Some(2));
    let SchemaNode::Enum(e) = color.node() else {
        panic!("expected enum node");
    };
    assert_eq!(e.ordinal("GREEN"), Some(1));
    assert_eq!(e.ordinal("BLUE"), None);

    let md5 = Schema::fixed("md5", 16);
    let SchemaNode::Fixed(f) = md5.node() else {
        panic!("expected fixed node");
    };
    assert_eq!(f.size(), 16);
    assert_eq!(md5.type_name(), "md5");
}

#[test]
fn self_reference_binds_to_enclosing_record() {
    let node = linked_list();
    let next = &node.fields().expect("record")[1];
    let branches = next.schema().branches().expect("union");
    assert_eq!(branches[1].kind(), SchemaKind::Ref);

    let target = branches[1].resolve().expect("reference should be bound");
    assert!(target.ptr_eq(&node));
    assert_eq!(node.null_branch(), None);
    assert_eq!(next.schema().null_branch(), Some(0));
}

#[test]
fn mutual_recursion_binds_through_outer_record() {
    let inner = Schema::record(
        "B",
        [Field::new(
            "a",
            Schema::union([Schema::null(), Schema::reference("A")]),
        )],
    );
    let outer = Schema::record("A", [Field::new("b", inner.clone())]);

    let a_ref = &inner.fields().expect("record")[0]
        .schema()
        .branches()
        .expect("union")[1];
    assert!(a_ref.resolve().expect("bound").ptr_eq(&outer));
}

#[test]
fn unbound_reference_fails_to_resolve() {
    let dangling = Schema::reference("Missing");
    assert_eq!(
        dangling.resolve().unwrap_err(),
        CodecError::UnresolvedReference("Missing".into())
    );
}

#[test]
fn field_builders_set_metadata() {
    let field = Field::new("count", Schema::long())
        .with_aliases(["total"])
        .with_default(Value::Long(7))
        .with_action(FieldAction::SetDefault);
    assert_eq!(field.name(), "count");
    assert!(field.matches("total"));
    assert!(!field.matches("sum"));
    assert_eq!(field.default(), Some(&Value::Long(7)));
    assert_eq!(field.action(), FieldAction::SetDefault);
}

// ── defaults ─────────────────────────────────────────────────────────────────

#[test]
fn encoded_default_is_computed_once() {
    let field = Field::new("x", Schema::int()).with_default(Value::Int(3));
    let calls = Cell::new(0);
    let encode = |_: &Value| {
        calls.set(calls.get() + 1);
        Ok(Bytes::from_static(&[6]))
    };
    assert_eq!(field.encode_default(encode).expect("first"), &[6][..]);
    assert_eq!(field.encode_default(encode).expect("second"), &[6][..]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn encoded_default_without_default_reports_no_default() {
    let field = Field::new("x", Schema::int());
    let err = field
        .encode_default(|_| panic!("encoder must not run"))
        .unwrap_err();
    assert_eq!(err, CodecError::NoDefault("x".into()));
}

// ── canonical form and fingerprints ──────────────────────────────────────────

#[test]
fn canonical_form_of_primitives_is_quoted_name() {
    assert_eq!(canonical_form(&Schema::int()), "\"int\"");
    assert_eq!(
        canonical_form(&Schema::array(Schema::string())),
        "{\"type\":\"array\",\"items\":\"string\"}"
    );
}

#[test]
fn canonical_form_writes_repeated_names_once() {
    assert_eq!(
        canonical_form(&linked_list()),
        concat!(
            "{\"name\":\"Node\",\"type\":\"record\",\"fields\":[",
            "{\"name\":\"value\",\"type\":\"int\"},",
            "{\"name\":\"next\",\"type\":[\"null\",\"Node\"]}]}"
        )
    );
}

#[test]
fn rabin_of_empty_input_is_the_seed() {
    assert_eq!(rabin_fingerprint(b""), 0xc15d_213a_a4d7_a795);
    assert_ne!(rabin_fingerprint(b"\"int\""), rabin_fingerprint(b"\"long\""));
}

#[test]
fn fingerprint_depends_on_structure_not_identity() {
    assert_eq!(linked_list().fingerprint(), linked_list().fingerprint());
    assert_ne!(point(None).fingerprint(), linked_list().fingerprint());
    assert_ne!(Schema::int().fingerprint(), Schema::long().fingerprint());
}

#[test]
fn cache_fingerprint_covers_defaults() {
    let plain = point(None);
    let with_default = point(Some(1));
    let other_default = point(Some(2));

    assert_eq!(plain.fingerprint(), with_default.fingerprint());
    assert_ne!(plain.cache_fingerprint(), with_default.cache_fingerprint());
    assert_ne!(
        with_default.cache_fingerprint(),
        other_default.cache_fingerprint()
    );
}

#[test]
fn cache_fingerprint_covers_field_resolution() {
    let with_field = |field: Field| Schema::record("P", [field]);
    let plain = with_field(Field::new("x", Schema::int()));
    let aliased = with_field(Field::new("x", Schema::int()).with_aliases(["y"]));
    let defaulted =
        with_field(Field::new("x", Schema::int()).with_action(FieldAction::SetDefault));

    assert_eq!(plain.fingerprint(), aliased.fingerprint());
    assert_eq!(plain.fingerprint(), defaulted.fingerprint());
    assert_ne!(plain.cache_fingerprint(), aliased.cache_fingerprint());
    assert_ne!(plain.cache_fingerprint(), defaulted.cache_fingerprint());
}

#[test]
fn reference_fingerprint_is_its_target() {
    let node = linked_list();
    let fields = node.fields().expect("record");
    let reference = &fields[1].schema().branches().expect("union")[1];
    assert_eq!(reference.fingerprint(), node.fingerprint());
    assert_eq!(reference.cache_fingerprint(), node.cache_fingerprint());
}
