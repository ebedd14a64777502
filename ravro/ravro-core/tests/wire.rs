use ravro_core::{BlockHeader, CodecError, Reader, Writer};

fn encoded(f: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = Writer::new();
    f(&mut w);
    w.buffer().to_vec()
}

#[test]
fn ints_use_zigzag_varints() {
    assert_eq!(encoded(|w| w.write_int(0)), [0x00]);
    assert_eq!(encoded(|w| w.write_int(-1)), [0x01]);
    assert_eq!(encoded(|w| w.write_int(1)), [0x02]);
    assert_eq!(encoded(|w| w.write_int(64)), [0x80, 0x01]);
    assert_eq!(encoded(|w| w.write_long(-65)), [0x81, 0x01]);
}

#[test]
fn reads_back_extreme_integers() {
    let buf = encoded(|w| {
        w.write_int(i32::MIN);
        w.write_int(i32::MAX);
        w.write_long(i64::MIN);
        w.write_long(i64::MAX);
    });
    let mut r = Reader::new(buf);
    assert_eq!(r.read_int().expect("int"), i32::MIN);
    assert_eq!(r.read_int().expect("int"), i32::MAX);
    assert_eq!(r.read_long().expect("long"), i64::MIN);
    assert_eq!(r.read_long().expect("long"), i64::MAX);
    assert!(r.is_empty());
}

#[test]
fn int_wider_than_32_bits_overflows() {
    let mut r = Reader::new(encoded(|w| w.write_long(i64::from(i32::MAX) + 1)));
    assert_eq!(
        r.read_int().unwrap_err(),
        CodecError::VarintOverflow { bits: 32 }
    );
}

#[test]
fn floats_are_little_endian() {
    assert_eq!(encoded(|w| w.write_float(1.0)), [0x00, 0x00, 0x80, 0x3f]);
    let mut r = Reader::new(encoded(|w| w.write_double(-2.5)));
    assert_eq!(r.read_double().expect("double"), -2.5);
}

#[test]
fn truncated_input_reports_eof() {
    let mut r = Reader::new(vec![0x00, 0x00]);
    assert_eq!(r.read_float().unwrap_err(), CodecError::UnexpectedEof);

    let mut r = Reader::new(vec![0x06, b'a']);
    assert_eq!(r.read_string().unwrap_err(), CodecError::UnexpectedEof);
}

#[test]
fn bool_rejects_bytes_other_than_zero_and_one() {
    let mut r = Reader::new(vec![0x01, 0x00, 0x02]);
    assert!(r.read_bool().expect("true"));
    assert!(!r.read_bool().expect("false"));
    assert_eq!(r.read_bool().unwrap_err(), CodecError::InvalidBool(2));
}

#[test]
fn strings_are_length_prefixed_utf8() {
    let buf = encoded(|w| w.write_string("héllo"));
    assert_eq!(buf[0], 0x0c);
    let mut r = Reader::new(buf);
    assert_eq!(r.read_string().expect("string"), "héllo");

    let mut r = Reader::new(vec![0x02, 0xff]);
    assert!(matches!(r.read_string(), Err(CodecError::InvalidUtf8(_))));
}

#[test]
fn byte_slices_honour_limits() {
    let buf = encoded(|w| w.write_bytes(b"12345"));
    let mut r = Reader::new(buf.clone()).with_max_byte_slice_size(4);
    assert_eq!(
        r.read_bytes().unwrap_err(),
        CodecError::SizeLimit {
            what: "byte slice",
            size: 5,
            limit: 4
        }
    );
    let mut r = Reader::new(buf);
    assert_eq!(&r.read_bytes().expect("bytes")[..], b"12345");

    let mut r = Reader::new(encoded(|w| w.write_long(-3)));
    assert_eq!(r.read_bytes().unwrap_err(), CodecError::NegativeLength(-3));
}

#[test]
fn fixed_has_no_length_prefix() {
    let buf = encoded(|w| w.write_fixed(&[1, 2, 3]));
    assert_eq!(buf, [1, 2, 3]);
    let mut r = Reader::new(buf);
    assert_eq!(&r.read_fixed(3).expect("fixed")[..], &[1, 2, 3]);
    assert_eq!(r.read_fixed(1).unwrap_err(), CodecError::UnexpectedEof);
}

#[test]
fn block_header_at_end_of_input_is_terminal() {
    let mut r = Reader::new(Vec::new());
    let header = r.read_block_header().expect("header");
    assert!(header.is_end());
    assert_eq!(header.byte_size, None);
}

#[test]
fn negative_block_count_carries_byte_size() {
    let buf = encoded(|w| {
        w.write_long(-2);
        w.write_long(4);
        w.write_block_header(3);
    });
    let mut r = Reader::new(buf);
    assert_eq!(
        r.read_block_header().expect("first"),
        BlockHeader {
            count: 2,
            byte_size: Some(4)
        }
    );
    assert_eq!(
        r.read_block_header().expect("second"),
        BlockHeader {
            count: 3,
            byte_size: None
        }
    );
}

#[test]
fn writer_reset_keeps_it_reusable() {
    let mut w = Writer::with_capacity(16);
    w.write_string("abc");
    assert_eq!(w.len(), 4);
    w.reset();
    assert!(w.is_empty());
    w.write_raw(&[9, 9]);
    assert_eq!(&w.into_bytes()[..], &[9, 9]);
}
