use bytes::{Buf, BufMut, BytesMut};

use crate::error::CodecError;

pub(crate) fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

pub(crate) fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Read an unsigned LEB128 value of at most `max_bytes` bytes.
pub(crate) fn read_varint(
    buf: &mut impl Buf,
    max_bytes: usize,
    bits: u32,
) -> Result<u64, CodecError> {
    let mut value = 0u64;
    for i in 0..max_bytes {
        let byte = buf.try_get_u8().map_err(|_| CodecError::UnexpectedEof)?;
        let shift = 7 * i as u32;
        let chunk = u64::from(byte & 0x7f);
        if shift == 63 && chunk > 1 {
            return Err(CodecError::VarintOverflow { bits });
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarintOverflow { bits })
}

pub(crate) fn write_varint(buf: &mut BytesMut, mut v: u64) {
    while v >= 0x80 {
        buf.put_u8((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    buf.put_u8(v as u8);
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn zigzag_maps_small_magnitudes_to_small_codes() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
        assert_eq!(zigzag_decode(u64::MAX), i64::MIN);
    }

    #[test]
    fn varint_uses_seven_bits_per_byte() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 300);
        assert_eq!(&buf[..], &[0xac, 0x02]);

        let mut bytes = Bytes::from(buf.to_vec());
        assert_eq!(read_varint(&mut bytes, 10, 64).unwrap(), 300);
        assert!(bytes.is_empty());
    }

    #[test]
    fn varint_rejects_too_many_continuation_bytes() {
        let mut bytes = Bytes::from_static(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert_eq!(
            read_varint(&mut bytes, 5, 32),
            Err(CodecError::VarintOverflow { bits: 32 })
        );
    }

    #[test]
    fn varint_reports_truncated_input() {
        let mut bytes = Bytes::from_static(&[0x80]);
        assert_eq!(
            read_varint(&mut bytes, 10, 64),
            Err(CodecError::UnexpectedEof)
        );
    }
}
