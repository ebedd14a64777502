use bytes::{BufMut, Bytes, BytesMut};

use super::varint::{write_varint, zigzag_encode};

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_null(&mut self) {}

    pub fn write_bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    pub fn write_int(&mut self, v: i32) {
        write_varint(&mut self.buf, zigzag_encode(i64::from(v)));
    }

    pub fn write_long(&mut self, v: i64) {
        write_varint(&mut self.buf, zigzag_encode(v));
    }

    pub fn write_float(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    pub fn write_double(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.write_long(v.len() as i64);
        self.buf.put_slice(v);
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_bytes(v.as_bytes());
    }

    pub fn write_fixed(&mut self, v: &[u8]) {
        self.buf.put_slice(v);
    }

    /// Header of a block holding `count` items; zero ends the sequence.
    pub fn write_block_header(&mut self, count: usize) {
        self.write_long(count as i64);
    }

    /// Append already encoded bytes.
    pub fn write_raw(&mut self, v: &[u8]) {
        self.buf.put_slice(v);
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the contents but keep the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Copy the contents out, leaving the writer ready for reuse.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}
