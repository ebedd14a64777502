use bytes::{Buf, Bytes};

use super::{
    DEFAULT_MAX_BYTE_SLICE_SIZE,
    varint::{read_varint, zigzag_decode},
};
use crate::error::CodecError;

/// Header of one block of an array or map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Number of items in the block; zero terminates the sequence.
    pub count: usize,
    /// Byte size of the block, present when the count was written negated.
    pub byte_size: Option<usize>,
}

impl BlockHeader {
    pub fn is_end(&self) -> bool {
        self.count == 0
    }
}

/// Cursor over an encoded buffer.
///
/// Byte strings are returned as zero-copy slices of the input.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    max_byte_slice_size: usize,
}

impl Reader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            max_byte_slice_size: DEFAULT_MAX_BYTE_SLICE_SIZE,
        }
    }

    /// Limit the length accepted for any single byte string.
    pub fn with_max_byte_slice_size(mut self, limit: usize) -> Self {
        self.max_byte_slice_size = limit;
        self
    }

    pub fn max_byte_slice_size(&self) -> usize {
        self.max_byte_slice_size
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    pub fn read_null(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.buf.try_get_u8().map_err(|_| CodecError::UnexpectedEof)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_int(&mut self) -> Result<i32, CodecError> {
        let raw = read_varint(&mut self.buf, 5, 32)?;
        if raw > u64::from(u32::MAX) {
            return Err(CodecError::VarintOverflow { bits: 32 });
        }
        Ok(zigzag_decode(raw) as i32)
    }

    pub fn read_long(&mut self) -> Result<i64, CodecError> {
        read_varint(&mut self.buf, 10, 64).map(zigzag_decode)
    }

    pub fn read_float(&mut self) -> Result<f32, CodecError> {
        self.buf
            .try_get_f32_le()
            .map_err(|_| CodecError::UnexpectedEof)
    }

    pub fn read_double(&mut self) -> Result<f64, CodecError> {
        self.buf
            .try_get_f64_le()
            .map_err(|_| CodecError::UnexpectedEof)
    }

    pub fn read_bytes(&mut self) -> Result<Bytes, CodecError> {
        let len = self.read_len()?;
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let raw = self.read_bytes()?;
        String::from_utf8(raw.to_vec()).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
    }

    pub fn read_fixed(&mut self, size: usize) -> Result<Bytes, CodecError> {
        self.take(size)
    }

    /// Read a block header. Input that ends exactly here reads as the
    /// terminating empty block.
    pub fn read_block_header(&mut self) -> Result<BlockHeader, CodecError> {
        if self.is_empty() {
            return Ok(BlockHeader {
                count: 0,
                byte_size: None,
            });
        }
        let count = self.read_long()?;
        if count >= 0 {
            return Ok(BlockHeader {
                count: to_usize(count.unsigned_abs(), "block count")?,
                byte_size: None,
            });
        }
        let count = to_usize(count.unsigned_abs(), "block count")?;
        let size = self.read_long()?;
        if size < 0 {
            return Err(CodecError::NegativeLength(size));
        }
        Ok(BlockHeader {
            count,
            byte_size: Some(to_usize(size.unsigned_abs(), "block size")?),
        })
    }

    /// Discard `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        if self.buf.remaining() < len {
            return Err(CodecError::UnexpectedEof);
        }
        self.buf.advance(len);
        Ok(())
    }

    fn read_len(&mut self) -> Result<usize, CodecError> {
        let len = self.read_long()?;
        if len < 0 {
            return Err(CodecError::NegativeLength(len));
        }
        let len = to_usize(len.unsigned_abs(), "byte slice")?;
        if len > self.max_byte_slice_size {
            return Err(CodecError::SizeLimit {
                what: "byte slice",
                size: len as u64,
                limit: self.max_byte_slice_size as u64,
            });
        }
        Ok(len)
    }

    fn take(&mut self, len: usize) -> Result<Bytes, CodecError> {
        if self.buf.remaining() < len {
            return Err(CodecError::UnexpectedEof);
        }
        Ok(self.buf.split_to(len))
    }
}

fn to_usize(v: u64, what: &'static str) -> Result<usize, CodecError> {
    usize::try_from(v).map_err(|_| CodecError::SizeLimit {
        what,
        size: v,
        limit: usize::MAX as u64,
    })
}
