//! Binary wire primitives: zig-zag varints, little-endian floats,
//! length-prefixed byte strings and block headers.

mod reader;
mod varint;
mod writer;

pub use reader::{BlockHeader, Reader};
pub use writer::Writer;

/// Default upper bound for a single length-prefixed byte string (1 MiB).
pub const DEFAULT_MAX_BYTE_SLICE_SIZE: usize = 1 << 20;
