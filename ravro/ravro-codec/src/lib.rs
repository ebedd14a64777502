//! Schema-driven codec engine for `ravro`.
//!
//! A codec is built once per (schema, native type) pair, cached inside an
//! [`Api`], and then run against values reached through the [`Native`]
//! introspection trait. The entry points are [`Api::read_value`] /
//! [`Api::write_value`] and their typed wrappers [`Api::unmarshal`] /
//! [`Api::marshal`].

mod cache;
mod codec;
mod config;
mod native;
mod pool;
mod scope;

pub use codec::{Decoder, Encoder};
pub use config::{
    Api, CacheStats, Config, ConfigBuilder, DEFAULT_BLOCK_LENGTH, DEFAULT_MAX_SLICE_ALLOC_SIZE,
};
pub use native::{
    BranchInfo, Descriptor, Dynamic, EnumAccess, FieldInfo, MapAccess, Marshal, Native,
    NativeMut, NativeRef, PointerAccess, RecordAccess, RecordInfo, ScalarKind, SequenceAccess,
    Shape, UnionAccess,
};
pub use pool::PooledWriter;
pub use ravro_core::{
    BlockHeader, CodecError, Field, FieldAction, Reader, Schema, SchemaKind, SchemaNode, Value,
    Writer,
};

#[doc(hidden)]
pub mod __private {
    pub use std::any::type_name;
}
