//! Schema-driven binary codec runtime.
//!
//! Most callers only need [`marshal`] and [`unmarshal`], which run against a
//! process-wide [`Api`]. Build a separate one with [`Config::builder`] when
//! different limits or block lengths are needed.

mod batch;
mod error;

use std::sync::OnceLock;

use bytes::Bytes;

pub use batch::{decode_batch, encode_batch};
pub use error::BatchError;
pub use ravro_codec as codec;
pub use ravro_codec::{
    Api, CodecError, Config, ConfigBuilder, Descriptor, Dynamic, Field, FieldAction, Marshal,
    Native, Schema, SchemaKind, Value, native_enum, native_marshal, native_record, native_union,
};
pub use ravro_core as core;

static DEFAULT_API: OnceLock<Api> = OnceLock::new();

/// The shared [`Api`] with default settings, created on first use.
pub fn default_api() -> &'static Api {
    DEFAULT_API.get_or_init(|| Config::default().freeze())
}

/// Encode `value` with the default [`Api`].
pub fn marshal<T: Native>(schema: &Schema, value: &T) -> Result<Bytes, CodecError> {
    default_api().marshal(schema, value)
}

/// Decode `data` into `dest` with the default [`Api`].
pub fn unmarshal<T: Native>(
    schema: &Schema,
    data: impl Into<Bytes>,
    dest: &mut T,
) -> Result<(), CodecError> {
    default_api().unmarshal(schema, data, dest)
}
