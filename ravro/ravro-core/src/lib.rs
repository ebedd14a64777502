//! Native-type-agnostic core types for `ravro`.
//!
//! This crate provides the schema model ([`Schema`] / [`Field`]), the generic
//! [`Value`] receiver, the wire primitives ([`Reader`] / [`Writer`]) and the
//! shared [`CodecError`] type. The codec engine itself lives in `ravro-codec`.

mod error;
mod schema;
mod value;
mod wire;

pub use error::{CodecError, ValueTypeError};
pub use schema::{
    EnumSchema, Field, FieldAction, FixedSchema, RecordSchema, RefSchema, Schema, SchemaKind,
    SchemaNode, canonical_form, rabin_fingerprint,
};
pub use value::Value;
pub use wire::{BlockHeader, DEFAULT_MAX_BYTE_SLICE_SIZE, Reader, Writer};
