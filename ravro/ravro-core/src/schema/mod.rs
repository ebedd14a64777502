//! Schema model: a graph of shared nodes with by-name references.

mod fingerprint;
mod format;
mod types;

pub use fingerprint::rabin_fingerprint;
pub use format::canonical_form;
pub use types::{
    EnumSchema, Field, FieldAction, FixedSchema, RecordSchema, RefSchema, Schema, SchemaKind,
    SchemaNode,
};
