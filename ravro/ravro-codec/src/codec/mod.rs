//! Codec builder: resolves a (schema, native type) pair into a tree of
//! decoders or encoders.

mod array;
mod default;
mod dynamic;
mod enums;
mod fixed;
mod leaf;
mod marshal;
mod pointer;
mod record;
mod union;

use std::sync::Arc;

use log::warn;
use ravro_core::{CodecError, Reader, Schema, SchemaKind, SchemaNode, Writer};

pub(crate) use record::{RecordDecoder, RecordEncoder};

use crate::{
    config::Api,
    native::{
        Descriptor, MapAccess, Native, NativeMut, NativeRef, PointerAccess, RecordAccess,
        SequenceAccess, Shape, UnionAccess,
    },
    scope::BuildScope,
};

/// Decodes one value of a fixed schema into a fixed native type.
pub trait Decoder: Send + Sync {
    fn decode(&self, dest: &mut dyn Native, reader: &mut Reader, api: &Api)
    -> Result<(), CodecError>;
}

/// Encodes one value of a fixed native type as a fixed schema.
pub trait Encoder: Send + Sync {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError>;
}

pub(crate) fn decoder_of_type(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    native: Descriptor,
) -> Arc<dyn Decoder> {
    if native.marshal {
        return Arc::new(marshal::MarshalDecoder::new(scope, schema));
    }
    if matches!(native.shape, Shape::Dynamic) && schema.kind() != SchemaKind::Union {
        return Arc::new(dynamic::DynamicDecoder::new(scope, schema));
    }
    if let SchemaNode::Ref(reference) = schema.node() {
        return match reference.resolve() {
            Some(target) => decoder_of_type(scope, &target, native),
            None => ErrorCodec::shared(CodecError::UnresolvedReference(
                reference.name().to_owned(),
            )),
        };
    }
    if let Shape::Pointer { inner, nullable } = native.shape
        && !(nullable && schema.null_branch().is_some())
    {
        let inner = decoder_of_type(scope, schema, inner());
        return Arc::new(pointer::PointerDecoder::new(inner));
    }

    match schema.node() {
        SchemaNode::Null
        | SchemaNode::Boolean
        | SchemaNode::Int
        | SchemaNode::Long
        | SchemaNode::Float
        | SchemaNode::Double
        | SchemaNode::Bytes
        | SchemaNode::String => leaf::decoder(schema, native),
        SchemaNode::Record(_) => record::decoder(scope, schema, native),
        SchemaNode::Enum(e) => enums::decoder(schema, e, native),
        SchemaNode::Array(items) => array::array_decoder(scope, schema, items, native),
        SchemaNode::Map(values) => array::map_decoder(scope, schema, values, native),
        SchemaNode::Union(branches) => union::decoder(scope, schema, branches, native),
        SchemaNode::Fixed(f) => fixed::decoder(schema, f.size(), native),
        SchemaNode::Ref(_) => unsupported(schema, native),
    }
}

pub(crate) fn encoder_of_type(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    native: Descriptor,
) -> Arc<dyn Encoder> {
    if native.marshal {
        return Arc::new(marshal::MarshalEncoder::new(scope, schema));
    }
    if matches!(native.shape, Shape::Dynamic) {
        return Arc::new(dynamic::DynamicEncoder::new(schema));
    }
    if let SchemaNode::Ref(reference) = schema.node() {
        return match reference.resolve() {
            Some(target) => encoder_of_type(scope, &target, native),
            None => ErrorCodec::shared(CodecError::UnresolvedReference(
                reference.name().to_owned(),
            )),
        };
    }
    if let Shape::Pointer { inner, nullable } = native.shape
        && !(nullable && schema.null_branch().is_some())
    {
        let inner = encoder_of_type(scope, schema, inner());
        return if nullable {
            Arc::new(pointer::NullablePointerEncoder::new(inner))
        } else {
            Arc::new(pointer::BoxEncoder::new(inner))
        };
    }

    match schema.node() {
        SchemaNode::Null
        | SchemaNode::Boolean
        | SchemaNode::Int
        | SchemaNode::Long
        | SchemaNode::Float
        | SchemaNode::Double
        | SchemaNode::Bytes
        | SchemaNode::String => leaf::encoder(schema, native),
        SchemaNode::Record(_) => record::encoder(scope, schema, native),
        SchemaNode::Enum(e) => enums::encoder(schema, e, native),
        SchemaNode::Array(items) => array::array_encoder(scope, schema, items, native),
        SchemaNode::Map(values) => array::map_encoder(scope, schema, values, native),
        SchemaNode::Union(branches) => union::encoder(scope, schema, branches, native),
        SchemaNode::Fixed(f) => fixed::encoder(schema, f.size(), native),
        SchemaNode::Ref(_) => unsupported(schema, native),
    }
}

/// Codec standing in for a combination that cannot work. It reports its
/// error on every use and never touches the value.
pub(crate) struct ErrorCodec {
    error: CodecError,
}

impl ErrorCodec {
    pub(crate) fn shared(error: CodecError) -> Arc<Self> {
        warn!("installing error codec: {error}");
        Arc::new(Self { error })
    }
}

impl Decoder for ErrorCodec {
    fn decode(&self, _: &mut dyn Native, _: &mut Reader, _: &Api) -> Result<(), CodecError> {
        Err(self.error.clone())
    }
}

impl Encoder for ErrorCodec {
    fn encode(&self, _: &dyn Native, _: &mut Writer, _: &Api) -> Result<(), CodecError> {
        Err(self.error.clone())
    }
}

pub(crate) fn unsupported(schema: &Schema, native: Descriptor) -> Arc<ErrorCodec> {
    ErrorCodec::shared(CodecError::Unsupported {
        native: native.type_name.to_owned(),
        schema: schema.type_name().to_owned(),
    })
}

/// Whether values described by `native` can be written as `schema`.
pub(crate) fn accepts(schema: &Schema, native: Descriptor) -> bool {
    let Ok(schema) = schema.resolve() else {
        return false;
    };
    if native.marshal {
        return schema.kind() != SchemaKind::Null;
    }
    match native.shape {
        Shape::Generic | Shape::Dynamic => true,
        Shape::Pointer { inner, .. } => accepts(&schema, inner()),
        Shape::Unit => schema.kind() == SchemaKind::Null,
        Shape::Scalar(scalar) => {
            leaf::LeafOp::select(schema.kind(), native.shape).is_some()
                || enums::accepts_scalar(schema.kind(), scalar)
                || fixed::accepts_scalar(schema.kind(), scalar)
        }
        Shape::Fixed(size) => matches!(schema.node(), SchemaNode::Fixed(f) if f.size() == size),
        Shape::Sequence { .. } => schema.kind() == SchemaKind::Array,
        Shape::Map { .. } => schema.kind() == SchemaKind::Map,
        Shape::Record(info) => matches!(schema.node(), SchemaNode::Record(r) if r.name() == info.name),
        Shape::Enum(_) => schema.kind() == SchemaKind::Enum,
        Shape::Union(_) | Shape::Opaque => false,
    }
}

// ── access helpers ───────────────────────────────────────────────────────────

pub(crate) fn native_mismatch(expected: &str, found: &'static str) -> CodecError {
    CodecError::Native(format!("expected {expected}, found {found}"))
}

pub(crate) fn target_mut<T: Native>(dest: &mut dyn Native) -> Result<&mut T, CodecError> {
    let found = dest.descriptor().type_name;
    dest.downcast_mut::<T>()
        .ok_or_else(|| native_mismatch(std::any::type_name::<T>(), found))
}

pub(crate) fn source_ref<T: Native>(src: &dyn Native) -> Result<&T, CodecError> {
    src.downcast_ref::<T>()
        .ok_or_else(|| native_mismatch(std::any::type_name::<T>(), src.descriptor().type_name))
}

pub(crate) fn sequence_mut(dest: &mut dyn Native) -> Result<&mut dyn SequenceAccess, CodecError> {
    let found = dest.descriptor().type_name;
    match dest.reflect_mut() {
        NativeMut::Sequence(seq) => Ok(seq),
        _ => Err(native_mismatch("sequence", found)),
    }
}

pub(crate) fn sequence_ref(src: &dyn Native) -> Result<&dyn SequenceAccess, CodecError> {
    match src.reflect_ref() {
        NativeRef::Sequence(seq) => Ok(seq),
        _ => Err(native_mismatch("sequence", src.descriptor().type_name)),
    }
}

pub(crate) fn map_mut(dest: &mut dyn Native) -> Result<&mut dyn MapAccess, CodecError> {
    let found = dest.descriptor().type_name;
    match dest.reflect_mut() {
        NativeMut::Map(map) => Ok(map),
        _ => Err(native_mismatch("map", found)),
    }
}

pub(crate) fn map_ref(src: &dyn Native) -> Result<&dyn MapAccess, CodecError> {
    match src.reflect_ref() {
        NativeRef::Map(map) => Ok(map),
        _ => Err(native_mismatch("map", src.descriptor().type_name)),
    }
}

pub(crate) fn record_mut(dest: &mut dyn Native) -> Result<&mut dyn RecordAccess, CodecError> {
    let found = dest.descriptor().type_name;
    match dest.reflect_mut() {
        NativeMut::Record(record) => Ok(record),
        _ => Err(native_mismatch("record", found)),
    }
}

pub(crate) fn record_ref(src: &dyn Native) -> Result<&dyn RecordAccess, CodecError> {
    match src.reflect_ref() {
        NativeRef::Record(record) => Ok(record),
        _ => Err(native_mismatch("record", src.descriptor().type_name)),
    }
}

pub(crate) fn union_mut(dest: &mut dyn Native) -> Result<&mut dyn UnionAccess, CodecError> {
    let found = dest.descriptor().type_name;
    match dest.reflect_mut() {
        NativeMut::Union(union) => Ok(union),
        _ => Err(native_mismatch("union", found)),
    }
}

pub(crate) fn union_ref(src: &dyn Native) -> Result<&dyn UnionAccess, CodecError> {
    match src.reflect_ref() {
        NativeRef::Union(union) => Ok(union),
        _ => Err(native_mismatch("union", src.descriptor().type_name)),
    }
}

pub(crate) fn pointer_mut(dest: &mut dyn Native) -> Result<&mut dyn PointerAccess, CodecError> {
    let found = dest.descriptor().type_name;
    match dest.reflect_mut() {
        NativeMut::Pointer(pointer) => Ok(pointer),
        _ => Err(native_mismatch("pointer", found)),
    }
}

pub(crate) fn pointer_ref(src: &dyn Native) -> Result<&dyn PointerAccess, CodecError> {
    match src.reflect_ref() {
        NativeRef::Pointer(pointer) => Ok(pointer),
        _ => Err(native_mismatch("pointer", src.descriptor().type_name)),
    }
}
