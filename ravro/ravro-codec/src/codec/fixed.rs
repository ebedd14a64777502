use std::sync::Arc;

use bytes::Bytes;
use ravro_core::{CodecError, Reader, Schema, SchemaKind, Value, Writer};

use super::{Decoder, Encoder, native_mismatch, source_ref, target_mut, unsupported};
use crate::{
    config::Api,
    native::{Descriptor, Native, NativeMut, NativeRef, ScalarKind, Shape},
};

#[derive(Clone, Copy)]
enum FixedTarget {
    /// `[u8; N]` with `N` equal to the schema size.
    Array,
    /// `Bytes`, length checked on every value.
    Bytes,
    Generic,
}

pub(crate) struct FixedCodec {
    size: usize,
    target: FixedTarget,
}

pub(crate) fn accepts_scalar(kind: SchemaKind, scalar: ScalarKind) -> bool {
    kind == SchemaKind::Fixed && scalar == ScalarKind::Bytes
}

fn target(size: usize, native: Descriptor) -> Option<FixedTarget> {
    match native.shape {
        Shape::Fixed(n) if n == size => Some(FixedTarget::Array),
        Shape::Scalar(ScalarKind::Bytes) => Some(FixedTarget::Bytes),
        Shape::Generic => Some(FixedTarget::Generic),
        _ => None,
    }
}

pub(crate) fn decoder(schema: &Schema, size: usize, native: Descriptor) -> Arc<dyn Decoder> {
    match target(size, native) {
        Some(target) => Arc::new(FixedCodec { size, target }),
        None => unsupported(schema, native),
    }
}

pub(crate) fn encoder(schema: &Schema, size: usize, native: Descriptor) -> Arc<dyn Encoder> {
    match target(size, native) {
        Some(target) => Arc::new(FixedCodec { size, target }),
        None => unsupported(schema, native),
    }
}

impl FixedCodec {
    fn check(&self, actual: usize) -> Result<(), CodecError> {
        if actual != self.size {
            return Err(CodecError::FixedLength {
                expected: self.size,
                actual,
            });
        }
        Ok(())
    }
}

impl Decoder for FixedCodec {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        _: &Api,
    ) -> Result<(), CodecError> {
        let data = reader.read_fixed(self.size)?;
        match self.target {
            FixedTarget::Array => {
                let found = dest.descriptor().type_name;
                let NativeMut::Fixed(buf) = dest.reflect_mut() else {
                    return Err(native_mismatch("byte array", found));
                };
                self.check(buf.len())?;
                buf.copy_from_slice(&data);
            }
            FixedTarget::Bytes => *target_mut::<Bytes>(dest)? = data,
            FixedTarget::Generic => *target_mut::<Value>(dest)? = Value::Fixed(data),
        }
        Ok(())
    }
}

impl Encoder for FixedCodec {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, _: &Api) -> Result<(), CodecError> {
        let data: &[u8] = match self.target {
            FixedTarget::Array => match src.reflect_ref() {
                NativeRef::Fixed(buf) => buf,
                _ => return Err(native_mismatch("byte array", src.descriptor().type_name)),
            },
            FixedTarget::Bytes => &source_ref::<Bytes>(src)?[..],
            FixedTarget::Generic => match source_ref::<Value>(src)? {
                Value::Fixed(b) | Value::Bytes(b) => &b[..],
                other => {
                    return Err(CodecError::TypeMismatch {
                        expected: "fixed".into(),
                        found: other.variant_name().into(),
                    });
                }
            },
        };
        self.check(data.len())?;
        writer.write_fixed(data);
        Ok(())
    }
}
