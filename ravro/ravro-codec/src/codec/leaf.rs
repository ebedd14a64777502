use std::sync::Arc;

use bytes::Bytes;
use ravro_core::{CodecError, Reader, Schema, SchemaKind, Value, Writer};

use super::{Decoder, Encoder, source_ref, target_mut, unsupported};
use crate::{
    config::Api,
    native::{Descriptor, Native, ScalarKind, Shape},
};

/// Primitive conversion selected once at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeafOp {
    Null,
    Bool,
    IntToI32,
    IntToI64,
    LongToI64,
    LongToI32,
    LongToU32,
    FloatToF32,
    FloatToF64,
    DoubleToF64,
    String,
    Bytes,
    /// Into or out of a [`Value`], tagged with the schema kind.
    Generic(SchemaKind),
}

impl LeafOp {
    pub(crate) fn select(kind: SchemaKind, shape: Shape) -> Option<Self> {
        use ScalarKind as S;
        use SchemaKind as K;

        let op = match (kind, shape) {
            (_, Shape::Generic) if kind.is_primitive() => Self::Generic(kind),
            (K::Null, Shape::Unit) => Self::Null,
            (K::Boolean, Shape::Scalar(S::Bool)) => Self::Bool,
            (K::Int, Shape::Scalar(S::I32)) => Self::IntToI32,
            (K::Int, Shape::Scalar(S::I64)) => Self::IntToI64,
            (K::Long, Shape::Scalar(S::I64)) => Self::LongToI64,
            (K::Long, Shape::Scalar(S::I32)) => Self::LongToI32,
            (K::Long, Shape::Scalar(S::U32)) => Self::LongToU32,
            (K::Float, Shape::Scalar(S::F32)) => Self::FloatToF32,
            (K::Float, Shape::Scalar(S::F64)) => Self::FloatToF64,
            (K::Double, Shape::Scalar(S::F64)) => Self::DoubleToF64,
            (K::String, Shape::Scalar(S::String)) => Self::String,
            (K::Bytes, Shape::Scalar(S::Bytes)) => Self::Bytes,
            _ => return None,
        };
        Some(op)
    }
}

pub(crate) struct LeafCodec {
    op: LeafOp,
}

pub(crate) fn decoder(schema: &Schema, native: Descriptor) -> Arc<dyn Decoder> {
    match LeafOp::select(schema.kind(), native.shape) {
        Some(op) => Arc::new(LeafCodec { op }),
        None => unsupported(schema, native),
    }
}

pub(crate) fn encoder(schema: &Schema, native: Descriptor) -> Arc<dyn Encoder> {
    match LeafOp::select(schema.kind(), native.shape) {
        Some(op) => Arc::new(LeafCodec { op }),
        None => unsupported(schema, native),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::IntegerRange { value, target })
}

/// `f64` to `f32`, refusing values that do not survive the round trip.
fn narrow_float(value: f64) -> Result<f32, CodecError> {
    let narrowed = value as f32;
    if f64::from(narrowed) == value || value.is_nan() {
        Ok(narrowed)
    } else {
        Err(CodecError::FloatPrecision(value))
    }
}

impl Decoder for LeafCodec {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        _: &Api,
    ) -> Result<(), CodecError> {
        match self.op {
            LeafOp::Null => reader.read_null(),
            LeafOp::Bool => {
                *target_mut::<bool>(dest)? = reader.read_bool()?;
                Ok(())
            }
            LeafOp::IntToI32 => {
                *target_mut::<i32>(dest)? = reader.read_int()?;
                Ok(())
            }
            LeafOp::IntToI64 => {
                *target_mut::<i64>(dest)? = i64::from(reader.read_int()?);
                Ok(())
            }
            LeafOp::LongToI64 => {
                *target_mut::<i64>(dest)? = reader.read_long()?;
                Ok(())
            }
            LeafOp::LongToI32 => {
                *target_mut::<i32>(dest)? = narrow(reader.read_long()?, "i32")?;
                Ok(())
            }
            LeafOp::LongToU32 => {
                *target_mut::<u32>(dest)? = narrow(reader.read_long()?, "u32")?;
                Ok(())
            }
            LeafOp::FloatToF32 => {
                *target_mut::<f32>(dest)? = reader.read_float()?;
                Ok(())
            }
            LeafOp::FloatToF64 => {
                *target_mut::<f64>(dest)? = f64::from(reader.read_float()?);
                Ok(())
            }
            LeafOp::DoubleToF64 => {
                *target_mut::<f64>(dest)? = reader.read_double()?;
                Ok(())
            }
            LeafOp::String => {
                *target_mut::<String>(dest)? = reader.read_string()?;
                Ok(())
            }
            LeafOp::Bytes => {
                *target_mut::<Bytes>(dest)? = reader.read_bytes()?;
                Ok(())
            }
            LeafOp::Generic(kind) => {
                *target_mut::<Value>(dest)? = read_generic(kind, reader)?;
                Ok(())
            }
        }
    }
}

impl Encoder for LeafCodec {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, _: &Api) -> Result<(), CodecError> {
        match self.op {
            LeafOp::Null => writer.write_null(),
            LeafOp::Bool => writer.write_bool(*source_ref::<bool>(src)?),
            LeafOp::IntToI32 => writer.write_int(*source_ref::<i32>(src)?),
            LeafOp::IntToI64 => writer.write_int(narrow(*source_ref::<i64>(src)?, "int")?),
            LeafOp::LongToI64 => writer.write_long(*source_ref::<i64>(src)?),
            LeafOp::LongToI32 => writer.write_long(i64::from(*source_ref::<i32>(src)?)),
            LeafOp::LongToU32 => writer.write_long(i64::from(*source_ref::<u32>(src)?)),
            LeafOp::FloatToF32 => writer.write_float(*source_ref::<f32>(src)?),
            LeafOp::FloatToF64 => writer.write_float(narrow_float(*source_ref::<f64>(src)?)?),
            LeafOp::DoubleToF64 => writer.write_double(*source_ref::<f64>(src)?),
            LeafOp::String => writer.write_string(source_ref::<String>(src)?),
            LeafOp::Bytes => writer.write_bytes(source_ref::<Bytes>(src)?),
            LeafOp::Generic(kind) => write_generic(kind, source_ref::<Value>(src)?, writer)?,
        }
        Ok(())
    }
}

fn read_generic(kind: SchemaKind, reader: &mut Reader) -> Result<Value, CodecError> {
    Ok(match kind {
        SchemaKind::Null => Value::Null,
        SchemaKind::Boolean => Value::Boolean(reader.read_bool()?),
        SchemaKind::Int => Value::Int(reader.read_int()?),
        SchemaKind::Long => Value::Long(reader.read_long()?),
        SchemaKind::Float => Value::Float(reader.read_float()?),
        SchemaKind::Double => Value::Double(reader.read_double()?),
        SchemaKind::String => Value::from(reader.read_string()?),
        SchemaKind::Bytes => Value::Bytes(reader.read_bytes()?),
        other => {
            return Err(CodecError::Unsupported {
                native: "Value".into(),
                schema: other.to_string(),
            });
        }
    })
}

/// Write a generic value as a primitive. Numbers widen; long into int is
/// range-checked and double into float must be exact.
fn write_generic(kind: SchemaKind, value: &Value, writer: &mut Writer) -> Result<(), CodecError> {
    match (kind, value) {
        (SchemaKind::Null, Value::Null) => writer.write_null(),
        (SchemaKind::Boolean, Value::Boolean(v)) => writer.write_bool(*v),
        (SchemaKind::Int, Value::Int(v)) => writer.write_int(*v),
        (SchemaKind::Int, Value::Long(v)) => writer.write_int(narrow(*v, "int")?),
        (SchemaKind::Long, Value::Int(v)) => writer.write_long(i64::from(*v)),
        (SchemaKind::Long, Value::Long(v)) => writer.write_long(*v),
        (SchemaKind::Float, Value::Float(v)) => writer.write_float(*v),
        (SchemaKind::Float, Value::Double(v)) => writer.write_float(narrow_float(*v)?),
        (SchemaKind::Float, Value::Int(v)) => writer.write_float(*v as f32),
        (SchemaKind::Float, Value::Long(v)) => writer.write_float(*v as f32),
        (SchemaKind::Double, Value::Double(v)) => writer.write_double(*v),
        (SchemaKind::Double, Value::Float(v)) => writer.write_double(f64::from(*v)),
        (SchemaKind::Double, Value::Int(v)) => writer.write_double(f64::from(*v)),
        (SchemaKind::Double, Value::Long(v)) => writer.write_double(*v as f64),
        (SchemaKind::String, Value::String(v) | Value::Enum(v)) => writer.write_string(v),
        (SchemaKind::Bytes, Value::Bytes(v) | Value::Fixed(v)) => writer.write_bytes(v),
        (SchemaKind::Bytes, Value::String(v)) => writer.write_bytes(v.as_bytes()),
        (kind, value) => {
            return Err(CodecError::TypeMismatch {
                expected: kind.to_string(),
                found: value.variant_name().to_owned(),
            });
        }
    }
    Ok(())
}
