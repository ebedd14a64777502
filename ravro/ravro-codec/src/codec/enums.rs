use std::sync::Arc;

use ravro_core::{CodecError, EnumSchema, Reader, Schema, SchemaKind, Value, Writer};

use super::{Decoder, Encoder, native_mismatch, source_ref, target_mut, unsupported};
use crate::{
    config::Api,
    native::{Descriptor, Native, NativeMut, NativeRef, ScalarKind, Shape},
};

enum EnumTarget {
    /// Unit enum; schema ordinal to variant and variant to schema ordinal.
    Native {
        to_variant: Vec<Option<usize>>,
        to_ordinal: Vec<Option<usize>>,
    },
    /// `String` holding the symbol.
    Symbol,
    Generic,
}

/// Maps schema ordinals to the native representation.
pub(crate) struct EnumCodec {
    symbols: Vec<String>,
    target: EnumTarget,
}

pub(crate) fn accepts_scalar(kind: SchemaKind, scalar: ScalarKind) -> bool {
    kind == SchemaKind::Enum && scalar == ScalarKind::String
}

fn build(schema: &EnumSchema, native: Descriptor) -> Option<EnumCodec> {
    let target = match native.shape {
        Shape::Enum(variants) => EnumTarget::Native {
            to_variant: schema
                .symbols()
                .iter()
                .map(|s| variants.iter().position(|v| v == s))
                .collect(),
            to_ordinal: variants.iter().map(|v| schema.ordinal(v)).collect(),
        },
        Shape::Scalar(ScalarKind::String) => EnumTarget::Symbol,
        Shape::Generic => EnumTarget::Generic,
        _ => return None,
    };
    Some(EnumCodec {
        symbols: schema.symbols().to_vec(),
        target,
    })
}

pub(crate) fn decoder(schema: &Schema, e: &EnumSchema, native: Descriptor) -> Arc<dyn Decoder> {
    match build(e, native) {
        Some(codec) => Arc::new(codec),
        None => unsupported(schema, native),
    }
}

pub(crate) fn encoder(schema: &Schema, e: &EnumSchema, native: Descriptor) -> Arc<dyn Encoder> {
    match build(e, native) {
        Some(codec) => Arc::new(codec),
        None => unsupported(schema, native),
    }
}

impl EnumCodec {
    fn ordinal_of(&self, symbol: &str) -> Result<usize, CodecError> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| CodecError::UnknownEnumSymbol(symbol.to_owned()))
    }
}

impl Decoder for EnumCodec {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        _: &Api,
    ) -> Result<(), CodecError> {
        let raw = reader.read_int()?;
        let ordinal = usize::try_from(raw)
            .ok()
            .filter(|&i| i < self.symbols.len())
            .ok_or(CodecError::EnumOrdinalOutOfRange {
                ordinal: i64::from(raw),
                symbols: self.symbols.len(),
            })?;
        let symbol = &self.symbols[ordinal];
        match &self.target {
            EnumTarget::Native { to_variant, .. } => {
                let variant = to_variant[ordinal]
                    .ok_or_else(|| CodecError::UnknownEnumSymbol(symbol.clone()))?;
                let found = dest.descriptor().type_name;
                let NativeMut::Enum(access) = dest.reflect_mut() else {
                    return Err(native_mismatch("enum", found));
                };
                if !access.set_variant_index(variant) {
                    return Err(CodecError::UnknownEnumSymbol(symbol.clone()));
                }
            }
            EnumTarget::Symbol => *target_mut::<String>(dest)? = symbol.clone(),
            EnumTarget::Generic => *target_mut::<Value>(dest)? = Value::symbol(symbol),
        }
        Ok(())
    }
}

impl Encoder for EnumCodec {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, _: &Api) -> Result<(), CodecError> {
        let ordinal = match &self.target {
            EnumTarget::Native { to_ordinal, .. } => {
                let NativeRef::Enum(access) = src.reflect_ref() else {
                    return Err(native_mismatch("enum", src.descriptor().type_name));
                };
                let variant = access.variant_index();
                to_ordinal.get(variant).copied().flatten().ok_or_else(|| {
                    CodecError::UnknownEnumSymbol(format!(
                        "variant {variant} of {}",
                        src.descriptor().type_name
                    ))
                })?
            }
            EnumTarget::Symbol => self.ordinal_of(source_ref::<String>(src)?)?,
            EnumTarget::Generic => match source_ref::<Value>(src)? {
                Value::Enum(s) | Value::String(s) => self.ordinal_of(s)?,
                other => {
                    return Err(CodecError::TypeMismatch {
                        expected: "enum".into(),
                        found: other.variant_name().into(),
                    });
                }
            },
        };
        writer.write_int(ordinal as i32);
        Ok(())
    }
}
