//! Codecs for [`Dynamic`] slots, whose concrete type is chosen when a value
//! is decoded rather than when the codec is built.

use std::sync::Arc;

use ravro_core::{CodecError, Reader, Schema, SchemaKind, Value, Writer};

use super::{Decoder, Encoder, decoder_of_type, pointer_mut, source_ref, target_mut};
use crate::{
    config::Api,
    native::{Dynamic, Native, NativeRef},
    scope::BuildScope,
};

pub(crate) struct DynamicDecoder {
    schema: Schema,
    /// Decoder into the generic receiver, for empty slots and `Value` contents.
    generic: Arc<dyn Decoder>,
    null: bool,
}

impl DynamicDecoder {
    pub(crate) fn new(scope: &mut BuildScope<'_>, schema: &Schema) -> Self {
        let null = schema
            .resolve()
            .is_ok_and(|resolved| resolved.kind() == SchemaKind::Null);
        Self {
            schema: schema.clone(),
            generic: decoder_of_type(scope, schema, Value::type_descriptor()),
            null,
        }
    }
}

impl Decoder for DynamicDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let slot = target_mut::<Dynamic>(dest)?;
        if self.null {
            reader.read_null()?;
            slot.clear();
            return Ok(());
        }
        if slot.is_empty() {
            let mut value = Value::Null;
            self.generic.decode(&mut value, reader, api)?;
            slot.set(value);
            return Ok(());
        }
        let Some(current) = slot.get_mut() else {
            return Ok(());
        };
        if current.is::<Value>() {
            return self.generic.decode(current, reader, api);
        }
        // A seeded object keeps its type. A null pointer is allocated first.
        let null_pointer = matches!(current.reflect_ref(), NativeRef::Pointer(p) if p.is_null());
        if null_pointer {
            let pointee = pointer_mut(current)?.allocate();
            return api.read_value(&self.schema, reader, pointee);
        }
        api.read_value(&self.schema, reader, current)
    }
}

/// Writes whatever a slot holds by resolving an encoder for its concrete
/// type. An empty slot is written as null.
pub(crate) struct DynamicEncoder {
    schema: Schema,
}

impl DynamicEncoder {
    pub(crate) fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }
}

impl Encoder for DynamicEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        match source_ref::<Dynamic>(src)?.get() {
            Some(current) => api.write_value(&self.schema, writer, current),
            None => api.write_value(&self.schema, writer, &Value::Null),
        }
    }
}
