use std::sync::Arc;

use ravro_core::{CodecError, Reader, Schema, Value, Writer};

use super::{Decoder, Encoder, decoder_of_type, encoder_of_type, native_mismatch};
use crate::{config::Api, native::Native, scope::BuildScope};

fn resolved(schema: &Schema) -> Schema {
    schema.resolve().unwrap_or_else(|_| schema.clone())
}

/// Decodes the generic form of the schema, then hands it to the type's own
/// [`Marshal::unmarshal`](crate::Marshal::unmarshal).
pub(crate) struct MarshalDecoder {
    schema: Schema,
    generic: Arc<dyn Decoder>,
}

impl MarshalDecoder {
    pub(crate) fn new(scope: &mut BuildScope<'_>, schema: &Schema) -> Self {
        Self {
            schema: resolved(schema),
            generic: decoder_of_type(scope, schema, Value::type_descriptor()),
        }
    }
}

impl Decoder for MarshalDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let mut value = Value::Null;
        self.generic.decode(&mut value, reader, api)?;
        let found = dest.descriptor().type_name;
        dest.as_marshal_mut()
            .ok_or_else(|| native_mismatch("marshal", found))?
            .unmarshal(&self.schema, value)
    }
}

pub(crate) struct MarshalEncoder {
    schema: Schema,
    generic: Arc<dyn Encoder>,
}

impl MarshalEncoder {
    pub(crate) fn new(scope: &mut BuildScope<'_>, schema: &Schema) -> Self {
        Self {
            schema: resolved(schema),
            generic: encoder_of_type(scope, schema, Value::type_descriptor()),
        }
    }
}

impl Encoder for MarshalEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        let marshal = src
            .as_marshal()
            .ok_or_else(|| native_mismatch("marshal", src.descriptor().type_name))?;
        let value = marshal.marshal(&self.schema)?;
        self.generic.encode(&value, writer, api)
    }
}
