use std::sync::Arc;

use bytes::Bytes;
use log::trace;
use ravro_core::{CodecError, Field, Reader, Writer};

use super::{Decoder, ErrorCodec, decoder_of_type};
use crate::{
    config::Api,
    native::{Descriptor, Native},
    scope::BuildScope,
};

/// Wire bytes of a field's default, encoded once per field and cached on it.
pub(crate) fn encoded(api: &Api, field: &Field) -> Result<Bytes, CodecError> {
    field.encode_default(|value| {
        trace!("materializing default of field '{}'", field.name());
        let mut writer = api.borrow_writer();
        api.write_value(field.schema(), &mut writer, value)?;
        Ok(writer.to_bytes())
    })
}

/// Fills a field that is absent from the input with its default.
///
/// The default is kept in encoded form and replayed through the field's
/// ordinary decoder, so it lands in the native type exactly as wire data would.
pub(crate) struct DefaultDecoder {
    data: Bytes,
    decoder: Arc<dyn Decoder>,
}

pub(crate) fn decoder(
    scope: &mut BuildScope<'_>,
    field: &Field,
    native: Descriptor,
) -> Arc<dyn Decoder> {
    match encoded(scope.api(), field) {
        Ok(data) => Arc::new(DefaultDecoder {
            data,
            decoder: decoder_of_type(scope, field.schema(), native),
        }),
        Err(source) => ErrorCodec::shared(CodecError::DecodeDefault {
            field: field.name().to_owned(),
            source: Box::new(source),
        }),
    }
}

impl Decoder for DefaultDecoder {
    fn decode(&self, dest: &mut dyn Native, _: &mut Reader, api: &Api) -> Result<(), CodecError> {
        let mut reader = api.reader(self.data.clone());
        self.decoder.decode(dest, &mut reader, api)
    }
}

/// Write a field's default in place of a value the source does not have.
pub(crate) fn write(
    api: &Api,
    record: &str,
    field: &Field,
    writer: &mut Writer,
) -> Result<(), CodecError> {
    match encoded(api, field) {
        Ok(data) => {
            writer.write_raw(&data);
            Ok(())
        }
        Err(CodecError::NoDefault(_)) => Err(CodecError::MissingField {
            record: record.to_owned(),
            field: field.name().to_owned(),
        }),
        Err(e) => Err(e),
    }
}
