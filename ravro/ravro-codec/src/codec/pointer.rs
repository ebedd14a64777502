use std::sync::Arc;

use ravro_core::{CodecError, Reader, Writer};

use super::{Decoder, Encoder, pointer_mut, pointer_ref};
use crate::{config::Api, native::Native};

/// Decodes into the pointee, allocating it when the pointer is null.
pub(crate) struct PointerDecoder {
    inner: Arc<dyn Decoder>,
}

impl PointerDecoder {
    pub(crate) fn new(inner: Arc<dyn Decoder>) -> Self {
        Self { inner }
    }
}

impl Decoder for PointerDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let pointee = pointer_mut(dest)?.allocate();
        self.inner.decode(pointee, reader, api)
    }
}

/// Encodes the pointee of an optional value. The schema has no null branch,
/// so an absent value cannot be written.
pub(crate) struct NullablePointerEncoder {
    inner: Arc<dyn Encoder>,
}

impl NullablePointerEncoder {
    pub(crate) fn new(inner: Arc<dyn Encoder>) -> Self {
        Self { inner }
    }
}

impl Encoder for NullablePointerEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        match pointer_ref(src)?.get() {
            Some(pointee) => self.inner.encode(pointee, writer, api),
            None => Err(CodecError::NullReference),
        }
    }
}

pub(crate) struct BoxEncoder {
    inner: Arc<dyn Encoder>,
}

impl BoxEncoder {
    pub(crate) fn new(inner: Arc<dyn Encoder>) -> Self {
        Self { inner }
    }
}

impl Encoder for BoxEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        let pointee = pointer_ref(src)?
            .get()
            .ok_or(CodecError::NullReference)?;
        self.inner.encode(pointee, writer, api)
    }
}
