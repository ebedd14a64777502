//! Block container codecs for arrays and maps.
//!
//! Wire shape: blocks of `count, item*`, ended by a zero count. A negative
//! count is followed by the block's byte size; both forms are read, only the
//! positive one is written.

use std::sync::Arc;

use ravro_core::{CodecError, Reader, Schema, Value, Writer};

use super::{
    Decoder, Encoder, decoder_of_type, encoder_of_type, map_mut, map_ref, sequence_mut,
    sequence_ref, source_ref, target_mut, unsupported,
};
use crate::{
    config::Api,
    native::{Descriptor, MapAccess, Native, SequenceAccess, Shape},
    scope::BuildScope,
};

/// Add one block's items to a running total, enforcing the allocation limit.
fn grow(total: usize, count: usize, limit: usize, what: &'static str) -> Result<usize, CodecError> {
    match total.checked_add(count) {
        Some(next) if next <= limit => Ok(next),
        next => Err(CodecError::SizeLimit {
            what,
            size: next.map_or(u64::MAX, |n| n as u64),
            limit: limit as u64,
        }),
    }
}

/// Write `len` items as blocks of at most `block_length` items.
///
/// Each block is staged in a pooled scratch writer. Its count is the number
/// of items that encoded successfully, so a failing item still leaves a
/// consistent block behind before the error is returned.
pub(crate) fn write_blocks(
    len: usize,
    block_length: usize,
    writer: &mut Writer,
    api: &Api,
    mut encode_item: impl FnMut(usize, &mut Writer) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let block_length = block_length.max(1);
    let mut start = 0;
    while start < len {
        let end = len.min(start.saturating_add(block_length));
        let mut scratch = api.borrow_writer();
        let mut count = 0;
        let mut committed = 0;
        let mut failure = None;
        for index in start..end {
            match encode_item(index, &mut *scratch) {
                Ok(()) => {
                    count += 1;
                    committed = scratch.len();
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if count > 0 {
            writer.write_block_header(count);
            writer.write_raw(&scratch.buffer()[..committed]);
        }
        if let Some(e) = failure {
            return Err(e);
        }
        start = end;
    }
    writer.write_block_header(0);
    Ok(())
}

fn generic_array(value: &mut Value) -> &mut Vec<Value> {
    if !matches!(value, Value::Array(_)) {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("value was just made an array"),
    }
}

fn generic_map(value: &mut Value) -> &mut std::collections::BTreeMap<String, Value> {
    if !matches!(value, Value::Map(_)) {
        *value = Value::Map(Default::default());
    }
    match value {
        Value::Map(entries) => entries,
        _ => unreachable!("value was just made a map"),
    }
}

// ── arrays ───────────────────────────────────────────────────────────────────

pub(crate) struct ArrayDecoder {
    item: Arc<dyn Decoder>,
    generic: bool,
    max_items: usize,
    type_name: &'static str,
}

pub(crate) fn array_decoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    items: &Schema,
    native: Descriptor,
) -> Arc<dyn Decoder> {
    let (item, generic) = match native.shape {
        Shape::Sequence { item } => (item(), false),
        Shape::Generic => (Value::type_descriptor(), true),
        _ => return unsupported(schema, native),
    };
    Arc::new(ArrayDecoder {
        item: decoder_of_type(scope, items, item),
        generic,
        max_items: scope.api().config().max_slice_alloc_size,
        type_name: native.type_name,
    })
}

impl ArrayDecoder {
    fn read_blocks(
        &self,
        seq: &mut dyn SequenceAccess,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let mut size = 0;
        loop {
            let header = reader.read_block_header()?;
            if header.is_end() {
                break;
            }
            let start = size;
            size = grow(size, header.count, self.max_items, "array")?;
            // Grow per item: the header count is untrusted until items arrive.
            for index in start..size {
                seq.resize(index + 1);
                let item = seq
                    .get_mut(index)
                    .ok_or_else(|| CodecError::Native(format!("array item {index} is missing")))?;
                self.item.decode(item, reader, api)?;
            }
        }
        seq.resize(size);
        Ok(())
    }
}

impl Decoder for ArrayDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let seq: &mut dyn SequenceAccess = if self.generic {
            generic_array(target_mut::<Value>(dest)?)
        } else {
            sequence_mut(dest)?
        };
        self.read_blocks(seq, reader, api)
            .map_err(|e| e.within(self.type_name))
    }
}

pub(crate) struct ArrayEncoder {
    item: Arc<dyn Encoder>,
    generic: bool,
    block_length: usize,
    type_name: &'static str,
}

pub(crate) fn array_encoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    items: &Schema,
    native: Descriptor,
) -> Arc<dyn Encoder> {
    let (item, generic) = match native.shape {
        Shape::Sequence { item } => (item(), false),
        Shape::Generic => (Value::type_descriptor(), true),
        _ => return unsupported(schema, native),
    };
    Arc::new(ArrayEncoder {
        item: encoder_of_type(scope, items, item),
        generic,
        block_length: scope.api().config().block_length,
        type_name: native.type_name,
    })
}

impl Encoder for ArrayEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        let seq: &dyn SequenceAccess = if self.generic {
            match source_ref::<Value>(src)? {
                Value::Array(items) => items as &dyn SequenceAccess,
                other => {
                    return Err(CodecError::TypeMismatch {
                        expected: "array".into(),
                        found: other.variant_name().into(),
                    });
                }
            }
        } else {
            sequence_ref(src)?
        };
        write_blocks(seq.len(), self.block_length, writer, api, |index, scratch| {
            let item = seq
                .get(index)
                .ok_or_else(|| CodecError::Native(format!("array item {index} is missing")))?;
            self.item.encode(item, scratch, api)
        })
        .map_err(|e| e.within(self.type_name))
    }
}

// ── maps ─────────────────────────────────────────────────────────────────────

pub(crate) struct MapDecoder {
    value: Arc<dyn Decoder>,
    generic: bool,
    max_items: usize,
    type_name: &'static str,
}

pub(crate) fn map_decoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    values: &Schema,
    native: Descriptor,
) -> Arc<dyn Decoder> {
    let (value, generic) = match native.shape {
        Shape::Map { value } => (value(), false),
        Shape::Generic => (Value::type_descriptor(), true),
        _ => return unsupported(schema, native),
    };
    Arc::new(MapDecoder {
        value: decoder_of_type(scope, values, value),
        generic,
        max_items: scope.api().config().max_slice_alloc_size,
        type_name: native.type_name,
    })
}

impl MapDecoder {
    fn read_blocks(
        &self,
        map: &mut dyn MapAccess,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let mut total = 0;
        loop {
            let header = reader.read_block_header()?;
            if header.is_end() {
                return Ok(());
            }
            total = grow(total, header.count, self.max_items, "map")?;
            for _ in 0..header.count {
                let key = reader.read_string()?;
                self.value.decode(map.entry_mut(key), reader, api)?;
            }
        }
    }
}

impl Decoder for MapDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let map: &mut dyn MapAccess = if self.generic {
            generic_map(target_mut::<Value>(dest)?)
        } else {
            map_mut(dest)?
        };
        self.read_blocks(map, reader, api)
            .map_err(|e| e.within(self.type_name))
    }
}

pub(crate) struct MapEncoder {
    value: Arc<dyn Encoder>,
    generic: bool,
    block_length: usize,
    type_name: &'static str,
}

pub(crate) fn map_encoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    values: &Schema,
    native: Descriptor,
) -> Arc<dyn Encoder> {
    let (value, generic) = match native.shape {
        Shape::Map { value } => (value(), false),
        Shape::Generic => (Value::type_descriptor(), true),
        _ => return unsupported(schema, native),
    };
    Arc::new(MapEncoder {
        value: encoder_of_type(scope, values, value),
        generic,
        block_length: scope.api().config().block_length,
        type_name: native.type_name,
    })
}

impl Encoder for MapEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        let map: &dyn MapAccess = if self.generic {
            match source_ref::<Value>(src)? {
                Value::Map(entries) => entries as &dyn MapAccess,
                other => {
                    return Err(CodecError::TypeMismatch {
                        expected: "map".into(),
                        found: other.variant_name().into(),
                    });
                }
            }
        } else {
            map_ref(src)?
        };
        let entries = map.entries();
        write_blocks(entries.len(), self.block_length, writer, api, |index, scratch| {
            let (key, value) = entries[index];
            scratch.write_string(key);
            self.value.encode(value, scratch, api)
        })
        .map_err(|e| e.within(self.type_name))
    }
}
