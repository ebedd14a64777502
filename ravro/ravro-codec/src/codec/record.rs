//! Record codecs.
//!
//! A record codec is registered in the build scope before its fields are
//! built. A field that leads back to the same record gets a [`Weak`] handle
//! to the codec under construction, so recursive schemas build in finite
//! time and the finished tree holds no reference cycle.

use std::sync::{Arc, OnceLock, Weak};

use log::{debug, trace};
use ravro_core::{CodecError, Field, FieldAction, Reader, Schema, SchemaNode, Value, Writer};

use super::{
    Decoder, Encoder, decoder_of_type, default, encoder_of_type, record_mut, record_ref,
    source_ref, target_mut, unsupported,
};
use crate::{
    config::Api,
    native::{Descriptor, Native, RecordAccess, RecordInfo, Shape},
    scope::BuildScope,
};

#[derive(Clone, Copy)]
enum RecordTarget {
    Native(&'static RecordInfo),
    Generic,
}

impl RecordTarget {
    fn of(native: Descriptor) -> Option<Self> {
        match native.shape {
            Shape::Record(info) => Some(Self::Native(info)),
            Shape::Generic => Some(Self::Generic),
            _ => None,
        }
    }

    /// Native slot and descriptor for a schema field, matched by name first
    /// and by alias second. Generic records use the schema position.
    fn slot(&self, position: usize, field: &Field) -> Option<(usize, Descriptor)> {
        match self {
            Self::Generic => Some((position, Value::type_descriptor())),
            Self::Native(info) => info
                .fields
                .iter()
                .position(|f| f.name == field.name())
                .or_else(|| {
                    info.fields
                        .iter()
                        .position(|f| field.aliases().iter().any(|a| a == f.name))
                })
                .map(|index| (index, (info.fields[index].descriptor)())),
        }
    }
}

fn dropped() -> CodecError {
    CodecError::Native("recursive record codec was dropped".into())
}

fn unbuilt(record: &str) -> CodecError {
    CodecError::Native(format!("record codec {record} used before it was built"))
}

/// Schema-ordered fields of a generic record, seen through [`RecordAccess`].
struct GenericFields<'a>(&'a mut Vec<(String, Value)>);

impl RecordAccess for GenericFields<'_> {
    fn field(&self, index: usize) -> Option<&dyn Native> {
        self.0.get(index).map(|(_, v)| v as &dyn Native)
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Native> {
        self.0.get_mut(index).map(|(_, v)| v as &mut dyn Native)
    }
}

// ── decoding ─────────────────────────────────────────────────────────────────

enum Slot {
    Field(usize),
    /// The native type has no such field; the wire value is read and dropped.
    Skip,
}

struct FieldDecoder {
    name: String,
    slot: Slot,
    /// `None` when the field is neither on the wire nor defaulted.
    decoder: Option<Arc<dyn Decoder>>,
}

pub(crate) struct RecordDecoder {
    name: String,
    type_name: &'static str,
    target: RecordTarget,
    fields: OnceLock<Vec<FieldDecoder>>,
}

pub(crate) fn decoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    native: Descriptor,
) -> Arc<dyn Decoder> {
    let (SchemaNode::Record(record), Some(target)) = (schema.node(), RecordTarget::of(native))
    else {
        return unsupported(schema, native);
    };
    if let Some(seen) = scope.seen_decoder(record.name(), native.type_id) {
        trace!("record decoder {} reused within build", record.name());
        return Arc::new(RecursiveDecoder(Arc::downgrade(seen)));
    }
    debug!("building record decoder {} into {}", record.name(), native.type_name);

    let decoder = Arc::new(RecordDecoder {
        name: record.name().to_owned(),
        type_name: native.type_name,
        target,
        fields: OnceLock::new(),
    });
    scope.add_decoder(record.name(), native.type_id, decoder.clone());

    let fields = record
        .fields()
        .iter()
        .enumerate()
        .map(|(position, field)| field_decoder(scope, target, position, field))
        .collect();
    let _ = decoder.fields.set(fields);
    decoder
}

fn field_decoder(
    scope: &mut BuildScope<'_>,
    target: RecordTarget,
    position: usize,
    field: &Field,
) -> FieldDecoder {
    let name = field.name().to_owned();
    match (target.slot(position, field), field.action()) {
        (Some((index, native)), FieldAction::Read) => FieldDecoder {
            name,
            slot: Slot::Field(index),
            decoder: Some(decoder_of_type(scope, field.schema(), native)),
        },
        (None, FieldAction::Read) => FieldDecoder {
            name,
            slot: Slot::Skip,
            decoder: Some(decoder_of_type(
                scope,
                field.schema(),
                Value::type_descriptor(),
            )),
        },
        (Some((index, native)), FieldAction::SetDefault) => FieldDecoder {
            name,
            slot: Slot::Field(index),
            decoder: field
                .has_default()
                .then(|| default::decoder(scope, field, native)),
        },
        (None, FieldAction::SetDefault) => FieldDecoder {
            name,
            slot: Slot::Skip,
            decoder: None,
        },
    }
}

impl RecordDecoder {
    fn decode_fields(
        &self,
        record: &mut dyn RecordAccess,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let fields = self.fields.get().ok_or_else(|| unbuilt(&self.name))?;
        for field in fields {
            let Some(decoder) = &field.decoder else {
                continue;
            };
            let result = match field.slot {
                Slot::Field(index) => match record.field_mut(index) {
                    Some(slot) => decoder.decode(slot, reader, api),
                    None => Err(CodecError::Native(format!(
                        "{} has no field at position {index}",
                        self.type_name
                    ))),
                },
                Slot::Skip => decoder.decode(&mut Value::Null, reader, api),
            };
            result.map_err(|e| e.within(format!("{}.{}", self.name, field.name)))?;
        }
        Ok(())
    }

    /// Shape a generic value as this record, keeping it when it already has
    /// the same field names in the same order.
    fn generic_fields<'v>(&self, value: &'v mut Value) -> Result<GenericFields<'v>, CodecError> {
        let fields = self.fields.get().ok_or_else(|| unbuilt(&self.name))?;
        let matching = matches!(
            value,
            Value::Record(entries)
                if entries.len() == fields.len()
                    && entries.iter().zip(fields).all(|((k, _), f)| *k == f.name)
        );
        if !matching {
            *value = Value::Record(
                fields
                    .iter()
                    .map(|f| (f.name.clone(), Value::Null))
                    .collect(),
            );
        }
        match value {
            Value::Record(entries) => Ok(GenericFields(entries)),
            _ => unreachable!("value was just made a record"),
        }
    }
}

impl Decoder for RecordDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        match self.target {
            RecordTarget::Native(_) => self.decode_fields(record_mut(dest)?, reader, api),
            RecordTarget::Generic => {
                let mut fields = self.generic_fields(target_mut::<Value>(dest)?)?;
                self.decode_fields(&mut fields, reader, api)
            }
        }
    }
}

struct RecursiveDecoder(Weak<RecordDecoder>);

impl Decoder for RecursiveDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        self.0
            .upgrade()
            .ok_or_else(dropped)?
            .decode(dest, reader, api)
    }
}

// ── encoding ─────────────────────────────────────────────────────────────────

enum Source {
    Native(usize),
    /// Looked up by name or alias in a generic record or map.
    Generic,
    /// The native type has no such field; its default is written instead.
    Missing,
}

struct FieldEncoder {
    name: String,
    /// Position in the schema's field list.
    position: usize,
    source: Source,
    encoder: Option<Arc<dyn Encoder>>,
}

pub(crate) struct RecordEncoder {
    name: String,
    type_name: &'static str,
    schema: Schema,
    target: RecordTarget,
    fields: OnceLock<Vec<FieldEncoder>>,
}

pub(crate) fn encoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    native: Descriptor,
) -> Arc<dyn Encoder> {
    let (SchemaNode::Record(record), Some(target)) = (schema.node(), RecordTarget::of(native))
    else {
        return unsupported(schema, native);
    };
    if let Some(seen) = scope.seen_encoder(record.name(), native.type_id) {
        trace!("record encoder {} reused within build", record.name());
        return Arc::new(RecursiveEncoder(Arc::downgrade(seen)));
    }
    debug!("building record encoder {} from {}", record.name(), native.type_name);

    let encoder = Arc::new(RecordEncoder {
        name: record.name().to_owned(),
        type_name: native.type_name,
        schema: schema.clone(),
        target,
        fields: OnceLock::new(),
    });
    scope.add_encoder(record.name(), native.type_id, encoder.clone());

    // Defaults are materialized on first use rather than here: encoding one
    // may need this very record's encoder, which is not finished yet.
    let fields = record
        .fields()
        .iter()
        .enumerate()
        .map(|(position, field)| {
            let name = field.name().to_owned();
            match (target, target.slot(position, field)) {
                (RecordTarget::Generic, _) => FieldEncoder {
                    name,
                    position,
                    source: Source::Generic,
                    encoder: Some(encoder_of_type(
                        scope,
                        field.schema(),
                        Value::type_descriptor(),
                    )),
                },
                (RecordTarget::Native(_), Some((index, native))) => FieldEncoder {
                    name,
                    position,
                    source: Source::Native(index),
                    encoder: Some(encoder_of_type(scope, field.schema(), native)),
                },
                (RecordTarget::Native(_), None) => FieldEncoder {
                    name,
                    position,
                    source: Source::Missing,
                    encoder: None,
                },
            }
        })
        .collect();
    let _ = encoder.fields.set(fields);
    encoder
}

impl RecordEncoder {
    fn schema_field(&self, position: usize) -> Result<&Field, CodecError> {
        self.schema
            .fields()
            .and_then(|fields| fields.get(position))
            .ok_or_else(|| unbuilt(&self.name))
    }

    fn encode_field(
        &self,
        field: &FieldEncoder,
        value: Option<&dyn Native>,
        writer: &mut Writer,
        api: &Api,
    ) -> Result<(), CodecError> {
        match (value, &field.encoder) {
            (Some(value), Some(encoder)) => encoder.encode(value, writer, api),
            _ => default::write(api, &self.name, self.schema_field(field.position)?, writer),
        }
    }

    fn generic_field<'v>(&self, value: &'v Value, position: usize) -> Option<&'v Value> {
        let field = self.schema_field(position).ok()?;
        match value {
            Value::Record(entries) => entries
                .iter()
                .find(|(k, _)| field.matches(k))
                .map(|(_, v)| v),
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| field.matches(k))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl Encoder for RecordEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        let fields = self.fields.get().ok_or_else(|| unbuilt(&self.name))?;
        match self.target {
            RecordTarget::Native(_) => {
                let record = record_ref(src)?;
                for field in fields {
                    let value = match field.source {
                        Source::Native(index) => Some(record.field(index).ok_or_else(|| {
                            CodecError::Native(format!(
                                "{} has no field at position {index}",
                                self.type_name
                            ))
                        })?),
                        Source::Generic | Source::Missing => None,
                    };
                    self.encode_field(field, value, writer, api)
                        .map_err(|e| e.within(format!("{}.{}", self.name, field.name)))?;
                }
            }
            RecordTarget::Generic => {
                let value = source_ref::<Value>(src)?;
                if !matches!(value, Value::Record(_) | Value::Map(_)) {
                    return Err(CodecError::TypeMismatch {
                        expected: format!("record {}", self.name),
                        found: value.variant_name().into(),
                    });
                }
                for field in fields {
                    let entry = self
                        .generic_field(value, field.position)
                        .map(|v| v as &dyn Native);
                    self.encode_field(field, entry, writer, api)
                        .map_err(|e| e.within(format!("{}.{}", self.name, field.name)))?;
                }
            }
        }
        Ok(())
    }
}

struct RecursiveEncoder(Weak<RecordEncoder>);

impl Encoder for RecursiveEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        self.0.upgrade().ok_or_else(dropped)?.encode(src, writer, api)
    }
}
