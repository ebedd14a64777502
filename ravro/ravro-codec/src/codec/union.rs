//! Union codecs. The wire form is the branch index as a long, then the
//! value encoded with that branch's schema.

use std::sync::Arc;

use log::trace;
use ravro_core::{CodecError, Reader, Schema, SchemaKind, SchemaNode, Value, Writer};

use super::{
    Decoder, Encoder, accepts, decoder_of_type, encoder_of_type, pointer_mut, pointer_ref,
    source_ref, union_mut, union_ref, unsupported,
};
use crate::{
    config::Api,
    native::{BranchInfo, Descriptor, Native, ScalarKind, Shape},
    scope::BuildScope,
};

fn read_index(reader: &mut Reader, branches: usize) -> Result<usize, CodecError> {
    let index = reader.read_long()?;
    usize::try_from(index)
        .ok()
        .filter(|i| *i < branches)
        .ok_or(CodecError::UnionBranchOutOfRange { index, branches })
}

/// Schema branch for each native variant, matched by branch name.
fn native_to_schema(branches: &[Schema], infos: &[BranchInfo]) -> Vec<Option<usize>> {
    infos
        .iter()
        .map(|info| branches.iter().position(|b| b.type_name() == info.name))
        .collect()
}

// ── decoding ─────────────────────────────────────────────────────────────────

enum DecodeStrategy {
    /// Every branch decodes into the target itself.
    Plain(Vec<Arc<dyn Decoder>>),
    /// Native enum target: schema branch to variant, plus per-branch decoders
    /// built for that variant's payload.
    Native {
        to_native: Vec<Option<usize>>,
        decoders: Vec<Arc<dyn Decoder>>,
    },
    /// Nullable pointer: the null branch resets it, any other allocates the
    /// pointee and decodes into it.
    Optional {
        null_index: usize,
        some: Box<DecodeStrategy>,
    },
}

pub(crate) struct UnionDecoder {
    branches: usize,
    strategy: DecodeStrategy,
}

pub(crate) fn decoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    branches: &[Schema],
    native: Descriptor,
) -> Arc<dyn Decoder> {
    let strategy = match (native.shape, schema.null_branch()) {
        (Shape::Pointer { inner, nullable: true }, Some(null_index)) => DecodeStrategy::Optional {
            null_index,
            some: Box::new(decode_strategy(scope, branches, inner(), Some(null_index))),
        },
        _ => decode_strategy(scope, branches, native, None),
    };
    Arc::new(UnionDecoder {
        branches: branches.len(),
        strategy,
    })
}

/// The null branch of an optional never reaches its decoder; it is built for
/// `()` so it cannot fail to build.
fn branch_decoder(
    scope: &mut BuildScope<'_>,
    branch: &Schema,
    native: Descriptor,
    is_null: bool,
) -> Arc<dyn Decoder> {
    if is_null {
        decoder_of_type(scope, branch, <() as Native>::type_descriptor())
    } else {
        decoder_of_type(scope, branch, native)
    }
}

fn decode_strategy(
    scope: &mut BuildScope<'_>,
    branches: &[Schema],
    native: Descriptor,
    null_index: Option<usize>,
) -> DecodeStrategy {
    match native.shape {
        Shape::Union(infos) => {
            let to_schema = native_to_schema(branches, infos);
            let to_native: Vec<Option<usize>> = (0..branches.len())
                .map(|i| to_schema.iter().position(|s| *s == Some(i)))
                .collect();
            let decoders = branches
                .iter()
                .enumerate()
                .map(|(i, branch)| match to_native[i] {
                    Some(variant) => branch_decoder(
                        scope,
                        branch,
                        (infos[variant].descriptor)(),
                        null_index == Some(i),
                    ),
                    None if null_index == Some(i) => branch_decoder(scope, branch, native, true),
                    None => unsupported(branch, native),
                })
                .collect();
            DecodeStrategy::Native {
                to_native,
                decoders,
            }
        }
        _ => DecodeStrategy::Plain(
            branches
                .iter()
                .enumerate()
                .map(|(i, branch)| branch_decoder(scope, branch, native, null_index == Some(i)))
                .collect(),
        ),
    }
}

impl DecodeStrategy {
    fn decode_branch(
        &self,
        index: usize,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        match self {
            Self::Plain(decoders) => decoders[index].decode(dest, reader, api),
            Self::Native {
                to_native,
                decoders,
            } => {
                let found = dest.descriptor().type_name;
                let Some(variant) = to_native[index] else {
                    return decoders[index].decode(dest, reader, api);
                };
                let payload = union_mut(dest)?.select(variant).ok_or_else(|| {
                    CodecError::Native(format!("{found} has no variant {variant}"))
                })?;
                decoders[index].decode(payload, reader, api)
            }
            Self::Optional { null_index, some } => {
                let pointer = pointer_mut(dest)?;
                if index == *null_index {
                    pointer.clear();
                    return Ok(());
                }
                some.decode_branch(index, pointer.allocate(), reader, api)
            }
        }
    }
}

impl Decoder for UnionDecoder {
    fn decode(
        &self,
        dest: &mut dyn Native,
        reader: &mut Reader,
        api: &Api,
    ) -> Result<(), CodecError> {
        let index = read_index(reader, self.branches)?;
        trace!("union branch {index} into {}", dest.descriptor().type_name);
        self.strategy.decode_branch(index, dest, reader, api)
    }
}

// ── encoding ─────────────────────────────────────────────────────────────────

/// How the branch is chosen for a value that is not itself a native union.
enum Selection {
    /// The native type maps onto exactly this branch.
    Fixed(usize),
    /// Generic value: chosen per value by [`value_branch`].
    ByValue,
    /// The target picks its own branch; delegate to an encoder of the whole
    /// union.
    Whole(Arc<dyn Encoder>),
    Unmatched,
}

enum EncodeStrategy {
    Plain(Selection),
    Native(Vec<Option<usize>>),
    Optional { null_index: usize, some: Selection },
}

pub(crate) struct UnionEncoder {
    branches: Vec<Schema>,
    strategy: EncodeStrategy,
    /// Per-branch encoders. Only branches that can be selected are built.
    encoders: Vec<Option<Arc<dyn Encoder>>>,
    type_name: &'static str,
}

/// Schema kind a scalar maps onto without conversion.
fn natural_kind(scalar: ScalarKind) -> SchemaKind {
    match scalar {
        ScalarKind::Bool => SchemaKind::Boolean,
        ScalarKind::I32 => SchemaKind::Int,
        ScalarKind::I64 | ScalarKind::U32 => SchemaKind::Long,
        ScalarKind::F32 => SchemaKind::Float,
        ScalarKind::F64 => SchemaKind::Double,
        ScalarKind::String => SchemaKind::String,
        ScalarKind::Bytes => SchemaKind::Bytes,
    }
}

fn select_branch(branches: &[Schema], native: Descriptor) -> Option<usize> {
    if let Shape::Scalar(scalar) = native.shape {
        let natural = natural_kind(scalar);
        if let Some(index) = branches.iter().position(|b| b.kind() == natural) {
            return Some(index);
        }
    }
    branches.iter().position(|b| accepts(b, native))
}

fn selection(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    branches: &[Schema],
    encoders: &mut [Option<Arc<dyn Encoder>>],
    native: Descriptor,
) -> Selection {
    match native.shape {
        Shape::Generic => {
            for (slot, branch) in encoders.iter_mut().zip(branches) {
                *slot = Some(encoder_of_type(scope, branch, native));
            }
            Selection::ByValue
        }
        Shape::Union(_) | Shape::Dynamic => Selection::Whole(encoder_of_type(scope, schema, native)),
        _ => match select_branch(branches, native) {
            Some(index) => {
                encoders[index] = Some(encoder_of_type(scope, &branches[index], native));
                Selection::Fixed(index)
            }
            None => Selection::Unmatched,
        },
    }
}

pub(crate) fn encoder(
    scope: &mut BuildScope<'_>,
    schema: &Schema,
    branches: &[Schema],
    native: Descriptor,
) -> Arc<dyn Encoder> {
    let mut encoders: Vec<Option<Arc<dyn Encoder>>> = vec![None; branches.len()];

    let strategy = match (native.shape, schema.null_branch()) {
        (Shape::Pointer { inner, nullable: true }, Some(null_index)) => {
            let some = selection(scope, schema, branches, &mut encoders, inner());
            EncodeStrategy::Optional { null_index, some }
        }
        (Shape::Union(infos), _) => {
            let to_schema = native_to_schema(branches, infos);
            for (info, target) in infos.iter().zip(&to_schema) {
                if let Some(index) = *target {
                    encoders[index] = Some(encoder_of_type(
                        scope,
                        &branches[index],
                        (info.descriptor)(),
                    ));
                }
            }
            EncodeStrategy::Native(to_schema)
        }
        _ => EncodeStrategy::Plain(selection(scope, schema, branches, &mut encoders, native)),
    };

    Arc::new(UnionEncoder {
        branches: branches.to_vec(),
        strategy,
        encoders,
        type_name: native.type_name,
    })
}

impl UnionEncoder {
    fn write_branch(
        &self,
        index: usize,
        src: &dyn Native,
        writer: &mut Writer,
        api: &Api,
    ) -> Result<(), CodecError> {
        let encoder = self.encoders[index]
            .as_ref()
            .ok_or_else(|| CodecError::NoUnionBranch(src.descriptor().type_name.to_owned()))?;
        writer.write_long(index as i64);
        encoder.encode(src, writer, api)
    }

    fn write_selected(
        &self,
        selection: &Selection,
        src: &dyn Native,
        writer: &mut Writer,
        api: &Api,
    ) -> Result<(), CodecError> {
        match selection {
            Selection::Fixed(index) => self.write_branch(*index, src, writer, api),
            Selection::ByValue => {
                let value = source_ref::<Value>(src)?;
                let index = value_branch(&self.branches, value).ok_or_else(|| {
                    CodecError::NoUnionBranch(format!("value of type {}", value.variant_name()))
                })?;
                self.write_branch(index, src, writer, api)
            }
            Selection::Whole(encoder) => encoder.encode(src, writer, api),
            Selection::Unmatched => Err(CodecError::NoUnionBranch(self.type_name.to_owned())),
        }
    }
}

impl Encoder for UnionEncoder {
    fn encode(&self, src: &dyn Native, writer: &mut Writer, api: &Api) -> Result<(), CodecError> {
        match &self.strategy {
            EncodeStrategy::Plain(selection) => self.write_selected(selection, src, writer, api),
            EncodeStrategy::Optional { null_index, some } => match pointer_ref(src)?.get() {
                None => {
                    writer.write_long(*null_index as i64);
                    Ok(())
                }
                Some(inner) => self.write_selected(some, inner, writer, api),
            },
            EncodeStrategy::Native(to_schema) => {
                let union = union_ref(src)?;
                let variant = union.branch();
                match to_schema.get(variant).copied().flatten() {
                    Some(index) => self.write_branch(index, union.value(), writer, api),
                    None => Err(CodecError::NoUnionBranch(format!(
                        "variant {variant} of {}",
                        self.type_name
                    ))),
                }
            }
        }
    }
}

/// Branch a generic value is written as: the first branch matching its type
/// exactly, otherwise the first one it converts into.
pub(crate) fn value_branch(branches: &[Schema], value: &Value) -> Option<usize> {
    let resolved: Vec<Option<Schema>> = branches.iter().map(|b| b.resolve().ok()).collect();
    let node = |i: usize| resolved[i].as_ref().map(Schema::node);
    (0..branches.len())
        .find(|i| node(*i).is_some_and(|n| exact(n, value)))
        .or_else(|| (0..branches.len()).find(|i| node(*i).is_some_and(|n| lenient(n, value))))
}

fn exact(branch: &SchemaNode, value: &Value) -> bool {
    match (branch, value) {
        (SchemaNode::Null, Value::Null)
        | (SchemaNode::Boolean, Value::Boolean(_))
        | (SchemaNode::Int, Value::Int(_))
        | (SchemaNode::Long, Value::Long(_))
        | (SchemaNode::Float, Value::Float(_))
        | (SchemaNode::Double, Value::Double(_))
        | (SchemaNode::Bytes, Value::Bytes(_))
        | (SchemaNode::String, Value::String(_))
        | (SchemaNode::Array(_), Value::Array(_))
        | (SchemaNode::Map(_), Value::Map(_)) => true,
        (SchemaNode::Enum(e), Value::Enum(symbol)) => e.ordinal(symbol).is_some(),
        (SchemaNode::Fixed(f), Value::Fixed(data)) => f.size() == data.len(),
        (SchemaNode::Record(r), Value::Record(entries)) => {
            r.fields().len() == entries.len()
                && r.fields().iter().zip(entries).all(|(f, (k, _))| f.matches(k))
        }
        _ => false,
    }
}

fn lenient(branch: &SchemaNode, value: &Value) -> bool {
    match (branch, value) {
        (SchemaNode::Long | SchemaNode::Float | SchemaNode::Double, Value::Int(_))
        | (SchemaNode::Float | SchemaNode::Double, Value::Long(_))
        | (SchemaNode::Double, Value::Float(_))
        | (SchemaNode::Bytes, Value::String(_) | Value::Fixed(_))
        | (SchemaNode::String, Value::Enum(_))
        | (SchemaNode::Record(_), Value::Record(_) | Value::Map(_)) => true,
        (SchemaNode::Enum(e), Value::String(symbol)) => e.ordinal(symbol).is_some(),
        (SchemaNode::Fixed(f), Value::Bytes(data)) => f.size() == data.len(),
        _ => false,
    }
}
