use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Debug, Display, Formatter},
    sync::{Arc, OnceLock, Weak},
};

use bytes::Bytes;

use super::{format, rabin_fingerprint};
use crate::{error::CodecError, value::Value};

/// Kind tag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Union,
    Fixed,
    Ref,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Record => "record",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Map => "map",
            Self::Union => "union",
            Self::Fixed => "fixed",
            Self::Ref => "ref",
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Boolean
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::Bytes
                | Self::String
        )
    }
}

impl Display for SchemaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema node variants. Children are shared [`Schema`] handles.
#[derive(Debug)]
pub enum SchemaNode {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record(RecordSchema),
    Enum(EnumSchema),
    Array(Schema),
    Map(Schema),
    Union(Vec<Schema>),
    Fixed(FixedSchema),
    Ref(RefSchema),
}

impl SchemaNode {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Null => SchemaKind::Null,
            Self::Boolean => SchemaKind::Boolean,
            Self::Int => SchemaKind::Int,
            Self::Long => SchemaKind::Long,
            Self::Float => SchemaKind::Float,
            Self::Double => SchemaKind::Double,
            Self::Bytes => SchemaKind::Bytes,
            Self::String => SchemaKind::String,
            Self::Record(_) => SchemaKind::Record,
            Self::Enum(_) => SchemaKind::Enum,
            Self::Array(_) => SchemaKind::Array,
            Self::Map(_) => SchemaKind::Map,
            Self::Union(_) => SchemaKind::Union,
            Self::Fixed(_) => SchemaKind::Fixed,
            Self::Ref(_) => SchemaKind::Ref,
        }
    }
}

struct SchemaInner {
    node: SchemaNode,
    fingerprint: OnceLock<u64>,
    cache_fingerprint: OnceLock<u64>,
}

/// Immutable, cheaply clonable handle to a schema node.
///
/// Named types (record, enum, fixed) bind every unbound [`SchemaNode::Ref`]
/// of a known name inside their subtree when they are constructed, which is
/// how self-referential and mutually recursive records are expressed.
#[derive(Clone)]
pub struct Schema(Arc<SchemaInner>);

impl Schema {
    fn from_node(node: SchemaNode) -> Self {
        Self(Arc::new(SchemaInner {
            node,
            fingerprint: OnceLock::new(),
            cache_fingerprint: OnceLock::new(),
        }))
    }

    fn named(node: SchemaNode) -> Self {
        let schema = Self::from_node(node);
        schema.bind_references();
        schema
    }

    pub fn null() -> Self {
        Self::from_node(SchemaNode::Null)
    }

    pub fn boolean() -> Self {
        Self::from_node(SchemaNode::Boolean)
    }

    pub fn int() -> Self {
        Self::from_node(SchemaNode::Int)
    }

    pub fn long() -> Self {
        Self::from_node(SchemaNode::Long)
    }

    pub fn float() -> Self {
        Self::from_node(SchemaNode::Float)
    }

    pub fn double() -> Self {
        Self::from_node(SchemaNode::Double)
    }

    pub fn bytes() -> Self {
        Self::from_node(SchemaNode::Bytes)
    }

    pub fn string() -> Self {
        Self::from_node(SchemaNode::String)
    }

    pub fn array(items: Schema) -> Self {
        Self::from_node(SchemaNode::Array(items))
    }

    pub fn map(values: Schema) -> Self {
        Self::from_node(SchemaNode::Map(values))
    }

    pub fn union(branches: impl IntoIterator<Item = Schema>) -> Self {
        Self::from_node(SchemaNode::Union(branches.into_iter().collect()))
    }

    pub fn record(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::named(SchemaNode::Record(RecordSchema {
            name: name.into(),
            aliases: Vec::new(),
            fields: fields.into_iter().collect(),
        }))
    }

    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        symbols: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::named(SchemaNode::Enum(EnumSchema {
            name: name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn fixed(name: impl Into<String>, size: usize) -> Self {
        Self::named(SchemaNode::Fixed(FixedSchema {
            name: name.into(),
            size,
        }))
    }

    /// A by-name reference to a named type declared around or beside it.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::from_node(SchemaNode::Ref(RefSchema {
            name: name.into(),
            target: OnceLock::new(),
        }))
    }

    pub fn node(&self) -> &SchemaNode {
        &self.0.node
    }

    pub fn kind(&self) -> SchemaKind {
        self.0.node.kind()
    }

    /// Full name of a named type (or of the type a reference points at).
    pub fn name(&self) -> Option<&str> {
        match self.node() {
            SchemaNode::Record(r) => Some(&r.name),
            SchemaNode::Enum(e) => Some(&e.name),
            SchemaNode::Fixed(f) => Some(&f.name),
            SchemaNode::Ref(r) => Some(&r.name),
            _ => None,
        }
    }

    /// Name used to identify this schema as a union branch.
    pub fn type_name(&self) -> &str {
        self.name().unwrap_or_else(|| self.kind().as_str())
    }

    pub fn items(&self) -> Option<&Schema> {
        match self.node() {
            SchemaNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&Schema> {
        match self.node() {
            SchemaNode::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&[Field]> {
        match self.node() {
            SchemaNode::Record(r) => Some(&r.fields),
            _ => None,
        }
    }

    pub fn symbols(&self) -> Option<&[String]> {
        match self.node() {
            SchemaNode::Enum(e) => Some(&e.symbols),
            _ => None,
        }
    }

    pub fn branches(&self) -> Option<&[Schema]> {
        match self.node() {
            SchemaNode::Union(b) => Some(b),
            _ => None,
        }
    }

    /// Position of the `null` branch of a union.
    pub fn null_branch(&self) -> Option<usize> {
        self.branches()?
            .iter()
            .position(|b| b.kind() == SchemaKind::Null)
    }

    /// Follow a reference to its definition; other nodes resolve to themselves.
    pub fn resolve(&self) -> Result<Schema, CodecError> {
        match self.node() {
            SchemaNode::Ref(r) => r
                .resolve()
                .ok_or_else(|| CodecError::UnresolvedReference(r.name.clone())),
            _ => Ok(self.clone()),
        }
    }

    /// Wire-compatibility fingerprint (CRC-64-AVRO of the canonical form).
    pub fn fingerprint(&self) -> u64 {
        if let SchemaNode::Ref(r) = self.node() {
            return r.resolve().map_or_else(
                || rabin_fingerprint(format::quoted(&r.name).as_bytes()),
                |target| target.fingerprint(),
            );
        }
        *self
            .0
            .fingerprint
            .get_or_init(|| rabin_fingerprint(format::canonical_form(self).as_bytes()))
    }

    /// Build-cache identity. Narrower than [`Schema::fingerprint`]: it also
    /// covers record field defaults, which change what a decoder produces.
    pub fn cache_fingerprint(&self) -> u64 {
        if let SchemaNode::Ref(r) = self.node() {
            return r.resolve().map_or_else(
                || rabin_fingerprint(format::quoted(&r.name).as_bytes()),
                |target| target.cache_fingerprint(),
            );
        }
        *self
            .0
            .cache_fingerprint
            .get_or_init(|| rabin_fingerprint(format::cache_form(self).as_bytes()))
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn bind_references(&self) {
        let mut named = HashMap::new();
        let mut refs = Vec::new();
        let mut visited = HashSet::new();
        collect_names(self, &mut named, &mut refs, &mut visited);
        for r in refs {
            if r.target.get().is_some() {
                continue;
            }
            if let Some(target) = named.get(r.name.as_str()) {
                let _ = r.target.set(Weak::clone(target));
            }
        }
    }
}

fn collect_names<'a>(
    schema: &'a Schema,
    named: &mut HashMap<&'a str, Weak<SchemaInner>>,
    refs: &mut Vec<&'a RefSchema>,
    visited: &mut HashSet<*const SchemaInner>,
) {
    if !visited.insert(Arc::as_ptr(&schema.0)) {
        return;
    }
    match schema.node() {
        SchemaNode::Record(r) => {
            named
                .entry(r.name.as_str())
                .or_insert_with(|| Arc::downgrade(&schema.0));
            for field in &r.fields {
                collect_names(&field.schema, named, refs, visited);
            }
        }
        SchemaNode::Enum(e) => {
            named
                .entry(e.name.as_str())
                .or_insert_with(|| Arc::downgrade(&schema.0));
        }
        SchemaNode::Fixed(f) => {
            named
                .entry(f.name.as_str())
                .or_insert_with(|| Arc::downgrade(&schema.0));
        }
        SchemaNode::Array(inner) | SchemaNode::Map(inner) => {
            collect_names(inner, named, refs, visited);
        }
        SchemaNode::Union(branches) => {
            for branch in branches {
                collect_names(branch, named, refs, visited);
            }
        }
        SchemaNode::Ref(r) => refs.push(r),
        _ => {}
    }
}

impl Debug for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Schema").field(self.node()).finish()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format::canonical_form(self))
    }
}

#[derive(Debug)]
pub struct RecordSchema {
    name: String,
    aliases: Vec<String>,
    fields: Vec<Field>,
}

impl RecordSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug)]
pub struct EnumSchema {
    name: String,
    symbols: Vec<String>,
}

impl EnumSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn ordinal(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

#[derive(Debug)]
pub struct FixedSchema {
    name: String,
    size: usize,
}

impl FixedSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// By-name reference to a named type. The back-edge is weak so recursive
/// schemas do not keep themselves alive.
pub struct RefSchema {
    name: String,
    target: OnceLock<Weak<SchemaInner>>,
}

impl RefSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolve(&self) -> Option<Schema> {
        self.target.get().and_then(Weak::upgrade).map(Schema)
    }
}

impl Debug for RefSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefSchema")
            .field("name", &self.name)
            .field("bound", &self.target.get().is_some())
            .finish()
    }
}

/// How a decoder obtains a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldAction {
    /// The field is present on the wire.
    #[default]
    Read,
    /// The field is absent from the wire and takes its declared default.
    SetDefault,
}

/// Record field: name, aliases, type, optional default.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    aliases: Vec<String>,
    schema: Schema,
    default: Option<Value>,
    action: FieldAction,
    encoded_default: OnceLock<Result<Bytes, CodecError>>,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            schema,
            default: None,
            action: FieldAction::Read,
            encoded_default: OnceLock::new(),
        }
    }

    /// Declare the default, expressed as a generic [`Value`].
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_action(mut self, action: FieldAction) -> Self {
        self.action = action;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn action(&self) -> FieldAction {
        self.action
    }

    /// Whether `name` is this field's name or one of its aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Wire bytes of the default value, computed by `encode` on first use
    /// and reused for the lifetime of the field.
    pub fn encode_default(
        &self,
        encode: impl FnOnce(&Value) -> Result<Bytes, CodecError>,
    ) -> Result<Bytes, CodecError> {
        self.encoded_default
            .get_or_init(|| match &self.default {
                Some(value) => encode(value),
                None => Err(CodecError::NoDefault(self.name.clone())),
            })
            .clone()
    }
}
