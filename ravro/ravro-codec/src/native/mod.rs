//! Introspection contract between codecs and in-memory Rust values.
//!
//! Every type that can be encoded or decoded implements [`Native`]. Its
//! [`Descriptor`] tells the codec builder what shape the type has, and the
//! `reflect_*` methods hand out access handles at run time. Scalars and the
//! generic [`Value`](ravro_core::Value) receiver are reached by downcasting.

mod dynamic;
mod impls;
mod macros;

use std::any::{Any, TypeId};

use ravro_core::{CodecError, Schema, Value};

pub use dynamic::Dynamic;

/// Scalar representations supported by leaf codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I32,
    I64,
    U32,
    F32,
    F64,
    String,
    Bytes,
}

/// Structural shape of a native type.
#[derive(Clone, Copy)]
pub enum Shape {
    /// `()`, the native counterpart of `null`.
    Unit,
    Scalar(ScalarKind),
    /// Byte array of a fixed width.
    Fixed(usize),
    Sequence {
        item: fn() -> Descriptor,
    },
    /// String-keyed associative container.
    Map {
        value: fn() -> Descriptor,
    },
    Record(&'static RecordInfo),
    /// Unit-only enum; the slice lists its symbols in variant order.
    Enum(&'static [&'static str]),
    /// Enum with one payload per variant, matched to union branches by name.
    Union(&'static [BranchInfo]),
    Pointer {
        inner: fn() -> Descriptor,
        nullable: bool,
    },
    /// Slot whose concrete type is chosen at decode time.
    Dynamic,
    /// The schema-shaped [`Value`] receiver.
    Generic,
    /// No structure visible to codecs; usable only through [`Marshal`].
    Opaque,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Scalar(_) => "scalar",
            Self::Fixed(_) => "fixed",
            Self::Sequence { .. } => "sequence",
            Self::Map { .. } => "map",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Pointer { .. } => "pointer",
            Self::Dynamic => "dynamic",
            Self::Generic => "generic",
            Self::Opaque => "opaque",
        }
    }
}

pub struct RecordInfo {
    pub name: &'static str,
    pub fields: &'static [FieldInfo],
}

pub struct FieldInfo {
    /// Name matched against schema field names and aliases.
    pub name: &'static str,
    pub descriptor: fn() -> Descriptor,
}

pub struct BranchInfo {
    /// Union branch name: a primitive type name or a named type's full name.
    pub name: &'static str,
    pub descriptor: fn() -> Descriptor,
}

/// Shape and identity of a native type. Cheap to copy.
#[derive(Clone, Copy)]
pub struct Descriptor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub shape: Shape,
    /// Whether the type converts itself through [`Marshal`].
    pub marshal: bool,
}

impl Descriptor {
    pub fn new<T: ?Sized + 'static>(type_name: &'static str, shape: Shape) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            shape,
            marshal: false,
        }
    }

    pub fn of<T: Native>() -> Self {
        T::type_descriptor()
    }

    pub fn with_marshal(mut self) -> Self {
        self.marshal = true;
        self
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape.name())
            .field("marshal", &self.marshal)
            .finish()
    }
}

/// A value the codecs can read from and write into.
pub trait Native: Any + Send + Sync + 'static {
    fn type_descriptor() -> Descriptor
    where
        Self: Sized;

    /// Descriptor of the concrete type behind `self`.
    fn descriptor(&self) -> Descriptor;

    fn reflect_ref(&self) -> NativeRef<'_> {
        NativeRef::Opaque
    }

    fn reflect_mut(&mut self) -> NativeMut<'_> {
        NativeMut::Opaque
    }

    fn as_marshal(&self) -> Option<&dyn Marshal> {
        None
    }

    fn as_marshal_mut(&mut self) -> Option<&mut dyn Marshal> {
        None
    }
}

impl dyn Native {
    pub fn is<T: Native>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<T>()
    }

    pub fn downcast_ref<T: Native>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }

    pub fn downcast_mut<T: Native>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self;
        any.downcast_mut()
    }
}

pub enum NativeRef<'a> {
    Fixed(&'a [u8]),
    Sequence(&'a dyn SequenceAccess),
    Map(&'a dyn MapAccess),
    Record(&'a dyn RecordAccess),
    Enum(&'a dyn EnumAccess),
    Union(&'a dyn UnionAccess),
    Pointer(&'a dyn PointerAccess),
    Opaque,
}

pub enum NativeMut<'a> {
    Fixed(&'a mut [u8]),
    Sequence(&'a mut dyn SequenceAccess),
    Map(&'a mut dyn MapAccess),
    Record(&'a mut dyn RecordAccess),
    Enum(&'a mut dyn EnumAccess),
    Union(&'a mut dyn UnionAccess),
    Pointer(&'a mut dyn PointerAccess),
    Opaque,
}

pub trait SequenceAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&dyn Native>;

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Native>;

    /// Grow with default items or truncate to exactly `len` items.
    fn resize(&mut self, len: usize);
}

pub trait MapAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Vec<(&str, &dyn Native)>;

    /// The value stored under `key`, inserting a default one first if absent.
    fn entry_mut(&mut self, key: String) -> &mut dyn Native;
}

pub trait RecordAccess {
    /// Field by position in the type's [`RecordInfo`].
    fn field(&self, index: usize) -> Option<&dyn Native>;

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Native>;
}

pub trait EnumAccess {
    fn variant_index(&self) -> usize;

    /// Returns `false` when `index` names no variant.
    fn set_variant_index(&mut self, index: usize) -> bool;
}

pub trait UnionAccess {
    /// Position of the active variant in the type's branch list.
    fn branch(&self) -> usize;

    fn value(&self) -> &dyn Native;

    fn value_mut(&mut self) -> &mut dyn Native;

    /// Make `branch` the active variant, keeping its payload when it already
    /// is, and return the payload.
    fn select(&mut self, branch: usize) -> Option<&mut dyn Native>;
}

pub trait PointerAccess {
    fn is_null(&self) -> bool;

    fn get(&self) -> Option<&dyn Native>;

    fn get_mut(&mut self) -> Option<&mut dyn Native>;

    /// The pointee, allocated with its default value first if null.
    fn allocate(&mut self) -> &mut dyn Native;

    /// Reset to null. Returns `false` for non-nullable pointers.
    fn clear(&mut self) -> bool;
}

/// Custom conversion between a native type and the generic [`Value`] shape
/// of a schema. Types advertising it bypass schema-driven dispatch.
pub trait Marshal {
    fn marshal(&self, schema: &Schema) -> Result<Value, CodecError>;

    fn unmarshal(&mut self, schema: &Schema, value: Value) -> Result<(), CodecError>;
}
