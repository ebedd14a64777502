use std::{
    any::type_name,
    collections::{BTreeMap, HashMap},
};

use bytes::Bytes;
use ravro_core::Value;

use super::{
    Descriptor, MapAccess, Native, NativeMut, NativeRef, PointerAccess, ScalarKind,
    SequenceAccess, Shape,
};

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Native for $ty {
                fn type_descriptor() -> Descriptor {
                    Descriptor::new::<Self>(type_name::<Self>(), Shape::Scalar(ScalarKind::$kind))
                }

                fn descriptor(&self) -> Descriptor {
                    Self::type_descriptor()
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    f32 => F32,
    f64 => F64,
    String => String,
    Bytes => Bytes,
}

impl Native for () {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>("()", Shape::Unit)
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }
}

impl Native for Value {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>("Value", Shape::Generic)
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }
}

impl<const N: usize> Native for [u8; N] {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>(type_name::<Self>(), Shape::Fixed(N))
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }

    fn reflect_ref(&self) -> NativeRef<'_> {
        NativeRef::Fixed(self)
    }

    fn reflect_mut(&mut self) -> NativeMut<'_> {
        NativeMut::Fixed(self)
    }
}

// ── sequences ────────────────────────────────────────────────────────────────

impl<T: Native + Default> Native for Vec<T> {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>(
            type_name::<Self>(),
            Shape::Sequence {
                item: T::type_descriptor,
            },
        )
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }

    fn reflect_ref(&self) -> NativeRef<'_> {
        NativeRef::Sequence(self)
    }

    fn reflect_mut(&mut self) -> NativeMut<'_> {
        NativeMut::Sequence(self)
    }
}

impl<T: Native + Default> SequenceAccess for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Native> {
        self.as_slice().get(index).map(|v| v as &dyn Native)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Native> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|v| v as &mut dyn Native)
    }

    fn resize(&mut self, len: usize) {
        self.resize_with(len, T::default);
    }
}

// ── maps ─────────────────────────────────────────────────────────────────────

macro_rules! impl_string_map {
    ($($map:ident),*) => {
        $(
            impl<V: Native + Default> Native for $map<String, V> {
                fn type_descriptor() -> Descriptor {
                    Descriptor::new::<Self>(
                        type_name::<Self>(),
                        Shape::Map {
                            value: V::type_descriptor,
                        },
                    )
                }

                fn descriptor(&self) -> Descriptor {
                    Self::type_descriptor()
                }

                fn reflect_ref(&self) -> NativeRef<'_> {
                    NativeRef::Map(self)
                }

                fn reflect_mut(&mut self) -> NativeMut<'_> {
                    NativeMut::Map(self)
                }
            }

            impl<V: Native + Default> MapAccess for $map<String, V> {
                fn len(&self) -> usize {
                    $map::len(self)
                }

                fn entries(&self) -> Vec<(&str, &dyn Native)> {
                    self.iter()
                        .map(|(k, v)| (k.as_str(), v as &dyn Native))
                        .collect()
                }

                fn entry_mut(&mut self, key: String) -> &mut dyn Native {
                    self.entry(key).or_default()
                }
            }
        )*
    };
}

impl_string_map!(HashMap, BTreeMap);

// ── pointers ─────────────────────────────────────────────────────────────────

impl<T: Native + Default> Native for Option<T> {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>(
            type_name::<Self>(),
            Shape::Pointer {
                inner: T::type_descriptor,
                nullable: true,
            },
        )
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }

    fn reflect_ref(&self) -> NativeRef<'_> {
        NativeRef::Pointer(self)
    }

    fn reflect_mut(&mut self) -> NativeMut<'_> {
        NativeMut::Pointer(self)
    }
}

impl<T: Native + Default> PointerAccess for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }

    fn get(&self) -> Option<&dyn Native> {
        self.as_ref().map(|v| v as &dyn Native)
    }

    fn get_mut(&mut self) -> Option<&mut dyn Native> {
        self.as_mut().map(|v| v as &mut dyn Native)
    }

    fn allocate(&mut self) -> &mut dyn Native {
        self.get_or_insert_with(T::default)
    }

    fn clear(&mut self) -> bool {
        *self = None;
        true
    }
}

impl<T: Native + Default> Native for Box<T> {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>(
            type_name::<Self>(),
            Shape::Pointer {
                inner: T::type_descriptor,
                nullable: false,
            },
        )
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }

    fn reflect_ref(&self) -> NativeRef<'_> {
        NativeRef::Pointer(self)
    }

    fn reflect_mut(&mut self) -> NativeMut<'_> {
        NativeMut::Pointer(self)
    }
}

impl<T: Native + Default> PointerAccess for Box<T> {
    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&dyn Native> {
        Some(&**self as &dyn Native)
    }

    fn get_mut(&mut self) -> Option<&mut dyn Native> {
        Some(&mut **self as &mut dyn Native)
    }

    fn allocate(&mut self) -> &mut dyn Native {
        &mut **self
    }

    fn clear(&mut self) -> bool {
        false
    }
}
