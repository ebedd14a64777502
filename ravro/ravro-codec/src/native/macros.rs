//! Declarative macros implementing [`Native`](crate::Native) for user types.

#[doc(hidden)]
#[macro_export]
macro_rules! __ravro_name {
    ($given:literal, $fallback:expr) => {
        $given
    };
    (, $fallback:expr) => {
        $fallback
    };
}

/// Implement `Native` for a struct with named fields.
///
/// ```
/// # use ravro_codec::native_record;
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y_coord: i32,
/// }
///
/// native_record!(Point as "geo.Point" { x: i32, y_coord: i32 => "y" });
/// ```
///
/// The record name defaults to the type name and each field's wire name to
/// the Rust field name.
#[macro_export]
macro_rules! native_record {
    ($ty:ident $(as $name:literal)? { $($field:ident : $fty:ty $(=> $wire:literal)?),* $(,)? }) => {
        impl $crate::Native for $ty {
            fn type_descriptor() -> $crate::Descriptor {
                static INFO: $crate::RecordInfo = $crate::RecordInfo {
                    name: $crate::__ravro_name!($($name)?, stringify!($ty)),
                    fields: &[
                        $(
                            $crate::FieldInfo {
                                name: $crate::__ravro_name!($($wire)?, stringify!($field)),
                                descriptor: <$fty as $crate::Native>::type_descriptor,
                            },
                        )*
                    ],
                };
                $crate::Descriptor::new::<Self>(
                    $crate::__private::type_name::<Self>(),
                    $crate::Shape::Record(&INFO),
                )
            }

            fn descriptor(&self) -> $crate::Descriptor {
                <Self as $crate::Native>::type_descriptor()
            }

            fn reflect_ref(&self) -> $crate::NativeRef<'_> {
                $crate::NativeRef::Record(self)
            }

            fn reflect_mut(&mut self) -> $crate::NativeMut<'_> {
                $crate::NativeMut::Record(self)
            }
        }

        impl $crate::RecordAccess for $ty {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> Option<&dyn $crate::Native> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return Some(&self.$field as &dyn $crate::Native);
                    }
                    position += 1;
                )*
                None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> Option<&mut dyn $crate::Native> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return Some(&mut self.$field as &mut dyn $crate::Native);
                    }
                    position += 1;
                )*
                None
            }
        }
    };
}

/// Implement `Native` for a unit-only enum. Symbols default to variant names.
///
/// ```
/// # use ravro_codec::native_enum;
/// #[derive(Default)]
/// enum Suit {
///     #[default]
///     Spades,
///     Hearts,
/// }
///
/// native_enum!(Suit { Spades => "SPADES", Hearts => "HEARTS" });
/// ```
#[macro_export]
macro_rules! native_enum {
    ($ty:ident { $($variant:ident $(=> $symbol:literal)?),+ $(,)? }) => {
        impl $crate::Native for $ty {
            fn type_descriptor() -> $crate::Descriptor {
                static SYMBOLS: &[&str] = &[
                    $($crate::__ravro_name!($($symbol)?, stringify!($variant))),+
                ];
                $crate::Descriptor::new::<Self>(
                    $crate::__private::type_name::<Self>(),
                    $crate::Shape::Enum(SYMBOLS),
                )
            }

            fn descriptor(&self) -> $crate::Descriptor {
                <Self as $crate::Native>::type_descriptor()
            }

            fn reflect_ref(&self) -> $crate::NativeRef<'_> {
                $crate::NativeRef::Enum(self)
            }

            fn reflect_mut(&mut self) -> $crate::NativeMut<'_> {
                $crate::NativeMut::Enum(self)
            }
        }

        impl $crate::EnumAccess for $ty {
            #[allow(unused_assignments)]
            fn variant_index(&self) -> usize {
                let mut position = 0usize;
                $(
                    if matches!(self, $ty::$variant) {
                        return position;
                    }
                    position += 1;
                )+
                0
            }

            #[allow(unused_assignments)]
            fn set_variant_index(&mut self, index: usize) -> bool {
                let mut position = 0usize;
                $(
                    if index == position {
                        *self = $ty::$variant;
                        return true;
                    }
                    position += 1;
                )+
                false
            }
        }
    };
}

/// Implement `Native` for an enum whose variants each carry one payload,
/// matched to union branches by name. Use `()` as the payload of `"null"`.
///
/// ```
/// # use ravro_codec::native_union;
/// enum Scalar {
///     Nothing(()),
///     Number(i64),
///     Text(String),
/// }
///
/// impl Default for Scalar {
///     fn default() -> Self {
///         Scalar::Nothing(())
///     }
/// }
///
/// native_union!(Scalar { Nothing(()) => "null", Number(i64) => "long", Text(String) => "string" });
/// ```
#[macro_export]
macro_rules! native_union {
    ($ty:ident { $($variant:ident($vty:ty) => $branch:literal),+ $(,)? }) => {
        impl $crate::Native for $ty {
            fn type_descriptor() -> $crate::Descriptor {
                static BRANCHES: &[$crate::BranchInfo] = &[
                    $(
                        $crate::BranchInfo {
                            name: $branch,
                            descriptor: <$vty as $crate::Native>::type_descriptor,
                        },
                    )+
                ];
                $crate::Descriptor::new::<Self>(
                    $crate::__private::type_name::<Self>(),
                    $crate::Shape::Union(BRANCHES),
                )
            }

            fn descriptor(&self) -> $crate::Descriptor {
                <Self as $crate::Native>::type_descriptor()
            }

            fn reflect_ref(&self) -> $crate::NativeRef<'_> {
                $crate::NativeRef::Union(self)
            }

            fn reflect_mut(&mut self) -> $crate::NativeMut<'_> {
                $crate::NativeMut::Union(self)
            }
        }

        impl $crate::UnionAccess for $ty {
            #[allow(unused_assignments)]
            fn branch(&self) -> usize {
                let mut position = 0usize;
                $(
                    if matches!(self, $ty::$variant(_)) {
                        return position;
                    }
                    position += 1;
                )+
                0
            }

            fn value(&self) -> &dyn $crate::Native {
                match self {
                    $($ty::$variant(v) => v as &dyn $crate::Native,)+
                }
            }

            fn value_mut(&mut self) -> &mut dyn $crate::Native {
                match self {
                    $($ty::$variant(v) => v as &mut dyn $crate::Native,)+
                }
            }

            #[allow(unused_assignments)]
            fn select(&mut self, branch: usize) -> Option<&mut dyn $crate::Native> {
                let mut position = 0usize;
                $(
                    if branch == position && !matches!(self, $ty::$variant(_)) {
                        *self = $ty::$variant(<$vty as Default>::default());
                    }
                    position += 1;
                )+
                if $crate::UnionAccess::branch(self) == branch {
                    Some($crate::UnionAccess::value_mut(self))
                } else {
                    None
                }
            }
        }
    };
}

/// Implement `Native` for a type converting itself through
/// [`Marshal`](crate::Marshal).
#[macro_export]
macro_rules! native_marshal {
    ($ty:ty) => {
        impl $crate::Native for $ty {
            fn type_descriptor() -> $crate::Descriptor {
                $crate::Descriptor::new::<Self>(
                    $crate::__private::type_name::<Self>(),
                    $crate::Shape::Opaque,
                )
                .with_marshal()
            }

            fn descriptor(&self) -> $crate::Descriptor {
                <Self as $crate::Native>::type_descriptor()
            }

            fn as_marshal(&self) -> Option<&dyn $crate::Marshal> {
                Some(self as &dyn $crate::Marshal)
            }

            fn as_marshal_mut(&mut self) -> Option<&mut dyn $crate::Marshal> {
                Some(self as &mut dyn $crate::Marshal)
            }
        }
    };
}
