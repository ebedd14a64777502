use std::fmt;

use super::{Descriptor, Native, Shape};

/// Dynamically typed slot.
///
/// Decoding into an empty slot stores a generic [`Value`](ravro_core::Value)
/// shaped by the schema. A slot seeded with a concrete object is decoded in
/// place and keeps that object's type. Encoding uses whatever the slot holds.
#[derive(Default)]
pub struct Dynamic(Option<Box<dyn Native>>);

impl Dynamic {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn new<T: Native>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&dyn Native> {
        self.0.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut dyn Native> {
        self.0.as_deref_mut()
    }

    pub fn downcast_ref<T: Native>(&self) -> Option<&T> {
        self.get()?.downcast_ref()
    }

    pub fn downcast_mut<T: Native>(&mut self) -> Option<&mut T> {
        self.get_mut()?.downcast_mut()
    }

    pub fn set<T: Native>(&mut self, value: T) {
        self.0 = Some(Box::new(value));
    }

    pub fn set_boxed(&mut self, value: Box<dyn Native>) {
        self.0 = Some(value);
    }

    pub fn take(&mut self) -> Option<Box<dyn Native>> {
        self.0.take()
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(inner) => write!(f, "Dynamic({})", inner.descriptor().type_name),
            None => f.write_str("Dynamic(empty)"),
        }
    }
}

impl Native for Dynamic {
    fn type_descriptor() -> Descriptor {
        Descriptor::new::<Self>("Dynamic", Shape::Dynamic)
    }

    fn descriptor(&self) -> Descriptor {
        Self::type_descriptor()
    }
}
