//! # Std-Type Conveniences
//!
//! Helpers that let everyday Rust types ride the contract without
//! hand-written adapters: narrow integers go through a 32-bit temporary
//! (only four primitive types exist on the wire), `String` copies in and
//! out of the borrowed string operation, and `Vec` fields wrap
//! themselves in the stock adapters.

use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, SliceArray, StrVecArray, VecArray};

pub fn serialize_i8<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut i8) {
    let mut temp = *var as i32;
    s.serialize_i32(name, &mut temp);
    *var = temp as i8;
}

pub fn serialize_u8<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut u8) {
    let mut temp = *var as u32;
    s.serialize_u32(name, &mut temp);
    *var = temp as u8;
}

pub fn serialize_i16<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut i16) {
    let mut temp = *var as i32;
    s.serialize_i32(name, &mut temp);
    *var = temp as i16;
}

pub fn serialize_u16<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut u16) {
    let mut temp = *var as u32;
    s.serialize_u32(name, &mut temp);
    *var = temp as u16;
}

/// Owned-string field: writers persist the current contents, readers
/// replace them when the member is present.
pub fn serialize_string<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut String) {
    if s.is_reader() {
        if let Some(loaded) = s.serialize_str(name, None) {
            var.clear();
            var.push_str(loaded);
        }
    } else {
        s.serialize_str(name, Some(var.as_str()));
    }
}

/// Primitive types that know which contract operations move them, so
/// helpers can stay generic over the element type.
pub trait Primitive: Copy + Default {
    fn serialize_field<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut Self);

    fn serialize_array<'de>(
        s: &mut dyn Serializer<'de>,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<Self>,
    );
}

impl Primitive for i32 {
    fn serialize_field<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut Self) {
        s.serialize_i32(name, var);
    }

    fn serialize_array<'de>(
        s: &mut dyn Serializer<'de>,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<Self>,
    ) {
        s.serialize_i32_array(name, array);
    }
}

impl Primitive for u32 {
    fn serialize_field<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut Self) {
        s.serialize_u32(name, var);
    }

    fn serialize_array<'de>(
        s: &mut dyn Serializer<'de>,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<Self>,
    ) {
        s.serialize_u32_array(name, array);
    }
}

impl Primitive for f32 {
    fn serialize_field<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut Self) {
        s.serialize_f32(name, var);
    }

    fn serialize_array<'de>(
        s: &mut dyn Serializer<'de>,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<Self>,
    ) {
        s.serialize_f32_array(name, array);
    }
}

impl Primitive for bool {
    fn serialize_field<'de>(s: &mut dyn Serializer<'de>, name: Name<'_>, var: &mut Self) {
        s.serialize_bool(name, var);
    }

    fn serialize_array<'de>(
        s: &mut dyn Serializer<'de>,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<Self>,
    ) {
        s.serialize_bool_array(name, array);
    }
}

/// Growable primitive array field.
pub fn serialize_vec<'de, T: Primitive>(
    s: &mut dyn Serializer<'de>,
    name: Name<'_>,
    vec: &mut Vec<T>,
) {
    let mut adapter = VecArray::new(vec);
    T::serialize_array(s, name, &mut adapter);
}

/// Write-only primitive array field over a borrowed slice.
pub fn serialize_slice<'de, T: Primitive>(s: &mut dyn Serializer<'de>, name: Name<'_>, data: &[T]) {
    debug_assert!(!s.is_reader(), "slices cannot receive loaded data");
    let mut adapter = SliceArray::new(data);
    T::serialize_array(s, name, &mut adapter);
}

/// Growable string array field.
pub fn serialize_string_vec<'de>(
    s: &mut dyn Serializer<'de>,
    name: Name<'_>,
    vec: &mut Vec<String>,
) {
    let mut adapter = StrVecArray::new(vec);
    s.serialize_str_array(name, &mut adapter);
}
