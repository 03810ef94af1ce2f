//! # The Two-Direction Serializer Contract
//!
//! One user-written description of a value's shape drives both saving and
//! loading. The description calls [`Serializer`] operations; whether those
//! calls write fields out or read them back depends on the concrete
//! encoder behind the trait object.
//!
//! ```ignore
//! fn serialize_stats(s: &mut dyn Serializer<'_>, stats: &mut PlayerStats) {
//!     s.serialize_i32("level".into(), &mut stats.level);
//!     s.serialize_f32("health".into(), &mut stats.health);
//! }
//!
//! // Development build: human-readable JSON.
//! let mut tree = serde_json::Value::Null;
//! serialize_stats(&mut JsonWriter::new(&mut tree), &mut stats);
//!
//! // Shipping build: packed binary, same description.
//! let mut container = BinaryContainer::new();
//! serialize_stats(&mut BinaryWriter::new(&mut container), &mut stats);
//! ```
//!
//! ## Direction rules
//!
//! - Writers consume the slot and ignore its post-value.
//! - Readers overwrite the slot on success; a missing member or an
//!   unconvertible type leaves it untouched. Missing data is never an
//!   error.
//! - `write_object_array` is writer-only; `read_object_array_size` and
//!   `read_object_array` are reader-only. Calling an operation against
//!   the wrong direction is a programmer error, reported through
//!   `debug_assert!` and otherwise a no-op.
//!
//! ## Value model
//!
//! Primitives are `i32`, `u32`, `f32` and `bool`; readers convert between
//! them when the persisted type differs from the requested one (numeric
//! casts, `!= 0` for bool, 0/1 for bool-to-numeric). Strings are
//! length-delimited UTF-8. Objects are ordered name/value maps. Arrays
//! hold one primitive type, strings, or objects; arrays of arrays are not
//! representable (wrap the inner array in an object instead).
//!
//! The `'de` parameter is the decode lifetime: strings returned by
//! readers borrow from the decoded container or tree and stay valid for
//! as long as it lives.

pub mod array;

pub use array::{ArrayAdapter, RawArray, SliceArray, StrArrayAdapter, StrVecArray, VecArray};

use crate::name::Name;

pub trait Serializer<'de> {
    /// Whether this encoder loads persisted data (reader) or produces it
    /// (writer).
    fn is_reader(&self) -> bool;

    /// Does the current object have a member with this name?
    fn has_member(&self, name: Name<'_>) -> bool;

    fn serialize_i32(&mut self, name: Name<'_>, var: &mut i32);
    fn serialize_u32(&mut self, name: Name<'_>, var: &mut u32);
    fn serialize_f32(&mut self, name: Name<'_>, var: &mut f32);
    fn serialize_bool(&mut self, name: Name<'_>, var: &mut bool);

    /// String field. Writers persist `value`; readers ignore it and
    /// return the stored string, borrowed from the decoder for `'de`.
    fn serialize_str(&mut self, name: Name<'_>, value: Option<&str>) -> Option<&'de str>;

    /// Nested object. On a writer the callback runs against a sub-writer
    /// and the member is elided when it writes nothing; on a reader it
    /// runs only when the member exists and is object-typed.
    fn serialize_object(&mut self, name: Name<'_>, body: &mut dyn FnMut(&mut dyn Serializer<'de>));

    /// Visit every member of the current object in stream order. The
    /// callback returns `false` to stop. Writers reflect their current
    /// written state, overridden slots excluded.
    fn iterate_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool,
    );

    fn serialize_i32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<i32>);
    fn serialize_u32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<u32>);
    fn serialize_f32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<f32>);
    fn serialize_bool_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<bool>);
    fn serialize_str_array(&mut self, name: Name<'_>, array: &mut dyn StrArrayAdapter);

    /// Writer-only: array of `len` objects, one callback invocation per
    /// index. An entry whose callback writes nothing becomes a null
    /// entry.
    fn write_object_array(
        &mut self,
        name: Name<'_>,
        len: u32,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    );

    /// Reader-only: number of entries in an object array, 0 when absent.
    fn read_object_array_size(&mut self, name: Name<'_>) -> u32;

    /// Reader-only: invoke the callback for every non-null entry.
    fn read_object_array(
        &mut self,
        name: Name<'_>,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    );
}

/// Closure-friendly wrappers over the dyn-object callbacks.
pub trait SerializerExt<'de>: Serializer<'de> {
    fn object<'n>(
        &mut self,
        name: impl Into<Name<'n>>,
        mut body: impl FnMut(&mut dyn Serializer<'de>),
    ) {
        self.serialize_object(name.into(), &mut body);
    }

    fn each_member(&mut self, mut visit: impl FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool) {
        self.iterate_elements(&mut visit);
    }

    fn object_array_write<'n>(
        &mut self,
        name: impl Into<Name<'n>>,
        len: u32,
        mut entry: impl FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        debug_assert!(!self.is_reader(), "object-array writes need a writer");
        self.write_object_array(name.into(), len, &mut entry);
    }

    fn object_array_read<'n>(
        &mut self,
        name: impl Into<Name<'n>>,
        mut entry: impl FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        debug_assert!(self.is_reader(), "object-array reads need a reader");
        self.read_object_array(name.into(), &mut entry);
    }
}

impl<'de, S: Serializer<'de> + ?Sized> SerializerExt<'de> for S {}
