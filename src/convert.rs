//! # Format-to-Format Transcoding
//!
//! Walks one encoding's persisted model and re-drives the serializer
//! contract against a writer for another encoding. No intermediate user
//! value is materialized: primitive arrays are exposed to the destination
//! through adapters that view the source payload directly, and objects
//! recurse through `serialize_object` callbacks.
//!
//! This is what turns a development-time JSON save into the shipping
//! binary format (and back, for inspection).

use std::marker::PhantomData;

use serde_json::Value;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::binary::container::{BinaryContainer, BinaryView, TableRef};
use crate::binary::headers::{element_body, elements, ArrayHeader, ElementHeader, ElementType};
use crate::binary::numeric::Numeric;
use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, SerializerExt, StrArrayAdapter};

/// Re-drive the contract from a binary container into `writer`.
pub fn binary_to_other(container: &BinaryContainer, writer: &mut dyn Serializer<'_>) {
    walk_scope(
        TableRef::Owned(container.string_table()),
        container.data(),
        writer,
    );
}

/// Same as [`binary_to_other`] for a non-owning view.
pub fn binary_view_to_other(view: &BinaryView<'_>, writer: &mut dyn Serializer<'_>) {
    walk_scope(TableRef::Borrowed(view), view.data(), writer);
}

fn walk_scope(strings: TableRef<'_>, data: &[u8], writer: &mut dyn Serializer<'_>) {
    debug_assert!(!writer.is_reader(), "transcoding drives a writer");
    for (offset, header) in elements(data) {
        let Some(name) = strings.get(header.name_index()) else {
            continue;
        };
        emit_element(strings, data, offset, header, Name::new(name), writer);
    }
}

fn emit_element(
    strings: TableRef<'_>,
    data: &[u8],
    offset: usize,
    header: ElementHeader,
    name: Name<'_>,
    writer: &mut dyn Serializer<'_>,
) {
    let Some(body) = element_body(data, offset, header) else {
        return;
    };
    let ty = header.element_type();
    if ty.is_numeric() {
        match Numeric::decode(ty, body) {
            Some(Numeric::Int(mut v)) => writer.serialize_i32(name, &mut v),
            Some(Numeric::UInt(mut v)) => writer.serialize_u32(name, &mut v),
            Some(Numeric::Float(mut v)) => writer.serialize_f32(name, &mut v),
            Some(Numeric::Bool(mut v)) => writer.serialize_bool(name, &mut v),
            None => {}
        }
        return;
    }
    match ty {
        ElementType::String => {
            let Some(idx) = body.get(..4).and_then(|b| b.try_into().ok()) else {
                return;
            };
            let idx = u32::from_ne_bytes(idx);
            if let Some(s) = u16::try_from(idx).ok().and_then(|idx| strings.get(idx)) {
                writer.serialize_str(name, Some(s));
            }
        }
        ElementType::Object => {
            writer.object(name, |s| walk_scope(strings, body, s));
        }
        ElementType::Array => {
            emit_array(strings, body, name, writer);
        }
        ElementType::Null => {
            debug_assert!(false, "finalized streams contain no null elements");
        }
        _ => {}
    }
}

fn emit_array(strings: TableRef<'_>, body: &[u8], name: Name<'_>, writer: &mut dyn Serializer<'_>) {
    let Ok((array_header, payload)) = ArrayHeader::read_from_prefix(body) else {
        return;
    };
    let count = array_header.element_count();
    match array_header.inner_type() {
        ElementType::Int => {
            writer.serialize_i32_array(name, &mut PayloadArray::<i32>::new(payload, count));
        }
        ElementType::UInt => {
            writer.serialize_u32_array(name, &mut PayloadArray::<u32>::new(payload, count));
        }
        ElementType::Float => {
            writer.serialize_f32_array(name, &mut PayloadArray::<f32>::new(payload, count));
        }
        ElementType::Bool => {
            writer.serialize_bool_array(name, &mut BytePayloadArray::new(payload, count));
        }
        ElementType::String => {
            writer.serialize_str_array(
                name,
                &mut StringIndexArray {
                    strings,
                    payload,
                    count,
                },
            );
        }
        ElementType::Object => {
            writer.object_array_write(name, count, |s, idx| {
                if let Some(entry) = seek_entry(payload, idx) {
                    walk_scope(strings, entry, s);
                }
            });
        }
        // Memory chunks are user-defined bytes with no representation in
        // other encodings.
        ElementType::Null | ElementType::Array => {}
    }
}

/// Bytes of object-array entry `idx`, or `None` for a null entry or a
/// truncated stream.
fn seek_entry(payload: &[u8], idx: u32) -> Option<&[u8]> {
    let mut cursor = 0usize;
    let mut remaining = idx;
    loop {
        let size_bytes = payload.get(cursor..cursor + 4)?;
        let entry_size =
            u32::from_ne_bytes(size_bytes.try_into().expect("prefix is 4 bytes")) as usize;
        cursor += 4;
        if remaining == 0 {
            if entry_size == 0 {
                return None;
            }
            return payload.get(cursor..cursor + entry_size);
        }
        cursor += entry_size;
        remaining -= 1;
    }
}

/// Unaligned read-only view over a primitive array payload. Exposes the
/// bulk slice when the payload happens to be aligned for `T`, decodes per
/// cell otherwise.
struct PayloadArray<'a, T> {
    payload: &'a [u8],
    count: u32,
    _elem: PhantomData<T>,
}

impl<'a, T: FromBytes + KnownLayout + Immutable> PayloadArray<'a, T> {
    fn new(payload: &'a [u8], count: u32) -> Self {
        let elem = std::mem::size_of::<T>();
        let count = count.min((payload.len() / elem) as u32);
        Self {
            payload: &payload[..count as usize * elem],
            count,
            _elem: PhantomData,
        }
    }
}

impl<T> ArrayAdapter<T> for PayloadArray<'_, T>
where
    T: FromBytes + IntoBytes + Immutable + KnownLayout + Copy,
{
    fn len(&self) -> u32 {
        self.count
    }

    fn get(&self, i: u32) -> T {
        let elem = std::mem::size_of::<T>();
        T::read_from_bytes(&self.payload[i as usize * elem..(i as usize + 1) * elem])
            .expect("cell is element sized")
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "payload views are read-only");
    }

    fn set(&mut self, _i: u32, _v: T) {
        debug_assert!(false, "payload views are read-only");
    }

    fn supports_bulk(&self) -> bool {
        <[T]>::ref_from_bytes(self.payload).is_ok()
    }

    fn as_slice(&self) -> &[T] {
        <[T]>::ref_from_bytes(self.payload).expect("alignment checked by supports_bulk")
    }
}

/// Read-only bool view over one-byte cells.
struct BytePayloadArray<'a> {
    payload: &'a [u8],
    count: u32,
}

impl<'a> BytePayloadArray<'a> {
    fn new(payload: &'a [u8], count: u32) -> Self {
        let count = count.min(payload.len() as u32);
        Self { payload, count }
    }
}

impl ArrayAdapter<bool> for BytePayloadArray<'_> {
    fn len(&self) -> u32 {
        self.count
    }

    fn get(&self, i: u32) -> bool {
        self.payload[i as usize] != 0
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "payload views are read-only");
    }

    fn set(&mut self, _i: u32, _v: bool) {
        debug_assert!(false, "payload views are read-only");
    }
}

/// Read-only string view resolving table indices out of the payload.
struct StringIndexArray<'a> {
    strings: TableRef<'a>,
    payload: &'a [u8],
    count: u32,
}

impl StrArrayAdapter for StringIndexArray<'_> {
    fn len(&self) -> u32 {
        self.count
    }

    fn get(&self, i: u32) -> &str {
        self.payload
            .get(i as usize * 4..(i as usize + 1) * 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_ne_bytes)
            .and_then(|idx| u16::try_from(idx).ok())
            .and_then(|idx| self.strings.get(idx))
            .unwrap_or_default()
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "payload views are read-only");
    }

    fn set(&mut self, _i: u32, _v: &str) {
        debug_assert!(false, "payload views are read-only");
    }
}

/// Re-drive the contract from a JSON tree into `writer`. The tree's root
/// must be an object; transcode a root array through
/// [`json_member_to_other`] under an explicit name instead.
pub fn json_to_other(value: &Value, writer: &mut dyn Serializer<'_>) {
    debug_assert!(value.is_object(), "the contract's root is an object");
    if let Some(map) = value.as_object() {
        for (key, member) in map {
            json_member_to_other(member, Name::new(key), writer);
        }
    }
}

/// Transcode one JSON value as the member `name` of the current object.
pub fn json_member_to_other(value: &Value, name: Name<'_>, writer: &mut dyn Serializer<'_>) {
    debug_assert!(!writer.is_reader(), "transcoding drives a writer");
    match value {
        Value::Object(map) => {
            writer.object(name, |s| {
                for (key, member) in map {
                    json_member_to_other(member, Name::new(key), s);
                }
            });
        }
        Value::Array(items) => transcode_json_array(items, name, writer),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                writer.serialize_i32(name, &mut (i as i32));
            } else if let Some(u) = n.as_u64() {
                writer.serialize_u32(name, &mut (u as u32));
            } else if let Some(f) = n.as_f64() {
                writer.serialize_f32(name, &mut (f as f32));
            }
        }
        Value::String(s) => {
            writer.serialize_str(name, Some(s));
        }
        Value::Bool(b) => {
            let mut v = *b;
            writer.serialize_bool(name, &mut v);
        }
        Value::Null => {}
    }
}

fn transcode_json_array(items: &[Value], name: Name<'_>, writer: &mut dyn Serializer<'_>) {
    if items.is_empty() {
        return;
    }

    // The first element decides the member's type; a mixed numeric
    // array promotes integer to real, nothing else is reassigned. An
    // array led by null therefore matches no branch and the member is
    // dropped.
    let promoted = is_integer(&items[0]) && items.iter().any(is_real);

    match &items[0] {
        Value::Object(_) => {
            writer.object_array_write(name, items.len() as u32, |s, idx| {
                if let Some(map) = items[idx as usize].as_object() {
                    for (key, member) in map {
                        json_member_to_other(member, Name::new(key), s);
                    }
                }
            });
        }
        Value::Number(_) if is_real(&items[0]) || promoted => {
            writer.serialize_f32_array(
                name,
                &mut JsonValueArray::new(items, |v| v.as_f64().map(|f| f as f32)),
            );
        }
        Value::Number(_) => {
            writer.serialize_i32_array(
                name,
                &mut JsonValueArray::new(items, |v| v.as_i64().map(|i| i as i32)),
            );
        }
        Value::Bool(_) => {
            writer.serialize_bool_array(name, &mut JsonValueArray::new(items, Value::as_bool));
        }
        Value::String(_) => {
            writer.serialize_str_array(name, &mut JsonStrArray { items });
        }
        Value::Array(_) => {
            debug_assert!(
                false,
                "arrays of arrays are not representable; wrap the inner array in an object"
            );
        }
        Value::Null => {}
    }
}

fn is_integer(v: &Value) -> bool {
    matches!(v, Value::Number(n) if n.as_i64().is_some() || n.as_u64().is_some())
}

fn is_real(v: &Value) -> bool {
    matches!(v, Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none())
}

/// Read-only primitive view over a JSON array slice.
struct JsonValueArray<'a, T> {
    items: &'a [Value],
    conv: fn(&Value) -> Option<T>,
}

impl<'a, T> JsonValueArray<'a, T> {
    fn new(items: &'a [Value], conv: fn(&Value) -> Option<T>) -> Self {
        Self { items, conv }
    }
}

impl<T: Copy + Default> ArrayAdapter<T> for JsonValueArray<'_, T> {
    fn len(&self) -> u32 {
        self.items.len() as u32
    }

    fn get(&self, i: u32) -> T {
        (self.conv)(&self.items[i as usize]).unwrap_or_default()
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "transcoding sources are read-only");
    }

    fn set(&mut self, _i: u32, _v: T) {
        debug_assert!(false, "transcoding sources are read-only");
    }
}

struct JsonStrArray<'a> {
    items: &'a [Value],
}

impl StrArrayAdapter for JsonStrArray<'_> {
    fn len(&self) -> u32 {
        self.items.len() as u32
    }

    fn get(&self, i: u32) -> &str {
        self.items[i as usize].as_str().unwrap_or_default()
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "transcoding sources are read-only");
    }

    fn set(&mut self, _i: u32, _v: &str) {
        debug_assert!(false, "transcoding sources are read-only");
    }
}
