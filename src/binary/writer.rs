//! # BinaryWriter
//!
//! Appends elements to a borrowed [`BinaryContainer`] as the user's
//! serialize description runs. Each writer owns one object scope: the
//! range from its start offset to the end of the buffer. Sub-writers for
//! nested objects and object-array entries share the same buffer and
//! string table, with their own start offset.
//!
//! ## Override
//!
//! Writing a name twice in one scope is legal and the last write wins:
//! before appending, the writer retags earlier same-name headers in its
//! scope as `Null` (size preserved, so traversal still works). When a
//! writer goes out of scope it compacts its range, shifting the surviving
//! elements down over the tombstones, so finalized bytes never contain a
//! Null header.
//!
//! ## Elision
//!
//! An object whose callback wrote nothing leaves no trace: the reserved
//! header is rewound and the name is never interned. An object array
//! whose entries all wrote nothing is rewound the same way.

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::binary::container::{BinaryContainer, StringTable};
use crate::binary::headers::{
    ArrayHeader, ElementHeader, ElementType, ARRAY_HEADER_SIZE, ELEMENT_HEADER_SIZE,
};
use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, StrArrayAdapter};

const INITIAL_CAPACITY: usize = 4096;

pub struct BinaryWriter<'a> {
    strings: &'a mut StringTable,
    data: &'a mut Vec<u8>,
    /// Offset of the first header this writer owns (top of its scope).
    scope_start: usize,
}

impl<'a> BinaryWriter<'a> {
    pub fn new(container: &'a mut BinaryContainer) -> Self {
        if container.data.capacity() == 0 {
            container.data.reserve(INITIAL_CAPACITY);
        }
        let scope_start = container.data.len();
        Self {
            strings: &mut container.strings,
            data: &mut container.data,
            scope_start,
        }
    }

    fn sub_writer(&mut self) -> BinaryWriter<'_> {
        let scope_start = self.data.len();
        BinaryWriter {
            strings: &mut *self.strings,
            data: &mut *self.data,
            scope_start,
        }
    }

    /// Embed an opaque byte chunk under `name`, encoded as an Array
    /// element with inner type Null. The reader hands the bytes back
    /// verbatim; this is the substrate for nesting containers.
    pub fn write_memory_chunk(&mut self, name: Name<'_>, chunk: &[u8]) {
        let name_idx = self.strings.intern(name.as_str());
        self.nullify(name_idx, self.data.len());

        let header = ElementHeader::new(
            ElementType::Array,
            name_idx,
            (ARRAY_HEADER_SIZE + chunk.len()) as u32,
        );
        self.data.extend_from_slice(header.as_bytes());
        self.data
            .extend_from_slice(ArrayHeader::new(ElementType::Null, chunk.len() as u32).as_bytes());
        self.data.extend_from_slice(chunk);
    }

    /// Serialize `inner` to memory and embed it as a chunk under `name`.
    pub fn write_sub_container(&mut self, name: Name<'_>, inner: &BinaryContainer) {
        let bytes = inner.to_bytes();
        self.write_memory_chunk(name, &bytes);
    }

    /// Retag every same-name header in `[scope_start, end)` as Null.
    /// Walks top-level elements only; override is scope-local and never
    /// recurses into nested objects.
    fn nullify(&mut self, name_idx: u16, end: usize) {
        let mut offset = self.scope_start;
        while offset + ELEMENT_HEADER_SIZE <= end {
            let (header, _) = ElementHeader::read_from_prefix(&self.data[offset..])
                .expect("scope holds whole headers");
            if header.name_index() == name_idx {
                let slot =
                    ElementHeader::mut_from_bytes(&mut self.data[offset..offset + ELEMENT_HEADER_SIZE])
                        .expect("header slice is header sized");
                slot.set_type(ElementType::Null);
            }
            offset += ELEMENT_HEADER_SIZE + header.size() as usize;
        }
    }

    /// Drop the Null tombstones from this writer's scope, shifting
    /// later elements down. `copy_within` is overlap-safe, which the
    /// shift relies on.
    fn compact(&mut self) {
        let end = self.data.len();
        let mut read = self.scope_start;
        let mut write = self.scope_start;
        while read + ELEMENT_HEADER_SIZE <= end {
            let (header, _) = ElementHeader::read_from_prefix(&self.data[read..])
                .expect("scope holds whole headers");
            let span = ELEMENT_HEADER_SIZE + header.size() as usize;
            if header.element_type() != ElementType::Null {
                if write != read {
                    self.data.copy_within(read..read + span, write);
                }
                write += span;
            }
            read += span;
        }
        self.data.truncate(write);
    }

    fn intern_and_nullify(&mut self, name: Name<'_>) -> u16 {
        let name_idx = self.strings.intern(name.as_str());
        self.nullify(name_idx, self.data.len());
        name_idx
    }

    fn write_scalar(&mut self, name: Name<'_>, ty: ElementType, body: &[u8]) {
        let name_idx = self.intern_and_nullify(name);
        let header = ElementHeader::new(ty, name_idx, body.len() as u32);
        self.data.extend_from_slice(header.as_bytes());
        self.data.extend_from_slice(body);
    }

    fn write_pod_array<T>(
        &mut self,
        name: Name<'_>,
        inner: ElementType,
        array: &mut dyn ArrayAdapter<T>,
    ) where
        T: IntoBytes + Immutable + Copy,
    {
        let count = array.len();
        let name_idx = self.intern_and_nullify(name);

        let payload = count as usize * std::mem::size_of::<T>();
        let header =
            ElementHeader::new(ElementType::Array, name_idx, (ARRAY_HEADER_SIZE + payload) as u32);
        self.data.extend_from_slice(header.as_bytes());
        self.data
            .extend_from_slice(ArrayHeader::new(inner, count).as_bytes());

        if array.supports_bulk() {
            let all = array.as_slice();
            debug_assert_eq!(all.len(), count as usize, "bulk and element forms disagree");
            self.data.extend_from_slice(all.as_bytes());
        } else {
            for i in 0..count {
                let v = array.get(i);
                self.data.extend_from_slice(v.as_bytes());
            }
        }
    }
}

impl Drop for BinaryWriter<'_> {
    fn drop(&mut self) {
        self.compact();
    }
}

impl<'de> Serializer<'de> for BinaryWriter<'_> {
    fn is_reader(&self) -> bool {
        false
    }

    fn has_member(&self, name: Name<'_>) -> bool {
        let mut offset = self.scope_start;
        let end = self.data.len();
        while offset + ELEMENT_HEADER_SIZE <= end {
            let (header, _) = ElementHeader::read_from_prefix(&self.data[offset..])
                .expect("scope holds whole headers");
            if header.element_type() != ElementType::Null
                && self.strings.get(header.name_index()) == Some(name.as_str())
            {
                return true;
            }
            offset += ELEMENT_HEADER_SIZE + header.size() as usize;
        }
        false
    }

    fn serialize_i32(&mut self, name: Name<'_>, var: &mut i32) {
        self.write_scalar(name, ElementType::Int, &var.to_ne_bytes());
    }

    fn serialize_u32(&mut self, name: Name<'_>, var: &mut u32) {
        self.write_scalar(name, ElementType::UInt, &var.to_ne_bytes());
    }

    fn serialize_f32(&mut self, name: Name<'_>, var: &mut f32) {
        self.write_scalar(name, ElementType::Float, &var.to_ne_bytes());
    }

    fn serialize_bool(&mut self, name: Name<'_>, var: &mut bool) {
        self.write_scalar(name, ElementType::Bool, &[*var as u8]);
    }

    fn serialize_str(&mut self, name: Name<'_>, value: Option<&str>) -> Option<&'de str> {
        debug_assert!(value.is_some(), "writer expects a string value");
        // The value is interned before the name, so a first-use name and
        // value land in the table in value-then-name order.
        let value_idx = self.strings.intern(value.unwrap_or("")) as u32;
        self.write_scalar(name, ElementType::String, &value_idx.to_ne_bytes());
        None
    }

    fn serialize_object(&mut self, name: Name<'_>, body: &mut dyn FnMut(&mut dyn Serializer<'de>)) {
        // Reserve the header now; its size is only known once the
        // callback has run.
        let header_start = self.data.len();
        self.data.resize(header_start + ELEMENT_HEADER_SIZE, 0);

        {
            let mut sub = self.sub_writer();
            body(&mut sub);
        }

        if self.data.len() == header_start + ELEMENT_HEADER_SIZE {
            // Nothing was written; the member does not appear at all.
            self.data.truncate(header_start);
        } else {
            let size = (self.data.len() - header_start - ELEMENT_HEADER_SIZE) as u32;
            let name_idx = self.strings.intern(name.as_str());
            let header = ElementHeader::new(ElementType::Object, name_idx, size);
            self.data[header_start..header_start + ELEMENT_HEADER_SIZE]
                .copy_from_slice(header.as_bytes());
        }
    }

    fn iterate_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool,
    ) {
        // The end is frozen before the walk; elements the callback
        // appends are not visited, but tombstones it creates are
        // re-checked because each header is re-read at its offset.
        let end = self.data.len();
        let mut offset = self.scope_start;
        while offset + ELEMENT_HEADER_SIZE <= end {
            let (header, _) = ElementHeader::read_from_prefix(&self.data[offset..])
                .expect("scope holds whole headers");
            let next = offset + ELEMENT_HEADER_SIZE + header.size() as usize;
            if header.element_type() != ElementType::Null {
                let name = self
                    .strings
                    .get(header.name_index())
                    .unwrap_or_default()
                    .to_owned();
                if !visit(self, Name::new(&name)) {
                    break;
                }
            }
            offset = next;
        }
    }

    fn serialize_i32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<i32>) {
        self.write_pod_array(name, ElementType::Int, array);
    }

    fn serialize_u32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<u32>) {
        self.write_pod_array(name, ElementType::UInt, array);
    }

    fn serialize_f32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<f32>) {
        self.write_pod_array(name, ElementType::Float, array);
    }

    fn serialize_bool_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<bool>) {
        // One byte per element, normalized to 0/1; bools never take the
        // bulk path.
        let count = array.len();
        let name_idx = self.intern_and_nullify(name);

        let header = ElementHeader::new(
            ElementType::Array,
            name_idx,
            (ARRAY_HEADER_SIZE + count as usize) as u32,
        );
        self.data.extend_from_slice(header.as_bytes());
        self.data
            .extend_from_slice(ArrayHeader::new(ElementType::Bool, count).as_bytes());
        for i in 0..count {
            self.data.push(array.get(i) as u8);
        }
    }

    fn serialize_str_array(&mut self, name: Name<'_>, array: &mut dyn StrArrayAdapter) {
        let count = array.len();
        let name_idx = self.intern_and_nullify(name);

        let header = ElementHeader::new(
            ElementType::Array,
            name_idx,
            (ARRAY_HEADER_SIZE + count as usize * 4) as u32,
        );
        self.data.extend_from_slice(header.as_bytes());
        self.data
            .extend_from_slice(ArrayHeader::new(ElementType::String, count).as_bytes());
        for i in 0..count {
            let idx = self.strings.intern(array.get(i)) as u32;
            self.data.extend_from_slice(&idx.to_ne_bytes());
        }
    }

    fn write_object_array(
        &mut self,
        name: Name<'_>,
        len: u32,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        let element_start = self.data.len();
        self.data
            .resize(element_start + ELEMENT_HEADER_SIZE + ARRAY_HEADER_SIZE, 0);

        for i in 0..len {
            // Each entry is prefixed by its size; zero marks a null
            // entry whose callback wrote nothing.
            let size_start = self.data.len();
            self.data.resize(size_start + 4, 0);
            {
                let mut sub = self.sub_writer();
                entry(&mut sub, i);
            }
            let entry_size = (self.data.len() - size_start - 4) as u32;
            self.data[size_start..size_start + 4].copy_from_slice(&entry_size.to_ne_bytes());
        }

        let name_idx = self.strings.intern(name.as_str());
        // Earlier same-name elements are overridden even when the array
        // itself ends up elided below.
        self.nullify(name_idx, element_start);

        let empty_len =
            element_start + ELEMENT_HEADER_SIZE + ARRAY_HEADER_SIZE + len as usize * 4;
        if self.data.len() == empty_len {
            self.data.truncate(element_start);
        } else {
            let size = (self.data.len() - element_start - ELEMENT_HEADER_SIZE) as u32;
            let header = ElementHeader::new(ElementType::Array, name_idx, size);
            self.data[element_start..element_start + ELEMENT_HEADER_SIZE]
                .copy_from_slice(header.as_bytes());
            let array_header = ArrayHeader::new(ElementType::Object, len);
            self.data[element_start + ELEMENT_HEADER_SIZE
                ..element_start + ELEMENT_HEADER_SIZE + ARRAY_HEADER_SIZE]
                .copy_from_slice(array_header.as_bytes());
        }
    }

    fn read_object_array_size(&mut self, _name: Name<'_>) -> u32 {
        debug_assert!(false, "read_object_array_size is reader-only");
        0
    }

    fn read_object_array(
        &mut self,
        _name: Name<'_>,
        _entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        debug_assert!(false, "read_object_array is reader-only");
    }
}
