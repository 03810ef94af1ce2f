//! # BinaryReader
//!
//! Stateless reads over a finalized container or view. A reader is a
//! pair of borrows (string table + byte range) and nothing else, so it is
//! `Copy`, and any number of readers over the same container can be
//! driven concurrently from independent threads.
//!
//! Name lookup walks the element sequence of the current scope and
//! compares resolved names; nested objects are read through sub-readers
//! whose range is exactly the parent element's body. Every header is
//! bounds-checked against the remaining range, so corrupted input ends a
//! walk instead of reading out of bounds.

use eyre::Result;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::binary::container::{BinaryContainer, BinaryView, TableRef};
use crate::binary::headers::{
    element_body, elements, ArrayHeader, ElementHeader, ElementType,
};
use crate::binary::numeric::{Numeric, Widen};
use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, StrArrayAdapter};

#[derive(Clone, Copy)]
pub struct BinaryReader<'de> {
    strings: TableRef<'de>,
    data: &'de [u8],
}

impl<'de> BinaryReader<'de> {
    pub fn new(container: &'de BinaryContainer) -> Self {
        Self {
            strings: TableRef::Owned(&container.strings),
            data: &container.data,
        }
    }

    pub fn from_view(view: &'de BinaryView<'de>) -> Self {
        Self {
            strings: TableRef::Borrowed(view),
            data: view.data(),
        }
    }

    /// Borrowed bytes of a chunk written with `write_memory_chunk`, or
    /// `None` when the member is missing or not a chunk.
    pub fn read_memory_chunk(&self, name: Name<'_>) -> Option<&'de [u8]> {
        let (offset, header) = self.find(name)?;
        if header.element_type() != ElementType::Array {
            return None;
        }
        let body = element_body(self.data, offset, header)?;
        let (array_header, payload) = ArrayHeader::read_from_prefix(body).ok()?;
        if array_header.inner_type() != ElementType::Null {
            return None;
        }
        payload.get(..array_header.element_count() as usize)
    }

    /// Parse a nested container previously embedded with
    /// `write_sub_container`. The view borrows this reader's backing
    /// memory.
    pub fn read_sub_view(&self, name: Name<'_>) -> Result<BinaryView<'de>> {
        let chunk = self
            .read_memory_chunk(name)
            .ok_or_else(|| eyre::eyre!("no memory chunk named {:?}", name.as_str()))?;
        BinaryView::parse(chunk)
    }

    /// First element of the current scope whose resolved name matches.
    fn find(&self, name: Name<'_>) -> Option<(usize, ElementHeader)> {
        elements(self.data)
            .find(|(_, header)| self.strings.get(header.name_index()) == Some(name.as_str()))
    }

    fn body(&self, offset: usize, header: ElementHeader) -> &'de [u8] {
        element_body(self.data, offset, header).unwrap_or(&[])
    }

    fn read_numeric(&self, name: Name<'_>) -> Option<Numeric> {
        let (offset, header) = self.find(name)?;
        Numeric::decode(header.element_type(), self.body(offset, header))
    }

    /// Arrays of 4-byte primitives. An exact inner-type match takes the
    /// bulk path when the adapter supports it and the payload happens to
    /// be aligned for `T`; everything else converts per element with the
    /// cell stride of the persisted inner type. A numeric scalar under
    /// the name loads as a one-element array.
    fn read_pod_array<T>(
        &self,
        name: Name<'_>,
        expected: ElementType,
        array: &mut dyn ArrayAdapter<T>,
    ) where
        T: FromBytes + IntoBytes + Immutable + KnownLayout + Widen,
    {
        let Some((offset, header)) = self.find(name) else {
            return;
        };
        match header.element_type() {
            ElementType::Array => {
                let body = self.body(offset, header);
                let Ok((array_header, payload)) = ArrayHeader::read_from_prefix(body) else {
                    return;
                };
                let count = array_header.element_count();
                let inner = array_header.inner_type();
                if inner == expected {
                    let elem = std::mem::size_of::<T>();
                    let Some(payload) = payload.get(..count as usize * elem) else {
                        return;
                    };
                    if array.supports_bulk() {
                        if let Ok(all) = <[T]>::ref_from_bytes(payload) {
                            array.set_all(all);
                            return;
                        }
                    }
                    array.set_len(count);
                    for i in 0..count as usize {
                        let v = T::read_from_bytes(&payload[i * elem..(i + 1) * elem])
                            .expect("cell is element sized");
                        array.set(i as u32, v);
                    }
                } else {
                    self.widen_array(inner, count, payload, array);
                }
            }
            ElementType::Object => {
                debug_assert!(false, "cannot load an object into a primitive array");
            }
            ty => {
                if let Some(n) = Numeric::decode(ty, self.body(offset, header)) {
                    array.set_len(1);
                    array.set(0, T::from_numeric(n));
                }
            }
        }
    }

    fn widen_array<T: Widen>(
        &self,
        inner: ElementType,
        count: u32,
        payload: &[u8],
        array: &mut dyn ArrayAdapter<T>,
    ) {
        let stride = match inner {
            ElementType::Bool => 1,
            ElementType::Int | ElementType::UInt | ElementType::Float => 4,
            _ => return,
        };
        let Some(payload) = payload.get(..count as usize * stride) else {
            return;
        };
        array.set_len(count);
        for i in 0..count as usize {
            if let Some(n) = Numeric::decode(inner, &payload[i * stride..]) {
                array.set(i as u32, T::from_numeric(n));
            }
        }
    }
}

impl<'de> Serializer<'de> for BinaryReader<'de> {
    fn is_reader(&self) -> bool {
        true
    }

    fn has_member(&self, name: Name<'_>) -> bool {
        self.find(name).is_some()
    }

    fn serialize_i32(&mut self, name: Name<'_>, var: &mut i32) {
        if let Some(n) = self.read_numeric(name) {
            *var = n.to_i32();
        }
    }

    fn serialize_u32(&mut self, name: Name<'_>, var: &mut u32) {
        if let Some(n) = self.read_numeric(name) {
            *var = n.to_u32();
        }
    }

    fn serialize_f32(&mut self, name: Name<'_>, var: &mut f32) {
        if let Some(n) = self.read_numeric(name) {
            *var = n.to_f32();
        }
    }

    fn serialize_bool(&mut self, name: Name<'_>, var: &mut bool) {
        if let Some(n) = self.read_numeric(name) {
            *var = n.to_bool();
        }
    }

    fn serialize_str(&mut self, name: Name<'_>, _value: Option<&str>) -> Option<&'de str> {
        let (offset, header) = self.find(name)?;
        if header.element_type() != ElementType::String {
            return None;
        }
        let body = self.body(offset, header);
        let idx = u32::from_ne_bytes(body.get(..4)?.try_into().ok()?);
        self.strings.get(u16::try_from(idx).ok()?)
    }

    fn serialize_object(&mut self, name: Name<'_>, f: &mut dyn FnMut(&mut dyn Serializer<'de>)) {
        let Some((offset, header)) = self.find(name) else {
            return;
        };
        if header.element_type() != ElementType::Object {
            return;
        }
        let mut sub = BinaryReader {
            strings: self.strings,
            data: self.body(offset, header),
        };
        f(&mut sub);
    }

    fn iterate_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool,
    ) {
        let data = self.data;
        let strings = self.strings;
        for (_, header) in elements(data) {
            let Some(name) = strings.get(header.name_index()) else {
                continue;
            };
            if !visit(self, Name::new(name)) {
                break;
            }
        }
    }

    fn serialize_i32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<i32>) {
        self.read_pod_array(name, ElementType::Int, array);
    }

    fn serialize_u32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<u32>) {
        self.read_pod_array(name, ElementType::UInt, array);
    }

    fn serialize_f32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<f32>) {
        self.read_pod_array(name, ElementType::Float, array);
    }

    fn serialize_bool_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<bool>) {
        // bool is not a bytes-compatible type, so there is no bulk path;
        // the widening loop covers the exact-type case with stride 1.
        let Some((offset, header)) = self.find(name) else {
            return;
        };
        match header.element_type() {
            ElementType::Array => {
                let body = self.body(offset, header);
                let Ok((array_header, payload)) = ArrayHeader::read_from_prefix(body) else {
                    return;
                };
                self.widen_array(
                    array_header.inner_type(),
                    array_header.element_count(),
                    payload,
                    array,
                );
            }
            ElementType::Object => {
                debug_assert!(false, "cannot load an object into a primitive array");
            }
            ty => {
                if let Some(n) = Numeric::decode(ty, self.body(offset, header)) {
                    array.set_len(1);
                    array.set(0, n.to_bool());
                }
            }
        }
    }

    fn serialize_str_array(&mut self, name: Name<'_>, array: &mut dyn StrArrayAdapter) {
        let Some((offset, header)) = self.find(name) else {
            return;
        };
        match header.element_type() {
            ElementType::Array => {
                let body = self.body(offset, header);
                let Ok((array_header, payload)) = ArrayHeader::read_from_prefix(body) else {
                    return;
                };
                if array_header.inner_type() != ElementType::String {
                    return;
                }
                let count = array_header.element_count();
                let Some(payload) = payload.get(..count as usize * 4) else {
                    return;
                };
                array.set_len(count);
                for i in 0..count as usize {
                    let idx = u32::from_ne_bytes(
                        payload[i * 4..(i + 1) * 4]
                            .try_into()
                            .expect("cell is 4 bytes"),
                    );
                    if let Some(s) = u16::try_from(idx).ok().and_then(|idx| self.strings.get(idx)) {
                        array.set(i as u32, s);
                    }
                }
            }
            ElementType::String => {
                let body = self.body(offset, header);
                let Some(idx) = body.get(..4).and_then(|b| b.try_into().ok()) else {
                    return;
                };
                let idx = u32::from_ne_bytes(idx);
                if let Some(s) = u16::try_from(idx).ok().and_then(|idx| self.strings.get(idx)) {
                    array.set_len(1);
                    array.set(0, s);
                }
            }
            _ => {}
        }
    }

    fn write_object_array(
        &mut self,
        _name: Name<'_>,
        _len: u32,
        _entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        debug_assert!(false, "write_object_array is writer-only");
    }

    fn read_object_array_size(&mut self, name: Name<'_>) -> u32 {
        let Some((offset, header)) = self.find(name) else {
            return 0;
        };
        if header.element_type() != ElementType::Array {
            return 0;
        }
        let body = self.body(offset, header);
        let Ok((array_header, _)) = ArrayHeader::read_from_prefix(body) else {
            return 0;
        };
        debug_assert_eq!(
            array_header.inner_type(),
            ElementType::Object,
            "element is not an object array"
        );
        array_header.element_count()
    }

    fn read_object_array(
        &mut self,
        name: Name<'_>,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        let Some((offset, header)) = self.find(name) else {
            return;
        };
        if header.element_type() != ElementType::Array {
            return;
        }
        let body = self.body(offset, header);
        let Ok((array_header, payload)) = ArrayHeader::read_from_prefix(body) else {
            return;
        };
        if array_header.inner_type() != ElementType::Object {
            debug_assert!(false, "element is not an object array");
            return;
        }

        // Entries are `{u32 size, bytes}`; size 0 is a null entry whose
        // callback is skipped.
        let count = array_header.element_count();
        let mut cursor = 0usize;
        for i in 0..count {
            let Some(size_bytes) = payload.get(cursor..cursor + 4) else {
                return;
            };
            let entry_size =
                u32::from_ne_bytes(size_bytes.try_into().expect("prefix is 4 bytes")) as usize;
            cursor += 4;
            let Some(entry_bytes) = payload.get(cursor..cursor + entry_size) else {
                return;
            };
            if entry_size > 0 {
                let mut sub = BinaryReader {
                    strings: self.strings,
                    data: entry_bytes,
                };
                entry(&mut sub, i);
            }
            cursor += entry_size;
        }
    }
}
