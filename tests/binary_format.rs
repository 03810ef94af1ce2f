//! # Binary Format Tests
//!
//! Byte-level layout checks, override/compaction behavior, memory
//! chunks, and concurrent reads. The contract-level behavior shared with
//! the JSON binding lives in `contract_suite.rs`.

use std::sync::Barrier;

use packform::ext::{serialize_string, serialize_vec};
use packform::{
    ArrayAdapter, BinaryContainer, BinaryReader, BinaryWriter, Serializer, SerializerExt,
};

fn write_with(f: impl FnOnce(&mut dyn Serializer<'_>)) -> BinaryContainer {
    let mut container = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut container);
        f(&mut writer);
    }
    container
}

#[test]
fn scalar_element_layout_is_header_then_body() {
    let container = write_with(|s| {
        s.serialize_i32("a".into(), &mut 400);
    });

    let data = container.data();
    assert_eq!(data.len(), 10);

    // 3-bit type tag (Int = 0), 13-bit name index (first intern = 0).
    let bits = u16::from_ne_bytes([data[0], data[1]]);
    assert_eq!(bits & 0b111, 0);
    assert_eq!(bits >> 3, 0);

    let size = u32::from_ne_bytes([data[2], data[3], data[4], data[5]]);
    assert_eq!(size, 4);

    assert_eq!(&data[6..10], &400i32.to_ne_bytes());
}

#[test]
fn bool_elements_occupy_one_body_byte() {
    let container = write_with(|s| {
        s.serialize_bool("flag".into(), &mut true);
    });

    let data = container.data();
    assert_eq!(data.len(), 7);
    let bits = u16::from_ne_bytes([data[0], data[1]]);
    assert_eq!(bits & 0b111, 3);
    assert_eq!(data[6], 1);
}

#[test]
fn array_element_carries_packed_array_header() {
    let container = write_with(|s| {
        serialize_vec(s, "v".into(), &mut vec![1i32, 2, 3]);
    });

    let data = container.data();
    // Element header + array header + 3 * 4 payload bytes.
    assert_eq!(data.len(), 6 + 4 + 12);

    let bits = u16::from_ne_bytes([data[0], data[1]]);
    assert_eq!(bits & 0b111, 6);

    let array_bits = u32::from_ne_bytes([data[6], data[7], data[8], data[9]]);
    assert_eq!(array_bits & 0b111, 0);
    assert_eq!(array_bits >> 3, 3);

    assert_eq!(&data[10..14], &1i32.to_ne_bytes());
}

#[test]
fn string_values_are_interned_once() {
    let container = write_with(|s| {
        s.serialize_str("x".into(), Some("dup"));
        s.serialize_str("y".into(), Some("dup"));
    });

    // Table holds the value and both names, nothing else; the value was
    // interned before its first name.
    let table: Vec<&str> = container.string_table().iter().collect();
    assert_eq!(table, vec!["dup", "x", "y"]);

    let mut reader = BinaryReader::new(&container);
    let x = reader.serialize_str("x".into(), None).unwrap();
    let y = reader.serialize_str("y".into(), None).unwrap();
    assert_eq!(x, "dup");
    assert!(std::ptr::eq(x.as_ptr(), y.as_ptr()));
}

#[test]
fn overriding_a_name_keeps_exactly_the_last_write() {
    let container = write_with(|s| {
        s.serialize_i32("i".into(), &mut -32);
        s.serialize_str("i".into(), Some("test"));
        s.serialize_bool("i".into(), &mut true);
    });

    // Compaction left a single bool element.
    assert_eq!(container.data().len(), 7);

    let mut reader = BinaryReader::new(&container);
    assert!(reader.has_member("i".into()));

    let mut value = false;
    reader.serialize_bool("i".into(), &mut value);
    assert!(value);

    let mut visits = Vec::new();
    reader.each_member(|_, name| {
        visits.push(name.as_str().to_owned());
        true
    });
    assert_eq!(visits, vec!["i".to_string()]);
}

#[test]
fn override_is_scope_local() {
    let container = write_with(|s| {
        s.object("o", |s| {
            s.serialize_i32("x".into(), &mut 1);
        });
        s.serialize_i32("x".into(), &mut 2);
    });

    let mut reader = BinaryReader::new(&container);
    let mut outer = 0;
    reader.serialize_i32("x".into(), &mut outer);
    assert_eq!(outer, 2);

    let mut inner = 0;
    reader.object("o", |s| {
        s.serialize_i32("x".into(), &mut inner);
    });
    assert_eq!(inner, 1);
}

#[test]
fn writing_an_empty_object_array_still_overrides() {
    let container = write_with(|s| {
        s.serialize_i32("a".into(), &mut 5);
        s.object_array_write("a", 0, |_, _| {});
    });

    // The earlier scalar was nullified and the empty array elided, so
    // the name is gone entirely.
    let reader = BinaryReader::new(&container);
    assert!(!reader.has_member("a".into()));
    assert!(container.data().is_empty());
}

#[test]
fn object_array_with_only_empty_entries_is_elided() {
    let container = write_with(|s| {
        s.object_array_write("arr", 3, |_, _| {});
    });

    let reader = BinaryReader::new(&container);
    assert!(!reader.has_member("arr".into()));
}

#[test]
fn memory_chunks_round_trip_nested_containers() {
    let inner_a = write_with(|s| {
        s.serialize_i32("i".into(), &mut -24);
        s.serialize_bool("b".into(), &mut false);
        s.serialize_u32("u".into(), &mut 45);
    });
    let inner_b = write_with(|s| {
        s.serialize_f32("f".into(), &mut -30.42);
        s.serialize_str("s".into(), Some("abc"));
    });

    let mut outer = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut outer);
        writer.write_sub_container("b".into(), &inner_b);
        writer.write_sub_container("a".into(), &inner_a);
    }

    let reader = BinaryReader::new(&outer);
    {
        let view = reader.read_sub_view("a".into()).unwrap();
        let mut sub = BinaryReader::from_view(&view);
        let mut i = 0i32;
        let mut b = true;
        let mut u = 0u32;
        sub.serialize_i32("i".into(), &mut i);
        sub.serialize_bool("b".into(), &mut b);
        sub.serialize_u32("u".into(), &mut u);
        assert_eq!(i, -24);
        assert!(!b);
        assert_eq!(u, 45);
    }
    {
        let view = reader.read_sub_view("b".into()).unwrap();
        let mut sub = BinaryReader::from_view(&view);
        let mut f = 0f32;
        let mut s = String::new();
        sub.serialize_f32("f".into(), &mut f);
        serialize_string(&mut sub, "s".into(), &mut s);
        assert!((f - -30.42).abs() < 1e-6);
        assert_eq!(s, "abc");
    }
}

#[test]
fn memory_chunk_bytes_are_returned_verbatim_and_borrowed() {
    let payload = [0xDEu8, 0xAD, 0xBE, 0xEF, 0x00, 0x42];
    let mut container = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut container);
        writer.write_memory_chunk("blob".into(), &payload);
    }

    let reader = BinaryReader::new(&container);
    let chunk = reader.read_memory_chunk("blob".into()).unwrap();
    assert_eq!(chunk, &payload);

    // The chunk aliases container memory; no copy happened.
    let range = container.data().as_ptr_range();
    assert!(range.contains(&chunk.as_ptr()));

    // A chunk is not readable through typed operations.
    let mut reader = reader;
    let mut scalar = 7i32;
    reader.serialize_i32("blob".into(), &mut scalar);
    assert_eq!(scalar, 7);
}

#[test]
fn missing_chunk_reads_as_none() {
    let container = write_with(|s| {
        s.serialize_i32("i".into(), &mut 3);
    });
    let reader = BinaryReader::new(&container);
    assert!(reader.read_memory_chunk("nope".into()).is_none());
    assert!(reader.read_memory_chunk("i".into()).is_none());
    assert!(reader.read_sub_view("nope".into()).is_err());
}

/// Element-wise adapter with no bulk support, used to pin the invariant
/// that both paths load identical data.
#[derive(Default)]
struct ElementWise(Vec<i32>);

impl ArrayAdapter<i32> for ElementWise {
    fn len(&self) -> u32 {
        self.0.len() as u32
    }

    fn get(&self, i: u32) -> i32 {
        self.0[i as usize]
    }

    fn set_len(&mut self, n: u32) {
        self.0.resize(n as usize, 0);
    }

    fn set(&mut self, i: u32, v: i32) {
        self.0[i as usize] = v;
    }
}

#[test]
fn bulk_and_element_wise_reads_agree() {
    let values: Vec<i32> = (0..257).map(|i| i * 31 - 4000).collect();
    let mut original = values.clone();
    let container = write_with(|s| serialize_vec(s, "v".into(), &mut original));

    let mut reader = BinaryReader::new(&container);

    let mut bulk: Vec<i32> = Vec::new();
    serialize_vec(&mut reader, "v".into(), &mut bulk);

    let mut element_wise = ElementWise::default();
    reader.serialize_i32_array("v".into(), &mut element_wise);

    assert_eq!(bulk, values);
    assert_eq!(element_wise.0, values);
}

#[test]
fn cross_type_array_reads_widen_per_element() {
    let mut bools = vec![true, false, true];
    let container = write_with(|s| {
        serialize_vec(s, "flags".into(), &mut bools);
        serialize_vec(s, "floats".into(), &mut vec![1.9f32, 0.0, -3.2]);
    });

    let mut reader = BinaryReader::new(&container);

    // Bool cells are one byte; loading them into an i32 array must use
    // that stride.
    let mut ints: Vec<i32> = Vec::new();
    serialize_vec(&mut reader, "flags".into(), &mut ints);
    assert_eq!(ints, vec![1i32, 0, 1]);

    let mut flags: Vec<bool> = Vec::new();
    serialize_vec(&mut reader, "floats".into(), &mut flags);
    assert_eq!(flags, vec![true, false, true]);
}

#[test]
fn concurrent_readers_match_single_threaded_results() {
    let mut big: Vec<i32> = (0..1000).collect();
    let container = write_with(|s| {
        s.serialize_i32("left".into(), &mut 11);
        s.serialize_i32("right".into(), &mut 22);
        serialize_vec(s, "shared".into(), &mut big);
        s.serialize_str("tag".into(), Some("concurrent"));
    });

    let expected: Vec<i32> = (0..1000).collect();
    let barrier = Barrier::new(2);

    std::thread::scope(|scope| {
        let left = scope.spawn(|| {
            barrier.wait();
            let mut reader = BinaryReader::new(&container);
            let mut v = 0i32;
            reader.serialize_i32("left".into(), &mut v);
            let mut arr: Vec<i32> = Vec::new();
            serialize_vec(&mut reader, "shared".into(), &mut arr);
            (v, arr)
        });
        let right = scope.spawn(|| {
            barrier.wait();
            let mut reader = BinaryReader::new(&container);
            let mut v = 0i32;
            reader.serialize_i32("right".into(), &mut v);
            let tag = reader.serialize_str("tag".into(), None).map(str::to_owned);
            (v, tag)
        });

        let (left_value, left_array) = left.join().unwrap();
        let (right_value, right_tag) = right.join().unwrap();
        assert_eq!(left_value, 11);
        assert_eq!(left_array, expected);
        assert_eq!(right_value, 22);
        assert_eq!(right_tag.as_deref(), Some("concurrent"));
    });
}

#[test]
fn persisted_bytes_strip_all_tombstones() {
    let container = write_with(|s| {
        s.serialize_i32("a".into(), &mut 1);
        s.serialize_i32("b".into(), &mut 2);
        s.serialize_i32("a".into(), &mut 3);
        s.serialize_i32("c".into(), &mut 4);
    });

    // Three surviving elements, relative order of distinct names kept.
    assert_eq!(container.data().len(), 3 * 10);

    let mut reader = BinaryReader::new(&container);
    let mut order = Vec::new();
    reader.each_member(|s, name| {
        let mut v = 0i32;
        s.serialize_i32(name, &mut v);
        order.push((name.as_str().to_owned(), v));
        true
    });
    assert_eq!(
        order,
        vec![
            ("b".to_string(), 2),
            ("a".to_string(), 3),
            ("c".to_string(), 4)
        ]
    );
}
