//! # Cross-Format Transcoding Tests
//!
//! A persisted model walked through the transcoder must produce the same
//! result as writing the original value against the destination encoder
//! directly: JSON -> binary -> JSON yields the same tree, and binary ->
//! JSON -> binary yields the same bytes for types the JSON model can
//! carry.

use packform::ext::serialize_vec;
use packform::{
    binary_to_other, json_to_other, BinaryContainer, BinaryReader, BinaryWriter, JsonReader,
    JsonWriter, Serializer, SerializerExt,
};
use serde_json::json;

fn binary_from_json(tree: &serde_json::Value) -> BinaryContainer {
    let mut container = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut container);
        json_to_other(tree, &mut writer);
    }
    container
}

fn json_from_binary(container: &BinaryContainer) -> serde_json::Value {
    let mut tree = serde_json::Value::Null;
    {
        let mut writer = JsonWriter::new(&mut tree);
        binary_to_other(container, &mut writer);
    }
    tree
}

#[test]
fn json_to_binary_and_back_is_structurally_equal() {
    let tree = json!({
        "n": 12,
        "arr": [1, 2, 3],
        "obj": { "k": true }
    });

    let container = binary_from_json(&tree);
    let round_tripped = json_from_binary(&container);
    assert_eq!(round_tripped, tree);
}

#[test]
fn transcoded_binary_is_readable_through_the_contract() {
    let tree = json!({
        "n": 12,
        "arr": [1, 2, 3],
        "obj": { "k": true }
    });

    let container = binary_from_json(&tree);
    let mut reader = BinaryReader::new(&container);

    let mut n = 0i32;
    reader.serialize_i32("n".into(), &mut n);
    assert_eq!(n, 12);

    let mut arr: Vec<i32> = Vec::new();
    serialize_vec(&mut reader, "arr".into(), &mut arr);
    assert_eq!(arr, vec![1i32, 2, 3]);

    let mut k = false;
    reader.object("obj", |s| s.serialize_bool("k".into(), &mut k));
    assert!(k);
}

#[test]
fn binary_to_json_and_back_yields_identical_bytes() {
    // Only types the JSON model can carry faithfully: Int, Float, Bool,
    // String, their arrays, objects, and object arrays with null
    // entries.
    let mut original = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut original);
        writer.serialize_i32("count".into(), &mut -7);
        writer.serialize_f32("ratio".into(), &mut -30.5);
        writer.serialize_bool("armed".into(), &mut true);
        writer.serialize_str("tag".into(), Some("bravo"));
        serialize_vec(&mut writer, "ints".into(), &mut vec![9i32, -8, 7]);
        serialize_vec(&mut writer, "reals".into(), &mut vec![1.5f32, 2.5, -0.25]);
        serialize_vec(&mut writer, "flags".into(), &mut vec![true, false]);
        writer.object("nested", |s| {
            s.serialize_i32("depth".into(), &mut 2);
            s.serialize_str("label".into(), Some("inner"));
        });
        writer.object_array_write("entries", 3, |s, idx| {
            if idx != 1 {
                s.serialize_i32("idx".into(), &mut (idx as i32));
            }
        });
    }

    let tree = json_from_binary(&original);
    let rebuilt = binary_from_json(&tree);

    assert_eq!(rebuilt.to_bytes(), original.to_bytes());
}

#[test]
fn json_array_type_inference_widens_mixed_numbers_to_real() {
    let tree = json!({ "mixed": [1, 2.5, 3] });
    let container = binary_from_json(&tree);

    let mut reader = BinaryReader::new(&container);
    let mut floats: Vec<f32> = Vec::new();
    serialize_vec(&mut reader, "mixed".into(), &mut floats);
    assert_eq!(floats, vec![1.0f32, 2.5, 3.0]);

    let round_tripped = json_from_binary(&container);
    assert_eq!(round_tripped, json!({ "mixed": [1.0, 2.5, 3.0] }));
}

#[test]
fn json_string_and_bool_arrays_transcode() {
    let tree = json!({
        "names": ["ada", "grace", "edsger"],
        "bits": [true, true, false]
    });
    let container = binary_from_json(&tree);

    let mut reader = BinaryReader::new(&container);

    let mut names = Vec::new();
    packform::ext::serialize_string_vec(&mut reader, "names".into(), &mut names);
    assert_eq!(names, vec!["ada", "grace", "edsger"]);

    let mut bits: Vec<bool> = Vec::new();
    serialize_vec(&mut reader, "bits".into(), &mut bits);
    assert_eq!(bits, vec![true, true, false]);
}

#[test]
fn json_null_members_are_dropped() {
    let tree = json!({ "present": 1, "absent": null });
    let container = binary_from_json(&tree);

    let reader = BinaryReader::new(&container);
    assert!(reader.has_member("present".into()));
    assert!(!reader.has_member("absent".into()));
}

#[test]
fn object_array_null_entries_survive_both_directions() {
    let tree = json!({ "list": [{ "v": 4 }, null, null, { "v": 9 }] });
    let container = binary_from_json(&tree);

    let mut reader = BinaryReader::new(&container);
    assert_eq!(reader.read_object_array_size("list".into()), 4);

    let mut seen = Vec::new();
    reader.object_array_read("list", |s, idx| {
        let mut v = 0i32;
        s.serialize_i32("v".into(), &mut v);
        seen.push((idx, v));
    });
    assert_eq!(seen, vec![(0, 4), (3, 9)]);

    let round_tripped = json_from_binary(&container);
    assert_eq!(round_tripped, tree);
}

#[test]
fn null_led_json_arrays_are_dropped_on_transcode() {
    // The first element fixes the array's type, and null is not an
    // encodable one, so the whole member vanishes.
    let tree = json!({ "list": [null, { "v": 4 }, { "v": 9 }], "kept": 1 });
    let container = binary_from_json(&tree);

    let reader = BinaryReader::new(&container);
    assert!(!reader.has_member("list".into()));
    assert!(reader.has_member("kept".into()));
}

#[test]
fn empty_json_arrays_are_dropped() {
    let tree = json!({ "empty": [], "kept": 1 });
    let container = binary_from_json(&tree);

    let reader = BinaryReader::new(&container);
    assert!(!reader.has_member("empty".into()));
    assert!(reader.has_member("kept".into()));
}

#[test]
fn deep_tree_survives_a_full_round_trip() {
    let tree = json!({
        "meta": { "version": 3, "name": "savegame" },
        "world": {
            "seed": 123456,
            "regions": [
                { "id": 1, "biome": "forest", "heights": [10, 12, 9] },
                { "id": 2, "biome": "desert", "heights": [3, 4] }
            ]
        },
        "flags": [true, false, true, true]
    });

    let container = binary_from_json(&tree);
    let round_tripped = json_from_binary(&container);
    assert_eq!(round_tripped, tree);

    // And the rebuilt binary matches byte for byte.
    let rebuilt = binary_from_json(&round_tripped);
    assert_eq!(rebuilt.to_bytes(), container.to_bytes());
}

#[test]
fn binary_view_transcodes_like_the_container() {
    let mut original = BinaryContainer::new();
    {
        let mut writer = BinaryWriter::new(&mut original);
        writer.serialize_i32("x".into(), &mut 5);
        writer.serialize_str("s".into(), Some("view"));
    }
    let bytes = original.to_bytes();
    let view = packform::BinaryView::parse(&bytes).unwrap();

    let mut from_container = serde_json::Value::Null;
    {
        let mut writer = JsonWriter::new(&mut from_container);
        binary_to_other(&original, &mut writer);
    }

    let mut from_view = serde_json::Value::Null;
    {
        let mut writer = JsonWriter::new(&mut from_view);
        packform::binary_view_to_other(&view, &mut writer);
    }

    assert_eq!(from_container, from_view);
}

#[test]
fn json_reader_and_transcoded_binary_agree() {
    // Driving the same description against the JSON tree directly and
    // against its binary transcoding must load identical values.
    let tree = json!({
        "hp": 70,
        "mana": 15.5,
        "name": "caster",
        "levels": [1, 2, 4, 8]
    });
    let container = binary_from_json(&tree);

    fn load(s: &mut dyn Serializer<'_>) -> (i32, f32, String, Vec<i32>) {
        let mut hp = 0i32;
        let mut mana = 0f32;
        let mut name = String::new();
        let mut levels = Vec::new();
        s.serialize_i32("hp".into(), &mut hp);
        s.serialize_f32("mana".into(), &mut mana);
        packform::ext::serialize_string(s, "name".into(), &mut name);
        serialize_vec(s, "levels".into(), &mut levels);
        (hp, mana, name, levels)
    }

    let mut json_reader = JsonReader::new(&tree);
    let from_json = load(&mut json_reader);

    let mut binary_reader = BinaryReader::new(&container);
    let from_binary = load(&mut binary_reader);

    assert_eq!(from_json, from_binary);
}
