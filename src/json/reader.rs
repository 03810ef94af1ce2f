//! Reading half of the JSON binding.
//!
//! Conversions mirror the binary reader's widening table: numbers cast
//! into whichever primitive slot was requested, any numeric reads as
//! `true` when non-zero, bool reads as 0/1. Strings are returned as
//! borrows into the tree, valid while it lives.

use serde_json::Value;

use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, StrArrayAdapter};

pub struct JsonReader<'de> {
    value: &'de Value,
}

impl<'de> JsonReader<'de> {
    pub fn new(value: &'de Value) -> Self {
        Self { value }
    }

    /// Member lookup; a JSON `null` member counts as absent.
    fn member(&self, name: Name<'_>) -> Option<&'de Value> {
        self.value.get(name.as_str()).filter(|v| !v.is_null())
    }

    fn read_array<T: Copy>(
        &self,
        name: Name<'_>,
        array: &mut dyn ArrayAdapter<T>,
        conv: fn(&Value) -> Option<T>,
    ) {
        let Some(value) = self.member(name) else {
            return;
        };
        match value {
            Value::Array(items) => {
                array.set_len(items.len() as u32);
                for (i, item) in items.iter().enumerate() {
                    if let Some(v) = conv(item) {
                        array.set(i as u32, v);
                    }
                }
            }
            scalar => {
                if let Some(v) = conv(scalar) {
                    array.set_len(1);
                    array.set(0, v);
                }
            }
        }
    }
}

fn as_i32(v: &Value) -> Option<i32> {
    match v {
        Value::Bool(b) => Some(*b as i32),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i as i32)
            } else if let Some(u) = n.as_u64() {
                Some(u as i32)
            } else {
                n.as_f64().map(|f| f as i32)
            }
        }
        _ => None,
    }
}

fn as_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Bool(b) => Some(*b as u32),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u as u32)
            } else if let Some(i) = n.as_i64() {
                Some(i as u32)
            } else {
                n.as_f64().map(|f| f as u32)
            }
        }
        _ => None,
    }
}

fn as_f32(v: &Value) -> Option<f32> {
    match v {
        Value::Bool(b) => Some(*b as u32 as f32),
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        _ => None,
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

impl<'de> Serializer<'de> for JsonReader<'de> {
    fn is_reader(&self) -> bool {
        true
    }

    fn has_member(&self, name: Name<'_>) -> bool {
        self.member(name).is_some()
    }

    fn serialize_i32(&mut self, name: Name<'_>, var: &mut i32) {
        if let Some(v) = self.member(name).and_then(as_i32) {
            *var = v;
        }
    }

    fn serialize_u32(&mut self, name: Name<'_>, var: &mut u32) {
        if let Some(v) = self.member(name).and_then(as_u32) {
            *var = v;
        }
    }

    fn serialize_f32(&mut self, name: Name<'_>, var: &mut f32) {
        if let Some(v) = self.member(name).and_then(as_f32) {
            *var = v;
        }
    }

    fn serialize_bool(&mut self, name: Name<'_>, var: &mut bool) {
        if let Some(v) = self.member(name).and_then(as_bool) {
            *var = v;
        }
    }

    fn serialize_str(&mut self, name: Name<'_>, _value: Option<&str>) -> Option<&'de str> {
        self.member(name)?.as_str()
    }

    fn serialize_object(&mut self, name: Name<'_>, f: &mut dyn FnMut(&mut dyn Serializer<'de>)) {
        let Some(value) = self.member(name) else {
            return;
        };
        if value.is_object() {
            let mut sub = JsonReader::new(value);
            f(&mut sub);
        }
    }

    fn iterate_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool,
    ) {
        let value = self.value;
        let Some(map) = value.as_object() else {
            return;
        };
        for key in map.keys() {
            if !visit(self, Name::new(key)) {
                break;
            }
        }
    }

    fn serialize_i32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<i32>) {
        self.read_array(name, array, as_i32);
    }

    fn serialize_u32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<u32>) {
        self.read_array(name, array, as_u32);
    }

    fn serialize_f32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<f32>) {
        self.read_array(name, array, as_f32);
    }

    fn serialize_bool_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<bool>) {
        self.read_array(name, array, as_bool);
    }

    fn serialize_str_array(&mut self, name: Name<'_>, array: &mut dyn StrArrayAdapter) {
        let Some(value) = self.member(name) else {
            return;
        };
        match value {
            Value::Array(items) => {
                array.set_len(items.len() as u32);
                for (i, item) in items.iter().enumerate() {
                    if let Some(s) = item.as_str() {
                        array.set(i as u32, s);
                    }
                }
            }
            scalar => {
                if let Some(s) = scalar.as_str() {
                    array.set_len(1);
                    array.set(0, s);
                }
            }
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
        self.member(name)
            .and_then(Value::as_array)
            .map_or(0, |items| items.len() as u32)
    }

    fn read_object_array(
        &mut self,
        name: Name<'_>,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        let Some(items) = self.member(name).and_then(Value::as_array) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            if !item.is_null() {
                let mut sub = JsonReader::new(item);
                entry(&mut sub, i as u32);
            }
        }
    }
}
