//! Writing half of the JSON binding.

use serde_json::{Map, Number, Value};

use crate::name::Name;
use crate::serializer::{ArrayAdapter, Serializer, StrArrayAdapter};

pub struct JsonWriter<'a> {
    value: &'a mut Value,
}

impl<'a> JsonWriter<'a> {
    pub fn new(value: &'a mut Value) -> Self {
        Self { value }
    }

    /// Slot for `name`, coercing the backing value into an object first.
    fn member_mut(&mut self, name: Name<'_>) -> &mut Value {
        if !self.value.is_object() {
            *self.value = Value::Object(Map::new());
        }
        let map = self.value.as_object_mut().expect("coerced to object above");
        map.entry(name.as_str()).or_insert(Value::Null)
    }

    fn write_array<T>(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<T>)
    where
        T: Copy,
        Value: From<T>,
    {
        let len = array.len();
        let mut items = Vec::with_capacity(len as usize);
        for i in 0..len {
            items.push(Value::from(array.get(i)));
        }
        *self.member_mut(name) = Value::Array(items);
    }
}

impl<'de> Serializer<'de> for JsonWriter<'_> {
    fn is_reader(&self) -> bool {
        false
    }

    fn has_member(&self, name: Name<'_>) -> bool {
        self.value.get(name.as_str()).is_some_and(|v| !v.is_null())
    }

    fn serialize_i32(&mut self, name: Name<'_>, var: &mut i32) {
        *self.member_mut(name) = Value::from(*var);
    }

    fn serialize_u32(&mut self, name: Name<'_>, var: &mut u32) {
        *self.member_mut(name) = Value::from(*var);
    }

    fn serialize_f32(&mut self, name: Name<'_>, var: &mut f32) {
        // JSON has no NaN/inf number; such values cannot appear as a
        // member at all.
        if let Some(n) = Number::from_f64(*var as f64) {
            *self.member_mut(name) = Value::Number(n);
        }
    }

    fn serialize_bool(&mut self, name: Name<'_>, var: &mut bool) {
        *self.member_mut(name) = Value::Bool(*var);
    }

    fn serialize_str(&mut self, name: Name<'_>, value: Option<&str>) -> Option<&'de str> {
        debug_assert!(value.is_some(), "writer expects a string value");
        *self.member_mut(name) = Value::String(value.unwrap_or("").to_owned());
        None
    }

    fn serialize_object(&mut self, name: Name<'_>, f: &mut dyn FnMut(&mut dyn Serializer<'de>)) {
        let mut sub_value = Value::Null;
        {
            let mut sub = JsonWriter::new(&mut sub_value);
            f(&mut sub);
        }
        if !sub_value.is_null() {
            *self.member_mut(name) = sub_value;
        }
    }

    fn iterate_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Serializer<'de>, Name<'_>) -> bool,
    ) {
        let Some(map) = self.value.as_object() else {
            return;
        };
        // Snapshot the keys so the callback may write while we walk.
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in &keys {
            if !visit(self, Name::new(key)) {
                break;
            }
        }
    }

    fn serialize_i32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<i32>) {
        self.write_array(name, array);
    }

    fn serialize_u32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<u32>) {
        self.write_array(name, array);
    }

    fn serialize_f32_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<f32>) {
        self.write_array(name, array);
    }

    fn serialize_bool_array(&mut self, name: Name<'_>, array: &mut dyn ArrayAdapter<bool>) {
        self.write_array(name, array);
    }

    fn serialize_str_array(&mut self, name: Name<'_>, array: &mut dyn StrArrayAdapter) {
        let len = array.len();
        let mut items = Vec::with_capacity(len as usize);
        for i in 0..len {
            items.push(Value::String(array.get(i).to_owned()));
        }
        *self.member_mut(name) = Value::Array(items);
    }

    fn write_object_array(
        &mut self,
        name: Name<'_>,
        len: u32,
        entry: &mut dyn FnMut(&mut dyn Serializer<'de>, u32),
    ) {
        let mut items = vec![Value::Null; len as usize];
        for (i, item) in items.iter_mut().enumerate() {
            let mut sub = JsonWriter::new(item);
            entry(&mut sub, i as u32);
        }
        *self.member_mut(name) = Value::Array(items);
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
