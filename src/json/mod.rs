//! # JSON Binding
//!
//! Maps the serializer contract onto an in-memory `serde_json::Value`
//! tree. Parsing and printing that tree is `serde_json`'s job; this
//! module only decides how contract operations touch it:
//!
//! - writers replace or create the member at `name`, coercing a
//!   non-object root into an object on first write;
//! - readers look `name` up and leave the slot untouched when it is
//!   missing, `null`, or not convertible;
//! - an object whose callback wrote nothing is elided, same as the
//!   binary encoding;
//! - object arrays materialize as JSON arrays with `null` for empty
//!   entries.
//!
//! The crate is built with `preserve_order`, so member iteration order is
//! insertion order and matches the binary stream's call order.

pub mod reader;
pub mod writer;

pub use reader::JsonReader;
pub use writer::JsonWriter;
