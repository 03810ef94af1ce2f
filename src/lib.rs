//! # packform - Dual-Format Save-State Serialization
//!
//! One user-written description of a value's shape drives both directions
//! (save and load) against multiple encodings. Domain code is authored
//! once against the [`Serializer`] contract; the concrete encoder decides
//! whether that description writes fields out or reads them back:
//!
//! - **JSON** ([`JsonWriter`]/[`JsonReader`]) - human-readable trees for
//!   development, backed by `serde_json::Value`.
//! - **Binary** ([`BinaryWriter`]/[`BinaryReader`]) - a packed,
//!   string-interned format for shipping: compact headers, zero-copy
//!   reads, last-write-wins override with null-compaction.
//!
//! ## Quick Start
//!
//! ```ignore
//! use packform::{BinaryContainer, BinaryReader, BinaryWriter, Serializer};
//!
//! struct PlayerStats { level: i32, health: f32 }
//!
//! fn serialize_stats(s: &mut dyn Serializer<'_>, stats: &mut PlayerStats) {
//!     s.serialize_i32("level".into(), &mut stats.level);
//!     s.serialize_f32("health".into(), &mut stats.health);
//! }
//!
//! // Save
//! let mut container = BinaryContainer::new();
//! {
//!     let mut writer = BinaryWriter::new(&mut container);
//!     serialize_stats(&mut writer, &mut stats);
//! }
//! let bytes = container.to_bytes();
//!
//! // Load
//! let container = BinaryContainer::from_bytes(&bytes)?;
//! let mut reader = BinaryReader::new(&container);
//! serialize_stats(&mut reader, &mut stats);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------+
//! |        user serialize descriptions         |
//! +--------------------------------------------+
//! |     Serializer contract + array adapters   |
//! +----------------------+---------------------+
//! |     JSON binding     |    binary codec     |
//! |  (serde_json::Value) | (container + view)  |
//! +----------------------+---------------------+
//! |              transcoder (convert)          |
//! +--------------------------------------------+
//! ```
//!
//! ## Module Overview
//!
//! - [`name`]: borrowed field-name keys
//! - [`serializer`]: the two-direction contract and array adapters
//! - [`json`]: binding onto an in-memory JSON tree
//! - [`binary`]: packed binary containers, writer, zero-copy reader
//! - [`convert`]: walk one persisted format, emit into another
//! - [`ext`]: std-type conveniences (narrow ints, `String`, `Vec`)
//!
//! ## Concurrency
//!
//! Writers borrow their container exclusively and are single-threaded.
//! Readers are stateless borrows; any number of them can read the same
//! finalized container from different threads.

pub mod binary;
pub mod convert;
pub mod ext;
pub mod json;
pub mod name;
pub mod serializer;

pub use binary::{
    BinaryContainer, BinaryReader, BinaryView, BinaryWriter, StringTable, MAX_ARRAY_ELEMENTS,
    MAX_NAME_INDEX, MAX_STRINGS,
};
pub use convert::{binary_to_other, binary_view_to_other, json_member_to_other, json_to_other};
pub use json::{JsonReader, JsonWriter};
pub use name::Name;
pub use serializer::{
    ArrayAdapter, RawArray, Serializer, SerializerExt, SliceArray, StrArrayAdapter, StrVecArray,
    VecArray,
};
