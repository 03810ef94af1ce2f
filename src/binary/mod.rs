//! # Packed Binary Encoding
//!
//! The shipping-format counterpart of the JSON binding: compact,
//! load-fast, zero-copy on read. A container couples a string table with
//! a flat element buffer; names and string values are table indices, so
//! repeated keys cost two bytes of header instead of repeated text.
//!
//! ## Stream layout (EH = element header, AH = array header)
//!
//! ```text
//! scalar element   EH | value bytes
//! string element   EH | u32 string-table index
//! object element   EH | nested elements, EH.size bytes total
//! array element    EH | AH | payload
//! ```
//!
//! Array payloads by inner type:
//!
//! | Inner type | Payload |
//! |------------|---------|
//! | Int/UInt/Float | `count * 4` bytes, native-endian |
//! | Bool | `count` bytes, 0/1 |
//! | String | `count * 4` bytes of table indices |
//! | Object | `count` entries of `{u32 size, bytes}`, size 0 = null entry |
//! | Null | opaque chunk of `count` bytes (memory-chunk escape) |
//!
//! Writers append in call order, retag overridden slots as Null and
//! compact them away on scope exit; readers walk finalized streams and
//! may therefore assume no Null element headers remain.

pub mod container;
pub mod headers;
pub(crate) mod numeric;
pub mod reader;
pub mod writer;

pub use container::{BinaryContainer, BinaryView, StringTable, MAX_STRINGS};
pub use headers::{ElementType, MAX_ARRAY_ELEMENTS, MAX_NAME_INDEX};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
