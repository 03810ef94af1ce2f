//! # Binary Containers
//!
//! A [`BinaryContainer`] owns everything a binary stream needs: the
//! string table (names and string values are stored as indices into it)
//! and the element buffer. [`BinaryView`] is its non-owning counterpart
//! for reading out of caller-owned memory without copying the table.
//!
//! ## Persisted layout (native-endian, native word width)
//!
//! ```text
//! string_count : usize
//! repeat string_count times:
//!     len   : usize
//!     bytes : [u8; len]        UTF-8
//! body_size    : usize
//! body         : [u8; body_size]   concatenated top-level elements
//! ```
//!
//! The format is deliberately not portable across word sizes or byte
//! orders; it is a load-fast local cache format, not an interchange one.

use std::path::Path;

use eyre::{ensure, Result};
use hashbrown::HashMap;

use crate::binary::headers::MAX_NAME_INDEX;

/// Hard cap on distinct strings per container; indices must fit the
/// 13-bit name field.
pub const MAX_STRINGS: usize = MAX_NAME_INDEX as usize + 1;

const WORD: usize = std::mem::size_of::<usize>();

/// Interned strings plus a hash index over them. The on-disk layout only
/// ever sees the vector; the index exists so writers resolve names in
/// O(1) instead of scanning the table.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u16>,
}

impl StringTable {
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn get(&self, idx: u16) -> Option<&str> {
        self.strings.get(idx as usize).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Index of `s`, adding it on first use.
    pub(crate) fn intern(&mut self, s: &str) -> u16 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len();
        debug_assert!(
            idx < MAX_STRINGS,
            "container exceeds {} distinct strings",
            MAX_STRINGS
        );
        self.strings.push(s.to_owned());
        self.index.insert(s.to_owned(), idx as u16);
        idx as u16
    }

    fn from_strings(strings: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(strings.len());
        for (i, s) in strings.iter().enumerate() {
            index.entry_ref(s.as_str()).or_insert(i as u16);
        }
        Self { strings, index }
    }
}

/// Owning record behind binary writers and readers: the string table and
/// the element buffer. The buffer's whole length is the used prefix;
/// writers append to it and truncate it during compaction.
#[derive(Debug, Default, Clone)]
pub struct BinaryContainer {
    pub(crate) strings: StringTable,
    pub(crate) data: Vec<u8>,
}

impl BinaryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    /// Finalized element bytes. Contains no Null headers once every
    /// writer borrowing this container has been dropped.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serialize table and body into one byte vector (see the module
    /// docs for the layout).
    pub fn to_bytes(&self) -> Vec<u8> {
        let strings_size: usize = self.strings.iter().map(|s| WORD + s.len()).sum();
        let mut out = Vec::with_capacity(WORD * 2 + strings_size + self.data.len());

        out.extend_from_slice(&self.strings.len().to_ne_bytes());
        for s in self.strings.iter() {
            out.extend_from_slice(&s.len().to_ne_bytes());
            out.extend_from_slice(s.as_bytes());
        }

        out.extend_from_slice(&self.data.len().to_ne_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Owning load. Use [`BinaryView::parse`] to read without copying.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let view = BinaryView::parse(bytes)?;
        Ok(Self {
            strings: StringTable::from_strings(
                view.strings.iter().map(|s| (*s).to_owned()).collect(),
            ),
            data: view.data.to_vec(),
        })
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes())?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }
}

/// Non-owning counterpart of [`BinaryContainer`]: table entries are
/// borrowed slices of the input bytes, so parsing allocates only the
/// index vector.
#[derive(Debug, Clone)]
pub struct BinaryView<'a> {
    strings: Vec<&'a str>,
    data: &'a [u8],
}

impl<'a> BinaryView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut cursor = 0usize;

        let string_count = read_word(bytes, &mut cursor)?;
        ensure!(
            string_count <= MAX_STRINGS,
            "string table claims {} entries (limit {})",
            string_count,
            MAX_STRINGS
        );

        let mut strings = Vec::with_capacity(string_count);
        for i in 0..string_count {
            let len = read_word(bytes, &mut cursor)?;
            let end = cursor
                .checked_add(len)
                .filter(|&e| e <= bytes.len())
                .ok_or_else(|| eyre::eyre!("string {} of {} is truncated", i, string_count))?;
            let s = std::str::from_utf8(&bytes[cursor..end])
                .map_err(|e| eyre::eyre!("string {} is not valid UTF-8: {}", i, e))?;
            strings.push(s);
            cursor = end;
        }

        let body_size = read_word(bytes, &mut cursor)?;
        let body_end = cursor
            .checked_add(body_size)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(|| {
                eyre::eyre!(
                    "body claims {} bytes but only {} remain",
                    body_size,
                    bytes.len() - cursor
                )
            })?;

        Ok(Self {
            strings,
            data: &bytes[cursor..body_end],
        })
    }

    pub fn string(&self, idx: u16) -> Option<&'a str> {
        self.strings.get(idx as usize).copied()
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

fn read_word(bytes: &[u8], cursor: &mut usize) -> Result<usize> {
    let end = cursor
        .checked_add(WORD)
        .filter(|&e| e <= bytes.len())
        .ok_or_else(|| eyre::eyre!("input truncated at length prefix"))?;
    let chunk: [u8; WORD] = bytes[*cursor..end]
        .try_into()
        .expect("length prefix is word sized");
    *cursor = end;
    Ok(usize::from_ne_bytes(chunk))
}

/// Where a reader resolves its string indices from: a container's owned
/// table or a view's borrowed one. Copyable so readers stay stateless.
#[derive(Clone, Copy)]
pub(crate) enum TableRef<'a> {
    Owned(&'a StringTable),
    Borrowed(&'a BinaryView<'a>),
}

impl<'a> TableRef<'a> {
    pub(crate) fn get(self, idx: u16) -> Option<&'a str> {
        match self {
            TableRef::Owned(table) => table.get(idx),
            TableRef::Borrowed(view) => view.string(idx),
        }
    }
}
