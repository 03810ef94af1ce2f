//! # Primitive Array Adapters
//!
//! The contract serializes sequences through an adapter rather than a
//! concrete collection, so the same description works for a `Vec`, a
//! fixed-capacity buffer, or a borrowed view over decoded payload bytes.
//!
//! Writers use the get side (`len`/`get`), readers use the set side
//! (`set_len`/`set`). The optional bulk interface lets encoders move
//! plain-old-data payloads as one slice copy instead of element by
//! element; when `supports_bulk` returns true, the element-wise and bulk
//! forms must agree.

/// Uniform view over a sequence of one primitive type.
pub trait ArrayAdapter<T> {
    fn len(&self) -> u32;
    fn get(&self, i: u32) -> T;
    fn set_len(&mut self, n: u32);
    fn set(&mut self, i: u32, v: T);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `as_slice`/`set_all` are implemented.
    fn supports_bulk(&self) -> bool {
        false
    }

    fn as_slice(&self) -> &[T] {
        debug_assert!(!self.supports_bulk(), "bulk adapter must implement as_slice");
        &[]
    }

    fn set_all(&mut self, data: &[T]) {
        debug_assert!(!self.supports_bulk(), "bulk adapter must implement set_all");
        let _ = data;
    }
}

/// String counterpart of [`ArrayAdapter`]. Elements are borrowed on get
/// and copied by the adapter on set, so decoded strings never outlive the
/// call.
pub trait StrArrayAdapter {
    fn len(&self) -> u32;
    fn get(&self, i: u32) -> &str;
    fn set_len(&mut self, n: u32);
    fn set(&mut self, i: u32, v: &str);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only adapter over a borrowed slice. Write-only call sites and the
/// transcoder use this to expose payloads without copying them.
pub struct SliceArray<'a, T> {
    data: &'a [T],
}

impl<'a, T> SliceArray<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }
}

impl<T: Copy> ArrayAdapter<T> for SliceArray<'_, T> {
    fn len(&self) -> u32 {
        self.data.len() as u32
    }

    fn get(&self, i: u32) -> T {
        self.data[i as usize]
    }

    fn set_len(&mut self, _n: u32) {
        debug_assert!(false, "SliceArray is read-only");
    }

    fn set(&mut self, _i: u32, _v: T) {
        debug_assert!(false, "SliceArray is read-only");
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn as_slice(&self) -> &[T] {
        self.data
    }
}

/// Adapter over an owned, growable sequence. Bulk-capable for any `Copy`
/// element type.
pub struct VecArray<'a, T> {
    vec: &'a mut Vec<T>,
}

impl<'a, T> VecArray<'a, T> {
    pub fn new(vec: &'a mut Vec<T>) -> Self {
        Self { vec }
    }
}

impl<T: Copy + Default> ArrayAdapter<T> for VecArray<'_, T> {
    fn len(&self) -> u32 {
        self.vec.len() as u32
    }

    fn get(&self, i: u32) -> T {
        self.vec[i as usize]
    }

    fn set_len(&mut self, n: u32) {
        self.vec.resize(n as usize, T::default());
    }

    fn set(&mut self, i: u32, v: T) {
        self.vec[i as usize] = v;
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn as_slice(&self) -> &[T] {
        self.vec
    }

    fn set_all(&mut self, data: &[T]) {
        self.vec.clear();
        self.vec.extend_from_slice(data);
    }
}

/// Fixed-capacity adapter over a caller-owned buffer, with an optional
/// out-slot recording how many elements a read produced. Loads larger
/// than the capacity are a contract violation.
pub struct RawArray<'a, T> {
    data: &'a mut [T],
    used: u32,
    loaded: Option<&'a mut u32>,
}

impl<'a, T> RawArray<'a, T> {
    pub fn new(data: &'a mut [T], loaded: Option<&'a mut u32>) -> Self {
        let used = data.len() as u32;
        Self { data, used, loaded }
    }
}

impl<T: Copy> ArrayAdapter<T> for RawArray<'_, T> {
    fn len(&self) -> u32 {
        self.used
    }

    fn get(&self, i: u32) -> T {
        self.data[i as usize]
    }

    fn set_len(&mut self, n: u32) {
        debug_assert!(
            n as usize <= self.data.len(),
            "loaded array of {} elements into a buffer of capacity {}",
            n,
            self.data.len()
        );
        self.used = n.min(self.data.len() as u32);
        if let Some(loaded) = self.loaded.as_deref_mut() {
            *loaded = self.used;
        }
    }

    fn set(&mut self, i: u32, v: T) {
        if let Some(slot) = self.data.get_mut(i as usize) {
            *slot = v;
        }
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn as_slice(&self) -> &[T] {
        &self.data[..self.used as usize]
    }

    fn set_all(&mut self, data: &[T]) {
        self.set_len(data.len() as u32);
        let n = self.used as usize;
        self.data[..n].copy_from_slice(&data[..n]);
    }
}

/// String-array adapter over `Vec<String>`. Set reuses element capacity.
pub struct StrVecArray<'a> {
    vec: &'a mut Vec<String>,
}

impl<'a> StrVecArray<'a> {
    pub fn new(vec: &'a mut Vec<String>) -> Self {
        Self { vec }
    }
}

impl StrArrayAdapter for StrVecArray<'_> {
    fn len(&self) -> u32 {
        self.vec.len() as u32
    }

    fn get(&self, i: u32) -> &str {
        &self.vec[i as usize]
    }

    fn set_len(&mut self, n: u32) {
        self.vec.resize_with(n as usize, String::new);
    }

    fn set(&mut self, i: u32, v: &str) {
        let slot = &mut self.vec[i as usize];
        slot.clear();
        slot.push_str(v);
    }
}
