//! Static string table builder.
//!
//! The host reads names out of one contiguous byte buffer. Each entry keeps
//! its own terminator inside that buffer, so string `i` starts at
//! `sum(len(0..i))` where every length counts the terminator.
//!
//! - [`StaticString`]: an immutable, terminator-aware string literal.
//! - [`StringTable`]: an ordered, append-only table with optional interning.
//! - [`packed_len`] and [`pack`]: the same layout computed in `const` context.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use mo_utils::hash::HashMap;

use crate::seq;

// -----------------------------------------------------------------------------
// StaticString

/// An immutable string literal that is stored with a trailing NUL.
///
/// [`len`](Self::len) includes the terminator, so an empty string has length 1.
///
/// # Examples
///
/// ```
/// use mo_meta::strings::StaticString;
///
/// const NAME: StaticString = StaticString::new("value");
///
/// assert_eq!(NAME.len(), 6);
/// assert_eq!(NAME.byte(5), 0);
/// assert_eq!(NAME.as_str(), "value");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticString(&'static str);

impl StaticString {
    /// The empty string; occupies one byte in the buffer.
    pub const EMPTY: Self = Self("");

    /// Wraps a literal.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in `const` items) if `s` contains a NUL byte,
    /// which would split the entry in the shared buffer.
    pub const fn new(s: &'static str) -> Self {
        let bytes = s.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            assert!(bytes[i] != 0, "static strings must not contain NUL bytes");
            i += 1;
        }
        Self(s)
    }

    /// Returns the text without its terminator.
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the stored length, terminator included.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.0.len() + 1
    }

    /// Returns the byte at `index`; the last index holds the terminator.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub const fn byte(&self, index: usize) -> u8 {
        let bytes = self.0.as_bytes();
        if index < bytes.len() {
            bytes[index]
        } else if index == bytes.len() {
            0
        } else {
            panic!("static string index out of range")
        }
    }

    /// Iterates the stored bytes, terminator included.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + 'static {
        self.0.bytes().chain(core::iter::once(0))
    }

    /// Concatenates two strings into a two-entry table.
    ///
    /// Both terminators are preserved, so each half stays addressable.
    pub fn concat(self, other: StaticString) -> StringTable {
        StringTable::new().with(self).with(other)
    }
}

impl From<&'static str> for StaticString {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for StaticString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl fmt::Display for StaticString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// -----------------------------------------------------------------------------
// StringTable

/// An ordered sequence of [`StaticString`]s laid out in one buffer.
///
/// Positions never change once assigned. [`push`](Self::push) always
/// appends; [`intern`](Self::intern) reuses the first equal entry.
///
/// # Examples
///
/// ```
/// use mo_meta::strings::StringTable;
///
/// let mut table = StringTable::new();
/// assert_eq!(table.push("Counter".into()), 0);
/// assert_eq!(table.push("".into()), 1);
/// assert_eq!(table.intern("value".into()), 2);
/// assert_eq!(table.intern("value".into()), 2);
///
/// assert_eq!(table.offsets(), [0, 8, 9]);
///
/// let buffer = table.concatenate_all();
/// assert_eq!(&buffer[..], b"Counter\0\0value\0");
/// assert_eq!(StringTable::slice(&buffer, 9, 6), b"value\0");
/// ```
#[derive(Clone, Default)]
pub struct StringTable {
    entries: Vec<StaticString>,
    lengths: Vec<u32>,
    interned: HashMap<&'static str, u32>,
}

impl StringTable {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new table with `s` appended after the current entries.
    #[inline]
    pub fn with(mut self, s: StaticString) -> Self {
        self.push(s);
        self
    }

    /// Appends `s` and returns its index.
    pub fn push(&mut self, s: StaticString) -> u32 {
        let index = self.entries.len() as u32;
        self.lengths.push(s.len() as u32);
        self.entries.push(s);
        self.interned.entry(s.as_str()).or_insert(index);
        index
    }

    /// Returns the index of the first entry equal to `s`, appending it if absent.
    pub fn intern(&mut self, s: StaticString) -> u32 {
        match self.interned.get(s.as_str()) {
            Some(&index) => index,
            None => self.push(s),
        }
    }

    /// Returns the index of the first entry equal to `s`.
    pub fn index_of(&self, s: &str) -> Option<u32> {
        self.interned.get(s).copied()
    }

    /// Returns the entry at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<StaticString> {
        self.entries.get(index).copied()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the total buffer size, terminators included.
    #[inline]
    pub fn byte_len(&self) -> usize {
        seq::sum(&self.lengths) as usize
    }

    /// Returns the stored length of every entry, terminators included.
    #[inline]
    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    /// Returns the byte offset of every entry, in table order.
    pub fn offsets(&self) -> Vec<u32> {
        compute_offsets(&self.lengths)
    }

    /// Iterates the entries in table order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = StaticString> + '_ {
        self.entries.iter().copied()
    }

    /// Materializes the table as one buffer.
    ///
    /// Every entry keeps its terminator at its original boundary.
    pub fn concatenate_all(&self) -> Box<[u8]> {
        let mut buffer = Vec::with_capacity(self.byte_len());
        for entry in &self.entries {
            buffer.extend(entry.bytes());
        }
        buffer.into_boxed_slice()
    }

    /// Cuts one entry back out of a materialized buffer.
    ///
    /// `len` includes the terminator.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside `buffer`.
    #[inline]
    pub fn slice(buffer: &[u8], offset: u32, len: usize) -> &[u8] {
        let start = offset as usize;
        &buffer[start..start + len]
    }
}

impl PartialEq for StringTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for StringTable {}

impl fmt::Debug for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

/// Returns the starting offset of each string given its stored length.
///
/// `offset[0] = 0`, `offset[i] = offset[i - 1] + lengths[i - 1]`.
///
/// # Examples
///
/// ```
/// use mo_meta::strings::compute_offsets;
///
/// assert_eq!(compute_offsets(&[8, 1, 6]), vec![0, 8, 9]);
/// assert!(compute_offsets(&[]).is_empty());
/// ```
pub fn compute_offsets(lengths: &[u32]) -> Vec<u32> {
    seq::exclusive_prefix_sums(lengths)
}

// -----------------------------------------------------------------------------
// Const packing

/// Returns the buffer size for `strs`, one terminator per entry.
///
/// Usable in `const` context, e.g. as the length of the array built by [`pack`].
pub const fn packed_len(strs: &[&str]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < strs.len() {
        total += strs[i].len() + 1;
        i += 1;
    }
    total
}

/// Concatenates `strs` into a buffer of `N` bytes at compile time.
///
/// # Panics
///
/// Panics (at compile time in `const` items) if `N != packed_len(strs)`.
///
/// # Examples
///
/// ```
/// use mo_meta::strings::{pack, packed_len};
///
/// const NAMES: &[&str] = &["Counter", "", "value"];
/// const BUFFER: [u8; packed_len(NAMES)] = pack(NAMES);
///
/// assert_eq!(&BUFFER, b"Counter\0\0value\0");
/// ```
pub const fn pack<const N: usize>(strs: &[&str]) -> [u8; N] {
    assert!(N == packed_len(strs), "buffer length does not match packed_len");
    let mut out = [0u8; N];
    let mut at = 0;
    let mut i = 0;
    while i < strs.len() {
        let bytes = strs[i].as_bytes();
        let mut j = 0;
        while j < bytes.len() {
            out[at] = bytes[j];
            at += 1;
            j += 1;
        }
        // terminator, already zero
        at += 1;
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{StaticString, StringTable, compute_offsets, pack, packed_len};

    #[test]
    fn roundtrip_through_buffer() {
        let names = ["Counter", "", "valueChanged", "setValue", "value"];
        let mut table = StringTable::new();
        for name in names {
            table.push(StaticString::new(name));
        }
        let buffer = table.concatenate_all();
        assert_eq!(buffer.len(), table.byte_len());

        for (entry, offset) in table.iter().zip(table.offsets()) {
            let bytes = StringTable::slice(&buffer, offset, entry.len());
            assert_eq!(&bytes[..bytes.len() - 1], entry.as_str().as_bytes());
            assert_eq!(bytes[bytes.len() - 1], 0);
        }
    }

    #[test]
    fn offsets_follow_stored_lengths() {
        let mut table = StringTable::new();
        table.push("Counter".into());
        table.push("".into());
        table.intern("value".into());
        table.intern("Counter".into());

        assert_eq!(table.lengths(), [8, 1, 6]);
        assert_eq!(table.offsets(), compute_offsets(table.lengths()));
        assert_eq!(table.byte_len(), 15);
        assert_eq!(table.concatenate_all().len(), table.byte_len());
    }

    #[test]
    fn push_keeps_duplicates_intern_does_not() {
        let mut table = StringTable::new();
        assert_eq!(table.push("int".into()), 0);
        assert_eq!(table.push("int".into()), 1);
        assert_eq!(table.intern("int".into()), 0);
        assert_eq!(table.index_of("int"), Some(0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn concat_preserves_terminators() {
        let table = StaticString::new("a").concat(StaticString::new("bc"));
        assert_eq!(&table.concatenate_all()[..], b"a\0bc\0");
        assert_eq!(table.offsets(), [0, 2]);
        assert_eq!(table.lengths(), [2, 3]);
    }

    #[test]
    fn const_pack_matches_runtime_table() {
        const NAMES: &[&str] = &["P", "", "changed", "value"];
        const PACKED: [u8; packed_len(NAMES)] = pack(NAMES);

        let table = NAMES
            .iter()
            .fold(StringTable::new(), |t, s| t.with(StaticString::new(s)));
        assert_eq!(&PACKED[..], &table.concatenate_all()[..]);
    }

    #[test]
    fn empty_string_takes_one_byte() {
        assert_eq!(StaticString::EMPTY.len(), 1);
        assert_eq!(StaticString::EMPTY.byte(0), 0);
    }
}
