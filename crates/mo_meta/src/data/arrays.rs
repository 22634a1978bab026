use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::data::{
    CONSTRUCTOR_RECORD_LEN, METHOD_RECORD_LEN, PROPERTY_RECORD_LEN, header,
};
use crate::member::{MethodFlags, PropertyFlags};
use crate::strings::StringTable;
use crate::types::{BuiltinType, UNRESOLVED_TYPE};

// -----------------------------------------------------------------------------
// DataArrays

/// The two flat tables handed to the host: a string buffer and an integer
/// array.
///
/// Besides raw access, the table can be read back the way the host reads it:
/// by record, with names resolved through the string buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct DataArrays {
    strings: StringTable,
    string_data: Box<[u8]>,
    string_offsets: Box<[u32]>,
    data: Box<[u32]>,
}

impl DataArrays {
    pub(crate) fn new(strings: StringTable, data: Box<[u32]>) -> Self {
        let string_data = strings.concatenate_all();
        let string_offsets = strings.offsets().into_boxed_slice();
        Self {
            strings,
            string_data,
            string_offsets,
            data,
        }
    }

    /// Returns the string buffer, every entry terminated.
    #[inline]
    pub fn string_data(&self) -> &[u8] {
        &self.string_data
    }

    /// Returns the byte offset of every string.
    #[inline]
    pub fn string_offsets(&self) -> &[u32] {
        &self.string_offsets
    }

    #[inline]
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Returns the integer array.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Reads string `index` out of the buffer.
    pub fn string(&self, index: u32) -> Option<&str> {
        let index = index as usize;
        let start = *self.string_offsets.get(index)? as usize;
        let end = match self.string_offsets.get(index + 1) {
            Some(&next) => next as usize,
            None => self.string_data.len(),
        };
        // drop the terminator
        core::str::from_utf8(self.string_data.get(start..end.checked_sub(1)?)?).ok()
    }

    /// Returns the spelling of a type code.
    pub fn type_name(&self, code: u32) -> Option<&str> {
        if code & UNRESOLVED_TYPE != 0 {
            self.string(code & !UNRESOLVED_TYPE)
        } else {
            BuiltinType::from_code(code).map(BuiltinType::name)
        }
    }

    #[inline]
    fn word(&self, index: usize) -> u32 {
        self.data.get(index).copied().unwrap_or(0)
    }

    // ---------------------------------------------------------------
    // Header

    #[inline]
    pub fn revision(&self) -> u32 {
        self.word(header::REVISION)
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        self.string(self.word(header::CLASS_NAME)).unwrap_or_default()
    }

    #[inline]
    pub fn method_count(&self) -> usize {
        self.word(header::METHOD_COUNT) as usize
    }

    #[inline]
    pub fn property_count(&self) -> usize {
        self.word(header::PROPERTY_COUNT) as usize
    }

    #[inline]
    pub fn constructor_count(&self) -> usize {
        self.word(header::CONSTRUCTOR_COUNT) as usize
    }

    #[inline]
    pub fn signal_count(&self) -> usize {
        self.word(header::SIGNAL_COUNT) as usize
    }

    #[inline]
    pub fn flags(&self) -> u32 {
        self.word(header::FLAGS)
    }

    // ---------------------------------------------------------------
    // Records

    /// Reads method record `index`.
    pub fn method(&self, index: usize) -> Option<MethodView<'_>> {
        if index >= self.method_count() {
            return None;
        }
        let at = self.word(header::METHOD_OFFSET) as usize + index * METHOD_RECORD_LEN;
        self.record_view(at)
    }

    /// Reads constructor record `index`.
    pub fn constructor(&self, index: usize) -> Option<MethodView<'_>> {
        if index >= self.constructor_count() {
            return None;
        }
        let at = self.word(header::CONSTRUCTOR_OFFSET) as usize + index * CONSTRUCTOR_RECORD_LEN;
        self.record_view(at)
    }

    fn record_view(&self, at: usize) -> Option<MethodView<'_>> {
        let record = self.data.get(at..at + METHOD_RECORD_LEN)?;
        Some(MethodView {
            arrays: self,
            name: record[0],
            argc: record[1] as usize,
            params: record[2] as usize,
            flags: MethodFlags::from_bits_retain(record[4]),
        })
    }

    /// Reads property record `index`.
    pub fn property(&self, index: usize) -> Option<PropertyView<'_>> {
        if index >= self.property_count() {
            return None;
        }
        let at = self.word(header::PROPERTY_OFFSET) as usize + index * PROPERTY_RECORD_LEN;
        let record = self.data.get(at..at + PROPERTY_RECORD_LEN)?;
        Some(PropertyView {
            arrays: self,
            name: record[0],
            type_code: record[1],
            flags: PropertyFlags::from_bits_retain(record[2]),
        })
    }

    /// Iterates all method records.
    pub fn methods(&self) -> impl Iterator<Item = MethodView<'_>> + '_ {
        (0..self.method_count()).filter_map(|i| self.method(i))
    }

    /// Iterates all property records.
    pub fn properties(&self) -> impl Iterator<Item = PropertyView<'_>> + '_ {
        (0..self.property_count()).filter_map(|i| self.property(i))
    }

    /// Iterates all constructor records.
    pub fn constructors(&self) -> impl Iterator<Item = MethodView<'_>> + '_ {
        (0..self.constructor_count()).filter_map(|i| self.constructor(i))
    }
}

// -----------------------------------------------------------------------------
// Views

/// A method or constructor record, read from the flat tables.
#[derive(Clone, Copy)]
pub struct MethodView<'a> {
    arrays: &'a DataArrays,
    name: u32,
    argc: usize,
    params: usize,
    flags: MethodFlags,
}

impl<'a> MethodView<'a> {
    /// Returns the name; constructors answer with the class name.
    #[inline]
    pub fn name(&self) -> &'a str {
        self.arrays.string(self.name).unwrap_or_default()
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.argc
    }

    /// Returns the word offset of the parameter block.
    #[inline]
    pub fn param_offset(&self) -> usize {
        self.params
    }

    #[inline]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Returns the raw return type code.
    #[inline]
    pub fn return_type(&self) -> u32 {
        self.arrays.word(self.params)
    }

    /// Returns the raw type code of argument `index`.
    pub fn arg_type(&self, index: usize) -> Option<u32> {
        (index < self.argc).then(|| self.arrays.word(self.params + 1 + 2 * index))
    }

    /// Returns the name of argument `index`; empty if it was omitted.
    pub fn arg_name(&self, index: usize) -> Option<&'a str> {
        if index >= self.argc {
            return None;
        }
        self.arrays.string(self.arrays.word(self.params + 2 + 2 * index))
    }

    /// Returns the normalized signature, e.g. `setValue(int,QString)`.
    pub fn signature(&self) -> String {
        let mut out = String::from(self.name());
        out.push('(');
        for i in 0..self.argc {
            if i > 0 {
                out.push(',');
            }
            let code = self.arrays.word(self.params + 1 + 2 * i);
            out.push_str(self.arrays.type_name(code).unwrap_or("?"));
        }
        out.push(')');
        out
    }
}

impl fmt::Debug for MethodView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodView")
            .field("signature", &self.signature())
            .field("param_offset", &self.params)
            .field("flags", &self.flags)
            .finish()
    }
}

/// A property record, read from the flat tables.
#[derive(Clone, Copy)]
pub struct PropertyView<'a> {
    arrays: &'a DataArrays,
    name: u32,
    type_code: u32,
    flags: PropertyFlags,
}

impl<'a> PropertyView<'a> {
    #[inline]
    pub fn name(&self) -> &'a str {
        self.arrays.string(self.name).unwrap_or_default()
    }

    #[inline]
    pub fn type_code(&self) -> u32 {
        self.type_code
    }

    #[inline]
    pub fn type_name(&self) -> &'a str {
        self.arrays.type_name(self.type_code).unwrap_or_default()
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }
}

impl fmt::Debug for PropertyView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyView")
            .field("name", &self.name())
            .field("type", &self.type_name())
            .field("flags", &self.flags)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Dump

fn kind_name(flags: MethodFlags) -> &'static str {
    match flags.bits() & MethodFlags::KIND_MASK.bits() {
        0x04 => "signal",
        0x08 => "slot",
        0x0c => "constructor",
        _ => "method",
    }
}

impl fmt::Display for DataArrays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "class {} (revision {}, flags {:#x})",
            self.class_name(),
            self.revision(),
            self.flags(),
        )?;
        writeln!(
            f,
            "  methods: {} @ {}, signals: {}",
            self.method_count(),
            self.word(header::METHOD_OFFSET),
            self.signal_count(),
        )?;
        for (i, m) in self.methods().enumerate() {
            let ret = self.type_name(m.return_type()).unwrap_or("?");
            writeln!(
                f,
                "    [{i}] {} {ret} {} params @ {} flags {:#04x}",
                kind_name(m.flags()),
                m.signature(),
                m.param_offset(),
                m.flags().bits(),
            )?;
        }
        writeln!(
            f,
            "  properties: {} @ {}",
            self.property_count(),
            self.word(header::PROPERTY_OFFSET),
        )?;
        for (i, p) in self.properties().enumerate() {
            writeln!(
                f,
                "    [{i}] {} {} flags {:#08x}",
                p.type_name(),
                p.name(),
                p.flags().bits(),
            )?;
        }
        writeln!(
            f,
            "  constructors: {} @ {}",
            self.constructor_count(),
            self.word(header::CONSTRUCTOR_OFFSET),
        )?;
        for (i, c) in self.constructors().enumerate() {
            writeln!(f, "    [{i}] {} params @ {}", c.signature(), c.param_offset())?;
        }
        writeln!(f, "  strings: {} ({} bytes)", self.string_count(), self.string_data.len())?;
        for (i, &offset) in self.string_offsets().iter().enumerate() {
            let s = self.string(i as u32).unwrap_or_default();
            writeln!(f, "    [{i}] @ {offset} {s:?}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DataArrays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataArrays")
            .field("strings", &self.strings)
            .field("data", &self.data)
            .finish()
    }
}
