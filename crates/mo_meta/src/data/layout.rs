use crate::seq;
use crate::types::UNRESOLVED_TYPE;

/// Table format revision understood by the host.
pub const REVISION: u32 = 7;

pub const HEADER_LEN: usize = 14;
pub const METHOD_RECORD_LEN: usize = 5;
pub const PROPERTY_RECORD_LEN: usize = 3;
pub const CONSTRUCTOR_RECORD_LEN: usize = 5;

/// String index of the class name.
pub const CLASS_NAME_INDEX: u32 = 0;
/// String index of the empty string.
pub const EMPTY_INDEX: u32 = 1;
/// The tag word of every method record.
pub const METHOD_TAG: u32 = EMPTY_INDEX;

/// Header flag: properties are served by the static dispatch function.
pub const PROPERTY_ACCESS_IN_STATIC_METACALL: u32 = 0x04;

/// Return type code of a constructor: "this class".
pub const CONSTRUCTOR_RETURN: u32 = UNRESOLVED_TYPE | 1;

/// Word positions inside the header.
pub mod header {
    pub const REVISION: usize = 0;
    pub const CLASS_NAME: usize = 1;
    pub const CLASSINFO_COUNT: usize = 2;
    pub const CLASSINFO_OFFSET: usize = 3;
    pub const METHOD_COUNT: usize = 4;
    pub const METHOD_OFFSET: usize = 5;
    pub const PROPERTY_COUNT: usize = 6;
    pub const PROPERTY_OFFSET: usize = 7;
    pub const ENUM_COUNT: usize = 8;
    pub const ENUM_OFFSET: usize = 9;
    pub const CONSTRUCTOR_COUNT: usize = 10;
    pub const CONSTRUCTOR_OFFSET: usize = 11;
    pub const FLAGS: usize = 12;
    pub const SIGNAL_COUNT: usize = 13;
}

/// Section offsets for a class with the given member counts.
///
/// ```
/// use mo_meta::data::Layout;
///
/// let layout = Layout::new(2, 1, 1);
/// assert_eq!(layout.method_offset, 14);
/// assert_eq!(layout.property_offset, 24);
/// assert_eq!(layout.constructor_offset, 27);
/// assert_eq!(layout.param_base, 32);
/// assert_eq!(layout.total_len(&[0, 1, 2]), 32 + 1 + 3 + 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub method_offset: u32,
    pub property_offset: u32,
    pub constructor_offset: u32,
    /// First word after all fixed-size records.
    pub param_base: u32,
}

impl Layout {
    pub const fn new(methods: usize, properties: usize, constructors: usize) -> Self {
        let method_offset = HEADER_LEN;
        let property_offset = method_offset + METHOD_RECORD_LEN * methods;
        let constructor_offset = property_offset + PROPERTY_RECORD_LEN * properties;
        let param_base = constructor_offset + CONSTRUCTOR_RECORD_LEN * constructors;
        Self {
            method_offset: method_offset as u32,
            property_offset: property_offset as u32,
            constructor_offset: constructor_offset as u32,
            param_base: param_base as u32,
        }
    }

    /// Like [`Layout::new`], but returns `None` when an offset does not fit
    /// in a table word.
    ///
    /// ```
    /// use mo_meta::data::Layout;
    ///
    /// assert_eq!(Layout::checked(2, 1, 1), Some(Layout::new(2, 1, 1)));
    /// assert_eq!(Layout::checked(u32::MAX as usize, 0, 0), None);
    /// ```
    pub const fn checked(methods: usize, properties: usize, constructors: usize) -> Option<Self> {
        let Some(param_base) = records_len(methods, properties, constructors) else {
            return None;
        };
        if param_base > u32::MAX as usize {
            return None;
        }
        Some(Self::new(methods, properties, constructors))
    }

    /// Returns the table length given the argument count of every method
    /// and constructor.
    pub const fn total_len(&self, argcs: &[u32]) -> usize {
        (self.param_base + seq::param_area_len(argcs)) as usize
    }
}

/// Length of the header plus every fixed-size record, or `None` on overflow.
pub const fn records_len(methods: usize, properties: usize, constructors: usize) -> Option<usize> {
    let Some(methods) = methods.checked_mul(METHOD_RECORD_LEN) else {
        return None;
    };
    let Some(properties) = properties.checked_mul(PROPERTY_RECORD_LEN) else {
        return None;
    };
    let Some(constructors) = constructors.checked_mul(CONSTRUCTOR_RECORD_LEN) else {
        return None;
    };
    let Some(len) = HEADER_LEN.checked_add(methods) else {
        return None;
    };
    let Some(len) = len.checked_add(properties) else {
        return None;
    };
    len.checked_add(constructors)
}
