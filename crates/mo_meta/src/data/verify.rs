use thiserror::Error;

use crate::data::{
    CLASS_NAME_INDEX, CONSTRUCTOR_RECORD_LEN, CONSTRUCTOR_RETURN, DataArrays, HEADER_LEN, Layout,
    METHOD_RECORD_LEN, METHOD_TAG, PROPERTY_RECORD_LEN, REVISION, header, records_len,
};
use crate::member::{MethodFlags, MethodKind};
use crate::seq;
use crate::types::{BuiltinType, UNRESOLVED_TYPE};

/// A structural defect found by [`verify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("string buffer does not end with a terminator")]
    UnterminatedStrings,
    #[error("string table has {count} entries, needs the class name and the empty string")]
    MissingStrings { count: usize },
    #[error("string 1 must be the empty string")]
    EmptyStringMissing,
    #[error("table has {len} words, shorter than the 14-word header")]
    HeaderTooShort { len: usize },
    #[error("revision {found} is not supported")]
    Revision { found: u32 },
    #[error("class name must be string 0, found {index}")]
    ClassName { index: u32 },
    #[error("{section} section is not supported, found {count} entries")]
    UnsupportedSection { section: &'static str, count: u32 },
    #[error("{section} table at word {actual}, expected {expected}")]
    SectionOffset {
        section: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("table needs {needed} words, has {len}")]
    Truncated { needed: usize, len: usize },
    #[error("{signals} signals declared but only {methods} methods")]
    SignalCount { signals: u32, methods: u32 },
    #[error("method {index} is out of order for its kind")]
    KindOrder { index: usize },
    #[error("method {index} is a constructor")]
    MisplacedConstructor { index: usize },
    #[error("constructor {index} is not flagged as a constructor")]
    NotAConstructor { index: usize },
    #[error("constructor {index} has name {name}, expected 0")]
    ConstructorName { index: usize, name: u32 },
    #[error("constructor {index} returns {found:#x}")]
    ConstructorReturn { index: usize, found: u32 },
    #[error("record {record} has tag {tag}, expected 1")]
    Tag { record: usize, tag: u32 },
    #[error("record {record} parameters at word {actual}, expected {expected}")]
    ParamOffset {
        record: usize,
        expected: u32,
        actual: u32,
    },
    #[error("string index {index} out of range ({count} strings)")]
    StringIndex { index: u32, count: usize },
    #[error("type code {code:#x} is neither built-in nor a string reference")]
    UnknownType { code: u32 },
    #[error("table has {actual} words, expected {expected}")]
    Size { expected: usize, actual: usize },
}

impl DataArrays {
    /// Runs [`verify`] on these tables.
    #[inline]
    pub fn verify(&self) -> Result<(), LayoutError> {
        verify(self.string_data(), self.data())
    }
}

/// Re-reads a string buffer and integer array and checks the layout.
///
/// Checks the header, section offsets, signal/slot/method order, parameter
/// block offsets, the total length, and that every string index and type
/// code resolves.
///
/// ```
/// use mo_meta::class::ClassDef;
/// use mo_meta::data::{LayoutError, generate, verify};
///
/// struct Empty;
///
/// let arrays = generate(&ClassDef::<Empty>::new("Empty"));
/// assert_eq!(verify(arrays.string_data(), arrays.data()), Ok(()));
///
/// let mut data = arrays.data().to_vec();
/// data.push(0);
/// assert_eq!(
///     verify(arrays.string_data(), &data),
///     Err(LayoutError::Size { expected: 14, actual: 15 })
/// );
/// ```
pub fn verify(strings: &[u8], data: &[u32]) -> Result<(), LayoutError> {
    let string_count = check_strings(strings)?;
    let checker = Checker { data, string_count };

    if data.len() < HEADER_LEN {
        return Err(LayoutError::HeaderTooShort { len: data.len() });
    }
    if data[header::REVISION] != REVISION {
        return Err(LayoutError::Revision {
            found: data[header::REVISION],
        });
    }
    if data[header::CLASS_NAME] != CLASS_NAME_INDEX {
        return Err(LayoutError::ClassName {
            index: data[header::CLASS_NAME],
        });
    }
    for (section, at) in [("classinfo", header::CLASSINFO_COUNT), ("enum", header::ENUM_COUNT)] {
        if data[at] != 0 {
            return Err(LayoutError::UnsupportedSection {
                section,
                count: data[at],
            });
        }
    }

    let methods = data[header::METHOD_COUNT];
    let properties = data[header::PROPERTY_COUNT];
    let constructors = data[header::CONSTRUCTOR_COUNT];
    let signals = data[header::SIGNAL_COUNT];
    let counts = (methods as usize, properties as usize, constructors as usize);
    let Some(layout) = Layout::checked(counts.0, counts.1, counts.2) else {
        return Err(LayoutError::Truncated {
            needed: records_len(counts.0, counts.1, counts.2).unwrap_or(usize::MAX),
            len: data.len(),
        });
    };

    for (section, at, expected) in [
        ("method", header::METHOD_OFFSET, layout.method_offset),
        ("property", header::PROPERTY_OFFSET, layout.property_offset),
        ("constructor", header::CONSTRUCTOR_OFFSET, layout.constructor_offset),
    ] {
        if data[at] != expected {
            return Err(LayoutError::SectionOffset {
                section,
                expected,
                actual: data[at],
            });
        }
    }
    checker.ensure_len(layout.param_base as usize)?;
    if signals > methods {
        return Err(LayoutError::SignalCount { signals, methods });
    }

    let mut next_params = layout.param_base;
    let mut last_kind = MethodKind::Signal;

    for index in 0..methods as usize {
        let at = layout.method_offset as usize + index * METHOD_RECORD_LEN;
        let record = &data[at..at + METHOD_RECORD_LEN];
        checker.string(record[0])?;

        let flags = MethodFlags::from_bits_retain(record[4]);
        let Some(kind) = flags.kind() else {
            return Err(LayoutError::MisplacedConstructor { index });
        };
        if kind < last_kind || (index < signals as usize) != (kind == MethodKind::Signal) {
            return Err(LayoutError::KindOrder { index });
        }
        last_kind = kind;

        checker.record(index, record, next_params)?;
        checker.type_code(data[record[2] as usize])?;
        next_params += seq::param_block_len(record[1]);
    }

    for index in 0..properties as usize {
        let at = layout.property_offset as usize + index * PROPERTY_RECORD_LEN;
        let record = &data[at..at + PROPERTY_RECORD_LEN];
        checker.string(record[0])?;
        checker.type_code(record[1])?;
    }

    for index in 0..constructors as usize {
        let at = layout.constructor_offset as usize + index * CONSTRUCTOR_RECORD_LEN;
        let record = &data[at..at + CONSTRUCTOR_RECORD_LEN];
        if record[0] != CLASS_NAME_INDEX {
            return Err(LayoutError::ConstructorName {
                index,
                name: record[0],
            });
        }
        if !MethodFlags::from_bits_retain(record[4]).is_constructor() {
            return Err(LayoutError::NotAConstructor { index });
        }

        let record_index = methods as usize + index;
        checker.record(record_index, record, next_params)?;
        let ret = data[record[2] as usize];
        if ret != CONSTRUCTOR_RETURN {
            return Err(LayoutError::ConstructorReturn { index, found: ret });
        }
        next_params += seq::param_block_len(record[1]);
    }

    if data.len() != next_params as usize {
        return Err(LayoutError::Size {
            expected: next_params as usize,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Returns the number of strings in a terminated buffer.
fn check_strings(strings: &[u8]) -> Result<usize, LayoutError> {
    if strings.last().is_some_and(|&b| b != 0) {
        return Err(LayoutError::UnterminatedStrings);
    }
    let count = strings.iter().filter(|&&b| b == 0).count();
    if count < 2 {
        return Err(LayoutError::MissingStrings { count });
    }
    let Some(first_end) = strings.iter().position(|&b| b == 0) else {
        return Err(LayoutError::UnterminatedStrings);
    };
    if strings.get(first_end + 1) != Some(&0) {
        return Err(LayoutError::EmptyStringMissing);
    }
    Ok(count)
}

struct Checker<'a> {
    data: &'a [u32],
    string_count: usize,
}

impl Checker<'_> {
    fn ensure_len(&self, needed: usize) -> Result<(), LayoutError> {
        if needed > self.data.len() {
            return Err(LayoutError::Truncated {
                needed,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    fn string(&self, index: u32) -> Result<(), LayoutError> {
        if index as usize >= self.string_count {
            return Err(LayoutError::StringIndex {
                index,
                count: self.string_count,
            });
        }
        Ok(())
    }

    fn type_code(&self, code: u32) -> Result<(), LayoutError> {
        if code & UNRESOLVED_TYPE != 0 {
            self.string(code & !UNRESOLVED_TYPE)
        } else if BuiltinType::from_code(code).is_some() {
            Ok(())
        } else {
            Err(LayoutError::UnknownType { code })
        }
    }

    /// Checks the tag, the parameter offset and the argument pairs of a
    /// method or constructor record. The return word is left to the caller.
    fn record(&self, index: usize, record: &[u32], expected: u32) -> Result<(), LayoutError> {
        if record[3] != METHOD_TAG {
            return Err(LayoutError::Tag {
                record: index,
                tag: record[3],
            });
        }
        if record[2] != expected {
            return Err(LayoutError::ParamOffset {
                record: index,
                expected,
                actual: record[2],
            });
        }

        let start = record[2] as usize;
        let argc = record[1] as usize;
        let end = argc
            .checked_mul(2)
            .and_then(|words| words.checked_add(start + 1))
            .unwrap_or(usize::MAX);
        self.ensure_len(end)?;
        for i in 0..argc {
            self.type_code(self.data[start + 1 + 2 * i])?;
            self.string(self.data[start + 2 + 2 * i])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutError, verify};
    use crate::class::ClassDef;
    use crate::data::{generate, header};
    use crate::member::{PropertyDecl, PropertyFlags};

    struct Meter {
        level: u16,
    }

    impl Meter {
        fn changed(&self, _: u16) {}
        fn bump(&mut self, by: u16) -> u16 {
            self.level += by;
            self.level
        }
        fn start() -> Self {
            Self { level: 0 }
        }
    }

    fn meter() -> ClassDef<Meter> {
        ClassDef::new("Meter")
            .slot("bump", Meter::bump as fn(&mut Meter, u16) -> u16)
            .signal("changed", Meter::changed as fn(&Meter, u16))
            .property(
                PropertyDecl::<Meter, u16>::new("level")
                    .member(|m| &m.level, |m| &mut m.level)
                    .flags_with(PropertyFlags::STORED),
            )
            .constructor(Meter::start as fn() -> Meter)
    }

    #[test]
    fn generated_tables_verify() {
        let arrays = generate(&meter());
        assert_eq!(arrays.verify(), Ok(()));
    }

    #[test]
    fn detects_broken_tables() {
        let arrays = generate(&meter());
        let strings = arrays.string_data();

        let mut data = arrays.data().to_vec();
        data[header::SIGNAL_COUNT] = 0;
        assert_eq!(verify(strings, &data), Err(LayoutError::KindOrder { index: 0 }));

        let mut data = arrays.data().to_vec();
        data[14 + 2] += 1;
        assert!(matches!(
            verify(strings, &data),
            Err(LayoutError::ParamOffset { record: 0, .. })
        ));

        let mut data = arrays.data().to_vec();
        data[header::PROPERTY_OFFSET] += 1;
        assert!(matches!(
            verify(strings, &data),
            Err(LayoutError::SectionOffset { section: "property", .. })
        ));

        let data = arrays.data();
        assert_eq!(
            verify(&strings[..strings.len() - 1], data),
            Err(LayoutError::UnterminatedStrings)
        );
        assert_eq!(
            verify(strings, &data[..10]),
            Err(LayoutError::HeaderTooShort { len: 10 })
        );
    }

    #[test]
    fn oversized_counts_are_truncation_errors() {
        let arrays = generate(&meter());
        let strings = arrays.string_data();
        let len = arrays.data().len();

        // 5 * count + 14 wraps to 13 in a 32-bit word.
        let mut data = arrays.data().to_vec();
        data[header::METHOD_COUNT] = 858_993_459;
        data[header::PROPERTY_OFFSET] = 13;
        data[header::CONSTRUCTOR_OFFSET] = 13;
        assert!(matches!(
            verify(strings, &data),
            Err(LayoutError::Truncated { len: l, .. }) if l == len
        ));

        let mut data = arrays.data().to_vec();
        data[header::PROPERTY_COUNT] = u32::MAX;
        assert!(matches!(verify(strings, &data), Err(LayoutError::Truncated { .. })));

        let mut data = arrays.data().to_vec();
        data[14 + 1] = u32::MAX;
        assert!(matches!(verify(strings, &data), Err(LayoutError::Truncated { .. })));
    }
}
