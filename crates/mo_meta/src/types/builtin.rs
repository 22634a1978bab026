use core::fmt;

/// The host's built-in types and their fixed codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BuiltinType {
    Bool = 1,
    Int = 2,
    UInt = 3,
    LongLong = 4,
    ULongLong = 5,
    Double = 6,
    QString = 10,
    QStringList = 11,
    QByteArray = 12,
    VoidStar = 31,
    Short = 33,
    UShort = 36,
    UChar = 37,
    Float = 38,
    SChar = 40,
    Void = 43,
}

impl BuiltinType {
    /// Every built-in type, ordered by code.
    pub const ALL: [BuiltinType; 16] = [
        Self::Bool,
        Self::Int,
        Self::UInt,
        Self::LongLong,
        Self::ULongLong,
        Self::Double,
        Self::QString,
        Self::QStringList,
        Self::QByteArray,
        Self::VoidStar,
        Self::Short,
        Self::UShort,
        Self::UChar,
        Self::Float,
        Self::SChar,
        Self::Void,
    ];

    /// Returns the host type code.
    #[inline(always)]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the host's spelling of the type, as used in signatures.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::LongLong => "qlonglong",
            Self::ULongLong => "qulonglong",
            Self::Double => "double",
            Self::QString => "QString",
            Self::QStringList => "QStringList",
            Self::QByteArray => "QByteArray",
            Self::VoidStar => "void*",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::UChar => "uchar",
            Self::Float => "float",
            Self::SChar => "signed char",
            Self::Void => "void",
        }
    }

    /// Looks a built-in type up by code.
    ///
    /// ```
    /// use mo_meta::types::BuiltinType;
    ///
    /// assert_eq!(BuiltinType::from_code(10), Some(BuiltinType::QString));
    /// assert_eq!(BuiltinType::from_code(7), None);
    /// ```
    pub const fn from_code(code: u32) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i] as u32 == code {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Looks a built-in type up by its host spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::BuiltinType;

    #[test]
    fn codes_are_unique_and_sorted() {
        let codes = BuiltinType::ALL.map(BuiltinType::code);
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn name_and_code_lookup_agree() {
        for ty in BuiltinType::ALL {
            assert_eq!(BuiltinType::from_code(ty.code()), Some(ty));
            assert_eq!(BuiltinType::from_name(ty.name()), Some(ty));
        }
    }
}
