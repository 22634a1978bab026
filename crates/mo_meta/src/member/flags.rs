use bitflags::bitflags;

bitflags! {
    /// The flags word of a method or constructor record.
    ///
    /// The low two bits hold the [`Access`] level, the next two the
    /// [`MethodKind`]. `*_PRIVATE` and `METHOD` are zero.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        const ACCESS_PRIVATE = 0x00;
        const ACCESS_PROTECTED = 0x01;
        const ACCESS_PUBLIC = 0x02;
        const ACCESS_MASK = 0x03;

        const METHOD = 0x00;
        const SIGNAL = 0x04;
        const SLOT = 0x08;
        const CONSTRUCTOR = 0x0c;
        const KIND_MASK = 0x0c;

        const COMPATIBILITY = 0x10;
        const CLONED = 0x20;
        const SCRIPTABLE = 0x40;
        const REVISIONED = 0x80;
    }
}

impl MethodFlags {
    /// Flags a declaration may set on top of its kind and access.
    pub const EXTRAS: Self = Self::COMPATIBILITY
        .union(Self::CLONED)
        .union(Self::SCRIPTABLE)
        .union(Self::REVISIONED);

    /// Returns the access level encoded in the low bits.
    pub const fn access(self) -> Access {
        match self.bits() & Self::ACCESS_MASK.bits() {
            0x00 => Access::Private,
            0x01 => Access::Protected,
            _ => Access::Public,
        }
    }

    /// Returns the member kind, or `None` for a constructor.
    pub const fn kind(self) -> Option<MethodKind> {
        match self.bits() & Self::KIND_MASK.bits() {
            0x00 => Some(MethodKind::Method),
            0x04 => Some(MethodKind::Signal),
            0x08 => Some(MethodKind::Slot),
            _ => None,
        }
    }

    /// Returns `true` if the kind bits say "constructor".
    #[inline]
    pub const fn is_constructor(self) -> bool {
        self.bits() & Self::KIND_MASK.bits() == Self::CONSTRUCTOR.bits()
    }
}

bitflags! {
    /// The flags word of a property record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        const READABLE = 0x0000_0001;
        const WRITABLE = 0x0000_0002;
        const RESETTABLE = 0x0000_0004;
        const CONSTANT = 0x0000_0400;
        const FINAL = 0x0000_0800;
        const DESIGNABLE = 0x0000_1000;
        const SCRIPTABLE = 0x0000_4000;
        const STORED = 0x0001_0000;
        const USER = 0x0010_0000;
        const NOTIFY = 0x0040_0000;
    }
}

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    Private,
    Protected,
    #[default]
    Public,
}

impl Access {
    /// Returns the flag bits for this level.
    pub const fn flags(self) -> MethodFlags {
        match self {
            Self::Private => MethodFlags::ACCESS_PRIVATE,
            Self::Protected => MethodFlags::ACCESS_PROTECTED,
            Self::Public => MethodFlags::ACCESS_PUBLIC,
        }
    }
}

/// The kind of an invokable member.
///
/// The declaration order of the variants is the order of the method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MethodKind {
    Signal,
    Slot,
    Method,
}

impl MethodKind {
    /// Returns the flag bits for this kind.
    pub const fn flags(self) -> MethodFlags {
        match self {
            Self::Signal => MethodFlags::SIGNAL,
            Self::Slot => MethodFlags::SLOT,
            Self::Method => MethodFlags::METHOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_access_roundtrip() {
        for kind in [MethodKind::Signal, MethodKind::Slot, MethodKind::Method] {
            for access in [Access::Private, Access::Protected, Access::Public] {
                let flags = kind.flags() | access.flags() | MethodFlags::CLONED;
                assert_eq!(flags.kind(), Some(kind));
                assert_eq!(flags.access(), access);
                assert!(!flags.is_constructor());
            }
        }
        assert!(MethodFlags::CONSTRUCTOR.is_constructor());
        assert_eq!(MethodFlags::CONSTRUCTOR.kind(), None);
    }

    #[test]
    fn extras_exclude_kind_and_access() {
        assert!(!MethodFlags::EXTRAS.intersects(MethodFlags::KIND_MASK | MethodFlags::ACCESS_MASK));
    }
}
