/// An operation requested by the host through dispatch.
///
/// The discriminants are fixed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CallKind {
    InvokeMetaMethod = 0,
    ReadProperty = 1,
    WriteProperty = 2,
    ResetProperty = 3,
    QueryPropertyDesignable = 4,
    QueryPropertyScriptable = 5,
    QueryPropertyStored = 6,
    QueryPropertyEditable = 7,
    QueryPropertyUser = 8,
    CreateInstance = 9,
    IndexOfMethod = 10,
    RegisterPropertyMetaType = 11,
    RegisterMethodArgumentMetaType = 12,
}

impl CallKind {
    const ALL: [CallKind; 13] = [
        Self::InvokeMetaMethod,
        Self::ReadProperty,
        Self::WriteProperty,
        Self::ResetProperty,
        Self::QueryPropertyDesignable,
        Self::QueryPropertyScriptable,
        Self::QueryPropertyStored,
        Self::QueryPropertyEditable,
        Self::QueryPropertyUser,
        Self::CreateInstance,
        Self::IndexOfMethod,
        Self::RegisterPropertyMetaType,
        Self::RegisterMethodArgumentMetaType,
    ];

    /// Converts the host's raw value.
    ///
    /// ```
    /// use mo_meta::host::CallKind;
    ///
    /// assert_eq!(CallKind::from_raw(2), Some(CallKind::WriteProperty));
    /// assert_eq!(CallKind::from_raw(13), None);
    /// ```
    pub const fn from_raw(raw: i32) -> Option<Self> {
        if raw >= 0 && (raw as usize) < Self::ALL.len() {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns `true` for calls whose index counts methods.
    #[inline]
    pub const fn targets_method(self) -> bool {
        matches!(
            self,
            Self::InvokeMetaMethod | Self::RegisterMethodArgumentMetaType
        )
    }

    /// Returns `true` for calls whose index counts properties: the range
    /// `ReadProperty..=QueryPropertyUser` and `RegisterPropertyMetaType`.
    #[inline]
    pub const fn targets_property(self) -> bool {
        let raw = self as i32;
        (raw >= Self::ReadProperty as i32 && raw <= Self::QueryPropertyUser as i32)
            || matches!(self, Self::RegisterPropertyMetaType)
    }
}

impl TryFrom<i32> for CallKind {
    type Error = i32;

    #[inline]
    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(raw)
    }
}
