//! Status code space and wire markers.
//!
//! A status vector is a flat run of architecture-width integers. Every entry
//! starts with a marker word (the `isc_arg_*` family) that says how many value
//! words follow and how to read them:
//!
//! ```text
//! [ARG_GDS, 335544321, ARG_STRING, <handle>, ARG_END]
//!   ^ marker ^ code      ^ marker    ^ string side-table handle
//! ```
//!
//! Engine codes share the ISC mask `0x14000000` and pack a 5-bit facility and
//! a 14-bit message number below it. `StatusCode` decodes those parts without
//! interpreting the message itself; message text is the business of a
//! [`MessageCatalog`](crate::MessageCatalog).
//!
//! # Zero-Allocation Guarantee
//!
//! Everything in this module is `const`-evaluable or pure integer arithmetic.
//! Display writes straight into the formatter.

use std::fmt;

/// One slot of a status vector (`ISC_STATUS`, pointer-sized).
pub type StatusWord = isize;

/// Marker words understood by the decoder.
///
/// Values follow the published client headers. Only `ARG_CSTRING` carries two
/// value words (length, then string handle); every other marker carries one.
pub mod markers {
    use super::StatusWord;

    /// Terminates the vector.
    pub const ARG_END: StatusWord = 0;
    /// Error code; the first one is the primary code.
    pub const ARG_GDS: StatusWord = 1;
    /// String argument, value is a side-table handle.
    pub const ARG_STRING: StatusWord = 2;
    /// Counted string argument: length word, then handle.
    pub const ARG_CSTRING: StatusWord = 3;
    /// Numeric argument.
    pub const ARG_NUMBER: StatusWord = 4;
    /// Pre-formatted message text, value is a side-table handle.
    pub const ARG_INTERPRETED: StatusWord = 5;
    /// VMS status code.
    pub const ARG_VMS: StatusWord = 6;
    /// Unix `errno`.
    pub const ARG_UNIX: StatusWord = 7;
    /// Apollo domain error.
    pub const ARG_DOMAIN: StatusWord = 8;
    /// MS-DOS/OS2 error.
    pub const ARG_DOS: StatusWord = 9;
    /// HP MPE/XL error.
    pub const ARG_MPEXL: StatusWord = 10;
    /// HP MPE/XL IPC error.
    pub const ARG_MPEXL_IPC: StatusWord = 11;
    /// NeXT/Mach error.
    pub const ARG_NEXT_MACH: StatusWord = 15;
    /// NetWare error.
    pub const ARG_NETWARE: StatusWord = 16;
    /// Win32 `GetLastError()` value.
    pub const ARG_WIN32: StatusWord = 17;
    /// Warning code; everything after it until the next code is its argument list.
    pub const ARG_WARNING: StatusWord = 18;
    /// SQLSTATE string, value is a side-table handle.
    pub const ARG_SQL_STATE: StatusWord = 19;
}

// ============================================================================
// Operating System Error Origins
// ============================================================================

/// Which operating system produced a numeric OS error argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsErrorKind {
    Vms,
    Unix,
    Domain,
    Dos,
    Mpexl,
    MpexlIpc,
    NextMach,
    Netware,
    Win32,
}

impl OsErrorKind {
    /// The kind produced by the platform this crate was compiled for.
    #[cfg(windows)]
    pub const NATIVE: Self = Self::Win32;
    /// The kind produced by the platform this crate was compiled for.
    #[cfg(not(windows))]
    pub const NATIVE: Self = Self::Unix;

    /// Marker word used to encode this kind.
    pub const fn marker(self) -> StatusWord {
        use markers::*;
        match self {
            Self::Vms => ARG_VMS,
            Self::Unix => ARG_UNIX,
            Self::Domain => ARG_DOMAIN,
            Self::Dos => ARG_DOS,
            Self::Mpexl => ARG_MPEXL,
            Self::MpexlIpc => ARG_MPEXL_IPC,
            Self::NextMach => ARG_NEXT_MACH,
            Self::Netware => ARG_NETWARE,
            Self::Win32 => ARG_WIN32,
        }
    }

    pub const fn from_marker(word: StatusWord) -> Option<Self> {
        use markers::*;
        match word {
            ARG_VMS => Some(Self::Vms),
            ARG_UNIX => Some(Self::Unix),
            ARG_DOMAIN => Some(Self::Domain),
            ARG_DOS => Some(Self::Dos),
            ARG_MPEXL => Some(Self::Mpexl),
            ARG_MPEXL_IPC => Some(Self::MpexlIpc),
            ARG_NEXT_MACH => Some(Self::NextMach),
            ARG_NETWARE => Some(Self::Netware),
            ARG_WIN32 => Some(Self::Win32),
            _ => None,
        }
    }

    /// Whether the current platform can render this error with its own tables.
    #[inline]
    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::NATIVE),
            (Self::Unix, Self::Unix) | (Self::Win32, Self::Win32)
        )
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Vms => "VMS",
            Self::Unix => "unix",
            Self::Domain => "domain",
            Self::Dos => "DOS",
            Self::Mpexl => "MPE/XL",
            Self::MpexlIpc => "MPE/XL IPC",
            Self::NextMach => "Mach",
            Self::Netware => "NetWare",
            Self::Win32 => "Win32",
        }
    }
}

// ============================================================================
// Argument Classification
// ============================================================================

/// Classification of a marker word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    End,
    Code,
    Warning,
    Str,
    CStr,
    Number,
    Interpreted,
    SqlState,
    Os(OsErrorKind),
}

impl ArgKind {
    /// Classify a marker word. Unknown markers yield `None`.
    pub const fn from_marker(word: StatusWord) -> Option<Self> {
        use markers::*;
        match word {
            ARG_END => Some(Self::End),
            ARG_GDS => Some(Self::Code),
            ARG_WARNING => Some(Self::Warning),
            ARG_STRING => Some(Self::Str),
            ARG_CSTRING => Some(Self::CStr),
            ARG_NUMBER => Some(Self::Number),
            ARG_INTERPRETED => Some(Self::Interpreted),
            ARG_SQL_STATE => Some(Self::SqlState),
            other => match OsErrorKind::from_marker(other) {
                Some(os) => Some(Self::Os(os)),
                None => None,
            },
        }
    }

    /// Number of value words following the marker.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Self::End => 0,
            Self::CStr => 2,
            _ => 1,
        }
    }

    /// Whether this marker opens a new code entry.
    #[inline]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Code | Self::Warning)
    }
}

// ============================================================================
// Status Code (Engine Identity)
// ============================================================================

/// Engine message number with its facility packed in, e.g. `335544321`.
///
/// # Example
///
/// ```rust
/// use fb_status::{StatusCode, gds};
///
/// let code = StatusCode::new(335544321);
/// assert!(code.is_engine_code());
/// assert_eq!(code.facility(), 0);
/// assert_eq!(code.number(), 1);
/// assert_eq!(code, gds::ARITH_EXCEPT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(StatusWord);

impl StatusCode {
    /// Bits shared by every engine-generated code.
    pub const ISC_MASK: StatusWord = 0x1400_0000;

    const FACILITY_SHIFT: u32 = 16;
    const FACILITY_MASK: StatusWord = 0x1F;
    const NUMBER_MASK: StatusWord = 0x3FFF;

    /// The success code carried by `[ARG_GDS, 0, ARG_END]`.
    pub const SUCCESS: Self = Self(0);

    #[inline]
    pub const fn new(raw: StatusWord) -> Self {
        Self(raw)
    }

    /// Encode a facility/number pair into an engine code.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in const contexts) if the parts do not fit.
    #[inline]
    pub const fn encode(facility: u8, number: u16) -> Self {
        assert!((facility as StatusWord) <= Self::FACILITY_MASK, "facility must fit in 5 bits");
        assert!((number as StatusWord) <= Self::NUMBER_MASK, "number must fit in 14 bits");
        Self(
            Self::ISC_MASK
                | ((facility as StatusWord) << Self::FACILITY_SHIFT)
                | (number as StatusWord),
        )
    }

    #[inline]
    pub const fn raw(self) -> StatusWord {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Whether the ISC mask bits are present.
    #[inline]
    pub const fn is_engine_code(self) -> bool {
        self.0 & Self::ISC_MASK == Self::ISC_MASK
    }

    #[inline]
    pub const fn facility(self) -> u8 {
        ((self.0 >> Self::FACILITY_SHIFT) & Self::FACILITY_MASK) as u8
    }

    #[inline]
    pub const fn number(self) -> u16 {
        (self.0 & Self::NUMBER_MASK) as u16
    }
}

impl From<StatusWord> for StatusCode {
    fn from(raw: StatusWord) -> Self {
        Self(raw)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Well-known engine codes raised by this crate or commonly seen at the boundary.
pub mod gds {
    use crate::define_status_codes;

    define_status_codes! {
        facility 0 => {
            ARITH_EXCEPT = 1,
            BUG_CHECK = 13,
            IO_ERROR = 24,
            SYS_REQUEST = 53,
            UNAVAILABLE = 55,
            RANDOM = 62,
            VIRMEMEXH = 110,
            NETWORK_ERROR = 401,
            NET_READ_ERR = 406,
            NET_WRITE_ERR = 407,
            CANCELLED = 474,
        }
    }
}
