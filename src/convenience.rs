//! Builders and macros for raising status errors.
//!
//! # Usage
//!
//! ```rust
//! use fb_status::{StatusArgs, gds, Exception};
//!
//! fn open_database(path: &str) -> fb_status::Result<()> {
//!     StatusArgs::new()
//!         .gds(gds::IO_ERROR)
//!         .static_str("open")
//!         .str(path)
//!         .gds(gds::UNAVAILABLE)
//!         .raise()
//! }
//!
//! let err = open_database("/db/employee.fdb").unwrap_err();
//! assert!(matches!(err, Exception::Status(_)));
//! assert_eq!(err.record().and_then(|r| r.primary_code()), Some(gds::IO_ERROR));
//! ```
//!
//! Code tables are declared with [`define_status_codes!`]; eagerly formatted
//! fatal errors with [`fatal_error!`].

use crate::codes::{OsErrorKind, StatusCode, StatusWord, markers};
use crate::exception::StatusError;
use crate::record::ErrorRecord;
use crate::status::{RawStatus, StatusSink, StatusVector};

// ============================================================================
// Argument Builder
// ============================================================================

/// Structured argument list that builds a status vector entry by entry.
///
/// Each method appends one marker/value pair. Static strings are kept by
/// reference; borrowed strings are copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusArgs {
    vector: StatusVector,
}

impl StatusArgs {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an error code.
    #[inline]
    pub fn error(code: StatusCode) -> Self {
        Self::new().gds(code)
    }

    pub fn gds(mut self, code: StatusCode) -> Self {
        self.vector.push_word(markers::ARG_GDS, code.raw());
        self
    }

    pub fn warning(mut self, code: StatusCode) -> Self {
        self.vector.push_word(markers::ARG_WARNING, code.raw());
        self
    }

    pub fn str(mut self, value: &str) -> Self {
        self.vector.push_str(markers::ARG_STRING, value);
        self
    }

    pub fn static_str(mut self, value: &'static str) -> Self {
        self.vector.push_static_str(markers::ARG_STRING, value);
        self
    }

    pub fn num(mut self, value: StatusWord) -> Self {
        self.vector.push_word(markers::ARG_NUMBER, value);
        self
    }

    /// Pre-formatted text that replaces the catalog lookup for its entry.
    pub fn interpreted(mut self, text: &str) -> Self {
        self.vector.push_str(markers::ARG_INTERPRETED, text);
        self
    }

    pub fn sql_state(mut self, state: &str) -> Self {
        self.vector.push_str(markers::ARG_SQL_STATE, state);
        self
    }

    pub fn os(mut self, kind: OsErrorKind, code: StatusWord) -> Self {
        self.vector.push_word(kind.marker(), code);
        self
    }

    /// OS error code of the platform this crate runs on.
    #[inline]
    pub fn native_os(self, code: StatusWord) -> Self {
        self.os(OsErrorKind::NATIVE, code)
    }

    /// Chain the entries of an already decoded record.
    pub fn append(mut self, record: &ErrorRecord) -> Self {
        record.serialize_into(&mut self.vector);
        self
    }

    /// Chain the entries of a raw vector.
    pub fn append_raw(mut self, raw: RawStatus<'_>) -> Self {
        self.vector.append_raw(raw);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    #[inline]
    pub fn as_raw(&self) -> RawStatus<'_> {
        self.vector.as_raw()
    }

    #[inline]
    pub fn into_vector(self) -> StatusVector {
        self.vector
    }

    /// Wrap the list in a [`StatusError`] and return it as the error.
    pub fn raise<T>(self) -> crate::Result<T> {
        Err(StatusError::from_args(self).into())
    }
}

impl From<StatusArgs> for StatusVector {
    fn from(args: StatusArgs) -> Self {
        args.vector
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Raise a [`FatalError`](crate::FatalError) with an eagerly formatted message.
///
/// Expands to a `Result<T>` so it can be returned or propagated with `?`.
///
/// ```rust
/// # use fb_status::fatal_error;
/// fn attach(handle: u32) -> fb_status::Result<()> {
///     if handle == 0 {
///         return fatal_error!("invalid attachment handle {}", handle);
///     }
///     Ok(())
/// }
/// let err = attach(0).unwrap_err();
/// assert_eq!(err.to_string(), "invalid attachment handle 0");
/// ```
#[macro_export]
macro_rules! fatal_error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::FatalError::raise_fmt(::std::format_args!($fmt $(, $arg)*))
    };
}

/// Define one engine status code from its facility and number.
///
/// ```rust
/// # use fb_status::define_status_code;
/// define_status_code!(LOCK_CONFLICT, 0, 25);
/// assert_eq!(LOCK_CONFLICT.raw(), 335544345);
/// ```
#[macro_export]
macro_rules! define_status_code {
    ($name:ident, $facility:expr, $number:expr) => {
        pub const $name: $crate::StatusCode = $crate::StatusCode::encode($facility, $number);
    };
}

/// Define several status codes of the same facility.
///
/// ```rust
/// # use fb_status::define_status_codes;
/// define_status_codes! {
///     facility 13 => {
///         DSQL_ERROR = 1,
///         DSQL_COMMAND_ERR = 2,
///     }
/// }
/// assert_eq!(DSQL_COMMAND_ERR.facility(), 13);
/// ```
#[macro_export]
macro_rules! define_status_codes {
    (facility $facility:expr => { $( $name:ident = $number:expr ),+ $(,)? }) => {
        $(
            $crate::define_status_code!($name, $facility, $number);
        )+
    };
}
