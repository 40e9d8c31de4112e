//! The closed set of failures that can cross the boundary.
//!
//! Every variant implements [`StatusException`]: it can write itself into a
//! status sink and describe itself without allocating. [`Exception`] is the
//! tagged union that the rest of the crate passes around inside `Result`.
//!
//! | Variant | Recoverable | Status written |
//! |---------|-------------|----------------|
//! | [`LongJump`] | control flow | `isc_random "Unexpected LongJump"` |
//! | [`BadAllocation`] | no | `isc_virmemexh` |
//! | [`StatusError`] | yes | its record |
//! | [`SystemError`] | yes | `isc_sys_request <syscall> <os error>` |
//! | [`SystemCallFailed`] | no | as `SystemError` |
//! | [`FatalError`] | no | `isc_random <message>` |
//!
//! # Raising
//!
//! `raise` constructors return `Err(Exception)` so callers propagate with `?`.
//! Unrecoverable variants are written to the failure journal and the `log`
//! facade when raised. A [`SystemCallFailed`] aborts the process after that
//! when the configuration asks for diagnostic builds.

use crate::codes::{OsErrorKind, StatusCode, StatusWord, gds, markers};
use crate::config;
use crate::convenience::StatusArgs;
use crate::interface::StatusInterface;
use crate::journal;
use crate::logging::DiagnosticLog;
use crate::record::ErrorRecord;
use crate::status::{RawStatus, StatusSink, StatusVector};
use std::collections::TryReserveError;
use std::fmt;
use std::io;
use zeroize::Zeroize;

/// Capability shared by every failure variant.
pub trait StatusException {
    /// Append this failure to `sink`. Returns `false` if the sink ran out of room.
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool;

    /// Human-readable text owned by the variant or static.
    fn describe(&self) -> &str;

    fn is_recoverable(&self) -> bool;

    fn kind(&self) -> ExceptionKind;
}

/// Discriminant of [`Exception`], usable without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    LongJump,
    BadAllocation,
    Status,
    System,
    SystemCallFailed,
    Fatal,
}

impl ExceptionKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::LongJump => "LongJump",
            Self::BadAllocation => "BadAllocation",
            Self::Status => "StatusError",
            Self::System => "SystemError",
            Self::SystemCallFailed => "SystemCallFailed",
            Self::Fatal => "FatalError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// LongJump
// ============================================================================

const LONG_JUMP_TEXT: &str = "Unexpected LongJump";

/// Request to unwind to the enclosing boundary call.
///
/// Only a [`Checkpoint`](crate::Checkpoint) creates one, so every `LongJump`
/// has a boundary call waiting for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongJump {
    _private: (),
}

impl LongJump {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

impl StatusException for LongJump {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        sink.push_word(markers::ARG_GDS, gds::RANDOM.raw())
            && sink.push_static_str(markers::ARG_STRING, LONG_JUMP_TEXT)
    }

    fn describe(&self) -> &str {
        LONG_JUMP_TEXT
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::LongJump
    }
}

// ============================================================================
// BadAllocation
// ============================================================================

const BAD_ALLOCATION_TEXT: &str = "unable to allocate memory from operating system";

/// Memory exhaustion. Carries nothing, so it can be built and reported
/// while the allocator is failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadAllocation;

impl BadAllocation {
    #[inline]
    pub fn raise<T>() -> crate::Result<T> {
        Err(Exception::BadAllocation(Self))
    }
}

impl StatusException for BadAllocation {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        sink.push_word(markers::ARG_GDS, gds::VIRMEMEXH.raw())
    }

    fn describe(&self) -> &str {
        BAD_ALLOCATION_TEXT
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::BadAllocation
    }
}

// ============================================================================
// StatusError
// ============================================================================

const EMPTY_STATUS_TEXT: &str = "status error raised without an error code";

/// A failure described by a status vector.
///
/// The three construction paths ([`from_raw`](Self::from_raw),
/// [`from_args`](Self::from_args), [`from_interface`](Self::from_interface))
/// all end in one owned [`ErrorRecord`]. The message is rendered once, with
/// the configured catalog, when the error is built.
#[derive(Clone, PartialEq, Eq)]
pub struct StatusError {
    record: ErrorRecord,
    message: String,
}

impl StatusError {
    /// Wrap a decoded record.
    ///
    /// A record without an error code still has to read as a failure, so it
    /// gets an `isc_random` entry in front of whatever warnings it carried.
    pub fn from_record(record: ErrorRecord) -> Self {
        let record = if record.is_success() {
            let args = StatusArgs::error(gds::RANDOM)
                .static_str(EMPTY_STATUS_TEXT)
                .append(&record);
            ErrorRecord::parse(args.as_raw())
        } else {
            record
        };
        let message = record.message();
        Self { record, message }
    }

    pub fn from_raw(raw: RawStatus<'_>) -> Self {
        Self::from_record(ErrorRecord::parse(raw))
    }

    pub fn from_args(args: StatusArgs) -> Self {
        Self::from_raw(args.as_raw())
    }

    /// Copy errors and warnings out of a status object.
    pub fn from_interface(status: &dyn StatusInterface) -> Self {
        Self::from_record(status.to_record())
    }

    pub fn raise<T>(raw: RawStatus<'_>) -> crate::Result<T> {
        Err(Self::from_raw(raw).into())
    }

    pub fn raise_record<T>(record: ErrorRecord) -> crate::Result<T> {
        Err(Self::from_record(record).into())
    }

    #[inline]
    pub fn record(&self) -> &ErrorRecord {
        &self.record
    }

    #[inline]
    pub fn primary_code(&self) -> Option<StatusCode> {
        self.record.primary_code()
    }
}

impl StatusException for StatusError {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        self.record.serialize_into(sink)
    }

    fn describe(&self) -> &str {
        &self.message
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::Status
    }
}

impl Drop for StatusError {
    fn drop(&mut self) {
        self.message.zeroize();
    }
}

impl fmt::Debug for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusError")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SystemError
// ============================================================================

/// A failed operating system call that the caller may handle.
///
/// The syscall name must be a string literal; the type system rejects
/// anything shorter-lived:
///
/// ```rust,compile_fail
/// use fb_status::SystemError;
/// let name = String::from("open");
/// let _ = SystemError::new(&name, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemError {
    status: StatusError,
    syscall: &'static str,
    error_code: i32,
}

impl SystemError {
    /// `[isc_sys_request, syscall, <native os error>]`.
    pub fn new(syscall: &'static str, error_code: i32) -> Self {
        Self::build(syscall, None, error_code)
    }

    /// As [`new`](Self::new), followed by an `isc_random` entry carrying `arg`.
    pub fn with_arg(syscall: &'static str, arg: &str, error_code: i32) -> Self {
        Self::build(syscall, Some(arg), error_code)
    }

    fn build(syscall: &'static str, arg: Option<&str>, error_code: i32) -> Self {
        let mut args = StatusArgs::error(gds::SYS_REQUEST)
            .static_str(syscall)
            .os(OsErrorKind::NATIVE, error_code as StatusWord);
        if let Some(arg) = arg {
            args = args.gds(gds::RANDOM).str(arg);
        }
        Self {
            status: StatusError::from_args(args),
            syscall,
            error_code,
        }
    }

    pub fn raise<T>(syscall: &'static str, error_code: i32) -> crate::Result<T> {
        Err(Self::new(syscall, error_code).into())
    }

    /// Raise with the calling thread's last OS error.
    pub fn raise_last<T>(syscall: &'static str) -> crate::Result<T> {
        Self::raise(syscall, Self::last_os_error())
    }

    /// The calling thread's last OS error (`errno` or `GetLastError()`).
    pub fn last_os_error() -> i32 {
        io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    #[inline]
    pub fn syscall(&self) -> &'static str {
        self.syscall
    }

    #[inline]
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    #[inline]
    pub fn record(&self) -> &ErrorRecord {
        self.status.record()
    }
}

impl StatusException for SystemError {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        self.status.serialize_into(sink)
    }

    fn describe(&self) -> &str {
        self.status.describe()
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::System
    }
}

// ============================================================================
// SystemCallFailed
// ============================================================================

/// A failed operating system call that cannot be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCallFailed {
    inner: SystemError,
}

impl SystemCallFailed {
    pub fn new(syscall: &'static str, error_code: i32) -> Self {
        Self {
            inner: SystemError::new(syscall, error_code),
        }
    }

    /// Record and raise.
    ///
    /// With `diagnostic_build` set the process aborts after recording, so a
    /// core dump captures the state.
    pub fn raise<T>(syscall: &'static str, error_code: i32) -> crate::Result<T> {
        Self::new(syscall, error_code).fail()
    }

    pub fn raise_last<T>(syscall: &'static str) -> crate::Result<T> {
        Self::raise(syscall, SystemError::last_os_error())
    }

    /// As [`new`](Self::new), with an extra argument (a path, a handle name).
    pub fn with_arg(syscall: &'static str, arg: &str, error_code: i32) -> Self {
        Self {
            inner: SystemError::with_arg(syscall, arg, error_code),
        }
    }

    /// Raise with the last OS error and an extra argument.
    pub fn raise_with_arg<T>(syscall: &'static str, arg: &str) -> crate::Result<T> {
        Self::raise_with_arg_code(syscall, arg, SystemError::last_os_error())
    }

    /// Raise with an extra argument and an error code the caller already holds.
    pub fn raise_with_arg_code<T>(
        syscall: &'static str,
        arg: &str,
        error_code: i32,
    ) -> crate::Result<T> {
        Self::with_arg(syscall, arg, error_code).fail()
    }

    fn fail<T>(self) -> crate::Result<T> {
        let syscall = self.inner.syscall;
        let exception = Exception::SystemCallFailed(self);
        report(&exception);
        if config::get().diagnostic_build() {
            log::error!("aborting after failed system call {syscall}");
            std::process::abort();
        }
        Err(exception)
    }

    #[inline]
    pub fn syscall(&self) -> &'static str {
        self.inner.syscall()
    }

    #[inline]
    pub fn error_code(&self) -> i32 {
        self.inner.error_code()
    }

    #[inline]
    pub fn record(&self) -> &ErrorRecord {
        self.inner.record()
    }
}

impl StatusException for SystemCallFailed {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        self.inner.serialize_into(sink)
    }

    fn describe(&self) -> &str {
        self.inner.describe()
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::SystemCallFailed
    }
}

// ============================================================================
// FatalError
// ============================================================================

/// An unrecoverable failure with a preformatted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    message: String,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Record and raise.
    pub fn raise<T>(message: &str) -> crate::Result<T> {
        Self::new(message).fail()
    }

    /// Render `args` now and raise. See also [`fatal_error!`](crate::fatal_error).
    pub fn raise_fmt<T>(args: fmt::Arguments<'_>) -> crate::Result<T> {
        Self::new(fmt::format(args)).fail()
    }

    fn fail<T>(self) -> crate::Result<T> {
        Err(self.reported())
    }

    /// Wrap, then record to the journal and the log.
    pub(crate) fn reported(self) -> Exception {
        let exception = Exception::Fatal(self);
        report(&exception);
        exception
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl StatusException for FatalError {
    fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        sink.push_word(markers::ARG_GDS, gds::RANDOM.raw())
            && sink.push_str(markers::ARG_STRING, &self.message)
    }

    fn describe(&self) -> &str {
        &self.message
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn kind(&self) -> ExceptionKind {
        ExceptionKind::Fatal
    }
}

fn report(exception: &Exception) {
    journal::global().record(exception);
    exception.diagnostic_log().emit();
}

// ============================================================================
// Exception
// ============================================================================

/// Any failure of this crate.
///
/// # Example
///
/// ```rust
/// use fb_status::{Exception, LocalStatus, StatusInterface, SystemError, gds};
///
/// let err = SystemError::raise::<()>("open", 2).unwrap_err();
/// assert!(err.is_recoverable());
///
/// let mut status = LocalStatus::new();
/// err.stuff_exception(&mut status);
/// assert_eq!(status.to_record().primary_code(), Some(gds::SYS_REQUEST));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    LongJump(LongJump),
    BadAllocation(BadAllocation),
    Status(StatusError),
    System(SystemError),
    SystemCallFailed(SystemCallFailed),
    Fatal(FatalError),
}

impl Exception {
    #[inline]
    pub fn as_status_exception(&self) -> &dyn StatusException {
        match self {
            Self::LongJump(e) => e,
            Self::BadAllocation(e) => e,
            Self::Status(e) => e,
            Self::System(e) => e,
            Self::SystemCallFailed(e) => e,
            Self::Fatal(e) => e,
        }
    }

    #[inline]
    pub fn kind(&self) -> ExceptionKind {
        self.as_status_exception().kind()
    }

    #[inline]
    pub fn describe(&self) -> &str {
        self.as_status_exception().describe()
    }

    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.as_status_exception().is_recoverable()
    }

    #[inline]
    pub fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        self.as_status_exception().serialize_into(sink)
    }

    pub fn to_status_vector(&self) -> StatusVector {
        let mut vector = StatusVector::new();
        self.serialize_into(&mut vector);
        vector
    }

    /// The decoded record, for variants that carry one.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Status(e) => Some(e.record()),
            Self::System(e) => Some(e.record()),
            Self::SystemCallFailed(e) => Some(e.record()),
            Self::LongJump(_) | Self::BadAllocation(_) | Self::Fatal(_) => None,
        }
    }

    /// OS error of the system variants.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Self::System(e) => Some(e.error_code()),
            Self::SystemCallFailed(e) => Some(e.error_code()),
            _ => None,
        }
    }

    /// Write this failure into a status object, errors and warnings split.
    pub fn stuff_exception(&self, status: &mut dyn StatusInterface) {
        let vector = self.to_status_vector();
        let (errors, warnings) = vector.as_raw().split_warnings();
        status.init();
        status.set_errors(errors);
        if !warnings.words().is_empty() {
            status.set_warnings(warnings);
        }
    }

    /// Structured view for logging. Borrows from the exception.
    pub fn diagnostic_log(&self) -> DiagnosticLog<'_> {
        let (syscall, record) = match self {
            Self::System(e) => (Some(e.syscall()), Some(e.record())),
            Self::SystemCallFailed(e) => (Some(e.syscall()), Some(e.record())),
            Self::Status(e) => (None, Some(e.record())),
            _ => (None, None),
        };
        DiagnosticLog {
            kind: self.kind(),
            primary_code: self.primary_code(),
            message: self.describe(),
            syscall,
            os_error: self.os_error(),
            recoverable: self.is_recoverable(),
            record,
        }
    }

    /// Run `f` with the diagnostic view; the view cannot escape.
    pub fn with_diagnostic_log<R>(&self, f: impl FnOnce(&DiagnosticLog<'_>) -> R) -> R {
        f(&self.diagnostic_log())
    }

    /// Primary code as it would be serialized.
    pub fn primary_code(&self) -> Option<StatusCode> {
        match self {
            Self::LongJump(_) | Self::Fatal(_) => Some(gds::RANDOM),
            Self::BadAllocation(_) => Some(gds::VIRMEMEXH),
            _ => self.record().and_then(ErrorRecord::primary_code),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl std::error::Error for Exception {}

impl From<LongJump> for Exception {
    fn from(e: LongJump) -> Self {
        Self::LongJump(e)
    }
}

impl From<BadAllocation> for Exception {
    fn from(e: BadAllocation) -> Self {
        Self::BadAllocation(e)
    }
}

impl From<StatusError> for Exception {
    fn from(e: StatusError) -> Self {
        Self::Status(e)
    }
}

impl From<SystemError> for Exception {
    fn from(e: SystemError) -> Self {
        Self::System(e)
    }
}

impl From<SystemCallFailed> for Exception {
    fn from(e: SystemCallFailed) -> Self {
        Self::SystemCallFailed(e)
    }
}

impl From<FatalError> for Exception {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

impl From<TryReserveError> for Exception {
    fn from(_: TryReserveError) -> Self {
        Self::BadAllocation(BadAllocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{LocalStatus, StatusState};
    use crate::status::FixedStatusBuffer;
    use markers::*;

    const ENOENT: i32 = 2;

    #[test]
    fn long_jump_serializes_as_random() {
        let vector = Exception::from(LongJump::new()).to_status_vector();
        let record = vector.to_record();
        assert_eq!(record.primary_code(), Some(gds::RANDOM));
        assert!(record.message().contains("Unexpected LongJump"));
    }

    #[test]
    fn bad_allocation_is_a_single_code() {
        let vector = Exception::from(BadAllocation).to_status_vector();
        assert_eq!(vector.words(), &[ARG_GDS, gds::VIRMEMEXH.raw()]);
        assert!(!BadAllocation.is_recoverable());
    }

    #[test]
    fn status_error_paths_converge() {
        let args = StatusArgs::error(gds::NETWORK_ERROR).str("db.example.org");
        let strings = ["db.example.org"];
        let words = [ARG_GDS, gds::NETWORK_ERROR.raw(), ARG_STRING, 0, ARG_END];
        let mut status = LocalStatus::new();
        status.set_errors(RawStatus::new(&words, &strings));

        let from_args = StatusError::from_args(args);
        let from_raw = StatusError::from_raw(RawStatus::new(&words, &strings));
        let from_interface = StatusError::from_interface(&status);

        assert_eq!(from_args, from_raw);
        assert_eq!(from_raw, from_interface);
        assert!(from_args.describe().contains("db.example.org"));
    }

    #[test]
    fn empty_status_error_still_fails() {
        let err = StatusError::from_raw(RawStatus::codes_only(&[ARG_GDS, 0, ARG_END]));
        assert_eq!(err.primary_code(), Some(gds::RANDOM));
        assert!(err.describe().contains("without an error code"));
    }

    #[test]
    fn system_error_keeps_code_and_syscall() {
        let Err(Exception::System(err)) = SystemError::raise::<()>("open", ENOENT) else {
            panic!("expected a system error");
        };
        assert_eq!(err.error_code(), ENOENT);
        assert_eq!(err.syscall(), "open");
        assert!(err.describe().contains("open"));
        assert_eq!(err.record().os_error(), Some((OsErrorKind::NATIVE, ENOENT as StatusWord)));
    }

    #[test]
    fn system_error_with_arg_chains_random() {
        let err = SystemError::with_arg("fcntl", "/db/lock", 13);
        let codes: Vec<_> = err.record().secondary_codes().collect();
        assert_eq!(codes, vec![gds::RANDOM]);
        assert!(err.describe().contains("/db/lock"));
    }

    #[test]
    fn fatal_error_is_recorded_and_unrecoverable() {
        let err = FatalError::raise::<()>("lock table corrupted").unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(err.kind(), ExceptionKind::Fatal);
        let recorded = journal::global().get_filtered(|e| e.message.as_ref() == "lock table corrupted");
        assert!(!recorded.is_empty());
    }

    #[test]
    fn system_call_failed_without_diagnostic_build_returns() {
        if config::get().diagnostic_build() {
            return;
        }
        let err = SystemCallFailed::raise::<()>("mmap", 12).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::SystemCallFailed);
        assert_eq!(err.os_error(), Some(12));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn system_call_failed_keeps_caller_error_code_with_arg() {
        if config::get().diagnostic_build() {
            return;
        }
        let err = SystemCallFailed::raise_with_arg_code::<()>("open", "/db/missing.fdb", ENOENT)
            .unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::SystemCallFailed);
        assert_eq!(err.os_error(), Some(ENOENT));
        assert!(err.describe().contains("/db/missing.fdb"));

        let record = err.record().expect("system variants carry a record");
        assert_eq!(record.primary_code(), Some(gds::SYS_REQUEST));
        assert_eq!(record.secondary_codes().collect::<Vec<_>>(), vec![gds::RANDOM]);
        assert_eq!(record.os_error(), Some((OsErrorKind::NATIVE, ENOENT as StatusWord)));
    }

    #[test]
    fn stuff_exception_splits_warnings() {
        let args = StatusArgs::error(gds::UNAVAILABLE).warning(StatusCode::new(335544808)).num(1);
        let err = Exception::from(StatusError::from_args(args));
        let mut status = LocalStatus::new();
        err.stuff_exception(&mut status);
        let state = status.state();
        assert!(state.contains(StatusState::ERRORS));
        assert!(state.contains(StatusState::WARNINGS));
        assert_eq!(status.errors().words(), &[ARG_GDS, gds::UNAVAILABLE.raw()]);
    }

    #[test]
    fn stuff_exception_replaces_previous_contents() {
        let mut status = LocalStatus::new();
        status.set_warnings(StatusArgs::new().warning(StatusCode::new(1)).as_raw());
        Exception::from(BadAllocation).stuff_exception(&mut status);
        assert_eq!(status.state(), StatusState::ERRORS);
    }

    #[test]
    fn full_fixed_buffer_cuts_at_entry_boundary() {
        let err = FatalError::new("x".repeat(10));
        let mut words = [0 as StatusWord; 3];
        let mut arena = [0u8; 4];
        let mut buffer = FixedStatusBuffer::new(&mut words, &mut arena);
        assert!(!err.serialize_into(&mut buffer));
        assert_eq!(buffer.words(), &[ARG_GDS, gds::RANDOM.raw()]);
        drop(buffer);
        assert_eq!(words[2], ARG_END);
    }

    #[test]
    fn try_reserve_failure_becomes_bad_allocation() {
        let mut v: Vec<u8> = Vec::new();
        let err: Exception = v.try_reserve(usize::MAX).unwrap_err().into();
        assert_eq!(err.kind(), ExceptionKind::BadAllocation);
    }

    #[test]
    fn display_matches_describe() {
        let err = Exception::from(FatalError::new("boom"));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ExceptionKind::SystemCallFailed.to_string(), "SystemCallFailed");
    }
}
