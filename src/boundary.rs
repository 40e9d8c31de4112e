//! Translation between native failures and host-visible outcomes.
//!
//! A [`Boundary`] runs native work and guarantees that nothing unwinds past
//! it: errors are serialized into the caller's status object, panics are
//! caught and turned into [`FatalError`]s, and a [`LongJump`] raised at a
//! [`Checkpoint`] ends the call as [`Crossing::Cancelled`].
//!
//! ```text
//!   host ──call──▶ [HostActive → NativeActive] ──f(checkpoint)──▶ native work
//!                                                         │
//!   Crossing ◀──translate── Ok / Err(Exception) / panic ◀─┘
//! ```
//!
//! The inbound direction, a status vector returned by the native library,
//! goes through [`check_status`].
//!
//! [`LongJump`]: crate::LongJump

use crate::codes::{StatusCode, StatusWord, gds, markers};
use crate::exception::{Exception, ExceptionKind, FatalError, LongJump, StatusError};
use crate::interface::{StatusInterface, StatusState};
use crate::record::ErrorRecord;
use crate::status::{FixedStatusBuffer, RawStatus};
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const CANCELLED_TEXT: &str = "operation was cancelled";
const MALFORMED_TEXT: &str = "malformed status vector";

// ============================================================================
// Cancellation
// ============================================================================

/// Host-side handle that asks native work to stop.
///
/// Clones share the flag. The request is observed at the next
/// [`Checkpoint::check`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Cancellation point handed to native work by [`Boundary::call`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint<'t> {
    token: &'t CancellationToken,
}

impl Checkpoint<'_> {
    /// `Err(LongJump)` if cancellation was requested.
    #[inline]
    pub fn check(&self) -> crate::Result<()> {
        if self.token.is_cancelled() {
            Err(LongJump::new().into())
        } else {
            Ok(())
        }
    }

    /// Unwind to the boundary unconditionally.
    #[inline]
    pub fn raise<T>(&self) -> crate::Result<T> {
        Err(LongJump::new().into())
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Everything the host learns about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription {
    pub primary_code: StatusCode,
    pub secondary_codes: Vec<StatusCode>,
    pub warning_codes: Vec<StatusCode>,
    pub message: String,
    /// Set for unrecoverable failures.
    pub fatal: bool,
    pub kind: ExceptionKind,
    pub os_error: Option<i32>,
    pub sql_state: Option<String>,
}

impl ErrorDescription {
    /// Description of a call ended by cancellation.
    pub fn cancelled() -> Self {
        Self {
            primary_code: gds::CANCELLED,
            secondary_codes: Vec::new(),
            warning_codes: Vec::new(),
            message: CANCELLED_TEXT.to_owned(),
            fatal: false,
            kind: ExceptionKind::LongJump,
            os_error: None,
            sql_state: None,
        }
    }
}

impl fmt::Display for ErrorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorDescription {}

impl Exception {
    /// Host-facing description. Total over every variant.
    pub fn to_description(&self) -> ErrorDescription {
        let record = self.to_status_vector().to_record();
        ErrorDescription {
            primary_code: record.primary_code().unwrap_or(gds::RANDOM),
            secondary_codes: record.secondary_codes().collect(),
            warning_codes: record.warning_codes().collect(),
            message: self.describe().to_owned(),
            fatal: !self.is_recoverable(),
            kind: self.kind(),
            os_error: self.os_error(),
            sql_state: record.sql_state().map(str::to_owned),
        }
    }
}

/// Result of one boundary call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crossing<T> {
    Completed(T),
    Failed(ErrorDescription),
    /// The work stopped at a checkpoint after cancellation.
    Cancelled(ErrorDescription),
}

impl<T> Crossing<T> {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn description(&self) -> Option<&ErrorDescription> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(d) | Self::Cancelled(d) => Some(d),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorDescription> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Failed(d) | Self::Cancelled(d) => Err(d),
        }
    }
}

// ============================================================================
// Boundary
// ============================================================================

/// Which side of the boundary currently runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    HostActive,
    NativeActive,
}

struct SideGuard<'b> {
    side: &'b Cell<BoundarySide>,
    previous: BoundarySide,
}

impl Drop for SideGuard<'_> {
    fn drop(&mut self) {
        self.side.set(self.previous);
    }
}

/// Recovery point for native work.
///
/// Not `Sync`: one boundary belongs to one thread. Nested calls are allowed
/// and restore the previous side when they return.
///
/// # Example
///
/// ```rust
/// use fb_status::{Boundary, Crossing, LocalStatus, SystemError};
///
/// let boundary = Boundary::new();
/// let mut status = LocalStatus::new();
///
/// let crossing = boundary.call(&mut status, |checkpoint| {
///     checkpoint.check()?;
///     SystemError::raise::<u32>("open", 2)
/// });
///
/// let Crossing::Failed(description) = crossing else { unreachable!() };
/// assert_eq!(description.os_error, Some(2));
/// assert!(status.has_errors());
/// ```
#[derive(Debug)]
pub struct Boundary {
    side: Cell<BoundarySide>,
    token: CancellationToken,
}

impl Default for Boundary {
    fn default() -> Self {
        Self::new()
    }
}

impl Boundary {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            side: Cell::new(BoundarySide::HostActive),
            token,
        }
    }

    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[inline]
    pub fn side(&self) -> BoundarySide {
        self.side.get()
    }

    fn enter(&self) -> SideGuard<'_> {
        let previous = self.side.replace(BoundarySide::NativeActive);
        SideGuard {
            side: &self.side,
            previous,
        }
    }

    /// Run `f`, catching every failure it produces.
    fn run<T, F>(&self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Checkpoint<'_>) -> crate::Result<T>,
    {
        let _guard = self.enter();
        let checkpoint = Checkpoint { token: &self.token };
        match panic::catch_unwind(AssertUnwindSafe(|| f(&checkpoint))) {
            Ok(result) => result,
            Err(payload) => Err(exception_from_panic(payload)),
        }
    }

    /// Run native work and report its outcome through `status`.
    ///
    /// `status` is reset first. On failure it receives the serialized
    /// exception; on cancellation it receives `isc_cancelled`.
    pub fn call<T, F>(&self, status: &mut dyn StatusInterface, f: F) -> Crossing<T>
    where
        F: FnOnce(&Checkpoint<'_>) -> crate::Result<T>,
    {
        status.init();
        match self.run(f) {
            Ok(value) => Crossing::Completed(value),
            Err(Exception::LongJump(_)) => {
                let words = [markers::ARG_GDS, gds::CANCELLED.raw(), markers::ARG_END];
                status.set_errors(RawStatus::codes_only(&words));
                log::debug!("boundary call cancelled");
                Crossing::Cancelled(ErrorDescription::cancelled())
            }
            Err(exception) => {
                exception.stuff_exception(status);
                log::debug!("boundary call failed with {}", exception.kind());
                Crossing::Failed(exception.to_description())
            }
        }
    }

    /// Run native work writing its outcome into a fixed buffer.
    ///
    /// Returns `0` on success, otherwise the primary code written to the
    /// buffer. Nothing is written past the buffer.
    pub fn call_into<F>(&self, buffer: &mut FixedStatusBuffer<'_>, f: F) -> StatusWord
    where
        F: FnOnce(&Checkpoint<'_>) -> crate::Result<()>,
    {
        use crate::status::StatusSink;

        buffer.clear();
        match self.run(f) {
            Ok(()) => StatusCode::SUCCESS.raw(),
            Err(Exception::LongJump(_)) => {
                buffer.push_word(markers::ARG_GDS, gds::CANCELLED.raw());
                gds::CANCELLED.raw()
            }
            Err(exception) => {
                exception.serialize_into(buffer);
                exception.primary_code().unwrap_or(gds::RANDOM).raw()
            }
        }
    }
}

/// Turn a caught panic payload into an exception.
///
/// An `Exception` payload (`std::panic::panic_any`) is used as is; anything
/// else becomes a recorded [`FatalError`].
fn exception_from_panic(payload: Box<dyn Any + Send>) -> Exception {
    let payload = match payload.downcast::<Exception>() {
        Ok(exception) => return *exception,
        Err(other) => other,
    };
    let text = payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    FatalError::new(format!("Unexpected panic: {text}")).reported()
}

// ============================================================================
// Inbound
// ============================================================================

/// Convert a status vector returned by the native library.
///
/// `Ok(())` for success (including warning-only vectors). A vector that
/// cannot be decoded into an error code is a [`FatalError`].
///
/// ```rust
/// use fb_status::{check_status, RawStatus, markers::*};
///
/// let strings = ["connection lost"];
/// let words = [ARG_GDS, 335544321, ARG_STRING, 0, ARG_END];
/// let err = check_status(RawStatus::new(&words, &strings)).unwrap_err();
/// assert!(err.describe().contains("connection lost"));
///
/// assert!(check_status(RawStatus::codes_only(&[ARG_GDS, 0, ARG_END])).is_ok());
/// ```
pub fn check_status(raw: RawStatus<'_>) -> crate::Result<()> {
    if raw.is_success() {
        return Ok(());
    }
    let record = ErrorRecord::parse(raw);
    if record.is_success() {
        return FatalError::raise(MALFORMED_TEXT);
    }
    StatusError::raise_record(record)
}

/// Convert a status object filled by the native library.
pub fn check_status_interface(status: &dyn StatusInterface) -> crate::Result<()> {
    if status.state().contains(StatusState::ERRORS) {
        Err(StatusError::from_interface(status).into())
    } else {
        Ok(())
    }
}

// ============================================================================
// Blocking Pool
// ============================================================================

/// Run a boundary call on tokio's blocking pool.
///
/// Returns the status object together with the outcome.
#[cfg(feature = "tokio")]
pub async fn call_blocking<T, F>(
    token: CancellationToken,
    f: F,
) -> (crate::interface::LocalStatus, Crossing<T>)
where
    T: Send + 'static,
    F: FnOnce(&Checkpoint<'_>) -> crate::Result<T> + Send + 'static,
{
    use crate::interface::LocalStatus;

    let joined = tokio::task::spawn_blocking(move || {
        let boundary = Boundary::with_token(token);
        let mut status = LocalStatus::new();
        let crossing = boundary.call(&mut status, f);
        (status, crossing)
    })
    .await;

    match joined {
        Ok(outcome) => outcome,
        Err(join_error) => {
            let exception = Exception::Fatal(FatalError::new(format!(
                "blocking boundary task failed: {join_error}"
            )));
            let mut status = LocalStatus::new();
            exception.stuff_exception(&mut status);
            (status, Crossing::Failed(exception.to_description()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::markers::*;
    use crate::convenience::StatusArgs;
    use crate::exception::BadAllocation;
    use crate::interface::LocalStatus;

    #[test]
    fn side_switches_during_call() {
        let boundary = Boundary::new();
        let mut status = LocalStatus::new();
        let inside = boundary.call(&mut status, |_| Ok(boundary.side()));
        assert_eq!(inside, Crossing::Completed(BoundarySide::NativeActive));
        assert_eq!(boundary.side(), BoundarySide::HostActive);
    }

    #[test]
    fn side_restored_after_panic() {
        let boundary = Boundary::new();
        let mut status = LocalStatus::new();
        let crossing: Crossing<()> = boundary.call(&mut status, |_| panic!("native crash"));
        assert!(matches!(crossing, Crossing::Failed(_)));
        assert_eq!(boundary.side(), BoundarySide::HostActive);
    }

    #[test]
    fn cancelled_call_sets_cancelled_status() {
        let boundary = Boundary::new();
        boundary.token().cancel();
        let mut status = LocalStatus::new();
        let crossing: Crossing<()> = boundary.call(&mut status, |cp| {
            cp.check()?;
            Ok(())
        });
        assert!(crossing.is_cancelled());
        assert_eq!(status.to_record().primary_code(), Some(gds::CANCELLED));
    }

    #[test]
    fn success_clears_stale_status() {
        let boundary = Boundary::new();
        let mut status = LocalStatus::new();
        status.set_errors(StatusArgs::error(gds::BUG_CHECK).as_raw());
        let crossing = boundary.call(&mut status, |_| Ok(7));
        assert_eq!(crossing.into_result(), Ok(7));
        assert!(status.state().is_clean());
    }

    #[test]
    fn call_into_returns_primary_code() {
        let boundary = Boundary::new();
        let mut words = [0 as StatusWord; 8];
        let mut arena = [0u8; 32];
        let mut buffer = FixedStatusBuffer::new(&mut words, &mut arena);

        let code = boundary.call_into(&mut buffer, |_| BadAllocation::raise());
        assert_eq!(code, gds::VIRMEMEXH.raw());
        assert_eq!(buffer.words(), &[ARG_GDS, gds::VIRMEMEXH.raw()]);

        let code = boundary.call_into(&mut buffer, |_| Ok(()));
        assert_eq!(code, 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn description_is_total() {
        let cases = [
            Exception::from(BadAllocation),
            Exception::from(FatalError::new("x")),
            Exception::from(StatusError::from_args(StatusArgs::error(gds::UNAVAILABLE))),
        ];
        for exception in &cases {
            let description = exception.to_description();
            assert!(!description.message.is_empty());
            assert_eq!(Some(description.primary_code), exception.primary_code());
        }
    }

    #[test]
    fn check_status_rejects_malformed_vectors() {
        let err = check_status(RawStatus::codes_only(&[ARG_NUMBER, 3, ARG_END])).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::Fatal);
        assert_eq!(err.describe(), MALFORMED_TEXT);
    }

    #[test]
    fn check_status_accepts_warnings_only() {
        let words = [ARG_WARNING, 335544808, ARG_END];
        assert!(check_status(RawStatus::codes_only(&words)).is_ok());
    }

    #[test]
    fn check_status_interface_uses_error_state() {
        let mut status = LocalStatus::new();
        assert!(check_status_interface(&status).is_ok());
        status.set_errors(StatusArgs::error(gds::NET_WRITE_ERR).as_raw());
        let err = check_status_interface(&status).unwrap_err();
        assert_eq!(err.primary_code(), Some(gds::NET_WRITE_ERR));
    }
}
