//! Decoded, owned status records.
//!
//! [`ErrorRecord::parse`] walks a [`RawStatus`] once, resolving string
//! handles against the side-table while only borrowing them. Strings are
//! copied when the record is finalized, so the record never points into a
//! native buffer that the next call may reuse.
//!
//! # Fail-Closed Decoding
//!
//! Decoding stops at the last fully readable entry when it meets:
//! - an entry whose value words run past the slice
//! - an unknown marker
//! - a string handle the side-table cannot resolve
//! - an argument before any code
//!
//! The result is a partial but valid record with [`ErrorRecord::is_truncated`] set.
//!
//! # Memory Hygiene
//!
//! Owned string arguments (paths, SQL fragments, user names) are zeroized
//! when the record drops.

use crate::codes::{ArgKind, OsErrorKind, StatusCode, StatusWord, markers};
use crate::message::{self, MessageCatalog};
use crate::status::{RawEntry, RawStatus, STATUS_LENGTH, StatusSink, StatusVector, resolve_counted};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use zeroize::Zeroize;

/// Whether an entry came from the error part or the warning part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A resolved argument of a status entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusArg {
    Str(Cow<'static, str>),
    Number(StatusWord),
    Interpreted(Cow<'static, str>),
    SqlState(Cow<'static, str>),
    Os { kind: OsErrorKind, code: StatusWord },
}

impl StatusArg {
    /// Text of string-carrying arguments.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Interpreted(s) | Self::SqlState(s) => Some(s.as_ref()),
            Self::Number(_) | Self::Os { .. } => None,
        }
    }

    /// Append this argument to a sink. Static strings are passed by reference.
    pub fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        use markers::*;
        match self {
            Self::Str(s) => push_cow(sink, ARG_STRING, s),
            Self::Interpreted(s) => push_cow(sink, ARG_INTERPRETED, s),
            Self::SqlState(s) => push_cow(sink, ARG_SQL_STATE, s),
            Self::Number(n) => sink.push_word(ARG_NUMBER, *n),
            Self::Os { kind, code } => sink.push_word(kind.marker(), *code),
        }
    }
}

fn push_cow(sink: &mut dyn StatusSink, marker: StatusWord, value: &Cow<'static, str>) -> bool {
    match value {
        Cow::Borrowed(s) => sink.push_static_str(marker, s),
        Cow::Owned(s) => sink.push_str(marker, s),
    }
}

impl fmt::Display for StatusArg {
    /// Numeric OS errors from this platform render with the OS message text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Interpreted(s) | Self::SqlState(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Os { kind, code } => match i32::try_from(*code) {
                Ok(raw) if kind.is_native() => {
                    write!(f, "{}", std::io::Error::from_raw_os_error(raw))
                }
                _ => write!(f, "{} error {}", kind.display_name(), code),
            },
        }
    }
}

impl Zeroize for StatusArg {
    fn zeroize(&mut self) {
        match self {
            Self::Str(s) | Self::Interpreted(s) | Self::SqlState(s) => {
                if let Cow::Owned(owned) = s {
                    owned.zeroize();
                }
            }
            Self::Number(n) => *n = 0,
            Self::Os { code, .. } => *code = 0,
        }
    }
}

/// One code of the chain together with the arguments that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    code: StatusCode,
    severity: Severity,
    args: SmallVec<[StatusArg; 2]>,
}

impl StatusEntry {
    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    #[inline]
    pub fn args(&self) -> &[StatusArg] {
        &self.args
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Argument resolved against the side-table but not yet copied.
enum PendingArg<'a> {
    Str(&'a str),
    Number(StatusWord),
    Interpreted(&'a str),
    SqlState(&'a str),
    Os(OsErrorKind, StatusWord),
}

impl PendingArg<'_> {
    fn into_owned(self) -> StatusArg {
        match self {
            Self::Str(s) => StatusArg::Str(Cow::Owned(s.to_owned())),
            Self::Number(n) => StatusArg::Number(n),
            Self::Interpreted(s) => StatusArg::Interpreted(Cow::Owned(s.to_owned())),
            Self::SqlState(s) => StatusArg::SqlState(Cow::Owned(s.to_owned())),
            Self::Os(kind, code) => StatusArg::Os { kind, code },
        }
    }
}

enum Slot<'a> {
    Code(StatusCode, Severity),
    Arg(PendingArg<'a>),
}

fn pending<'a>(raw: &RawStatus<'a>, entry: &RawEntry<'_>) -> Option<PendingArg<'a>> {
    let strings = raw.strings();
    Some(match entry.kind {
        ArgKind::Str => PendingArg::Str(strings.resolve(entry.value())?),
        ArgKind::CStr => PendingArg::Str(resolve_counted(strings, entry.values)?),
        ArgKind::Interpreted => PendingArg::Interpreted(strings.resolve(entry.value())?),
        ArgKind::SqlState => PendingArg::SqlState(strings.resolve(entry.value())?),
        ArgKind::Number => PendingArg::Number(entry.value()),
        ArgKind::Os(kind) => PendingArg::Os(kind, entry.value()),
        ArgKind::End | ArgKind::Code | ArgKind::Warning => return None,
    })
}

// ============================================================================
// Error Record
// ============================================================================

/// Owned, immutable decoding of one status vector.
///
/// # Example
///
/// ```rust
/// use fb_status::{ErrorRecord, RawStatus, markers::*};
///
/// let strings = ["connection lost"];
/// let words = [ARG_GDS, 335544321, ARG_STRING, 0, ARG_END];
/// let record = ErrorRecord::parse(RawStatus::new(&words, &strings));
///
/// assert_eq!(record.primary_code().map(|c| c.raw()), Some(335544321));
/// assert_eq!(record.arguments().count(), 1);
/// assert!(record.message().contains("connection lost"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ErrorRecord {
    entries: SmallVec<[StatusEntry; 4]>,
    truncated: bool,
}

impl ErrorRecord {
    /// Decode a raw vector. Never reads outside `raw.words()`.
    pub fn parse(raw: RawStatus<'_>) -> Self {
        let mut slots: SmallVec<[Slot<'_>; STATUS_LENGTH]> = SmallVec::new();
        let mut truncated = false;
        let mut open = false;

        let mut entries = raw.entries();
        for entry in entries.by_ref() {
            let slot = match entry.kind {
                ArgKind::Code | ArgKind::Warning if entry.value() == 0 => {
                    open = false;
                    continue;
                }
                ArgKind::Code => Slot::Code(StatusCode::new(entry.value()), Severity::Error),
                ArgKind::Warning => Slot::Code(StatusCode::new(entry.value()), Severity::Warning),
                _ if !open => {
                    truncated = true;
                    break;
                }
                _ => match pending(&raw, &entry) {
                    Some(arg) => Slot::Arg(arg),
                    None => {
                        truncated = true;
                        break;
                    }
                },
            };
            open = true;
            slots.push(slot);
        }
        truncated |= entries.is_truncated();

        Self::finalize(slots, truncated)
    }

    fn finalize(slots: SmallVec<[Slot<'_>; STATUS_LENGTH]>, truncated: bool) -> Self {
        let mut entries: SmallVec<[StatusEntry; 4]> = SmallVec::new();
        for slot in slots {
            match slot {
                Slot::Code(code, severity) => entries.push(StatusEntry {
                    code,
                    severity,
                    args: SmallVec::new(),
                }),
                Slot::Arg(arg) => {
                    if let Some(last) = entries.last_mut() {
                        last.args.push(arg.into_owned());
                    }
                }
            }
        }
        Self { entries, truncated }
    }

    /// No error entries (warnings may still be present).
    #[inline]
    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }

    #[inline]
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Whether decoding stopped early on malformed or cut-off input.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[inline]
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| !e.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_warning())
    }

    /// First error code of the chain.
    #[inline]
    pub fn primary_code(&self) -> Option<StatusCode> {
        self.errors().next().map(StatusEntry::code)
    }

    /// Error codes chained after the primary one.
    pub fn secondary_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.errors().skip(1).map(StatusEntry::code)
    }

    pub fn warning_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.warnings().map(StatusEntry::code)
    }

    /// Arguments of the error part, in order.
    pub fn arguments(&self) -> impl Iterator<Item = &StatusArg> {
        self.errors().flat_map(|e| e.args.iter())
    }

    /// First numeric OS error in the error part.
    pub fn os_error(&self) -> Option<(OsErrorKind, StatusWord)> {
        self.arguments().find_map(|arg| match arg {
            StatusArg::Os { kind, code } => Some((*kind, *code)),
            _ => None,
        })
    }

    /// First SQLSTATE in the error part.
    pub fn sql_state(&self) -> Option<&str> {
        self.arguments().find_map(|arg| match arg {
            StatusArg::SqlState(s) => Some(s.as_ref()),
            _ => None,
        })
    }

    /// Append the record to a sink: every error, then every warning, each part
    /// in decoded order.
    ///
    /// Readers split a vector at its first warning marker, so an error decoded
    /// after a warning still lands in the error part. Returns `false` when the
    /// sink ran out of room; whatever was written is still a whole number of
    /// entries.
    pub fn serialize_into(&self, sink: &mut dyn StatusSink) -> bool {
        for entry in self.errors().chain(self.warnings()) {
            let marker = match entry.severity {
                Severity::Error => markers::ARG_GDS,
                Severity::Warning => markers::ARG_WARNING,
            };
            if !sink.push_word(marker, entry.code.raw()) {
                return false;
            }
            for arg in &entry.args {
                if !arg.serialize_into(sink) {
                    return false;
                }
            }
        }
        true
    }

    pub fn to_status_vector(&self) -> StatusVector {
        let mut vector = StatusVector::new();
        self.serialize_into(&mut vector);
        vector
    }

    /// Render the error part with the given catalog.
    pub fn render(&self, catalog: &dyn MessageCatalog) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = message::write_entries(&mut out, self.errors(), catalog);
        out
    }

    pub fn render_warnings(&self, catalog: &dyn MessageCatalog) -> String {
        let mut out = String::new();
        let _ = message::write_entries(&mut out, self.warnings(), catalog);
        out
    }

    /// Render with the configured catalog.
    #[inline]
    pub fn message(&self) -> String {
        self.render(crate::config::get().catalog())
    }

    /// Concatenate two records, e.g. the error and warning halves of a status object.
    pub(crate) fn chain(mut self, mut tail: ErrorRecord) -> Self {
        self.entries.extend(tail.entries.drain(..));
        self.truncated |= tail.truncated;
        self
    }
}

impl Zeroize for ErrorRecord {
    fn zeroize(&mut self) {
        for entry in self.entries.iter_mut() {
            for arg in entry.args.iter_mut() {
                arg.zeroize();
            }
        }
        self.entries.clear();
    }
}

impl Drop for ErrorRecord {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for ErrorRecord {
    /// Codes only; argument text stays out of debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRecord")
            .field("primary", &self.primary_code())
            .field("secondary", &self.secondary_codes().collect::<SmallVec<[_; 4]>>())
            .field("warnings", &self.warning_codes().collect::<SmallVec<[_; 4]>>())
            .field("arguments", &self.arguments().count())
            .field("truncated", &self.truncated)
            .finish()
    }
}
