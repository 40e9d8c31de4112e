//! Structured diagnostic view of an exception.
//!
//! [`DiagnosticLog`] borrows from the exception that produced it and cannot
//! outlive it. Writing it out does not allocate unless a field has to be
//! truncated, and every field is capped at [`MAX_FIELD_OUTPUT_LEN`] bytes.
//!
//! ```rust
//! # use fb_status::{FatalError, Exception};
//! let err = Exception::from(FatalError::new("lock table corrupted"));
//! err.with_diagnostic_log(|log| {
//!     let mut line = String::new();
//!     log.write_to(&mut line).unwrap();
//!     assert!(line.starts_with("[FatalError] code=335544382 [UNRECOVERABLE]"));
//! });
//! ```

use crate::codes::StatusCode;
use crate::exception::ExceptionKind;
use crate::record::ErrorRecord;
use std::borrow::Cow;
use std::fmt;

/// Maximum length for any individual field in formatted output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Borrowed, structured description of one failure.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticLog<'a> {
    pub kind: ExceptionKind,
    pub primary_code: Option<StatusCode>,
    pub message: &'a str,
    pub syscall: Option<&'static str>,
    pub os_error: Option<i32>,
    pub recoverable: bool,
    pub record: Option<&'a ErrorRecord>,
}

impl<'a> DiagnosticLog<'a> {
    /// Write a single-line structured entry.
    ///
    /// Message lines are joined with ` | ` so the entry stays on one line.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(code) = self.primary_code {
            write!(f, " code={code}")?;
        }
        if !self.recoverable {
            f.write_str(" [UNRECOVERABLE]")?;
        }
        f.write_str(" message='")?;
        for (i, line) in truncate_field(self.message).split('\n').enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(line)?;
        }
        f.write_char('\'')?;

        if let Some(syscall) = self.syscall {
            write!(f, " syscall='{syscall}'")?;
        }
        if let Some(os_error) = self.os_error {
            write!(f, " os_error={os_error}")?;
        }
        if let Some(record) = self.record {
            let mut secondary = record.secondary_codes().peekable();
            if secondary.peek().is_some() {
                f.write_str(" chain=")?;
                for (i, code) in secondary.enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{code}")?;
                }
            }
            if record.is_truncated() {
                f.write_str(" [TRUNCATED_INPUT]")?;
            }
        }
        Ok(())
    }

    /// Level used when forwarding to the `log` facade.
    pub fn level(&self) -> log::Level {
        match self.kind {
            ExceptionKind::LongJump => log::Level::Debug,
            _ if !self.recoverable => log::Level::Error,
            _ => log::Level::Warn,
        }
    }

    /// Forward to the `log` facade.
    pub fn emit(&self) {
        log::log!(target: "fb_status", self.level(), "{self}");
    }

    #[inline]
    pub const fn message(&self) -> &'a str {
        self.message
    }

    #[inline]
    pub const fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

#[inline]
fn truncate_field(s: &str) -> Cow<'_, str> {
    truncate_with_indicator(s, MAX_FIELD_OUTPUT_LEN, TRUNCATION_INDICATOR)
}

impl fmt::Display for DiagnosticLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Cap `s` at `max_len` bytes on a character boundary, ending the cut text
/// with `indicator`. Borrows unless a cut was made.
pub(crate) fn truncate_with_indicator<'s>(
    s: &'s str,
    max_len: usize,
    indicator: &'static str,
) -> Cow<'s, str> {
    if s.len() <= max_len {
        return Cow::Borrowed(s);
    }
    if max_len <= indicator.len() {
        let mut end = max_len;
        while end > 0 && !indicator.is_char_boundary(end) {
            end -= 1;
        }
        return Cow::Borrowed(&indicator[..end]);
    }

    let mut idx = max_len - indicator.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(indicator);
    }

    let mut result = String::with_capacity(idx + indicator.len());
    result.push_str(&s[..idx]);
    result.push_str(indicator);
    Cow::Owned(result)
}
