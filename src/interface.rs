//! Abstract status object shared with the native client API.
//!
//! The client's object-oriented API reports failures through a status object
//! that keeps the error part and the warning part of a vector separately.
//! [`StatusInterface`] is that contract; [`LocalStatus`] is the owned
//! implementation used by host code.

use crate::record::ErrorRecord;
use crate::status::{RawStatus, StatusVector};
use std::fmt;

/// Which parts of a status object are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusState(u32);

impl StatusState {
    pub const CLEAN: Self = Self(0);
    pub const WARNINGS: Self = Self(0x01);
    pub const ERRORS: Self = Self(0x02);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_clean(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Status object with separate error and warning vectors.
pub trait StatusInterface {
    /// Reset both parts.
    fn init(&mut self);

    fn state(&self) -> StatusState;

    /// Replace the error part with a copy of `raw`.
    fn set_errors(&mut self, raw: RawStatus<'_>);

    /// Replace the warning part with a copy of `raw`.
    fn set_warnings(&mut self, raw: RawStatus<'_>);

    fn errors(&self) -> RawStatus<'_>;

    fn warnings(&self) -> RawStatus<'_>;

    /// Decode both parts into one record, errors first.
    fn to_record(&self) -> ErrorRecord {
        ErrorRecord::parse(self.errors()).chain(ErrorRecord::parse(self.warnings()))
    }
}

/// Owned status object.
///
/// # Example
///
/// ```rust
/// use fb_status::{LocalStatus, StatusArgs, StatusInterface, StatusState, gds};
///
/// let mut status = LocalStatus::new();
/// status.set_errors(StatusArgs::error(gds::UNAVAILABLE).as_raw());
/// assert!(status.state().contains(StatusState::ERRORS));
///
/// status.init();
/// assert!(status.state().is_clean());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LocalStatus {
    errors: StatusVector,
    warnings: StatusVector,
}

impl LocalStatus {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the error part holds an error code.
    #[inline]
    pub fn has_errors(&self) -> bool {
        self.state().contains(StatusState::ERRORS)
    }
}

impl StatusInterface for LocalStatus {
    fn init(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }

    fn state(&self) -> StatusState {
        let mut state = StatusState::CLEAN;
        if !self.errors.as_raw().is_success() {
            state = state.union(StatusState::ERRORS);
        }
        if !self.warnings.is_empty() {
            state = state.union(StatusState::WARNINGS);
        }
        state
    }

    fn set_errors(&mut self, raw: RawStatus<'_>) {
        self.errors = StatusVector::from_raw(raw);
    }

    fn set_warnings(&mut self, raw: RawStatus<'_>) {
        self.warnings = StatusVector::from_raw(raw);
    }

    fn errors(&self) -> RawStatus<'_> {
        self.errors.as_raw()
    }

    fn warnings(&self) -> RawStatus<'_> {
        self.warnings.as_raw()
    }
}

impl fmt::Debug for LocalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStatus")
            .field("state", &self.state())
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{StatusCode, gds, markers::*};
    use crate::convenience::StatusArgs;

    #[test]
    fn fresh_status_is_clean() {
        let status = LocalStatus::new();
        assert!(status.state().is_clean());
        assert!(status.errors().is_success());
        assert!(status.to_record().entries().is_empty());
    }

    #[test]
    fn errors_and_warnings_are_tracked_separately() {
        let mut status = LocalStatus::new();
        status.set_errors(StatusArgs::error(gds::NETWORK_ERROR).str("db").as_raw());
        status.set_warnings(StatusArgs::new().warning(StatusCode::new(335544808)).as_raw());

        let state = status.state();
        assert!(state.contains(StatusState::ERRORS));
        assert!(state.contains(StatusState::WARNINGS));

        let record = status.to_record();
        assert_eq!(record.primary_code(), Some(gds::NETWORK_ERROR));
        assert_eq!(record.warning_codes().count(), 1);
    }

    #[test]
    fn copies_outlive_the_source() {
        let mut status = LocalStatus::new();
        {
            let strings = vec![String::from("transient")];
            let words = [ARG_GDS, gds::RANDOM.raw(), ARG_STRING, 0, ARG_END];
            status.set_errors(RawStatus::new(&words, &strings));
        }
        assert!(status.to_record().message().contains("transient"));
    }

    #[test]
    fn success_marker_in_error_part_is_not_an_error() {
        let mut status = LocalStatus::new();
        status.set_errors(RawStatus::codes_only(&[ARG_GDS, 0, ARG_END]));
        assert!(!status.has_errors());
    }

    #[test]
    fn init_resets_state() {
        let mut status = LocalStatus::new();
        status.set_errors(StatusArgs::error(gds::BUG_CHECK).as_raw());
        status.init();
        assert_eq!(status.state(), StatusState::CLEAN);
    }
}
