//! Property-based tests for fb_status
//!
//! These tests use proptest to generate status vectors and verify that
//! decoding, re-encoding and rendering behave.

use fb_status::{
    ErrorRecord, Exception, FatalError, FixedStatusBuffer, OsErrorKind, RawStatus, StatusArgs,
    StatusCode, StatusError, StatusException, StatusVector, StatusWord, SystemError, check_status,
    markers::*,
};
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

#[derive(Debug, Clone)]
enum Arg {
    Str(String),
    Num(StatusWord),
    Interpreted(String),
    SqlState(String),
    Os(OsErrorKind, StatusWord),
}

#[derive(Debug, Clone)]
struct Entry {
    code: StatusCode,
    warning: bool,
    args: Vec<Arg>,
}

fn code() -> impl Strategy<Value = StatusCode> {
    prop_oneof![
        (0u8..32, 1u16..0x4000).prop_map(|(f, n)| StatusCode::encode(f, n)),
        (1 as StatusWord..100_000).prop_map(StatusCode::new),
    ]
}

fn os_kind() -> impl Strategy<Value = OsErrorKind> {
    prop_oneof![
        Just(OsErrorKind::Unix),
        Just(OsErrorKind::Win32),
        Just(OsErrorKind::Vms),
        Just(OsErrorKind::Dos),
    ]
}

fn arg() -> impl Strategy<Value = Arg> {
    prop_oneof![
        "\\PC{0,40}".prop_map(Arg::Str),
        any::<i32>().prop_map(|n| Arg::Num(n as StatusWord)),
        "\\PC{0,40}".prop_map(Arg::Interpreted),
        "[0-9A-Z]{5}".prop_map(Arg::SqlState),
        (os_kind(), 0 as StatusWord..10_000).prop_map(|(k, c)| Arg::Os(k, c)),
    ]
}

fn entry() -> impl Strategy<Value = Entry> {
    (code(), any::<bool>(), prop::collection::vec(arg(), 0..4))
        .prop_map(|(code, warning, args)| Entry { code, warning, args })
}

fn build(entries: &[Entry]) -> StatusArgs {
    let mut args = StatusArgs::new();
    for entry in entries {
        args = if entry.warning {
            args.warning(entry.code)
        } else {
            args.gds(entry.code)
        };
        for arg in &entry.args {
            args = match arg {
                Arg::Str(s) => args.str(s),
                Arg::Num(n) => args.num(*n),
                Arg::Interpreted(s) => args.interpreted(s),
                Arg::SqlState(s) => args.sql_state(s),
                Arg::Os(kind, code) => args.os(*kind, *code),
            };
        }
    }
    args
}

// ============================================================================
// DECODING PROPERTIES
// ============================================================================

proptest! {
    /// Decoding, re-encoding and decoding again yields the same record
    #[test]
    fn round_trip_preserves_record(entries in prop::collection::vec(entry(), 0..8)) {
        let args = build(&entries);
        let first = ErrorRecord::parse(args.as_raw());
        let second = first.to_status_vector().to_record();

        prop_assert!(!first.is_truncated());
        prop_assert_eq!(first.errors().collect::<Vec<_>>(), second.errors().collect::<Vec<_>>());
        prop_assert_eq!(first.warnings().collect::<Vec<_>>(), second.warnings().collect::<Vec<_>>());
        prop_assert_eq!(first.entries().len(), entries.len());
    }

    /// A decoded error code is never reported as success, wherever warnings sit
    #[test]
    fn errors_are_never_hidden_by_warnings(entries in prop::collection::vec(entry(), 0..8)) {
        let args = build(&entries);
        let record = ErrorRecord::parse(args.as_raw());
        prop_assert_eq!(check_status(args.as_raw()).is_err(), record.primary_code().is_some());

        let reencoded = record.to_status_vector();
        let (errors, _) = reencoded.as_raw().split_warnings();
        prop_assert_eq!(ErrorRecord::parse(errors).primary_code(), record.primary_code());
    }

    /// Parsing the same vector twice gives equal records and renderings
    #[test]
    fn parsing_is_idempotent(entries in prop::collection::vec(entry(), 1..8)) {
        let args = build(&entries);
        let a = ErrorRecord::parse(args.as_raw());
        let b = ErrorRecord::parse(args.as_raw());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.message(), b.message());
    }

    /// Every prefix of a vector decodes to a prefix of the full record
    #[test]
    fn prefixes_decode_to_partial_records(
        entries in prop::collection::vec(entry(), 1..6),
        cut in any::<prop::sample::Index>(),
    ) {
        let args = build(&entries);
        let raw = args.as_raw();
        let full = ErrorRecord::parse(raw);

        let words = raw.words();
        let len = cut.index(words.len() + 1);
        let partial = ErrorRecord::parse(RawStatus::new(&words[..len], raw.strings()));

        prop_assert!(partial.entries().len() <= full.entries().len());
        for (p, f) in partial.entries().iter().zip(full.entries()) {
            prop_assert_eq!(p.code(), f.code());
            prop_assert!(p.args().len() <= f.args().len());
        }
        if len % 2 == 1 {
            prop_assert!(partial.is_truncated());
        }
    }

    /// Arbitrary words never panic and decode only what the table resolves
    #[test]
    fn arbitrary_words_never_panic(
        words in prop::collection::vec(-4 as StatusWord..24, 0..64),
    ) {
        let strings = ["alpha", "beta", "\u{1F525}"];
        let raw = RawStatus::new(&words, &strings);
        let record = ErrorRecord::parse(raw);
        let copy = StatusVector::from_raw(raw);

        let reparsed = record.to_status_vector().to_record();
        prop_assert_eq!(reparsed.errors().collect::<Vec<_>>(), record.errors().collect::<Vec<_>>());
        prop_assert_eq!(reparsed.warnings().collect::<Vec<_>>(), record.warnings().collect::<Vec<_>>());
        let _ = copy.to_record();
        let _ = record.message();
    }
}

// ============================================================================
// SERIALIZATION PROPERTIES
// ============================================================================

proptest! {
    /// A fixed buffer is never overrun and always terminated
    #[test]
    fn fixed_buffer_never_overruns(
        entries in prop::collection::vec(entry(), 1..8),
        capacity in 0usize..24,
        arena_len in 0usize..128,
    ) {
        let err = StatusError::from_args(build(&entries));
        let mut words = vec![-7 as StatusWord; capacity + 2];
        let mut arena = vec![0u8; arena_len];
        {
            let mut buffer = FixedStatusBuffer::new(&mut words[..capacity], &mut arena);
            let complete = err.serialize_into(&mut buffer);
            prop_assert!(complete || buffer.is_truncated());
            let decoded = ErrorRecord::parse(buffer.as_raw());
            prop_assert!(!decoded.is_truncated());
        }
        if capacity > 0 {
            let end = words[..capacity].iter().position(|w| *w == ARG_END);
            prop_assert!(end.is_some());
        }
        prop_assert_eq!(words[capacity], -7);
        prop_assert_eq!(words[capacity + 1], -7);
    }

    /// Host descriptions exist for every failure and carry the primary code
    #[test]
    fn description_is_total(
        entries in prop::collection::vec(entry(), 0..6),
        message in "\\PC{0,64}",
        errno in 0i32..200,
    ) {
        let cases = [
            Exception::from(StatusError::from_args(build(&entries))),
            Exception::from(SystemError::new("read", errno)),
            Exception::from(FatalError::new(message)),
        ];
        for exception in &cases {
            let description = exception.to_description();
            prop_assert_eq!(Some(description.primary_code), exception.primary_code());
            prop_assert_eq!(description.message.as_str(), exception.describe());
        }
    }
}

// ============================================================================
// LITERAL SCENARIOS
// ============================================================================

#[test]
fn connection_lost_vector() {
    let strings = ["connection lost"];
    let words = [ARG_GDS, 335544321, ARG_STRING, 0, ARG_END];
    let record = ErrorRecord::parse(RawStatus::new(&words, &strings));

    assert_eq!(record.primary_code(), Some(StatusCode::new(335544321)));
    assert_eq!(record.arguments().count(), 1);
    let err = StatusError::from_record(record);
    assert!(err.describe().contains("connection lost"));
}
