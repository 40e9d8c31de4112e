#![no_main]

use fb_status::{ErrorRecord, RawStatus, StatusVector, StatusWord, check_status};
use libfuzzer_sys::fuzz_target;

const STRINGS: [&str; 4] = ["", "connection lost", "/var/lib/db/employee.fdb", "\u{1F525}"];

fuzz_target!(|data: &[u8]| {
    // Small words hit the markers and string indices far more often.
    let words: Vec<StatusWord> = data.iter().map(|b| (*b as i8) as StatusWord).collect();
    let raw = RawStatus::new(&words, &STRINGS);

    let record = ErrorRecord::parse(raw);
    let reparsed = record.to_status_vector().to_record();
    assert!(record.errors().eq(reparsed.errors()));
    assert!(record.warnings().eq(reparsed.warnings()));

    let _ = record.message();
    let _ = StatusVector::from_raw(raw);

    if let Err(err) = check_status(raw) {
        let description = err.to_description();
        assert!(!description.message.is_empty());
    }
});
