#![no_main]

use fb_status::{ErrorRecord, FixedStatusBuffer, StatusArgs, StatusError, StatusException, StatusWord, gds};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u8, Vec<String>)| {
    let (capacity, arena_len, strings) = input;

    let mut args = StatusArgs::error(gds::IO_ERROR);
    for s in &strings {
        args = args.str(s).gds(gds::RANDOM);
    }
    let err = StatusError::from_args(args);

    let capacity = capacity as usize % 32;
    let mut words = vec![-1 as StatusWord; capacity + 1];
    let mut arena = vec![0u8; arena_len as usize];
    {
        let mut buffer = FixedStatusBuffer::new(&mut words[..capacity], &mut arena);
        let complete = err.serialize_into(&mut buffer);
        assert!(complete || buffer.is_truncated());
        assert!(!ErrorRecord::parse(buffer.as_raw()).is_truncated());
    }
    assert_eq!(words[capacity], -1);
});
