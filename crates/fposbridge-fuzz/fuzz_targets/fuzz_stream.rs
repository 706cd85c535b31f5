#![no_main]
use libfuzzer_sys::fuzz_target;

use fposbridge_core::{ReadUntil, parse_mode};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Mode parsing must never panic, and a parsed mode always opens one way.
    let split = usize::from(data[0]) % data.len();
    let (mode, rest) = data.split_at(split);
    if let Some(flags) = parse_mode(mode) {
        assert!(flags.readable || flags.writable);
        if let Ok(text) = std::str::from_utf8(mode) {
            assert!(fposbridge_core::validate_mode(text).is_ok());
        }
    }

    // The accumulator keeps exactly the bytes before the first delimiter.
    let delim = data[0];
    let mut scan = ReadUntil::new(delim);
    let mut fed = 0;
    for &byte in rest {
        fed += 1;
        if scan.feed(byte) {
            break;
        }
    }
    let expected = if delim == 0 {
        rest.len()
    } else {
        rest.iter().position(|&b| b == delim).unwrap_or(rest.len())
    };
    assert!(fed >= expected);
    if let Ok(text) = scan.finish() {
        assert_eq!(text.len(), expected);
    }
});
