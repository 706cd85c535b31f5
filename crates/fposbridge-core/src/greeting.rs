//! The fixed smoke-test greeting.

use std::io::{self, Write};

/// Exactly what the greeting writes: 13 bytes, no line terminator.
pub const GREETING: &str = "Hello, world!";

/// Write [`GREETING`] to `out` and flush it.
pub fn write_greeting<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    out.write_all(GREETING.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_thirteen_bytes_without_newline() {
        let mut out = Vec::new();
        write_greeting(&mut out).unwrap();
        assert_eq!(out, b"Hello, world!");
        assert_eq!(out.len(), 13);
        assert_ne!(out.last(), Some(&b'\n'));
    }

    #[test]
    fn greeting_appends_to_existing_output() {
        let mut out = b">".to_vec();
        write_greeting(&mut out).unwrap();
        write_greeting(&mut out).unwrap();
        assert_eq!(out, b">Hello, world!Hello, world!");
    }
}
