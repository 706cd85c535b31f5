//! Walk a file by saved positions.
//!
//! Reads from the start up to a delimiter, prints the text and whether end
//! of file was hit, then does the same from the new position through to the
//! end, and finally prints `end`.

use std::io::Write;
use std::path::Path;

use fposbridge_abi::open_file;

use crate::error::HarnessError;

/// `delim` defaults to `b'n'` on the command line; `0` reads to end of file.
pub fn run_read<W: Write>(path: &Path, delim: u8, out: &mut W) -> Result<(), HarnessError> {
    let path = path
        .to_str()
        .ok_or_else(|| HarnessError::SmokeFailed(format!("non-UTF-8 path {}", path.display())))?;
    let mut file = open_file(path, "r")?;

    let pos = file.current_pos()?;
    let (text, eof) = file.read_until_char(&pos, delim)?;
    writeln!(out, "{text}\neof: {eof}")?;

    let next = file.current_pos()?;
    let (text, eof) = file.read_until_char(&next, 0)?;
    writeln!(out, "{text}\neof: {eof}")?;

    writeln!(out, "end")?;
    Ok(())
}
