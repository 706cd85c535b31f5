//! Pure helpers for the C stream wrapper: `fopen` mode parsing and the
//! read-until-delimiter accumulator.

use crate::error::{BridgeError, Result};

/// Parsed `fopen` mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub readable: bool,
    pub writable: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
    pub binary: bool,
    pub exclusive: bool,
}

/// Parse an `fopen` mode string: one of `r`, `w`, `a`, then any of `+`, `b`, `x`.
pub fn parse_mode(mode: &[u8]) -> Option<OpenMode> {
    let (&base, modifiers) = mode.split_first()?;

    let mut flags = OpenMode::default();
    match base {
        b'r' => flags.readable = true,
        b'w' => {
            flags.writable = true;
            flags.create = true;
            flags.truncate = true;
        }
        b'a' => {
            flags.writable = true;
            flags.create = true;
            flags.append = true;
        }
        _ => return None,
    }

    for &m in modifiers {
        match m {
            b'+' => {
                flags.readable = true;
                flags.writable = true;
            }
            b'b' => flags.binary = true,
            b'x' => flags.exclusive = true,
            _ => return None,
        }
    }

    Some(flags)
}

/// Validate a mode string before it reaches `fopen`.
pub fn validate_mode(mode: &str) -> Result<OpenMode> {
    parse_mode(mode.as_bytes()).ok_or_else(|| BridgeError::InvalidMode(mode.to_string()))
}

/// Accumulates bytes read from a stream until a delimiter shows up.
///
/// The delimiter is consumed but not kept. A delimiter of `0` never matches,
/// so the whole remaining stream is collected.
#[derive(Debug)]
pub struct ReadUntil {
    delim: Option<u8>,
    buf: Vec<u8>,
    done: bool,
}

impl ReadUntil {
    #[must_use]
    pub fn new(delim: u8) -> Self {
        Self {
            delim: (delim != 0).then_some(delim),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Feed one byte. Returns true once the delimiter has been seen.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.done {
            return true;
        }
        if Some(byte) == self.delim {
            self.done = true;
        } else {
            self.buf.push(byte);
        }
        self.done
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Collected bytes as UTF-8 text.
    pub fn finish(self) -> Result<String> {
        String::from_utf8(self.buf).map_err(BridgeError::from)
    }
}
