//! # fposbridge-core
//!
//! Safe pieces of the `fpos_t` bridge that need no raw pointers:
//! the sized record type and its host layout, the greeting writer, and the
//! pure parts of the C stream wrapper (mode parsing, delimiter scanning).

pub mod error;
pub mod greeting;
pub mod record;
pub mod stream;

pub use error::{BridgeError, Result};
pub use greeting::{GREETING, write_greeting};
pub use record::{FPOS_ALIGN, FPOS_SIZE, FposRecord, RecordLayout, record_layout};
pub use stream::{OpenMode, ReadUntil, parse_mode, validate_mode};
