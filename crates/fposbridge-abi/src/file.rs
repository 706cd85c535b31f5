//! Safe owner of a C `FILE*` whose positions are bridge records.
//!
//! This is the consumer the bridge exists for: `fgetpos` fills a
//! bridge-allocated [`FposHandle`], and `fsetpos` accepts any [`FposRecord`].

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr::NonNull;

use fposbridge_core::stream::validate_mode;
use fposbridge_core::{BridgeError, FposRecord, ReadUntil, Result};

use crate::handle::FposHandle;

fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

pub struct CFile {
    stream: NonNull<libc::FILE>,
}

/// Open `filename` with a C `fopen` mode string.
pub fn open_file(filename: &str, mode: &str) -> Result<CFile> {
    validate_mode(mode)?;
    let c_filename = CString::new(filename)?;
    let c_mode = CString::new(mode)?;
    // SAFETY: both arguments are NUL-terminated and outlive the call.
    let stream = unsafe { libc::fopen(c_filename.as_ptr(), c_mode.as_ptr()) };
    NonNull::new(stream)
        .map(|stream| CFile { stream })
        .ok_or_else(|| BridgeError::Open {
            path: filename.to_string(),
            errno: last_errno(),
        })
}

impl CFile {
    fn raw(&mut self) -> *mut libc::FILE {
        self.stream.as_ptr()
    }

    /// Write `text` without a trailing newline.
    pub fn puts(&mut self, text: &str) -> Result<()> {
        let text = CString::new(text)?;
        // SAFETY: stream is open; text is NUL-terminated.
        let rc = unsafe { libc::fputs(text.as_ptr(), self.raw()) };
        if rc >= 0 {
            Ok(())
        } else {
            Err(BridgeError::Write {
                call: "fputs",
                errno: last_errno(),
            })
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        // SAFETY: stream is open.
        if unsafe { libc::fflush(self.raw()) } == 0 {
            Ok(())
        } else {
            Err(BridgeError::Write {
                call: "fflush",
                errno: last_errno(),
            })
        }
    }

    /// Read one line (newline included) of at most `max_chars` bytes.
    /// `Ok(None)` at end of file.
    pub fn gets(&mut self, max_chars: u16) -> Result<Option<String>> {
        if max_chars == 0 {
            return Ok(Some(String::new()));
        }
        let capacity = usize::from(max_chars) + 1;
        let mut buf: Vec<c_char> = vec![0; capacity];
        // SAFETY: buf holds `capacity` bytes; fgets writes at most capacity-1
        // plus a terminating NUL.
        let got = unsafe { libc::fgets(buf.as_mut_ptr(), capacity as c_int, self.raw()) };
        if got.is_null() {
            // SAFETY: stream is open.
            return if unsafe { libc::ferror(self.raw()) } != 0 {
                Err(BridgeError::Read {
                    call: "fgets",
                    errno: last_errno(),
                })
            } else {
                Ok(None)
            };
        }
        // SAFETY: fgets NUL-terminated the buffer on success.
        let bytes = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_bytes().to_vec();
        Ok(Some(String::from_utf8(bytes)?))
    }

    /// Current position as a freshly allocated bridge record.
    pub fn current_pos(&mut self) -> Result<FposHandle> {
        let mut pos = FposHandle::try_new()?;
        self.store_pos(&mut pos)?;
        Ok(pos)
    }

    /// Write the current position into an existing record.
    pub fn store_pos(&mut self, dst: &mut FposRecord) -> Result<()> {
        let dst: *mut FposRecord = dst;
        // SAFETY: dst is sized and aligned like the host fpos_t.
        let rc = unsafe { libc::fgetpos(self.raw(), dst.cast::<libc::fpos_t>()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(BridgeError::Position {
                call: "fgetpos",
                errno: last_errno(),
            })
        }
    }

    /// Move to a position previously produced by [`CFile::current_pos`] on
    /// this stream (or a byte-exact copy of one).
    pub fn set_pos(&mut self, pos: &FposRecord) -> Result<()> {
        let pos: *const FposRecord = pos;
        // SAFETY: pos is sized and aligned like the host fpos_t.
        let rc = unsafe { libc::fsetpos(self.raw(), pos.cast::<libc::fpos_t>()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(BridgeError::Position {
                call: "fsetpos",
                errno: last_errno(),
            })
        }
    }

    /// From `pos`, read until `delim` (consumed, not returned) or end of file.
    ///
    /// Returns the text and whether end of file was reached. A `delim` of `0`
    /// reads everything that is left.
    pub fn read_until_char(&mut self, pos: &FposRecord, delim: u8) -> Result<(String, bool)> {
        self.set_pos(pos)?;
        let mut scan = ReadUntil::new(delim);
        let mut eof = false;
        loop {
            // SAFETY: stream is open.
            let c = unsafe { libc::fgetc(self.raw()) };
            if c == libc::EOF {
                // SAFETY: stream is open.
                if unsafe { libc::ferror(self.raw()) } != 0 {
                    return Err(BridgeError::Read {
                        call: "fgetc",
                        errno: last_errno(),
                    });
                }
                eof = true;
                break;
            }
            if scan.feed(c as u8) {
                break;
            }
        }
        Ok((scan.finish()?, eof))
    }
}

impl Drop for CFile {
    fn drop(&mut self) {
        // SAFETY: stream is open and closed exactly once here.
        unsafe {
            libc::fclose(self.stream.as_ptr());
        }
    }
}
