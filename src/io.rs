//! Character output abstraction for console text.
//!
//! The `CharIo` trait provides character-level output that can be implemented
//! for any console transport (UART, USB CDC, stdio, etc.). Modes and the
//! session never talk to `CharIo` directly: they write through
//! `core::fmt::Write`, and `IoWriter` bridges the two.

use core::fmt;

/// Platform-agnostic character output trait.
///
/// Implementations must buffer output internally and must not block
/// indefinitely in `put_char()` or `write_str()`.
pub trait CharIo {
    /// Platform-specific error type
    type Error;

    /// Write character to output buffer.
    fn put_char(&mut self, c: char) -> Result<(), Self::Error>;

    /// Write string to output buffer.
    ///
    /// Default implementation uses `put_char()` repeatedly.
    /// Override for more efficient bulk writes if needed.
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for c in s.chars() {
            self.put_char(c)?;
        }
        Ok(())
    }
}

/// `core::fmt::Write` adapter over a `CharIo`.
///
/// The platform error is remembered so the console can inspect it after a
/// session call returned `BusError::IoError`.
pub struct IoWriter<'a, IO: CharIo> {
    io: &'a mut IO,
    error: Option<IO::Error>,
}

impl<'a, IO: CharIo> IoWriter<'a, IO> {
    /// Wrap a character sink.
    pub fn new(io: &'a mut IO) -> Self {
        Self { io, error: None }
    }

    /// Take the last platform error, if any write failed.
    pub fn take_error(&mut self) -> Option<IO::Error> {
        self.error.take()
    }
}

impl<IO: CharIo> fmt::Write for IoWriter<'_, IO> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.io.write_str(s).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

impl<IO: CharIo> fmt::Debug for IoWriter<'_, IO> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoWriter")
            .field("failed", &self.error.is_some())
            .finish_non_exhaustive()
    }
}
