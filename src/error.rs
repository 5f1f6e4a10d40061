//! Error types for bus sessions.
//!
//! The `BusError` enum covers the four error classes a session can report:
//! configuration errors, backend transport errors, unsupported operations
//! and fatal re-initialization failures.

use crate::backend::Status;
use core::fmt;

/// Bus session error type.
///
/// Every public operation of the engine returns this type. None of the
/// variants is fatal to the session itself: the worst case leaves the mode
/// selected but inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum BusError {
    /// Parameter token is malformed or outside its declared bounds
    InvalidArgument {
        /// Which argument (0-indexed)
        arg_index: usize,
    },

    /// Command line token could not be interpreted
    Syntax {
        /// Byte offset of the offending token in the line
        position: usize,
    },

    /// Mode index does not name a registered mode
    UnknownMode(usize),

    /// No mode is selected
    NoModeSelected,

    /// Mode selected but the device is not powered on
    NotActive,

    /// Backend reported a transport failure
    Backend(Status),

    /// Backend could not be re-initialized after a transport failure
    RecoveryFailed(Status),

    /// Operation has no meaning for the active mode
    Unsupported,

    /// Macro number not known to the active mode
    UnknownMacro(u32),

    /// Transfer or output buffer capacity exceeded
    BufferFull,

    /// Console output sink failed
    IoError,
}

impl BusError {
    /// Whether the error came from the wire and warrants a device re-init.
    pub fn is_transport(&self) -> bool {
        matches!(self, BusError::Backend(_))
    }
}

impl From<fmt::Error> for BusError {
    fn from(_: fmt::Error) -> Self {
        BusError::IoError
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::InvalidArgument { arg_index } => {
                write!(f, "Invalid parameter {}", arg_index + 1)
            }
            BusError::Syntax { position } => write!(f, "Syntax error at position {}", position),
            BusError::UnknownMode(index) => write!(f, "Unknown mode {}", index),
            BusError::NoModeSelected => write!(f, "No mode selected"),
            BusError::NotActive => write!(f, "Device not powered on (use W)"),
            BusError::Backend(status) => write!(f, "Bus error: {}", status),
            BusError::RecoveryFailed(status) => {
                write!(f, "Device re-init failed: {}", status)
            }
            BusError::Unsupported => write!(f, "Not supported in this mode"),
            BusError::UnknownMacro(num) => write!(f, "Unknown macro ({})", num),
            BusError::BufferFull => write!(f, "Buffer full"),
            BusError::IoError => write!(f, "I/O error"),
        }
    }
}
