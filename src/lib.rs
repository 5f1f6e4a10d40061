//! # polybus
//!
//! Multi-protocol bus engine for embedded bus probing tools, with zero heap
//! allocation.
//!
//! **Key features:**
//! - **One contract, many buses** - SPI, I2C, UART and a raw 2-wire mode behind the same `BusMode` trait
//! - **Declarative parameters** - Each mode lists its options as static descriptors; validation and help text come for free
//! - **Session lifecycle** - Select, configure, power on, operate, clean up, with transport error recovery
//! - **Bus command lines** - `[0xA0 0x01 r:2]` style lines executed against the active mode
//! - **Pluggable hardware** - All peripheral access goes through backend traits
//!
//! ## Optional Features
//!
//! - `defmt-logging` - Lifecycle and recovery logging through `defmt`
//!
//! This library is `no_std` compatible.

#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

extern crate heapless;

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod macros;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod io;
pub mod mode;
pub mod param;
pub mod session;

// ============================================================================
// Re-exports - Public API
// ============================================================================

// Hardware boundary
pub use backend::{
    Ack, Backend, BitOrder, GpioPull, I2cBackend, I2cSettings, Parity, RawWireBackend,
    RawWireSettings, SpiBackend, SpiSettings, Status, StopBits, UartBackend, UartSettings,
};

// Console output
pub use io::{CharIo, IoWriter};

// Configuration
pub use config::{DefaultConfig, MinimalConfig, SessionConfig};

// Error types
pub use error::BusError;

// Modes and parameters
pub use mode::{BusMode, MODE_COUNT, ModeContext, ModeKind, get_mode};
pub use param::{Completeness, Encoding, ModeConfig, ParamField, ParameterDescriptor, Radix};

// Session engine
pub use session::{Session, SessionState};

// ============================================================================
// Library Metadata
// ============================================================================

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
