//! Configuration traits and implementations for session sizing.
//!
//! The `SessionConfig` trait allows compile-time configuration of transfer
//! sizes and backend limits without runtime overhead.

/// Upper bound on bytes per transfer, whatever the config says.
///
/// Session buffers are sized with this constant; `SessionConfig::MAX_TRANSFER`
/// narrows it further at runtime.
pub const TRANSFER_CAPACITY: usize = 256;

/// Session configuration trait defining transfer limits and timeouts.
///
/// All values are const (zero runtime cost).
pub trait SessionConfig {
    /// Maximum bytes moved by one read or write (default: 256)
    const MAX_TRANSFER: usize;

    /// Maximum configuration arguments accepted per command (default: 8)
    const MAX_ARGS: usize;

    /// Blocking backend call ceiling in milliseconds (default: 10_000)
    const TRANSFER_TIMEOUT_MS: u32;

    /// Highest macro number the engine forwards to a mode (default: 255)
    const MAX_MACRO: u32;
}

/// Default configuration for typical bus probing.
///
/// - MAX_TRANSFER: 256 bytes
/// - MAX_ARGS: 8 arguments
/// - TRANSFER_TIMEOUT_MS: 10 seconds
/// - MAX_MACRO: 255
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DefaultConfig;

impl SessionConfig for DefaultConfig {
    const MAX_TRANSFER: usize = 256;
    const MAX_ARGS: usize = 8;
    const TRANSFER_TIMEOUT_MS: u32 = 10_000;
    const MAX_MACRO: u32 = 255;
}

/// Minimal configuration for resource-constrained systems.
///
/// - MAX_TRANSFER: 32 bytes
/// - MAX_ARGS: 6 arguments
/// - TRANSFER_TIMEOUT_MS: 1 second
/// - MAX_MACRO: 15
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MinimalConfig;

impl SessionConfig for MinimalConfig {
    const MAX_TRANSFER: usize = 32;
    const MAX_ARGS: usize = 6;
    const TRANSFER_TIMEOUT_MS: u32 = 1_000;
    const MAX_MACRO: u32 = 15;
}
