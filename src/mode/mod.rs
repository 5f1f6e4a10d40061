//! Bus mode contract and registry.
//!
//! Every protocol personality implements `BusMode`. The trait has the same
//! shape for all of them, so the session never branches on the protocol:
//! differences live inside each implementation. Operations a protocol has
//! no use for are no-ops (the raw-bit defaults below) or report
//! `BusError::Unsupported`.
//!
//! The registry is the `ModeKind` enum. It implements `BusMode` itself by
//! forwarding to the selected unit struct, giving static dispatch via
//! pattern matching instead of vtables.

use crate::backend::Backend;
use crate::error::BusError;
use crate::param::{self, Completeness, ModeConfig, ParameterDescriptor};
use core::fmt::{self, Write};

pub mod i2c;
pub mod spi;
pub mod twowire;
pub mod uart;

pub use i2c::I2cMode;
pub use spi::SpiMode;
pub use twowire::TwoWireMode;
pub use uart::UartMode;

/// Everything an operation may touch: the live configuration, the backend
/// and the console.
pub struct ModeContext<'a, B> {
    /// Session configuration
    pub proto: &'a mut ModeConfig,
    /// Device backend
    pub backend: &'a mut B,
    /// Console output
    pub out: &'a mut dyn Write,
    /// Blocking call ceiling passed into backend settings
    pub timeout_ms: u32,
}

impl<B> fmt::Debug for ModeContext<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeContext")
            .field("proto", &self.proto)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

/// The operation set every bus mode provides.
///
/// Lifecycle: `setup` (defaults, no hardware) → `configure` (user
/// parameters) → `setup_exec` (power on) → bus operations → `cleanup`.
pub trait BusMode<B: Backend> {
    /// Mode name, e.g. `"I2C"`.
    fn name(&self) -> &'static str;

    /// Declared parameters, in argument order.
    fn parameters(&self) -> &'static [ParameterDescriptor];

    /// Console prompt for the current configuration.
    fn prompt(&self, proto: &ModeConfig) -> &'static str;

    /// Initialize configuration defaults. No hardware access.
    fn setup(&self, proto: &mut ModeConfig) {
        *proto = ModeConfig::new();
    }

    /// Validate user arguments into `proto`.
    fn configure(
        &self,
        proto: &mut ModeConfig,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<Completeness, BusError> {
        param::configure(args, self.parameters(), proto, out)
    }

    /// Power on the device with the current configuration.
    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// Release the device. Callers log failures and carry on.
    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// `[`
    fn start(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// `{`
    fn start_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// `]`
    fn stop(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// `}`
    fn stop_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError>;

    /// Transmit `tx`. Bytes sent before a failure stay sent.
    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError>;

    /// Receive `rx.len()` bytes.
    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError>;

    /// Transmit `tx` and receive `rx.len()` bytes as one operation.
    fn write_read(
        &self,
        ctx: &mut ModeContext<'_, B>,
        tx: &[u8],
        rx: &mut [u8],
    ) -> Result<(), BusError>;

    /// `/` (no-op unless the mode drives the lines itself)
    fn clock_high(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `\` (no-op unless the mode drives the lines itself)
    fn clock_low(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `-` (no-op unless the mode drives the lines itself)
    fn data_high(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `_` (no-op unless the mode drives the lines itself)
    fn data_low(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `!` clock in one bit (no-op unless the mode drives the lines itself)
    fn data_sample(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `^` one clock pulse (no-op unless the mode drives the lines itself)
    fn clock_tick(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// `.` read the data line without clocking (no-op unless the mode
    /// drives the lines itself)
    fn bit_read(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    /// Idle-tick hook. Returns whether anything happened.
    fn periodic(&self, _ctx: &mut ModeContext<'_, B>) -> bool {
        false
    }

    /// `(num)`; `(0)` lists what the mode offers.
    fn run_macro(&self, ctx: &mut ModeContext<'_, B>, num: u32) -> Result<(), BusError>;

    /// Current parameters as the user would type them.
    fn print_parameters(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        param::print_values(self.parameters(), proto, out)
    }

    /// Pins in use.
    fn print_pins(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result;

    /// Human-readable settings.
    fn print_settings(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result;
}

/// Registered bus modes, in menu order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum ModeKind {
    /// SPI master
    Spi,
    /// I2C master
    I2c,
    /// UART
    Uart,
    /// Bit-banged clock/data
    TwoWire,
}

/// Number of registered modes.
pub const MODE_COUNT: usize = 4;

impl ModeKind {
    /// All modes, in menu order.
    pub const ALL: [ModeKind; MODE_COUNT] =
        [ModeKind::Spi, ModeKind::I2c, ModeKind::Uart, ModeKind::TwoWire];

    /// Look up a mode by its 1-based menu index.
    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// 1-based menu index.
    pub fn index(self) -> usize {
        self as usize + 1
    }
}

/// Look up a mode by its 1-based menu index.
pub fn get_mode(index: usize) -> Option<ModeKind> {
    ModeKind::from_index(index)
}

macro_rules! dispatch {
    ($kind:expr, $m:ident => $body:expr) => {
        match $kind {
            ModeKind::Spi => {
                let $m = &SpiMode;
                $body
            }
            ModeKind::I2c => {
                let $m = &I2cMode;
                $body
            }
            ModeKind::Uart => {
                let $m = &UartMode;
                $body
            }
            ModeKind::TwoWire => {
                let $m = &TwoWireMode;
                $body
            }
        }
    };
}

impl<B: Backend> BusMode<B> for ModeKind {
    fn name(&self) -> &'static str {
        dispatch!(self, m => BusMode::<B>::name(m))
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        dispatch!(self, m => BusMode::<B>::parameters(m))
    }

    fn prompt(&self, proto: &ModeConfig) -> &'static str {
        dispatch!(self, m => BusMode::<B>::prompt(m, proto))
    }

    fn setup(&self, proto: &mut ModeConfig) {
        dispatch!(self, m => BusMode::<B>::setup(m, proto))
    }

    fn configure(
        &self,
        proto: &mut ModeConfig,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<Completeness, BusError> {
        dispatch!(self, m => BusMode::<B>::configure(m, proto, args, out))
    }

    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.setup_exec(ctx))
    }

    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.cleanup(ctx))
    }

    fn start(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.start(ctx))
    }

    fn start_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.start_read(ctx))
    }

    fn stop(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.stop(ctx))
    }

    fn stop_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.stop_read(ctx))
    }

    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError> {
        dispatch!(self, m => m.write(ctx, tx))
    }

    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError> {
        dispatch!(self, m => m.read(ctx, rx))
    }

    fn write_read(
        &self,
        ctx: &mut ModeContext<'_, B>,
        tx: &[u8],
        rx: &mut [u8],
    ) -> Result<(), BusError> {
        dispatch!(self, m => m.write_read(ctx, tx, rx))
    }

    fn clock_high(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.clock_high(ctx))
    }

    fn clock_low(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.clock_low(ctx))
    }

    fn data_high(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.data_high(ctx))
    }

    fn data_low(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.data_low(ctx))
    }

    fn data_sample(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.data_sample(ctx))
    }

    fn clock_tick(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.clock_tick(ctx))
    }

    fn bit_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        dispatch!(self, m => m.bit_read(ctx))
    }

    fn periodic(&self, ctx: &mut ModeContext<'_, B>) -> bool {
        dispatch!(self, m => m.periodic(ctx))
    }

    fn run_macro(&self, ctx: &mut ModeContext<'_, B>, num: u32) -> Result<(), BusError> {
        dispatch!(self, m => m.run_macro(ctx, num))
    }

    fn print_parameters(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        dispatch!(self, m => BusMode::<B>::print_parameters(m, proto, out))
    }

    fn print_pins(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        dispatch!(self, m => BusMode::<B>::print_pins(m, proto, out))
    }

    fn print_settings(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        dispatch!(self, m => BusMode::<B>::print_settings(m, proto, out))
    }
}

/// Print a transfer: one byte on a short line, several space separated.
pub(crate) fn print_transfer(out: &mut dyn Write, label: &str, bytes: &[u8]) -> fmt::Result {
    match bytes {
        [] => Ok(()),
        [byte] => write!(out, "{}: 0x{:02X}\r\n", label, byte),
        _ => {
            write!(out, "{}: ", label)?;
            for byte in bytes {
                write!(out, "0x{:02X} ", byte)?;
            }
            out.write_str("\r\n")
        }
    }
}

/// Print a combined transfer, one sent/received pair per line.
pub(crate) fn print_exchange(out: &mut dyn Write, tx: &[u8], rx: &[u8]) -> fmt::Result {
    for (sent, got) in tx.iter().zip(rx) {
        write!(out, "WRITE: 0x{:02X} READ: 0x{:02X}\r\n", sent, got)?;
    }
    Ok(())
}

/// Pick a display label by stored index, `"?"` when out of range.
pub(crate) fn label(labels: &[&'static str], index: u32) -> &'static str {
    labels.get(index as usize).copied().unwrap_or("?")
}

/// Print the one-line macro list entry `(n) description`.
pub(crate) fn print_macro_entry(out: &mut dyn Write, num: u32, text: &str) -> fmt::Result {
    write!(out, "({}) {}\r\n", num, text)
}
