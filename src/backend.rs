//! Device backend traits.
//!
//! The engine drives hardware exclusively through these traits. A board
//! support crate implements them once, on a single service object that owns
//! every peripheral handle, and hands that object to the `Session`.
//!
//! All calls are blocking. Implementations bound every transfer by the
//! timeout carried in the settings structs and may cut it short on a user
//! abort signal, reporting `Status::Timeout` in both cases.

use core::fmt;

/// Outcome of a backend call.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum Status {
    /// Completed
    Ok = 0,
    /// Bus or peripheral error (including an unexpected NACK)
    Error = 1,
    /// Peripheral busy
    Busy = 2,
    /// Transfer did not complete in time, or was aborted
    Timeout = 3,
}

impl Status {
    /// Convert into a `Result`, mapping every non-`Ok` status to
    /// `BusError::Backend`.
    pub fn check(self) -> Result<(), crate::BusError> {
        match self {
            Status::Ok => Ok(()),
            other => Err(crate::BusError::Backend(other)),
        }
    }

    /// Whether the call completed.
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::Busy => "BUSY",
            Status::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

/// Acknowledge bit on an I2C bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum Ack {
    /// Receiver pulled SDA low
    Ack,
    /// Receiver left SDA high
    Nack,
}

impl Ack {
    /// Console label.
    pub fn as_str(self) -> &'static str {
        match self {
            Ack::Ack => "ACK",
            Ack::Nack => "NACK",
        }
    }
}

/// UART parity setting (8 data bits in every case).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum Parity {
    /// No parity
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// UART stop bit count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum StopBits {
    /// One stop bit
    One,
    /// Two stop bits
    Two,
}

/// Internal pull resistor on the bus pins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum GpioPull {
    /// Rely on external pull resistors
    NoPull,
    /// Internal pull-up
    PullUp,
    /// Internal pull-down
    PullDown,
}

/// Bit transmission order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Resolved UART line settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UartSettings {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Blocking call ceiling
    pub timeout_ms: u32,
}

/// Resolved I2C master settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct I2cSettings {
    /// SCL frequency in Hz
    pub frequency_hz: u32,
    /// Pull resistors on SCL/SDA
    pub pull: GpioPull,
    /// Blocking call ceiling
    pub timeout_ms: u32,
}

/// Resolved SPI master settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpiSettings {
    /// SCK frequency in Hz
    pub frequency_hz: u32,
    /// Pull resistors on the bus pins
    pub pull: GpioPull,
    /// Clock idles high when true (CPOL=1)
    pub clock_idle_high: bool,
    /// Sample on the second clock edge when true (CPHA=1)
    pub second_edge: bool,
    /// Bit order
    pub bit_order: BitOrder,
    /// Blocking call ceiling
    pub timeout_ms: u32,
}

/// Settings for bit-banged clock/data lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawWireSettings {
    /// Pull resistors on the clock and data lines
    pub pull: GpioPull,
}

/// UART peripheral primitives.
pub trait UartBackend {
    /// Power on and configure UART `dev`.
    fn uart_init(&mut self, dev: u8, settings: &UartSettings) -> Status;

    /// Release UART `dev` and its pins.
    fn uart_deinit(&mut self, dev: u8) -> Status;

    /// Transmit all bytes of `tx`.
    fn uart_write(&mut self, dev: u8, tx: &[u8]) -> Status;

    /// Receive exactly `rx.len()` bytes.
    fn uart_read(&mut self, dev: u8, rx: &mut [u8]) -> Status;

    /// Transmit `tx`, then receive `rx.len()` bytes.
    fn uart_write_read(&mut self, dev: u8, tx: &[u8], rx: &mut [u8]) -> Status;
}

/// I2C master primitives with manual acknowledgment.
pub trait I2cBackend {
    /// Power on and configure I2C `dev`.
    fn i2c_init(&mut self, dev: u8, settings: &I2cSettings) -> Status;

    /// Release I2C `dev` and its pins.
    fn i2c_deinit(&mut self, dev: u8) -> Status;

    /// Emit a START (or repeated START) condition.
    fn i2c_start(&mut self, dev: u8) -> Status;

    /// Emit a STOP condition.
    fn i2c_stop(&mut self, dev: u8) -> Status;

    /// Clock out the acknowledgment for the last byte received.
    fn i2c_read_ack(&mut self, dev: u8, ack: Ack) -> Status;

    /// Shift out one byte and sample the receiver's acknowledgment.
    fn i2c_write_byte(&mut self, dev: u8, byte: u8) -> (Status, Ack);

    /// Shift in one byte, leaving the acknowledgment to `i2c_read_ack`.
    fn i2c_read_byte(&mut self, dev: u8) -> (Status, u8);
}

/// SPI master primitives.
pub trait SpiBackend {
    /// Power on and configure SPI `dev`.
    fn spi_init(&mut self, dev: u8, settings: &SpiSettings) -> Status;

    /// Release SPI `dev` and its pins.
    fn spi_deinit(&mut self, dev: u8) -> Status;

    /// Drive chip select: `true` asserts (low), `false` releases.
    fn spi_select(&mut self, dev: u8, selected: bool) -> Status;

    /// Transmit all bytes of `tx`, discarding what comes back.
    fn spi_write(&mut self, dev: u8, tx: &[u8]) -> Status;

    /// Clock in `rx.len()` bytes while sending filler.
    fn spi_read(&mut self, dev: u8, rx: &mut [u8]) -> Status;

    /// Full-duplex exchange of `tx.len()` bytes.
    fn spi_write_read(&mut self, dev: u8, tx: &[u8], rx: &mut [u8]) -> Status;
}

/// Direct clock/data line control for bit-banged protocols.
///
/// Line operations cannot fail; only claiming and releasing the pins
/// report a status.
pub trait RawWireBackend {
    /// Claim the clock and data pins.
    fn wire_init(&mut self, settings: &RawWireSettings) -> Status;

    /// Return the pins to a safe high-impedance state.
    fn wire_deinit(&mut self) -> Status;

    /// Drive the clock line.
    fn set_clock(&mut self, high: bool);

    /// Drive the data line.
    fn set_data(&mut self, high: bool);

    /// Sample the data line.
    fn read_data(&mut self) -> bool;

    /// Busy-wait.
    fn delay_us(&mut self, us: u32);
}

/// Everything a session needs from the hardware.
///
/// Blanket-implemented for any type providing all four peripheral kinds.
pub trait Backend: UartBackend + I2cBackend + SpiBackend + RawWireBackend {}

impl<T> Backend for T where T: UartBackend + I2cBackend + SpiBackend + RawWireBackend {}
