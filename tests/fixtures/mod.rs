//! Test fixtures and utilities for polybus testing.
//!
//! Provides:
//! - `MockBackend`: scripted device backend that records every call
//! - `Event`: one recorded backend call
//! - `MockIo`: test implementation of the CharIo trait

#![allow(dead_code)]

use polybus::{
    Ack, I2cBackend, I2cSettings, RawWireBackend, RawWireSettings, SpiBackend, SpiSettings, Status,
    UartBackend, UartSettings, CharIo,
};
use std::collections::VecDeque;

// ============================================================================
// MockBackend - Recording Device Backend
// ============================================================================

/// One backend call, as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    UartInit(u8, UartSettings),
    UartDeinit(u8),
    UartWrite(u8, Vec<u8>),
    UartRead(u8, usize),
    UartWriteRead(u8, Vec<u8>, usize),
    I2cInit(u8, I2cSettings),
    I2cDeinit(u8),
    I2cStart,
    I2cStop,
    I2cReadAck(Ack),
    I2cWriteByte(u8),
    I2cReadByte,
    SpiInit(u8, SpiSettings),
    SpiDeinit(u8),
    SpiSelect(u8, bool),
    SpiWrite(u8, Vec<u8>),
    SpiRead(u8, usize),
    SpiWriteRead(u8, Vec<u8>),
    WireInit(RawWireSettings),
    WireDeinit,
    Clock(bool),
    Data(bool),
    Sample,
}

/// Scripted backend.
///
/// Every call is appended to `events`. Transfer calls pop their status from
/// `statuses` (default `Ok`); init calls pop from `init_statuses`. I2C byte
/// writes pop their acknowledgment from `acks` (default ACK), reads pop
/// bytes from `rx_data` (default 0x00). The wire data line reads back
/// `wire_bits` (default: whatever was last driven).
#[derive(Debug, Default)]
pub struct MockBackend {
    pub events: Vec<Event>,
    pub statuses: VecDeque<Status>,
    pub init_statuses: VecDeque<Status>,
    pub acks: VecDeque<Ack>,
    pub rx_data: VecDeque<u8>,
    pub wire_bits: VecDeque<bool>,
    pub data_line: bool,
    pub delay_total_us: u64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue transfer statuses, consumed in order.
    pub fn with_statuses(mut self, statuses: &[Status]) -> Self {
        self.statuses.extend(statuses.iter().copied());
        self
    }

    /// Queue init statuses, consumed in order.
    pub fn with_init_statuses(mut self, statuses: &[Status]) -> Self {
        self.init_statuses.extend(statuses.iter().copied());
        self
    }

    /// Queue I2C acknowledgments for byte writes.
    pub fn with_acks(mut self, acks: &[Ack]) -> Self {
        self.acks.extend(acks.iter().copied());
        self
    }

    /// Queue bytes returned by reads.
    pub fn with_rx(mut self, data: &[u8]) -> Self {
        self.rx_data.extend(data.iter().copied());
        self
    }

    /// Queue bits returned by data line samples.
    pub fn with_wire_bits(mut self, bits: &[bool]) -> Self {
        self.wire_bits.extend(bits.iter().copied());
        self
    }

    /// Events with line-level wire traffic left out.
    pub fn bus_events(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| !matches!(e, Event::Clock(_) | Event::Data(_) | Event::Sample))
            .cloned()
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn status(&mut self) -> Status {
        self.statuses.pop_front().unwrap_or(Status::Ok)
    }

    fn init_status(&mut self) -> Status {
        self.init_statuses.pop_front().unwrap_or(Status::Ok)
    }

    fn fill(&mut self, rx: &mut [u8]) {
        for slot in rx.iter_mut() {
            *slot = self.rx_data.pop_front().unwrap_or(0);
        }
    }
}

impl UartBackend for MockBackend {
    fn uart_init(&mut self, dev: u8, settings: &UartSettings) -> Status {
        self.events.push(Event::UartInit(dev, *settings));
        self.init_status()
    }

    fn uart_deinit(&mut self, dev: u8) -> Status {
        self.events.push(Event::UartDeinit(dev));
        Status::Ok
    }

    fn uart_write(&mut self, dev: u8, tx: &[u8]) -> Status {
        self.events.push(Event::UartWrite(dev, tx.to_vec()));
        self.status()
    }

    fn uart_read(&mut self, dev: u8, rx: &mut [u8]) -> Status {
        self.events.push(Event::UartRead(dev, rx.len()));
        self.fill(rx);
        self.status()
    }

    fn uart_write_read(&mut self, dev: u8, tx: &[u8], rx: &mut [u8]) -> Status {
        self.events.push(Event::UartWriteRead(dev, tx.to_vec(), rx.len()));
        self.fill(rx);
        self.status()
    }
}

impl I2cBackend for MockBackend {
    fn i2c_init(&mut self, dev: u8, settings: &I2cSettings) -> Status {
        self.events.push(Event::I2cInit(dev, *settings));
        self.init_status()
    }

    fn i2c_deinit(&mut self, dev: u8) -> Status {
        self.events.push(Event::I2cDeinit(dev));
        Status::Ok
    }

    fn i2c_start(&mut self, _dev: u8) -> Status {
        self.events.push(Event::I2cStart);
        self.status()
    }

    fn i2c_stop(&mut self, _dev: u8) -> Status {
        self.events.push(Event::I2cStop);
        self.status()
    }

    fn i2c_read_ack(&mut self, _dev: u8, ack: Ack) -> Status {
        self.events.push(Event::I2cReadAck(ack));
        Status::Ok
    }

    fn i2c_write_byte(&mut self, _dev: u8, byte: u8) -> (Status, Ack) {
        self.events.push(Event::I2cWriteByte(byte));
        let ack = self.acks.pop_front().unwrap_or(Ack::Ack);
        let status = match ack {
            Ack::Ack => self.status(),
            Ack::Nack => Status::Error,
        };
        (status, ack)
    }

    fn i2c_read_byte(&mut self, _dev: u8) -> (Status, u8) {
        self.events.push(Event::I2cReadByte);
        let byte = self.rx_data.pop_front().unwrap_or(0);
        (self.status(), byte)
    }
}

impl SpiBackend for MockBackend {
    fn spi_init(&mut self, dev: u8, settings: &SpiSettings) -> Status {
        self.events.push(Event::SpiInit(dev, *settings));
        self.init_status()
    }

    fn spi_deinit(&mut self, dev: u8) -> Status {
        self.events.push(Event::SpiDeinit(dev));
        Status::Ok
    }

    fn spi_select(&mut self, dev: u8, selected: bool) -> Status {
        self.events.push(Event::SpiSelect(dev, selected));
        Status::Ok
    }

    fn spi_write(&mut self, dev: u8, tx: &[u8]) -> Status {
        self.events.push(Event::SpiWrite(dev, tx.to_vec()));
        self.status()
    }

    fn spi_read(&mut self, dev: u8, rx: &mut [u8]) -> Status {
        self.events.push(Event::SpiRead(dev, rx.len()));
        self.fill(rx);
        self.status()
    }

    fn spi_write_read(&mut self, dev: u8, tx: &[u8], rx: &mut [u8]) -> Status {
        self.events.push(Event::SpiWriteRead(dev, tx.to_vec()));
        self.fill(rx);
        self.status()
    }
}

impl RawWireBackend for MockBackend {
    fn wire_init(&mut self, settings: &RawWireSettings) -> Status {
        self.events.push(Event::WireInit(*settings));
        self.init_status()
    }

    fn wire_deinit(&mut self) -> Status {
        self.events.push(Event::WireDeinit);
        Status::Ok
    }

    fn set_clock(&mut self, high: bool) {
        self.events.push(Event::Clock(high));
    }

    fn set_data(&mut self, high: bool) {
        self.events.push(Event::Data(high));
        self.data_line = high;
    }

    fn read_data(&mut self) -> bool {
        self.events.push(Event::Sample);
        self.wire_bits.pop_front().unwrap_or(self.data_line)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_total_us += u64::from(us);
    }
}

// ============================================================================
// MockIo - Test I/O Implementation
// ============================================================================

/// Mock console output.
///
/// Captures everything written; uses `std` types since tests run with std.
#[derive(Debug, Default)]
pub struct MockIo {
    output: Vec<char>,
    /// Fail every write after this many characters
    pub fail_after: Option<usize>,
}

impl MockIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get captured output as string.
    pub fn output(&self) -> String {
        self.output.iter().collect()
    }

    /// Clear output buffer.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl CharIo for MockIo {
    type Error = &'static str;

    fn put_char(&mut self, c: char) -> Result<(), Self::Error> {
        if self.fail_after.is_some_and(|limit| self.output.len() >= limit) {
            return Err("console full");
        }
        self.output.push(c);
        Ok(())
    }
}
