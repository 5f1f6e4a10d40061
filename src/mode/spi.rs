//! SPI master mode.
//!
//! Chip select is driven by the structural tokens: `[` and `{` assert it,
//! `]` and `}` release it. Transfers are full duplex, so combined
//! write-read is a single backend call.

use super::{BusMode, ModeContext, label, print_exchange, print_macro_entry, print_transfer};
use crate::backend::{Backend, SpiSettings};
use crate::error::BusError;
use crate::param::{Encoding, ModeConfig, ParamField, ParameterDescriptor, Radix};
use core::fmt::{self, Write};

/// SCK frequencies of SPI1, by speed index.
pub const SPI1_SPEED_TABLE: [u32; 8] = [
    320_000, 650_000, 1_310_000, 2_620_000, 5_250_000, 10_500_000, 21_000_000, 42_000_000,
];

/// SCK frequencies of SPI2 (half the bus clock of SPI1), by speed index.
pub const SPI2_SPEED_TABLE: [u32; 8] = [
    160_000, 320_000, 650_000, 1_310_000, 2_620_000, 5_250_000, 10_500_000, 21_000_000,
];

const DEVICE_LABELS: [&str; 2] = ["1=SPI1", "2=SPI2"];
const PULL_LABELS: [&str; 3] = ["1=NoPull", "2=PullUp", "3=PullDown"];
const POLARITY_LABELS: [&str; 2] = ["1=CPOL 0", "2=CPOL 1"];
const PHASE_LABELS: [&str; 2] = ["1=CPHA 0", "2=CPHA 1"];
const BIT_ORDER_LABELS: [&str; 2] = ["1=MSB first", "2=LSB first"];
const SPI1_SPEED_LABELS: [&str; 8] = [
    "1=320KHz", "2=650KHz", "3=1.31MHz", "4=2.62MHz", "5=5.25MHz", "6=10.5MHz", "7=21MHz",
    "8=42MHz",
];
const SPI2_SPEED_LABELS: [&str; 8] = [
    "1=160KHz", "2=320KHz", "3=650KHz", "4=1.31MHz", "5=2.62MHz", "6=5.25MHz", "7=10.5MHz",
    "8=21MHz",
];
const PINS: [&str; 2] = [
    "SPI1 CS=PA15, SCK=PB3, MISO=PB4, MOSI=PB5",
    "SPI2 CS=PC1, SCK=PB10, MISO=PC2, MOSI=PC3",
];
const PROMPTS: [&str; 2] = ["spi1> ", "spi2> "];

static PARAMETERS: [ParameterDescriptor; 6] = [
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Device,
        help: "Choose SPI device number: 1=SPI1, 2=SPI2",
    },
    ParameterDescriptor {
        min: 1,
        max: 3,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::GpioPull,
        help: "Choose SPI pin pull: 1=NoPull, 2=PullUp, 3=PullDown",
    },
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Polarity,
        help: "Choose clock polarity: 1=CPOL 0 (idle low), 2=CPOL 1 (idle high)",
    },
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Phase,
        help: "Choose clock phase: 1=CPHA 0 (first edge), 2=CPHA 1 (second edge)",
    },
    ParameterDescriptor {
        min: 1,
        max: 8,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Speed,
        help: "Choose SPI speed: SPI1 1=320KHz..8=42MHz, SPI2 1=160KHz..8=21MHz",
    },
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::BitOrder,
        help: "Choose bit order: 1=MSB first, 2=LSB first",
    },
];

/// SPI master bus mode.
#[derive(Debug, Copy, Clone, Default)]
pub struct SpiMode;

impl SpiMode {
    /// Master settings for the backend.
    pub fn settings(proto: &ModeConfig, timeout_ms: u32) -> SpiSettings {
        let table = match proto.device() {
            0 => &SPI1_SPEED_TABLE,
            _ => &SPI2_SPEED_TABLE,
        };
        SpiSettings {
            frequency_hz: proto.resolve_speed(table),
            pull: proto.gpio_pull(),
            clock_idle_high: proto.clock_idle_high(),
            second_edge: proto.second_edge(),
            bit_order: proto.bit_order(),
            timeout_ms,
        }
    }

    fn select<B: Backend>(ctx: &mut ModeContext<'_, B>, selected: bool) -> Result<(), BusError> {
        ctx.backend.spi_select(ctx.proto.device(), selected).check()?;
        ctx.out
            .write_str(if selected { "/CS ENABLED\r\n" } else { "/CS DISABLED\r\n" })?;
        Ok(())
    }
}

impl<B: Backend> BusMode<B> for SpiMode {
    fn name(&self) -> &'static str {
        "SPI"
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        &PARAMETERS
    }

    fn prompt(&self, proto: &ModeConfig) -> &'static str {
        label(&PROMPTS, proto.device() as u32)
    }

    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let settings = Self::settings(ctx.proto, ctx.timeout_ms);
        ctx.backend.spi_init(ctx.proto.device(), &settings).check()
    }

    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.spi_deinit(ctx.proto.device()).check()
    }

    fn start(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::select(ctx, true)
    }

    fn start_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::select(ctx, true)
    }

    fn stop(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::select(ctx, false)
    }

    fn stop_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::select(ctx, false)
    }

    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError> {
        ctx.backend.spi_write(ctx.proto.device(), tx).check()?;
        print_transfer(ctx.out, "WRITE", tx)?;
        Ok(())
    }

    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError> {
        ctx.backend.spi_read(ctx.proto.device(), rx).check()?;
        print_transfer(ctx.out, "READ", rx)?;
        Ok(())
    }

    fn write_read(
        &self,
        ctx: &mut ModeContext<'_, B>,
        tx: &[u8],
        rx: &mut [u8],
    ) -> Result<(), BusError> {
        // Full duplex: one byte in per byte out.
        let n = tx.len().min(rx.len());
        let (tx, rx) = (&tx[..n], &mut rx[..n]);
        ctx.backend
            .spi_write_read(ctx.proto.device(), tx, rx)
            .check()?;
        print_exchange(ctx.out, tx, rx)?;
        Ok(())
    }

    fn run_macro(&self, ctx: &mut ModeContext<'_, B>, num: u32) -> Result<(), BusError> {
        match num {
            0 => {
                print_macro_entry(ctx.out, 0, "List macros")?;
                Ok(())
            }
            _ => Err(BusError::UnknownMacro(num)),
        }
    }

    fn print_pins(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        out.write_str(label(&PINS, proto.device() as u32))
    }

    fn print_settings(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        let speeds = match proto.device() {
            0 => &SPI1_SPEED_LABELS,
            _ => &SPI2_SPEED_LABELS,
        };
        write!(
            out,
            "Device: {}\r\nGPIO Pull: {}\r\nPolarity: {}\r\nPhase: {}\r\nSpeed: {}\r\nBit order: {}",
            label(&DEVICE_LABELS, proto.device() as u32),
            label(&PULL_LABELS, proto.get(ParamField::GpioPull)),
            label(&POLARITY_LABELS, proto.get(ParamField::Polarity)),
            label(&PHASE_LABELS, proto.get(ParamField::Phase)),
            label(speeds, proto.speed_index()),
            label(&BIT_ORDER_LABELS, proto.get(ParamField::BitOrder)),
        )
    }
}
