//! Raw 2-wire mode: a clock line and a bidirectional data line driven by
//! hand.
//!
//! There is no peripheral behind this mode, so every raw-bit operation does
//! real work. Timing is a half-period busy-wait between line changes.

use super::{BusMode, ModeContext, label, print_macro_entry, print_transfer};
use crate::backend::{Backend, BitOrder, RawWireSettings};
use crate::error::BusError;
use crate::param::{Encoding, ModeConfig, ParamField, ParameterDescriptor, Radix};
use core::fmt::{self, Write};

/// Clock frequencies, by speed index.
pub const SPEED_TABLE: [u32; 4] = [10_000, 50_000, 100_000, 1_000_000];

const PULL_LABELS: [&str; 3] = ["1=NoPull", "2=PullUp", "3=PullDown"];
const SPEED_LABELS: [&str; 4] = ["1=10KHz", "2=50KHz", "3=100KHz", "4=1MHz"];
const BIT_ORDER_LABELS: [&str; 2] = ["1=MSB first", "2=LSB first"];

static PARAMETERS: [ParameterDescriptor; 3] = [
    ParameterDescriptor {
        min: 1,
        max: 3,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::GpioPull,
        help: "Choose CLK/SDA pull: 1=NoPull, 2=PullUp, 3=PullDown",
    },
    ParameterDescriptor {
        min: 1,
        max: 4,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Speed,
        help: "Choose clock speed: 1=10KHz, 2=50KHz, 3=100KHz, 4=1MHz",
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

/// Bit-banged 2-wire bus mode.
#[derive(Debug, Copy, Clone, Default)]
pub struct TwoWireMode;

/// Half a clock period in microseconds, never zero.
pub fn half_period_us(proto: &ModeConfig) -> u32 {
    let hz = proto.resolve_speed(&SPEED_TABLE).max(1);
    (500_000 / hz).max(1)
}

/// Mask of bit `i` (0 = first on the wire) for the given order.
fn bit_mask(order: BitOrder, i: u32) -> u8 {
    match order {
        BitOrder::MsbFirst => 0x80 >> i,
        BitOrder::LsbFirst => 1 << i,
    }
}

impl TwoWireMode {
    fn wait<B: Backend>(ctx: &mut ModeContext<'_, B>) {
        let us = half_period_us(ctx.proto);
        ctx.backend.delay_us(us);
    }

    fn pulse<B: Backend>(ctx: &mut ModeContext<'_, B>) {
        ctx.backend.set_clock(true);
        Self::wait(ctx);
        ctx.backend.set_clock(false);
        Self::wait(ctx);
    }

    /// Clock one bit in, sampling while the clock is high.
    fn sample<B: Backend>(ctx: &mut ModeContext<'_, B>) -> bool {
        ctx.backend.set_clock(true);
        Self::wait(ctx);
        let bit = ctx.backend.read_data();
        ctx.backend.set_clock(false);
        Self::wait(ctx);
        bit
    }

    fn write_byte<B: Backend>(ctx: &mut ModeContext<'_, B>, byte: u8) {
        let order = ctx.proto.bit_order();
        for i in 0..8 {
            ctx.backend.set_data(byte & bit_mask(order, i) != 0);
            Self::wait(ctx);
            Self::pulse(ctx);
        }
    }

    fn read_byte<B: Backend>(ctx: &mut ModeContext<'_, B>) -> u8 {
        let order = ctx.proto.bit_order();
        let mut byte = 0u8;
        for i in 0..8 {
            if Self::sample(ctx) {
                byte |= bit_mask(order, i);
            }
        }
        byte
    }
}

impl<B: Backend> BusMode<B> for TwoWireMode {
    fn name(&self) -> &'static str {
        "2-WIRE"
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        &PARAMETERS
    }

    fn prompt(&self, _proto: &ModeConfig) -> &'static str {
        "2-wire1> "
    }

    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let settings = RawWireSettings {
            pull: ctx.proto.gpio_pull(),
        };
        ctx.backend.wire_init(&settings).check()?;
        ctx.backend.set_clock(false);
        ctx.backend.set_data(false);
        Ok(())
    }

    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.wire_deinit().check()
    }

    /// Data falls while the clock is high.
    fn start(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_data(true);
        ctx.backend.set_clock(true);
        Self::wait(ctx);
        ctx.backend.set_data(false);
        Self::wait(ctx);
        ctx.backend.set_clock(false);
        Self::wait(ctx);
        ctx.out.write_str("BUS START\r\n")?;
        Ok(())
    }

    fn start_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        BusMode::<B>::start(self, ctx)
    }

    /// Data rises while the clock is high.
    fn stop(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_data(false);
        ctx.backend.set_clock(true);
        Self::wait(ctx);
        ctx.backend.set_data(true);
        Self::wait(ctx);
        ctx.out.write_str("BUS STOP\r\n")?;
        Ok(())
    }

    fn stop_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        BusMode::<B>::stop(self, ctx)
    }

    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError> {
        for &byte in tx {
            Self::write_byte(ctx, byte);
        }
        print_transfer(ctx.out, "WRITE", tx)?;
        Ok(())
    }

    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError> {
        // Release the data line so the target can drive it.
        ctx.backend.set_data(true);
        for slot in rx.iter_mut() {
            *slot = Self::read_byte(ctx);
        }
        print_transfer(ctx.out, "READ", rx)?;
        Ok(())
    }

    fn write_read(
        &self,
        _ctx: &mut ModeContext<'_, B>,
        _tx: &[u8],
        _rx: &mut [u8],
    ) -> Result<(), BusError> {
        Err(BusError::Unsupported)
    }

    fn clock_high(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_clock(true);
        Self::wait(ctx);
        Ok(())
    }

    fn clock_low(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_clock(false);
        Self::wait(ctx);
        Ok(())
    }

    fn data_high(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_data(true);
        Self::wait(ctx);
        Ok(())
    }

    fn data_low(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.set_data(false);
        Self::wait(ctx);
        Ok(())
    }

    fn data_sample(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let bit = Self::sample(ctx);
        write!(ctx.out, "READ BIT: {}\r\n", u8::from(bit))?;
        Ok(())
    }

    fn clock_tick(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::pulse(ctx);
        Ok(())
    }

    fn bit_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let bit = ctx.backend.read_data();
        write!(ctx.out, "DATA: {}\r\n", u8::from(bit))?;
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

    fn print_pins(&self, _proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        out.write_str("CLK=PB10, SDA=PC3")
    }

    fn print_settings(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        write!(
            out,
            "GPIO Pull: {}\r\nSpeed: {}\r\nBit order: {}",
            label(&PULL_LABELS, proto.get(ParamField::GpioPull)),
            label(&SPEED_LABELS, proto.speed_index()),
            label(&BIT_ORDER_LABELS, proto.get(ParamField::BitOrder)),
        )
    }
}
