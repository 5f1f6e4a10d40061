//! UART mode.
//!
//! The hardware peripheral handles framing and bit timing, so structural
//! and raw-bit operations are no-ops.

use super::{BusMode, ModeContext, label, print_exchange, print_macro_entry, print_transfer};
use crate::backend::{Backend, UartSettings};
use crate::error::BusError;
use crate::param::{Encoding, ModeConfig, ParamField, ParameterDescriptor, Radix};
use core::fmt::{self, Write};

/// Baud rates selectable by index; larger selectors are literal rates.
pub const SPEED_TABLE: [u32; 10] = [
    300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 31250,
];

/// Highest literal baud rate the peripheral reaches.
pub const MAX_BAUDRATE: u32 = 10_500_000;

const DEVICE_LABELS: [&str; 2] = ["1=UART1", "2=UART2"];
const PARITY_LABELS: [&str; 3] = ["1=8/none", "2=8/even", "3=8/odd"];
const STOP_BIT_LABELS: [&str; 2] = ["1=1 stop", "2=2 stop"];
const PINS: [&str; 2] = ["UART1 TX=PA9, RX=PA10", "UART2 TX=PA2, RX=PA3"];
const PROMPTS: [&str; 2] = ["uart1> ", "uart2> "];

static PARAMETERS: [ParameterDescriptor; 4] = [
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Device,
        help: "Choose UART device number: 1=UART1, 2=UART2",
    },
    ParameterDescriptor {
        min: 1,
        max: MAX_BAUDRATE,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Speed,
        help: "Choose UART speed: 1=300bps, 2=1200bps, 3=2400bps, 4=4800bps, 5=9600bps, \
               6=19200bps, 7=38400bps, 8=57600bps, 9=115200bps, 10=31250bps, or a rate up to 10500000bps",
    },
    ParameterDescriptor {
        min: 1,
        max: 3,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Parity,
        help: "Choose UART parity: 1=8/none, 2=8/even, 3=8/odd",
    },
    ParameterDescriptor {
        min: 1,
        max: 2,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::StopBits,
        help: "Choose UART stop bits: 1=1 stop, 2=2 stop",
    },
];

/// UART bus mode.
#[derive(Debug, Copy, Clone, Default)]
pub struct UartMode;

impl UartMode {
    /// Line settings for the backend.
    pub fn settings(proto: &ModeConfig, timeout_ms: u32) -> UartSettings {
        UartSettings {
            baudrate: proto.resolve_speed(&SPEED_TABLE),
            parity: proto.parity(),
            stop_bits: proto.stop_bits(),
            timeout_ms,
        }
    }

    fn print_speed(proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        let index = proto.speed_index() as usize;
        if index < SPEED_TABLE.len() {
            write!(out, "{}={}bps", index + 1, SPEED_TABLE[index])
        } else {
            write!(out, "{}bps", proto.resolve_speed(&SPEED_TABLE))
        }
    }
}

impl<B: Backend> BusMode<B> for UartMode {
    fn name(&self) -> &'static str {
        "UART"
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        &PARAMETERS
    }

    fn prompt(&self, proto: &ModeConfig) -> &'static str {
        label(&PROMPTS, proto.device() as u32)
    }

    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let settings = Self::settings(ctx.proto, ctx.timeout_ms);
        ctx.backend.uart_init(ctx.proto.device(), &settings).check()
    }

    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.backend.uart_deinit(ctx.proto.device()).check()
    }

    fn start(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    fn start_read(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    fn stop(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    fn stop_read(&self, _ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Ok(())
    }

    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError> {
        ctx.backend.uart_write(ctx.proto.device(), tx).check()?;
        print_transfer(ctx.out, "WRITE", tx)?;
        Ok(())
    }

    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError> {
        ctx.backend.uart_read(ctx.proto.device(), rx).check()?;
        print_transfer(ctx.out, "READ", rx)?;
        Ok(())
    }

    fn write_read(
        &self,
        ctx: &mut ModeContext<'_, B>,
        tx: &[u8],
        rx: &mut [u8],
    ) -> Result<(), BusError> {
        ctx.backend
            .uart_write_read(ctx.proto.device(), tx, rx)
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
        write!(out, "Device: {}\r\nSpeed: ", label(&DEVICE_LABELS, proto.device() as u32))?;
        Self::print_speed(proto, out)?;
        write!(
            out,
            "\r\nParity: {}\r\nNb Stop Bit: {}",
            label(&PARITY_LABELS, proto.get(ParamField::Parity)),
            label(&STOP_BIT_LABELS, proto.get(ParamField::StopBits)),
        )
    }
}
