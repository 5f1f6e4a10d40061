//! I2C master mode.
//!
//! The peripheral generates clock and START/STOP conditions, but the
//! acknowledgment of received bytes is managed here. A read leaves its last
//! byte's acknowledgment owed (`ModeConfig::ack_pending`) so the user can
//! decide what comes next: another read or a write sends the owed ACK, a
//! START or STOP turns it into a NACK. Exactly one indicator line is printed
//! per resolution.

use super::{BusMode, ModeContext, label, print_macro_entry};
use crate::backend::{Ack, Backend, I2cSettings, Status};
use crate::error::BusError;
use crate::param::{Encoding, ModeConfig, ParamField, ParameterDescriptor, Radix};
use core::fmt::{self, Write};

/// SCL frequencies, by speed index.
pub const SPEED_TABLE: [u32; 4] = [50_000, 100_000, 400_000, 1_000_000];

/// The only I2C instance wired out.
const I2C_DEV: u8 = 0;

const PULL_LABELS: [&str; 3] = ["1=SCL/SDA NoPull", "2=SCL/SDA PullUp", "3=SCL/SDA PullDown"];
const SPEED_LABELS: [&str; 4] = ["1=50KHz", "2=100KHz", "3=400KHz", "4=1MHz"];

static PARAMETERS: [ParameterDescriptor; 2] = [
    ParameterDescriptor {
        min: 1,
        max: 3,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::GpioPull,
        help: "Choose I2C SCL/SDA pull (~40Kohm): 1=NoPull (external), 2=PullUp, 3=PullDown",
    },
    ParameterDescriptor {
        min: 1,
        max: 4,
        radix: Radix::Decimal,
        encoding: Encoding::OneBased,
        field: ParamField::Speed,
        help: "Choose I2C1 speed: 1=50KHz, 2=100KHz, 3=400KHz, 4=1MHz",
    },
];

/// I2C master bus mode.
#[derive(Debug, Copy, Clone, Default)]
pub struct I2cMode;

impl I2cMode {
    /// Master settings for the backend.
    pub fn settings(proto: &ModeConfig, timeout_ms: u32) -> I2cSettings {
        I2cSettings {
            frequency_hz: proto.resolve_speed(&SPEED_TABLE),
            pull: proto.gpio_pull(),
            timeout_ms,
        }
    }

    /// Send the acknowledgment owed by the last read, if any.
    fn resolve_pending<B: Backend>(ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        let Some(ack) = ctx.proto.ack_pending() else {
            return Ok(());
        };
        let status = ctx.backend.i2c_read_ack(I2C_DEV, ack);
        ctx.proto.set_ack_pending(None);
        write!(ctx.out, "{}\r\n", ack.as_str())?;
        status.check()
    }

    /// The read is over: whatever is owed goes out as NACK.
    fn end_read<B: Backend>(ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        if ctx.proto.ack_pending().is_some() {
            ctx.proto.set_ack_pending(Some(Ack::Nack));
        }
        Self::resolve_pending(ctx)
    }

    /// Probe every 7-bit address with a write address byte.
    ///
    /// A NACK only means nobody is home. A busy or timed-out bus aborts the
    /// scan with a transport error.
    fn scan<B: Backend>(ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::end_read(ctx)?;

        let mut found = 0u32;
        for addr in 0u8..0x80 {
            ctx.backend.i2c_start(I2C_DEV).check()?;
            let (status, ack) = ctx.backend.i2c_write_byte(I2C_DEV, addr << 1);
            if let Status::Busy | Status::Timeout = status {
                return Err(BusError::Backend(status));
            }
            ctx.backend.i2c_stop(I2C_DEV).check()?;

            if ack == Ack::Ack {
                found += 1;
                write!(
                    ctx.out,
                    "Device found at address 0x{:02X} (W 0x{:02X} R 0x{:02X})\r\n",
                    addr,
                    addr << 1,
                    (addr << 1) | 1
                )?;
            }
        }
        write!(ctx.out, "I2C scan: {} device(s) found\r\n", found)?;
        Ok(())
    }
}

impl<B: Backend> BusMode<B> for I2cMode {
    fn name(&self) -> &'static str {
        "I2C"
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        &PARAMETERS
    }

    fn prompt(&self, _proto: &ModeConfig) -> &'static str {
        "i2c1> "
    }

    fn setup_exec(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.proto.set_ack_pending(None);
        let settings = Self::settings(ctx.proto, ctx.timeout_ms);
        ctx.backend.i2c_init(I2C_DEV, &settings).check()
    }

    fn cleanup(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        ctx.proto.set_ack_pending(None);
        ctx.backend.i2c_deinit(I2C_DEV).check()
    }

    fn start(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::end_read(ctx)?;
        ctx.backend.i2c_start(I2C_DEV).check()?;
        ctx.out.write_str("I2C START\r\n")?;
        Ok(())
    }

    // A repeated START is the same condition on this bus.
    fn start_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        BusMode::<B>::start(self, ctx)
    }

    fn stop(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        Self::end_read(ctx)?;
        ctx.backend.i2c_stop(I2C_DEV).check()?;
        ctx.out.write_str("I2C STOP\r\n")?;
        Ok(())
    }

    fn stop_read(&self, ctx: &mut ModeContext<'_, B>) -> Result<(), BusError> {
        BusMode::<B>::stop(self, ctx)
    }

    fn write(&self, ctx: &mut ModeContext<'_, B>, tx: &[u8]) -> Result<(), BusError> {
        Self::resolve_pending(ctx)?;
        if tx.is_empty() {
            return Ok(());
        }

        ctx.out.write_str("WRITE: ")?;
        let mut status = Status::Ok;
        for &byte in tx {
            let (byte_status, ack) = ctx.backend.i2c_write_byte(I2C_DEV, byte);
            write!(ctx.out, "0x{:02X} {} ", byte, ack.as_str())?;

            // A NACKed byte ends the transfer like a bus error does.
            status = match (byte_status, ack) {
                (Status::Ok, Ack::Nack) => Status::Error,
                (s, _) => s,
            };
            if !status.is_ok() {
                break;
            }
        }
        ctx.out.write_str("\r\n")?;
        status.check()
    }

    fn read(&self, ctx: &mut ModeContext<'_, B>, rx: &mut [u8]) -> Result<(), BusError> {
        if rx.is_empty() {
            return Ok(());
        }

        ctx.out.write_str("READ: ")?;
        for slot in rx.iter_mut() {
            if let Some(ack) = ctx.proto.ack_pending() {
                let status = ctx.backend.i2c_read_ack(I2C_DEV, ack);
                write!(ctx.out, "{} ", ack.as_str())?;
                if let Err(e) = status.check() {
                    ctx.out.write_str("\r\n")?;
                    return Err(e);
                }
            }

            let (status, byte) = ctx.backend.i2c_read_byte(I2C_DEV);
            *slot = byte;
            write!(ctx.out, "0x{:02X} ", byte)?;
            if let Err(e) = status.check() {
                ctx.out.write_str("\r\n")?;
                return Err(e);
            }
            ctx.proto.set_ack_pending(Some(Ack::Ack));
        }
        ctx.out.write_str("\r\n")?;
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

    fn run_macro(&self, ctx: &mut ModeContext<'_, B>, num: u32) -> Result<(), BusError> {
        match num {
            0 => {
                print_macro_entry(ctx.out, 0, "List macros")?;
                print_macro_entry(ctx.out, 1, "Scan I2C bus")?;
                Ok(())
            }
            1 => Self::scan(ctx),
            _ => Err(BusError::UnknownMacro(num)),
        }
    }

    fn print_pins(&self, _proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        out.write_str("I2C1 SCL=PB6, SDA=PB7")
    }

    fn print_settings(&self, proto: &ModeConfig, out: &mut dyn Write) -> fmt::Result {
        write!(
            out,
            "GPIO Pull: {}\r\nSpeed: {}",
            label(&PULL_LABELS, proto.get(ParamField::GpioPull)),
            label(&SPEED_LABELS, proto.speed_index()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GpioPull;

    #[test]
    fn test_settings() {
        let mut proto = ModeConfig::new();
        proto.set(ParamField::GpioPull, 1);
        proto.set(ParamField::Speed, 2);
        let s = I2cMode::settings(&proto, 5);
        assert_eq!(s.frequency_hz, 400_000);
        assert_eq!(s.pull, GpioPull::PullUp);
        assert_eq!(s.timeout_ms, 5);
    }

    #[test]
    fn test_print_settings() {
        let mut proto = ModeConfig::new();
        proto.set(ParamField::GpioPull, 1);
        proto.set(ParamField::Speed, 1);
        let mut out = heapless::String::<64>::new();
        BusMode::<crate::backend::tests_support::NullBackend>::print_settings(
            &I2cMode, &proto, &mut out,
        )
        .unwrap();
        assert_eq!(out.as_str(), "GPIO Pull: 2=SCL/SDA PullUp\r\nSpeed: 2=100KHz");
    }
}
