//! Mode configuration and the parameter validation engine.
//!
//! Each mode declares its configurable values as a static slice of
//! `ParameterDescriptor`s. User tokens are validated against those
//! declarations one position at a time and written into the session's
//! `ModeConfig`. The descriptor's `encoding` is the single place where a
//! user-facing value is translated to its stored form and back.

use crate::error::BusError;
use crate::backend::{Ack, BitOrder, GpioPull, Parity, StopBits};
use core::fmt::Write;

/// `ModeConfig` field targeted by a descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamField {
    /// Peripheral instance
    Device,
    /// Speed table index or literal rate
    Speed,
    /// UART parity
    Parity,
    /// UART stop bits
    StopBits,
    /// Pin pull resistors
    GpioPull,
    /// SPI clock polarity
    Polarity,
    /// SPI clock phase
    Phase,
    /// Bit order
    BitOrder,
}

/// How a token's digits are read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Radix {
    /// Plain decimal digits
    Decimal,
    /// Hex digits, `0x` prefix optional
    Hex,
}

/// Translation between the value a user types and the value stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Stored as typed
    Raw,
    /// User choices count from 1, storage from 0
    OneBased,
}

impl Encoding {
    /// User value to stored value.
    pub fn decode(self, value: u32) -> u32 {
        match self {
            Encoding::Raw => value,
            Encoding::OneBased => value.saturating_sub(1),
        }
    }

    /// Stored value to user value.
    pub fn encode(self, stored: u32) -> u32 {
        match self {
            Encoding::Raw => stored,
            Encoding::OneBased => stored.saturating_add(1),
        }
    }
}

/// Static declaration of one configurable value.
///
/// Invariant: `min <= max`. Descriptors are compiled in and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDescriptor {
    /// Smallest accepted user value
    pub min: u32,
    /// Largest accepted user value
    pub max: u32,
    /// Digit format
    pub radix: Radix,
    /// User/stored translation
    pub encoding: Encoding,
    /// Target field
    pub field: ParamField,
    /// One-line help text, printed when no arguments are given
    pub help: &'static str,
}

impl ParameterDescriptor {
    /// Parse `token` and check it against the bounds.
    ///
    /// Returns the user-facing value, not the stored one.
    pub fn parse(&self, token: &str) -> Option<u32> {
        let value = match self.radix {
            Radix::Decimal => parse_digits(token, 10)?,
            Radix::Hex => {
                let digits = token
                    .strip_prefix("0x")
                    .or_else(|| token.strip_prefix("0X"))
                    .unwrap_or(token);
                parse_digits(digits, 16)?
            }
        };
        (self.min..=self.max).contains(&value).then_some(value)
    }
}

fn parse_digits(digits: &str, radix: u32) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

/// Per-session protocol configuration.
///
/// Created zeroed when a mode is selected. Only the validation engine and
/// mode operations mutate it; fields meaningless to a protocol are ignored.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ModeConfig {
    device: u32,
    speed: u32,
    parity: u32,
    stop_bits: u32,
    gpio_pull: u32,
    polarity: u32,
    phase: u32,
    bit_order: u32,
    ack_pending: Option<Ack>,
}

impl ModeConfig {
    /// Fresh, zeroed configuration.
    pub const fn new() -> Self {
        Self {
            device: 0,
            speed: 0,
            parity: 0,
            stop_bits: 0,
            gpio_pull: 0,
            polarity: 0,
            phase: 0,
            bit_order: 0,
            ack_pending: None,
        }
    }

    /// Stored (0-based) value of `field`.
    pub fn get(&self, field: ParamField) -> u32 {
        match field {
            ParamField::Device => self.device,
            ParamField::Speed => self.speed,
            ParamField::Parity => self.parity,
            ParamField::StopBits => self.stop_bits,
            ParamField::GpioPull => self.gpio_pull,
            ParamField::Polarity => self.polarity,
            ParamField::Phase => self.phase,
            ParamField::BitOrder => self.bit_order,
        }
    }

    pub(crate) fn set(&mut self, field: ParamField, stored: u32) {
        let slot = match field {
            ParamField::Device => &mut self.device,
            ParamField::Speed => &mut self.speed,
            ParamField::Parity => &mut self.parity,
            ParamField::StopBits => &mut self.stop_bits,
            ParamField::GpioPull => &mut self.gpio_pull,
            ParamField::Polarity => &mut self.polarity,
            ParamField::Phase => &mut self.phase,
            ParamField::BitOrder => &mut self.bit_order,
        };
        *slot = stored;
    }

    /// Peripheral instance (0 = first).
    pub fn device(&self) -> u8 {
        self.device as u8
    }

    /// Stored speed selector.
    pub fn speed_index(&self) -> u32 {
        self.speed
    }

    /// Resolve the speed selector against a mode's rate table.
    ///
    /// Selectors inside the table are indices; anything larger is a literal
    /// rate stored one-based like every other choice.
    pub fn resolve_speed(&self, table: &[u32]) -> u32 {
        match table.get(self.speed as usize) {
            Some(rate) => *rate,
            None => self.speed.saturating_add(1),
        }
    }

    /// UART parity.
    pub fn parity(&self) -> Parity {
        match self.parity {
            1 => Parity::Even,
            2 => Parity::Odd,
            _ => Parity::None,
        }
    }

    /// UART stop bits.
    pub fn stop_bits(&self) -> StopBits {
        match self.stop_bits {
            0 => StopBits::One,
            _ => StopBits::Two,
        }
    }

    /// Pin pull resistors.
    pub fn gpio_pull(&self) -> GpioPull {
        match self.gpio_pull {
            1 => GpioPull::PullUp,
            2 => GpioPull::PullDown,
            _ => GpioPull::NoPull,
        }
    }

    /// SPI CPOL=1.
    pub fn clock_idle_high(&self) -> bool {
        self.polarity != 0
    }

    /// SPI CPHA=1.
    pub fn second_edge(&self) -> bool {
        self.phase != 0
    }

    /// Bit order.
    pub fn bit_order(&self) -> BitOrder {
        match self.bit_order {
            0 => BitOrder::MsbFirst,
            _ => BitOrder::LsbFirst,
        }
    }

    /// Acknowledgment still owed by the last byte read, if any.
    ///
    /// `None` when nothing is owed. A read leaves `Ack` owed; a START or
    /// STOP turns it into `Nack` before resolving it.
    pub fn ack_pending(&self) -> Option<Ack> {
        self.ack_pending
    }

    pub(crate) fn set_ack_pending(&mut self, pending: Option<Ack>) {
        self.ack_pending = pending;
    }
}

/// Result of feeding a full argument list to a mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completeness {
    /// No arguments: help text was printed, nothing validated
    Help,
    /// Some arguments validated, more are needed
    Incomplete {
        /// Arguments validated
        received: usize,
        /// Arguments declared
        expected: usize,
    },
    /// Every declared argument validated
    Complete,
}

/// Validate the argument at `arg_index` and store it.
///
/// - No arguments at all: prints every descriptor's help line and returns
///   `Ok(None)` without validating anything.
/// - `arg_index` past the declarations or past the supplied tokens:
///   `Ok(None)`, nothing written.
/// - Malformed or out-of-range token: `Err(BusError::InvalidArgument)`,
///   `proto` untouched.
/// - Otherwise the decoded value is written to the descriptor's field and
///   the user-facing value is returned.
pub fn validate_arg(
    args: &[&str],
    decls: &[ParameterDescriptor],
    arg_index: usize,
    proto: &mut ModeConfig,
    out: &mut dyn Write,
) -> Result<Option<u32>, BusError> {
    if args.is_empty() {
        print_help(decls, out)?;
        return Ok(None);
    }

    let (Some(decl), Some(token)) = (decls.get(arg_index), args.get(arg_index)) else {
        return Ok(None);
    };

    let value = decl
        .parse(token)
        .ok_or(BusError::InvalidArgument { arg_index })?;
    proto.set(decl.field, decl.encoding.decode(value));
    Ok(Some(value))
}

/// Validate a whole argument list.
///
/// Extra arguments past the declared count are dropped. All tokens are
/// checked against a scratch copy, so `proto` only changes when every
/// supplied token is valid.
pub fn configure(
    args: &[&str],
    decls: &[ParameterDescriptor],
    proto: &mut ModeConfig,
    out: &mut dyn Write,
) -> Result<Completeness, BusError> {
    if args.is_empty() {
        print_help(decls, out)?;
        return Ok(Completeness::Help);
    }

    let args = &args[..args.len().min(decls.len())];
    let mut scratch = *proto;
    for arg_index in 0..args.len() {
        validate_arg(args, decls, arg_index, &mut scratch, out)?;
    }
    *proto = scratch;

    if args.len() == decls.len() {
        Ok(Completeness::Complete)
    } else {
        Ok(Completeness::Incomplete {
            received: args.len(),
            expected: decls.len(),
        })
    }
}

/// Print one help line per descriptor, in declared order.
pub fn print_help(decls: &[ParameterDescriptor], out: &mut dyn Write) -> Result<(), BusError> {
    for decl in decls {
        write!(out, "{}\r\n", decl.help)?;
    }
    Ok(())
}

/// Print the current values as the user would type them, space separated.
pub fn print_values(
    decls: &[ParameterDescriptor],
    proto: &ModeConfig,
    out: &mut dyn Write,
) -> core::fmt::Result {
    for (i, decl) in decls.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        let value = decl.encoding.encode(proto.get(decl.field));
        match decl.radix {
            Radix::Decimal => write!(out, "{}", value)?,
            Radix::Hex => write!(out, "{:#x}", value)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECLS: &[ParameterDescriptor] = &[
        ParameterDescriptor {
            min: 1,
            max: 2,
            radix: Radix::Decimal,
            encoding: Encoding::OneBased,
            field: ParamField::Device,
            help: "device",
        },
        ParameterDescriptor {
            min: 0x10,
            max: 0x7F,
            radix: Radix::Hex,
            encoding: Encoding::Raw,
            field: ParamField::Speed,
            help: "speed",
        },
    ];

    #[test]
    fn test_encoding_roundtrip() {
        assert_eq!(Encoding::OneBased.decode(1), 0);
        assert_eq!(Encoding::OneBased.encode(0), 1);
        assert_eq!(Encoding::Raw.decode(42), 42);
        assert_eq!(Encoding::Raw.encode(42), 42);
    }

    #[test]
    fn test_hex_radix() {
        assert_eq!(DECLS[1].parse("0x20"), Some(0x20));
        assert_eq!(DECLS[1].parse("7f"), Some(0x7F));
        assert_eq!(DECLS[1].parse("0x80"), None);
        assert_eq!(DECLS[1].parse("0x"), None);
    }

    #[test]
    fn test_decimal_rejects_signs_and_junk() {
        assert_eq!(DECLS[0].parse("+1"), None);
        assert_eq!(DECLS[0].parse("-1"), None);
        assert_eq!(DECLS[0].parse("1a"), None);
        assert_eq!(DECLS[0].parse(""), None);
        assert_eq!(DECLS[0].parse("99999999999"), None);
    }

    #[test]
    fn test_validate_writes_decoded_value() {
        let mut proto = ModeConfig::new();
        let mut out = heapless::String::<64>::new();
        let v = validate_arg(&["2", "0x30"], DECLS, 0, &mut proto, &mut out).unwrap();
        assert_eq!(v, Some(2));
        assert_eq!(proto.device(), 1);
        let v = validate_arg(&["2", "0x30"], DECLS, 1, &mut proto, &mut out).unwrap();
        assert_eq!(v, Some(0x30));
        assert_eq!(proto.speed_index(), 0x30);
        assert!(out.is_empty());
    }

    #[test]
    fn test_validate_past_end_is_ignored() {
        let mut proto = ModeConfig::new();
        let mut out = heapless::String::<64>::new();
        assert_eq!(
            validate_arg(&["1", "0x20", "9"], DECLS, 2, &mut proto, &mut out),
            Ok(None)
        );
        assert_eq!(validate_arg(&["1"], DECLS, 1, &mut proto, &mut out), Ok(None));
        assert_eq!(proto, ModeConfig::new());
    }

    #[test]
    fn test_configure_is_atomic() {
        let mut proto = ModeConfig::new();
        let mut out = heapless::String::<64>::new();
        let r = configure(&["2", "0x99"], DECLS, &mut proto, &mut out);
        assert_eq!(r, Err(BusError::InvalidArgument { arg_index: 1 }));
        assert_eq!(proto, ModeConfig::new());
    }

    #[test]
    fn test_resolve_speed() {
        let table = [300, 1200, 2400];
        let mut proto = ModeConfig::new();
        proto.set(ParamField::Speed, 2);
        assert_eq!(proto.resolve_speed(&table), 2400);
        proto.set(ParamField::Speed, 249_999);
        assert_eq!(proto.resolve_speed(&table), 250_000);
    }

    #[test]
    fn test_print_values() {
        let mut proto = ModeConfig::new();
        proto.set(ParamField::Device, 1);
        proto.set(ParamField::Speed, 0x42);
        let mut out = heapless::String::<16>::new();
        print_values(DECLS, &proto, &mut out).unwrap();
        assert_eq!(out.as_str(), "2 0x42");

        // What is printed parses back to the same stored value.
        let mut reparsed = ModeConfig::new();
        let printed = out.clone();
        let args: heapless::Vec<&str, 2> = printed.split(' ').collect();
        configure(&args, DECLS, &mut reparsed, &mut heapless::String::<16>::new()).unwrap();
        assert_eq!(reparsed, proto);
    }

    #[test]
    fn test_typed_accessors_default() {
        let proto = ModeConfig::new();
        assert_eq!(proto.parity(), Parity::None);
        assert_eq!(proto.stop_bits(), StopBits::One);
        assert_eq!(proto.gpio_pull(), GpioPull::NoPull);
        assert_eq!(proto.bit_order(), BitOrder::MsbFirst);
        assert!(!proto.clock_idle_high());
        assert!(!proto.second_edge());
        assert_eq!(proto.ack_pending(), None);
    }
}
