//! Session engine: mode lifecycle, dispatch and transport error recovery.
//!
//! A `Session` owns the device backend and at most one selected mode with
//! its live configuration. State transitions:
//!
//! ```text
//! Unselected --select_mode--> Configuring --power_on--> Active
//!     ^                           ^  |                    |  ^
//!     |                           |  +----configure-------+  |
//!     +-------deselect------------+--------power_off---------+
//!                                    Active --transport error--> Recovering
//!                                    Recovering --re-init ok--> Active
//!                                    Recovering --re-init failed--> Configuring
//! ```
//!
//! Every bus operation goes through the same path: state check, call into
//! the mode, and on a transport error one deinit/init cycle with the
//! unchanged configuration before the error is returned.

use crate::backend::{Backend, Status};
use crate::config::{SessionConfig, TRANSFER_CAPACITY};
use crate::error::BusError;
use crate::mode::{BusMode, ModeContext, ModeKind, get_mode};
use crate::param::{Completeness, ModeConfig};
use core::fmt::{self, Write};
use core::marker::PhantomData;

pub mod command;

pub use command::{Token, Tokens};

/// Prompt shown while no mode is selected.
pub const IDLE_PROMPT: &str = "> ";

/// Session lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-logging", derive(defmt::Format))]
pub enum SessionState {
    /// No mode selected
    Unselected,

    /// Mode selected, device powered off
    Configuring,

    /// Device powered on, bus operations allowed
    Active,

    /// Re-initializing the device after a transport error
    Recovering,
}

/// The engine behind a bus console.
///
/// Generic over the device backend `B` and the sizing configuration `C`.
pub struct Session<B: Backend, C: SessionConfig> {
    backend: B,
    mode: Option<ModeKind>,
    proto: ModeConfig,
    state: SessionState,
    _config: PhantomData<C>,
}

impl<B: Backend, C: SessionConfig> fmt::Debug for Session<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("proto", &self.proto)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Largest transfer a session accepts in one call.
const fn transfer_limit<C: SessionConfig>() -> usize {
    if C::MAX_TRANSFER < TRANSFER_CAPACITY {
        C::MAX_TRANSFER
    } else {
        TRANSFER_CAPACITY
    }
}

impl<B: Backend, C: SessionConfig> Session<B, C> {
    /// Create a session with no mode selected.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            mode: None,
            proto: ModeConfig::new(),
            state: SessionState::Unselected,
            _config: PhantomData,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Selected mode, if any.
    pub fn mode(&self) -> Option<ModeKind> {
        self.mode
    }

    /// Live configuration of the selected mode.
    pub fn config(&self) -> &ModeConfig {
        &self.proto
    }

    /// Shared access to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Exclusive access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Give the backend back, releasing the selected mode first.
    pub fn into_backend(mut self, out: &mut dyn Write) -> B {
        self.deselect(out);
        self.backend
    }

    /// Select mode `index` (1-based). The previous mode, if any, is cleaned
    /// up first.
    pub fn select_mode(&mut self, index: usize, out: &mut dyn Write) -> Result<(), BusError> {
        let kind = get_mode(index).ok_or(BusError::UnknownMode(index))?;
        self.deselect(out);

        BusMode::<B>::setup(&kind, &mut self.proto);
        self.mode = Some(kind);
        self.state = SessionState::Configuring;
        bus_info!("mode selected: {}", kind);
        Ok(())
    }

    /// Release the selected mode and return to `Unselected`.
    ///
    /// Cleanup runs whether or not the device was ever powered on. Its
    /// errors are logged and dropped. Calling this with no mode selected
    /// does nothing.
    pub fn deselect(&mut self, out: &mut dyn Write) {
        let Some(kind) = self.mode.take() else {
            return;
        };
        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        if let Err(e) = kind.cleanup(&mut ctx) {
            bus_warn!("cleanup failed: {}", e);
        }
        self.proto = ModeConfig::new();
        self.state = SessionState::Unselected;
        bus_info!("mode deselected");
    }

    /// Feed configuration arguments to the selected mode.
    ///
    /// With no arguments, prints the parameter help. A powered-on device is
    /// re-initialized when its configuration changes.
    pub fn configure(&mut self, args: &[&str], out: &mut dyn Write) -> Result<Completeness, BusError> {
        let kind = self.mode.ok_or(BusError::NoModeSelected)?;
        let args = &args[..args.len().min(C::MAX_ARGS)];

        let mut next = self.proto;
        let completeness = BusMode::<B>::configure(&kind, &mut next, args, out)?;
        if next == self.proto {
            return Ok(completeness);
        }

        if self.state == SessionState::Active {
            // The old configuration names the peripheral to release.
            bus_debug!("configuration changed while active, re-initializing");
            self.state = SessionState::Recovering;
            self.release(kind, out);
            self.proto = next;
            self.restore(kind, out)?;
        } else {
            self.proto = next;
        }
        Ok(completeness)
    }

    /// Power on the device (`W`). Stays in `Configuring` on failure.
    pub fn power_on(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        let kind = self.mode.ok_or(BusError::NoModeSelected)?;
        if self.state == SessionState::Active {
            return Ok(());
        }

        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        match kind.setup_exec(&mut ctx) {
            Ok(()) => {
                self.state = SessionState::Active;
                bus_info!("device powered on");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Configuring;
                bus_error!("power on failed: {}", e);
                Err(e)
            }
        }
    }

    /// Power off the device (`w`). The mode stays selected.
    pub fn power_off(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        let kind = self.mode.ok_or(BusError::NoModeSelected)?;
        if self.state != SessionState::Active {
            return Ok(());
        }

        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        if let Err(e) = kind.cleanup(&mut ctx) {
            bus_warn!("cleanup failed: {}", e);
        }
        self.state = SessionState::Configuring;
        Ok(())
    }

    fn active_mode(&self) -> Result<ModeKind, BusError> {
        match (self.mode, self.state) {
            (None, _) => Err(BusError::NoModeSelected),
            (Some(kind), SessionState::Active) => Ok(kind),
            (Some(_), _) => Err(BusError::NotActive),
        }
    }

    /// Deinit then init with the current configuration.
    ///
    /// On success the session is `Active` again; otherwise it falls back to
    /// `Configuring` and reports `RecoveryFailed`.
    fn reinit(&mut self, kind: ModeKind, out: &mut dyn Write) -> Result<(), BusError> {
        self.state = SessionState::Recovering;
        self.release(kind, out);
        self.restore(kind, out)
    }

    /// Cleanup half of a re-init. Errors are logged and dropped.
    fn release(&mut self, kind: ModeKind, out: &mut dyn Write) {
        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        if let Err(e) = kind.cleanup(&mut ctx) {
            bus_warn!("cleanup during recovery failed: {}", e);
        }
    }

    /// Init half of a re-init.
    fn restore(&mut self, kind: ModeKind, out: &mut dyn Write) -> Result<(), BusError> {
        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        match kind.setup_exec(&mut ctx) {
            Ok(()) => {
                self.state = SessionState::Active;
                bus_info!("device re-initialized");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Configuring;
                let status = match e {
                    BusError::Backend(status) => status,
                    _ => Status::Error,
                };
                bus_error!("device re-init failed: {}", status);
                Err(BusError::RecoveryFailed(status))
            }
        }
    }

    /// Run `op` on the active mode, recovering the device on transport
    /// errors.
    fn dispatch<T>(
        &mut self,
        out: &mut dyn Write,
        op: impl FnOnce(ModeKind, &mut ModeContext<'_, B>) -> Result<T, BusError>,
    ) -> Result<T, BusError> {
        let kind = self.active_mode()?;
        let result = {
            let mut ctx = ModeContext {
                proto: &mut self.proto,
                backend: &mut self.backend,
                out: &mut *out,
                timeout_ms: C::TRANSFER_TIMEOUT_MS,
            };
            op(kind, &mut ctx)
        };

        if let Err(e) = &result {
            if e.is_transport() {
                bus_warn!("transport error: {}", e);
                self.reinit(kind, out)?;
            }
        }
        result
    }

    /// `[`
    pub fn start(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.start(ctx))
    }

    /// `{`
    pub fn start_read(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.start_read(ctx))
    }

    /// `]`
    pub fn stop(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.stop(ctx))
    }

    /// `}`
    pub fn stop_read(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.stop_read(ctx))
    }

    /// Transmit `tx`.
    pub fn write(&mut self, tx: &[u8], out: &mut dyn Write) -> Result<(), BusError> {
        if tx.len() > transfer_limit::<C>() {
            return Err(BusError::BufferFull);
        }
        self.dispatch(out, |m, ctx| m.write(ctx, tx))
    }

    /// Receive `rx.len()` bytes.
    pub fn read(&mut self, rx: &mut [u8], out: &mut dyn Write) -> Result<(), BusError> {
        if rx.len() > transfer_limit::<C>() {
            return Err(BusError::BufferFull);
        }
        self.dispatch(out, |m, ctx| m.read(ctx, rx))
    }

    /// Transmit `tx` and receive `rx.len()` bytes as one operation.
    pub fn write_read(&mut self, tx: &[u8], rx: &mut [u8], out: &mut dyn Write) -> Result<(), BusError> {
        if tx.len().max(rx.len()) > transfer_limit::<C>() {
            return Err(BusError::BufferFull);
        }
        self.dispatch(out, |m, ctx| m.write_read(ctx, tx, rx))
    }

    /// `/`
    pub fn clock_high(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.clock_high(ctx))
    }

    /// `\`
    pub fn clock_low(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.clock_low(ctx))
    }

    /// `-`
    pub fn data_high(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.data_high(ctx))
    }

    /// `_`
    pub fn data_low(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.data_low(ctx))
    }

    /// `!`
    pub fn data_sample(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.data_sample(ctx))
    }

    /// `^`
    pub fn clock_tick(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.clock_tick(ctx))
    }

    /// `.`
    pub fn bit_read(&mut self, out: &mut dyn Write) -> Result<(), BusError> {
        self.dispatch(out, |m, ctx| m.bit_read(ctx))
    }

    /// `(num)`
    pub fn run_macro(&mut self, num: u32, out: &mut dyn Write) -> Result<(), BusError> {
        if num > C::MAX_MACRO {
            return Err(BusError::UnknownMacro(num));
        }
        self.dispatch(out, |m, ctx| m.run_macro(ctx, num))
    }

    /// Idle tick. Returns whether the mode did anything; always `false`
    /// unless a device is powered on.
    pub fn periodic(&mut self, out: &mut dyn Write) -> bool {
        let Ok(kind) = self.active_mode() else {
            return false;
        };
        let mut ctx = ModeContext {
            proto: &mut self.proto,
            backend: &mut self.backend,
            out,
            timeout_ms: C::TRANSFER_TIMEOUT_MS,
        };
        kind.periodic(&mut ctx)
    }

    /// Execute one bus command line.
    ///
    /// The line is checked in full before anything runs, so a syntax error
    /// never leaves a half-sent transaction. Consecutive bytes and strings
    /// are sent as one transfer; inside `{ ... }` they are sent with
    /// combined write-read. Execution stops at the first error.
    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> Result<(), BusError> {
        Tokens::validate(line)?;

        let mut pending: heapless::Vec<u8, TRANSFER_CAPACITY> = heapless::Vec::new();
        let mut duplex = false;

        for item in Tokens::new(line) {
            let (_, token) = item?;
            match token {
                Token::Byte { value, count } => {
                    if count > transfer_limit::<C>().saturating_sub(pending.len()) {
                        return Err(BusError::BufferFull);
                    }
                    for _ in 0..count {
                        pending.push(value).map_err(|_| BusError::BufferFull)?;
                    }
                    continue;
                }
                Token::Text(text) => {
                    if text.len() > transfer_limit::<C>().saturating_sub(pending.len()) {
                        return Err(BusError::BufferFull);
                    }
                    pending
                        .extend_from_slice(text.as_bytes())
                        .map_err(|_| BusError::BufferFull)?;
                    continue;
                }
                _ => {}
            }

            self.flush(&mut pending, duplex, out)?;
            match token {
                Token::Start => self.start(out)?,
                Token::StartRead => {
                    self.start_read(out)?;
                    duplex = true;
                }
                Token::Stop => self.stop(out)?,
                Token::StopRead => {
                    self.stop_read(out)?;
                    duplex = false;
                }
                Token::ClockHigh => self.clock_high(out)?,
                Token::ClockLow => self.clock_low(out)?,
                Token::DataHigh => self.data_high(out)?,
                Token::DataLow => self.data_low(out)?,
                Token::DataSample => self.data_sample(out)?,
                Token::ClockTick => self.clock_tick(out)?,
                Token::BitRead => self.bit_read(out)?,
                Token::PowerOn => self.power_on(out)?,
                Token::PowerOff => self.power_off(out)?,
                Token::Macro(num) => self.run_macro(num, out)?,
                Token::Read(count) => {
                    if count > transfer_limit::<C>() {
                        return Err(BusError::BufferFull);
                    }
                    let mut rx = [0u8; TRANSFER_CAPACITY];
                    self.read(&mut rx[..count], out)?;
                }
                Token::Byte { .. } | Token::Text(_) => {}
            }
        }
        self.flush(&mut pending, duplex, out)
    }

    /// Send accumulated bytes as one transfer.
    fn flush(
        &mut self,
        pending: &mut heapless::Vec<u8, TRANSFER_CAPACITY>,
        duplex: bool,
        out: &mut dyn Write,
    ) -> Result<(), BusError> {
        if pending.is_empty() {
            return Ok(());
        }
        let result = if duplex {
            let mut rx = [0u8; TRANSFER_CAPACITY];
            let n = pending.len();
            self.write_read(&pending[..], &mut rx[..n], out)
        } else {
            self.write(&pending[..], out)
        };
        pending.clear();
        result
    }

    /// Current prompt: the mode's, or `"> "` with no mode selected.
    pub fn prompt(&self) -> &'static str {
        match self.mode {
            Some(kind) => BusMode::<B>::prompt(&kind, &self.proto),
            None => IDLE_PROMPT,
        }
    }

    /// Mode name. Prints nothing with no mode selected.
    pub fn print_name(&self, out: &mut dyn Write) -> fmt::Result {
        match self.mode {
            Some(kind) => out.write_str(BusMode::<B>::name(&kind)),
            None => Ok(()),
        }
    }

    /// Current parameters as the user would type them.
    pub fn print_parameters(&self, out: &mut dyn Write) -> fmt::Result {
        match self.mode {
            Some(kind) => BusMode::<B>::print_parameters(&kind, &self.proto, out),
            None => Ok(()),
        }
    }

    /// Pins in use.
    pub fn print_pins(&self, out: &mut dyn Write) -> fmt::Result {
        match self.mode {
            Some(kind) => BusMode::<B>::print_pins(&kind, &self.proto, out),
            None => Ok(()),
        }
    }

    /// Human-readable settings.
    pub fn print_settings(&self, out: &mut dyn Write) -> fmt::Result {
        match self.mode {
            Some(kind) => BusMode::<B>::print_settings(&kind, &self.proto, out),
            None => Ok(()),
        }
    }

    /// One line per registered mode, `index=NAME`.
    pub fn print_modes(out: &mut dyn Write) -> fmt::Result {
        for kind in ModeKind::ALL {
            write!(out, "{}={}\r\n", kind.index(), BusMode::<B>::name(&kind))?;
        }
        Ok(())
    }
}
