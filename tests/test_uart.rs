//! UART mode tests through the session engine.

#[allow(clippy::duplicate_mod)]
#[path = "helpers.rs"]
mod helpers;

use helpers::{Event, MockBackend, TestSession};
use polybus::{Parity, SessionState, StopBits, UartSettings};

#[test]
fn test_settings_scenario_uart1_115200() {
    let mut out = String::new();
    let mut session = TestSession::new(MockBackend::new());
    session.select_mode(3, &mut out).unwrap();
    session.configure(&["1", "9", "1", "1"], &mut out).unwrap();
    session.power_on(&mut out).unwrap();
    assert_eq!(session.state(), SessionState::Active);

    let mut settings = String::new();
    session.print_settings(&mut settings).unwrap();
    assert_eq!(
        settings,
        "Device: 1=UART1\r\nSpeed: 9=115200bps\r\nParity: 1=8/none\r\nNb Stop Bit: 1=1 stop"
    );

    assert_eq!(
        session.backend().events,
        vec![Event::UartInit(
            0,
            UartSettings {
                baudrate: 115_200,
                parity: Parity::None,
                stop_bits: StopBits::One,
                timeout_ms: 10_000,
            }
        )]
    );
}

#[test]
fn test_literal_baudrate() {
    let session = helpers::active_session(MockBackend::new(), 3, &["2", "250000", "3", "2"]);
    let mut settings = String::new();
    session.print_settings(&mut settings).unwrap();
    assert_eq!(
        settings,
        "Device: 2=UART2\r\nSpeed: 250000bps\r\nParity: 3=8/odd\r\nNb Stop Bit: 2=2 stop"
    );
    assert_eq!(session.prompt(), "uart2> ");

    let mut pins = String::new();
    session.print_pins(&mut pins).unwrap();
    assert_eq!(pins, "UART2 TX=PA2, RX=PA3");
}

#[test]
fn test_write_and_read_lines() {
    let backend = MockBackend::new().with_rx(&[0x12, 0x34]);
    let mut session = helpers::active_session(backend, 3, &["1", "9", "1", "1"]);

    let output = helpers::execute_ok(&mut session, "0x41 \"BC\" r:2");
    assert_eq!(output, "WRITE: 0x41 0x42 0x43 \r\nREAD: 0x12 0x34 \r\n");
    assert_eq!(
        session.backend().events,
        vec![Event::UartWrite(0, vec![0x41, 0x42, 0x43]), Event::UartRead(0, 2)]
    );
}

#[test]
fn test_single_byte_line_shape() {
    let mut session = helpers::active_session(MockBackend::new(), 3, &["1", "9", "1", "1"]);
    assert_eq!(helpers::execute_ok(&mut session, "0xA0"), "WRITE: 0xA0\r\n");
}

#[test]
fn test_combined_write_read() {
    let backend = MockBackend::new().with_rx(&[0x55]);
    let mut session = helpers::active_session(backend, 3, &["1", "9", "1", "1"]);

    let output = helpers::execute_ok(&mut session, "{ 0xAA }");
    assert_eq!(output, "WRITE: 0xAA READ: 0x55\r\n");
    assert_eq!(
        session.backend().events,
        vec![Event::UartWriteRead(0, vec![0xAA], 1)]
    );
}

#[test]
fn test_structural_and_raw_ops_are_noops() {
    let mut session = helpers::active_session(MockBackend::new(), 3, &["1", "9", "1", "1"]);
    let output = helpers::execute_ok(&mut session, "[ ] / \\ - _ ^");
    assert_eq!(output, "");
    assert!(session.backend().events.is_empty());
}

#[test]
fn test_macro_list() {
    let mut session = helpers::active_session(MockBackend::new(), 3, &["1", "9", "1", "1"]);
    assert_eq!(helpers::execute_ok(&mut session, "(0)"), "(0) List macros\r\n");
    let (result, _) = helpers::execute(&mut session, "(7)");
    assert_eq!(result, Err(polybus::BusError::UnknownMacro(7)));
}
