//! SPI mode tests: chip select framing and full-duplex transfers.

#[allow(clippy::duplicate_mod)]
#[path = "helpers.rs"]
mod helpers;

use helpers::{Event, MockBackend};
use polybus::{BitOrder, BusError, GpioPull, SessionState, SpiSettings, Status};

#[test]
fn test_power_on_settings() {
    let mut out = String::new();
    let mut session = helpers::TestSession::new(MockBackend::new());
    session.select_mode(1, &mut out).unwrap();
    session.configure(&["2", "2", "2", "2", "4", "2"], &mut out).unwrap();
    session.power_on(&mut out).unwrap();

    assert_eq!(
        session.backend().events,
        vec![Event::SpiInit(
            1,
            SpiSettings {
                frequency_hz: 1_310_000,
                pull: GpioPull::PullUp,
                clock_idle_high: true,
                second_edge: true,
                bit_order: BitOrder::LsbFirst,
                timeout_ms: 10_000,
            }
        )]
    );
    assert_eq!(session.prompt(), "spi2> ");

    let mut pins = String::new();
    session.print_pins(&mut pins).unwrap();
    assert_eq!(pins, "SPI2 CS=PC1, SCK=PB10, MISO=PC2, MOSI=PC3");
}

#[test]
fn test_write_transaction() {
    let mut session = helpers::active_session(MockBackend::new(), 1, &["1", "1", "1", "1", "1", "1"]);
    let output = helpers::execute_ok(&mut session, "[0x03 0x00 0x10 r:2]");
    assert_eq!(
        output,
        "/CS ENABLED\r\nWRITE: 0x03 0x00 0x10 \r\nREAD: 0x00 0x00 \r\n/CS DISABLED\r\n"
    );
    assert_eq!(
        session.backend().events,
        vec![
            Event::SpiSelect(0, true),
            Event::SpiWrite(0, vec![0x03, 0x00, 0x10]),
            Event::SpiRead(0, 2),
            Event::SpiSelect(0, false),
        ]
    );
}

#[test]
fn test_full_duplex_inside_braces() {
    let backend = MockBackend::new().with_rx(&[0x00, 0xEF, 0x40]);
    let mut session = helpers::active_session(backend, 1, &["1", "1", "1", "1", "1", "1"]);

    let output = helpers::execute_ok(&mut session, "{0x9F 0 0} 0x06");
    assert_eq!(
        output,
        "/CS ENABLED\r\n\
         WRITE: 0x9F READ: 0x00\r\n\
         WRITE: 0x00 READ: 0xEF\r\n\
         WRITE: 0x00 READ: 0x40\r\n\
         /CS DISABLED\r\n\
         WRITE: 0x06\r\n"
    );
    assert_eq!(
        session.backend().bus_events()[1],
        Event::SpiWriteRead(0, vec![0x9F, 0x00, 0x00])
    );
}

#[test]
fn test_transfer_error_recovers() {
    let backend = MockBackend::new().with_statuses(&[Status::Timeout]);
    let mut session = helpers::active_session(backend, 1, &["1", "1", "1", "1", "1", "1"]);

    let (result, _) = helpers::execute(&mut session, "[0x01");
    assert_eq!(result, Err(BusError::Backend(Status::Timeout)));
    assert_eq!(session.state(), SessionState::Active);

    let events = session.backend().events.clone();
    assert_eq!(events[2], Event::SpiDeinit(0));
    assert!(matches!(events[3], Event::SpiInit(0, _)));
}
