//! Shared test helpers to reduce duplication across integration tests.

#![allow(dead_code)]

#[allow(clippy::duplicate_mod)]
#[path = "fixtures/mod.rs"]
mod fixtures;

pub use fixtures::{Event, MockBackend, MockIo};
use polybus::{BusError, DefaultConfig, IoWriter, Session};

pub type TestSession = Session<MockBackend, DefaultConfig>;

// ============================================================================
// Session Creation Helpers
// ============================================================================

/// Select mode `index`, apply `args`, power on, and forget the setup events.
pub fn active_session(backend: MockBackend, index: usize, args: &[&str]) -> TestSession {
    let mut out = String::new();
    let mut session = TestSession::new(backend);
    session.select_mode(index, &mut out).unwrap();
    session.configure(args, &mut out).unwrap();
    session.power_on(&mut out).unwrap();
    session.backend_mut().clear_events();
    session
}

// ============================================================================
// Command Execution Helpers
// ============================================================================

/// Execute a bus command line through a `CharIo` console.
pub fn execute(session: &mut TestSession, line: &str) -> (Result<(), BusError>, String) {
    let mut io = MockIo::new();
    let result = {
        let mut writer = IoWriter::new(&mut io);
        session.execute(line, &mut writer)
    };
    (result, io.output())
}

/// Execute a line that must succeed, returning its output.
pub fn execute_ok(session: &mut TestSession, line: &str) -> String {
    let (result, output) = execute(session, line);
    assert_eq!(result, Ok(()), "line {:?} failed, output: {}", line, output);
    output
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert output contains every string in `expected`.
pub fn assert_contains_all(output: &str, expected: &[&str]) {
    for s in expected {
        assert!(
            output.contains(s),
            "Expected '{}' in output, got: {}",
            s,
            output
        );
    }
}
