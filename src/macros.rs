//! Internal logging macros.
//!
//! Statements forward to `defmt` when the `defmt-logging` feature is enabled
//! and compile away otherwise. Arguments must implement `defmt::Format`.

#![allow(unused_macros)]

#[cfg(feature = "defmt-logging")]
macro_rules! bus_log {
    (trace, $($arg:expr),*) => { defmt::trace!($($arg),*) };
    (debug, $($arg:expr),*) => { defmt::debug!($($arg),*) };
    (info,  $($arg:expr),*) => { defmt::info!($($arg),*) };
    (warn,  $($arg:expr),*) => { defmt::warn!($($arg),*) };
    (error, $($arg:expr),*) => { defmt::error!($($arg),*) };
}

#[cfg(not(feature = "defmt-logging"))]
macro_rules! bus_log {
    ($level:ident, $($arg:expr),*) => {{ $( let _ = $arg; )* }};
}

macro_rules! bus_trace {
    ($($arg:expr),*) => (bus_log!(trace, $($arg),*));
}

macro_rules! bus_debug {
    ($($arg:expr),*) => (bus_log!(debug, $($arg),*));
}

macro_rules! bus_info {
    ($($arg:expr),*) => (bus_log!(info, $($arg),*));
}

macro_rules! bus_warn {
    ($($arg:expr),*) => (bus_log!(warn, $($arg),*));
}

macro_rules! bus_error {
    ($($arg:expr),*) => (bus_log!(error, $($arg),*));
}
