#![deny(missing_docs)]
//! Shared logging utilities for the timeline workspace.
//!
//! This crate provides the `timeline_*` logging macros used across the
//! codebase, a per-thread coordination tick for correlating log lines, and a
//! minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current coordination tick.
    static COORDINATION_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the coordination tick for the current thread.
/// The timeline coordinator calls this once per reactive tick.
pub fn set_coordination_tick(tick: u64) {
    COORDINATION_TICK.with(|v| v.set(tick));
}

/// Retrieves the coordination tick for the current thread.
/// Returns 0 outside of a coordinator.
pub fn coordination_tick() -> u64 {
    COORDINATION_TICK.with(|v| v.get())
}

/// Logs a trace-level message prefixed with the coordination tick.
#[macro_export]
macro_rules! timeline_trace {
    ($($arg:tt)*) => {{
        log::trace!("[tick {}] {}", $crate::coordination_tick(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message prefixed with the coordination tick.
#[macro_export]
macro_rules! timeline_debug {
    ($($arg:tt)*) => {{
        log::debug!("[tick {}] {}", $crate::coordination_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! timeline_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! timeline_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! timeline_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{coordination_tick, set_coordination_tick};

    #[test]
    fn tick_is_per_thread() {
        set_coordination_tick(42);
        assert_eq!(coordination_tick(), 42);

        let other = std::thread::spawn(coordination_tick).join().unwrap();
        assert_eq!(other, 0);
    }
}
