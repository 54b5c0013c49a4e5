//! Process-wide `log` backend for tests that assert on emitted records.

use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct Capture;

static LOGGER: Capture = Capture;

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let message = record.args().to_string();
        if let Ok(mut records) = RECORDS.lock() {
            records.push((record.level(), message));
        }
    }

    fn flush(&self) {}
}

/// Installs the capturing logger. Safe to call from every test.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Records containing `needle`. Tests share the logger, so pick a needle
/// that only the test at hand can produce.
pub fn matching(needle: &str) -> Vec<(Level, String)> {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, message)| message.contains(needle))
        .cloned()
        .collect()
}
