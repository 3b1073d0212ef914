//! Routes `log` records to the browser console.

use std::str::FromStr;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};
use pathtrace_core::TracerError;

/// Level installed when the host does not choose one.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;
static INIT: Once = Once::new();

/// The line written to the console for one record.
fn console_line(record: &Record<'_>) -> String {
    format!("[{}] {}: {}", record.level(), record.target(), record.args())
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = wasm_bindgen::JsValue::from_str(&console_line(record));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger at [`DEFAULT_LEVEL`] unless already installed.
pub fn ensure_console_logging() {
    INIT.call_once(|| {
        if let Err(e) = log::set_logger(&LOGGER) {
            web_sys::console::warn_1(&format!("console logger not installed: {e}").into());
            return;
        }
        log::set_max_level(DEFAULT_LEVEL);
    });
}

/// Installs the console logger if needed and sets the maximum level.
pub fn init_console_logging(level: LevelFilter) {
    ensure_console_logging();
    log::set_max_level(level);
}

/// Parses a level name such as "warn" or "debug".
///
/// # Errors
///
/// `InvalidConfig` for an unknown name.
pub fn parse_level(text: &str) -> Result<LevelFilter, TracerError> {
    LevelFilter::from_str(text.trim())
        .map_err(|_| TracerError::InvalidConfig(format!("unknown log level '{text}'")))
}
