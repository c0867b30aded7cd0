use log::{Level, LevelFilter, Log, Metadata, Record};
use web_sys::{console, wasm_bindgen::JsValue};

/// Forwards [`log`] records to the browser console.
///
/// Messages are prefixed with the module they come from, and sent to the
/// console method that matches their level so devtools can filter them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!(
            "[{}] {}",
            record.module_path().unwrap_or(record.target()),
            record.args()
        ));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::log_1(&message),
            Level::Debug | Level::Trace => console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Installs the [`ConsoleLogger`] and sets the maximum level.
///
/// If a logger is already installed (by this function or by the host), only
/// the level changes.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("logger already installed");
    }
    log::set_max_level(level);
}
