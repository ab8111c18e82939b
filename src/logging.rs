use std::sync::Once;

use log::{Level, LevelFilter};

static INSTALL: Once = Once::new();

/// Parse a level name, falling back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

/// Route `log` records to the browser console. The logger is installed once;
/// later calls only change the level.
pub fn init(level: LevelFilter) {
    INSTALL.call_once(|| {
        if let Err(e) = console_log::init_with_level(Level::Trace) {
            log::warn!("console logger not installed: {e}");
        }
    });
    log::set_max_level(level);
}
