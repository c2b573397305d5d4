//! Logger bootstrap. Native builds use colog on stderr, browser builds write to the devtools console.

use log::LevelFilter;
use std::sync::Once;

static INIT: Once = Once::new();

fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Safe to call more than once; only the first call installs a logger.
pub fn init_logging() {
    INIT.call_once(|| install(default_level()));
}

#[cfg(not(target_arch = "wasm32"))]
fn install(level: LevelFilter) {
    let mut builder = colog::default_builder();
    builder.filter(None, level);
    // Another logger may already be installed by the desktop runtime.
    let _ = builder.try_init();
}

#[cfg(target_arch = "wasm32")]
fn install(level: LevelFilter) {
    if let Some(level) = level.to_level() {
        let _ = console_log::init_with_level(level);
    }
}
