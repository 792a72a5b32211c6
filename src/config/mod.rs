//! Global configuration.
//!
//! Provides runtime-tunable values for the scoring, timeout, and resource
//! knobs in [`Settings`], replacing hardcoded constants with
//! operator-tunable ones.
//!
//! ## Loading Order
//!
//! 1. `GATEWATCH_CONFIG` environment variable (path to a TOML file)
//! 2. `gatewatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Three external-endpoint keys (`FEED_URL`, `ARCHIVE_DSN`, `PORT`) are
//! read from their own environment variables after the TOML layer, since
//! they vary per-deployment and don't belong in a checked-in file.
//!
//! ## Usage
//!
//! Call [`init`] once at startup, then [`get`] anywhere:
//!
//! ```ignore
//! config::init(Settings::load());
//! let timeout = config::get().camp_timeout_min;
//! ```

mod settings;
mod validation;

pub use settings::{Settings, SettingsError};

use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Initialize the global settings. Must be called exactly once before any
/// call to [`get`].
pub fn init(settings: Settings) {
    if SETTINGS.set(settings).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global settings.
///
/// Panics if [`init`] has not been called — a missing config is a fatal
/// startup error, not a recoverable condition.
pub fn get() -> &'static Settings {
    SETTINGS
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

pub fn is_initialized() -> bool {
    SETTINGS.get().is_some()
}
