//! Survey QC Configuration Module
//!
//! Loaded from TOML, replacing hardcoded heuristics with operator-tunable
//! values.
//!
//! ## Loading Order
//!
//! 1. `SEISQC_CONFIG` environment variable (path to TOML file)
//! 2. `survey_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // At host startup:
//! config::init(SurveyConfig::load());
//!
//! // Anywhere:
//! let workers = config::get().batch.max_concurrent_files;
//! ```
//!
//! Components also accept an explicit `SurveyConfig` so tests never touch
//! the global.

mod survey_config;
pub mod defaults;
pub mod validation;

pub use survey_config::*;

use std::sync::OnceLock;

/// Global survey configuration, initialized once at startup.
static SURVEY_CONFIG: OnceLock<SurveyConfig> = OnceLock::new();

/// Initialize the global survey configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: SurveyConfig) {
    if SURVEY_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global survey configuration.
///
/// Falls back to built-in defaults when `init()` was never called.
pub fn get() -> &'static SurveyConfig {
    SURVEY_CONFIG.get_or_init(SurveyConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    SURVEY_CONFIG.get().is_some()
}
