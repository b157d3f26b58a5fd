//! Internal logging facilities.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`,
//! `debug!` and `trace!`, where `error!` is the highest-priority level and
//! `trace!` the lowest. Logging is disabled by default and is controlled
//! programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level)`: enables only messages with priority at least `level`
//!
//! Per-module filtering is available through `set_module_filter()` and
//! `remove_module_filter()`, e.g. to silence the engine's per-event `trace!`
//! output while keeping network-build messages:
//!
//! ```rust
//! use shipnet::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! set_module_filter("shipnet::engine", LevelFilter::Off);
//! ```

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

// Use an ISO 8601 timestamp format and color coded level tag
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

// Logging disabled until explicitly enabled.
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Tracks the global level filter, per-module ("target") filters, and a handle
/// to the installed `log4rs` logger. Loggers are installed globally, so only
/// one of these exists; the public API consists of free functions that lock
/// the singleton.
struct LogConfiguration {
    global_log_level: LevelFilter,
    module_filters: HashMap<String, LevelFilter>,
    /// `None` until the first configuration change installs the logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        LogConfiguration {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_filters: HashMap::new(),
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    /// Builds a `log4rs` config from the current state and installs it,
    /// either initializing the global logger or swapping the config on the
    /// existing handle.
    fn set_config(&mut self) {
        let stdout =
            ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_PATTERN)));
        let mut config =
            Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout.build())));

        for (module, level) in &self.module_filters {
            config = config.logger(Logger::builder().build(module.clone(), *level));
        }

        let root = Root::builder().appender("stdout").build(self.global_log_level);
        let new_config = match config.build(root) {
            Ok(config) => config,
            Err(e) => panic!("failed to build log config: {e}"),
        };

        match self.root_handle {
            Some(ref mut handle) => handle.set_config(new_config),
            None => {
                self.root_handle = Some(
                    log4rs::init_config(new_config).expect("global logger already initialized"),
                );
            }
        }
    }
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("log configuration poisoned")
}

/// Enables the logger with no global level filter / full logging. Equivalent
/// to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    let mut config = get_log_configuration();
    config.global_log_level = level;
    config.set_config();
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    let mut config = get_log_configuration();
    match config.module_filters.entry(module_path.to_string()) {
        Entry::Occupied(mut entry) => {
            if *entry.get() == level {
                return;
            }
            entry.insert(level);
        }
        Entry::Vacant(entry) => {
            entry.insert(level);
        }
    }
    config.set_config();
}

/// Removes a module-specific level filter; the global level applies again.
pub fn remove_module_filter(module_path: &str) {
    let mut config = get_log_configuration();
    if config.module_filters.remove(module_path).is_some() {
        config.set_config();
    }
}
