pub mod app_logic;
pub mod core;
pub mod platform_layer;

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

// Environment variable selecting the log level, e.g. `SUITE_EDITOR_LOG=debug`.
pub const LOG_LEVEL_ENV: &str = "SUITE_EDITOR_LOG";

/*
 * Installs the terminal logger. Safe to call more than once (every test does): only the
 * first call installs a logger, later ones are ignored.
 */
pub fn initialize_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    if TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto).is_ok() {
        log::debug!("Logging initialized at level {level}.");
    }
}
