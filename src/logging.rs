use logforth::{
    append,
    colored::Colorize,
    filter::{EnvFilter, env_filter::EnvFilterBuilder},
};
use std::fmt::Display;

/// Environment variable holding an `env_logger` style filter.
pub const LOG_ENV: &str = "IMGALLOC_LOG";

/// `[LEVEL] message`, with the emitting module added at debug and trace.
#[derive(Debug)]
pub struct CustomTextLayout {}
impl CustomTextLayout {
    fn new() -> Self {
        CustomTextLayout {}
    }
}

impl logforth::layout::Layout for CustomTextLayout {
    fn format(
        &self,
        record: &log::Record,
        _diagnostics: &[Box<dyn logforth::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        Ok(render(record.level(), record.target(), record.args()).into_bytes())
    }
}

fn render(level: log::Level, target: &str, message: &dyn Display) -> String {
    let level_str = match level {
        log::Level::Error => "ERROR".red().bold(),
        log::Level::Warn => "WARN".yellow().bold(),
        log::Level::Info => "INFO".green().bold(),
        log::Level::Debug => "DEBUG".blue().bold(),
        log::Level::Trace => "TRACE".purple().bold(),
    };

    if level <= log::Level::Info {
        return format!("[{}] {}", level_str, message);
    }
    let target = target.strip_prefix("imgalloc::").unwrap_or(target);
    format!("[{}] {}: {}", level_str, target.dimmed(), message)
}

/// Install the stderr logger. `IMGALLOC_LOG` wins over `level`.
pub fn init(level: Option<log::LevelFilter>) {
    let filter_builder = EnvFilterBuilder::try_from_env(LOG_ENV).unwrap_or_else(|| {
        let default_level = level.unwrap_or(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
        EnvFilterBuilder::new().filter_level(default_level)
    });

    logforth::builder()
        .dispatch(|d| {
            d.filter(EnvFilter::new(filter_builder))
                .append(append::Stderr::default().with_layout(CustomTextLayout::new()))
        })
        .apply();
}
