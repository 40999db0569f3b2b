//! Program logging, built on `fern`.
//!
//! Messages at `info` and below go to stdout and warnings and errors to stderr, coloured when
//! writing to a terminal. When a run has an output folder, plain-text copies are also written to
//! `pvflow_info.log` and `pvflow_error.log` inside it.
use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the global logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Log level used when neither `PVFLOW_LOG_LEVEL` nor the settings file specify one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which takes precedence over the settings file
const LOG_LEVEL_ENV_VAR: &str = "PVFLOW_LOG_LEVEL";

/// Log file for progress messages
const LOG_INFO_FILE_NAME: &str = "pvflow_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "pvflow_error.log";

/// Whether [`init`] has completed successfully
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Convert a log level string (case-insensitive) to a [`LevelFilter`]
pub fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Pick the log level: the environment variable wins over settings, which win over the default
fn resolve_log_level(from_settings: Option<&str>) -> Result<LevelFilter> {
    match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(level) => parse_log_level(&level)
            .with_context(|| format!("Invalid value for {LOG_LEVEL_ENV_VAR}")),
        Err(_) => parse_log_level(from_settings.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

/// Create (or truncate) a log file in the output folder
fn open_log_file(output_path: &Path, file_name: &str) -> Result<File> {
    let path = output_path.join(file_name);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("Could not create log file {}", path.display()))
}

/// Install the global logger.
///
/// # Arguments
///
/// * `log_level_from_settings` - Level given in `settings.toml`, if any. One of `off`, `error`,
///   `warn`, `info`, `debug` or `trace`.
/// * `log_file_path` - Folder to write log files to. No files are written if `None`.
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = resolve_log_level(log_level_from_settings)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let colour_stdout = std::io::stdout().is_terminal();
    let colour_stderr = std::io::stderr().is_terminal();

    let console_out = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stdout, &colours);
        })
        .level(log_level)
        .chain(std::io::stdout());
    let console_err = Dispatch::new()
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stderr, &colours);
        })
        .level(log_level.min(LevelFilter::Warn))
        .chain(std::io::stderr());
    let mut dispatch = Dispatch::new().chain(console_out).chain(console_err);

    if let Some(output_path) = log_file_path {
        // Progress is always recorded in the file, even if the console is quieter
        let info_file = Dispatch::new()
            .filter(|metadata| metadata.level() > LevelFilter::Warn)
            .format(write_log_plain)
            .level(log_level.max(LevelFilter::Info))
            .chain(open_log_file(output_path, LOG_INFO_FILE_NAME)?);
        let error_file = Dispatch::new()
            .format(write_log_plain)
            .level(LevelFilter::Warn)
            .chain(open_log_file(output_path, LOG_ERROR_FILE_NAME)?);
        dispatch = dispatch.chain(info_file).chain(error_file);
    }

    dispatch
        .apply()
        .map_err(|err| anyhow!("Logger already initialised: {err}"))?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Format a log line as `[time level target] message`
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
