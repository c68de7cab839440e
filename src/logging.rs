//! File logging bootstrap.
//!
//! The terminal belongs to the UI, so logs only ever go to rotating files.
//! Initialization happens at most once per process; later calls with the
//! same directory are no-ops.

use anyhow::{anyhow, bail, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "todolist";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let level = normalize_level(level)?;
    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, log_dir))?;
    if state.log_dir != log_dir {
        bail!(
            "logging already initialized at `{}`",
            state.log_dir.display()
        );
    }
    Ok(())
}

fn start_logger(level: &'static str, log_dir: &Path) -> Result<LoggingState> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {:?}", log_dir))?;
    let logger = Logger::try_with_str(level)
        .map_err(|err| anyhow!("invalid log level `{level}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .context("starting logger")?;

    info!(
        "event=app_start level={} version={} log_dir={}",
        level,
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(LoggingState {
        log_dir: log_dir.to_path_buf(),
        _logger: logger,
    })
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(anyhow!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}
