use std::fs;
use std::path::Path;

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};

const LOG_BASENAME: &str = "pastel_priority";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts file-based logging under the state dir. The dashboard owns the
/// terminal, so logs never go to stdout/stderr. The returned handle must be
/// kept alive for the lifetime of the process or buffered lines are lost.
pub fn init_logging(log_dir: &Path) -> Result<LoggerHandle, String> {
    fs::create_dir_all(log_dir)
        .map_err(|err| format!("failed to create log directory {}: {err}", log_dir.display()))?;

    Logger::try_with_env_or_str("info")
        .map_err(|err| format!("invalid log specification: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}
