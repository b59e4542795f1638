use flexi_logger::{
    opt_format, Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};

use crate::config::LoggingConfig;

/// Start logging to stderr, or to rotating files when a directory is
/// configured. `RUST_LOG` overrides the configured level. Keep the returned
/// handle alive for as long as logging is needed.
pub fn setup_logging(config: &LoggingConfig) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(&config.level)?.format(opt_format);
    let logger = match &config.directory {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("connect_cascade"))
            .rotate(
                Criterion::Size(config.rotate_mb * 1024 * 1024),
                Naming::Numbers,
                Cleanup::KeepLogFiles(config.keep_files),
            ),
        None => logger.log_to_stderr(),
    };
    logger.start()
}
