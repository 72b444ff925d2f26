//! Structured logging setup.
//!
//! Replaces the teacher's `logging::init_logger`, which wired a third-party
//! remote log sink (BetterStack) that has no equivalent concern for a
//! batch evaluator run. This keeps the teacher's `log4rs` pipeline shape
//! (console appender plus an optional rolling-style file appender) but
//! drops the remote HTTP sink entirely. `chrono` (already a teacher
//! dependency) timestamps the file appender's pattern.

use crate::error::Result;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const CONSOLE_PATTERN: &str = "{d(%H:%M:%S)} {l} [{t}] {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l} [{t}] {m}{n}";

/// Initializes logging with a console appender and, if `log_file` is
/// given, an additional file appender at that path.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let mut root_builder = Root::builder().appender("console");
    let mut config_builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));

    if let Some(path) = log_file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(path)
            .map_err(|e| io_err(format!("failed to open log file: {e}")))?;
        config_builder =
            config_builder.appender(Appender::builder().build("file", Box::new(file)));
        root_builder = root_builder.appender("file");
    }

    let config = config_builder
        .build(root_builder.build(level))
        .map_err(|e| io_err(format!("failed to build log config: {e}")))?;

    log4rs::init_config(config).map_err(|e| io_err(format!("failed to initialize log4rs: {e}")))?;

    Ok(())
}

fn io_err(message: String) -> crate::error::Error {
    crate::error::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
}
