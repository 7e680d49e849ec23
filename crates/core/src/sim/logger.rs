//! The simulator's single log sink.
//!
//! Every emission is stamped with elapsed time against a shared [`Clock`] and routed
//! to the monitor, a file, or both. A single mutex serializes emissions so that no two
//! lines interleave regardless of which thread produced them.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;
use std::sync::Mutex;

use crate::common::error::SimError;
use crate::common::Clock;
use crate::config::LogSink;

/// Serializes and routes every log line produced during a run.
#[derive(Debug)]
pub struct Logger {
    clock: Clock,
    sink: LogSink,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl Logger {
    /// Opens (truncating) the configured log file if `sink` writes to one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the log file cannot be created.
    pub fn new(clock: Clock, sink: LogSink, log_file_path: &Path) -> Result<Self, SimError> {
        let writer = match sink {
            LogSink::Monitor => None,
            LogSink::File | LogSink::Both => {
                let file = File::create(log_file_path).map_err(|source| SimError::Io {
                    path: log_file_path.to_path_buf(),
                    source,
                })?;
                Some(BufWriter::new(file))
            }
        };
        Ok(Self {
            clock,
            sink,
            writer: Mutex::new(writer),
        })
    }

    /// Emits one line, formatted as `"<elapsed> - <message>"`.
    pub fn log(&self, message: &str) {
        let elapsed = self.clock.elapsed_secs();
        let line = format!("{elapsed:.6} - {message}");

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if matches!(self.sink, LogSink::Monitor | LogSink::Both) {
            println!("{line}");
        }
        if let Some(file) = writer.as_mut() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_lines_to_configured_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("run.lgf");
        let logger = Logger::new(Clock::start(), LogSink::File, &path).expect("open log file");
        logger.log("Simulator program starting");
        logger.log("Simulator program ending");

        let contents = std::fs::read_to_string(&path).expect("read log file");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Simulator program starting"));
        assert!(lines[1].ends_with("Simulator program ending"));
    }
}
