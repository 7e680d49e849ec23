//! Simulator configuration: parsing and in-memory representation.
//!
//! This module owns [`Config`], the immutable, read-only-after-load record produced
//! by parsing the line-oriented configuration file format (see the meta-data/config
//! grammar in the project specification). It provides:
//! 1. **Parsing:** a hand-rolled, line-oriented parser — the wire format mixes
//!    fixed-order and order-independent keyword lines in a way a derive macro can't
//!    express, so it is validated field by field like the original implementation.
//! 2. **Defaults resolution:** mapping an instruction's code/descriptor pair to the
//!    configured device cycle time.
//! 3. **Scheduling/log-sink enums:** the small closed vocabularies the config selects
//!    between.

use std::path::{Path, PathBuf};

use crate::common::error::ConfigError;

/// CPU scheduling policy selected by `CPU Scheduling Code:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// First-in, first-out.
    Fifo,
    /// Priority by I/O instruction density, descending.
    Priority,
    /// Shortest job first (non-preemptive).
    Sjf,
    /// Shortest time remaining (preemptive SJF).
    Str,
    /// Round-robin with a fixed processor quantum.
    RoundRobin,
}

impl SchedulingPolicy {
    fn parse(word: &str) -> Result<Self, ConfigError> {
        match word {
            "FIFO" => Ok(Self::Fifo),
            "PS" => Ok(Self::Priority),
            "SJF" => Ok(Self::Sjf),
            "STR" => Ok(Self::Str),
            "RR" => Ok(Self::RoundRobin),
            other => Err(ConfigError::UnknownSchedulingCode(other.to_string())),
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Standard output only.
    Monitor,
    /// The configured log file only.
    File,
    /// Both standard output and the configured log file.
    Both,
}

impl LogSink {
    fn parse(phrase: &str) -> Result<Self, ConfigError> {
        match phrase {
            "Log to Monitor" => Ok(Self::Monitor),
            "Log to File" => Ok(Self::File),
            "Log to Both" => Ok(Self::Both),
            other => Err(ConfigError::UnknownLogSink(other.to_string())),
        }
    }
}

/// Per-device cycle times, in milliseconds per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceTimes {
    /// `Monitor display time {msec}:`
    pub monitor_ms: u32,
    /// `Processor cycle time {msec}:`
    pub processor_ms: u32,
    /// `Scanner cycle time {msec}:`
    pub scanner_ms: u32,
    /// `Hard drive cycle time {msec}:`
    pub hard_drive_ms: u32,
    /// `Keyboard cycle time {msec}:`
    pub keyboard_ms: u32,
    /// `Memory cycle time {msec}:`
    pub memory_ms: u32,
    /// `Projector cycle time {msec}:`
    pub projector_ms: u32,
}

/// Root configuration structure, produced once per simulator run and shared read-only
/// across every thread for the rest of that run.
#[derive(Debug, Clone)]
pub struct Config {
    /// `Version/Phase:` — validated non-negative, otherwise unused by the engine.
    pub version: f64,
    /// `File Path:` — location of the meta-data program to run.
    pub metadata_file_path: PathBuf,
    /// The seven device cycle times.
    pub device_times: DeviceTimes,
    /// `System memory {kbytes|Mbytes|Gbytes}:`, normalized to kbytes (decimal, ×1000
    /// per unit step — not ×1024 — to match the original implementation bit-for-bit).
    pub system_memory_kbytes: u64,
    /// `Memory block size {kbytes}:`
    pub memory_block_size_kbytes: u64,
    /// `Projector quantity:`
    pub projector_quantity: u32,
    /// `Hard drive quantity:`
    pub hard_drive_quantity: u32,
    /// `CPU Scheduling Code:`
    pub scheduling_policy: SchedulingPolicy,
    /// `Processor Quantum Number:` — only meaningful under [`SchedulingPolicy::RoundRobin`].
    pub quantum_ms: u32,
    /// `Log:`
    pub log_sink: LogSink,
    /// `Log File Path:` — read unconditionally, used only when `log_sink` writes to a file.
    pub log_file_path: PathBuf,
}

impl Config {
    /// Parses a configuration file from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on any grammar violation, or an I/O error if `path`
    /// cannot be read.
    pub fn load(path: &Path) -> Result<Self, crate::common::error::SimError> {
        tracing::debug!(path = %path.display(), "loading simulator configuration");
        let text =
            std::fs::read_to_string(path).map_err(|source| crate::common::error::SimError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&text).map_err(crate::common::error::SimError::from)?;
        tracing::debug!(
            policy = ?config.scheduling_policy,
            hard_drives = config.hard_drive_quantity,
            projectors = config.projector_quantity,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parses configuration text already read into memory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on any grammar violation.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines().map(str::trim);

        let header = lines.next().unwrap_or_default();
        if header != "Start Simulator Configuration File" {
            return Err(ConfigError::UnexpectedHeader);
        }

        let version = parse_labeled_line(&mut lines, "Version/Phase")?
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "Version/Phase".into(),
                value: String::new(),
            })?;
        if version < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "Version/Phase".into(),
                value: version.to_string(),
            });
        }

        let metadata_file_path = PathBuf::from(parse_labeled_line(&mut lines, "File Path")?);

        let device_times = parse_device_times(&mut lines)?;

        let system_memory_kbytes = parse_system_memory(&mut lines)?;

        let memory_block_size_kbytes = parse_positive_u64(&mut lines, "Memory block size {kbytes}")?;
        let projector_quantity = parse_positive_u32(&mut lines, "Projector quantity")?;
        let hard_drive_quantity = parse_positive_u32(&mut lines, "Hard drive quantity")?;

        let scheduling_policy =
            SchedulingPolicy::parse(&parse_labeled_line(&mut lines, "CPU Scheduling Code")?)?;

        let quantum_ms = parse_u32_allow_zero(&mut lines, "Processor Quantum Number")?;

        let log_sink = LogSink::parse(&parse_labeled_line(&mut lines, "Log")?)?;
        let log_file_path = PathBuf::from(parse_labeled_line(&mut lines, "Log File Path")?);

        let trailer = lines.next().unwrap_or_default();
        if trailer != "End Simulator Configuration File" {
            return Err(ConfigError::UnexpectedTrailer);
        }

        Ok(Self {
            version,
            metadata_file_path,
            device_times,
            system_memory_kbytes,
            memory_block_size_kbytes,
            projector_quantity,
            hard_drive_quantity,
            scheduling_policy,
            quantum_ms,
            log_sink,
            log_file_path,
        })
    }

    /// Resolves the per-cycle time, in milliseconds, for an instruction's `(code,
    /// descriptor)` pair. `S` and `A` brackets run on the processor, like `P{run}`.
    #[must_use]
    pub fn device_time_for(&self, code: char, descriptor: &str) -> u32 {
        match (code, descriptor) {
            ('S' | 'A' | 'P', _) => self.device_times.processor_ms,
            ('M', _) => self.device_times.memory_ms,
            (_, "hard drive") => self.device_times.hard_drive_ms,
            ('I', "keyboard") => self.device_times.keyboard_ms,
            ('I', "scanner") => self.device_times.scanner_ms,
            ('O', "monitor") => self.device_times.monitor_ms,
            ('O', "projector") => self.device_times.projector_ms,
            _ => 0,
        }
    }
}

/// Pulls the next line and splits it as `"<label>: <value>"`, verifying the label.
fn parse_labeled_line<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    expected_label: &str,
) -> Result<String, ConfigError> {
    let line = lines.next().unwrap_or_default();
    let (label, value) = line.split_once(':').ok_or_else(|| ConfigError::TypoOnLine {
        line: 0,
        expected: expected_label.to_string(),
        found: line.to_string(),
    })?;
    if label.trim() != expected_label {
        return Err(ConfigError::TypoOnLine {
            line: 0,
            expected: expected_label.to_string(),
            found: label.trim().to_string(),
        });
    }
    Ok(value.trim().to_string())
}

fn parse_positive_u64<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    label: &str,
) -> Result<u64, ConfigError> {
    let value = parse_labeled_line(lines, label)?;
    let parsed: i64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { field: label.into(), value: value.clone() })?;
    if parsed <= 0 {
        return Err(ConfigError::InvalidValue { field: label.into(), value });
    }
    Ok(parsed as u64)
}

fn parse_positive_u32<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    label: &str,
) -> Result<u32, ConfigError> {
    let value = parse_labeled_line(lines, label)?;
    let parsed: i64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { field: label.into(), value: value.clone() })?;
    if parsed <= 0 {
        return Err(ConfigError::InvalidValue { field: label.into(), value });
    }
    Ok(parsed as u32)
}

/// Like [`parse_positive_u32`] but `0` is valid (the quantum is meaningless outside RR).
fn parse_u32_allow_zero<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    label: &str,
) -> Result<u32, ConfigError> {
    let value = parse_labeled_line(lines, label)?;
    let parsed: i64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { field: label.into(), value: value.clone() })?;
    if parsed < 0 {
        return Err(ConfigError::InvalidValue { field: label.into(), value });
    }
    Ok(parsed as u32)
}

/// The seven device-cycle-time keywords, fixed text, order-independent in the file.
const DEVICE_TIME_KEYWORDS: [&str; 7] = [
    "Monitor display time {msec}",
    "Processor cycle time {msec}",
    "Scanner cycle time {msec}",
    "Hard drive cycle time {msec}",
    "Keyboard cycle time {msec}",
    "Memory cycle time {msec}",
    "Projector cycle time {msec}",
];

fn parse_device_times<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
) -> Result<DeviceTimes, ConfigError> {
    let mut seen: [Option<u32>; 7] = [None; 7];

    for _ in 0..7 {
        let line = lines.next().unwrap_or_default();
        let (label, value) = line.split_once(':').ok_or_else(|| ConfigError::TypoOnLine {
            line: 0,
            expected: "a device cycle time keyword".to_string(),
            found: line.to_string(),
        })?;
        let label = label.trim();
        let index = DEVICE_TIME_KEYWORDS
            .iter()
            .position(|k| *k == label)
            .ok_or_else(|| ConfigError::TypoOnLine {
                line: 0,
                expected: "a device cycle time keyword".to_string(),
                found: label.to_string(),
            })?;
        if seen[index].is_some() {
            return Err(ConfigError::DuplicateOrMissingDeviceTime {
                keyword: DEVICE_TIME_KEYWORDS[index].to_string(),
                count: 2,
            });
        }
        let value = value.trim();
        let parsed: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
            field: DEVICE_TIME_KEYWORDS[index].to_string(),
            value: value.to_string(),
        })?;
        if parsed <= 0 {
            return Err(ConfigError::InvalidValue {
                field: DEVICE_TIME_KEYWORDS[index].to_string(),
                value: value.to_string(),
            });
        }
        seen[index] = Some(parsed as u32);
    }

    for (i, slot) in seen.iter().enumerate() {
        if slot.is_none() {
            return Err(ConfigError::DuplicateOrMissingDeviceTime {
                keyword: DEVICE_TIME_KEYWORDS[i].to_string(),
                count: 0,
            });
        }
    }

    Ok(DeviceTimes {
        monitor_ms: seen[0].unwrap_or_default(),
        processor_ms: seen[1].unwrap_or_default(),
        scanner_ms: seen[2].unwrap_or_default(),
        hard_drive_ms: seen[3].unwrap_or_default(),
        keyboard_ms: seen[4].unwrap_or_default(),
        memory_ms: seen[5].unwrap_or_default(),
        projector_ms: seen[6].unwrap_or_default(),
    })
}

/// Parses `System memory {kbytes|Mbytes|Gbytes}: <int>`, normalizing to kbytes using
/// the decimal (×1000 per step) convention.
fn parse_system_memory<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Result<u64, ConfigError> {
    let line = lines.next().unwrap_or_default();
    let (label, value) = line.split_once(':').ok_or_else(|| ConfigError::TypoOnLine {
        line: 0,
        expected: "System memory {kbytes|Mbytes|Gbytes}".to_string(),
        found: line.to_string(),
    })?;
    let label = label.trim();
    let unit = if label == "System memory {kbytes}" {
        "kbytes"
    } else if label == "System memory {Mbytes}" {
        "Mbytes"
    } else if label == "System memory {Gbytes}" {
        "Gbytes"
    } else {
        return Err(ConfigError::UnknownMemoryUnit(label.to_string()));
    };

    let value = value.trim();
    let parsed: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
        field: "System memory".into(),
        value: value.to_string(),
    })?;
    if parsed <= 0 {
        return Err(ConfigError::InvalidValue {
            field: "System memory".into(),
            value: value.to_string(),
        });
    }

    let scale: u64 = match unit {
        "kbytes" => 1,
        "Mbytes" => 1_000,
        "Gbytes" => 1_000_000,
        _ => unreachable!("unit already validated above"),
    };

    Ok((parsed as u64) * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(unit: &str) -> String {
        format!(
            "Start Simulator Configuration File\n\
             Version/Phase: 3.14\n\
             File Path: program.mdf\n\
             Monitor display time {{msec}}: 20\n\
             Processor cycle time {{msec}}: 10\n\
             Scanner cycle time {{msec}}: 30\n\
             Hard drive cycle time {{msec}}: 15\n\
             Keyboard cycle time {{msec}}: 50\n\
             Memory cycle time {{msec}}: 5\n\
             Projector cycle time {{msec}}: 25\n\
             System memory {{{unit}}}: 2\n\
             Memory block size {{kbytes}}: 100\n\
             Projector quantity: 2\n\
             Hard drive quantity: 2\n\
             CPU Scheduling Code: RR\n\
             Processor Quantum Number: 4\n\
             Log: Log to Both\n\
             Log File Path: log.lgf\n\
             End Simulator Configuration File",
            unit = unit
        )
    }

    #[test]
    fn parses_well_formed_config() {
        let config = Config::parse(&sample_config("kbytes")).expect("valid config");
        assert_eq!(config.device_times.processor_ms, 10);
        assert_eq!(config.scheduling_policy, SchedulingPolicy::RoundRobin);
        assert_eq!(config.log_sink, LogSink::Both);
        assert_eq!(config.system_memory_kbytes, 2);
    }

    #[test]
    fn scales_mbytes_decimally() {
        let config = Config::parse(&sample_config("Mbytes")).expect("valid config");
        assert_eq!(config.system_memory_kbytes, 2_000);
    }

    #[test]
    fn scales_gbytes_decimally() {
        let config = Config::parse(&sample_config("Gbytes")).expect("valid config");
        assert_eq!(config.system_memory_kbytes, 2_000_000);
    }

    #[test]
    fn device_time_lookup_routes_s_and_a_through_processor() {
        let config = Config::parse(&sample_config("kbytes")).expect("valid config");
        assert_eq!(config.device_time_for('S', "begin"), 10);
        assert_eq!(config.device_time_for('A', "finish"), 10);
        assert_eq!(config.device_time_for('P', "run"), 10);
        assert_eq!(config.device_time_for('I', "hard drive"), 15);
        assert_eq!(config.device_time_for('O', "hard drive"), 15);
        assert_eq!(config.device_time_for('I', "keyboard"), 50);
        assert_eq!(config.device_time_for('O', "monitor"), 20);
        assert_eq!(config.device_time_for('O', "projector"), 25);
        assert_eq!(config.device_time_for('M', "allocate"), 5);
    }

    #[test]
    fn rejects_bad_header() {
        let bad = sample_config("kbytes").replacen(
            "Start Simulator Configuration File",
            "Start Simulator Config File",
            1,
        );
        assert!(matches!(Config::parse(&bad), Err(ConfigError::UnexpectedHeader)));
    }

    #[test]
    fn rejects_unknown_scheduling_code() {
        let bad = sample_config("kbytes").replace("CPU Scheduling Code: RR", "CPU Scheduling Code: XYZ");
        assert!(matches!(
            Config::parse(&bad),
            Err(ConfigError::UnknownSchedulingCode(_))
        ));
    }

    #[test]
    fn rejects_duplicate_device_time_keyword() {
        let bad = sample_config("kbytes").replacen(
            "Scanner cycle time {msec}: 30",
            "Processor cycle time {msec}: 30",
            1,
        );
        assert!(matches!(
            Config::parse(&bad),
            Err(ConfigError::DuplicateOrMissingDeviceTime { .. })
        ));
    }
}
