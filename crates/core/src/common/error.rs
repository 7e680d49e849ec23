//! Error taxonomy for the simulator.
//!
//! This module defines every way setup or execution can fail. It provides:
//! 1. **Configuration errors:** malformed or missing fields in the simulator config file.
//! 2. **Meta-data errors:** malformed instruction tokens in the meta-data program.
//! 3. **Runtime errors:** invariant violations encountered while a simulation is running.
//!
//! All setup-time errors are collected under [`SimError`], which the CLI renders as a
//! single `"ERROR: <description>"` line before exiting, matching the original simulator's
//! user-visible failure contract.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum SimError {
    /// The config file could not be read or did not conform to the expected grammar.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The meta-data file could not be read or did not conform to the expected grammar.
    #[error(transparent)]
    MetaData(#[from] MetaDataError),

    /// An invariant was violated while the simulation was running.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A referenced file could not be opened.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Failures encountered while parsing a simulator configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Line 1 was not `Start Simulator Configuration File`.
    #[error("typo on line 1: expected configuration header")]
    UnexpectedHeader,

    /// The final line was not `End Simulator Configuration File`.
    #[error("typo on last line: expected configuration trailer")]
    UnexpectedTrailer,

    /// A fixed keyword (e.g. `Processor cycle time {{msec}}:`) did not match what was expected.
    #[error("typo on line {line}: expected keyword {expected:?}, found {found:?}")]
    TypoOnLine {
        /// 1-based line number.
        line: usize,
        /// Keyword text the grammar required at this position.
        expected: String,
        /// Token actually read.
        found: String,
    },

    /// A device cycle-time keyword appeared more than once, or not at all.
    #[error("device cycle time keyword {keyword:?} appeared {count} times, expected exactly once")]
    DuplicateOrMissingDeviceTime {
        /// The keyword in question.
        keyword: String,
        /// How many times it was observed.
        count: usize,
    },

    /// A numeric field was zero, negative, or otherwise out of range.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Offending raw value.
        value: String,
    },

    /// The system-memory unit suffix was not one of `kbytes`/`Mbytes`/`Gbytes`.
    #[error("unknown system memory unit: {0:?}")]
    UnknownMemoryUnit(String),

    /// The CPU scheduling code was not one of FIFO/PS/SJF/STR/RR.
    #[error("unknown CPU scheduling code: {0:?}")]
    UnknownSchedulingCode(String),

    /// The log sink directive was not one of the three accepted forms.
    #[error("unknown log sink directive: {0:?}")]
    UnknownLogSink(String),
}

/// Failures encountered while parsing a meta-data instruction stream.
#[derive(Debug, Error)]
pub enum MetaDataError {
    /// The first non-blank line was not `Start Program Meta-Data Code:`.
    #[error("unexpected header: meta-data stream must begin with the program header")]
    UnexpectedHeader,

    /// The final token was not followed by `End Program Meta-Data Code.`.
    #[error("unexpected trailer: meta-data stream must end with the program trailer")]
    UnexpectedTrailer,

    /// A token's leading character was not one of S, A, P, M, I, O.
    #[error("unknown meta-data code {0:?}")]
    UnknownCode(char),

    /// A token's descriptor was not a member of the code's permitted vocabulary.
    #[error("unknown descriptor {descriptor:?} for code {code:?}")]
    UnknownDescriptor {
        /// The code the descriptor was read under.
        code: char,
        /// The offending descriptor text.
        descriptor: String,
    },

    /// The cycles field was missing, non-numeric, or outside 0..=99.
    #[error("cycle count out of range: {0:?}")]
    CyclesOutOfRange(String),

    /// Neither `;` nor `.` terminated the token.
    #[error("missing terminator after token {0:?}")]
    MissingTerminator(String),
}

/// Invariant violations that can only be detected once the simulation is executing.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A handler encountered a descriptor it does not recognize for its code.
    #[error("unrecognized descriptor {descriptor:?} reached the {code:?} handler")]
    UnrecognizedDescriptor {
        /// The instruction code being handled.
        code: char,
        /// The descriptor that reached the handler.
        descriptor: String,
    },

    /// A device kind was requested that has no corresponding resource pool.
    #[error("unknown device kind: {0:?}")]
    UnknownDeviceKind(String),

    /// A PCB attempted a transition not present in the legal state graph.
    #[error("illegal PCB transition for process {pid}: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Process this PCB belongs to.
        pid: u32,
        /// State the PCB was in.
        from: String,
        /// State the transition attempted to reach.
        to: String,
    },

    /// The instruction stream did not bracket correctly into `S{begin}` … processes …
    /// `S{finish}`, or an `A{begin}`/`A{finish}` pair was unmatched.
    #[error("malformed program structure: {0}")]
    MalformedProgramStructure(String),
}
