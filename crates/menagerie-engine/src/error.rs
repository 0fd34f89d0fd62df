//! Failures that stop the engine binary.
//!
//! Each variant names the startup or run stage that failed, so the message
//! printed on exit says where the engine gave up.

use std::path::PathBuf;

use menagerie_core::clock::ClockError;
use menagerie_core::config::ConfigError;
use menagerie_core::runner::RunnerError;

/// Why a roster entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RosterIssue {
    /// Another entry already uses the name.
    #[error("name is already taken")]
    DuplicateName,

    /// The speed override is zero or negative.
    #[error("speed override must be positive")]
    NonPositiveSpeed,
}

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration file exists but could not be read or parsed.
    #[error("cannot load {}: {source}", path.display())]
    ConfigLoad {
        /// File that was being loaded.
        path: PathBuf,
        /// The underlying config error.
        source: ConfigError,
    },

    /// The global tracing subscriber could not be installed.
    #[error("cannot initialize logging: {reason}")]
    Logging {
        /// Why the subscriber was refused.
        reason: String,
    },

    /// The configured world could not be built.
    #[error("cannot build the world: {source}")]
    World {
        /// The rejected clock setting.
        #[from]
        source: ClockError,
    },

    /// A roster entry was refused before any pet was placed.
    #[error("roster entry {name:?} refused: {issue}")]
    Roster {
        /// Name of the offending entry.
        name: String,
        /// What is wrong with it.
        issue: RosterIssue,
    },

    /// Reading operator input failed.
    #[error("console input failed: {source}")]
    Console {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The tick loop stopped on an error.
    #[error("simulation run failed: {source}")]
    Run {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },
}
