//! Line-based operator console.
//!
//! The engine reads operator commands from standard input while the tick
//! loop runs, one command per line:
//!
//! | Line | Effect |
//! |------|--------|
//! | `pause` | Pause the tick loop |
//! | `resume` | Resume the tick loop |
//! | `speed <ms>` | Set the delay between ticks |
//! | `status` | Log the operator state |
//! | `gather <x> <z>` | Gather every pet around a point |
//! | `cancel` | Call the gather off |
//! | `stop` | Stop after the current tick |
//!
//! Unknown or malformed lines are logged and skipped.

use std::io::BufRead;

use glam::Vec3;
use menagerie_core::operator::OperatorState;
use menagerie_core::tick::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::EngineError;

/// Lines buffered between the reader thread and the console task.
const LINE_BUFFER: usize = 16;

const SPEED_USAGE: &str = "speed <milliseconds>";
const GATHER_USAGE: &str = "gather <x> <z>";

/// Camera offset from the gathering point for console gathers.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -20.0);

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Pause the tick loop.
    Pause,
    /// Resume the tick loop.
    Resume,
    /// Stop the loop cleanly.
    Stop,
    /// Set the tick interval in milliseconds.
    Speed(u64),
    /// Log the operator state.
    Status,
    /// Queue a simulation command.
    Submit(Command),
}

/// Why a console line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The first word is not a known command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// The command's arguments are missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one console line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`ConsoleError`] for unknown commands and bad arguments.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("pause", []) => ConsoleCommand::Pause,
        ("resume", []) => ConsoleCommand::Resume,
        ("stop", []) => ConsoleCommand::Stop,
        ("status", []) => ConsoleCommand::Status,
        ("cancel", []) => ConsoleCommand::Submit(Command::CancelGather),
        ("speed", [ms]) => ConsoleCommand::Speed(
            ms.parse()
                .ok()
                .ok_or(ConsoleError::Usage(SPEED_USAGE))?,
        ),
        ("gather", [x, z]) => {
            let target = Vec3::new(
                x.parse().ok().ok_or(ConsoleError::Usage(GATHER_USAGE))?,
                0.0,
                z.parse().ok().ok_or(ConsoleError::Usage(GATHER_USAGE))?,
            );
            ConsoleCommand::Submit(Command::Gather {
                target,
                camera: target + CAMERA_OFFSET,
            })
        }
        ("speed", _) => return Err(ConsoleError::Usage(SPEED_USAGE)),
        ("gather", _) => return Err(ConsoleError::Usage(GATHER_USAGE)),
        ("pause" | "resume" | "stop" | "status" | "cancel", _) => {
            return Err(ConsoleError::Usage("command takes no arguments"));
        }
        (other, _) => return Err(ConsoleError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

/// Apply one console command. Returns `false` once the loop should stop.
pub async fn apply(command: ConsoleCommand, operator: &OperatorState) -> bool {
    match command {
        ConsoleCommand::Pause => {
            operator.pause();
            info!("Simulation paused from console");
        }
        ConsoleCommand::Resume => {
            operator.resume();
            info!("Simulation resumed from console");
        }
        ConsoleCommand::Stop => {
            operator.request_stop();
            info!("Stop requested from console");
            return false;
        }
        ConsoleCommand::Speed(ms) => {
            let previous = operator.set_tick_interval_ms(ms);
            info!(previous_ms = previous, new_ms = ms, "Tick interval changed");
        }
        ConsoleCommand::Status => {
            let end_reason = operator.end_reason().await;
            info!(
                paused = operator.is_paused(),
                tick_interval_ms = operator.tick_interval_ms(),
                elapsed_seconds = operator.elapsed_seconds(),
                end_reason = ?end_reason,
                "Operator status"
            );
        }
        ConsoleCommand::Submit(command) => {
            info!(?command, "Command queued from console");
            operator.submit(command).await;
        }
    }
    true
}

/// Lines waiting to be handled by [`run`].
pub type ConsoleLines = mpsc::Receiver<std::io::Result<String>>;

/// Read standard input on its own thread and hand each line over.
///
/// The thread ends when input closes or the receiver is dropped. A blocked
/// read never holds up process exit.
pub fn stdin_lines() -> ConsoleLines {
    let (sender, receiver) = mpsc::channel(LINE_BUFFER);
    let spawned = std::thread::Builder::new()
        .name("console".to_owned())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let failed = line.is_err();
                if sender.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Console thread could not start");
    }
    receiver
}

/// Handle console lines until input closes or a `stop` line arrives.
///
/// # Errors
///
/// Returns [`EngineError::Console`] if reading the input failed.
pub async fn run(mut lines: ConsoleLines, operator: &OperatorState) -> Result<(), EngineError> {
    while let Some(line) = lines.recv().await {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(command)) => {
                if !apply(command, operator).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, line = %line.trim(), "Console line ignored"),
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_lines() {
        assert_eq!(parse_line("  pause "), Ok(Some(ConsoleCommand::Pause)));
        assert_eq!(parse_line("RESUME"), Ok(Some(ConsoleCommand::Resume)));
        assert_eq!(parse_line("speed 25"), Ok(Some(ConsoleCommand::Speed(25))));
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(
            parse_line("cancel"),
            Ok(Some(ConsoleCommand::Submit(Command::CancelGather)))
        );
    }

    #[test]
    fn gather_faces_a_camera_behind_the_point() {
        assert_eq!(
            parse_line("gather 4 -2.5"),
            Ok(Some(ConsoleCommand::Submit(Command::Gather {
                target: Vec3::new(4.0, 0.0, -2.5),
                camera: Vec3::new(4.0, 0.0, -22.5),
            })))
        );
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert_eq!(
            parse_line("dance"),
            Err(ConsoleError::Unknown("dance".to_owned()))
        );
        assert!(matches!(parse_line("speed fast"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("gather 1"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("pause now"), Err(ConsoleError::Usage(_))));
    }

    fn feed(lines: &[&str]) -> ConsoleLines {
        let (sender, receiver) = mpsc::channel(lines.len().max(1));
        for line in lines {
            sender.try_send(Ok((*line).to_owned())).unwrap();
        }
        receiver
    }

    #[tokio::test]
    async fn console_drives_the_operator_until_stop() {
        let operator = OperatorState::new(50, 0, 0);
        let lines = feed(&["pause", "speed 10", "bogus", "gather 1 2", "stop", "resume"]);

        run(lines, &operator).await.unwrap();

        assert!(operator.is_paused());
        assert!(operator.is_stop_requested());
        assert_eq!(operator.tick_interval_ms(), 10);
        let queued = operator.drain_commands().await;
        assert!(matches!(queued.as_slice(), [Command::Gather { .. }]));
    }

    #[tokio::test]
    async fn read_failure_ends_the_console() {
        let operator = OperatorState::new(50, 0, 0);
        let (sender, receiver) = mpsc::channel(2);
        sender.try_send(Ok("pause".to_owned())).unwrap();
        sender
            .try_send(Err(std::io::Error::other("terminal went away")))
            .unwrap();

        let result = run(receiver, &operator).await;

        assert!(matches!(result, Err(EngineError::Console { .. })));
        assert!(operator.is_paused());
        assert!(!operator.is_stop_requested());
    }
}
