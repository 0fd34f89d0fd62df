//! Simulation clock, coordinators, and the tick cycle for the Menagerie simulation.
//!
//! This crate drives the pets in `menagerie-agents` through a fixed-step
//! tick cycle and owns the coordinators that reach across pets: two-pet
//! interactions and the gathering command.
//!
//! # Modules
//!
//! - [`clock`] -- Fixed-step [`SimClock`].
//! - [`config`] -- Configuration loading from `menagerie-config.yaml` into
//!   strongly-typed structs.
//! - [`gathering`] -- [`GatheringCoordinator`], slot assignment and monitors.
//! - [`interaction`] -- [`InteractionManager`], sessions, and the race, nap,
//!   and stroll choreographies.
//! - [`operator`] -- [`OperatorState`], shared run controls.
//! - [`runner`] -- The async loop around [`run_tick`].
//! - [`tick`] -- The nine-phase tick cycle.

pub mod clock;
pub mod config;
pub mod gathering;
pub mod interaction;
pub mod operator;
pub mod runner;
pub mod tick;

#[cfg(test)]
mod test_support;

pub use clock::{ClockError, SimClock};
pub use config::{ConfigError, SimulationConfig};
pub use gathering::{GatherReport, GatheringCoordinator};
pub use interaction::{InteractionError, InteractionEvent, InteractionManager};
pub use operator::{OperatorState, SimulationEndReason};
pub use runner::{
    NoOpCallback, RunnerError, SimulationResult, TickCallback, log_simulation_end, run_simulation,
};
pub use tick::{Command, SimulationState, TickError, TickSummary, run_tick};
