//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or a wall-clock limit
//! - **Pause/resume**: an operator can halt and continue the loop
//! - **Variable tick speed**: the tick interval is adjustable at runtime
//! - **Command injection**: queued operator commands reach the next tick
//! - **Operator stop**: immediate clean stop between ticks
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use tracing::{info, warn};

use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// The callback may queue commands on the state; they are applied at the
/// start of the next tick.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &mut SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &mut SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        pets = state.pets.len(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            let reason = SimulationEndReason::OperatorStop;
            operator.set_end_reason(reason).await;
            return Ok(SimulationResult {
                end_reason: reason,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            let reason = SimulationEndReason::MaxRealTimeReached;
            operator.set_end_reason(reason).await;
            return Ok(SimulationResult {
                end_reason: reason,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Hand over operator commands ---
        state.commands.extend(operator.drain_commands().await);

        // --- Execute tick ---
        let summary = tick::run_tick(state)?;

        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, state);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            let reason = SimulationEndReason::MaxTicksReached;
            operator.set_end_reason(reason).await;
            return Ok(SimulationResult {
                end_reason: reason,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            time = summary.time,
            behaviors = ?summary.behaviors,
            violations = summary.violations,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glam::Vec3;
    use menagerie_agents::Needs;
    use menagerie_types::{DietFlags, Habitat, LocomotionParams, Personality, PetProfile, Species};

    use super::*;
    use crate::config::SimulationConfig;
    use crate::tick::Command;

    fn state_with_pets(count: usize) -> SimulationState {
        let mut state = SimulationState::new(&SimulationConfig::default()).unwrap();
        for index in 0..count {
            state.spawn_pet(
                PetProfile {
                    name: format!("Pet {index}"),
                    species: Species::Dog,
                    personality: Personality::Playful,
                    diet: DietFlags::all(),
                    habitat: Habitat::Field,
                },
                Needs::default(),
                LocomotionParams::default(),
                Vec3::new(index as f32 * 4.0, 0.0, 0.0),
            );
        }
        state
    }

    /// Counts ticks and queues a gather on the second one.
    struct Script {
        seen: u64,
    }

    impl TickCallback for Script {
        fn on_tick(&mut self, summary: &TickSummary, state: &mut SimulationState) {
            self.seen = summary.tick;
            if summary.tick == 2 {
                state.queue(Command::Gather {
                    target: Vec3::new(10.0, 0.0, 10.0),
                    camera: Vec3::new(10.0, 0.0, 30.0),
                });
            }
        }
    }

    #[tokio::test]
    async fn stops_at_tick_limit() {
        let mut state = state_with_pets(2);
        let operator = Arc::new(OperatorState::new(0, 5, 0));

        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_summary.unwrap().tick, 5);
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut state = state_with_pets(1);
        let operator = Arc::new(OperatorState::new(0, 0, 0));
        operator.request_stop();

        let result = run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn callback_commands_reach_next_tick() {
        let mut state = state_with_pets(3);
        let operator = Arc::new(OperatorState::new(0, 4, 0));
        let mut script = Script { seen: 0 };

        run_simulation(&mut state, &operator, &mut script)
            .await
            .unwrap();

        assert_eq!(script.seen, 4);
        assert_eq!(state.gathering.monitors().count(), 3);
        assert!(state.pets.values().all(|pet| pet.is_gathering()));
    }

    #[tokio::test]
    async fn operator_commands_are_applied() {
        let mut state = state_with_pets(1);
        let id = *state.pets.keys().next().unwrap();
        let operator = Arc::new(OperatorState::new(0, 1, 0));
        operator.submit(Command::Select(id, true)).await;

        run_simulation(&mut state, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert!(state.pet(id).unwrap().selected);
    }
}
