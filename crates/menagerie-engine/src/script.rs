//! Scripted demo schedule and tick logging.
//!
//! The engine has no user at the controls, so [`DemoScript`] stands in for
//! one: it issues a gather command and later calls it off, and it logs what
//! the pets get up to along the way.

use glam::Vec3;
use menagerie_core::interaction::{InteractionEvent, SessionEnd};
use menagerie_core::runner::TickCallback;
use menagerie_core::tick::{Command, SimulationState, TickSummary};
use menagerie_types::PetId;
use tracing::{debug, info};

/// Ticks between status lines.
const STATUS_EVERY: u64 = 100;

/// Tick callback driving the demo schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoScript {
    gather_at: u64,
    cancel_at: u64,
    target: Vec3,
    camera: Vec3,
}

impl DemoScript {
    /// Gather at the origin on `gather_at`, call it off on `cancel_at`.
    pub const fn new(gather_at: u64, cancel_at: u64) -> Self {
        Self {
            gather_at,
            cancel_at,
            target: Vec3::ZERO,
            camera: Vec3::new(0.0, 0.0, -20.0),
        }
    }
}

impl TickCallback for DemoScript {
    fn on_tick(&mut self, summary: &TickSummary, state: &mut SimulationState) {
        if summary.tick == self.gather_at {
            info!(tick = summary.tick, "Scripted gather");
            state.queue(Command::Gather {
                target: self.target,
                camera: self.camera,
            });
        }
        if summary.tick == self.cancel_at {
            info!(tick = summary.tick, "Scripted gather cancellation");
            state.queue(Command::CancelGather);
        }

        if let Some(report) = summary.gather {
            info!(
                assigned = report.assigned,
                staying = report.staying,
                skipped = report.skipped,
                "Gather dispatched"
            );
        }
        for event in &summary.agent_events {
            debug!(tick = summary.tick, ?event, "Pet event");
        }
        for event in &summary.interaction_events {
            log_interaction(state, event);
        }
        if summary.tick % STATUS_EVERY == 0 {
            info!(
                tick = summary.tick,
                time = summary.time,
                behaviors = ?summary.behaviors,
                sessions = state.interactions.sessions().len(),
                "Status"
            );
        }
    }
}

fn log_interaction(state: &SimulationState, event: &InteractionEvent) {
    match event {
        InteractionEvent::Started { kind, pets, .. } => {
            let [first, second] = *pets;
            info!(
                ?kind,
                first = name(state, first),
                second = name(state, second),
                "Interaction started"
            );
        }
        InteractionEvent::Ended {
            kind, end, race, ..
        } => {
            if let Some(race) = race {
                info!(
                    winner = name(state, race.winner),
                    loser = name(state, race.loser),
                    timed_out = race.timed_out,
                    elapsed = race.elapsed,
                    "Race finished"
                );
            }
            match end {
                SessionEnd::Completed => info!(?kind, "Interaction completed"),
                SessionEnd::Aborted { reason } => info!(?kind, ?reason, "Interaction aborted"),
            }
        }
    }
}

fn name(state: &SimulationState, pet: PetId) -> &str {
    state
        .pet(pet)
        .map_or("<gone>", |pet| pet.profile.name.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_core::config::SimulationConfig;
    use menagerie_types::{FoodType, Habitat, Personality, Species};

    use super::*;
    use crate::spawner;

    #[test]
    fn queues_gather_then_cancel() {
        let config = SimulationConfig::default();
        let mut state = SimulationState::new(&config).unwrap();
        let roster = [menagerie_core::config::PetSpec {
            name: "Biscuit".to_owned(),
            species: Species::Dog,
            personality: Personality::Curious,
            habitat: Habitat::Field,
            diet: vec![FoodType::Meat],
            hunger: 0.0,
            sleepiness: 0.0,
            speed: None,
        }];
        spawner::spawn_roster(&mut state, &roster, config.world.half_extent).unwrap();
        let mut script = DemoScript::new(1, 2);

        let first = TickSummary {
            tick: 1,
            ..TickSummary::default()
        };
        script.on_tick(&first, &mut state);
        assert!(matches!(
            state.commands.front(),
            Some(Command::Gather { .. })
        ));

        state.commands.clear();
        let second = TickSummary {
            tick: 2,
            ..TickSummary::default()
        };
        script.on_tick(&second, &mut state);
        assert_eq!(state.commands.front(), Some(&Command::CancelGather));
    }
}
