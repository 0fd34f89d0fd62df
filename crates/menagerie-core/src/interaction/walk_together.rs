//! Two pets stroll side by side to a shared destination.

use std::f32::consts::TAU;

use glam::Vec3;
use menagerie_agents::BehaviorContext;
use menagerie_types::{AnimationState, Emotion, PetId};
use menagerie_world::{planar_distance, set_speed};
use rand::Rng;
use tracing::debug;

use super::{Participant, Positioning, StageStatus, arrived};
use crate::config::WalkTogetherConfig;

/// Random directions tried before the walk is abandoned.
const DESTINATION_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WalkPhase {
    Setup,
    Walking { elapsed: f32, lanes: [Vec3; 2] },
    Done,
}

/// Walk-together choreography state.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkTogether {
    config: WalkTogetherConfig,
    positioning: Positioning,
    pets: [PetId; 2],
    speed: f32,
    phase: WalkPhase,
}

impl WalkTogether {
    /// A walk at the slower pet's base speed.
    pub fn new(
        config: WalkTogetherConfig,
        positioning: Positioning,
        first: &Participant,
        second: &Participant,
    ) -> Self {
        Self {
            config,
            positioning,
            pets: [first.id, second.id],
            speed: first.base.speed.min(second.base.speed),
            phase: WalkPhase::Setup,
        }
    }

    /// Shared walking speed.
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Advance the choreography by one tick.
    pub fn step(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> StageStatus {
        match self.phase {
            WalkPhase::Setup => {
                let [first, second] = self.pets;
                let (Some(first_at), Some(second_at)) =
                    (ctx.locomotion.position(first), ctx.locomotion.position(second))
                else {
                    return StageStatus::Failed;
                };
                let middle = (first_at + second_at) * 0.5;
                let Some(destination) = self.pick_destination(middle, ctx) else {
                    debug!(%first, %second, "No walk destination found");
                    return StageStatus::Failed;
                };
                let axis = (destination - middle).normalize_or(Vec3::Z);
                let lateral = Vec3::new(-axis.z, 0.0, axis.x) * self.config.side_offset;
                let lanes = [destination + lateral, destination - lateral];
                for (pet, lane) in self.pets.into_iter().zip(lanes) {
                    ctx.locomotion.resume(pet);
                    set_speed(&mut *ctx.locomotion, pet, self.speed);
                    ctx.locomotion.set_destination(pet, lane);
                    ctx.presentation.set_animation(pet, AnimationState::Walk);
                    ctx.presentation.show_emotion(pet, Emotion::Happy, self.config.timeout);
                }
                self.phase = WalkPhase::Walking {
                    elapsed: 0.0,
                    lanes,
                };
                StageStatus::Running
            }
            WalkPhase::Walking { elapsed, lanes } => {
                let elapsed = elapsed + dt;
                let distance = self.positioning.arrival_distance;
                let all_arrived = self
                    .pets
                    .into_iter()
                    .zip(lanes)
                    .all(|(pet, lane)| arrived(ctx, pet, lane, distance));
                if !all_arrived && elapsed < self.config.timeout {
                    self.phase = WalkPhase::Walking { elapsed, lanes };
                    return StageStatus::Running;
                }
                if !all_arrived {
                    debug!(elapsed, "Walk called off");
                }
                for pet in self.pets {
                    ctx.locomotion.reset_path(pet);
                    ctx.presentation.set_animation(pet, AnimationState::Idle);
                    ctx.presentation.hide_emotion(pet);
                }
                self.phase = WalkPhase::Done;
                StageStatus::Finished
            }
            WalkPhase::Done => StageStatus::Finished,
        }
    }

    fn pick_destination(&self, middle: Vec3, ctx: &mut BehaviorContext<'_>) -> Option<Vec3> {
        let tolerance = self.config.side_offset * 2.0;
        (0..DESTINATION_ATTEMPTS).find_map(|_| {
            let angle = ctx.rng.random_range(0.0..TAU);
            let candidate =
                middle + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.config.distance;
            ctx.locomotion
                .sample_position(candidate, tolerance)
                .filter(|point| {
                    planar_distance(middle, *point) + tolerance >= self.config.distance
                        && ctx.locomotion.path_complete(middle, *point)
                })
        })
    }
}
