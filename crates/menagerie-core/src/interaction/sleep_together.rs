//! Two pets curl up next to each other.
//!
//! The pets walk at a shared speed to two points either side of their
//! midpoint, lean into each other, and sleep for a fixed duration. While
//! asleep each pet twitches now and then: a short clip and a small jitter
//! around its anchor, always returning to the anchor afterwards. One pet
//! wakes first and nudges the other before both get up.

use glam::Vec3;
use menagerie_agents::{BehaviorContext, random_between};
use menagerie_types::{AnimationState, Emotion, PetId, Species};
use menagerie_world::set_speed;
use rand::Rng;
use tracing::debug;

use super::{Positioning, StageStatus, arrived, ground};
use crate::config::SleepTogetherConfig;

/// Distance between the two sleeping spots, chosen by size class.
pub fn spacing_for(first: Species, second: Species, config: &SleepTogetherConfig) -> f32 {
    match (first.is_large(), second.is_large()) {
        (true, true) => config.spacing_large,
        (false, false) => config.spacing_small,
        _ => config.spacing_mixed,
    }
}

/// Per-pet sleep bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sleeper {
    pet: PetId,
    anchor: Vec3,
    next_blip: f32,
    twitching: f32,
}

#[derive(Debug, Clone, PartialEq)]
enum SleepPhase {
    Setup,
    Approach {
        elapsed: f32,
        targets: [Vec3; 2],
    },
    Sleeping {
        remaining: f32,
        sleepers: [Sleeper; 2],
    },
    Waking {
        remaining: f32,
    },
    Done,
}

/// Sleep-together choreography state.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepTogether {
    config: SleepTogetherConfig,
    positioning: Positioning,
    pets: [PetId; 2],
    spacing: f32,
    phase: SleepPhase,
}

impl SleepTogether {
    /// Two pets that will sleep `spacing` apart.
    pub const fn new(
        config: SleepTogetherConfig,
        positioning: Positioning,
        first: PetId,
        second: PetId,
        spacing: f32,
    ) -> Self {
        Self {
            config,
            positioning,
            pets: [first, second],
            spacing,
            phase: SleepPhase::Setup,
        }
    }

    /// Sleeping anchors, once both pets have settled.
    pub fn anchors(&self) -> Option<[(PetId, Vec3); 2]> {
        match &self.phase {
            SleepPhase::Sleeping { sleepers, .. } => {
                Some((*sleepers).map(|sleeper| (sleeper.pet, sleeper.anchor)))
            }
            _ => None,
        }
    }

    /// Whether the pets are currently asleep.
    pub const fn is_sleeping(&self) -> bool {
        matches!(self.phase, SleepPhase::Sleeping { .. })
    }

    /// Advance the choreography by one tick.
    pub fn step(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> StageStatus {
        let [first, second] = self.pets;
        match &mut self.phase {
            SleepPhase::Setup => {
                let (Some(first_at), Some(second_at)) =
                    (ctx.locomotion.position(first), ctx.locomotion.position(second))
                else {
                    return StageStatus::Failed;
                };
                let middle = (first_at + second_at) * 0.5;
                let axis = ground(second_at - first_at).normalize_or(Vec3::X);
                let half = self.spacing * 0.5;
                let targets = [middle - axis * half, middle + axis * half].map(|target| {
                    ctx.locomotion
                        .sample_position(target, self.spacing)
                        .unwrap_or(target)
                });
                for (pet, target) in self.pets.iter().zip(targets) {
                    ctx.locomotion.resume(*pet);
                    set_speed(&mut *ctx.locomotion, *pet, self.config.approach_speed);
                    ctx.locomotion.set_destination(*pet, target);
                    ctx.presentation.set_animation(*pet, AnimationState::Walk);
                    ctx.presentation.show_emotion(*pet, Emotion::Love, self.positioning.timeout);
                }
                self.phase = SleepPhase::Approach {
                    elapsed: 0.0,
                    targets,
                };
                StageStatus::Running
            }
            SleepPhase::Approach { elapsed, targets } => {
                *elapsed += dt;
                let [first_target, second_target] = *targets;
                let distance = self.positioning.arrival_distance;
                let in_place = arrived(ctx, first, first_target, distance)
                    && arrived(ctx, second, second_target, distance);
                if in_place || *elapsed >= self.positioning.timeout {
                    let sleepers = self.settle([first_target, second_target], ctx);
                    debug!(%first, %second, "Sleeping together");
                    self.phase = SleepPhase::Sleeping {
                        remaining: self.config.duration,
                        sleepers,
                    };
                }
                StageStatus::Running
            }
            SleepPhase::Sleeping { remaining, sleepers } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    for sleeper in sleepers.iter_mut() {
                        blip(sleeper, &self.config, ctx, dt);
                    }
                    return StageStatus::Running;
                }
                for sleeper in sleepers.iter() {
                    ctx.locomotion.set_position(sleeper.pet, sleeper.anchor);
                    ctx.presentation.hide_emotion(sleeper.pet);
                }
                let (waker, sleeper) = if ctx.rng.random_bool(0.5) {
                    (first, second)
                } else {
                    (second, first)
                };
                ctx.presentation.set_animation(waker, AnimationState::Nudge);
                debug!(%waker, %sleeper, "Nudging partner awake");
                self.phase = SleepPhase::Waking {
                    remaining: ctx.presentation.animation_length(waker, AnimationState::Nudge),
                };
                StageStatus::Running
            }
            SleepPhase::Waking { remaining } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return StageStatus::Running;
                }
                for pet in self.pets {
                    ctx.locomotion.set_update_rotation(pet, true);
                    ctx.presentation.set_animation(pet, AnimationState::Idle);
                }
                self.phase = SleepPhase::Done;
                StageStatus::Finished
            }
            SleepPhase::Done => StageStatus::Finished,
        }
    }

    fn settle(&self, targets: [Vec3; 2], ctx: &mut BehaviorContext<'_>) -> [Sleeper; 2] {
        let [first_target, second_target] = targets;
        let inward = ground(second_target - first_target).normalize_or(Vec3::X);
        let first_anchor = first_target + inward * self.config.overlap;
        let second_anchor = second_target - inward * self.config.overlap;
        let anchors = [first_anchor, second_anchor];
        let [first, second] = self.pets;
        let partners = [(first, second_anchor), (second, first_anchor)];
        let mut sleepers = [first, second].map(|pet| Sleeper {
            pet,
            anchor: Vec3::ZERO,
            next_blip: 0.0,
            twitching: 0.0,
        });
        for ((sleeper, anchor), (pet, facing)) in sleepers.iter_mut().zip(anchors).zip(partners) {
            ctx.locomotion.stop(pet);
            ctx.locomotion.reset_path(pet);
            ctx.locomotion.set_position(pet, anchor);
            ctx.locomotion.rotate_towards(pet, facing, 360.0, 1.0);
            ctx.locomotion.set_update_rotation(pet, false);
            ctx.presentation.set_animation(pet, AnimationState::Sleep);
            ctx.presentation
                .show_emotion(pet, Emotion::Sleepy, self.config.duration);
            sleeper.anchor = anchor;
            sleeper.next_blip =
                random_between(ctx.rng, self.config.blip_min, self.config.blip_max);
        }
        sleepers
    }
}

fn blip(sleeper: &mut Sleeper, config: &SleepTogetherConfig, ctx: &mut BehaviorContext<'_>, dt: f32) {
    if sleeper.twitching > 0.0 {
        sleeper.twitching -= dt;
        if sleeper.twitching <= 0.0 {
            ctx.locomotion.set_position(sleeper.pet, sleeper.anchor);
            ctx.presentation.set_animation(sleeper.pet, AnimationState::Sleep);
        }
        return;
    }
    sleeper.next_blip -= dt;
    if sleeper.next_blip > 0.0 {
        return;
    }
    let jitter = Vec3::new(
        random_between(ctx.rng, -config.jitter, config.jitter),
        0.0,
        random_between(ctx.rng, -config.jitter, config.jitter),
    );
    ctx.locomotion.set_position(sleeper.pet, sleeper.anchor + jitter);
    ctx.presentation.set_animation(sleeper.pet, AnimationState::Twitch);
    sleeper.twitching = ctx
        .presentation
        .animation_length(sleeper.pet, AnimationState::Twitch);
    sleeper.next_blip = random_between(ctx.rng, config.blip_min, config.blip_max);
}
