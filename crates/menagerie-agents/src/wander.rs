//! Idle wandering, the lowest-priority behavior.
//!
//! An idle pet walks to a random navigable point near itself, then picks a
//! new one when it arrives or when its retarget timer runs out. Pets standing
//! at a gathering slot stay put.

use std::f32::consts::TAU;

use glam::Vec3;
use menagerie_types::{AnimationState, PetId};
use menagerie_world::PathStatus;
use rand::Rng;
use tracing::trace;

use crate::config::WanderConfig;
use crate::context::{BehaviorContext, random_between};

/// Wander progress stored in [`crate::Activity::Idle`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WanderState {
    target: Option<Vec3>,
    countdown: f32,
}

impl WanderState {
    /// A state that picks a new target on the next step.
    pub const fn retarget_now() -> Self {
        Self {
            target: None,
            countdown: 0.0,
        }
    }

    /// Current wander target.
    pub const fn target(&self) -> Option<Vec3> {
        self.target
    }
}

/// Picks and follows wander targets.
#[derive(Debug, Clone)]
pub struct Wanderer {
    config: WanderConfig,
}

impl Wanderer {
    /// Create a wanderer.
    pub const fn new(config: WanderConfig) -> Self {
        Self { config }
    }

    /// Advance wandering for one tick. `paused` pets keep still.
    pub fn step(
        &self,
        pet: PetId,
        paused: bool,
        state: &mut WanderState,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) {
        if paused {
            return;
        }
        state.countdown -= dt;

        let arrived = state.target.is_some()
            && matches!(
                ctx.locomotion.path_status(pet),
                PathStatus::Arrived | PathStatus::Unreachable | PathStatus::Idle
            );
        if arrived {
            state.target = None;
            ctx.presentation.set_animation(pet, AnimationState::Idle);
        }

        if arrived || state.countdown <= 0.0 {
            state.countdown =
                random_between(ctx.rng, self.config.min_interval, self.config.max_interval);
            self.pick_target(pet, state, ctx);
        }
    }

    fn pick_target(&self, pet: PetId, state: &mut WanderState, ctx: &mut BehaviorContext<'_>) {
        let Some(origin) = ctx.locomotion.position(pet) else {
            return;
        };
        let angle = ctx.rng.random_range(0.0..TAU);
        let distance = random_between(ctx.rng, 0.0, self.config.radius);
        let raw = origin + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

        let Some(point) = ctx
            .locomotion
            .sample_position(raw, self.config.sample_radius)
        else {
            trace!(%pet, "No navigable wander point");
            return;
        };
        ctx.locomotion.resume(pet);
        if ctx.locomotion.set_destination(pet, point) {
            state.target = Some(point);
            ctx.presentation.set_animation(pet, AnimationState::Walk);
            trace!(%pet, x = point.x, z = point.z, "Wander target");
        }
    }
}
