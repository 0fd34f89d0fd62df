//! Sleeping seeker.
//!
//! Per-pet sleep state machine:
//!
//! ```text
//! Awake -> SeekingArea -> Asleep -> Awake
//! Awake -> InTree(climb up -> sleep -> climb down) -> Awake
//! ```
//!
//! Sleepiness at or above the eligibility threshold makes a pet look for a
//! sleeping area matching its habitat (tree-habitat pets look for a free tree
//! first). Field pets skip the search and sleep where they stand, which
//! still counts as proper sleep. Proper sleep resets sleepiness to 0.
//!
//! Crossing the personality's forced threshold without having found a bed
//! puts the pet to sleep on the spot with only partial recovery.

use glam::Vec3;
use menagerie_types::{AnimationState, AreaId, Emotion, Habitat};
use menagerie_world::{
    Category, EntityRef, PathStatus, SpatialHit, SpatialQuery, World, nearest_hit,
    planar_distance,
};
use tracing::debug;

use crate::activity::TaskStatus;
use crate::climbing::{ClimbSequence, ClimbStatus, TreeAction};
use crate::config::{ClimbingConfig, SleepingConfig};
use crate::context::{AgentEvent, BehaviorContext};
use crate::needs::{NeedKind, Recovery};
use crate::pet::Pet;

#[derive(Debug, Clone, PartialEq)]
enum SleepPhase {
    SeekingArea {
        area: AreaId,
        target: Vec3,
        elapsed: f32,
    },
    Asleep {
        remaining: f32,
        recovery: Recovery,
    },
    InTree(ClimbSequence),
}

/// A pet's current sleep.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepTask {
    phase: SleepPhase,
    forced: bool,
}

impl SleepTask {
    /// Whether this is a low-quality sleep on the spot.
    pub const fn is_forced(&self) -> bool {
        self.forced
    }

    /// Whether the pet is actually asleep (not still looking for a bed).
    pub const fn is_asleep(&self) -> bool {
        match &self.phase {
            SleepPhase::Asleep { .. } => true,
            SleepPhase::InTree(sequence) => sequence.is_sleeping(),
            SleepPhase::SeekingArea { .. } => false,
        }
    }

    /// Whether the sleep happens in a tree.
    pub const fn in_tree(&self) -> bool {
        matches!(self.phase, SleepPhase::InTree(_))
    }
}

/// Finds beds and drives pets through sleep.
#[derive(Debug, Clone)]
pub struct SleepingSeeker {
    config: SleepingConfig,
    climbing: ClimbingConfig,
}

impl SleepingSeeker {
    /// Create a sleeping seeker. Tree sleep uses the climbing parameters.
    pub const fn new(config: SleepingConfig, climbing: ClimbingConfig) -> Self {
        Self { config, climbing }
    }

    /// Sleeping parameters.
    pub const fn config(&self) -> &SleepingConfig {
        &self.config
    }

    /// Whether `pet` is sleepy enough to look for a bed.
    pub fn is_eligible(&self, pet: &Pet) -> bool {
        pet.needs.sleepiness() >= self.config.eligibility_threshold
    }

    /// Whether `pet` has crossed its forced-sleep threshold.
    pub fn must_force(&self, pet: &Pet) -> bool {
        pet.needs.sleepiness() >= self.config.forced_threshold(pet.profile.personality)
    }

    /// Look for a proper place to sleep.
    pub fn try_start(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> Option<SleepTask> {
        if !self.is_eligible(pet) {
            return None;
        }
        if pet.profile.habitat == Habitat::Field {
            return Some(self.fall_asleep(pet, ctx, Recovery::Full, false));
        }
        if pet.cooldowns.sleeping_search > 0.0 {
            return None;
        }
        pet.cooldowns.sleeping_search = self.config.search_interval;
        let origin = ctx.locomotion.position(pet.id)?;

        if pet.profile.habitat == Habitat::Tree {
            let tree = ctx
                .world
                .trees
                .nearest_free(origin, self.config.detection_radius)
                .map(|tree| tree.id);
            if let Some(tree) = tree {
                let action = TreeAction::Sleep {
                    remaining: self.config.sleep_duration,
                };
                if let Some(sequence) =
                    ClimbSequence::begin(pet, tree, action, ctx, &self.climbing)
                {
                    debug!(pet = %pet.id, %tree, "Seeking a tree to sleep in");
                    return Some(SleepTask {
                        phase: SleepPhase::InTree(sequence),
                        forced: false,
                    });
                }
            }
        }

        let habitat = pet.profile.habitat;
        let world: &World = ctx.world;
        let hits: Vec<SpatialHit> = world
            .overlap_sphere(origin, self.config.detection_radius, Category::SLEEPING_AREA)
            .into_iter()
            .filter(|hit| match hit.entity {
                EntityRef::SleepingArea(id) => world
                    .resources
                    .sleeping_area(id)
                    .is_some_and(|area| area.habitat == habitat),
                _ => false,
            })
            .collect();
        let hit = nearest_hit(origin, &hits)?;
        let EntityRef::SleepingArea(area) = hit.entity else {
            return None;
        };
        let target = ctx
            .locomotion
            .sample_position(hit.position, self.config.arrival_distance)
            .unwrap_or(hit.position);
        ctx.locomotion.resume(pet.id);
        if !ctx.locomotion.set_destination(pet.id, target) {
            debug!(pet = %pet.id, %area, "Sleeping area unreachable");
            return None;
        }
        ctx.presentation.set_animation(pet.id, AnimationState::Walk);
        debug!(pet = %pet.id, %area, sleepiness = pet.needs.sleepiness(), "Seeking sleeping area");
        Some(SleepTask {
            phase: SleepPhase::SeekingArea {
                area,
                target,
                elapsed: 0.0,
            },
            forced: false,
        })
    }

    /// Put the pet to sleep where it stands with partial recovery.
    pub fn force(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> SleepTask {
        debug!(
            pet = %pet.id,
            sleepiness = pet.needs.sleepiness(),
            personality = ?pet.profile.personality,
            "Forced sleep"
        );
        self.fall_asleep(
            pet,
            ctx,
            Recovery::Partial(self.config.partial_recovery),
            true,
        )
    }

    /// Advance a sleep by one tick.
    pub fn step(
        &self,
        pet: &mut Pet,
        task: &mut SleepTask,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> TaskStatus {
        match &mut task.phase {
            SleepPhase::SeekingArea {
                area,
                target,
                elapsed,
            } => {
                *elapsed += dt;
                let Some(position) = ctx.locomotion.position(pet.id) else {
                    return TaskStatus::Done;
                };
                let unreachable = ctx.locomotion.path_status(pet.id) == PathStatus::Unreachable;
                if unreachable || *elapsed > self.config.seek_timeout {
                    debug!(pet = %pet.id, area = %*area, unreachable, "Gave up on sleeping area");
                    ctx.locomotion.reset_path(pet.id);
                    ctx.presentation.set_animation(pet.id, AnimationState::Idle);
                    return TaskStatus::Done;
                }
                if planar_distance(position, *target) <= self.config.arrival_distance
                    && !ctx.locomotion.is_path_pending(pet.id)
                {
                    *task = self.fall_asleep(pet, ctx, Recovery::Full, false);
                }
                TaskStatus::Running
            }
            SleepPhase::Asleep {
                remaining,
                recovery,
            } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return TaskStatus::Running;
                }
                pet.needs.satisfy(NeedKind::Sleepiness, *recovery);
                ctx.locomotion.resume(pet.id);
                ctx.presentation.set_animation(pet.id, AnimationState::Idle);
                ctx.events.push(AgentEvent::WokeUp {
                    pet: pet.id,
                    interrupted: false,
                });
                debug!(pet = %pet.id, sleepiness = pet.needs.sleepiness(), "Woke up");
                TaskStatus::Done
            }
            SleepPhase::InTree(sequence) => {
                let was_sleeping = sequence.is_sleeping();
                let status = sequence.step(pet, ctx, &self.climbing, dt);
                if !was_sleeping && sequence.is_sleeping() {
                    ctx.events.push(AgentEvent::FellAsleep {
                        pet: pet.id,
                        forced: false,
                        in_tree: true,
                    });
                }
                match status {
                    ClimbStatus::Running => TaskStatus::Running,
                    ClimbStatus::Completed => {
                        if sequence.action_finished() {
                            pet.needs.satisfy(NeedKind::Sleepiness, Recovery::Full);
                            ctx.events.push(AgentEvent::WokeUp {
                                pet: pet.id,
                                interrupted: false,
                            });
                        }
                        TaskStatus::Done
                    }
                    ClimbStatus::Failed => TaskStatus::Done,
                }
            }
        }
    }

    /// Wake the pet up early for an external event.
    ///
    /// A sleeping pet shows an angry emotion; a pet still looking for a bed
    /// just stops looking. Tree sleepers are brought straight down.
    pub fn interrupt(&self, pet: &mut Pet, task: &SleepTask, ctx: &mut BehaviorContext<'_>) {
        let was_asleep = task.is_asleep();
        if let SleepPhase::InTree(sequence) = &task.phase {
            sequence.force_cancel(pet, ctx, &self.climbing);
        }
        ctx.locomotion.reset_path(pet.id);
        ctx.locomotion.resume(pet.id);
        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
        if was_asleep {
            ctx.presentation
                .show_emotion(pet.id, Emotion::Angry, self.config.angry_duration);
            ctx.events.push(AgentEvent::WokeUp {
                pet: pet.id,
                interrupted: true,
            });
            debug!(pet = %pet.id, "Sleep interrupted");
        }
    }

    fn fall_asleep(
        &self,
        pet: &Pet,
        ctx: &mut BehaviorContext<'_>,
        recovery: Recovery,
        forced: bool,
    ) -> SleepTask {
        ctx.locomotion.reset_path(pet.id);
        ctx.locomotion.stop(pet.id);
        ctx.presentation.set_animation(pet.id, AnimationState::Sleep);
        ctx.events.push(AgentEvent::FellAsleep {
            pet: pet.id,
            forced,
            in_tree: false,
        });
        SleepTask {
            phase: SleepPhase::Asleep {
                remaining: self.config.sleep_duration,
                recovery,
            },
            forced,
        }
    }
}
