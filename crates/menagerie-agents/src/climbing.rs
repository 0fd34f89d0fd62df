//! Tree climbing.
//!
//! [`ClimbSequence`] is the reusable "climb and execute an action" routine:
//! claim the nearest free tree, walk to the trunk, switch off ground
//! navigation, interpolate up to a perch, run a [`TreeAction`], interpolate
//! back down, and re-enter the navmesh at the ground point. Whatever happens
//! in between, the claim is released and navigation re-enabled on the way
//! out; [`force_cancel_climbing`] does that for hard aborts.
//!
//! [`ClimbingSeeker`] drives ambient climbs: a cooldown-gated random roll
//! that sends a climber up a tree to rest for a while. Sleeping in a tree
//! reuses the same sequence with [`TreeAction::Sleep`].

use glam::Vec3;
use menagerie_types::{AnimationState, Habitat, TreeId};
use menagerie_world::{PathStatus, planar_distance};
use tracing::{debug, warn};

use crate::activity::TaskStatus;
use crate::config::ClimbingConfig;
use crate::context::{AgentEvent, BehaviorContext, random_between, roll};
use crate::pet::Pet;

/// What the pet does while perched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeAction {
    /// Rest for the remaining seconds. Pauses while selected and aborts on
    /// urgent needs.
    Rest {
        /// Seconds left.
        remaining: f32,
    },
    /// Sleep for the remaining seconds.
    Sleep {
        /// Seconds left.
        remaining: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClimbPhase {
    Approach { elapsed: f32 },
    Ascending { elapsed: f32, from: Vec3 },
    Acting(TreeAction),
    Descending { elapsed: f32, from: Vec3 },
}

/// Outcome of stepping a [`ClimbSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimbStatus {
    /// Still climbing, perched, or descending.
    Running,
    /// Back on the ground with the claim released.
    Completed,
    /// Never got up the tree; the claim is released.
    Failed,
}

/// A claimed tree and the pet's progress on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbSequence {
    tree: TreeId,
    trunk: Vec3,
    perch: Vec3,
    action: TreeAction,
    phase: ClimbPhase,
    action_finished: bool,
    abort_requested: bool,
}

impl ClimbSequence {
    /// Claim `tree` for `pet` and start walking to it.
    ///
    /// Returns `None` when the tree is unknown, already occupied, or the
    /// trunk cannot be reached. Nothing is left claimed in that case.
    pub fn begin(
        pet: &mut Pet,
        tree: TreeId,
        action: TreeAction,
        ctx: &mut BehaviorContext<'_>,
        config: &ClimbingConfig,
    ) -> Option<Self> {
        let (trunk, height) = {
            let found = ctx.world.trees.get(tree)?;
            (found.position, found.height)
        };
        if let Err(err) = ctx.world.trees.claim(tree, pet.id) {
            debug!(pet = %pet.id, %tree, error = %err, "Climb abandoned");
            return None;
        }

        let approach = ctx
            .locomotion
            .sample_position(trunk, config.trunk_distance * 2.0)
            .unwrap_or(trunk);
        ctx.locomotion.resume(pet.id);
        if !ctx.locomotion.set_destination(pet.id, approach) {
            debug!(pet = %pet.id, %tree, "Trunk unreachable");
            release_tree(ctx, tree, pet);
            return None;
        }
        pet.current_tree = Some(tree);
        ctx.presentation.set_animation(pet.id, AnimationState::Walk);

        let ratio = random_between(ctx.rng, config.height_ratio_min, config.height_ratio_max);
        debug!(pet = %pet.id, %tree, ?action, "Heading for tree");
        Some(Self {
            tree,
            trunk,
            perch: trunk + Vec3::Y * height * ratio,
            action,
            phase: ClimbPhase::Approach { elapsed: 0.0 },
            action_finished: false,
            abort_requested: false,
        })
    }

    /// The claimed tree.
    pub const fn tree(&self) -> TreeId {
        self.tree
    }

    /// Whether the perched action ran to completion.
    pub const fn action_finished(&self) -> bool {
        self.action_finished
    }

    /// Whether the pet is asleep on its perch.
    pub const fn is_sleeping(&self) -> bool {
        matches!(self.phase, ClimbPhase::Acting(TreeAction::Sleep { .. }))
    }

    /// Whether the pet has left the ground.
    pub const fn is_off_ground(&self) -> bool {
        !matches!(self.phase, ClimbPhase::Approach { .. })
    }

    /// Ask the pet to cut its action short and climb down normally.
    pub const fn request_descent(&mut self) {
        self.abort_requested = true;
    }

    /// Advance the sequence by one tick.
    pub fn step(
        &mut self,
        pet: &mut Pet,
        ctx: &mut BehaviorContext<'_>,
        config: &ClimbingConfig,
        dt: f32,
    ) -> ClimbStatus {
        match self.phase {
            ClimbPhase::Approach { elapsed } => self.approach(pet, ctx, config, elapsed + dt),
            ClimbPhase::Ascending { elapsed, from } => {
                let elapsed = elapsed + dt;
                let t = progress(elapsed, config.climb_duration);
                ctx.locomotion.set_position(pet.id, from.lerp(self.perch, t));
                if t >= 1.0 {
                    let state = match self.action {
                        TreeAction::Rest { .. } => AnimationState::Rest,
                        TreeAction::Sleep { .. } => AnimationState::Sleep,
                    };
                    ctx.presentation.set_animation(pet.id, state);
                    self.phase = ClimbPhase::Acting(self.action);
                } else {
                    self.phase = ClimbPhase::Ascending { elapsed, from };
                }
                ClimbStatus::Running
            }
            ClimbPhase::Acting(action) => {
                self.act(pet, ctx, config, action, dt);
                ClimbStatus::Running
            }
            ClimbPhase::Descending { elapsed, from } => {
                let elapsed = elapsed + dt;
                let t = progress(elapsed, config.climb_duration);
                ctx.locomotion.set_position(pet.id, from.lerp(self.trunk, t));
                if t >= 1.0 {
                    self.land(pet, ctx, config);
                    ClimbStatus::Completed
                } else {
                    self.phase = ClimbPhase::Descending { elapsed, from };
                    ClimbStatus::Running
                }
            }
        }
    }

    /// Hard abort from any phase. Safe to call repeatedly.
    pub fn force_cancel(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>, config: &ClimbingConfig) {
        force_cancel_climbing(pet, ctx, self.trunk.y, config.ground_sample_radius);
    }

    fn approach(
        &mut self,
        pet: &mut Pet,
        ctx: &mut BehaviorContext<'_>,
        config: &ClimbingConfig,
        elapsed: f32,
    ) -> ClimbStatus {
        let Some(position) = ctx.locomotion.position(pet.id) else {
            release_tree(ctx, self.tree, pet);
            return ClimbStatus::Failed;
        };
        let unreachable = ctx.locomotion.path_status(pet.id) == PathStatus::Unreachable;
        if unreachable || elapsed > config.approach_timeout || self.abort_requested {
            debug!(pet = %pet.id, tree = %self.tree, unreachable, "Climb approach abandoned");
            ctx.locomotion.reset_path(pet.id);
            ctx.presentation.set_animation(pet.id, AnimationState::Idle);
            release_tree(ctx, self.tree, pet);
            return ClimbStatus::Failed;
        }

        if planar_distance(position, self.trunk) <= config.trunk_distance
            && !ctx.locomotion.is_path_pending(pet.id)
        {
            ctx.locomotion.reset_path(pet.id);
            ctx.locomotion.set_enabled(pet.id, false);
            ctx.presentation.set_animation(pet.id, AnimationState::Climb);
            ctx.events.push(AgentEvent::ClimbedTree {
                pet: pet.id,
                tree: self.tree,
            });
            debug!(pet = %pet.id, tree = %self.tree, "Climbing up");
            self.phase = ClimbPhase::Ascending {
                elapsed: 0.0,
                from: position,
            };
        } else {
            self.phase = ClimbPhase::Approach { elapsed };
        }
        ClimbStatus::Running
    }

    fn act(
        &mut self,
        pet: &Pet,
        ctx: &mut BehaviorContext<'_>,
        config: &ClimbingConfig,
        action: TreeAction,
        dt: f32,
    ) {
        let (remaining, urgent, paused) = match action {
            TreeAction::Rest { remaining } => (
                remaining,
                pet.needs.hunger() > config.hunger_limit
                    || pet.needs.sleepiness() > config.sleepiness_limit,
                pet.selected,
            ),
            TreeAction::Sleep { remaining } => (remaining, false, false),
        };
        if self.abort_requested || pet.holding || urgent {
            debug!(pet = %pet.id, tree = %self.tree, "Perch cut short");
            self.descend(pet, ctx);
            return;
        }
        if paused {
            return;
        }
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.action_finished = true;
            self.descend(pet, ctx);
            return;
        }
        self.phase = ClimbPhase::Acting(match action {
            TreeAction::Rest { .. } => TreeAction::Rest { remaining },
            TreeAction::Sleep { .. } => TreeAction::Sleep { remaining },
        });
    }

    fn descend(&mut self, pet: &Pet, ctx: &mut BehaviorContext<'_>) {
        let from = ctx.locomotion.position(pet.id).unwrap_or(self.perch);
        ctx.presentation.set_animation(pet.id, AnimationState::Climb);
        self.phase = ClimbPhase::Descending { elapsed: 0.0, from };
    }

    fn land(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>, config: &ClimbingConfig) {
        ctx.locomotion.set_enabled(pet.id, true);
        let ground = ctx
            .locomotion
            .sample_position(self.trunk, config.ground_sample_radius)
            .unwrap_or(self.trunk);
        if !ctx.locomotion.warp(pet.id, ground) {
            warn!(pet = %pet.id, tree = %self.tree, "Could not warp onto navmesh after climb");
        }
        ctx.locomotion.resume(pet.id);
        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
        release_tree(ctx, self.tree, pet);
        ctx.events.push(AgentEvent::LeftTree {
            pet: pet.id,
            tree: self.tree,
        });
        debug!(pet = %pet.id, tree = %self.tree, "Back on the ground");
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}

fn release_tree(ctx: &mut BehaviorContext<'_>, tree: TreeId, pet: &mut Pet) {
    if let Err(err) = ctx.world.trees.release(tree, pet.id) {
        warn!(pet = %pet.id, %tree, error = %err, "Tree release rejected");
    }
    pet.current_tree = None;
}

/// Hard abort of any climb: release every claim the pet holds, re-enable
/// navigation at the ground point under the pet, and reset its animation.
///
/// Idempotent; calling it on a pet that is not climbing only re-enables its
/// agent in place.
pub fn force_cancel_climbing(
    pet: &mut Pet,
    ctx: &mut BehaviorContext<'_>,
    ground_y: f32,
    sample_radius: f32,
) {
    let released = ctx.world.trees.release_all(pet.id);
    pet.current_tree = None;
    ctx.locomotion.set_enabled(pet.id, true);
    if let Some(position) = ctx.locomotion.position(pet.id) {
        let ground = Vec3::new(position.x, ground_y, position.z);
        let target = ctx
            .locomotion
            .sample_position(ground, sample_radius)
            .unwrap_or(ground);
        if !ctx.locomotion.warp(pet.id, target) {
            warn!(pet = %pet.id, "Force-cancelled climb left pet off the navmesh");
        }
    }
    ctx.locomotion.reset_path(pet.id);
    ctx.presentation.set_animation(pet.id, AnimationState::Idle);
    if released > 0 {
        debug!(pet = %pet.id, released, "Climb force-cancelled");
    }
}

/// Ambient climb in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbTask {
    sequence: ClimbSequence,
}

impl ClimbTask {
    /// The underlying sequence.
    pub const fn sequence(&self) -> &ClimbSequence {
        &self.sequence
    }

    /// Ask the pet to climb down early.
    pub const fn request_descent(&mut self) {
        self.sequence.request_descent();
    }
}

/// Starts and drives ambient climbs.
#[derive(Debug, Clone)]
pub struct ClimbingSeeker {
    config: ClimbingConfig,
}

impl ClimbingSeeker {
    /// Create a climbing seeker.
    pub const fn new(config: ClimbingConfig) -> Self {
        Self { config }
    }

    /// Climbing parameters.
    pub const fn config(&self) -> &ClimbingConfig {
        &self.config
    }

    /// Whether `pet` climbs trees at all.
    pub fn can_climb(&self, pet: &Pet) -> bool {
        pet.profile.habitat == Habitat::Tree
            || self.config.climbing_species.contains(&pet.profile.species)
    }

    /// Roll for an ambient climb.
    ///
    /// Suppressed for non-climbers, during the cooldown, when hungry, when
    /// sleepy enough to seek a bed (`sleep_threshold`), and in water.
    pub fn try_start(
        &self,
        pet: &mut Pet,
        sleep_threshold: f32,
        ctx: &mut BehaviorContext<'_>,
    ) -> Option<ClimbTask> {
        if !self.can_climb(pet) || pet.cooldowns.climb_check > 0.0 {
            return None;
        }
        pet.cooldowns.climb_check = self.config.check_interval;
        if pet.needs.hunger() > self.config.hunger_limit
            || pet.needs.sleepiness() >= sleep_threshold
        {
            return None;
        }
        let position = ctx.locomotion.position(pet.id)?;
        if ctx.world.resources.water_at(position).is_some() {
            return None;
        }
        if !roll(ctx.rng, self.config.chance) {
            return None;
        }
        let tree = ctx
            .world
            .trees
            .nearest_free(position, self.config.detection_radius)?
            .id;
        let remaining = random_between(ctx.rng, self.config.rest_min, self.config.rest_max);
        ClimbSequence::begin(pet, tree, TreeAction::Rest { remaining }, ctx, &self.config)
            .map(|sequence| ClimbTask { sequence })
    }

    /// Advance an ambient climb.
    pub fn step(
        &self,
        pet: &mut Pet,
        task: &mut ClimbTask,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> TaskStatus {
        match task.sequence.step(pet, ctx, &self.config, dt) {
            ClimbStatus::Running => TaskStatus::Running,
            ClimbStatus::Completed | ClimbStatus::Failed => TaskStatus::Done,
        }
    }

    /// Hard abort of an ambient climb.
    pub fn force_cancel(&self, pet: &mut Pet, task: &ClimbTask, ctx: &mut BehaviorContext<'_>) {
        task.sequence.force_cancel(pet, ctx, &self.config);
    }
}
