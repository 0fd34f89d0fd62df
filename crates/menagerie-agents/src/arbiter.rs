//! Per-pet behavior arbitration.
//!
//! The [`Arbiter`] owns every autonomous seeker and decides, once per tick,
//! which of them drives a pet. Ownership is the pet's [`Activity`]; the
//! arbiter is the only code that swaps it for autonomous behaviors, and the
//! coordinators above it go through [`Arbiter::claim_external`].
//!
//! # Update order
//!
//! 1. A held pet is handed to [`Activity::Held`] and nothing else runs.
//! 2. Pets owned by an external coordinator are left alone.
//! 3. A scripted animation whose time ran out unlocks the pet.
//! 4. The current autonomous task is stepped; a finished task releases the
//!    pet back to idle.
//! 5. Forced sleep preempts anything of lower priority. A climbing pet is
//!    asked to climb down first and falls asleep on a later tick.
//! 6. Idle pets get proposals in priority order: tree climb, feeding,
//!    sleeping, water. With no proposal they wander. Action and animation
//!    locks suppress both.

use menagerie_types::{AnimationState, Vec3};
use tracing::{debug, trace};

use crate::activity::{Activity, Behavior, TaskStatus};
use crate::climbing::ClimbingSeeker;
use crate::config::BehaviorConfig;
use crate::context::BehaviorContext;
use crate::error::AgentError;
use crate::feeding::FeedingSeeker;
use crate::pet::Pet;
use crate::sleeping::SleepingSeeker;
use crate::wander::Wanderer;
use crate::water::WaterSeeker;

/// Radius used to project a put-down point onto the navigation surface.
const PUT_DOWN_SAMPLE_RADIUS: f32 = 5.0;

/// Chooses which behavior owns each pet.
#[derive(Debug, Clone)]
pub struct Arbiter {
    config: BehaviorConfig,
    wanderer: Wanderer,
    feeding: FeedingSeeker,
    sleeping: SleepingSeeker,
    climbing: ClimbingSeeker,
    water: WaterSeeker,
}

impl Arbiter {
    /// Build an arbiter and its seekers from configuration.
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            wanderer: Wanderer::new(config.wander.clone()),
            feeding: FeedingSeeker::new(config.feeding.clone()),
            sleeping: SleepingSeeker::new(config.sleeping.clone(), config.climbing.clone()),
            climbing: ClimbingSeeker::new(config.climbing.clone()),
            water: WaterSeeker::new(config.water.clone()),
            config,
        }
    }

    /// Behavior configuration.
    pub const fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Run one arbitration step for `pet`.
    pub fn update(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>, dt: f32) {
        pet.cooldowns.tick(dt);

        if pet.holding {
            if !matches!(pet.activity, Activity::Held) {
                self.abort_current(pet, ctx);
                pet.activity = Activity::Held;
                pet.gathered = false;
                debug!(pet = %pet.id, "Held by user");
            }
            return;
        }
        if matches!(pet.activity, Activity::Held) {
            self.release(pet, ctx);
        }
        if pet.behavior().is_external() {
            return;
        }
        if pet.animation_locked && pet.cooldowns.animation_lock <= 0.0 {
            trace!(pet = %pet.id, "Scripted animation finished");
            end_animation(pet, ctx);
        }

        if !pet.is_idle() && self.step_current(pet, ctx, dt) == TaskStatus::Done {
            trace!(pet = %pet.id, behavior = ?pet.behavior(), "Task finished");
            self.release(pet, ctx);
        }

        if self.preempt_for_forced_sleep(pet, ctx) {
            return;
        }

        if pet.is_idle() && !pet.action_locked && !pet.animation_locked {
            if let Some(activity) = self.propose(pet, ctx) {
                debug!(pet = %pet.id, behavior = ?activity.behavior(), "Behavior started");
                pet.activity = activity;
                pet.gathered = false;
                return;
            }
        }

        if let Activity::Idle(state) = &mut pet.activity {
            let paused = pet.gathered || pet.action_locked || pet.animation_locked;
            self.wanderer.step(pet.id, paused, state, ctx, dt);
        }
    }

    /// Hand `pet` to an external coordinator.
    ///
    /// Lower-priority autonomous work is aborted cleanly first: climbs are
    /// force-cancelled and the tree released, sleepers are woken with an
    /// angry emotion, and walks are dropped. A new gathering command may
    /// supersede an older one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::BehaviorConflict`] when an external owner of
    /// equal or higher priority already holds the pet. The pet is left
    /// untouched in that case.
    pub fn claim_external(
        &self,
        pet: &mut Pet,
        activity: Activity,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), AgentError> {
        let current = pet.behavior();
        let requested = activity.behavior();
        let supersedes = current == Behavior::Gathering && requested == Behavior::Gathering;
        if current.is_external() && current >= requested && !supersedes {
            debug!(pet = %pet.id, ?current, ?requested, "External claim rejected");
            return Err(AgentError::BehaviorConflict {
                pet: pet.id,
                current,
                requested,
            });
        }
        self.abort_current(pet, ctx);
        end_animation(pet, ctx);
        pet.activity = activity;
        pet.gathered = false;
        debug!(pet = %pet.id, ?requested, "External claim");
        Ok(())
    }

    /// Give `pet` back to idle wandering with its base locomotion restored.
    pub fn release(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) {
        ctx.locomotion.set_params(pet.id, pet.base);
        ctx.locomotion.set_update_rotation(pet.id, true);
        ctx.locomotion.resume(pet.id);
        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
        pet.activity = Activity::idle();
    }

    /// The user picks `pet` up.
    pub fn pick_up(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) {
        pet.holding = true;
        if !matches!(pet.activity, Activity::Held) {
            self.abort_current(pet, ctx);
            pet.activity = Activity::Held;
            pet.gathered = false;
        }
        end_animation(pet, ctx);
        ctx.locomotion.set_enabled(pet.id, false);
        debug!(pet = %pet.id, "Picked up");
    }

    /// The user drops `pet` at `point`.
    pub fn put_down(&self, pet: &mut Pet, point: Vec3, ctx: &mut BehaviorContext<'_>) {
        pet.holding = false;
        ctx.locomotion.set_enabled(pet.id, true);
        let landing = ctx
            .locomotion
            .sample_position(point, PUT_DOWN_SAMPLE_RADIUS)
            .unwrap_or(point);
        if !ctx.locomotion.warp(pet.id, landing) {
            debug!(pet = %pet.id, x = point.x, z = point.z, "Put down off the navigation surface");
        }
        self.release(pet, ctx);
        debug!(pet = %pet.id, "Put down");
    }

    /// Play a scripted `animation` on an idle pet for `duration` seconds.
    ///
    /// The pet stops where it stands and no autonomous behavior, forced sleep
    /// or interaction may start until the animation ends. Returns `false` when
    /// the pet is held or owned by anything but wandering.
    pub fn play_animation(
        &self,
        pet: &mut Pet,
        animation: AnimationState,
        duration: f32,
        ctx: &mut BehaviorContext<'_>,
    ) -> bool {
        if pet.holding || !pet.is_idle() {
            debug!(pet = %pet.id, behavior = ?pet.behavior(), "Scripted animation refused");
            return false;
        }
        ctx.locomotion.reset_path(pet.id);
        ctx.locomotion.stop(pet.id);
        ctx.presentation.set_animation(pet.id, animation);
        pet.animation_locked = true;
        pet.cooldowns.animation_lock = duration.max(0.0);
        debug!(pet = %pet.id, ?animation, duration, "Scripted animation started");
        true
    }

    fn step_current(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>, dt: f32) -> TaskStatus {
        let mut activity = std::mem::take(&mut pet.activity);
        let status = match &mut activity {
            Activity::Sleeping(task) => self.sleeping.step(pet, task, ctx, dt),
            Activity::Climbing(task) => self.climbing.step(pet, task, ctx, dt),
            Activity::Feeding(task) => self.feeding.step(pet, task, ctx, dt),
            Activity::Water(task) => self.water.step(pet, task, ctx, dt),
            Activity::Idle(_)
            | Activity::Held
            | Activity::Interacting { .. }
            | Activity::Gathering { .. } => TaskStatus::Running,
        };
        pet.activity = activity;
        status
    }

    fn preempt_for_forced_sleep(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> bool {
        if pet.animation_locked
            || pet.behavior() >= Behavior::ForcedSleep
            || matches!(pet.activity, Activity::Sleeping(_))
            || !self.sleeping.must_force(pet)
        {
            return false;
        }
        if let Activity::Climbing(task) = &mut pet.activity {
            task.request_descent();
            return true;
        }
        self.abort_current(pet, ctx);
        pet.activity = Activity::Sleeping(self.sleeping.force(pet, ctx));
        pet.gathered = false;
        true
    }

    fn propose(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> Option<Activity> {
        let sleep_threshold = self.sleeping.config().eligibility_threshold;
        if let Some(task) = self.climbing.try_start(pet, sleep_threshold, ctx) {
            return Some(Activity::Climbing(task));
        }
        if let Some(task) = self.feeding.try_start(pet, ctx) {
            return Some(Activity::Feeding(task));
        }
        if let Some(task) = self.sleeping.try_start(pet, ctx) {
            return Some(Activity::Sleeping(task));
        }
        self.water.try_start(pet, ctx).map(Activity::Water)
    }

    /// Cleanly stop whatever autonomous work owns `pet`, leaving it idle.
    fn abort_current(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) {
        match std::mem::take(&mut pet.activity) {
            Activity::Feeding(_) => self.feeding.cancel(pet.id, ctx),
            Activity::Sleeping(task) => self.sleeping.interrupt(pet, &task, ctx),
            Activity::Climbing(task) => self.climbing.force_cancel(pet, &task, ctx),
            Activity::Water(_) => self.water.cancel(pet.id, ctx),
            Activity::Idle(_) => ctx.locomotion.reset_path(pet.id),
            Activity::Gathering { .. } => {
                ctx.locomotion.set_params(pet.id, pet.base);
                ctx.locomotion.set_update_rotation(pet.id, true);
            }
            Activity::Held | Activity::Interacting { .. } => {}
        }
    }
}

/// Unlock a pet held by a scripted animation.
fn end_animation(pet: &mut Pet, ctx: &mut BehaviorContext<'_>) {
    if !pet.animation_locked {
        return;
    }
    pet.animation_locked = false;
    pet.cooldowns.animation_lock = 0.0;
    ctx.locomotion.resume(pet.id);
    ctx.presentation.set_animation(pet.id, AnimationState::Idle);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_types::{Emotion, Habitat, Personality, SessionId, Species};
    use menagerie_world::{Locomotion, PathStatus};

    use super::*;
    use crate::config::ClimbingConfig;
    use crate::needs::NeedKind;
    use crate::test_support::{Harness, pet};

    const DT: f32 = 0.1;

    fn climbing_arbiter() -> Arbiter {
        Arbiter::new(BehaviorConfig {
            climbing: ClimbingConfig {
                chance: 1.0,
                ..ClimbingConfig::default()
            },
            ..BehaviorConfig::default()
        })
    }

    #[test]
    fn forced_sleep_preempts_wander() {
        let mut harness = Harness::new(5);
        let mut lazy = pet(Species::Bear, Personality::Lazy, Habitat::Forest);
        lazy.needs.set(NeedKind::Sleepiness, 85.0);
        harness.spawn(&lazy, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        arbiter.update(&mut lazy, &mut harness.ctx(), DT);

        assert_eq!(lazy.behavior(), Behavior::ForcedSleep);
        assert!(lazy.is_sleeping());
    }

    #[test]
    fn idle_pet_wanders() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        arbiter.update(&mut dog, &mut harness.ctx(), DT);

        assert!(dog.is_idle());
        assert_eq!(harness.mesh.path_status(dog.id), PathStatus::Pending);
    }

    #[test]
    fn gathered_pet_stays_put() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        dog.gathered = true;
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        arbiter.update(&mut dog, &mut harness.ctx(), DT);

        assert!(harness.mesh.destination(dog.id).is_none());
    }

    #[test]
    fn external_claim_over_climb_releases_tree() {
        let mut harness = Harness::new(5);
        let tree = harness.world.trees.register(Vec3::new(2.0, 0.0, 0.0), 4.0);
        let mut cat = pet(Species::Cat, Personality::Curious, Habitat::Field);
        harness.spawn(&cat, Vec3::ZERO);
        let arbiter = climbing_arbiter();

        arbiter.update(&mut cat, &mut harness.ctx(), DT);
        assert!(cat.is_climbing_tree());
        assert_eq!(harness.world.trees.occupant(tree), Some(cat.id));

        arbiter
            .claim_external(&mut cat, Activity::Gathering { version: 1 }, &mut harness.ctx())
            .unwrap();

        assert!(cat.is_gathering());
        assert!(harness.world.trees.get(tree).unwrap().is_free());
        assert_eq!(cat.current_tree, None);
        assert_eq!(cat.exclusive_flag_count(), 1);
    }

    #[test]
    fn gathering_cannot_take_an_interacting_pet() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let session = SessionId::new();
        let partner = menagerie_types::PetId::new();
        arbiter
            .claim_external(&mut dog, Activity::Interacting { session, partner }, &mut harness.ctx())
            .unwrap();

        let result =
            arbiter.claim_external(&mut dog, Activity::Gathering { version: 2 }, &mut harness.ctx());

        assert_eq!(
            result,
            Err(AgentError::BehaviorConflict {
                pet: dog.id,
                current: Behavior::Interaction,
                requested: Behavior::Gathering,
            })
        );
        assert_eq!(dog.interaction_session(), Some(session));
    }

    #[test]
    fn newer_gathering_supersedes_older() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        arbiter
            .claim_external(&mut dog, Activity::Gathering { version: 1 }, &mut harness.ctx())
            .unwrap();
        arbiter
            .claim_external(&mut dog, Activity::Gathering { version: 2 }, &mut harness.ctx())
            .unwrap();

        assert_eq!(dog.activity, Activity::Gathering { version: 2 });
    }

    #[test]
    fn holding_a_sleeper_wakes_it_angry() {
        let mut harness = Harness::new(5);
        let mut cow = pet(Species::Horse, Personality::Lazy, Habitat::Field);
        cow.needs.set(NeedKind::Sleepiness, 75.0);
        harness.spawn(&cow, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        arbiter.update(&mut cow, &mut harness.ctx(), DT);
        assert!(cow.is_sleeping());

        arbiter.pick_up(&mut cow, &mut harness.ctx());

        assert_eq!(cow.behavior(), Behavior::Held);
        assert!(harness.presentation.showed(cow.id, Emotion::Angry));
        assert!(!harness.mesh.is_enabled(cow.id));

        arbiter.update(&mut cow, &mut harness.ctx(), DT);
        assert_eq!(cow.behavior(), Behavior::Held);

        arbiter.put_down(&mut cow, Vec3::new(4.0, 0.0, 4.0), &mut harness.ctx());
        assert!(cow.is_idle());
        assert!(harness.mesh.is_enabled(cow.id));
        assert!(harness.mesh.is_on_navmesh(cow.id));
    }

    #[test]
    fn forced_sleep_asks_a_climber_to_come_down() {
        let mut harness = Harness::new(5);
        harness.world.trees.register(Vec3::new(1.0, 0.0, 0.0), 4.0);
        let mut cat = pet(Species::Cat, Personality::Lazy, Habitat::Field);
        harness.spawn(&cat, Vec3::ZERO);
        let arbiter = climbing_arbiter();
        arbiter.update(&mut cat, &mut harness.ctx(), DT);
        assert!(cat.is_climbing_tree());

        cat.needs.set(NeedKind::Sleepiness, 85.0);
        for _ in 0..300 {
            arbiter.update(&mut cat, &mut harness.ctx(), DT);
            harness.mesh.advance(DT);
            assert!(cat.exclusive_flag_count() <= 1);
            if cat.behavior() == Behavior::ForcedSleep {
                break;
            }
        }

        assert_eq!(cat.behavior(), Behavior::ForcedSleep);
        assert_eq!(cat.current_tree, None);
        assert!(harness.mesh.is_on_navmesh(cat.id));
    }

    #[test]
    fn action_lock_holds_proposals_and_wandering() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        dog.needs.set(NeedKind::Sleepiness, 75.0);
        dog.action_locked = true;
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        for _ in 0..10 {
            arbiter.update(&mut dog, &mut harness.ctx(), DT);
            harness.mesh.advance(DT);
        }
        assert!(dog.is_idle());
        assert!(harness.mesh.destination(dog.id).is_none());

        dog.action_locked = false;
        arbiter.update(&mut dog, &mut harness.ctx(), DT);
        assert_eq!(dog.behavior(), Behavior::Sleeping);
    }

    #[test]
    fn scripted_animation_blocks_forced_sleep_until_it_ends() {
        let mut harness = Harness::new(5);
        let mut bear = pet(Species::Bear, Personality::Lazy, Habitat::Forest);
        harness.spawn(&bear, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());

        assert!(arbiter.play_animation(&mut bear, AnimationState::Victory, 1.0, &mut harness.ctx()));
        assert!(harness.mesh.is_stopped(bear.id));
        assert_eq!(harness.presentation.animation(bear.id), AnimationState::Victory);
        bear.needs.set(NeedKind::Sleepiness, 85.0);

        for _ in 0..5 {
            arbiter.update(&mut bear, &mut harness.ctx(), DT);
            assert!(bear.is_idle());
            assert!(bear.animation_locked);
        }

        for _ in 0..10 {
            arbiter.update(&mut bear, &mut harness.ctx(), DT);
        }
        assert!(!bear.animation_locked);
        assert!(bear.cooldowns.animation_lock.abs() < f32::EPSILON);
        assert_eq!(bear.behavior(), Behavior::ForcedSleep);
    }

    #[test]
    fn scripted_animation_needs_an_idle_pet() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        arbiter.pick_up(&mut dog, &mut harness.ctx());

        assert!(!arbiter.play_animation(&mut dog, AnimationState::Nudge, 1.0, &mut harness.ctx()));
        assert!(!dog.animation_locked);
    }

    #[test]
    fn external_claim_cuts_a_scripted_animation_short() {
        let mut harness = Harness::new(5);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::ZERO);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        assert!(arbiter.play_animation(&mut dog, AnimationState::Victory, 5.0, &mut harness.ctx()));

        arbiter
            .claim_external(&mut dog, Activity::Gathering { version: 1 }, &mut harness.ctx())
            .unwrap();

        assert!(!dog.animation_locked);
        assert!(!harness.mesh.is_stopped(dog.id));
    }
}
