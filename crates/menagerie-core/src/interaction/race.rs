//! Rabbit-and-turtle race.
//!
//! Both pets line up side by side on a start line, hold still for a tension
//! beat, then run towards a finish line at least `course_length` units away.
//! The rabbit is much faster but naps once it has covered `sleep_progress` of
//! the course, and only wakes (running faster than before) when the turtle
//! passes `wake_progress`. The race ends when the turtle arrives or at the
//! hard timeout, whichever comes first.
//!
//! Progress is the displacement from the start projected onto the course
//! axis, divided by the course length. It is not clamped, so overshooting
//! the finish reads as more than 1.0.

use std::f32::consts::TAU;

use glam::Vec3;
use menagerie_agents::BehaviorContext;
use menagerie_types::{AnimationState, Emotion, PetId, Species};
use menagerie_world::{Locomotion, planar_distance, set_speed};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::{Participant, Positioning, StageStatus, arrived, ground};
use crate::config::RaceConfig;

/// Tolerance when checking that a sampled finish line is far enough away.
const COURSE_TOLERANCE: f32 = 1e-3;

/// How a race ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceResult {
    /// The winning pet.
    pub winner: PetId,
    /// The losing pet.
    pub loser: PetId,
    /// Whether the hard timeout decided the race.
    pub timed_out: bool,
    /// Rabbit progress at the moment it fell asleep.
    pub rabbit_slept_at: Option<f32>,
    /// Turtle progress at the moment the rabbit woke.
    pub rabbit_woke_at: Option<f32>,
    /// Seconds from the start signal to the end.
    pub elapsed: f32,
}

/// A straight race course on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Course {
    /// Midpoint of the start line.
    pub start: Vec3,
    /// Midpoint of the finish line.
    pub finish: Vec3,
}

impl Course {
    /// Unit direction from start to finish.
    pub fn axis(&self) -> Vec3 {
        ground(self.finish - self.start).normalize_or(Vec3::Z)
    }

    /// Planar course length.
    pub fn length(&self) -> f32 {
        planar_distance(self.start, self.finish)
    }

    /// Unclamped progress of `position` along the course.
    pub fn progress(&self, position: Vec3) -> f32 {
        let length = self.length();
        if length <= f32::EPSILON {
            return 1.0;
        }
        ground(position - self.start).dot(self.axis()) / length
    }

    fn lateral(&self) -> Vec3 {
        let axis = self.axis();
        Vec3::new(-axis.z, 0.0, axis.x)
    }
}

/// Search up to `course_attempts` random directions from `center` for a
/// navigable finish line `course_length` away, falling back to a course
/// along `forward`.
pub fn plan_course(
    locomotion: &dyn Locomotion,
    rng: &mut StdRng,
    center: Vec3,
    forward: Vec3,
    config: &RaceConfig,
) -> Course {
    let start = locomotion
        .sample_position(center, config.start_spacing * 2.0)
        .unwrap_or(center);
    for _ in 0..config.course_attempts {
        let angle = rng.random_range(0.0..TAU);
        let candidate = start + Vec3::new(angle.cos(), 0.0, angle.sin()) * config.course_length;
        let Some(finish) = locomotion.sample_position(candidate, config.finish_distance) else {
            continue;
        };
        if planar_distance(start, finish) + COURSE_TOLERANCE >= config.course_length
            && locomotion.path_complete(start, finish)
        {
            return Course { start, finish };
        }
    }
    let direction = ground(forward).normalize_or(Vec3::Z);
    debug!(x = start.x, z = start.z, "No random course found, racing straight ahead");
    Course {
        start,
        finish: start + direction * config.course_length,
    }
}

/// Pick rabbit and turtle roles: by species when one pet fits, else at random.
pub fn assign_roles(first: &Participant, second: &Participant, rng: &mut StdRng) -> (PetId, PetId) {
    let first_rabbit = first.species == Species::Rabbit || second.species == Species::Turtle;
    let second_rabbit = second.species == Species::Rabbit || first.species == Species::Turtle;
    match (first_rabbit, second_rabbit) {
        (true, false) => (first.id, second.id),
        (false, true) => (second.id, first.id),
        _ if rng.random_bool(0.5) => (first.id, second.id),
        _ => (second.id, first.id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RacePhase {
    Setup,
    ToStart { elapsed: f32 },
    Tension { remaining: f32 },
    Running,
    Celebrating { remaining: f32 },
    Done,
}

/// Race choreography state.
#[derive(Debug, Clone, PartialEq)]
pub struct Race {
    config: RaceConfig,
    positioning: Positioning,
    rabbit: PetId,
    turtle: PetId,
    course: Option<Course>,
    phase: RacePhase,
    elapsed: f32,
    rabbit_asleep: bool,
    rabbit_finished: bool,
    rabbit_slept_at: Option<f32>,
    rabbit_woke_at: Option<f32>,
    result: Option<RaceResult>,
}

impl Race {
    /// A race whose course is planned from the racers' midpoint.
    pub const fn new(config: RaceConfig, positioning: Positioning, rabbit: PetId, turtle: PetId) -> Self {
        Self {
            config,
            positioning,
            rabbit,
            turtle,
            course: None,
            phase: RacePhase::Setup,
            elapsed: 0.0,
            rabbit_asleep: false,
            rabbit_finished: false,
            rabbit_slept_at: None,
            rabbit_woke_at: None,
            result: None,
        }
    }

    /// A race on a fixed course.
    pub const fn with_course(
        config: RaceConfig,
        positioning: Positioning,
        rabbit: PetId,
        turtle: PetId,
        course: Course,
    ) -> Self {
        let mut race = Self::new(config, positioning, rabbit, turtle);
        race.course = Some(course);
        race
    }

    /// The rabbit.
    pub const fn rabbit(&self) -> PetId {
        self.rabbit
    }

    /// The turtle.
    pub const fn turtle(&self) -> PetId {
        self.turtle
    }

    /// The course, once planned.
    pub const fn course(&self) -> Option<Course> {
        self.course
    }

    /// Whether the rabbit is napping.
    pub const fn rabbit_asleep(&self) -> bool {
        self.rabbit_asleep
    }

    /// The outcome, once decided.
    pub const fn result(&self) -> Option<RaceResult> {
        self.result
    }

    /// Advance the race by one tick.
    pub fn step(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> StageStatus {
        match self.phase {
            RacePhase::Setup => self.setup(ctx),
            RacePhase::ToStart { elapsed } => {
                let Some(course) = self.course else {
                    return StageStatus::Failed;
                };
                let elapsed = elapsed + dt;
                let distance = self.positioning.arrival_distance;
                let in_place = arrived(ctx, self.rabbit, self.lane_start(&course, self.rabbit), distance)
                    && arrived(ctx, self.turtle, self.lane_start(&course, self.turtle), distance);
                if in_place || elapsed >= self.positioning.timeout {
                    self.line_up(&course, ctx);
                    self.phase = RacePhase::Tension {
                        remaining: self.config.tension_duration,
                    };
                } else {
                    self.phase = RacePhase::ToStart { elapsed };
                }
                StageStatus::Running
            }
            RacePhase::Tension { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = RacePhase::Tension { remaining };
                    return StageStatus::Running;
                }
                let Some(course) = self.course else {
                    return StageStatus::Failed;
                };
                self.launch(&course, ctx);
                StageStatus::Running
            }
            RacePhase::Running => {
                let Some(course) = self.course else {
                    return StageStatus::Failed;
                };
                self.elapsed += dt;
                self.run(&course, ctx)
            }
            RacePhase::Celebrating { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = RacePhase::Celebrating { remaining };
                    StageStatus::Running
                } else {
                    self.phase = RacePhase::Done;
                    StageStatus::Finished
                }
            }
            RacePhase::Done => StageStatus::Finished,
        }
    }

    fn setup(&mut self, ctx: &mut BehaviorContext<'_>) -> StageStatus {
        let (Some(rabbit_at), Some(turtle_at)) = (
            ctx.locomotion.position(self.rabbit),
            ctx.locomotion.position(self.turtle),
        ) else {
            return StageStatus::Failed;
        };
        let course = match self.course {
            Some(course) => course,
            None => {
                let forward = ctx.locomotion.forward(self.rabbit).unwrap_or(Vec3::Z);
                let center = (rabbit_at + turtle_at) * 0.5;
                plan_course(&*ctx.locomotion, ctx.rng, center, forward, &self.config)
            }
        };
        self.course = Some(course);
        debug!(
            rabbit = %self.rabbit,
            turtle = %self.turtle,
            length = course.length(),
            "Race course planned"
        );
        for pet in [self.rabbit, self.turtle] {
            let target = self.lane_start(&course, pet);
            ctx.locomotion.resume(pet);
            ctx.locomotion.set_destination(pet, target);
            ctx.presentation.set_animation(pet, AnimationState::Walk);
        }
        self.phase = RacePhase::ToStart { elapsed: 0.0 };
        StageStatus::Running
    }

    fn line_up(&self, course: &Course, ctx: &mut BehaviorContext<'_>) {
        for pet in [self.rabbit, self.turtle] {
            let start = self.lane_start(course, pet);
            if !ctx.locomotion.warp(pet, start) {
                ctx.locomotion.reset_path(pet);
            }
            ctx.locomotion
                .rotate_towards(pet, self.lane_finish(course, pet), 360.0, 1.0);
            ctx.locomotion.stop(pet);
            ctx.locomotion.set_update_rotation(pet, false);
            ctx.presentation.set_animation(pet, AnimationState::Idle);
            ctx.presentation
                .show_emotion(pet, Emotion::Excited, self.config.tension_duration);
        }
    }

    fn launch(&mut self, course: &Course, ctx: &mut BehaviorContext<'_>) {
        for (pet, speed, animation) in [
            (self.rabbit, self.config.rabbit_speed, AnimationState::Run),
            (self.turtle, self.config.turtle_speed, AnimationState::Walk),
        ] {
            ctx.presentation.hide_emotion(pet);
            self.run_to_finish(course, pet, speed, animation, ctx);
        }
        info!(rabbit = %self.rabbit, turtle = %self.turtle, "Race started");
        self.phase = RacePhase::Running;
    }

    fn run(&mut self, course: &Course, ctx: &mut BehaviorContext<'_>) -> StageStatus {
        let (Some(rabbit_at), Some(turtle_at)) = (
            ctx.locomotion.position(self.rabbit),
            ctx.locomotion.position(self.turtle),
        ) else {
            return StageStatus::Failed;
        };
        let rabbit_progress = course.progress(rabbit_at);
        let turtle_progress = course.progress(turtle_at);

        if arrived(
            ctx,
            self.turtle,
            self.lane_finish(course, self.turtle),
            self.config.finish_distance,
        ) {
            self.finish(self.turtle, self.rabbit, false, ctx);
            return StageStatus::Running;
        }
        if self.elapsed >= self.config.timeout {
            let (winner, loser) = if rabbit_progress > turtle_progress {
                (self.rabbit, self.turtle)
            } else {
                (self.turtle, self.rabbit)
            };
            self.finish(winner, loser, true, ctx);
            return StageStatus::Running;
        }

        if self.rabbit_slept_at.is_none() && rabbit_progress >= self.config.sleep_progress {
            ctx.locomotion.stop(self.rabbit);
            ctx.locomotion.reset_path(self.rabbit);
            ctx.locomotion.set_update_rotation(self.rabbit, false);
            ctx.presentation.set_animation(self.rabbit, AnimationState::Sleep);
            self.rabbit_asleep = true;
            self.rabbit_slept_at = Some(rabbit_progress);
            debug!(rabbit = %self.rabbit, progress = rabbit_progress, "Rabbit fell asleep mid-race");
        } else if self.rabbit_asleep && turtle_progress >= self.config.wake_progress {
            self.rabbit_asleep = false;
            self.rabbit_woke_at = Some(turtle_progress);
            let speed = self.config.rabbit_speed * self.config.wake_multiplier;
            self.run_to_finish(course, self.rabbit, speed, AnimationState::Run, ctx);
            debug!(rabbit = %self.rabbit, turtle_progress, "Rabbit woke up");
        } else if !self.rabbit_asleep
            && !self.rabbit_finished
            && arrived(
                ctx,
                self.rabbit,
                self.lane_finish(course, self.rabbit),
                self.config.finish_distance,
            )
        {
            self.rabbit_finished = true;
            ctx.locomotion.stop(self.rabbit);
            ctx.presentation.set_animation(self.rabbit, AnimationState::Idle);
        }
        StageStatus::Running
    }

    fn run_to_finish(
        &self,
        course: &Course,
        pet: PetId,
        speed: f32,
        animation: AnimationState,
        ctx: &mut BehaviorContext<'_>,
    ) {
        ctx.locomotion.set_update_rotation(pet, true);
        ctx.locomotion.resume(pet);
        set_speed(&mut *ctx.locomotion, pet, speed);
        ctx.locomotion.set_destination(pet, self.lane_finish(course, pet));
        ctx.presentation.set_animation(pet, animation);
    }

    fn finish(&mut self, winner: PetId, loser: PetId, timed_out: bool, ctx: &mut BehaviorContext<'_>) {
        for pet in [winner, loser] {
            ctx.locomotion.stop(pet);
            ctx.locomotion.reset_path(pet);
        }
        ctx.presentation.set_animation(winner, AnimationState::Victory);
        let loser_finished = loser == self.rabbit && self.rabbit_finished;
        if !loser_finished {
            ctx.presentation.set_animation(loser, AnimationState::Disappointed);
        }
        let result = RaceResult {
            winner,
            loser,
            timed_out,
            rabbit_slept_at: self.rabbit_slept_at,
            rabbit_woke_at: self.rabbit_woke_at,
            elapsed: self.elapsed,
        };
        info!(%winner, %loser, timed_out, elapsed = self.elapsed, "Race finished");
        self.result = Some(result);
        self.rabbit_asleep = false;
        let remaining = ctx
            .presentation
            .animation_length(winner, AnimationState::Victory)
            .max(ctx.presentation.animation_length(loser, AnimationState::Disappointed));
        self.phase = RacePhase::Celebrating { remaining };
    }

    fn lane_offset(&self, course: &Course, pet: PetId) -> Vec3 {
        let half = self.config.start_spacing * 0.5;
        if pet == self.rabbit {
            course.lateral() * half
        } else {
            -course.lateral() * half
        }
    }

    fn lane_start(&self, course: &Course, pet: PetId) -> Vec3 {
        course.start + self.lane_offset(course, pet)
    }

    fn lane_finish(&self, course: &Course, pet: PetId) -> Vec3 {
        course.finish + self.lane_offset(course, pet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_types::LocomotionParams;
    use rand::SeedableRng;

    use super::*;
    use crate::test_support::Stage;

    const DT: f32 = 0.1;

    fn positioning() -> Positioning {
        Positioning {
            timeout: 15.0,
            arrival_distance: 1.0,
        }
    }

    fn straight_course() -> Course {
        Course {
            start: Vec3::ZERO,
            finish: Vec3::new(0.0, 0.0, 80.0),
        }
    }

    fn run(race: &mut Race, stage: &mut Stage) -> StageStatus {
        for _ in 0..4000 {
            let status = race.step(&mut stage.ctx(), DT);
            stage.mesh.advance(DT);
            if status != StageStatus::Running {
                return status;
            }
        }
        StageStatus::Running
    }

    #[test]
    fn turtle_wins_after_rabbit_naps() {
        let mut stage = Stage::new(17);
        let rabbit = PetId::new();
        let turtle = PetId::new();
        stage.mesh.register(rabbit, Vec3::new(-5.0, 0.0, 0.0), LocomotionParams::default());
        stage.mesh.register(turtle, Vec3::new(5.0, 0.0, 0.0), LocomotionParams::default());
        let config = RaceConfig::default();
        let mut race = Race::with_course(config.clone(), positioning(), rabbit, turtle, straight_course());

        assert_eq!(run(&mut race, &mut stage), StageStatus::Finished);

        let result = race.result().unwrap();
        assert_eq!(result.winner, turtle);
        assert_eq!(result.loser, rabbit);
        assert!(!result.timed_out);
        let slept_at = result.rabbit_slept_at.unwrap();
        assert!(slept_at >= config.sleep_progress);
        assert!(slept_at < config.sleep_progress + 0.05);
        assert!(result.rabbit_woke_at.unwrap() >= config.wake_progress);
        assert!(stage.presentation.played(turtle, AnimationState::Victory));
        assert!(stage.presentation.played(rabbit, AnimationState::Disappointed));
        assert!(stage.presentation.played(rabbit, AnimationState::Sleep));
    }

    #[test]
    fn timeout_awards_greater_progress() {
        let mut stage = Stage::new(17);
        let rabbit = PetId::new();
        let turtle = PetId::new();
        stage.mesh.register(rabbit, Vec3::new(-1.0, 0.0, 0.0), LocomotionParams::default());
        stage.mesh.register(turtle, Vec3::new(1.0, 0.0, 0.0), LocomotionParams::default());
        let config = RaceConfig {
            timeout: 10.0,
            ..RaceConfig::default()
        };
        let mut race = Race::with_course(config, positioning(), rabbit, turtle, straight_course());

        assert_eq!(run(&mut race, &mut stage), StageStatus::Finished);

        let result = race.result().unwrap();
        assert!(result.timed_out);
        assert_eq!(result.winner, rabbit);
        assert!(result.rabbit_woke_at.is_none());
    }

    #[test]
    fn planned_course_is_long_enough() {
        let stage = Stage::new(3);
        let mut rng = StdRng::seed_from_u64(3);
        let config = RaceConfig::default();

        let course = plan_course(&stage.mesh, &mut rng, Vec3::ZERO, Vec3::Z, &config);

        assert!(course.length() + COURSE_TOLERANCE >= config.course_length);
        assert!(stage.mesh.path_complete(course.start, course.finish));
    }

    #[test]
    fn roles_follow_species() {
        let mut rng = StdRng::seed_from_u64(1);
        let turtle = Participant {
            id: PetId::new(),
            species: Species::Turtle,
            base: LocomotionParams::default(),
        };
        let rabbit = Participant {
            id: PetId::new(),
            species: Species::Rabbit,
            base: LocomotionParams::default(),
        };
        assert_eq!(assign_roles(&turtle, &rabbit, &mut rng), (rabbit.id, turtle.id));
        assert_eq!(assign_roles(&rabbit, &turtle, &mut rng), (rabbit.id, turtle.id));
    }

    #[test]
    fn progress_is_unclamped() {
        let course = straight_course();
        assert!((course.progress(Vec3::new(3.0, 0.0, 40.0)) - 0.5).abs() < 1e-6);
        assert!(course.progress(Vec3::new(0.0, 0.0, 88.0)) > 1.0);
        assert!(course.progress(Vec3::new(0.0, 0.0, -8.0)) < 0.0);
    }
}
