//! Water adjustment.
//!
//! Land pets that end up standing in a water zone walk to the nearest shore
//! point. Water-habitat pets idling on land occasionally head back into the
//! nearest zone and swim for a while.

use glam::Vec3;
use menagerie_types::{AnimationState, AreaId, Habitat, PetId};
use menagerie_world::{Category, EntityRef, PathStatus, SpatialQuery, nearest_hit, planar_distance};
use tracing::debug;

use crate::activity::TaskStatus;
use crate::config::WaterConfig;
use crate::context::{AgentEvent, BehaviorContext, random_between, roll};
use crate::pet::Pet;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WaterPhase {
    ToShore { elapsed: f32 },
    ToWater { elapsed: f32 },
    Swimming { remaining: f32 },
}

/// A trip out of or into water.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterTask {
    zone: AreaId,
    target: Vec3,
    phase: WaterPhase,
}

impl WaterTask {
    /// The water zone involved.
    pub const fn zone(&self) -> AreaId {
        self.zone
    }

    /// Whether the pet is swimming.
    pub const fn is_swimming(&self) -> bool {
        matches!(self.phase, WaterPhase::Swimming { .. })
    }
}

/// Keeps land pets out of water and water pets in it.
#[derive(Debug, Clone)]
pub struct WaterSeeker {
    config: WaterConfig,
}

impl WaterSeeker {
    /// Create a water seeker.
    pub const fn new(config: WaterConfig) -> Self {
        Self { config }
    }

    /// Start a shore or water trip if one is needed.
    pub fn try_start(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> Option<WaterTask> {
        let position = ctx.locomotion.position(pet.id)?;
        let standing_in = ctx.world.resources.water_at(position).copied();

        if pet.profile.habitat != Habitat::Water {
            let zone = standing_in?;
            let shore = zone.shore_point(position, self.config.shore_margin);
            let target = ctx
                .locomotion
                .sample_position(shore, self.config.shore_margin * 2.0)?;
            return self
                .launch(pet.id, zone.id, target, ctx, WaterPhase::ToShore { elapsed: 0.0 });
        }

        if standing_in.is_some() || pet.cooldowns.water_check > 0.0 {
            return None;
        }
        pet.cooldowns.water_check = self.config.check_interval;
        if !roll(ctx.rng, self.config.return_chance) {
            return None;
        }
        let hits = ctx
            .world
            .overlap_sphere(position, self.config.detection_radius, Category::WATER);
        let hit = nearest_hit(position, &hits)?;
        let EntityRef::Water(zone_id) = hit.entity else {
            return None;
        };
        let zone = *ctx.world.resources.water_zone(zone_id)?;
        let target = zone.inner_point(position, self.config.depth_ratio);
        self.launch(pet.id, zone_id, target, ctx, WaterPhase::ToWater { elapsed: 0.0 })
    }

    /// Advance a water trip by one tick.
    pub fn step(
        &self,
        pet: &Pet,
        task: &mut WaterTask,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> TaskStatus {
        match task.phase {
            WaterPhase::ToShore { elapsed } | WaterPhase::ToWater { elapsed } => {
                let elapsed = elapsed + dt;
                let Some(position) = ctx.locomotion.position(pet.id) else {
                    return TaskStatus::Done;
                };
                if ctx.locomotion.path_status(pet.id) == PathStatus::Unreachable
                    || elapsed > self.config.timeout
                {
                    debug!(pet = %pet.id, zone = %task.zone, "Water trip abandoned");
                    self.cancel(pet.id, ctx);
                    return TaskStatus::Done;
                }
                let arrived = planar_distance(position, task.target) <= self.config.arrival_distance
                    && !ctx.locomotion.is_path_pending(pet.id);
                match (task.phase, arrived) {
                    (_, false) => {
                        task.phase = match task.phase {
                            WaterPhase::ToShore { .. } => WaterPhase::ToShore { elapsed },
                            _ => WaterPhase::ToWater { elapsed },
                        };
                        TaskStatus::Running
                    }
                    (WaterPhase::ToShore { .. }, true) => {
                        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
                        ctx.events.push(AgentEvent::ReachedShore { pet: pet.id });
                        debug!(pet = %pet.id, zone = %task.zone, "Reached shore");
                        TaskStatus::Done
                    }
                    (_, true) => {
                        ctx.locomotion.stop(pet.id);
                        ctx.presentation.set_animation(pet.id, AnimationState::Swim);
                        ctx.events.push(AgentEvent::Swam { pet: pet.id });
                        task.phase = WaterPhase::Swimming {
                            remaining: random_between(
                                ctx.rng,
                                self.config.swim_min,
                                self.config.swim_max,
                            ),
                        };
                        TaskStatus::Running
                    }
                }
            }
            WaterPhase::Swimming { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    task.phase = WaterPhase::Swimming { remaining };
                    return TaskStatus::Running;
                }
                self.cancel(pet.id, ctx);
                TaskStatus::Done
            }
        }
    }

    /// Abandon the trip and hand locomotion back.
    pub fn cancel(&self, pet: PetId, ctx: &mut BehaviorContext<'_>) {
        ctx.locomotion.reset_path(pet);
        ctx.locomotion.resume(pet);
        ctx.presentation.set_animation(pet, AnimationState::Idle);
    }

    fn launch(
        &self,
        pet: PetId,
        zone: AreaId,
        target: Vec3,
        ctx: &mut BehaviorContext<'_>,
        phase: WaterPhase,
    ) -> Option<WaterTask> {
        ctx.locomotion.resume(pet);
        if !ctx.locomotion.set_destination(pet, target) {
            debug!(%pet, %zone, "Water target unreachable");
            return None;
        }
        ctx.presentation.set_animation(pet, AnimationState::Walk);
        debug!(%pet, %zone, ?phase, "Water trip");
        Some(WaterTask {
            zone,
            target,
            phase,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_types::{Personality, Species};
    use menagerie_world::Locomotion;

    use super::*;
    use crate::test_support::{Harness, pet};

    const DT: f32 = 0.25;

    fn run(seeker: &WaterSeeker, swimmer: &Pet, task: &mut WaterTask, harness: &mut Harness) {
        for _ in 0..400 {
            let status = seeker.step(swimmer, task, &mut harness.ctx(), DT);
            harness.mesh.advance(DT);
            if status == TaskStatus::Done {
                return;
            }
        }
    }

    #[test]
    fn land_pet_leaves_water() {
        let mut harness = Harness::new(9);
        let zone = harness.world.resources.add_water_zone(Vec3::ZERO, 5.0);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::new(2.0, 0.0, 0.0));
        let seeker = WaterSeeker::new(WaterConfig::default());

        let mut task = seeker.try_start(&mut dog, &mut harness.ctx()).unwrap();
        assert_eq!(task.zone(), zone);
        run(&seeker, &dog, &mut task, &mut harness);

        let position = harness.mesh.position(dog.id).unwrap();
        assert!(harness.world.resources.water_at(position).is_none());
        assert!(harness.events.contains(&AgentEvent::ReachedShore { pet: dog.id }));
    }

    #[test]
    fn land_pet_on_land_needs_nothing() {
        let mut harness = Harness::new(9);
        harness.world.resources.add_water_zone(Vec3::ZERO, 5.0);
        let mut dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
        harness.spawn(&dog, Vec3::new(20.0, 0.0, 0.0));
        let seeker = WaterSeeker::new(WaterConfig::default());

        assert!(seeker.try_start(&mut dog, &mut harness.ctx()).is_none());
    }

    #[test]
    fn water_pet_returns_and_swims() {
        let mut harness = Harness::new(9);
        harness
            .world
            .resources
            .add_water_zone(Vec3::new(15.0, 0.0, 0.0), 4.0);
        let mut duck = pet(Species::Duck, Personality::Playful, Habitat::Water);
        harness.spawn(&duck, Vec3::ZERO);
        let seeker = WaterSeeker::new(WaterConfig {
            return_chance: 1.0,
            ..WaterConfig::default()
        });

        let mut task = seeker.try_start(&mut duck, &mut harness.ctx()).unwrap();
        run(&seeker, &duck, &mut task, &mut harness);

        assert!(harness.presentation.played(duck.id, AnimationState::Swim));
        let position = harness.mesh.position(duck.id).unwrap();
        assert!(harness.world.resources.water_at(position).is_some());
    }
}
