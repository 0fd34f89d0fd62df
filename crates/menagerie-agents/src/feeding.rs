//! Feeding seeker.
//!
//! A hungry pet queries nearby food items and feeding areas, keeps the ones
//! its diet accepts, and walks to the nearest. While walking it re-polls the
//! target every `repoll_interval` seconds and only re-paths when the target
//! actually moved. Every `validation_interval` seconds targets farther than
//! half the detection radius are dropped.
//!
//! On arrival the pet faces the food, plays the eat animation, and resets
//! hunger to 0. Food items are consumed; feeding areas persist. Several pets
//! may chase the same item: whoever finishes eating first removes it and
//! everybody else notices the stale reference on the next lookup and gives up
//! quietly.

use glam::Vec3;
use menagerie_types::{AnimationState, AreaId, Emotion, FoodItemId, PetId};
use menagerie_world::{
    Category, EntityRef, PathStatus, SpatialHit, SpatialQuery, World, nearest_hit,
    planar_distance,
};
use tracing::debug;

use crate::activity::TaskStatus;
use crate::config::FeedingConfig;
use crate::context::{AgentEvent, BehaviorContext};
use crate::needs::{NeedKind, Recovery};
use crate::pet::Pet;

/// What a pet is heading to eat from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTarget {
    /// A consumable food item.
    Item(FoodItemId),
    /// A persistent feeding area.
    Area(AreaId),
}

impl FeedTarget {
    /// Live position of the target, or `None` once it is gone.
    pub fn position(self, world: &World) -> Option<Vec3> {
        match self {
            Self::Item(id) => world.resources.food(id).map(|item| item.position),
            Self::Area(id) => world.resources.feeding_area(id).map(|area| area.position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FeedingPhase {
    Seeking {
        last_target: Vec3,
        repoll: f32,
        validation: f32,
    },
    Facing {
        elapsed: f32,
    },
    Eating {
        remaining: f32,
    },
}

/// A pet's current meal.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedingTask {
    target: FeedTarget,
    phase: FeedingPhase,
}

impl FeedingTask {
    /// What the pet is heading to.
    pub const fn target(&self) -> FeedTarget {
        self.target
    }

    /// Whether the eat animation is playing.
    pub const fn is_eating(&self) -> bool {
        matches!(self.phase, FeedingPhase::Eating { .. })
    }
}

/// Finds food and drives pets through eating.
#[derive(Debug, Clone)]
pub struct FeedingSeeker {
    config: FeedingConfig,
}

impl FeedingSeeker {
    /// Create a feeding seeker.
    pub const fn new(config: FeedingConfig) -> Self {
        Self { config }
    }

    /// Whether `pet` is hungry enough to look for food.
    pub fn wants(&self, pet: &Pet) -> bool {
        pet.needs.hunger() >= self.config.hunger_threshold
    }

    /// Look for food and start walking to the nearest acceptable target.
    pub fn try_start(&self, pet: &mut Pet, ctx: &mut BehaviorContext<'_>) -> Option<FeedingTask> {
        if !self.wants(pet) || pet.cooldowns.feeding_search > 0.0 {
            return None;
        }
        pet.cooldowns.feeding_search = self.config.search_interval;

        let origin = ctx.locomotion.position(pet.id)?;
        let world: &World = ctx.world;
        let hits: Vec<SpatialHit> = world
            .overlap_sphere(
                origin,
                self.config.detection_radius,
                Category::FOOD | Category::FEEDING_AREA,
            )
            .into_iter()
            .filter(|hit| accepts(world, pet, hit.entity))
            .collect();
        let hit = nearest_hit(origin, &hits)?;
        let target = match hit.entity {
            EntityRef::Food(id) => FeedTarget::Item(id),
            EntityRef::FeedingArea(id) => FeedTarget::Area(id),
            EntityRef::SleepingArea(_) | EntityRef::Tree(_) | EntityRef::Water(_) => return None,
        };

        ctx.locomotion.resume(pet.id);
        if !ctx.locomotion.set_destination(pet.id, hit.position) {
            debug!(pet = %pet.id, ?target, "Food unreachable");
            return None;
        }
        ctx.presentation.set_animation(pet.id, AnimationState::Walk);
        debug!(pet = %pet.id, ?target, hunger = pet.needs.hunger(), "Seeking food");
        Some(FeedingTask {
            target,
            phase: FeedingPhase::Seeking {
                last_target: hit.position,
                repoll: 0.0,
                validation: 0.0,
            },
        })
    }

    /// Advance a meal by one tick.
    pub fn step(
        &self,
        pet: &mut Pet,
        task: &mut FeedingTask,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> TaskStatus {
        let Some(target_position) = task.target.position(ctx.world) else {
            debug!(pet = %pet.id, target = ?task.target, "Food vanished");
            self.cancel(pet.id, ctx);
            return TaskStatus::Done;
        };
        let Some(position) = ctx.locomotion.position(pet.id) else {
            return TaskStatus::Done;
        };

        match task.phase {
            FeedingPhase::Seeking {
                last_target,
                repoll,
                validation,
            } => self.seek(
                pet.id,
                task,
                ctx,
                position,
                target_position,
                (last_target, repoll + dt, validation + dt),
            ),
            FeedingPhase::Facing { elapsed } => {
                let elapsed = elapsed + dt;
                let left = ctx.locomotion.rotate_towards(
                    pet.id,
                    target_position,
                    self.config.face_speed,
                    dt,
                );
                if left < 1.0 || elapsed >= self.config.face_timeout {
                    ctx.presentation.set_animation(pet.id, AnimationState::Eat);
                    task.phase = FeedingPhase::Eating {
                        remaining: self.config.eat_duration,
                    };
                } else {
                    task.phase = FeedingPhase::Facing { elapsed };
                }
                TaskStatus::Running
            }
            FeedingPhase::Eating { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    task.phase = FeedingPhase::Eating { remaining };
                    return TaskStatus::Running;
                }
                self.finish(pet, task.target, ctx);
                TaskStatus::Done
            }
        }
    }

    /// Abandon a meal: drop the path and resume locomotion.
    pub fn cancel(&self, pet: PetId, ctx: &mut BehaviorContext<'_>) {
        ctx.locomotion.reset_path(pet);
        ctx.locomotion.resume(pet);
        ctx.presentation.set_animation(pet, AnimationState::Idle);
    }

    fn seek(
        &self,
        pet: PetId,
        task: &mut FeedingTask,
        ctx: &mut BehaviorContext<'_>,
        position: Vec3,
        target_position: Vec3,
        (mut last_target, mut repoll, mut validation): (Vec3, f32, f32),
    ) -> TaskStatus {
        let distance = planar_distance(position, target_position);

        if validation >= self.config.validation_interval {
            validation = 0.0;
            // Food still in the outer half of the detection radius is let go,
            // even if it was first seen out there. A later search may pick it
            // up again from closer in.
            if distance > self.config.detection_radius * 0.5 {
                debug!(%pet, target = ?task.target, distance, "Dropped stale food target");
                self.cancel(pet, ctx);
                return TaskStatus::Done;
            }
        }

        if repoll >= self.config.repoll_interval {
            repoll = 0.0;
            if target_position.distance(last_target) > self.config.replan_epsilon {
                last_target = target_position;
                if !ctx.locomotion.set_destination(pet, target_position) {
                    debug!(%pet, target = ?task.target, "Moved food unreachable");
                    self.cancel(pet, ctx);
                    return TaskStatus::Done;
                }
            }
        }

        if ctx.locomotion.path_status(pet) == PathStatus::Unreachable {
            self.cancel(pet, ctx);
            return TaskStatus::Done;
        }

        let arrival = match task.target {
            FeedTarget::Item(_) => self.config.eating_distance,
            FeedTarget::Area(_) => self.config.feeding_area_distance,
        };
        if distance <= arrival && !ctx.locomotion.is_path_pending(pet) {
            ctx.locomotion.stop(pet);
            ctx.locomotion.reset_path(pet);
            ctx.presentation.set_animation(pet, AnimationState::Idle);
            task.phase = FeedingPhase::Facing { elapsed: 0.0 };
        } else {
            task.phase = FeedingPhase::Seeking {
                last_target,
                repoll,
                validation,
            };
        }
        TaskStatus::Running
    }

    fn finish(&self, pet: &mut Pet, target: FeedTarget, ctx: &mut BehaviorContext<'_>) {
        let eaten = match target {
            FeedTarget::Item(id) => ctx.world.resources.consume_food(id).is_ok(),
            FeedTarget::Area(_) => true,
        };
        if eaten {
            pet.needs.satisfy(NeedKind::Hunger, Recovery::Full);
            ctx.presentation
                .show_emotion(pet.id, Emotion::Happy, self.config.happy_duration);
            ctx.events.push(AgentEvent::Ate {
                pet: pet.id,
                target,
            });
            debug!(pet = %pet.id, ?target, "Finished eating");
        } else {
            debug!(pet = %pet.id, ?target, "Someone else finished the food first");
        }
        ctx.locomotion.resume(pet.id);
        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
    }
}

fn accepts(world: &World, pet: &Pet, entity: EntityRef) -> bool {
    match entity {
        EntityRef::Food(id) => world
            .resources
            .food(id)
            .is_some_and(|item| pet.profile.diet.accepts(item.food)),
        EntityRef::FeedingArea(id) => world
            .resources
            .feeding_area(id)
            .is_some_and(|area| pet.profile.diet.matches(area.serves)),
        EntityRef::SleepingArea(_) | EntityRef::Tree(_) | EntityRef::Water(_) => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_types::{DietFlags, FoodType, Habitat, Personality, Species};
    use menagerie_world::Locomotion;

    use super::*;
    use crate::test_support::{Harness, pet};

    const DT: f32 = 0.1;

    fn run(seeker: &FeedingSeeker, eater: &mut Pet, task: &mut FeedingTask, harness: &mut Harness) {
        for _ in 0..600 {
            let status = seeker.step(eater, task, &mut harness.ctx(), DT);
            harness.mesh.advance(DT);
            if status == TaskStatus::Done {
                return;
            }
        }
    }

    #[test]
    fn hungry_pet_eats_matching_item() {
        let mut harness = Harness::new(11);
        let item = harness
            .world
            .resources
            .add_food(Vec3::new(10.0, 0.0, 0.0), FoodType::FruitsAndVegetables);
        harness
            .world
            .resources
            .add_food(Vec3::new(2.0, 0.0, 0.0), FoodType::Meat);
        let mut rabbit = pet(Species::Rabbit, Personality::Shy, Habitat::Field);
        rabbit.profile.diet = DietFlags::FRUITS_AND_VEGETABLES;
        rabbit.needs.set(NeedKind::Hunger, 80.0);
        harness.spawn(&rabbit, Vec3::ZERO);
        let seeker = FeedingSeeker::new(FeedingConfig::default());

        let mut task = seeker.try_start(&mut rabbit, &mut harness.ctx()).unwrap();
        assert_eq!(task.target(), FeedTarget::Item(item));

        run(&seeker, &mut rabbit, &mut task, &mut harness);

        assert!(rabbit.needs.hunger().abs() < f32::EPSILON);
        assert!(harness.world.resources.food(item).is_none());
        assert!(harness.presentation.played(rabbit.id, AnimationState::Eat));
        assert!(harness.presentation.showed(rabbit.id, Emotion::Happy));
    }

    #[test]
    fn feeding_area_persists_after_meal() {
        let mut harness = Harness::new(11);
        let area = harness
            .world
            .resources
            .add_feeding_area(Vec3::new(5.0, 0.0, 0.0), DietFlags::GRASS);
        let mut horse = pet(Species::Horse, Personality::Brave, Habitat::Fence);
        horse.profile.diet = DietFlags::GRASS | DietFlags::FRUITS_AND_VEGETABLES;
        horse.needs.set(NeedKind::Hunger, 65.0);
        harness.spawn(&horse, Vec3::ZERO);
        let seeker = FeedingSeeker::new(FeedingConfig::default());

        let mut task = seeker.try_start(&mut horse, &mut harness.ctx()).unwrap();
        run(&seeker, &mut horse, &mut task, &mut harness);

        assert!(horse.needs.hunger().abs() < f32::EPSILON);
        assert!(harness.world.resources.feeding_area(area).is_some());
    }

    #[test]
    fn stale_item_ends_meal_without_eating() {
        let mut harness = Harness::new(11);
        let item = harness
            .world
            .resources
            .add_food(Vec3::new(6.0, 0.0, 0.0), FoodType::Meat);
        let mut wolf = pet(Species::Wolf, Personality::Brave, Habitat::Forest);
        wolf.needs.set(NeedKind::Hunger, 75.0);
        harness.spawn(&wolf, Vec3::ZERO);
        let seeker = FeedingSeeker::new(FeedingConfig::default());
        let mut task = seeker.try_start(&mut wolf, &mut harness.ctx()).unwrap();

        harness.world.resources.consume_food(item).unwrap();
        let status = seeker.step(&mut wolf, &mut task, &mut harness.ctx(), DT);

        assert_eq!(status, TaskStatus::Done);
        assert!((wolf.needs.hunger() - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn far_food_is_dropped_at_first_validation() {
        let mut harness = Harness::new(11);
        let item = harness
            .world
            .resources
            .add_food(Vec3::new(22.0, 0.0, 0.0), FoodType::Meat);
        let mut wolf = pet(Species::Wolf, Personality::Brave, Habitat::Forest);
        wolf.needs.set(NeedKind::Hunger, 75.0);
        harness.spawn(&wolf, Vec3::ZERO);
        let seeker = FeedingSeeker::new(FeedingConfig::default());
        let mut task = seeker.try_start(&mut wolf, &mut harness.ctx()).unwrap();
        assert_eq!(task.target(), FeedTarget::Item(item));

        let mut steps = 0;
        while seeker.step(&mut wolf, &mut task, &mut harness.ctx(), DT) == TaskStatus::Running {
            harness.mesh.advance(DT);
            steps += 1;
            assert!(steps < 25, "meal outlived its first validation");
        }

        assert!(steps >= 19);
        assert!(harness.world.resources.food(item).is_some());
        assert!(harness.mesh.destination(wolf.id).is_none());
        assert!((wolf.needs.hunger() - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn nothing_edible_means_no_task() {
        let mut harness = Harness::new(11);
        harness
            .world
            .resources
            .add_food(Vec3::new(3.0, 0.0, 0.0), FoodType::Fish);
        let mut horse = pet(Species::Horse, Personality::Brave, Habitat::Fence);
        horse.profile.diet = DietFlags::GRASS;
        horse.needs.set(NeedKind::Hunger, 90.0);
        harness.spawn(&horse, Vec3::ZERO);
        let seeker = FeedingSeeker::new(FeedingConfig::default());

        assert!(seeker.try_start(&mut horse, &mut harness.ctx()).is_none());
        // The search is on cooldown even when nothing was found.
        assert!(horse.cooldowns.feeding_search > 0.0);
    }
}
