//! Gathering coordinator.
//!
//! A gather command sends every controllable pet to a slot around a target
//! point. Slots come from a jittered square grid; pets are matched to slots
//! by a greedy global nearest-pair pass, which is deterministic for a given
//! input order (the first pair found wins a tie).
//!
//! Slots that cannot be snapped onto the navigation surface are dropped, and
//! the pets left without one are placed on a ring around the first assigned
//! slot instead.
//!
//! Each assigned pet runs a fast rally to its slot under a [`Monitor`]. The
//! monitor remembers the gather command version it was created for and
//! stops, without touching the pet, as soon as the pet's live version moves
//! on. On arrival the pet's base locomotion is restored, it turns to face
//! the camera, and it is handed back to idle with `gathered` set so that it
//! stays put.

use std::collections::BTreeMap;
use std::f32::consts::{SQRT_2, TAU};

use glam::Vec3;
use menagerie_agents::{Activity, Arbiter, BehaviorContext, Pet, random_between};
use menagerie_types::{AnimationState, PetId};
use menagerie_world::{PathStatus, planar_distance};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::config::GatheringConfig;

/// Candidate directions tried when placing a leftover pet.
const LEFTOVER_RING: usize = 8;

/// Build `count` slots on a jittered square grid of `ceil(sqrt(count))` points a side,
/// centered on `target` and fitting inside `radius`.
pub fn generate_slots(
    target: Vec3,
    count: usize,
    radius: f32,
    jitter_ratio: f32,
    rng: &mut StdRng,
) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let mut side = 1_usize;
    while side * side < count {
        side += 1;
    }
    let spacing = if side > 1 {
        radius * SQRT_2 / (side - 1) as f32
    } else {
        0.0
    };
    let jitter = spacing * jitter_ratio;
    let half = (side - 1) as f32 * spacing * 0.5;
    let mut slots = Vec::with_capacity(side * side);
    for row in 0..side {
        for column in 0..side {
            let offset = Vec3::new(
                column as f32 * spacing - half + random_between(rng, -jitter, jitter),
                0.0,
                row as f32 * spacing - half + random_between(rng, -jitter, jitter),
            );
            slots.push(target + offset);
        }
    }
    slots.truncate(count);
    slots
}

/// Greedy global nearest-pair assignment.
///
/// Repeatedly takes the closest remaining (pet, slot) pair over all
/// remaining pets and slots until either pool is empty. Returns the
/// assignments in the order they were made; unmatched pets are left out.
pub fn assign_greedy(pets: &[(PetId, Vec3)], slots: &[Vec3]) -> Vec<(PetId, Vec3)> {
    let mut open_pets: Vec<(PetId, Vec3)> = pets.to_vec();
    let mut open_slots: Vec<Vec3> = slots.to_vec();
    let mut assignments = Vec::with_capacity(pets.len().min(slots.len()));
    while !open_pets.is_empty() && !open_slots.is_empty() {
        let mut best: Option<(usize, usize, f32)> = None;
        for (pet_index, (_, position)) in open_pets.iter().enumerate() {
            for (slot_index, slot) in open_slots.iter().enumerate() {
                let distance = position.distance_squared(*slot);
                if best.is_none_or(|(_, _, closest)| distance < closest) {
                    best = Some((pet_index, slot_index, distance));
                }
            }
        }
        let Some((pet_index, slot_index, _)) = best else {
            break;
        };
        let (pet, _) = open_pets.remove(pet_index);
        let slot = open_slots.remove(slot_index);
        assignments.push((pet, slot));
    }
    assignments
}

/// A spot near `anchor` at least `spacing` away from every occupied slot.
///
/// Tries eight ring positions around the anchor; falls back to a fixed
/// offset when none is clear.
pub fn leftover_position(anchor: Vec3, occupied: &[Vec3], spacing: f32) -> Vec3 {
    (0..LEFTOVER_RING)
        .map(|step| {
            let angle = TAU * step as f32 / LEFTOVER_RING as f32;
            anchor + Vec3::new(angle.cos(), 0.0, angle.sin()) * spacing
        })
        .find(|candidate| {
            occupied
                .iter()
                .all(|slot| planar_distance(*slot, *candidate) >= spacing)
        })
        .unwrap_or_else(|| anchor + Vec3::new(spacing, 0.0, spacing))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MonitorPhase {
    Moving,
    Facing { elapsed: f32 },
}

/// Arrival supervision for one gathering pet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monitor {
    pet: PetId,
    version: u64,
    destination: Vec3,
    phase: MonitorPhase,
    elapsed: f32,
    slow_for: f32,
    rerouted: bool,
}

impl Monitor {
    /// The supervised pet.
    pub const fn pet(&self) -> PetId {
        self.pet
    }

    /// Gather command version the monitor was created for.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Where the pet is headed.
    pub const fn destination(&self) -> Vec3 {
        self.destination
    }

    /// Whether the pet is still on its way.
    pub const fn is_moving(&self) -> bool {
        matches!(self.phase, MonitorPhase::Moving)
    }

    /// Whether the single stuck reroute has been used.
    pub const fn rerouted(&self) -> bool {
        self.rerouted
    }
}

/// Outcome of one gather command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherReport {
    /// Pets sent to a slot.
    pub assigned: usize,
    /// Pets with no valid path that stay and face the camera.
    pub staying: usize,
    /// Pets that could not be claimed or have no navigation agent.
    pub skipped: usize,
}

/// Sends pets to gather and supervises their arrival.
#[derive(Debug, Clone)]
pub struct GatheringCoordinator {
    config: GatheringConfig,
    monitors: BTreeMap<PetId, Monitor>,
    camera: Vec3,
}

impl GatheringCoordinator {
    /// A coordinator with no command in flight.
    pub const fn new(config: GatheringConfig) -> Self {
        Self {
            config,
            monitors: BTreeMap::new(),
            camera: Vec3::ZERO,
        }
    }

    /// Gathering configuration.
    pub const fn config(&self) -> &GatheringConfig {
        &self.config
    }

    /// Monitors still in flight.
    pub fn monitors(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    /// The monitor for `pet`, if one is in flight.
    pub fn monitor(&self, pet: PetId) -> Option<&Monitor> {
        self.monitors.get(&pet)
    }

    /// Gather every controllable pet around `target`, facing `camera`.
    pub fn gather(
        &mut self,
        target: Vec3,
        camera: Vec3,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
    ) -> GatherReport {
        self.camera = camera;
        let mut report = GatherReport::default();
        let mut positions = Vec::new();
        for pet in pets.values_mut().filter(|pet| pet.is_controllable()) {
            let Some(position) = ctx.locomotion.position(pet.id) else {
                debug!(pet = %pet.id, "Pet without an agent left out of gather");
                report.skipped += 1;
                continue;
            };
            pet.gather_command_version = pet.gather_command_version.wrapping_add(1);
            positions.push((pet.id, position));
        }

        let snap_radius = self
            .config
            .resample_radii
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);
        let slots: Vec<Vec3> = generate_slots(
            target,
            positions.len(),
            self.config.radius,
            self.config.jitter_ratio,
            ctx.rng,
        )
        .into_iter()
        .filter(|slot| ctx.locomotion.sample_position(*slot, snap_radius).is_some())
        .collect();
        if slots.len() < positions.len() {
            debug!(
                dropped = positions.len() - slots.len(),
                "Gather slots off the navigation surface"
            );
        }
        let mut plan = assign_greedy(&positions, &slots);
        let occupied: Vec<Vec3> = plan.iter().map(|(_, slot)| *slot).collect();
        let mut taken = occupied.clone();
        for (pet, _) in &positions {
            if plan.iter().any(|(assigned, _)| assigned == pet) {
                continue;
            }
            let anchor = occupied.first().copied().unwrap_or(target);
            let spot = leftover_position(anchor, &taken, self.config.leftover_spacing);
            taken.push(spot);
            plan.push((*pet, spot));
        }

        for (id, slot) in plan {
            let Some(pet) = pets.get_mut(&id) else {
                continue;
            };
            let version = pet.gather_command_version;
            if let Err(err) = arbiter.claim_external(pet, Activity::Gathering { version }, ctx) {
                debug!(pet = %id, %err, "Pet skipped by gather");
                report.skipped += 1;
                continue;
            }
            let monitor = self.dispatch(pet, slot, version, ctx);
            if monitor.is_moving() {
                report.assigned += 1;
            } else {
                report.staying += 1;
            }
            self.monitors.insert(id, monitor);
        }
        info!(
            x = target.x,
            z = target.z,
            assigned = report.assigned,
            staying = report.staying,
            skipped = report.skipped,
            "Gather command issued"
        );
        report
    }

    /// Call off every gather: bump all versions and send gathering pets back
    /// to wandering with their base locomotion. Returns how many pets were
    /// released.
    pub fn cancel(
        &mut self,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
    ) -> usize {
        self.monitors.clear();
        let mut released = 0;
        for pet in pets.values_mut() {
            pet.gather_command_version = pet.gather_command_version.wrapping_add(1);
            if pet.is_gathering() {
                arbiter.release(pet, ctx);
                released += 1;
            } else if pet.gathered && pet.is_idle() {
                ctx.locomotion.set_params(pet.id, pet.base);
                pet.activity = Activity::idle();
                released += 1;
            }
            pet.gathered = false;
        }
        info!(released, "Gather cancelled");
        released
    }

    /// Step every monitor by one tick.
    pub fn update(
        &mut self,
        pets: &mut BTreeMap<PetId, Pet>,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) {
        let monitors = std::mem::take(&mut self.monitors);
        for (id, mut monitor) in monitors {
            let Some(pet) = pets.get_mut(&id) else {
                continue;
            };
            let current = matches!(
                pet.activity,
                Activity::Gathering { version } if version == monitor.version
            );
            if !current || pet.gather_command_version != monitor.version {
                trace!(pet = %id, version = monitor.version, "Superseded gather monitor dropped");
                continue;
            }
            if self.step(&mut monitor, pet, arbiter, ctx, dt) {
                self.monitors.insert(id, monitor);
            }
        }
    }

    fn dispatch(&self, pet: &Pet, slot: Vec3, version: u64, ctx: &mut BehaviorContext<'_>) -> Monitor {
        let mut monitor = Monitor {
            pet: pet.id,
            version,
            destination: slot,
            phase: MonitorPhase::Moving,
            elapsed: 0.0,
            slow_for: 0.0,
            rerouted: false,
        };
        let destination = ctx
            .locomotion
            .position(pet.id)
            .and_then(|from| self.validate(from, slot, ctx));
        let Some(destination) = destination else {
            debug!(pet = %pet.id, "No path to gather slot, staying put");
            ctx.locomotion.reset_path(pet.id);
            monitor.phase = MonitorPhase::Facing { elapsed: 0.0 };
            return monitor;
        };
        ctx.locomotion.set_params(pet.id, pet.base.scaled(&self.config.rally));
        ctx.locomotion.set_update_rotation(pet.id, true);
        ctx.locomotion.resume(pet.id);
        ctx.locomotion.set_destination(pet.id, destination);
        ctx.presentation.set_animation(pet.id, AnimationState::Run);
        monitor.destination = destination;
        debug!(pet = %pet.id, version, x = destination.x, z = destination.z, "Rallying to gather slot");
        monitor
    }

    /// Snap `slot` onto the surface with escalating radii and check the path.
    fn validate(&self, from: Vec3, slot: Vec3, ctx: &BehaviorContext<'_>) -> Option<Vec3> {
        self.config.resample_radii.iter().find_map(|radius| {
            ctx.locomotion
                .sample_position(slot, *radius)
                .filter(|point| ctx.locomotion.path_complete(from, *point))
        })
    }

    /// Advance one monitor. Returns whether it stays in flight.
    fn step(
        &self,
        monitor: &mut Monitor,
        pet: &mut Pet,
        arbiter: &Arbiter,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> bool {
        monitor.elapsed += dt;
        match monitor.phase {
            MonitorPhase::Moving => {
                if self.has_arrived(monitor, ctx) {
                    self.settle(monitor, pet, ctx);
                } else if ctx.locomotion.path_status(pet.id) == PathStatus::Unreachable {
                    debug!(pet = %pet.id, "Gather slot became unreachable");
                    self.settle(monitor, pet, ctx);
                } else {
                    self.watch_stuck(monitor, pet, ctx, dt);
                }
                true
            }
            MonitorPhase::Facing { elapsed } => {
                let elapsed = elapsed + dt;
                let remaining = ctx.locomotion.rotate_towards(
                    pet.id,
                    self.camera,
                    self.config.face_speed,
                    dt,
                );
                if remaining > self.config.face_tolerance && elapsed < self.config.face_timeout {
                    monitor.phase = MonitorPhase::Facing { elapsed };
                    return true;
                }
                arbiter.release(pet, ctx);
                pet.gathered = true;
                debug!(pet = %pet.id, version = monitor.version, "Gathered");
                false
            }
        }
    }

    fn has_arrived(&self, monitor: &Monitor, ctx: &BehaviorContext<'_>) -> bool {
        let pet = monitor.pet;
        if ctx.locomotion.is_path_pending(pet) {
            return false;
        }
        ctx.locomotion.path_status(pet) == PathStatus::Arrived
            || ctx
                .locomotion
                .position(pet)
                .is_some_and(|at| planar_distance(at, monitor.destination) <= self.config.arrival_distance)
    }

    fn settle(&self, monitor: &mut Monitor, pet: &Pet, ctx: &mut BehaviorContext<'_>) {
        ctx.locomotion.reset_path(pet.id);
        ctx.locomotion.set_params(pet.id, pet.base);
        ctx.presentation.set_animation(pet.id, AnimationState::Idle);
        monitor.phase = MonitorPhase::Facing { elapsed: 0.0 };
    }

    fn watch_stuck(&self, monitor: &mut Monitor, pet: &Pet, ctx: &mut BehaviorContext<'_>, dt: f32) {
        if monitor.elapsed < self.config.stuck_grace || ctx.locomotion.is_path_pending(pet.id) {
            return;
        }
        if ctx.locomotion.velocity(pet.id).length() >= self.config.stuck_speed {
            monitor.slow_for = 0.0;
            return;
        }
        monitor.slow_for += dt;
        if monitor.slow_for < self.config.stuck_timeout {
            return;
        }
        monitor.slow_for = 0.0;
        if !monitor.rerouted {
            monitor.rerouted = true;
            let offset = Vec3::new(
                ctx.rng.random_range(-1.0..=1.0),
                0.0,
                ctx.rng.random_range(-1.0..=1.0),
            ) * self.config.reroute_offset;
            let retry = ctx
                .locomotion
                .sample_position(monitor.destination + offset, self.config.reroute_offset * 2.0);
            if let Some(retry) = retry {
                if ctx.locomotion.set_destination(pet.id, retry) {
                    debug!(pet = %pet.id, "Stuck on the way to gather, rerouting");
                    monitor.destination = retry;
                    return;
                }
            }
        }
        debug!(pet = %pet.id, "Stuck on the way to gather, stopping here");
        self.settle(monitor, pet, ctx);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menagerie_agents::{BehaviorConfig, ClimbingConfig};
    use menagerie_types::{Habitat, LocomotionParams, Personality, Species};
    use menagerie_world::Locomotion;
    use rand::SeedableRng;

    use super::*;
    use crate::test_support::{Stage, pet};

    const DT: f32 = 0.1;

    fn still_config() -> GatheringConfig {
        GatheringConfig {
            jitter_ratio: 0.0,
            ..GatheringConfig::default()
        }
    }

    fn run(
        gathering: &mut GatheringCoordinator,
        pets: &mut BTreeMap<PetId, Pet>,
        stage: &mut Stage,
        ticks: usize,
    ) {
        let arbiter = Arbiter::new(BehaviorConfig::default());
        for _ in 0..ticks {
            gathering.update(pets, &arbiter, &mut stage.ctx(), DT);
            stage.mesh.advance(DT);
        }
    }

    fn flock(stage: &mut Stage, positions: &[Vec3]) -> BTreeMap<PetId, Pet> {
        positions
            .iter()
            .map(|position| {
                let dog = pet(Species::Dog, Personality::Playful, Habitat::Field);
                stage.mesh.register(dog.id, *position, dog.base);
                (dog.id, dog)
            })
            .collect()
    }

    #[test]
    fn slots_fit_the_radius() {
        let mut rng = StdRng::seed_from_u64(11);
        let target = Vec3::new(10.0, 0.0, -4.0);

        let slots = generate_slots(target, 7, 6.0, 0.3, &mut rng);

        assert_eq!(slots.len(), 7);
        for slot in &slots {
            assert!(planar_distance(*slot, target) <= 6.0 * 1.5);
        }
        assert!(generate_slots(target, 0, 6.0, 0.3, &mut rng).is_empty());
        let single = generate_slots(target, 1, 6.0, 0.3, &mut rng);
        assert!(planar_distance(single.first().copied().unwrap(), target) < 1e-6);
    }

    #[test]
    fn greedy_takes_the_closest_pair_first() {
        let a = PetId::new();
        let b = PetId::new();
        let pets = [(a, Vec3::new(0.0, 0.0, 0.0)), (b, Vec3::new(10.0, 0.0, 0.0))];
        let slots = [Vec3::new(9.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)];

        let plan = assign_greedy(&pets, &slots);

        assert_eq!(plan, vec![(b, Vec3::new(9.0, 0.0, 0.0)), (a, Vec3::new(4.0, 0.0, 0.0))]);
    }

    #[test]
    fn greedy_is_deterministic_and_breaks_ties_by_order() {
        let a = PetId::new();
        let b = PetId::new();
        let pets = [(a, Vec3::new(-1.0, 0.0, 0.0)), (b, Vec3::new(1.0, 0.0, 0.0))];
        let slots = [Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];

        let first = assign_greedy(&pets, &slots);
        let second = assign_greedy(&pets, &slots);

        assert_eq!(first, second);
        assert_eq!(first.first(), Some(&(a, Vec3::ZERO)));
    }

    #[test]
    fn leftover_keeps_its_distance() {
        let anchor = Vec3::ZERO;
        let occupied = [anchor, Vec3::new(1.5, 0.0, 0.0)];

        let spot = leftover_position(anchor, &occupied, 1.5);

        for slot in occupied {
            assert!(planar_distance(slot, spot) >= 1.5 - 1e-4);
        }
    }

    #[test]
    fn pets_gather_and_face_the_camera() {
        let mut stage = Stage::new(21);
        let mut pets = flock(
            &mut stage,
            &[Vec3::new(-20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 25.0)],
        );
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        let camera = Vec3::new(0.0, 10.0, -30.0);

        let report = gathering.gather(Vec3::ZERO, camera, &mut pets, &arbiter, &mut stage.ctx());
        assert_eq!(report.assigned, 3);
        for id in pets.keys() {
            let params = stage.mesh.params(*id).unwrap();
            assert!((params.speed - LocomotionParams::default().speed * 4.0).abs() < 1e-4);
        }

        for _ in 0..200 {
            gathering.update(&mut pets, &arbiter, &mut stage.ctx(), DT);
            stage.mesh.advance(DT);
        }

        assert_eq!(gathering.monitors().count(), 0);
        for pet in pets.values() {
            assert!(pet.gathered);
            assert!(pet.is_idle());
            assert_eq!(stage.mesh.params(pet.id), Some(pet.base));
            let at = stage.mesh.position(pet.id).unwrap();
            assert!(planar_distance(at, Vec3::ZERO) < 13.0);
        }
    }

    #[test]
    fn superseded_monitor_exits_without_touching_the_pet() {
        let mut stage = Stage::new(8);
        let mut pets = flock(&mut stage, &[Vec3::new(-30.0, 0.0, 0.0)]);
        let id = *pets.keys().next().unwrap();
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());
        gathering.update(&mut pets, &arbiter, &mut stage.ctx(), DT);
        stage.mesh.advance(DT);

        pets.get_mut(&id).unwrap().gather_command_version += 1;
        let params = stage.mesh.params(id);
        let destination = stage.mesh.destination(id);
        gathering.update(&mut pets, &arbiter, &mut stage.ctx(), DT);

        assert!(gathering.monitor(id).is_none());
        assert_eq!(stage.mesh.params(id), params);
        assert_eq!(stage.mesh.destination(id), destination);
    }

    #[test]
    fn cancel_restores_base_and_wandering() {
        let mut stage = Stage::new(9);
        let mut pets = flock(&mut stage, &[Vec3::new(-30.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0)]);
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());
        let before: Vec<u64> = pets.values().map(|pet| pet.gather_command_version).collect();

        let released = gathering.cancel(&mut pets, &arbiter, &mut stage.ctx());

        assert_eq!(released, 2);
        assert_eq!(gathering.monitors().count(), 0);
        for (pet, old) in pets.values().zip(before) {
            assert_eq!(pet.gather_command_version, old + 1);
            assert!(pet.is_idle());
            assert!(!pet.gathered);
            assert_eq!(stage.mesh.params(pet.id), Some(pet.base));
        }
    }

    #[test]
    fn gather_pulls_a_climber_out_of_its_tree() {
        let mut stage = Stage::new(4);
        let tree = stage.world.trees.register(Vec3::new(2.0, 0.0, 0.0), 4.0);
        let cat = pet(Species::Cat, Personality::Curious, Habitat::Field);
        stage.mesh.register(cat.id, Vec3::ZERO, cat.base);
        let id = cat.id;
        let mut pets: BTreeMap<PetId, Pet> = [(id, cat)].into_iter().collect();
        let arbiter = Arbiter::new(BehaviorConfig {
            climbing: ClimbingConfig {
                chance: 1.0,
                ..ClimbingConfig::default()
            },
            ..BehaviorConfig::default()
        });
        arbiter.update(pets.get_mut(&id).unwrap(), &mut stage.ctx(), DT);
        assert!(pets.get(&id).unwrap().is_climbing_tree());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());

        gathering.gather(Vec3::new(-10.0, 0.0, 0.0), Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());

        assert!(pets.get(&id).unwrap().is_gathering());
        assert_eq!(stage.world.trees.occupant(tree), None);
        assert!(stage.mesh.is_enabled(id));
    }
    #[test]
    fn pet_without_a_path_stays_and_faces_the_camera() {
        let mut stage = Stage::new(12);
        let start = Vec3::new(-30.0, 0.0, 0.0);
        stage.mesh.block(Vec3::new(-15.0, 0.0, 0.0), 4.0);
        let mut pets = flock(&mut stage, &[start]);
        let id = *pets.keys().next().unwrap();
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        let camera = Vec3::new(0.0, 10.0, -30.0);

        let report = gathering.gather(Vec3::ZERO, camera, &mut pets, &arbiter, &mut stage.ctx());

        assert_eq!(report.staying, 1);
        assert_eq!(report.assigned, 0);
        assert!(stage.mesh.destination(id).is_none());
        run(&mut gathering, &mut pets, &mut stage, 40);

        let dog = pets.get(&id).unwrap();
        assert!(dog.gathered);
        assert!(dog.is_idle());
        assert!(planar_distance(stage.mesh.position(id).unwrap(), start) < 1e-4);
        let facing = stage.mesh.forward(id).unwrap();
        let wanted = Vec3::new(camera.x - start.x, 0.0, camera.z - start.z).normalize();
        let tolerance = GatheringConfig::default().face_tolerance;
        assert!(facing.angle_between(wanted).to_degrees() <= tolerance + 1e-3);
    }

    #[test]
    fn stalled_pet_reroutes_once_then_settles() {
        let mut stage = Stage::new(13);
        let start = Vec3::new(-40.0, 0.0, 0.0);
        let mut pets = flock(&mut stage, &[start]);
        let id = *pets.keys().next().unwrap();
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());
        let crawl = LocomotionParams {
            speed: 0.05,
            ..pets.get(&id).unwrap().base
        };
        stage.mesh.set_params(id, crawl);

        let mut destinations = vec![gathering.monitor(id).unwrap().destination()];
        for _ in 0..300 {
            gathering.update(&mut pets, &arbiter, &mut stage.ctx(), DT);
            stage.mesh.advance(DT);
            let Some(monitor) = gathering.monitor(id) else {
                break;
            };
            if destinations.last() != Some(&monitor.destination()) {
                destinations.push(monitor.destination());
            }
        }

        assert_eq!(destinations.len(), 2);
        assert!(gathering.monitor(id).is_none());
        let dog = pets.get(&id).unwrap();
        assert!(dog.gathered);
        assert_eq!(stage.mesh.params(id), Some(dog.base));
        assert!(stage.mesh.destination(id).is_none());
        assert!(planar_distance(stage.mesh.position(id).unwrap(), start) < 2.0);
    }

    #[test]
    fn slot_lost_mid_route_settles_in_place() {
        let mut stage = Stage::new(14);
        let mut pets = flock(&mut stage, &[Vec3::new(-40.0, 0.0, 0.0)]);
        let id = *pets.keys().next().unwrap();
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());
        run(&mut gathering, &mut pets, &mut stage, 3);
        let destination = gathering.monitor(id).unwrap().destination();

        stage.mesh.block(destination, 3.0);
        assert!(!stage.mesh.set_destination(id, destination));
        gathering.update(&mut pets, &arbiter, &mut stage.ctx(), DT);

        assert!(!gathering.monitor(id).unwrap().is_moving());
        assert!(!gathering.monitor(id).unwrap().rerouted());
        assert_eq!(stage.mesh.params(id), Some(pets.get(&id).unwrap().base));
        run(&mut gathering, &mut pets, &mut stage, 40);
        assert!(pets.get(&id).unwrap().gathered);
        assert!(planar_distance(stage.mesh.position(id).unwrap(), destination) > 10.0);
    }

    #[test]
    fn off_surface_slot_sends_its_pet_to_a_leftover_spot() {
        let mut stage = Stage::new(15);
        // Without jitter four pets get the corners of a square 6 * sqrt(2) wide.
        let half = 3.0 * SQRT_2;
        let corner = Vec3::new(half, 0.0, half);
        stage.mesh.block(corner, 6.5);
        let mut pets = flock(
            &mut stage,
            &[
                Vec3::new(-30.0, 0.0, -30.0),
                Vec3::new(30.0, 0.0, -30.0),
                Vec3::new(-30.0, 0.0, 30.0),
                Vec3::new(-30.0, 0.0, 0.0),
            ],
        );
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(still_config());

        let report = gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());

        assert_eq!(report.assigned, 4);
        let destinations: Vec<Vec3> = gathering.monitors().map(Monitor::destination).collect();
        for (index, destination) in destinations.iter().enumerate() {
            assert!(planar_distance(*destination, corner) >= 6.5);
            for other in destinations.iter().skip(index + 1) {
                assert!(planar_distance(*destination, *other) >= 1.5 - 1e-4);
            }
        }
        let mut close_pairs = 0;
        for (index, destination) in destinations.iter().enumerate() {
            close_pairs += destinations
                .iter()
                .skip(index + 1)
                .filter(|other| planar_distance(*destination, **other) < 3.0)
                .count();
        }
        assert_eq!(close_pairs, 1);

        run(&mut gathering, &mut pets, &mut stage, 300);
        assert!(pets.values().all(|pet| pet.gathered));
    }

    #[test]
    fn pet_without_an_agent_keeps_its_gather() {
        let mut stage = Stage::new(16);
        let mut pets = flock(&mut stage, &[Vec3::new(-30.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0)]);
        let (a, b) = {
            let mut keys = pets.keys().copied();
            (keys.next().unwrap(), keys.next().unwrap())
        };
        let arbiter = Arbiter::new(BehaviorConfig::default());
        let mut gathering = GatheringCoordinator::new(GatheringConfig::default());
        gathering.gather(Vec3::ZERO, Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());
        let version = pets.get(&a).unwrap().gather_command_version;
        stage.mesh.unregister(a);

        let report =
            gathering.gather(Vec3::new(5.0, 0.0, 5.0), Vec3::Z, &mut pets, &arbiter, &mut stage.ctx());

        assert_eq!(report.skipped, 1);
        assert_eq!(report.assigned, 1);
        let lost = pets.get(&a).unwrap();
        assert_eq!(lost.gather_command_version, version);
        assert_eq!(lost.activity, Activity::Gathering { version });
        assert_eq!(gathering.monitor(a).unwrap().version(), version);
        assert_eq!(gathering.monitor(b).unwrap().version(), version + 1);

        run(&mut gathering, &mut pets, &mut stage, 200);
        assert!(pets.get(&a).unwrap().is_idle());
    }
}
