//! In-memory reference implementation of [`Locomotion`].
//!
//! [`FlatNavMesh`] models a square, flat navigable plane centered on the
//! origin, optionally punctured by circular blocked regions (rocks, cliffs).
//! Paths are straight lines; a path crossing a blocked region is unreachable.
//! Newly requested paths stay [`PathStatus::Pending`] for exactly one
//! [`Locomotion::advance`] call, the way an engine computes paths a frame
//! late. Agents move at their configured speed and count as arrived inside
//! their stopping distance.
//!
//! The headless engine binary and every scenario test run on this type.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use menagerie_types::{LocomotionParams, PetId};

use crate::locomotion::{Locomotion, PathStatus};
use crate::resources::planar_distance;

/// Height tolerance for counting a point as "on the ground".
const GROUND_TOLERANCE: f32 = 0.25;

/// Extra clearance when pushing a sample out of a blocked region.
const BLOCKED_CLEARANCE: f32 = 0.05;

/// A circular hole in the navigable surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockedRegion {
    /// Center on the ground plane.
    pub center: Vec3,
    /// Radius on the XZ plane.
    pub radius: f32,
}

#[derive(Debug, Clone)]
struct Agent {
    position: Vec3,
    forward: Vec3,
    velocity: Vec3,
    destination: Option<Vec3>,
    status: PathStatus,
    params: LocomotionParams,
    stopped: bool,
    enabled: bool,
    update_rotation: bool,
}

/// A flat square navmesh with circular obstacles.
#[derive(Debug, Clone)]
pub struct FlatNavMesh {
    half_extent: f32,
    blocked: Vec<BlockedRegion>,
    agents: BTreeMap<PetId, Agent>,
}

impl FlatNavMesh {
    /// Create a navigable square spanning `[-half_extent, half_extent]` on X and Z.
    pub const fn new(half_extent: f32) -> Self {
        Self {
            half_extent,
            blocked: Vec::new(),
            agents: BTreeMap::new(),
        }
    }

    /// Add a blocked region.
    pub fn block(&mut self, center: Vec3, radius: f32) {
        self.blocked.push(BlockedRegion {
            center: ground(center),
            radius,
        });
    }

    /// Half the side length of the navigable square.
    pub const fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// Whether `point` is on the navigable surface.
    pub fn is_navigable(&self, point: Vec3) -> bool {
        point.y.abs() <= GROUND_TOLERANCE
            && point.x.abs() <= self.half_extent
            && point.z.abs() <= self.half_extent
            && !self.blocked.iter().any(|region| planar_distance(region.center, point) < region.radius)
    }

    fn segment_clear(&self, from: Vec3, to: Vec3) -> bool {
        self.blocked
            .iter()
            .all(|region| segment_distance(ground(from), ground(to), region.center) >= region.radius)
    }
}

impl Locomotion for FlatNavMesh {
    fn register(&mut self, pet: PetId, position: Vec3, params: LocomotionParams) {
        self.agents.insert(
            pet,
            Agent {
                position,
                forward: Vec3::Z,
                velocity: Vec3::ZERO,
                destination: None,
                status: PathStatus::Idle,
                params,
                stopped: false,
                enabled: true,
                update_rotation: true,
            },
        );
    }

    fn unregister(&mut self, pet: PetId) {
        self.agents.remove(&pet);
    }

    fn position(&self, pet: PetId) -> Option<Vec3> {
        self.agents.get(&pet).map(|agent| agent.position)
    }

    fn forward(&self, pet: PetId) -> Option<Vec3> {
        self.agents.get(&pet).map(|agent| agent.forward)
    }

    fn set_destination(&mut self, pet: PetId, target: Vec3) -> bool {
        let target = ground_if_close(target);
        let reachable = self
            .agents
            .get(&pet)
            .is_some_and(|agent| {
                agent.enabled
                    && self.is_navigable(target)
                    && self.segment_clear(agent.position, target)
            });
        let Some(agent) = self.agents.get_mut(&pet) else {
            return false;
        };
        if !agent.enabled {
            return false;
        }
        agent.velocity = Vec3::ZERO;
        if reachable {
            agent.destination = Some(target);
            agent.status = PathStatus::Pending;
        } else {
            agent.destination = None;
            agent.status = PathStatus::Unreachable;
        }
        reachable
    }

    fn destination(&self, pet: PetId) -> Option<Vec3> {
        self.agents.get(&pet).and_then(|agent| agent.destination)
    }

    fn reset_path(&mut self, pet: PetId) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.destination = None;
            agent.status = PathStatus::Idle;
            agent.velocity = Vec3::ZERO;
        }
    }

    fn path_status(&self, pet: PetId) -> PathStatus {
        self.agents
            .get(&pet)
            .map_or(PathStatus::Idle, |agent| agent.status)
    }

    fn remaining_distance(&self, pet: PetId) -> f32 {
        let Some(agent) = self.agents.get(&pet) else {
            return f32::INFINITY;
        };
        match (agent.status, agent.destination) {
            (PathStatus::Moving | PathStatus::Arrived, Some(destination)) => {
                planar_distance(agent.position, destination)
            }
            _ => f32::INFINITY,
        }
    }

    fn velocity(&self, pet: PetId) -> Vec3 {
        self.agents
            .get(&pet)
            .map_or(Vec3::ZERO, |agent| agent.velocity)
    }

    fn stop(&mut self, pet: PetId) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.stopped = true;
            agent.velocity = Vec3::ZERO;
        }
    }

    fn resume(&mut self, pet: PetId) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.stopped = false;
        }
    }

    fn is_stopped(&self, pet: PetId) -> bool {
        self.agents.get(&pet).is_some_and(|agent| agent.stopped)
    }

    fn set_enabled(&mut self, pet: PetId, enabled: bool) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.enabled = enabled;
            if !enabled {
                agent.destination = None;
                agent.status = PathStatus::Idle;
                agent.velocity = Vec3::ZERO;
            }
        }
    }

    fn is_enabled(&self, pet: PetId) -> bool {
        self.agents.get(&pet).is_some_and(|agent| agent.enabled)
    }

    fn is_on_navmesh(&self, pet: PetId) -> bool {
        self.agents
            .get(&pet)
            .is_some_and(|agent| agent.enabled && self.is_navigable(agent.position))
    }

    fn warp(&mut self, pet: PetId, position: Vec3) -> bool {
        let position = ground_if_close(position);
        if !self.is_navigable(position) {
            return false;
        }
        let Some(agent) = self.agents.get_mut(&pet) else {
            return false;
        };
        agent.position = position;
        agent.destination = None;
        agent.status = PathStatus::Idle;
        agent.velocity = Vec3::ZERO;
        true
    }

    fn set_position(&mut self, pet: PetId, position: Vec3) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.position = position;
        }
    }

    fn params(&self, pet: PetId) -> Option<LocomotionParams> {
        self.agents.get(&pet).map(|agent| agent.params)
    }

    fn set_params(&mut self, pet: PetId, params: LocomotionParams) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.params = params;
        }
    }

    fn update_rotation(&self, pet: PetId) -> bool {
        self.agents
            .get(&pet)
            .is_some_and(|agent| agent.update_rotation)
    }

    fn set_update_rotation(&mut self, pet: PetId, enabled: bool) {
        if let Some(agent) = self.agents.get_mut(&pet) {
            agent.update_rotation = enabled;
        }
    }

    fn rotate_towards(
        &mut self,
        pet: PetId,
        point: Vec3,
        degrees_per_second: f32,
        dt: f32,
    ) -> f32 {
        let Some(agent) = self.agents.get_mut(&pet) else {
            return 0.0;
        };
        let Some(desired) = ground(point - agent.position).try_normalize() else {
            return 0.0;
        };
        let angle = agent.forward.angle_between(desired).to_degrees();
        let max_step = (degrees_per_second * dt).max(0.0);
        if angle <= max_step {
            agent.forward = desired;
            return 0.0;
        }
        let sign = if agent.forward.cross(desired).y >= 0.0 {
            1.0
        } else {
            -1.0
        };
        let rotation = Quat::from_rotation_y(sign * max_step.to_radians());
        agent.forward = (rotation * agent.forward).normalize_or(desired);
        angle - max_step
    }

    fn sample_position(&self, point: Vec3, max_radius: f32) -> Option<Vec3> {
        let mut candidate = Vec3::new(
            point.x.clamp(-self.half_extent, self.half_extent),
            0.0,
            point.z.clamp(-self.half_extent, self.half_extent),
        );
        for region in &self.blocked {
            if planar_distance(region.center, candidate) < region.radius {
                let direction = ground(candidate - region.center)
                    .try_normalize()
                    .unwrap_or(Vec3::X);
                candidate = region.center + direction * (region.radius + BLOCKED_CLEARANCE);
            }
        }
        (self.is_navigable(candidate) && planar_distance(candidate, point) <= max_radius)
            .then_some(candidate)
    }

    fn path_complete(&self, from: Vec3, to: Vec3) -> bool {
        self.is_navigable(ground(from))
            && self.is_navigable(ground(to))
            && self.segment_clear(from, to)
    }

    fn advance(&mut self, dt: f32) {
        for agent in self.agents.values_mut() {
            if !agent.enabled {
                continue;
            }
            match agent.status {
                PathStatus::Pending => {
                    agent.status = PathStatus::Moving;
                }
                PathStatus::Moving if agent.stopped => {
                    agent.velocity = Vec3::ZERO;
                }
                PathStatus::Moving => step_agent(agent, dt),
                PathStatus::Idle | PathStatus::Arrived | PathStatus::Unreachable => {
                    agent.velocity = Vec3::ZERO;
                }
            }
        }
    }
}

fn step_agent(agent: &mut Agent, dt: f32) {
    let Some(destination) = agent.destination else {
        agent.status = PathStatus::Idle;
        agent.velocity = Vec3::ZERO;
        return;
    };
    let offset = ground(destination - agent.position);
    let distance = offset.length();
    if distance <= agent.params.stopping_distance {
        agent.status = PathStatus::Arrived;
        agent.velocity = Vec3::ZERO;
        return;
    }
    let direction = offset / distance;
    let travel = (agent.params.speed * dt).min(distance);
    agent.position += direction * travel;
    agent.velocity = direction * agent.params.speed;
    if agent.update_rotation {
        agent.forward = direction;
    }
    if distance - travel <= agent.params.stopping_distance {
        agent.status = PathStatus::Arrived;
        agent.velocity = Vec3::ZERO;
    }
}

/// Flatten a vector onto the XZ plane.
const fn ground(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Snap points that are already within ground tolerance onto the plane.
fn ground_if_close(v: Vec3) -> Vec3 {
    if v.y.abs() <= GROUND_TOLERANCE {
        ground(v)
    } else {
        v
    }
}

/// Shortest XZ distance from `point` to the segment `a..b`.
fn segment_distance(a: Vec3, b: Vec3, point: Vec3) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return planar_distance(a, point);
    }
    let t = ((ground(point) - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    planar_distance(a + ab * t, point)
}
