//! One running interaction between two pets.
//!
//! A session moves through `Starting`, `PositioningNavMesh`, `Performing`,
//! and `Ending` before going `Idle`. Positioning makes sure both agents
//! stand on the navigation surface: an agent found off it is disabled, its
//! snapped point recorded, and on the following tick it is re-enabled and
//! warped there before a short stabilization wait.
//!
//! Every tick first checks that both pets still belong to the session. A
//! pet that disappears, is picked up, or is claimed by something else
//! aborts the session. Cleanup restores the locomotion parameters and
//! rotation setting captured at start and hides emotions; pets still owned
//! by this session go back to idle.

use std::collections::BTreeMap;

use glam::Vec3;
use menagerie_agents::{Activity, BehaviorContext, Pet};
use menagerie_types::{AnimationState, InteractionKind, LocomotionParams, PetId, SessionId};
use tracing::{debug, info, warn};

use super::race::{Race, RaceResult};
use super::sleep_together::SleepTogether;
use super::walk_together::WalkTogether;
use super::{Participant, StageStatus};

/// Public view of where a session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Just created.
    Starting,
    /// Putting both agents back on the navigation surface.
    PositioningNavMesh,
    /// Running the choreography.
    Performing,
    /// Cleaning up.
    Ending,
    /// Finished; the session is about to be dropped.
    Idle,
}

/// Why a session stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// A participant no longer exists.
    PetMissing(PetId),
    /// A participant was picked up.
    Held(PetId),
    /// A participant is owned by something else now.
    Claimed(PetId),
    /// A participant could not be put back on the navigation surface.
    OffNavMesh(PetId),
    /// The choreography could not continue.
    Stalled,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEnd {
    /// The choreography ran to completion.
    Completed,
    /// The session stopped early.
    Aborted {
        /// What went wrong.
        reason: AbortReason,
    },
}

/// The choreography a session performs.
#[derive(Debug, Clone, PartialEq)]
pub enum Choreography {
    /// Rabbit-and-turtle race.
    Race(Box<Race>),
    /// Side-by-side nap.
    SleepTogether(SleepTogether),
    /// Side-by-side stroll.
    WalkTogether(WalkTogether),
}

impl Choreography {
    /// The interaction kind this choreography performs.
    pub const fn kind(&self) -> InteractionKind {
        match self {
            Self::Race(_) => InteractionKind::Race,
            Self::SleepTogether(_) => InteractionKind::SleepTogether,
            Self::WalkTogether(_) => InteractionKind::WalkTogether,
        }
    }

    fn step(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> StageStatus {
        match self {
            Self::Race(race) => race.step(ctx, dt),
            Self::SleepTogether(sleep) => sleep.step(ctx, dt),
            Self::WalkTogether(walk) => walk.step(ctx, dt),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Repair {
    Check,
    Reenable(Vec<(PetId, Vec3)>),
    Stabilize { remaining: f32 },
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Starting,
    Positioning(Repair),
    Performing,
    Ending,
    Idle,
}

/// Navigation repair settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairSettings {
    /// Radius used to snap an agent back onto the surface.
    pub radius: f32,
    /// Seconds to wait after re-registering a repaired agent.
    pub stabilization_wait: f32,
}

/// Locomotion settings taken from a participant when its session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturedMotion {
    /// Live parameters at start.
    pub params: LocomotionParams,
    /// Whether the agent was turning to face its movement.
    pub update_rotation: bool,
}

/// An interaction session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    participants: [Participant; 2],
    captured: [CapturedMotion; 2],
    choreography: Choreography,
    repair: RepairSettings,
    phase: Phase,
    elapsed: f32,
}

impl Session {
    /// A session for two already-claimed pets.
    pub const fn new(
        id: SessionId,
        participants: [Participant; 2],
        captured: [CapturedMotion; 2],
        choreography: Choreography,
        repair: RepairSettings,
    ) -> Self {
        Self {
            id,
            participants,
            captured,
            choreography,
            repair,
            phase: Phase::Starting,
            elapsed: 0.0,
        }
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// What the session performs.
    pub const fn kind(&self) -> InteractionKind {
        self.choreography.kind()
    }

    /// The two participants.
    pub const fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    /// The two participant ids.
    pub fn pets(&self) -> [PetId; 2] {
        self.participants.map(|participant| participant.id)
    }

    /// Whether `pet` takes part in this session.
    pub fn involves(&self, pet: PetId) -> bool {
        self.participants.iter().any(|participant| participant.id == pet)
    }

    /// Seconds since the session started.
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// The choreography being performed.
    pub const fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// Race outcome, for a finished race.
    pub fn race_result(&self) -> Option<RaceResult> {
        match &self.choreography {
            Choreography::Race(race) => race.result(),
            Choreography::SleepTogether(_) | Choreography::WalkTogether(_) => None,
        }
    }

    /// Public state.
    pub const fn state(&self) -> SessionState {
        match self.phase {
            Phase::Starting => SessionState::Starting,
            Phase::Positioning(_) => SessionState::PositioningNavMesh,
            Phase::Performing => SessionState::Performing,
            Phase::Ending => SessionState::Ending,
            Phase::Idle => SessionState::Idle,
        }
    }

    /// Advance the session by one tick. Returns how it ended, once it has.
    pub fn step(
        &mut self,
        pets: &mut BTreeMap<PetId, Pet>,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> Option<SessionEnd> {
        if matches!(self.phase, Phase::Idle) {
            return Some(SessionEnd::Completed);
        }
        self.elapsed += dt;
        if let Some(reason) = self.check_membership(pets) {
            return Some(self.abort(reason, pets, ctx));
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Starting => {
                self.phase = Phase::Positioning(Repair::Check);
                None
            }
            Phase::Positioning(repair) => match self.reposition(repair, ctx, dt) {
                Ok(next) => {
                    self.phase = next;
                    None
                }
                Err(reason) => Some(self.abort(reason, pets, ctx)),
            },
            Phase::Performing => match self.choreography.step(ctx, dt) {
                StageStatus::Running => {
                    self.phase = Phase::Performing;
                    None
                }
                StageStatus::Finished => {
                    self.phase = Phase::Ending;
                    None
                }
                StageStatus::Failed => Some(self.abort(AbortReason::Stalled, pets, ctx)),
            },
            Phase::Ending => {
                self.cleanup(pets, ctx);
                info!(
                    session = %self.id,
                    kind = ?self.kind(),
                    elapsed = self.elapsed,
                    "Interaction completed"
                );
                Some(SessionEnd::Completed)
            }
            Phase::Idle => Some(SessionEnd::Completed),
        }
    }

    /// Stop the session now and clean up.
    pub fn abort(
        &mut self,
        reason: AbortReason,
        pets: &mut BTreeMap<PetId, Pet>,
        ctx: &mut BehaviorContext<'_>,
    ) -> SessionEnd {
        warn!(session = %self.id, kind = ?self.kind(), ?reason, "Interaction aborted");
        self.cleanup(pets, ctx);
        SessionEnd::Aborted { reason }
    }

    fn check_membership(&self, pets: &BTreeMap<PetId, Pet>) -> Option<AbortReason> {
        self.participants.iter().find_map(|participant| {
            let Some(pet) = pets.get(&participant.id) else {
                return Some(AbortReason::PetMissing(participant.id));
            };
            if pet.holding || matches!(pet.activity, Activity::Held) {
                return Some(AbortReason::Held(pet.id));
            }
            (pet.interaction_session() != Some(self.id)).then_some(AbortReason::Claimed(pet.id))
        })
    }

    fn reposition(
        &self,
        repair: Repair,
        ctx: &mut BehaviorContext<'_>,
        dt: f32,
    ) -> Result<Phase, AbortReason> {
        match repair {
            Repair::Check => {
                let mut snapped = Vec::new();
                for participant in &self.participants {
                    let pet = participant.id;
                    if ctx.locomotion.is_on_navmesh(pet) {
                        continue;
                    }
                    let position = ctx
                        .locomotion
                        .position(pet)
                        .ok_or(AbortReason::PetMissing(pet))?;
                    ctx.locomotion.set_enabled(pet, false);
                    let point = ctx
                        .locomotion
                        .sample_position(position, self.repair.radius)
                        .ok_or(AbortReason::OffNavMesh(pet))?;
                    debug!(session = %self.id, %pet, x = point.x, z = point.z, "Agent off the navigation surface");
                    snapped.push((pet, point));
                }
                if snapped.is_empty() {
                    Ok(Phase::Performing)
                } else {
                    Ok(Phase::Positioning(Repair::Reenable(snapped)))
                }
            }
            Repair::Reenable(snapped) => {
                for (pet, point) in snapped {
                    ctx.locomotion.set_enabled(pet, true);
                    if !ctx.locomotion.warp(pet, point) {
                        return Err(AbortReason::OffNavMesh(pet));
                    }
                }
                Ok(Phase::Positioning(Repair::Stabilize {
                    remaining: self.repair.stabilization_wait,
                }))
            }
            Repair::Stabilize { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    Ok(Phase::Positioning(Repair::Stabilize { remaining }))
                } else {
                    Ok(Phase::Performing)
                }
            }
        }
    }

    fn cleanup(&mut self, pets: &mut BTreeMap<PetId, Pet>, ctx: &mut BehaviorContext<'_>) {
        for (participant, captured) in self.participants.iter().zip(self.captured) {
            let Some(pet) = pets.get_mut(&participant.id) else {
                continue;
            };
            ctx.locomotion.set_params(pet.id, captured.params);
            ctx.locomotion
                .set_update_rotation(pet.id, captured.update_rotation);
            ctx.presentation.hide_emotion(pet.id);
            if pet.interaction_session() != Some(self.id) {
                continue;
            }
            pet.activity = Activity::idle();
            ctx.presentation.set_animation(pet.id, AnimationState::Idle);
            if !ctx.locomotion.is_enabled(pet.id) {
                ctx.locomotion.set_enabled(pet.id, true);
            }
            if ctx.locomotion.is_on_navmesh(pet.id) {
                ctx.locomotion.resume(pet.id);
            }
        }
        self.phase = Phase::Idle;
    }
}
