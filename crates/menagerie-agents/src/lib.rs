//! Pet state, needs, and autonomous behavior for the Menagerie simulation.
//!
//! This crate is the per-pet decision layer. It owns the [`Pet`] aggregate,
//! the need model, and the seekers that drive a pet towards food, a bed, a
//! tree, or water. The [`Arbiter`] decides which of them owns each pet on a
//! given tick; coordinators in `menagerie-core` (interactions, gathering)
//! claim pets through it.
//!
//! # Modules
//!
//! - [`activity`] -- [`Activity`], the per-pet owner of record, and [`Behavior`] priorities
//! - [`arbiter`] -- [`Arbiter`], priority arbitration and external claims
//! - [`climbing`] -- Tree climb sequences and the ambient [`ClimbingSeeker`]
//! - [`config`] -- [`BehaviorConfig`] and its per-seeker sections
//! - [`context`] -- [`BehaviorContext`] borrowed services and [`AgentEvent`]s
//! - [`error`] -- [`AgentError`]
//! - [`feeding`] -- [`FeedingSeeker`]
//! - [`needs`] -- Hunger and sleepiness ([`Needs`])
//! - [`pet`] -- The [`Pet`] aggregate
//! - [`sleeping`] -- [`SleepingSeeker`], including forced and in-tree sleep
//! - [`wander`] -- Idle wandering
//! - [`water`] -- [`WaterSeeker`], shore and swim trips

pub mod activity;
pub mod arbiter;
pub mod climbing;
pub mod config;
pub mod context;
pub mod error;
pub mod feeding;
pub mod needs;
pub mod pet;
pub mod sleeping;
pub mod wander;
pub mod water;

#[cfg(test)]
mod test_support;

pub use activity::{Activity, Behavior, TaskStatus};
pub use arbiter::Arbiter;
pub use climbing::{
    ClimbSequence, ClimbStatus, ClimbTask, ClimbingSeeker, TreeAction, force_cancel_climbing,
};
pub use config::{
    BehaviorConfig, ClimbingConfig, FeedingConfig, NeedsConfig, SleepingConfig, WanderConfig,
    WaterConfig,
};
pub use context::{AgentEvent, BehaviorContext, random_between, roll};
pub use error::AgentError;
pub use feeding::{FeedTarget, FeedingSeeker, FeedingTask};
pub use needs::{NEED_MAX, NeedKind, Needs, Recovery};
pub use pet::{Cooldowns, Pet};
pub use sleeping::{SleepTask, SleepingSeeker};
pub use wander::{WanderState, Wanderer};
pub use water::{WaterSeeker, WaterTask};
