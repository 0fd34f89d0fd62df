//! Error types for the `menagerie-agents` crate.
//!
//! Behavioral failures (unreachable targets, occupied trees, vanished food)
//! never surface here: seekers log them and give control back. These errors
//! only come out of explicit API calls made by the coordinators above.

use menagerie_types::PetId;

use crate::activity::Behavior;

/// Errors that can occur during pet state operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AgentError {
    /// An external claim was rejected because an equal or higher priority
    /// behavior already owns the pet.
    #[error("pet {pet} is owned by {current:?}; {requested:?} cannot claim it")]
    BehaviorConflict {
        /// The contested pet.
        pet: PetId,
        /// The behavior currently owning the pet.
        current: Behavior,
        /// The behavior that tried to claim it.
        requested: Behavior,
    },

    /// Pet with the given ID was not found.
    #[error("pet not found: {0}")]
    PetNotFound(PetId),
}
