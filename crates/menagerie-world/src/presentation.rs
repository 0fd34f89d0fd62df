//! Animation and emotion feedback.
//!
//! The behavior layer never renders anything. It tells a [`Presentation`]
//! collaborator which animation state a pet should be in and which emotion
//! bubble to show, and asks it how long a clip lasts so timed sequences
//! (eating, victory, nudging) know when to continue. All calls are
//! fire-and-forget.
//!
//! [`RecordingPresentation`] keeps the current state per pet plus a log of
//! every call, which is what the headless engine and the tests use.

use std::collections::BTreeMap;

use menagerie_types::{AnimationState, Emotion, PetId};
use tracing::trace;

/// Animation and emotion sink for pets.
pub trait Presentation {
    /// Switch the pet's animation state machine to `state`.
    fn set_animation(&mut self, pet: PetId, state: AnimationState);

    /// Length in seconds of the clip played for `state`.
    fn animation_length(&self, pet: PetId, state: AnimationState) -> f32;

    /// Scale playback speed of the pet's animations.
    fn set_playback_speed(&mut self, pet: PetId, factor: f32);

    /// Show a transient emotion indicator for `duration` seconds.
    fn show_emotion(&mut self, pet: PetId, emotion: Emotion, duration: f32);

    /// Hide any emotion indicator on the pet.
    fn hide_emotion(&mut self, pet: PetId);
}

/// One recorded presentation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresentationEvent {
    /// [`Presentation::set_animation`] was called.
    Animation {
        /// Target pet.
        pet: PetId,
        /// New state.
        state: AnimationState,
    },
    /// [`Presentation::set_playback_speed`] was called.
    PlaybackSpeed {
        /// Target pet.
        pet: PetId,
        /// Speed factor.
        factor: f32,
    },
    /// [`Presentation::show_emotion`] was called.
    EmotionShown {
        /// Target pet.
        pet: PetId,
        /// Emotion shown.
        emotion: Emotion,
        /// Display duration in seconds.
        duration: f32,
    },
    /// [`Presentation::hide_emotion`] was called.
    EmotionHidden {
        /// Target pet.
        pet: PetId,
    },
}

/// In-memory [`Presentation`] that remembers what it was told.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    animations: BTreeMap<PetId, AnimationState>,
    emotions: BTreeMap<PetId, Emotion>,
    events: Vec<PresentationEvent>,
}

impl RecordingPresentation {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            animations: BTreeMap::new(),
            emotions: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Current animation state of `pet` (defaults to idle).
    pub fn animation(&self, pet: PetId) -> AnimationState {
        self.animations
            .get(&pet)
            .copied()
            .unwrap_or(AnimationState::Idle)
    }

    /// Emotion currently displayed over `pet`.
    pub fn emotion(&self, pet: PetId) -> Option<Emotion> {
        self.emotions.get(&pet).copied()
    }

    /// Every call recorded so far, oldest first.
    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    /// Whether `emotion` was ever shown over `pet`.
    pub fn showed(&self, pet: PetId, emotion: Emotion) -> bool {
        self.events.iter().any(|event| {
            matches!(event, PresentationEvent::EmotionShown { pet: p, emotion: e, .. }
                if *p == pet && *e == emotion)
        })
    }

    /// Whether `pet` was ever put into animation `state`.
    pub fn played(&self, pet: PetId, state: AnimationState) -> bool {
        self.events.iter().any(|event| {
            matches!(event, PresentationEvent::Animation { pet: p, state: s }
                if *p == pet && *s == state)
        })
    }

    /// Drop the recorded call log, keeping current state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Presentation for RecordingPresentation {
    fn set_animation(&mut self, pet: PetId, state: AnimationState) {
        trace!(%pet, ?state, "Animation");
        self.animations.insert(pet, state);
        self.events.push(PresentationEvent::Animation { pet, state });
    }

    fn animation_length(&self, _pet: PetId, state: AnimationState) -> f32 {
        match state {
            AnimationState::Victory => 2.5,
            AnimationState::Disappointed => 2.0,
            AnimationState::Nudge => 1.2,
            AnimationState::Twitch => 0.6,
            AnimationState::Eat => 3.0,
            _ => 1.0,
        }
    }

    fn set_playback_speed(&mut self, pet: PetId, factor: f32) {
        trace!(%pet, factor, "Playback speed");
        self.events
            .push(PresentationEvent::PlaybackSpeed { pet, factor });
    }

    fn show_emotion(&mut self, pet: PetId, emotion: Emotion, duration: f32) {
        trace!(%pet, ?emotion, duration, "Emotion shown");
        self.emotions.insert(pet, emotion);
        self.events.push(PresentationEvent::EmotionShown {
            pet,
            emotion,
            duration,
        });
    }

    fn hide_emotion(&mut self, pet: PetId) {
        trace!(%pet, "Emotion hidden");
        self.emotions.remove(&pet);
        self.events.push(PresentationEvent::EmotionHidden { pet });
    }
}
