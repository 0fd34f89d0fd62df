//! Enumeration types shared across the Menagerie workspace.
//!
//! Species, personality, and habitat are identity tags fixed at spawn time.
//! Animation and emotion values are the vocabulary the behavior layer uses
//! when talking to the presentation collaborator.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity tags
// ---------------------------------------------------------------------------

/// The species of a pet.
///
/// Species drives interaction eligibility and the sleep-together spacing
/// table; it never changes after spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Fast, easily distracted runner.
    Rabbit,
    /// Slow and steady.
    Turtle,
    /// Pack animal of the forest.
    Wolf,
    /// Domestic companion.
    Dog,
    /// Domestic climber.
    Cat,
    /// Small forest hunter.
    Fox,
    /// Large forest omnivore.
    Bear,
    /// Grazer of the forest edge.
    Deer,
    /// Grazer of open fields and fences.
    Horse,
    /// Tree dweller.
    Squirrel,
    /// Tree dweller.
    Monkey,
    /// Swimmer.
    Duck,
    /// Swimmer.
    Frog,
    /// Very large grazer.
    Elephant,
}

impl Species {
    /// Species that count as "large" when spacing two sleeping pets.
    pub const LARGE: [Self; 6] = [
        Self::Wolf,
        Self::Dog,
        Self::Bear,
        Self::Deer,
        Self::Horse,
        Self::Elephant,
    ];

    /// Whether this species is in the fixed large-species table.
    pub fn is_large(self) -> bool {
        Self::LARGE.contains(&self)
    }
}

/// Personality of a pet. Affects the forced-sleep threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Personality {
    /// Falls asleep early.
    Lazy,
    /// Energetic, default thresholds.
    Playful,
    /// Stays awake until exhausted.
    Brave,
    /// Timid, default thresholds.
    Shy,
    /// Inquisitive, default thresholds.
    Curious,
}

/// Habitat tag deciding which environmental resources a pet can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Habitat {
    /// Open field. Field pets always sleep where they stand.
    Field,
    /// Forest floor.
    Forest,
    /// Tree canopy. Tree pets sleep up in a tree.
    Tree,
    /// Ponds and rivers.
    Water,
    /// Fenced paddock.
    Fence,
}

/// The kind of food a food item or feeding area offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FoodType {
    /// Meat.
    Meat,
    /// Fish.
    Fish,
    /// Fruits and vegetables.
    FruitsAndVegetables,
    /// Insects.
    Insects,
    /// Grass and hay.
    Grass,
    /// Nuts and seeds.
    Nuts,
}

// ---------------------------------------------------------------------------
// Presentation vocabulary
// ---------------------------------------------------------------------------

/// Animation states the behavior layer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    /// Standing still.
    Idle,
    /// Walking.
    Walk,
    /// Running.
    Run,
    /// Eating.
    Eat,
    /// Sleeping.
    Sleep,
    /// Resting in a tree.
    Rest,
    /// Climbing up or down.
    Climb,
    /// Swimming.
    Swim,
    /// Celebrating a win.
    Victory,
    /// Sulking after a loss.
    Disappointed,
    /// Nudging a partner awake.
    Nudge,
    /// Short hop used for sleep micro-movements.
    Twitch,
}

/// Transient emotion bubbles shown above a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Emotion {
    /// Content after eating.
    Happy,
    /// Woken up against its will.
    Angry,
    /// Drowsy.
    Sleepy,
    /// Affection between partners.
    Love,
    /// Excited before a race.
    Excited,
}

/// The choreographed two-pet interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Walk side by side to a nearby point.
    WalkTogether,
    /// Rabbit-and-turtle race.
    Race,
    /// Curl up and sleep next to each other.
    SleepTogether,
}
