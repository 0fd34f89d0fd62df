//! Tunables for the need model and every autonomous behavior.
//!
//! These structs mirror the per-behavior sections of `menagerie-config.yaml`
//! (`needs`, `feeding`, `sleeping`, `climbing`, `water`, `wander`). Every
//! field has a named default function so partially written YAML files keep
//! the documented values for anything they omit.

use menagerie_types::{Personality, Species};
use serde::Deserialize;

/// Every behavior tunable the arbiter and its seekers read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BehaviorConfig {
    /// Need growth rates.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Feeding seeker parameters.
    #[serde(default)]
    pub feeding: FeedingConfig,

    /// Sleeping seeker parameters.
    #[serde(default)]
    pub sleeping: SleepingConfig,

    /// Tree-climbing seeker parameters.
    #[serde(default)]
    pub climbing: ClimbingConfig,

    /// Water adjustment parameters.
    #[serde(default)]
    pub water: WaterConfig,

    /// Idle wander parameters.
    #[serde(default)]
    pub wander: WanderConfig,
}

/// Need model rates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NeedsConfig {
    /// Hunger added per second (default: 0.8).
    #[serde(default = "default_hunger_rate")]
    pub hunger_rate: f32,

    /// Sleepiness added per second while awake (default: 0.5).
    #[serde(default = "default_sleepiness_rate")]
    pub sleepiness_rate: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_rate: default_hunger_rate(),
            sleepiness_rate: default_sleepiness_rate(),
        }
    }
}

/// Feeding seeker parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedingConfig {
    /// Hunger at which a pet starts looking for food (default: 60).
    #[serde(default = "default_feeding_hunger_threshold")]
    pub hunger_threshold: f32,

    /// Radius of the food discovery query (default: 25).
    #[serde(default = "default_feeding_detection_radius")]
    pub detection_radius: f32,

    /// Seconds between discovery attempts while hungry (default: 1.0).
    #[serde(default = "default_feeding_search_interval")]
    pub search_interval: f32,

    /// Arrival distance for food items (default: 1.5).
    #[serde(default = "default_eating_distance")]
    pub eating_distance: f32,

    /// Arrival distance for feeding areas (default: 3.0).
    #[serde(default = "default_feeding_area_distance")]
    pub feeding_area_distance: f32,

    /// Seconds between target position polls (default: 0.25).
    #[serde(default = "default_repoll_interval")]
    pub repoll_interval: f32,

    /// Minimum target displacement that triggers a new path (default: 0.1).
    #[serde(default = "default_replan_epsilon")]
    pub replan_epsilon: f32,

    /// Seconds between stale-target validations (default: 2.0).
    #[serde(default = "default_validation_interval")]
    pub validation_interval: f32,

    /// Seconds the eat animation plays (default: 3.0).
    #[serde(default = "default_eat_duration")]
    pub eat_duration: f32,

    /// Turn rate while facing the food, degrees per second (default: 360).
    #[serde(default = "default_face_speed")]
    pub face_speed: f32,

    /// Seconds allowed for facing before eating anyway (default: 1.0).
    #[serde(default = "default_face_timeout")]
    pub face_timeout: f32,

    /// Seconds the happy emotion stays up after eating (default: 2.0).
    #[serde(default = "default_emotion_duration")]
    pub happy_duration: f32,
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            hunger_threshold: default_feeding_hunger_threshold(),
            detection_radius: default_feeding_detection_radius(),
            search_interval: default_feeding_search_interval(),
            eating_distance: default_eating_distance(),
            feeding_area_distance: default_feeding_area_distance(),
            repoll_interval: default_repoll_interval(),
            replan_epsilon: default_replan_epsilon(),
            validation_interval: default_validation_interval(),
            eat_duration: default_eat_duration(),
            face_speed: default_face_speed(),
            face_timeout: default_face_timeout(),
            happy_duration: default_emotion_duration(),
        }
    }
}

/// Sleeping seeker parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SleepingConfig {
    /// Sleepiness at which a pet becomes eligible to seek sleep (default: 70).
    #[serde(default = "default_sleep_eligibility")]
    pub eligibility_threshold: f32,

    /// Sleepiness removed by a forced or improper sleep (default: 60).
    #[serde(default = "default_partial_recovery")]
    pub partial_recovery: f32,

    /// Forced-sleep threshold for lazy pets (default: 80).
    #[serde(default = "default_forced_lazy")]
    pub forced_threshold_lazy: f32,

    /// Forced-sleep threshold for brave pets (default: 100).
    #[serde(default = "default_forced_brave")]
    pub forced_threshold_brave: f32,

    /// Forced-sleep threshold for every other personality (default: 95).
    #[serde(default = "default_forced_default")]
    pub forced_threshold_default: f32,

    /// Radius of the sleeping area and tree search (default: 30).
    #[serde(default = "default_sleep_detection_radius")]
    pub detection_radius: f32,

    /// Seconds between searches while eligible (default: 2.0).
    #[serde(default = "default_sleep_search_interval")]
    pub search_interval: f32,

    /// Arrival distance for sleeping areas (default: 2.0).
    #[serde(default = "default_sleep_arrival_distance")]
    pub arrival_distance: f32,

    /// Seconds allowed to reach an area before giving up (default: 30).
    #[serde(default = "default_sleep_seek_timeout")]
    pub seek_timeout: f32,

    /// Seconds a sleep lasts (default: 12).
    #[serde(default = "default_sleep_duration")]
    pub sleep_duration: f32,

    /// Seconds the angry emotion stays up after an interrupted sleep (default: 2.0).
    #[serde(default = "default_emotion_duration")]
    pub angry_duration: f32,
}

impl SleepingConfig {
    /// The sleepiness at which `personality` falls asleep on the spot.
    pub const fn forced_threshold(&self, personality: Personality) -> f32 {
        match personality {
            Personality::Lazy => self.forced_threshold_lazy,
            Personality::Brave => self.forced_threshold_brave,
            Personality::Playful | Personality::Shy | Personality::Curious => {
                self.forced_threshold_default
            }
        }
    }
}

impl Default for SleepingConfig {
    fn default() -> Self {
        Self {
            eligibility_threshold: default_sleep_eligibility(),
            partial_recovery: default_partial_recovery(),
            forced_threshold_lazy: default_forced_lazy(),
            forced_threshold_brave: default_forced_brave(),
            forced_threshold_default: default_forced_default(),
            detection_radius: default_sleep_detection_radius(),
            search_interval: default_sleep_search_interval(),
            arrival_distance: default_sleep_arrival_distance(),
            seek_timeout: default_sleep_seek_timeout(),
            sleep_duration: default_sleep_duration(),
            angry_duration: default_emotion_duration(),
        }
    }
}

/// Tree-climbing parameters, shared by ambient climbs and tree sleep.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClimbingConfig {
    /// Species that climb besides tree-habitat pets (default: Cat).
    #[serde(default = "default_climbing_species")]
    pub climbing_species: Vec<Species>,

    /// Seconds between ambient climb rolls (default: 8).
    #[serde(default = "default_climb_check_interval")]
    pub check_interval: f32,

    /// Probability that an ambient roll starts a climb (default: 0.25).
    #[serde(default = "default_climb_chance")]
    pub chance: f64,

    /// Hunger above which ambient climbing is suppressed and rests abort (default: 70).
    #[serde(default = "default_climb_hunger_limit")]
    pub hunger_limit: f32,

    /// Sleepiness above which a rest on a tree aborts (default: 90).
    #[serde(default = "default_climb_sleepiness_limit")]
    pub sleepiness_limit: f32,

    /// Radius of the free-tree search (default: 20).
    #[serde(default = "default_climb_detection_radius")]
    pub detection_radius: f32,

    /// Distance from the trunk at which the pet starts climbing (default: 1.5).
    #[serde(default = "default_trunk_distance")]
    pub trunk_distance: f32,

    /// Seconds allowed to reach the trunk (default: 20).
    #[serde(default = "default_approach_timeout")]
    pub approach_timeout: f32,

    /// Seconds the climb up (and down) takes (default: 1.5).
    #[serde(default = "default_climb_duration")]
    pub climb_duration: f32,

    /// Lower bound of the perch height ratio (default: 2.3).
    #[serde(default = "default_height_ratio_min")]
    pub height_ratio_min: f32,

    /// Upper bound of the perch height ratio (default: 2.5).
    #[serde(default = "default_height_ratio_max")]
    pub height_ratio_max: f32,

    /// Shortest rest on a tree, in seconds (default: 5).
    #[serde(default = "default_rest_min")]
    pub rest_min: f32,

    /// Longest rest on a tree, in seconds (default: 10).
    #[serde(default = "default_rest_max")]
    pub rest_max: f32,

    /// Radius used to find the ground point after climbing down (default: 3).
    #[serde(default = "default_ground_sample_radius")]
    pub ground_sample_radius: f32,
}

impl Default for ClimbingConfig {
    fn default() -> Self {
        Self {
            climbing_species: default_climbing_species(),
            check_interval: default_climb_check_interval(),
            chance: default_climb_chance(),
            hunger_limit: default_climb_hunger_limit(),
            sleepiness_limit: default_climb_sleepiness_limit(),
            detection_radius: default_climb_detection_radius(),
            trunk_distance: default_trunk_distance(),
            approach_timeout: default_approach_timeout(),
            climb_duration: default_climb_duration(),
            height_ratio_min: default_height_ratio_min(),
            height_ratio_max: default_height_ratio_max(),
            rest_min: default_rest_min(),
            rest_max: default_rest_max(),
            ground_sample_radius: default_ground_sample_radius(),
        }
    }
}

/// Water adjustment parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaterConfig {
    /// How far past the water edge a land pet is sent (default: 1.5).
    #[serde(default = "default_shore_margin")]
    pub shore_margin: f32,

    /// Seconds between return-to-water rolls for water pets (default: 6).
    #[serde(default = "default_water_check_interval")]
    pub check_interval: f32,

    /// Probability that a roll sends a water pet back to water (default: 0.3).
    #[serde(default = "default_water_return_chance")]
    pub return_chance: f64,

    /// Radius of the water zone search (default: 30).
    #[serde(default = "default_water_detection_radius")]
    pub detection_radius: f32,

    /// How deep into a zone a returning pet swims, as a fraction of its radius (default: 0.5).
    #[serde(default = "default_depth_ratio")]
    pub depth_ratio: f32,

    /// Arrival distance for shore and water targets (default: 1.0).
    #[serde(default = "default_water_arrival_distance")]
    pub arrival_distance: f32,

    /// Shortest swim, in seconds (default: 4).
    #[serde(default = "default_swim_min")]
    pub swim_min: f32,

    /// Longest swim, in seconds (default: 8).
    #[serde(default = "default_swim_max")]
    pub swim_max: f32,

    /// Seconds allowed to reach the target (default: 20).
    #[serde(default = "default_water_timeout")]
    pub timeout: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            shore_margin: default_shore_margin(),
            check_interval: default_water_check_interval(),
            return_chance: default_water_return_chance(),
            detection_radius: default_water_detection_radius(),
            depth_ratio: default_depth_ratio(),
            arrival_distance: default_water_arrival_distance(),
            swim_min: default_swim_min(),
            swim_max: default_swim_max(),
            timeout: default_water_timeout(),
        }
    }
}

/// Idle wander parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WanderConfig {
    /// Radius around the pet in which wander targets are picked (default: 10).
    #[serde(default = "default_wander_radius")]
    pub radius: f32,

    /// Shortest time between new targets, in seconds (default: 3).
    #[serde(default = "default_wander_min_interval")]
    pub min_interval: f32,

    /// Longest time between new targets, in seconds (default: 8).
    #[serde(default = "default_wander_max_interval")]
    pub max_interval: f32,

    /// Radius used to snap a raw target onto the navmesh (default: 3).
    #[serde(default = "default_wander_sample_radius")]
    pub sample_radius: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: default_wander_radius(),
            min_interval: default_wander_min_interval(),
            max_interval: default_wander_max_interval(),
            sample_radius: default_wander_sample_radius(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_hunger_rate() -> f32 {
    0.8
}
const fn default_sleepiness_rate() -> f32 {
    0.5
}
const fn default_emotion_duration() -> f32 {
    2.0
}

const fn default_feeding_hunger_threshold() -> f32 {
    60.0
}
const fn default_feeding_detection_radius() -> f32 {
    25.0
}
const fn default_feeding_search_interval() -> f32 {
    1.0
}
const fn default_eating_distance() -> f32 {
    1.5
}
const fn default_feeding_area_distance() -> f32 {
    3.0
}
const fn default_repoll_interval() -> f32 {
    0.25
}
const fn default_replan_epsilon() -> f32 {
    0.1
}
const fn default_validation_interval() -> f32 {
    2.0
}
const fn default_eat_duration() -> f32 {
    3.0
}
const fn default_face_speed() -> f32 {
    360.0
}
const fn default_face_timeout() -> f32 {
    1.0
}

const fn default_sleep_eligibility() -> f32 {
    70.0
}
const fn default_partial_recovery() -> f32 {
    60.0
}
const fn default_forced_lazy() -> f32 {
    80.0
}
const fn default_forced_brave() -> f32 {
    100.0
}
const fn default_forced_default() -> f32 {
    95.0
}
const fn default_sleep_detection_radius() -> f32 {
    30.0
}
const fn default_sleep_search_interval() -> f32 {
    2.0
}
const fn default_sleep_arrival_distance() -> f32 {
    2.0
}
const fn default_sleep_seek_timeout() -> f32 {
    30.0
}
const fn default_sleep_duration() -> f32 {
    12.0
}

fn default_climbing_species() -> Vec<Species> {
    vec![Species::Cat]
}
const fn default_climb_check_interval() -> f32 {
    8.0
}
const fn default_climb_chance() -> f64 {
    0.25
}
const fn default_climb_hunger_limit() -> f32 {
    70.0
}
const fn default_climb_sleepiness_limit() -> f32 {
    90.0
}
const fn default_climb_detection_radius() -> f32 {
    20.0
}
const fn default_trunk_distance() -> f32 {
    1.5
}
const fn default_approach_timeout() -> f32 {
    20.0
}
const fn default_climb_duration() -> f32 {
    1.5
}
const fn default_height_ratio_min() -> f32 {
    2.3
}
const fn default_height_ratio_max() -> f32 {
    2.5
}
const fn default_rest_min() -> f32 {
    5.0
}
const fn default_rest_max() -> f32 {
    10.0
}
const fn default_ground_sample_radius() -> f32 {
    3.0
}

const fn default_shore_margin() -> f32 {
    1.5
}
const fn default_water_check_interval() -> f32 {
    6.0
}
const fn default_water_return_chance() -> f64 {
    0.3
}
const fn default_water_detection_radius() -> f32 {
    30.0
}
const fn default_depth_ratio() -> f32 {
    0.5
}
const fn default_water_arrival_distance() -> f32 {
    1.0
}
const fn default_swim_min() -> f32 {
    4.0
}
const fn default_swim_max() -> f32 {
    8.0
}
const fn default_water_timeout() -> f32 {
    20.0
}

const fn default_wander_radius() -> f32 {
    10.0
}
const fn default_wander_min_interval() -> f32 {
    3.0
}
const fn default_wander_max_interval() -> f32 {
    8.0
}
const fn default_wander_sample_radius() -> f32 {
    3.0
}
