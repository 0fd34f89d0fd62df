//! Configuration loading and typed config structures for the Menagerie simulation.
//!
//! The canonical configuration lives in `menagerie-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads and parses the file. The per-behavior
//! sections (`needs`, `feeding`, `sleeping`, `climbing`, `water`, `wander`)
//! sit at the top level of the file and are collected into a
//! [`BehaviorConfig`].

use std::path::Path;

use menagerie_agents::BehaviorConfig;
use menagerie_types::{DietFlags, FoodType, Habitat, LocomotionScale, Personality, Species};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `menagerie-config.yaml`. All fields have
/// defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, timing, scatter counts).
    #[serde(default)]
    pub world: WorldConfig,

    /// Need model and autonomous seeker tunables.
    #[serde(flatten)]
    pub behavior: BehaviorConfig,

    /// Two-pet interaction parameters.
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Gathering coordinator parameters.
    #[serde(default)]
    pub gathering: GatheringConfig,

    /// Pet roster.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated seconds per tick.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,

    /// Real-time milliseconds between ticks (0 runs as fast as possible).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 runs until interrupted).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Half the side length of the square navigable plane.
    #[serde(default = "default_half_extent")]
    pub half_extent: f32,

    /// Trees scattered at startup.
    #[serde(default = "default_tree_count")]
    pub trees: u32,

    /// Food items scattered at startup.
    #[serde(default = "default_food_count")]
    pub food_items: u32,

    /// Water zones scattered at startup.
    #[serde(default = "default_water_zone_count")]
    pub water_zones: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            fixed_dt: default_fixed_dt(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            half_extent: default_half_extent(),
            trees: default_tree_count(),
            food_items: default_food_count(),
            water_zones: default_water_zone_count(),
        }
    }
}

/// Interaction matching and choreography parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionConfig {
    /// Seconds between pair scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: f32,

    /// Maximum distance between two pets for a match.
    #[serde(default = "default_match_radius")]
    pub match_radius: f32,

    /// Probability that an eligible pair actually starts.
    #[serde(default = "default_start_chance")]
    pub start_chance: f64,

    /// Seconds before the same pair may interact again.
    #[serde(default = "default_pair_cooldown")]
    pub pair_cooldown: f32,

    /// Radius used to snap a pet back onto the navigation surface.
    #[serde(default = "default_repair_radius")]
    pub repair_radius: f32,

    /// Seconds to wait after re-registering a repaired agent.
    #[serde(default = "default_stabilization_wait")]
    pub stabilization_wait: f32,

    /// Seconds to wait for both pets to reach their positions.
    #[serde(default = "default_positioning_timeout")]
    pub positioning_timeout: f32,

    /// Distance at which a pet counts as positioned.
    #[serde(default = "default_arrival_distance")]
    pub arrival_distance: f32,

    /// Race parameters.
    #[serde(default)]
    pub race: RaceConfig,

    /// Sleep-together parameters.
    #[serde(default)]
    pub sleep_together: SleepTogetherConfig,

    /// Walk-together parameters.
    #[serde(default)]
    pub walk_together: WalkTogetherConfig,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            match_radius: default_match_radius(),
            start_chance: default_start_chance(),
            pair_cooldown: default_pair_cooldown(),
            repair_radius: default_repair_radius(),
            stabilization_wait: default_stabilization_wait(),
            positioning_timeout: default_positioning_timeout(),
            arrival_distance: default_arrival_distance(),
            race: RaceConfig::default(),
            sleep_together: SleepTogetherConfig::default(),
            walk_together: WalkTogetherConfig::default(),
        }
    }
}

/// Rabbit-and-turtle race parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RaceConfig {
    /// Minimum navigable course length.
    #[serde(default = "default_course_length")]
    pub course_length: f32,

    /// Random directions tried before falling back to the default course.
    #[serde(default = "default_course_attempts")]
    pub course_attempts: u32,

    /// Distance between the two racers on the start line.
    #[serde(default = "default_start_spacing")]
    pub start_spacing: f32,

    /// Seconds both racers stand still on the start line.
    #[serde(default = "default_tension_duration")]
    pub tension_duration: f32,

    /// Rabbit speed before its nap.
    #[serde(default = "default_rabbit_speed")]
    pub rabbit_speed: f32,

    /// Rabbit speed multiplier after waking up.
    #[serde(default = "default_wake_multiplier")]
    pub wake_multiplier: f32,

    /// Turtle speed.
    #[serde(default = "default_turtle_speed")]
    pub turtle_speed: f32,

    /// Rabbit progress at which it falls asleep.
    #[serde(default = "default_sleep_progress")]
    pub sleep_progress: f32,

    /// Turtle progress at which the rabbit wakes.
    #[serde(default = "default_wake_progress")]
    pub wake_progress: f32,

    /// Remaining distance at which a racer has finished.
    #[serde(default = "default_finish_distance")]
    pub finish_distance: f32,

    /// Hard stop in seconds.
    #[serde(default = "default_race_timeout")]
    pub timeout: f32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            course_length: default_course_length(),
            course_attempts: default_course_attempts(),
            start_spacing: default_start_spacing(),
            tension_duration: default_tension_duration(),
            rabbit_speed: default_rabbit_speed(),
            wake_multiplier: default_wake_multiplier(),
            turtle_speed: default_turtle_speed(),
            sleep_progress: default_sleep_progress(),
            wake_progress: default_wake_progress(),
            finish_distance: default_finish_distance(),
            timeout: default_race_timeout(),
        }
    }
}

/// Sleep-together parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SleepTogetherConfig {
    /// Spacing between two large pets.
    #[serde(default = "default_spacing_large")]
    pub spacing_large: f32,

    /// Spacing between a large and a small pet.
    #[serde(default = "default_spacing_mixed")]
    pub spacing_mixed: f32,

    /// Spacing between two small pets.
    #[serde(default = "default_spacing_small")]
    pub spacing_small: f32,

    /// How far each pet leans into the gap once in place.
    #[serde(default = "default_overlap")]
    pub overlap: f32,

    /// Shared approach speed.
    #[serde(default = "default_approach_speed")]
    pub approach_speed: f32,

    /// Seconds of shared sleep.
    #[serde(default = "default_shared_sleep")]
    pub duration: f32,

    /// Minimum seconds between micro-movements.
    #[serde(default = "default_blip_min")]
    pub blip_min: f32,

    /// Maximum seconds between micro-movements.
    #[serde(default = "default_blip_max")]
    pub blip_max: f32,

    /// Maximum position jitter of a micro-movement.
    #[serde(default = "default_jitter")]
    pub jitter: f32,
}

impl Default for SleepTogetherConfig {
    fn default() -> Self {
        Self {
            spacing_large: default_spacing_large(),
            spacing_mixed: default_spacing_mixed(),
            spacing_small: default_spacing_small(),
            overlap: default_overlap(),
            approach_speed: default_approach_speed(),
            duration: default_shared_sleep(),
            blip_min: default_blip_min(),
            blip_max: default_blip_max(),
            jitter: default_jitter(),
        }
    }
}

/// Walk-together parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalkTogetherConfig {
    /// Distance to the shared destination.
    #[serde(default = "default_walk_distance")]
    pub distance: f32,

    /// Lateral distance between the two walkers.
    #[serde(default = "default_walk_side_offset")]
    pub side_offset: f32,

    /// Seconds before the walk is called off.
    #[serde(default = "default_walk_timeout")]
    pub timeout: f32,
}

impl Default for WalkTogetherConfig {
    fn default() -> Self {
        Self {
            distance: default_walk_distance(),
            side_offset: default_walk_side_offset(),
            timeout: default_walk_timeout(),
        }
    }
}

/// Gathering coordinator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatheringConfig {
    /// Radius the slot grid must fit in.
    #[serde(default = "default_gather_radius")]
    pub radius: f32,

    /// Slot jitter as a fraction of grid spacing.
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f32,

    /// Locomotion multipliers for the rally run.
    #[serde(default = "default_rally_scale")]
    pub rally: LocomotionScale,

    /// Escalating sample radii used to validate a slot.
    #[serde(default = "default_resample_radii")]
    pub resample_radii: Vec<f32>,

    /// Minimum distance between a leftover pet and any occupied slot.
    #[serde(default = "default_leftover_spacing")]
    pub leftover_spacing: f32,

    /// Seconds after assignment before stuck detection starts.
    #[serde(default = "default_stuck_grace")]
    pub stuck_grace: f32,

    /// Seconds below the stuck speed before a pet counts as stuck.
    #[serde(default = "default_stuck_timeout")]
    pub stuck_timeout: f32,

    /// Speed under which a pet may be stuck.
    #[serde(default = "default_stuck_speed")]
    pub stuck_speed: f32,

    /// Maximum offset of the single reroute attempt.
    #[serde(default = "default_reroute_offset")]
    pub reroute_offset: f32,

    /// Distance at which a pet counts as arrived at its slot.
    #[serde(default = "default_gather_arrival")]
    pub arrival_distance: f32,

    /// Turn rate in degrees per second when facing the camera.
    #[serde(default = "default_face_speed")]
    pub face_speed: f32,

    /// Angle in degrees under which a pet counts as facing the camera.
    #[serde(default = "default_face_tolerance")]
    pub face_tolerance: f32,

    /// Seconds before facing the camera gives up.
    #[serde(default = "default_face_timeout")]
    pub face_timeout: f32,
}

impl Default for GatheringConfig {
    fn default() -> Self {
        Self {
            radius: default_gather_radius(),
            jitter_ratio: default_jitter_ratio(),
            rally: default_rally_scale(),
            resample_radii: default_resample_radii(),
            leftover_spacing: default_leftover_spacing(),
            stuck_grace: default_stuck_grace(),
            stuck_timeout: default_stuck_timeout(),
            stuck_speed: default_stuck_speed(),
            reroute_offset: default_reroute_offset(),
            arrival_distance: default_gather_arrival(),
            face_speed: default_face_speed(),
            face_tolerance: default_face_tolerance(),
            face_timeout: default_face_timeout(),
        }
    }
}

/// Pet roster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Pets spawned at startup.
    #[serde(default = "default_roster")]
    pub pets: Vec<PetSpec>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            pets: default_roster(),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PetSpec {
    /// Display name.
    pub name: String,
    /// Species tag.
    pub species: Species,
    /// Personality tag.
    #[serde(default = "default_personality")]
    pub personality: Personality,
    /// Habitat tag.
    #[serde(default = "default_habitat")]
    pub habitat: Habitat,
    /// Foods the pet eats.
    #[serde(default)]
    pub diet: Vec<FoodType>,
    /// Starting hunger.
    #[serde(default)]
    pub hunger: f32,
    /// Starting sleepiness.
    #[serde(default)]
    pub sleepiness: f32,
    /// Base speed override.
    #[serde(default)]
    pub speed: Option<f32>,
}

impl PetSpec {
    /// Diet as a bitmask.
    pub fn diet_flags(&self) -> DietFlags {
        self.diet
            .iter()
            .fold(DietFlags::empty(), |flags, food| flags | DietFlags::from(*food))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Menagerie".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_fixed_dt() -> f32 {
    0.1
}

const fn default_tick_interval_ms() -> u64 {
    0
}

const fn default_max_ticks() -> u64 {
    6000
}

const fn default_half_extent() -> f32 {
    150.0
}

const fn default_tree_count() -> u32 {
    8
}

const fn default_food_count() -> u32 {
    12
}

const fn default_water_zone_count() -> u32 {
    2
}

const fn default_scan_interval() -> f32 {
    2.0
}

const fn default_match_radius() -> f32 {
    15.0
}

const fn default_start_chance() -> f64 {
    0.3
}

const fn default_pair_cooldown() -> f32 {
    60.0
}

const fn default_repair_radius() -> f32 {
    5.0
}

const fn default_stabilization_wait() -> f32 {
    0.2
}

const fn default_positioning_timeout() -> f32 {
    15.0
}

const fn default_arrival_distance() -> f32 {
    1.0
}

const fn default_course_length() -> f32 {
    80.0
}

const fn default_course_attempts() -> u32 {
    10
}

const fn default_start_spacing() -> f32 {
    1.5
}

const fn default_tension_duration() -> f32 {
    1.5
}

const fn default_rabbit_speed() -> f32 {
    6.0
}

const fn default_wake_multiplier() -> f32 {
    1.5
}

const fn default_turtle_speed() -> f32 {
    1.5
}

const fn default_sleep_progress() -> f32 {
    0.35
}

const fn default_wake_progress() -> f32 {
    0.9
}

const fn default_finish_distance() -> f32 {
    1.5
}

const fn default_race_timeout() -> f32 {
    180.0
}

const fn default_spacing_large() -> f32 {
    5.0
}

const fn default_spacing_mixed() -> f32 {
    3.0
}

const fn default_spacing_small() -> f32 {
    2.0
}

const fn default_overlap() -> f32 {
    0.2
}

const fn default_approach_speed() -> f32 {
    2.0
}

const fn default_shared_sleep() -> f32 {
    15.0
}

const fn default_blip_min() -> f32 {
    2.5
}

const fn default_blip_max() -> f32 {
    5.0
}

const fn default_jitter() -> f32 {
    0.1
}

const fn default_walk_distance() -> f32 {
    20.0
}

const fn default_walk_side_offset() -> f32 {
    1.0
}

const fn default_walk_timeout() -> f32 {
    30.0
}

const fn default_gather_radius() -> f32 {
    6.0
}

const fn default_jitter_ratio() -> f32 {
    0.3
}

const fn default_rally_scale() -> LocomotionScale {
    LocomotionScale {
        speed: 4.0,
        angular_speed: 4.0,
        acceleration: 4.0,
        stopping_distance: 3.0,
    }
}

fn default_resample_radii() -> Vec<f32> {
    vec![1.0, 3.0, 6.0]
}

const fn default_leftover_spacing() -> f32 {
    1.5
}

const fn default_stuck_grace() -> f32 {
    7.0
}

const fn default_stuck_timeout() -> f32 {
    5.0
}

const fn default_stuck_speed() -> f32 {
    0.1
}

const fn default_reroute_offset() -> f32 {
    2.0
}

const fn default_gather_arrival() -> f32 {
    1.5
}

const fn default_face_speed() -> f32 {
    180.0
}

const fn default_face_tolerance() -> f32 {
    5.0
}

const fn default_face_timeout() -> f32 {
    3.0
}

const fn default_personality() -> Personality {
    Personality::Playful
}

const fn default_habitat() -> Habitat {
    Habitat::Field
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_roster() -> Vec<PetSpec> {
    let entry = |name: &str,
                 species: Species,
                 personality: Personality,
                 habitat: Habitat,
                 diet: &[FoodType]| PetSpec {
        name: name.to_owned(),
        species,
        personality,
        habitat,
        diet: diet.to_vec(),
        hunger: 0.0,
        sleepiness: 0.0,
        speed: None,
    };
    vec![
        entry(
            "Clover",
            Species::Rabbit,
            Personality::Playful,
            Habitat::Field,
            &[FoodType::FruitsAndVegetables, FoodType::Grass],
        ),
        entry(
            "Shelly",
            Species::Turtle,
            Personality::Lazy,
            Habitat::Field,
            &[FoodType::FruitsAndVegetables, FoodType::Insects],
        ),
        entry(
            "Grey",
            Species::Wolf,
            Personality::Brave,
            Habitat::Forest,
            &[FoodType::Meat],
        ),
        entry(
            "Biscuit",
            Species::Dog,
            Personality::Curious,
            Habitat::Field,
            &[FoodType::Meat, FoodType::Fish],
        ),
        entry(
            "Mittens",
            Species::Cat,
            Personality::Shy,
            Habitat::Forest,
            &[FoodType::Fish, FoodType::Meat],
        ),
        entry(
            "Acorn",
            Species::Squirrel,
            Personality::Curious,
            Habitat::Tree,
            &[FoodType::Nuts],
        ),
        entry(
            "Puddles",
            Species::Duck,
            Personality::Playful,
            Habitat::Water,
            &[FoodType::Insects, FoodType::Fish],
        ),
        entry(
            "Clyde",
            Species::Horse,
            Personality::Lazy,
            Habitat::Fence,
            &[FoodType::Grass, FoodType::FruitsAndVegetables],
        ),
    ]
}
