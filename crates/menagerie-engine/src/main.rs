//! Engine binary for the Menagerie simulation.
//!
//! This is the main entry point that wires together the tick cycle, the
//! world scatter, the roster spawner, and operator controls. It loads
//! configuration, initializes all subsystems, and runs the simulation loop
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `menagerie-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation state (clock, navigation plane, seeded RNG)
//! 4. Scatter trees, food, areas, and water
//! 5. Spawn the roster
//! 6. Create operator state, hook Ctrl-C to a clean stop, and start the
//!    stdin console (see [`console`])
//! 7. Run the simulation loop with the demo script
//! 8. Log the result

mod console;
mod error;
mod script;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use menagerie_core::config::{LoggingConfig, SimulationConfig};
use menagerie_core::operator::OperatorState;
use menagerie_core::runner;
use menagerie_core::tick::SimulationState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::script::DemoScript;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "menagerie-config.yaml";

/// Tick on which the demo gathers every pet.
const DEMO_GATHER_TICK: u64 = 300;

/// Tick on which the demo calls the gather off.
const DEMO_CANCEL_TICK: u64 = 600;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        fixed_dt = config.world.fixed_dt,
        tick_interval_ms = config.world.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the simulation state.
    let mut state = SimulationState::new(&config).map_err(EngineError::from)?;
    info!(half_extent = config.world.half_extent, "Simulation state created");

    // 4. Scatter the world.
    spawner::scatter_world(&mut state, &config.world);

    // 5. Spawn the roster.
    let ids = spawner::spawn_roster(&mut state, &config.population.pets, config.world.half_extent)?;
    info!(pets = ids.len(), "Pets spawned");

    // 6. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        config.world.max_ticks,
        0,
    ));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping after the current tick");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if let Err(e) = console::run(console::stdin_lines(), &operator).await {
                warn!(error = %e, "Operator console closed");
            }
        });
    }

    // 7. Run the simulation.
    let mut callback = DemoScript::new(DEMO_GATHER_TICK, DEMO_CANCEL_TICK);
    let result = runner::run_simulation(&mut state, &operator, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 8. Log results.
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "menagerie-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `menagerie-config.yaml`, or the
/// defaults when the file is absent.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(SimulationConfig::default());
    }
    SimulationConfig::from_file(config_path).map_err(|source| EngineError::ConfigLoad {
        path: config_path.to_path_buf(),
        source,
    })
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        reason: e.to_string(),
    })
}
