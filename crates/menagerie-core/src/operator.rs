//! Operator control state for a running simulation.
//!
//! The tick loop and whoever drives it from outside (a signal handler, a
//! scripted scenario) share an [`OperatorState`] behind an [`Arc`]. Flags
//! are atomics so the loop can read them without locking; queued commands
//! sit behind a `tokio` mutex and are drained into the simulation state
//! before each tick.
//!
//! [`Arc`]: std::sync::Arc

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::tick::Command;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured wall-clock limit.
    MaxRealTimeReached,
    /// An operator asked the loop to stop.
    OperatorStop,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the loop is paused.
    paused: AtomicBool,

    /// Wakes the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Delay between ticks in milliseconds.
    tick_interval_ms: AtomicU64,

    /// When the loop was set up.
    started_at: Instant,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// Commands waiting to be handed to the next tick.
    commands: Mutex<Vec<Command>>,

    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state for a bounded run.
    pub fn new(tick_interval_ms: u64, max_ticks: u64, max_real_time_seconds: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            started_at: Instant::now(),
            max_ticks,
            max_real_time_seconds,
            commands: Mutex::new(Vec::new()),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. It sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused or a stop was requested.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop before the next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the simulation ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// The reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Current delay between ticks in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the delay between ticks. Returns the previous delay.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Returns `true` if a wall-clock limit is set and has passed.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Whole seconds since the state was created.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Configured tick limit.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Configured wall-clock limit in seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a command for the next tick.
    pub async fn submit(&self, command: Command) {
        self.commands.lock().await.push(command);
    }

    /// Drain every queued command.
    pub async fn drain_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.lock().await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn pause_and_resume() {
        let operator = OperatorState::new(0, 0, 0);
        assert!(!operator.is_paused());
        operator.pause();
        assert!(operator.is_paused());
        operator.resume();
        assert!(!operator.is_paused());
    }

    #[test]
    fn stop_request() {
        let operator = OperatorState::new(0, 0, 0);
        assert!(!operator.is_stop_requested());
        operator.request_stop();
        assert!(operator.is_stop_requested());
    }

    #[tokio::test]
    async fn stop_releases_a_paused_loop() {
        let operator = std::sync::Arc::new(OperatorState::new(0, 0, 0));
        operator.pause();
        let waiter = {
            let operator = std::sync::Arc::clone(&operator);
            tokio::spawn(async move { operator.wait_if_paused().await })
        };
        tokio::task::yield_now().await;

        operator.request_stop();

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(operator.is_paused());
    }

    #[test]
    fn tick_limit_zero_means_unlimited() {
        let operator = OperatorState::new(0, 0, 0);
        assert!(!operator.tick_limit_reached(1_000_000));

        let bounded = OperatorState::new(0, 10, 0);
        assert!(!bounded.tick_limit_reached(9));
        assert!(bounded.tick_limit_reached(10));
    }

    #[test]
    fn time_limit_zero_means_unlimited() {
        let operator = OperatorState::new(0, 0, 0);
        assert!(!operator.time_limit_reached());
    }

    #[test]
    fn interval_swap_returns_previous() {
        let operator = OperatorState::new(50, 0, 0);
        assert_eq!(operator.set_tick_interval_ms(10), 50);
        assert_eq!(operator.tick_interval_ms(), 10);
    }

    #[tokio::test]
    async fn submitted_commands_drain_in_order() {
        let operator = OperatorState::new(0, 0, 0);
        operator.submit(Command::CancelGather).await;
        operator
            .submit(Command::Gather {
                target: Vec3::ZERO,
                camera: Vec3::new(0.0, 0.0, -10.0),
            })
            .await;

        let drained = operator.drain_commands().await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained.first(), Some(&Command::CancelGather));
        assert!(operator.drain_commands().await.is_empty());
    }
}
