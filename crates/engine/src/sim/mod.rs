mod activity;
mod bootstrap;
mod metrics;
mod runner;
mod timers;

pub use activity::{
    sample_busy_ms, sample_next_delay_ms, ActivityEngine, ActivityTimings, Phase,
};
pub use bootstrap::{
    Simulation, SimulationConfig, SimulationSetup, HUE_SHIFT_STEP_DEGREES, PALETTE_COUNT,
};
pub use metrics::EmissionRates;
pub use runner::{run_realtime, RunSummary, RunnerConfig, StopHandle, StopReason};
pub use timers::{Millis, TimerId, TimerQueue};
