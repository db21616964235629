use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use super::bootstrap::Simulation;
use super::metrics::{EmissionRates, EmissionWindow};
use super::timers::Millis;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Stop after this much wall-clock time; run until stopped when absent.
    pub max_runtime: Option<Duration>,
    pub max_sleep: Duration,
    pub summary_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_runtime: None,
            max_sleep: Duration::from_millis(250),
            summary_interval: Duration::from_secs(10),
        }
    }
}

/// Cloneable flag that asks a running loop to return. Sinks can hold a
/// clone to end the run once their output is gone.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    MaxRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub virtual_ms: Millis,
    pub timers_fired: u64,
    pub events_emitted: u64,
    /// Rates of the last completed summary window, if one closed.
    pub last_rates: Option<EmissionRates>,
}

/// Drives `simulation` against the wall clock until stopped, then stops it.
pub fn run_realtime(
    simulation: &mut Simulation,
    config: &RunnerConfig,
    stop: &StopHandle,
) -> RunSummary {
    let max_sleep = normalize_non_zero_duration(config.max_sleep, Duration::from_millis(250));
    let summary_interval =
        normalize_non_zero_duration(config.summary_interval, Duration::from_secs(10));
    info!(
        max_runtime_ms = ?config.max_runtime.map(|limit| limit.as_millis() as u64),
        max_sleep_ms = max_sleep.as_millis() as u64,
        summary_interval_ms = summary_interval.as_millis() as u64,
        "runner_config"
    );

    let started = Instant::now();
    let clock_origin = simulation.now();
    let events_at_start = simulation.events_emitted();
    let mut window = EmissionWindow::open(summary_interval, started);
    let mut last_rates = None;
    let mut timers_fired = 0u64;
    let mut stalled = Duration::ZERO;

    let reason = loop {
        if stop.is_requested() {
            info!(reason = "stop_requested", "shutdown_requested");
            break StopReason::Requested;
        }
        let elapsed = Instant::now().saturating_duration_since(started);
        if config.max_runtime.is_some_and(|limit| elapsed >= limit) {
            info!(reason = "max_runtime", "shutdown_requested");
            break StopReason::MaxRuntime;
        }

        let events_before = simulation.events_emitted();
        let virtual_elapsed = elapsed.saturating_sub(stalled);
        let target = clock_origin.saturating_add(virtual_elapsed.as_millis() as Millis);
        let advance_started = Instant::now();
        let fired = simulation.advance_to(target);
        // Wall time spent inside timer callbacks (a blocking layout fetch)
        // does not advance the virtual clock.
        stalled += advance_started.elapsed();
        timers_fired = timers_fired.saturating_add(fired as u64);
        window.count(fired, simulation.events_emitted() - events_before);

        if let Some(rates) = window.close_if_elapsed(
            Instant::now(),
            simulation.events_emitted(),
            simulation.pending_timers(),
        ) {
            info!(
                virtual_ms = simulation.now(),
                timers_per_sec = rates.timers_per_sec,
                events_per_sec = rates.events_per_sec,
                events_total = rates.events_total,
                pending_timers = rates.pending_timers,
                "simulation_metrics"
            );
            last_rates = Some(rates);
        }

        let mut sleep = compute_idle_sleep(simulation.now(), simulation.next_deadline(), max_sleep);
        let elapsed = Instant::now().saturating_duration_since(started);
        if let Some(limit) = config.max_runtime {
            sleep = sleep.min(limit.saturating_sub(elapsed));
        }
        if sleep > Duration::ZERO {
            thread::sleep(sleep);
        }
    };

    simulation.stop();
    let summary = RunSummary {
        reason,
        virtual_ms: simulation.now(),
        timers_fired,
        events_emitted: simulation.events_emitted() - events_at_start,
        last_rates,
    };
    info!(
        virtual_ms = summary.virtual_ms,
        timers_fired = summary.timers_fired,
        events_emitted = summary.events_emitted,
        "runner_finished"
    );
    summary
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Time until the next deadline, capped so stop requests are noticed.
fn compute_idle_sleep(now: Millis, next_deadline: Option<Millis>, max_sleep: Duration) -> Duration {
    match next_deadline {
        Some(deadline) if deadline <= now => Duration::ZERO,
        Some(deadline) => Duration::from_millis(deadline - now).min(max_sleep),
        None => max_sleep,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::layout::{LayoutLoadError, LayoutStore};
    use crate::protocol::{EventLog, EventSink, SceneEvent};
    use crate::roster::AgentId;
    use crate::sim::{SimulationConfig, SimulationSetup};

    #[derive(Clone, Default)]
    struct StartTimes(Arc<Mutex<Vec<(AgentId, Instant)>>>);

    impl EventSink for StartTimes {
        fn emit(&mut self, event: SceneEvent) {
            if let SceneEvent::ActivityStarted { agent_id, .. } = event {
                self.0.lock().expect("start times").push((agent_id, Instant::now()));
            }
        }
    }

    fn quick_simulation(log: &EventLog) -> Simulation {
        let store = LayoutStore::new(|| {
            Err::<String, _>(LayoutLoadError::Status {
                url: "http://localhost/layout.json".to_string(),
                status: 500,
            })
        });
        let setup = SimulationSetup::new(store, log.clone()).with_config(SimulationConfig {
            asset_settle_delay_ms: 10,
            rng_seed: Some(3),
            ..SimulationConfig::default()
        });
        Simulation::start(None, setup)
    }

    #[test]
    fn idle_sleep_targets_next_deadline() {
        let cap = Duration::from_millis(250);
        assert_eq!(compute_idle_sleep(100, Some(100), cap), Duration::ZERO);
        assert_eq!(compute_idle_sleep(100, Some(50), cap), Duration::ZERO);
        assert_eq!(
            compute_idle_sleep(100, Some(140), cap),
            Duration::from_millis(40)
        );
        assert_eq!(compute_idle_sleep(100, Some(5_000), cap), cap);
        assert_eq!(compute_idle_sleep(100, None, cap), cap);
    }

    #[test]
    fn zero_durations_fall_back() {
        let fallback = Duration::from_millis(250);
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, fallback),
            fallback
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn runs_until_max_runtime_then_stops_simulation() {
        let log = EventLog::new();
        let mut simulation = quick_simulation(&log);
        let config = RunnerConfig {
            max_runtime: Some(Duration::from_millis(300)),
            max_sleep: Duration::from_millis(20),
            ..RunnerConfig::default()
        };

        let summary = run_realtime(&mut simulation, &config, &StopHandle::default());

        assert_eq!(summary.reason, StopReason::MaxRuntime);
        assert!(summary.virtual_ms >= 10);
        assert!(log.kinds().contains(&"forceGameMode"));
        assert!(!simulation.is_running());
        assert_eq!(simulation.pending_timers(), 0);
    }

    #[test]
    fn stop_request_returns_promptly() {
        let log = EventLog::new();
        let mut simulation = quick_simulation(&log);
        let stop = StopHandle::default();
        stop.request_stop();

        let summary = run_realtime(&mut simulation, &RunnerConfig::default(), &stop);
        assert_eq!(summary.reason, StopReason::Requested);
        assert_eq!(summary.timers_fired, 0);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn stop_from_another_thread_ends_the_loop() {
        let log = EventLog::new();
        let mut simulation = quick_simulation(&log);
        let stop = StopHandle::default();
        let remote = stop.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.request_stop();
        });

        let summary = run_realtime(
            &mut simulation,
            &RunnerConfig {
                max_sleep: Duration::from_millis(10),
                ..RunnerConfig::default()
            },
            &stop,
        );
        stopper.join().expect("stopper thread");
        assert_eq!(summary.reason, StopReason::Requested);
        assert!(summary.events_emitted >= 1);
    }

    #[test]
    fn slow_layout_load_keeps_agent_starts_staggered() {
        let store = LayoutStore::new(|| {
            thread::sleep(Duration::from_millis(300));
            Err::<String, _>(LayoutLoadError::Status {
                url: "http://localhost/layout.json".to_string(),
                status: 504,
            })
        });
        let starts = StartTimes::default();
        let setup = SimulationSetup::new(store, starts.clone()).with_config(SimulationConfig {
            asset_settle_delay_ms: 10,
            rng_seed: Some(9),
            ..SimulationConfig::default()
        });
        let mut simulation = Simulation::start(None, setup);

        run_realtime(
            &mut simulation,
            &RunnerConfig {
                max_runtime: Some(Duration::from_millis(1_100)),
                max_sleep: Duration::from_millis(10),
                ..RunnerConfig::default()
            },
            &StopHandle::default(),
        );

        let starts = starts.0.lock().expect("start times").clone();
        assert!(starts.len() >= 2, "starts: {starts:?}");
        assert_eq!((starts[0].0, starts[1].0), (1, 2));
        let gap = starts[1].1.saturating_duration_since(starts[0].1);
        assert!(gap >= Duration::from_millis(450), "gap: {gap:?}");
    }

    #[test]
    fn summary_carries_last_completed_window() {
        let log = EventLog::new();
        let mut simulation = quick_simulation(&log);
        let summary = run_realtime(
            &mut simulation,
            &RunnerConfig {
                max_runtime: Some(Duration::from_millis(200)),
                max_sleep: Duration::from_millis(10),
                summary_interval: Duration::from_millis(50),
            },
            &StopHandle::default(),
        );

        let rates = summary.last_rates.expect("a window closed");
        assert!(rates.events_total >= 4);
        assert!(rates.events_total <= simulation.events_emitted());
    }
}
