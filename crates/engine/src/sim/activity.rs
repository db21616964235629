use rand::Rng;
use tracing::{debug, info};

use crate::protocol::{ActivityToken, AgentStatus, EventSink, SceneEvent};
use crate::roster::{Agent, AgentId, Roster};

use super::timers::{Millis, TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTimings {
    pub busy_min_ms: Millis,
    pub busy_max_ms: Millis,
    pub cooldown_ms: Millis,
    pub next_min_ms: Millis,
    pub next_max_ms: Millis,
    pub stagger_ms: Millis,
}

impl Default for ActivityTimings {
    fn default() -> Self {
        Self {
            busy_min_ms: 3_000,
            busy_max_ms: 10_000,
            cooldown_ms: 1_000,
            next_min_ms: 2_000,
            next_max_ms: 10_000,
            stagger_ms: 500,
        }
    }
}

impl ActivityTimings {
    /// Upper bound on any single phase wait.
    pub fn longest_phase_ms(&self) -> Millis {
        self.busy_max_ms
            .max(self.cooldown_ms)
            .max(self.next_max_ms)
    }
}

/// Uniform in `[min, max)`; collapses to `min` for an empty range.
fn sample_between<R: Rng + ?Sized>(rng: &mut R, min: Millis, max: Millis) -> Millis {
    if max <= min {
        min
    } else {
        rng.gen_range(min..max)
    }
}

pub fn sample_busy_ms<R: Rng + ?Sized>(timings: &ActivityTimings, rng: &mut R) -> Millis {
    sample_between(rng, timings.busy_min_ms, timings.busy_max_ms)
}

pub fn sample_next_delay_ms<R: Rng + ?Sized>(timings: &ActivityTimings, rng: &mut R) -> Millis {
    sample_between(rng, timings.next_min_ms, timings.next_max_ms)
}

/// What an agent does when its pending timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Busy { token: ActivityToken },
    Cooldown,
}

#[derive(Debug)]
struct AgentRuntime {
    agent: Agent,
    phase: Phase,
    timer: Option<TimerId>,
}

#[derive(Debug)]
pub struct ActivityEngine<R> {
    agents: Vec<AgentRuntime>,
    timers: TimerQueue<usize>,
    timings: ActivityTimings,
    rng: R,
    running: bool,
}

impl<R: Rng> ActivityEngine<R> {
    pub fn new(roster: &Roster, timings: ActivityTimings, rng: R) -> Self {
        let agents = roster
            .agents()
            .iter()
            .map(|agent| AgentRuntime {
                agent: agent.clone(),
                phase: Phase::Starting,
                timer: None,
            })
            .collect();
        Self {
            agents,
            timers: TimerQueue::new(),
            timings,
            rng,
            running: false,
        }
    }

    /// Schedules each agent's first activity at `now + index * stagger`.
    pub fn start(&mut self, now: Millis) {
        if self.running {
            return;
        }
        for (index, runtime) in self.agents.iter_mut().enumerate() {
            let first_at = now.saturating_add(index as Millis * self.timings.stagger_ms);
            runtime.phase = Phase::Starting;
            runtime.timer = Some(self.timers.schedule(first_at, index));
        }
        self.running = true;
        info!(
            agent_count = self.agents.len(),
            stagger_ms = self.timings.stagger_ms,
            "activity_simulation_started"
        );
    }

    /// Cancels every agent's pending timer. Safe to call repeatedly.
    pub fn stop(&mut self) -> usize {
        let mut cancelled = 0;
        for runtime in &mut self.agents {
            if let Some(timer) = runtime.timer.take() {
                if self.timers.cancel(timer).is_some() {
                    cancelled += 1;
                }
            }
        }
        if self.running {
            info!(cancelled_timers = cancelled, "activity_simulation_stopped");
        }
        self.running = false;
        cancelled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn phase(&self, agent_id: AgentId) -> Option<&Phase> {
        self.agents
            .iter()
            .find(|runtime| runtime.agent.id == agent_id)
            .map(|runtime| &runtime.phase)
    }

    /// Deadline of the agent's pending timer, if one is scheduled.
    pub fn scheduled_at(&self, agent_id: AgentId) -> Option<Millis> {
        self.agents
            .iter()
            .find(|runtime| runtime.agent.id == agent_id)
            .and_then(|runtime| runtime.timer)
            .and_then(|timer| self.timers.deadline_of(timer))
    }

    pub fn timings(&self) -> &ActivityTimings {
        &self.timings
    }

    /// Fires the earliest timer due at or before `now`, returning its deadline.
    pub fn fire_next(&mut self, now: Millis, sink: &mut dyn EventSink) -> Option<Millis> {
        let (deadline, _, index) = self.timers.pop_due(now)?;
        self.advance_agent(index, deadline, sink);
        Some(deadline)
    }

    /// Fires every timer due at or before `now`, including ones scheduled while firing.
    pub fn fire_due(&mut self, now: Millis, sink: &mut dyn EventSink) -> usize {
        let mut fired = 0;
        while self.fire_next(now, sink).is_some() {
            fired += 1;
        }
        fired
    }

    fn advance_agent(&mut self, index: usize, at: Millis, sink: &mut dyn EventSink) {
        let Some(runtime) = self.agents.get_mut(index) else {
            return;
        };
        runtime.timer = None;
        let agent_id = runtime.agent.id;
        let phase = std::mem::replace(&mut runtime.phase, Phase::Starting);

        let (next_phase, delay) = match phase {
            Phase::Starting => {
                let pick = self.rng.gen_range(0..runtime.agent.activities.len().max(1));
                let label = runtime
                    .agent
                    .activities
                    .get(pick)
                    .cloned()
                    .unwrap_or_default();
                let token = ActivityToken::new(agent_id, at);
                debug!(agent_id, token = %token, label = %label, at, "activity_started");
                sink.emit(SceneEvent::ActivityStarted {
                    agent_id,
                    activity_token: token.clone(),
                    label,
                });
                sink.emit(SceneEvent::StatusChanged {
                    agent_id,
                    status: AgentStatus::Active,
                });
                let busy = sample_busy_ms(&self.timings, &mut self.rng);
                (Phase::Busy { token }, busy)
            }
            Phase::Busy { token } => {
                debug!(agent_id, token = %token, at, "activity_finished");
                sink.emit(SceneEvent::ActivityFinished {
                    agent_id,
                    activity_token: token,
                });
                sink.emit(SceneEvent::StatusChanged {
                    agent_id,
                    status: AgentStatus::Waiting,
                });
                (Phase::Cooldown, self.timings.cooldown_ms)
            }
            Phase::Cooldown => {
                debug!(agent_id, at, "activities_cleared");
                sink.emit(SceneEvent::ActivitiesCleared { agent_id });
                sink.emit(SceneEvent::StatusChanged {
                    agent_id,
                    status: AgentStatus::Active,
                });
                let next = sample_next_delay_ms(&self.timings, &mut self.rng);
                (Phase::Starting, next)
            }
        };

        runtime.phase = next_phase;
        runtime.timer = Some(self.timers.schedule(at.saturating_add(delay), index));
    }
}
