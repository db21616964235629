use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionRates {
    pub timers_per_sec: f32,
    pub events_per_sec: f32,
    pub events_total: u64,
    pub pending_timers: usize,
}

/// Counts fired timers and emitted events over fixed wall-clock windows.
#[derive(Debug)]
pub(crate) struct EmissionWindow {
    opened_at: Instant,
    length: Duration,
    timers: u64,
    events: u64,
}

impl EmissionWindow {
    pub(crate) fn open(length: Duration, at: Instant) -> Self {
        Self {
            opened_at: at,
            length,
            timers: 0,
            events: 0,
        }
    }

    pub(crate) fn count(&mut self, timers_fired: usize, events_emitted: u64) {
        self.timers = self.timers.saturating_add(timers_fired as u64);
        self.events = self.events.saturating_add(events_emitted);
    }

    /// Closes the window once it has run its length and starts the next one.
    pub(crate) fn close_if_elapsed(
        &mut self,
        now: Instant,
        events_total: u64,
        pending_timers: usize,
    ) -> Option<EmissionRates> {
        let span = now.saturating_duration_since(self.opened_at);
        if span < self.length {
            return None;
        }

        let seconds = span.as_secs_f32().max(f32::EPSILON);
        let rates = EmissionRates {
            timers_per_sec: self.timers as f32 / seconds,
            events_per_sec: self.events as f32 / seconds,
            events_total,
            pending_timers,
        };
        *self = Self::open(self.length, now);
        Some(rates)
    }
}
