use crate::eval::lock::lock_time_ms;
use crate::foundation::core::Elapsed;
use crate::scene::mapping::CharMapping;
use crate::scene::settings::Settings;

/// Extra time held on the fully locked title before the timeline ends.
pub const END_HOLD_MS: f64 = 500.0;

/// Timeline length: the last lock (default or explicit) plus [`END_HOLD_MS`].
pub fn end_time_ms(settings: &Settings, mappings: &[CharMapping]) -> f64 {
    let m = &settings.motion;
    let n = settings.char_count();
    let default_end = m.duration_ms + n as f64 * m.stagger_ms;
    let last_lock = (0..n)
        .map(|i| lock_time_ms(i, mappings.get(i), m))
        .fold(f64::NEG_INFINITY, f64::max);
    default_end.max(last_lock) + END_HOLD_MS
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockState {
    Idle,
    /// Playing; `start` is the wall-clock instant (ms) that maps to `t = 0`.
    Running { start: f64 },
    /// Manual time; the wall clock is ignored.
    Scrubbing(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockTick {
    pub elapsed: Elapsed,
    /// Set exactly once, on the tick that ran past the end. The clock is idle afterwards.
    pub finished: bool,
}

#[derive(Clone, Debug)]
pub struct PlaybackClock {
    state: ClockState,
    end_ms: f64,
    last_running_ms: f64,
}

impl PlaybackClock {
    pub fn new(end_ms: f64) -> Self {
        Self {
            state: ClockState::Idle,
            end_ms,
            last_running_ms: 0.0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn end_ms(&self) -> f64 {
        self.end_ms
    }

    pub fn set_end_ms(&mut self, end_ms: f64) {
        self.end_ms = end_ms;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    pub fn start(&mut self, now_ms: f64) {
        tracing::debug!(now_ms, end_ms = self.end_ms, "playback started");
        self.state = ClockState::Running { start: now_ms };
        self.last_running_ms = 0.0;
    }

    pub fn stop(&mut self) {
        if self.state != ClockState::Idle {
            tracing::debug!("playback stopped");
        }
        self.state = ClockState::Idle;
    }

    /// Enter manual time (`Some`) or leave it (`None`, back to idle).
    pub fn scrub(&mut self, t: Option<f64>) {
        self.state = match t {
            Some(t) => ClockState::Scrubbing(t),
            None => ClockState::Idle,
        };
    }

    /// Advance to wall-clock `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> ClockTick {
        match self.state {
            ClockState::Running { start } => {
                let elapsed = now_ms - start;
                if elapsed > self.end_ms {
                    tracing::debug!(elapsed, "playback finished");
                    self.state = ClockState::Idle;
                    ClockTick {
                        elapsed: Elapsed::Stopped,
                        finished: true,
                    }
                } else {
                    self.last_running_ms = elapsed;
                    ClockTick {
                        elapsed: Elapsed::At(elapsed),
                        finished: false,
                    }
                }
            }
            _ => ClockTick {
                elapsed: self.elapsed(),
                finished: false,
            },
        }
    }

    /// Timeline time as of the last tick.
    pub fn elapsed(&self) -> Elapsed {
        match self.state {
            ClockState::Idle => Elapsed::Stopped,
            ClockState::Running { .. } => Elapsed::At(self.last_running_ms),
            ClockState::Scrubbing(t) => Elapsed::At(t),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/clock.rs"]
mod tests;
