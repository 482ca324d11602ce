//! Simulated clock holding the two independent cadences: frame ticks and
//! enemy spawns. Used by headless runs in place of real timers.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent {
    Frame,
    Spawn,
}

/// A fixed-period trigger.
#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    next_due: Duration,
}

impl Cadence {
    pub fn new(period: Duration, first_due: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: first_due,
        }
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    fn fire(&mut self) -> Duration {
        let due = self.next_due;
        self.next_due += self.period;
        due
    }
}

#[derive(Debug, Clone)]
pub struct Timeline {
    now: Duration,
    frames: Cadence,
    spawns: Cadence,
}

impl Timeline {
    /// Frames start immediately; the first spawn waits one full spawn period.
    pub fn new(frame_period: Duration, spawn_period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frames: Cadence::new(frame_period, Duration::ZERO),
            spawns: Cadence::new(spawn_period, spawn_period),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Pops the earliest event due strictly before `until`. A frame wins an
    /// exact tie with a spawn.
    pub fn next_before(&mut self, until: Duration) -> Option<TimelineEvent> {
        let (cadence, event) = if self.frames.next_due() <= self.spawns.next_due() {
            (&mut self.frames, TimelineEvent::Frame)
        } else {
            (&mut self.spawns, TimelineEvent::Spawn)
        };
        if cadence.next_due() >= until {
            self.now = until;
            return None;
        }
        self.now = cadence.fire();
        Some(event)
    }
}
