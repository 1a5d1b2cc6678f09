//! Self-rearming periodic tick.
//!
//! A single-shot timer is armed one period ahead after every tick. A late
//! tick simply delays the next one; there is no catch-up.

/// Single-shot timer used to schedule the next tick.
pub trait TickTimer {
    fn start(&mut self, period_ms: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickScheduler {
    period_ms: u32,
    ticks: u32,
}

impl TickScheduler {
    /// Scheduler firing at `frequency_hz` (clamped to 1..=1000).
    pub const fn from_hz(frequency_hz: u32) -> Self {
        let hz = if frequency_hz == 0 {
            1
        } else if frequency_hz > 1000 {
            1000
        } else {
            frequency_hz
        };
        Self {
            period_ms: 1000 / hz,
            ticks: 0,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Ticks handled so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Arm the timer one period ahead.
    pub fn schedule_next(&self, timer: &mut dyn TickTimer) {
        timer.start(self.period_ms);
    }

    /// Count a tick that has just run and arm the next one.
    pub fn complete(&mut self, timer: &mut dyn TickTimer) {
        self.ticks = self.ticks.wrapping_add(1);
        self.schedule_next(timer);
    }
}
