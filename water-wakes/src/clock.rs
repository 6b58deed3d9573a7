/// Fixed-timestep accumulator decoupling simulation ticks from frame time.
///
/// Elapsed wall-clock time is summed until it exceeds the tick interval;
/// then one tick is due and the sum starts again from zero. Time beyond one
/// interval is discarded, so a slow host runs the simulation slower than
/// real time instead of bursting several ticks to catch up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    interval: f64,
    accumulated: f64,
}

impl FixedTimestep {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            accumulated: 0.0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Add `elapsed` seconds; returns true when a tick should run now.
    pub fn advance(&mut self, elapsed: f64) -> bool {
        self.accumulated += elapsed.max(0.0);
        if self.accumulated > self.interval {
            self.accumulated = 0.0;
            true
        } else {
            false
        }
    }
}
