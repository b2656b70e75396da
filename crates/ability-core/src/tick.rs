/// Frame information handed to every tick entry point.
///
/// `tick` and `fixed_tick` are driven at independent cadences, so the driver keeps one context
/// per cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }

    /// Context for the following frame with the same `dt`.
    pub fn next(self) -> Self {
        Self {
            tick: self.tick.wrapping_add(1),
            dt_seconds: self.dt_seconds,
        }
    }

    pub(crate) fn dt(&self) -> f32 {
        self.dt_seconds.max(0.0)
    }
}
