#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Pending,
    Fired,
    Cancelled,
}

/// Restartable countdown advanced explicitly once per tick.
///
/// Starting a timer that is already pending replaces the in-flight countdown; requests are never
/// queued.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timer {
    duration: f32,
    remaining: f32,
    state: TimerState,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration: f32) {
        let duration = duration.max(0.0);
        self.duration = duration;
        self.remaining = duration;
        self.state = TimerState::Pending;
    }

    /// Counts down by `dt`.
    ///
    /// `Fired` is returned by the call that reaches zero. A timer that is not pending is left
    /// untouched and reports its current state.
    pub fn advance(&mut self, dt: f32) -> TimerState {
        if self.state != TimerState::Pending {
            return self.state;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        if self.remaining <= 0.0 {
            self.state = TimerState::Fired;
        }
        self.state
    }

    /// Returns `true` if a pending countdown was cancelled. The time already elapsed is kept.
    pub fn cancel(&mut self) -> bool {
        if self.state != TimerState::Pending {
            return false;
        }
        self.state = TimerState::Cancelled;
        true
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == TimerState::Pending
    }

    /// Time left while pending, zero otherwise.
    pub fn remaining(&self) -> f32 {
        if self.is_pending() {
            self.remaining
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.duration - self.remaining
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}
