#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resource abilities spend when they start.
pub trait ResourcePool {
    fn level(&self) -> f32;
    fn consume(&mut self, amount: f32);
}

/// Default stats holder: a single energy pool.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbilityStats {
    #[cfg_attr(feature = "serde", serde(default))]
    pub energy: f32,
}

impl AbilityStats {
    pub fn new(energy: f32) -> Self {
        Self { energy }
    }

    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy;
    }

    pub fn restore(&mut self, amount: f32) {
        self.energy += amount.max(0.0);
    }
}

impl ResourcePool for AbilityStats {
    fn level(&self) -> f32 {
        self.energy
    }

    fn consume(&mut self, amount: f32) {
        self.energy -= amount;
    }
}
