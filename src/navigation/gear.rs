//! Front clearance to drive gear mapping

use super::sampler::DistanceSampler;
use crate::config::GearConfig;
use crate::core::types::{Centimeters, Gear, MotorSpeed, SensorId};

/// Picks a cruising gear from front clearance
pub struct GearAdvisor {
    config: GearConfig,
}

impl GearAdvisor {
    pub fn new(config: GearConfig) -> Self {
        Self { config }
    }

    /// Gear for a fresh front measurement.
    ///
    /// Always samples again rather than reusing the classifier's triple.
    pub fn suggest(&self, sampler: &mut DistanceSampler) -> Gear {
        let front = sampler.measure(SensorId::Front);
        let gear = self.gear_for(front);
        log::debug!("front {}cm suggests {}", front, gear);
        gear
    }

    /// Monotonic threshold mapping: >=275 fourth, >=200 third, >=100 second
    pub fn gear_for(&self, front: Centimeters) -> Gear {
        let c = &self.config;
        if front >= c.fourth_gear_cm {
            Gear::Fourth
        } else if front >= c.third_gear_cm {
            Gear::Third
        } else if front >= c.second_gear_cm {
            Gear::Second
        } else {
            Gear::First
        }
    }

    /// PWM speed of a gear
    pub fn speed(&self, gear: Gear) -> MotorSpeed {
        self.config.speed(gear)
    }
}
