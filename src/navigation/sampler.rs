//! Smoothed distance sampling
//!
//! Each measurement averages a small, randomly sized burst of raw pings. The
//! burst length varies per call so that the three sonars do not settle into a
//! fixed ping rhythm and a single spike is diluted over 3-5 samples.
//!
//! The front sensor guards the collision path: a burst that averages to zero
//! (echo dropout) is thrown away and measured again. Side sensors report zero
//! as "very close / no echo" without retrying.

use crate::config::SamplingConfig;
use crate::core::driver::{Clock, RangeSensor};
use crate::core::types::{Centimeters, SensorId, SensorTriple};
use crate::error::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// Front reading used when the sensor never produced an echo and no earlier
/// reading exists. Reads as "obstacle touching", never as "clear".
pub const FRONT_FALLBACK_CM: Centimeters = 1;

/// Averages raw pings into one distance per sensor
pub struct DistanceSampler {
    sensor: Box<dyn RangeSensor>,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
    min_pings: u8,
    max_pings: u8,
    ping_settle: Duration,
    front_retry_limit: u32,
    /// Last successful reading per sensor, indexed by [`slot`]
    last_good: [Option<Centimeters>; 3],
}

fn slot(sensor: SensorId) -> usize {
    match sensor {
        SensorId::Front => 0,
        SensorId::Left => 1,
        SensorId::Right => 2,
    }
}

impl DistanceSampler {
    /// Create a sampler
    ///
    /// A `random_seed` of 0 seeds the ping-count jitter from entropy.
    pub fn new(
        config: &SamplingConfig,
        sensor: Box<dyn RangeSensor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rng = if config.random_seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.random_seed)
        };
        let min_pings = config.min_pings.max(1);

        Self {
            sensor,
            clock,
            rng,
            min_pings,
            max_pings: config.max_pings.max(min_pings),
            ping_settle: Duration::from_millis(config.ping_settle_ms),
            front_retry_limit: config.front_retry_limit,
            last_good: [None; 3],
        }
    }

    /// Smoothed distance for one sensor in centimeters.
    ///
    /// Never returns 0 for [`SensorId::Front`].
    pub fn measure(&mut self, sensor: SensorId) -> Centimeters {
        if sensor == SensorId::Front {
            return self.measure_front();
        }

        match self.average(sensor) {
            Ok(distance) => {
                self.last_good[slot(sensor)] = Some(distance);
                distance
            }
            Err(e) => {
                let fallback = self.last_good[slot(sensor)].unwrap_or(0);
                log::warn!("{} sonar: {}, using {}cm", sensor, e, fallback);
                fallback
            }
        }
    }

    /// Fresh (front, left, right) snapshot, measured in that order
    pub fn sample_triple(&mut self) -> SensorTriple {
        let front = self.measure(SensorId::Front);
        let left = self.measure(SensorId::Left);
        let right = self.measure(SensorId::Right);
        SensorTriple::new(front, left, right)
    }

    /// Point the sonars straight ahead
    pub fn center_sensors(&mut self) -> Result<()> {
        self.sensor.center()
    }

    /// Last successful reading of a sensor, if any
    pub fn last_good(&self, sensor: SensorId) -> Option<Centimeters> {
        self.last_good[slot(sensor)]
    }

    fn measure_front(&mut self) -> Centimeters {
        for attempt in 1..=self.front_retry_limit {
            match self.average(SensorId::Front) {
                Ok(0) => {
                    log::debug!("front sonar dropout, resampling (attempt {})", attempt);
                }
                Ok(distance) => {
                    self.last_good[slot(SensorId::Front)] = Some(distance);
                    return distance;
                }
                Err(e) => {
                    if let Some(previous) = self.last_good[slot(SensorId::Front)] {
                        log::warn!("front sonar: {}, using {}cm", e, previous);
                        return previous;
                    }
                    log::warn!("front sonar: {}, resampling (attempt {})", e, attempt);
                }
            }
        }

        let fallback = self.last_good[slot(SensorId::Front)].unwrap_or(FRONT_FALLBACK_CM);
        log::warn!(
            "front sonar gave no echo in {} measurements, using {}cm",
            self.front_retry_limit,
            fallback
        );
        fallback
    }

    /// Integer mean of a burst of 3-5 raw pings
    fn average(&mut self, sensor: SensorId) -> Result<Centimeters> {
        let pings = self.rng.gen_range(self.min_pings..=self.max_pings);

        let mut sum: u32 = 0;
        for _ in 0..pings {
            sum += u32::from(self.sensor.ping(sensor)?);
            self.clock.delay(self.ping_settle);
        }

        Ok((sum / u32::from(pings)) as Centimeters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::{ManualClock, ScriptedRangeSensor};

    fn fixed_config(pings: u8) -> SamplingConfig {
        SamplingConfig {
            min_pings: pings,
            max_pings: pings,
            random_seed: 42,
            ..Default::default()
        }
    }

    fn sampler_with(
        config: &SamplingConfig,
        sensor: &ScriptedRangeSensor,
    ) -> (DistanceSampler, ManualClock) {
        let clock = ManualClock::new();
        let sampler =
            DistanceSampler::new(config, Box::new(sensor.clone()), Arc::new(clock.clone()));
        (sampler, clock)
    }

    #[test]
    fn test_integer_mean_of_burst() {
        let sensor = ScriptedRangeSensor::new();
        sensor.push_pings(SensorId::Left, &[10, 11, 13, 99]);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        // (10 + 11 + 13) / 3 = 11.33 -> 11
        assert_eq!(sampler.measure(SensorId::Left), 11);
        assert_eq!(sensor.ping_count(SensorId::Left), 3);
        // The fourth ping is left for the next measurement
        assert_eq!(sensor.queued(SensorId::Left), 1);
    }

    #[test]
    fn test_random_burst_length_in_range() {
        let sensor = ScriptedRangeSensor::new();
        let config = SamplingConfig {
            random_seed: 7,
            ..Default::default()
        };
        let (mut sampler, _) = sampler_with(&config, &sensor);

        let mut seen = [false; 6];
        let mut previous = 0;
        for _ in 0..200 {
            sampler.measure(SensorId::Right);
            let count = sensor.ping_count(SensorId::Right);
            let burst = count - previous;
            previous = count;
            assert!((3..=5).contains(&burst), "burst of {}", burst);
            seen[burst] = true;
        }
        assert!(seen[3] && seen[4] && seen[5]);
    }

    #[test]
    fn test_mean_matches_consumed_pings() {
        let readings = [20, 30, 40, 50, 60];
        let sensor = ScriptedRangeSensor::new();
        sensor.push_pings(SensorId::Left, &readings);
        let config = SamplingConfig {
            random_seed: 3,
            ..Default::default()
        };
        let (mut sampler, _) = sampler_with(&config, &sensor);

        let result = sampler.measure(SensorId::Left);
        let n = sensor.ping_count(SensorId::Left);
        let expected: u32 = readings[..n].iter().map(|&r| u32::from(r)).sum::<u32>() / n as u32;
        assert_eq!(u32::from(result), expected);
    }

    #[test]
    fn test_settle_delay_after_each_ping() {
        let sensor = ScriptedRangeSensor::with_steady(SensorTriple::new(80, 80, 80));
        let (mut sampler, clock) = sampler_with(&fixed_config(4), &sensor);

        sampler.measure(SensorId::Left);
        assert_eq!(clock.delays(), vec![Duration::from_millis(5); 4]);
        assert_eq!(clock.total_delayed(), Duration::from_millis(20));
    }

    #[test]
    fn test_front_zero_mean_is_resampled() {
        let sensor = ScriptedRangeSensor::new();
        // Two bursts average to zero (the second truncates 1/3 to 0)
        sensor.push_pings(SensorId::Front, &[0, 0, 0, 0, 0, 1]);
        sensor.set_steady_one(SensorId::Front, 42);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.measure(SensorId::Front), 42);
        assert_eq!(sensor.ping_count(SensorId::Front), 9);
    }

    #[test]
    fn test_side_zero_is_valid() {
        let sensor = ScriptedRangeSensor::new();
        sensor.set_steady_one(SensorId::Left, 0);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.measure(SensorId::Left), 0);
        assert_eq!(sensor.ping_count(SensorId::Left), 3);
    }

    #[test]
    fn test_dead_front_sensor_never_reads_zero() {
        let sensor = ScriptedRangeSensor::new();
        let config = SamplingConfig {
            front_retry_limit: 5,
            ..fixed_config(3)
        };
        let (mut sampler, _) = sampler_with(&config, &sensor);

        assert_eq!(sampler.measure(SensorId::Front), FRONT_FALLBACK_CM);
        assert_eq!(sensor.ping_count(SensorId::Front), 15);
    }

    #[test]
    fn test_dead_front_sensor_reuses_last_good() {
        let sensor = ScriptedRangeSensor::new();
        sensor.push_pings(SensorId::Front, &[33, 33, 33]);
        let config = SamplingConfig {
            front_retry_limit: 2,
            ..fixed_config(3)
        };
        let (mut sampler, _) = sampler_with(&config, &sensor);

        assert_eq!(sampler.measure(SensorId::Front), 33);
        // Queue exhausted, steady front is 0 from now on
        assert_eq!(sampler.measure(SensorId::Front), 33);
    }

    #[test]
    fn test_side_fault_substitutes_last_good() {
        let sensor = ScriptedRangeSensor::new();
        sensor.push_pings(SensorId::Right, &[25, 25, 25]);
        sensor.push_fault(SensorId::Right);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.measure(SensorId::Right), 25);
        assert_eq!(sampler.measure(SensorId::Right), 25);
        assert_eq!(sampler.last_good(SensorId::Right), Some(25));
    }

    #[test]
    fn test_side_fault_without_history_reads_zero() {
        let sensor = ScriptedRangeSensor::new();
        sensor.push_fault(SensorId::Left);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.measure(SensorId::Left), 0);
    }

    #[test]
    fn test_front_fault_without_history_retries() {
        let sensor = ScriptedRangeSensor::new();
        sensor.push_fault(SensorId::Front);
        sensor.set_steady_one(SensorId::Front, 64);
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.measure(SensorId::Front), 64);
    }

    #[test]
    fn test_sample_triple_order() {
        let sensor = ScriptedRangeSensor::with_steady(SensorTriple::new(120, 15, 9));
        let (mut sampler, _) = sampler_with(&fixed_config(3), &sensor);

        assert_eq!(sampler.sample_triple(), SensorTriple::new(120, 15, 9));
    }
}
