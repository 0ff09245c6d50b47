//! Stuck detection and recovery
//!
//! Every `check_interval` the monitor compares the current front distance with
//! the one recorded at the previous evaluation. Two failure modes trigger a
//! recovery U-turn:
//!
//! - **Close-range stall**: front barely changed and an obstacle is nearer
//!   than `long_range_cm`. The robot is pushing against something.
//! - **Long-range crawl**: front is far but has hardly changed several
//!   evaluations in a row. Usually a wheel scraping along a wall.

use super::maneuver::ManeuverController;
use super::sampler::DistanceSampler;
use crate::config::RecoveryConfig;
use crate::core::driver::Clock;
use crate::core::types::{Gear, SensorId, SensorTriple, TurnDirection};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Result of one [`StuckRecoveryMonitor::check`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Interval has not elapsed; nothing was sampled
    NotDue,
    /// Front distance changed enough (or not enough to count)
    Progressing,
    /// Far reading barely moved; counter after increment
    Stagnating(u32),
    /// Recovery U-turn executed in this direction
    Recovered(TurnDirection),
}

/// Baseline the next evaluation is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryWindow {
    pub last_check: Duration,
    pub previous: SensorTriple,
    pub stagnation: u32,
}

/// Periodic no-progress watchdog
pub struct StuckRecoveryMonitor {
    config: RecoveryConfig,
    clock: Arc<dyn Clock>,
    window: RecoveryWindow,
}

impl StuckRecoveryMonitor {
    pub fn new(config: RecoveryConfig, clock: Arc<dyn Clock>) -> Self {
        let window = RecoveryWindow {
            last_check: clock.now(),
            previous: SensorTriple::default(),
            stagnation: 0,
        };
        Self {
            config,
            clock,
            window,
        }
    }

    /// Start a fresh window from a boot-time triple
    pub fn reset_baseline(&mut self, triple: SensorTriple) {
        self.window = RecoveryWindow {
            last_check: self.clock.now(),
            previous: triple,
            stagnation: 0,
        };
    }

    pub fn window(&self) -> RecoveryWindow {
        self.window
    }

    /// Evaluate progress if the interval has elapsed, recovering when stuck.
    ///
    /// The baseline and timer are updated on every evaluation, even when the
    /// recovery maneuver fails part way.
    pub fn check(
        &mut self,
        sampler: &mut DistanceSampler,
        maneuvers: &mut ManeuverController,
    ) -> Result<RecoveryOutcome> {
        let now = self.clock.now();
        if now.saturating_sub(self.window.last_check) <= self.config.check_interval() {
            return Ok(RecoveryOutcome::NotDue);
        }

        let current = sampler.sample_triple();
        let df = self.window.previous.front.abs_diff(current.front);
        let c = &self.config;

        let mut outcome = Ok(RecoveryOutcome::Progressing);
        if df <= c.front_threshold_cm {
            let mut stagnating = false;
            if current.front > c.long_range_cm && df <= c.long_vision_threshold_cm {
                self.window.stagnation += 1;
                stagnating = true;
                log::debug!(
                    "front {}cm moved {}cm, stagnation {}",
                    current.front,
                    df,
                    self.window.stagnation
                );
            }

            if self.window.stagnation > c.stagnation_limit || current.front < c.long_range_cm {
                log::info!(
                    "no progress (front {} -> {}cm, stagnation {}), recovering",
                    self.window.previous.front,
                    current.front,
                    self.window.stagnation
                );
                self.window.stagnation = 0;
                outcome = self.recover(sampler, maneuvers).map(RecoveryOutcome::Recovered);
            } else if stagnating {
                outcome = Ok(RecoveryOutcome::Stagnating(self.window.stagnation));
            }
        }

        self.window.previous = current;
        self.window.last_check = now;
        outcome
    }

    fn recover(
        &self,
        sampler: &mut DistanceSampler,
        maneuvers: &mut ManeuverController,
    ) -> Result<TurnDirection> {
        maneuvers.pause();
        maneuvers.engage(Gear::First)?;
        maneuvers.reverse_for(Duration::from_millis(self.config.reverse_ms))?;

        let left = sampler.measure(SensorId::Left);
        let right = sampler.measure(SensorId::Right);
        let turn = if left > right {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };

        log::info!("recovery U-turn {} (L={}cm R={}cm)", turn, left, right);
        maneuvers.u_turn(turn)?;
        Ok(turn)
    }
}
