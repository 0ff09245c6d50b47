//! Control loop context
//!
//! ```text
//! boot:   banner -> center sonars -> baseline triple
//! cycle:  recovery check -> classify -> display -> act
//! ```
//!
//! The [`Pilot`] owns every component and all mutable loop state, so a cycle
//! runs to completion on the calling thread before the next one starts.

use super::classifier::SituationClassifier;
use super::display::StatusPanel;
use super::gear::GearAdvisor;
use super::maneuver::ManeuverController;
use super::recovery::{RecoveryOutcome, StuckRecoveryMonitor};
use super::sampler::DistanceSampler;
use crate::config::RoverConfig;
use crate::core::types::{Gear, SensorTriple, Situation};
use crate::devices::Hardware;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happened during one control cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub situation: Situation,
    pub recovery: RecoveryOutcome,
    /// Gear engaged after the maneuver
    pub gear: Gear,
    /// Triple the situation was classified from
    pub triple: SensorTriple,
}

pub struct Pilot {
    sampler: DistanceSampler,
    classifier: SituationClassifier,
    advisor: GearAdvisor,
    maneuvers: ManeuverController,
    monitor: StuckRecoveryMonitor,
    panel: StatusPanel,
    device_name: String,
    previous: Option<Situation>,
    cycles: u64,
}

impl Pilot {
    pub fn new(config: &RoverConfig, hardware: Hardware) -> Self {
        let Hardware {
            sensors,
            motors,
            display,
            clock,
        } = hardware;

        Self {
            sampler: DistanceSampler::new(&config.sampling, sensors, Arc::clone(&clock)),
            classifier: SituationClassifier::new(config.classifier.clone()),
            advisor: GearAdvisor::new(config.gears.clone()),
            maneuvers: ManeuverController::new(
                config.maneuvers.clone(),
                config.gears.clone(),
                motors,
                Arc::clone(&clock),
            ),
            monitor: StuckRecoveryMonitor::new(config.recovery.clone(), clock),
            panel: StatusPanel::new(display),
            device_name: config.device.name.clone(),
            previous: None,
            cycles: 0,
        }
    }

    /// Fixed boot sequence. Returns the baseline triple.
    pub fn boot(&mut self) -> SensorTriple {
        self.panel.banner(&self.device_name);

        if let Err(e) = self.sampler.center_sensors() {
            log::warn!("Failed to center sonars: {}", e);
        }

        let baseline = self.sampler.sample_triple();
        self.monitor.reset_baseline(baseline);
        log::info!("Baseline {}", baseline);
        baseline
    }

    /// Run one control cycle
    pub fn step(&mut self) -> Result<CycleReport> {
        self.cycles += 1;

        let recovery = self.monitor.check(&mut self.sampler, &mut self.maneuvers)?;
        if let RecoveryOutcome::Recovered(turn) = recovery {
            log::info!("Recovered from stall with a {} U-turn", turn);
        }

        let situation = self.classifier.classify(&mut self.sampler);
        let triple = self.classifier.triple();
        self.panel.show_triple(&triple);

        if self.previous != Some(situation) {
            log::info!("{} ({})", situation, triple);
            self.panel.show_situation(situation);
            self.previous = Some(situation);
        }

        self.maneuvers
            .act(situation, &mut self.sampler, &self.classifier, &self.advisor)?;

        Ok(CycleReport {
            situation,
            recovery,
            gear: self.maneuvers.gear(),
            triple,
        })
    }

    /// Cycle until `running` is cleared, then stop the motors.
    ///
    /// A failed cycle is logged and the loop carries on. Returns the number
    /// of cycles run.
    pub fn run(&mut self, running: &AtomicBool) -> Result<u64> {
        let start = self.cycles;
        while running.load(Ordering::Relaxed) {
            if let Err(e) = self.step() {
                log::error!("Cycle {} failed: {}", self.cycles, e);
            }
        }

        log::info!("Stopping motors");
        self.maneuvers.stop()?;
        Ok(self.cycles - start)
    }

    /// Situation of the most recent cycle
    pub fn situation(&self) -> Option<Situation> {
        self.previous
    }

    pub fn gear(&self) -> Gear {
        self.maneuvers.gear()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn monitor(&self) -> &StuckRecoveryMonitor {
        &self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Direction;
    use crate::devices::mock::{ManualClock, MemoryDisplay, RecordingMotors, ScriptedRangeSensor};
    use std::time::Duration;

    struct Rig {
        sensor: ScriptedRangeSensor,
        motors: RecordingMotors,
        display: MemoryDisplay,
        clock: ManualClock,
        pilot: Pilot,
    }

    fn rig(triple: SensorTriple) -> Rig {
        let sensor = ScriptedRangeSensor::with_steady(triple);
        let motors = RecordingMotors::new();
        let display = MemoryDisplay::new();
        let clock = ManualClock::new();

        let mut config = RoverConfig::default();
        config.sampling.random_seed = 3;
        config.device.name = "Test rover".to_string();

        let hardware = Hardware {
            sensors: Box::new(sensor.clone()),
            motors: Box::new(motors.clone()),
            display: Box::new(display.clone()),
            clock: Arc::new(clock.clone()),
        };

        Rig {
            pilot: Pilot::new(&config, hardware),
            sensor,
            motors,
            display,
            clock,
        }
    }

    #[test]
    fn test_boot_sequence() {
        let mut rig = rig(SensorTriple::new(120, 30, 40));
        let baseline = rig.pilot.boot();

        assert!(rig.sensor.is_centered());
        assert_eq!(baseline, SensorTriple::new(120, 30, 40));
        assert_eq!(rig.pilot.monitor().window().previous, baseline);
        assert_eq!(rig.display.row(0), "SONAR PILOT");
        // Banner stays up until the first cycle
        assert_eq!(rig.display.row(1), "Test rover");
        assert!(rig.motors.commands().is_empty());
    }

    #[test]
    fn test_cycle_reports_and_displays() {
        let mut rig = rig(SensorTriple::new(220, 30, 40));
        rig.pilot.boot();

        let report = rig.pilot.step().unwrap();
        assert_eq!(report.situation, Situation::ClearAhead);
        assert_eq!(report.recovery, RecoveryOutcome::NotDue);
        assert_eq!(report.gear, Gear::Third);
        assert_eq!(report.triple, SensorTriple::new(220, 30, 40));
        assert_eq!(rig.display.row(0), "CLEAR AHEAD");
        assert_eq!(rig.display.row(1), "F220 L030 R040");
        assert_eq!(rig.motors.speeds(), (200, 200));
    }

    #[test]
    fn test_situation_written_only_on_change() {
        let mut rig = rig(SensorTriple::new(35, 30, 40));
        rig.pilot.boot();

        rig.pilot.step().unwrap();
        let writes = rig.display.writes();
        rig.pilot.step().unwrap();
        // Only the distance row is refreshed
        assert_eq!(rig.display.writes(), writes + 1);

        rig.sensor.set_steady(SensorTriple::new(25, 5, 5));
        let report = rig.pilot.step().unwrap();
        assert_eq!(report.situation, Situation::NarrowCorridor);
        assert_eq!(rig.display.row(0), "NARROW CORRIDOR");
        assert_eq!(rig.pilot.situation(), Some(Situation::NarrowCorridor));
    }

    #[test]
    fn test_recovery_runs_before_classification() {
        let mut rig = rig(SensorTriple::new(60, 40, 20));
        rig.pilot.boot();
        rig.clock.advance(Duration::from_millis(5001));

        let report = rig.pilot.step().unwrap();
        assert!(matches!(report.recovery, RecoveryOutcome::Recovered(_)));
        assert_eq!(report.situation, Situation::ClearAhead);
        assert_eq!(
            rig.motors.directions(),
            (Direction::Forward, Direction::Forward)
        );
    }

    #[test]
    fn test_motor_fault_fails_cycle() {
        let mut rig = rig(SensorTriple::new(35, 30, 40));
        rig.pilot.boot();
        rig.motors.fail_next_command();

        assert!(rig.pilot.step().is_err());
        assert!(rig.pilot.step().is_ok());
        assert_eq!(rig.pilot.cycles(), 2);
    }

    #[test]
    fn test_run_stops_motors_on_shutdown() {
        let mut rig = rig(SensorTriple::new(220, 30, 40));
        rig.pilot.boot();
        rig.pilot.step().unwrap();

        let running = AtomicBool::new(false);
        assert_eq!(rig.pilot.run(&running).unwrap(), 0);
        assert_eq!(rig.motors.speeds(), (0, 0));
        assert_eq!(
            rig.motors.directions(),
            (Direction::Release, Direction::Release)
        );
    }
}
