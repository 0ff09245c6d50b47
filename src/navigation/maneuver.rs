//! Maneuver execution
//!
//! Turns situations into ordered motor commands. Every maneuver blocks until
//! its settle delays have elapsed; nothing here can be interrupted halfway.
//!
//! # Turning primitives
//!
//! ```text
//! quarter turn:  brake -> spin (max speed, 500ms) -> release -> settle 500ms
//! U-turn:        brake -> spin (max speed, 1250ms) -> release -> settle 1000ms
//! ```
//!
//! Spin time is proportional to the wanted rotation and tuned on the chassis,
//! not computed from wheel speed.

use super::classifier::SituationClassifier;
use super::gear::GearAdvisor;
use super::sampler::DistanceSampler;
use crate::config::{GearConfig, ManeuverConfig};
use crate::core::driver::{Clock, MotorPair};
use crate::core::types::{Direction, Gear, Situation, TurnDirection, MAX_MOTOR_SPEED};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Drives the motor pair through situation-specific maneuvers
pub struct ManeuverController {
    motors: Box<dyn MotorPair>,
    clock: Arc<dyn Clock>,
    timing: ManeuverConfig,
    gears: GearConfig,
    /// Last engaged forward gear
    gear: Gear,
}

impl ManeuverController {
    pub fn new(
        timing: ManeuverConfig,
        gears: GearConfig,
        motors: Box<dyn MotorPair>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            motors,
            clock,
            timing,
            gears,
            gear: Gear::First,
        }
    }

    /// Last engaged gear
    pub fn gear(&self) -> Gear {
        self.gear
    }

    /// Execute the maneuver for a situation
    pub fn act(
        &mut self,
        situation: Situation,
        sampler: &mut DistanceSampler,
        classifier: &SituationClassifier,
        advisor: &GearAdvisor,
    ) -> Result<()> {
        match situation {
            Situation::ClearAhead => {
                let gear = advisor.suggest(sampler);
                self.engage(gear)
            }
            Situation::PathClosing => self.engage(Gear::First),
            Situation::SeekAlternate => {
                self.stop()?;
                self.pause();
                match classifier.seek_alternate_route(sampler) {
                    Situation::ClearLeft => {
                        self.reverse()?;
                        self.quarter_turn(TurnDirection::Left)?;
                        self.engage(Gear::First)
                    }
                    Situation::ClearRight => {
                        self.reverse()?;
                        self.quarter_turn(TurnDirection::Right)?;
                        self.engage(Gear::First)
                    }
                    _ => self.engage(Gear::First),
                }
            }
            Situation::NarrowCorridor => {
                self.stop()?;
                self.reverse()?;
                self.u_turn(TurnDirection::Left)
            }
            Situation::ClearLeft => {
                self.engage(Gear::First)?;
                self.reverse()?;
                self.quarter_turn(TurnDirection::Left)
            }
            Situation::ClearRight => {
                self.engage(Gear::First)?;
                self.reverse()?;
                self.quarter_turn(TurnDirection::Right)
            }
            Situation::PathBlocked => {
                self.stop()?;
                self.pause();
                self.u_turn(TurnDirection::Right)
            }
        }
    }

    /// Drive forward at a gear's speed
    pub fn engage(&mut self, gear: Gear) -> Result<()> {
        if gear != self.gear {
            log::debug!("shifting {} -> {}", self.gear, gear);
        }
        let speed = self.gears.speed(gear);
        self.motors
            .set_directions(Direction::Forward, Direction::Forward)?;
        self.motors.set_speeds(speed, speed)?;
        self.gear = gear;
        Ok(())
    }

    /// Cut power and release both wheels
    pub fn stop(&mut self) -> Result<()> {
        self.motors.set_speeds(0, 0)?;
        self.motors
            .set_directions(Direction::Release, Direction::Release)
    }

    /// Blocking pause between stopping and the next command
    pub fn pause(&self) {
        self.clock.delay(Duration::from_millis(self.timing.pause_ms));
    }

    /// Back up briefly at first-gear speed
    pub fn reverse(&mut self) -> Result<()> {
        self.reverse_for(Duration::from_millis(self.timing.reverse_ms))
    }

    /// Back up at first-gear speed for a given time
    pub fn reverse_for(&mut self, duration: Duration) -> Result<()> {
        let speed = self.gears.speed(Gear::First);
        log::debug!("reversing for {}ms", duration.as_millis());
        self.motors
            .set_directions(Direction::Backward, Direction::Backward)?;
        self.motors.set_speeds(speed, speed)?;
        self.clock.delay(duration);
        Ok(())
    }

    /// Rotate roughly 90 degrees in place
    pub fn quarter_turn(&mut self, turn: TurnDirection) -> Result<()> {
        log::debug!("quarter turn {}", turn);
        self.spin(
            turn,
            Duration::from_millis(self.timing.quarter_turn_ms),
            Duration::from_millis(self.timing.quarter_turn_settle_ms),
        )
    }

    /// Rotate roughly 180 degrees in place
    pub fn u_turn(&mut self, turn: TurnDirection) -> Result<()> {
        log::debug!("U-turn {}", turn);
        self.spin(
            turn,
            Duration::from_millis(self.timing.u_turn_ms),
            Duration::from_millis(self.timing.u_turn_settle_ms),
        )
    }

    /// Sidestep an obstacle ahead without stopping.
    ///
    /// Holds the inner wheel at zero to veer toward `side`, swaps to veer
    /// back, then cruises on in third gear. Not used by [`act`](Self::act).
    pub fn overtake(&mut self, side: TurnDirection) -> Result<()> {
        let cruise = self.gears.speed(Gear::Third);
        let hold = Duration::from_millis(self.timing.overtake_ms);
        let (veer, recover) = match side {
            TurnDirection::Left => ((0, cruise), (cruise, 0)),
            TurnDirection::Right => ((cruise, 0), (0, cruise)),
        };

        log::debug!("overtaking on the {}", side);
        self.motors
            .set_directions(Direction::Forward, Direction::Forward)?;
        self.motors.set_speeds(veer.0, veer.1)?;
        self.clock.delay(hold);
        self.motors.set_speeds(recover.0, recover.1)?;
        self.clock.delay(hold);
        self.engage(Gear::Third)
    }

    fn spin(&mut self, turn: TurnDirection, spin: Duration, settle: Duration) -> Result<()> {
        // Brake before reversing one wheel
        self.motors.set_speeds(0, 0)?;

        let (left, right) = match turn {
            TurnDirection::Left => (Direction::Backward, Direction::Forward),
            TurnDirection::Right => (Direction::Forward, Direction::Backward),
        };
        self.motors.set_directions(left, right)?;
        self.motors.set_speeds(MAX_MOTOR_SPEED, MAX_MOTOR_SPEED)?;
        self.clock.delay(spin);

        self.motors
            .set_directions(Direction::Release, Direction::Release)?;
        self.clock.delay(settle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierConfig, SamplingConfig};
    use crate::core::types::{MotorId, SensorTriple};
    use crate::devices::mock::{ManualClock, MotorCommand, RecordingMotors, ScriptedRangeSensor};

    struct Rig {
        sensor: ScriptedRangeSensor,
        motors: RecordingMotors,
        clock: ManualClock,
        sampler: DistanceSampler,
        classifier: SituationClassifier,
        advisor: GearAdvisor,
        maneuvers: ManeuverController,
    }

    fn rig(triple: SensorTriple) -> Rig {
        let sensor = ScriptedRangeSensor::with_steady(triple);
        let motors = RecordingMotors::new();
        let clock = ManualClock::new();
        let sampling = SamplingConfig {
            min_pings: 3,
            max_pings: 3,
            ping_settle_ms: 0,
            random_seed: 1,
            ..Default::default()
        };
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        Rig {
            sampler: DistanceSampler::new(&sampling, Box::new(sensor.clone()), Arc::clone(&shared)),
            classifier: SituationClassifier::new(ClassifierConfig::default()),
            advisor: GearAdvisor::new(GearConfig::default()),
            maneuvers: ManeuverController::new(
                ManeuverConfig::default(),
                GearConfig::default(),
                Box::new(motors.clone()),
                shared,
            ),
            sensor,
            motors,
            clock,
        }
    }

    impl Rig {
        fn act(&mut self, situation: Situation) {
            self.maneuvers
                .act(
                    situation,
                    &mut self.sampler,
                    &self.classifier,
                    &self.advisor,
                )
                .unwrap();
        }

        /// Delays excluding zero-length ping settles
        fn delays_ms(&self) -> Vec<u128> {
            self.clock
                .delays()
                .iter()
                .filter(|d| !d.is_zero())
                .map(Duration::as_millis)
                .collect()
        }
    }

    fn spin_commands(left: Direction, right: Direction) -> Vec<MotorCommand> {
        vec![
            MotorCommand::Speed(MotorId::Left, 0),
            MotorCommand::Speed(MotorId::Right, 0),
            MotorCommand::Direction(MotorId::Left, left),
            MotorCommand::Direction(MotorId::Right, right),
            MotorCommand::Speed(MotorId::Left, 255),
            MotorCommand::Speed(MotorId::Right, 255),
            MotorCommand::Direction(MotorId::Left, Direction::Release),
            MotorCommand::Direction(MotorId::Right, Direction::Release),
        ]
    }

    #[test]
    fn test_clear_ahead_uses_advised_gear() {
        let mut rig = rig(SensorTriple::new(280, 50, 50));
        rig.act(Situation::ClearAhead);

        assert_eq!(rig.maneuvers.gear(), Gear::Fourth);
        assert_eq!(rig.motors.speeds(), (255, 255));
        assert_eq!(
            rig.motors.directions(),
            (Direction::Forward, Direction::Forward)
        );
        assert!(rig.delays_ms().is_empty());
    }

    #[test]
    fn test_path_closing_forces_first_gear() {
        let mut rig = rig(SensorTriple::new(35, 50, 50));
        rig.maneuvers.engage(Gear::Third).unwrap();
        rig.act(Situation::PathClosing);

        assert_eq!(rig.maneuvers.gear(), Gear::First);
        assert_eq!(rig.motors.speeds(), (110, 110));
        // No fresh sample needed
        assert_eq!(rig.sensor.ping_count(crate::core::types::SensorId::Front), 0);
    }

    #[test]
    fn test_quarter_turn_sequence() {
        let mut rig = rig(SensorTriple::default());
        rig.maneuvers.quarter_turn(TurnDirection::Left).unwrap();

        assert_eq!(
            rig.motors.commands(),
            spin_commands(Direction::Backward, Direction::Forward)
        );
        assert_eq!(rig.delays_ms(), vec![500, 500]);
    }

    #[test]
    fn test_u_turn_sequence() {
        let mut rig = rig(SensorTriple::default());
        rig.maneuvers.u_turn(TurnDirection::Right).unwrap();

        assert_eq!(
            rig.motors.commands(),
            spin_commands(Direction::Forward, Direction::Backward)
        );
        assert_eq!(rig.delays_ms(), vec![1250, 1000]);
    }

    #[test]
    fn test_narrow_corridor_reverses_then_left_u_turn() {
        let mut rig = rig(SensorTriple::new(20, 4, 4));
        rig.act(Situation::NarrowCorridor);

        let commands = rig.motors.commands();
        assert_eq!(
            &commands[..4],
            &[
                MotorCommand::Speed(MotorId::Left, 0),
                MotorCommand::Speed(MotorId::Right, 0),
                MotorCommand::Direction(MotorId::Left, Direction::Release),
                MotorCommand::Direction(MotorId::Right, Direction::Release),
            ]
        );
        assert_eq!(
            &commands[4..8],
            &[
                MotorCommand::Direction(MotorId::Left, Direction::Backward),
                MotorCommand::Direction(MotorId::Right, Direction::Backward),
                MotorCommand::Speed(MotorId::Left, 110),
                MotorCommand::Speed(MotorId::Right, 110),
            ]
        );
        assert_eq!(
            &commands[8..],
            spin_commands(Direction::Backward, Direction::Forward).as_slice()
        );
        assert_eq!(rig.delays_ms(), vec![400, 1250, 1000]);
    }

    #[test]
    fn test_clear_left_and_right() {
        let mut rig = rig(SensorTriple::new(20, 30, 4));
        rig.act(Situation::ClearLeft);
        let commands = rig.motors.commands();
        assert_eq!(
            &commands[commands.len() - 8..],
            spin_commands(Direction::Backward, Direction::Forward).as_slice()
        );
        assert_eq!(rig.maneuvers.gear(), Gear::First);
        assert_eq!(rig.delays_ms(), vec![400, 500, 500]);

        let mut rig = rig_right();
        rig.act(Situation::ClearRight);
        let commands = rig.motors.commands();
        assert_eq!(
            &commands[commands.len() - 8..],
            spin_commands(Direction::Forward, Direction::Backward).as_slice()
        );
    }

    fn rig_right() -> Rig {
        rig(SensorTriple::new(20, 4, 30))
    }

    #[test]
    fn test_path_blocked_pauses_then_right_u_turn() {
        let mut rig = rig(SensorTriple::new(20, 30, 30));
        rig.act(Situation::PathBlocked);

        let commands = rig.motors.commands();
        assert_eq!(
            &commands[4..],
            spin_commands(Direction::Forward, Direction::Backward).as_slice()
        );
        assert_eq!(rig.delays_ms(), vec![250, 1250, 1000]);
    }

    #[test]
    fn test_seek_alternate_turns_toward_bypass() {
        let mut rig = rig(SensorTriple::new(38, 20, 120));
        rig.act(Situation::SeekAlternate);

        // stop, pause, reverse, quarter turn right, first gear
        assert_eq!(rig.delays_ms(), vec![250, 400, 500, 500]);
        assert_eq!(rig.maneuvers.gear(), Gear::First);
        assert_eq!(
            rig.motors.directions(),
            (Direction::Forward, Direction::Forward)
        );
        let commands = rig.motors.commands();
        let spin = spin_commands(Direction::Forward, Direction::Backward);
        assert!(commands.windows(spin.len()).any(|w| w == spin.as_slice()));
    }

    #[test]
    fn test_seek_alternate_without_bypass_only_slows() {
        let mut rig = rig(SensorTriple::new(45, 20, 20));
        rig.maneuvers.engage(Gear::Second).unwrap();
        rig.motors.clear();
        rig.act(Situation::SeekAlternate);

        assert_eq!(rig.delays_ms(), vec![250]);
        assert_eq!(rig.maneuvers.gear(), Gear::First);
        assert!(!rig
            .motors
            .commands()
            .contains(&MotorCommand::Direction(MotorId::Left, Direction::Backward)));
    }

    #[test]
    fn test_overtake_biases_then_cruises_third() {
        let mut rig = rig(SensorTriple::default());
        rig.maneuvers.overtake(TurnDirection::Left).unwrap();

        let commands = rig.motors.commands();
        assert_eq!(
            &commands[2..6],
            &[
                MotorCommand::Speed(MotorId::Left, 0),
                MotorCommand::Speed(MotorId::Right, 200),
                MotorCommand::Speed(MotorId::Left, 200),
                MotorCommand::Speed(MotorId::Right, 0),
            ]
        );
        assert_eq!(rig.delays_ms(), vec![400, 400]);
        assert_eq!(rig.maneuvers.gear(), Gear::Third);
        assert_eq!(rig.motors.speeds(), (200, 200));
    }

    #[test]
    fn test_overtake_right_mirrors_left() {
        let mut rig = rig(SensorTriple::default());
        rig.maneuvers.overtake(TurnDirection::Right).unwrap();

        let commands = rig.motors.commands();
        assert_eq!(
            &commands[2..6],
            &[
                MotorCommand::Speed(MotorId::Left, 200),
                MotorCommand::Speed(MotorId::Right, 0),
                MotorCommand::Speed(MotorId::Left, 0),
                MotorCommand::Speed(MotorId::Right, 200),
            ]
        );
        assert_eq!(rig.delays_ms(), vec![400, 400]);
        assert_eq!(rig.maneuvers.gear(), Gear::Third);
        assert_eq!(rig.motors.speeds(), (200, 200));
    }

    #[test]
    fn test_motor_fault_propagates() {
        let mut rig = rig(SensorTriple::new(35, 0, 0));
        rig.motors.fail_next_command();
        let result = rig.maneuvers.act(
            Situation::PathClosing,
            &mut rig.sampler,
            &rig.classifier,
            &rig.advisor,
        );
        assert!(result.is_err());
    }
}
