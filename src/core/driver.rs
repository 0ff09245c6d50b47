//! Capability traits for the rover's hardware collaborators
//!
//! The control loop only ever talks to hardware through these four traits.
//! Concrete implementations live in [`crate::devices`].

use crate::core::types::{Centimeters, Direction, MotorId, MotorSpeed, SensorId};
use crate::error::Result;
use std::time::Duration;

/// Ultrasonic range sensor bank
pub trait RangeSensor: Send {
    /// Take one raw ping from the given sensor.
    ///
    /// Returns 0 when no echo came back (out of range).
    fn ping(&mut self, sensor: SensorId) -> Result<Centimeters>;

    /// Point the sensors straight ahead (boot only)
    fn center(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Two independently driven wheels
pub trait MotorPair: Send {
    /// Set PWM speed of one motor
    fn set_speed(&mut self, motor: MotorId, speed: MotorSpeed) -> Result<()>;

    /// Set H-bridge direction of one motor
    fn set_direction(&mut self, motor: MotorId, direction: Direction) -> Result<()>;

    /// Set both speeds, left first
    fn set_speeds(&mut self, left: MotorSpeed, right: MotorSpeed) -> Result<()> {
        self.set_speed(MotorId::Left, left)?;
        self.set_speed(MotorId::Right, right)
    }

    /// Set both directions, left first
    fn set_directions(&mut self, left: Direction, right: Direction) -> Result<()> {
        self.set_direction(MotorId::Left, left)?;
        self.set_direction(MotorId::Right, right)
    }
}

/// Character display for status output
pub trait StatusDisplay: Send {
    /// Write text starting at (row, col)
    fn write_line(&mut self, row: u8, col: u8, text: &str) -> Result<()>;
}

/// Monotonic time source with blocking waits.
///
/// Shared between components as `Arc<dyn Clock>`, so implementations keep
/// their state behind interior mutability.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Block for the given duration (settle delays, pauses)
    fn delay(&self, duration: Duration);
}
