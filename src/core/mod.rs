//! Core types and hardware capability traits

pub mod driver;
pub mod types;

pub use driver::{Clock, MotorPair, RangeSensor, StatusDisplay};
pub use types::{
    Centimeters, Direction, Gear, MotorId, MotorSpeed, SensorId, SensorTriple, Situation,
    TurnDirection, MAX_MOTOR_SPEED,
};
