//! Core types shared by perception, maneuvers and devices

use std::fmt;

/// Distance in whole centimeters. Zero means no echo / unmeasured.
pub type Centimeters = u16;

/// PWM speed accepted by the motor driver (0 = stopped, 255 = full).
pub type MotorSpeed = u8;

/// Full PWM speed used while spinning in place
pub const MAX_MOTOR_SPEED: MotorSpeed = 255;

/// Range sensor position on the chassis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    /// Forward-facing sonar
    Front,
    /// Left-facing sonar
    Left,
    /// Right-facing sonar
    Right,
}

impl SensorId {
    /// All sensors in sampling order
    pub const ALL: [SensorId; 3] = [SensorId::Front, SensorId::Left, SensorId::Right];
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorId::Front => "front",
            SensorId::Left => "left",
            SensorId::Right => "right",
        };
        f.write_str(name)
    }
}

/// Drive motor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    Left,
    Right,
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorId::Left => f.write_str("left"),
            MotorId::Right => f.write_str("right"),
        }
    }
}

/// H-bridge direction for a single motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Forward,
    Backward,
    /// Both bridge legs off; the wheel coasts
    #[default]
    Release,
}

/// Which way to rotate in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    /// Counter-clockwise
    Left,
    /// Clockwise
    Right,
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => f.write_str("left"),
            TurnDirection::Right => f.write_str("right"),
        }
    }
}

/// Smoothed (front, left, right) snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorTriple {
    pub front: Centimeters,
    pub left: Centimeters,
    pub right: Centimeters,
}

impl SensorTriple {
    pub fn new(front: Centimeters, left: Centimeters, right: Centimeters) -> Self {
        Self { front, left, right }
    }

    /// Distance reported by one sensor of the triple
    pub fn get(&self, sensor: SensorId) -> Centimeters {
        match sensor {
            SensorId::Front => self.front,
            SensorId::Left => self.left,
            SensorId::Right => self.right,
        }
    }
}

impl fmt::Display for SensorTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F={}cm L={}cm R={}cm", self.front, self.left, self.right)
    }
}

/// Navigation situation derived from one sensor triple.
///
/// Exactly one is active per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Situation {
    /// Plenty of room in front; cruise at the advised gear
    ClearAhead,
    /// Obstacle approaching; slow down to first gear
    PathClosing,
    /// Close obstacle with no side preference (equal open sides)
    PathBlocked,
    /// Close obstacle and both sides tight
    NarrowCorridor,
    /// Close obstacle, left side is the wider opening
    ClearLeft,
    /// Close obstacle, right side is the wider opening
    ClearRight,
    /// Medium range obstacle; look for a wide bypass
    SeekAlternate,
}

impl Situation {
    /// Short label sized for a 16 column character display
    pub fn label(&self) -> &'static str {
        match self {
            Situation::ClearAhead => "CLEAR AHEAD",
            Situation::PathClosing => "PATH CLOSING",
            Situation::PathBlocked => "PATH BLOCKED",
            Situation::NarrowCorridor => "NARROW CORRIDOR",
            Situation::ClearLeft => "CLEAR LEFT",
            Situation::ClearRight => "CLEAR RIGHT",
            Situation::SeekAlternate => "SEEK ALTERNATE",
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discrete forward drive speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gear {
    First,
    Second,
    Third,
    Fourth,
}

impl Gear {
    /// Zero-based index into the configured gear speed table
    pub fn index(&self) -> usize {
        match self {
            Gear::First => 0,
            Gear::Second => 1,
            Gear::Third => 2,
            Gear::Fourth => 3,
        }
    }

    /// Gear number as printed on the display (1-4)
    pub fn number(&self) -> u8 {
        self.index() as u8 + 1
    }
}

impl fmt::Display for Gear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gear {}", self.number())
    }
}
