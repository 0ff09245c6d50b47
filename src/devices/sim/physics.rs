//! Differential-drive kinematics with a stop-on-collision rule

use super::arena::Arena;
use std::f32::consts::{PI, TAU};

/// Robot pose in the arena frame (cm, radians CCW from +X)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

pub struct Chassis {
    pose: Pose,
    radius: f32,
    wheel_base: f32,
}

impl Chassis {
    pub fn new(pose: Pose, radius: f32, wheel_base: f32) -> Self {
        Self {
            pose: Pose {
                heading: normalize_angle(pose.heading),
                ..pose
            },
            radius,
            wheel_base,
        }
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Advance by `dt` seconds with the given wheel surface speeds (cm/s).
    ///
    /// Returns true if the translation was blocked. Rotation still applies,
    /// so a robot pinned against a wall can spin free.
    pub fn step(&mut self, dt: f32, left: f32, right: f32, arena: &Arena) -> bool {
        let linear = (left + right) / 2.0;
        let angular = (right - left) / self.wheel_base;
        let Pose { x, y, heading } = self.pose;

        let new_heading = heading + angular * dt;
        let (new_x, new_y) = if angular.abs() < 1e-6 {
            (
                x + linear * heading.cos() * dt,
                y + linear * heading.sin() * dt,
            )
        } else {
            let r = linear / angular;
            (
                x + r * (new_heading.sin() - heading.sin()),
                y + r * (heading.cos() - new_heading.cos()),
            )
        };

        self.pose.heading = normalize_angle(new_heading);
        if arena.is_blocked(new_x, new_y, self.radius) {
            return true;
        }
        self.pose.x = new_x;
        self.pose.y = new_y;
        false
    }
}

/// Normalize angle to [-π, π)
fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a >= PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}
