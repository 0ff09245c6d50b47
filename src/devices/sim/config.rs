//! Simulated rover configuration
//!
//! Every parameter has a default, so `[device.simulation]` may be omitted
//! entirely. Lengths are in centimeters, angles in degrees.
//!
//! ```toml
//! [device.simulation]
//! arena_width_cm = 300.0
//! arena_height_cm = 200.0
//! start_x = 40.0
//! start_y = 100.0
//! speed_factor = 1.0   # 0 = as fast as possible
//!
//! [[device.simulation.obstacles]]
//! x = 150.0
//! y = 70.0
//! width = 30.0
//! height = 60.0
//! ```

use serde::Deserialize;

/// Axis-aligned box obstacle; `(x, y)` is its lower-left corner
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Arena size along X (default: 300)
    #[serde(default = "default_arena_width")]
    pub arena_width_cm: f32,

    /// Arena size along Y (default: 200)
    #[serde(default = "default_arena_height")]
    pub arena_height_cm: f32,

    /// Boxes inside the arena walls
    #[serde(default = "default_obstacles")]
    pub obstacles: Vec<Obstacle>,

    /// Starting X position (default: 40)
    #[serde(default = "default_start_x")]
    pub start_x: f32,

    /// Starting Y position (default: 100)
    #[serde(default = "default_start_y")]
    pub start_y: f32,

    /// Starting heading, CCW from +X (default: 0)
    #[serde(default)]
    pub start_heading_deg: f32,

    /// Collision radius of the chassis (default: 9)
    #[serde(default = "default_robot_radius")]
    pub robot_radius_cm: f32,

    /// Distance between the drive wheels (default: 14)
    #[serde(default = "default_wheel_base")]
    pub wheel_base_cm: f32,

    /// Wheel surface speed at PWM 255 (default: 40)
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed_cm_s: f32,

    /// Mounting angle of the side sonars from straight ahead (default: 90)
    #[serde(default = "default_side_angle")]
    pub sensor_side_angle_deg: f32,

    /// Farthest echo a sonar reports; beyond reads as 0 (default: 400)
    #[serde(default = "default_max_range")]
    pub max_range_cm: f32,

    /// Gaussian range noise (default: 1.0)
    #[serde(default = "default_range_stddev")]
    pub range_stddev_cm: f32,

    /// Probability that a ping gets no echo (default: 0.02)
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f32,

    /// Wall-time pacing: 1.0 = real time, 0 = as fast as possible (default: 1.0)
    ///
    /// Must be 0 or at least 0.001.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f32,

    /// Physics integration step in milliseconds (default: 10)
    #[serde(default = "default_physics_step_ms")]
    pub physics_step_ms: u64,

    /// Noise seed; 0 = random each run
    #[serde(default)]
    pub random_seed: u64,
}

fn default_arena_width() -> f32 {
    300.0
}
fn default_arena_height() -> f32 {
    200.0
}
fn default_obstacles() -> Vec<Obstacle> {
    vec![
        Obstacle::new(150.0, 70.0, 30.0, 60.0),
        Obstacle::new(230.0, 20.0, 20.0, 40.0),
        Obstacle::new(60.0, 160.0, 50.0, 15.0),
    ]
}
fn default_start_x() -> f32 {
    40.0
}
fn default_start_y() -> f32 {
    100.0
}
fn default_robot_radius() -> f32 {
    9.0
}
fn default_wheel_base() -> f32 {
    14.0
}
fn default_max_wheel_speed() -> f32 {
    40.0
}
fn default_side_angle() -> f32 {
    90.0
}
fn default_max_range() -> f32 {
    400.0
}
fn default_range_stddev() -> f32 {
    1.0
}
fn default_dropout_rate() -> f32 {
    0.02
}
fn default_speed_factor() -> f32 {
    1.0
}
fn default_physics_step_ms() -> u64 {
    10
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            arena_width_cm: default_arena_width(),
            arena_height_cm: default_arena_height(),
            obstacles: default_obstacles(),
            start_x: default_start_x(),
            start_y: default_start_y(),
            start_heading_deg: 0.0,
            robot_radius_cm: default_robot_radius(),
            wheel_base_cm: default_wheel_base(),
            max_wheel_speed_cm_s: default_max_wheel_speed(),
            sensor_side_angle_deg: default_side_angle(),
            max_range_cm: default_max_range(),
            range_stddev_cm: default_range_stddev(),
            dropout_rate: default_dropout_rate(),
            speed_factor: default_speed_factor(),
            physics_step_ms: default_physics_step_ms(),
            random_seed: 0,
        }
    }
}
