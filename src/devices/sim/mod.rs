//! Simulated rover for running the controller without hardware
//!
//! # Overview
//!
//! | Collaborator | Simulation |
//! |--------------|------------|
//! | Sonars | Ray cast against walls and boxes, Gaussian noise, random echo loss |
//! | Motors | PWM speed and H-bridge direction to wheel surface speed |
//! | Clock | Virtual time; physics advances only inside `delay` |
//! | Display | 16x2 buffer, changed rows go to the log |
//!
//! # Time model
//!
//! The controller is strictly blocking, so the simulation needs no thread of
//! its own. Every `Clock::delay` integrates the chassis forward in
//! `physics_step_ms` increments using the wheel commands in force at that
//! moment. With `speed_factor > 0` the delay also sleeps for
//! `duration / speed_factor` of wall time.
//!
//! ```text
//! ping  ──► ray cast at current pose
//! delay ──► step, step, step ... ──► (sleep)
//! ```

pub mod config;
mod arena;
mod display;
mod noise;
mod physics;

pub use config::{Obstacle, SimulationConfig};
pub use display::LogDisplay;
pub use physics::Pose;

use super::Hardware;
use crate::core::driver::{Clock, MotorPair, RangeSensor};
use crate::core::types::{Centimeters, Direction, MotorId, MotorSpeed, SensorId};
use crate::error::{Error, Result};
use arena::Arena;
use noise::EchoNoise;
use parking_lot::Mutex;
use physics::Chassis;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
struct WheelCommand {
    speed: MotorSpeed,
    direction: Direction,
}

impl WheelCommand {
    /// Signed surface speed in cm/s
    fn velocity(&self, max_speed: f32) -> f32 {
        let magnitude = f32::from(self.speed) / 255.0 * max_speed;
        match self.direction {
            Direction::Forward => magnitude,
            Direction::Backward => -magnitude,
            Direction::Release => 0.0,
        }
    }
}

struct SimWorld {
    config: SimulationConfig,
    arena: Arena,
    chassis: Chassis,
    noise: EchoNoise,
    wheels: [WheelCommand; 2],
    elapsed: Duration,
    collisions: u64,
}

impl SimWorld {
    fn advance(&mut self, duration: Duration) {
        let step = Duration::from_millis(self.config.physics_step_ms);
        let max_speed = self.config.max_wheel_speed_cm_s;
        let left = self.wheels[0].velocity(max_speed);
        let right = self.wheels[1].velocity(max_speed);

        let mut remaining = duration;
        while !remaining.is_zero() {
            let dt = remaining.min(step);
            if (left != 0.0 || right != 0.0)
                && self.chassis.step(dt.as_secs_f32(), left, right, &self.arena)
            {
                self.collisions += 1;
            }
            remaining -= dt;
        }
        self.elapsed += duration;
    }

    fn ping(&mut self, sensor: SensorId) -> Centimeters {
        let pose = self.chassis.pose();
        let side = self.config.sensor_side_angle_deg.to_radians();
        let offset = match sensor {
            SensorId::Front => 0.0,
            SensorId::Left => side,
            SensorId::Right => -side,
        };

        if self.noise.dropped() {
            return 0;
        }

        // Sonars sit on the rim of the chassis
        let range = self.arena.ray_cast(pose.x, pose.y, pose.heading + offset)
            - self.chassis.radius();
        if range > self.config.max_range_cm {
            return 0;
        }
        let measured = self.noise.perturb(range).round();
        measured.clamp(1.0, self.config.max_range_cm) as Centimeters
    }
}

/// Handle onto a running simulation
///
/// Cloning shares the same world; the collaborators produced by
/// [`hardware`](Self::hardware) all act on it.
#[derive(Clone)]
pub struct Simulation {
    world: Arc<Mutex<SimWorld>>,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        validate(config)?;

        let arena = Arena::new(
            config.arena_width_cm,
            config.arena_height_cm,
            config.obstacles.clone(),
        );
        let start = Pose {
            x: config.start_x,
            y: config.start_y,
            heading: config.start_heading_deg.to_radians(),
        };
        if arena.is_blocked(start.x, start.y, config.robot_radius_cm) {
            return Err(Error::Config(format!(
                "simulation start ({:.1}, {:.1}) overlaps a wall or obstacle",
                start.x, start.y
            )));
        }

        log::info!(
            "Simulated arena {}x{}cm with {} obstacles, start ({:.0}, {:.0}) heading {:.0}°",
            config.arena_width_cm,
            config.arena_height_cm,
            config.obstacles.len(),
            start.x,
            start.y,
            config.start_heading_deg
        );

        let world = SimWorld {
            chassis: Chassis::new(start, config.robot_radius_cm, config.wheel_base_cm),
            noise: EchoNoise::new(
                config.random_seed,
                config.range_stddev_cm,
                config.dropout_rate,
            ),
            arena,
            config: config.clone(),
            wheels: [WheelCommand::default(); 2],
            elapsed: Duration::ZERO,
            collisions: 0,
        };

        Ok(Self {
            world: Arc::new(Mutex::new(world)),
        })
    }

    /// Collaborators wired to this simulation
    pub fn hardware(&self) -> Hardware {
        let speed_factor = self.world.lock().config.speed_factor;
        Hardware {
            sensors: Box::new(SimSensors {
                world: Arc::clone(&self.world),
            }),
            motors: Box::new(SimMotors {
                world: Arc::clone(&self.world),
            }),
            display: Box::new(LogDisplay::new()),
            clock: Arc::new(SimClock {
                world: Arc::clone(&self.world),
                speed_factor,
            }),
        }
    }

    pub fn pose(&self) -> Pose {
        self.world.lock().chassis.pose()
    }

    /// Virtual time since start
    pub fn elapsed(&self) -> Duration {
        self.world.lock().elapsed
    }

    /// Physics steps whose translation was blocked
    pub fn collisions(&self) -> u64 {
        self.world.lock().collisions
    }
}

/// Slowest wall-time pacing; smaller factors would overflow the sleep time
const MIN_SPEED_FACTOR: f32 = 1e-3;

fn validate(config: &SimulationConfig) -> Result<()> {
    if config.arena_width_cm <= 0.0 || config.arena_height_cm <= 0.0 {
        return Err(Error::Config("simulation arena must have a positive size".to_string()));
    }
    if config.physics_step_ms == 0 {
        return Err(Error::Config("simulation physics_step_ms must be at least 1".to_string()));
    }
    if config.wheel_base_cm <= 0.0 || config.robot_radius_cm <= 0.0 {
        return Err(Error::Config(
            "simulation wheel_base_cm and robot_radius_cm must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.dropout_rate) {
        return Err(Error::Config(format!(
            "simulation dropout_rate {} outside 0..=1",
            config.dropout_rate
        )));
    }
    let pace = config.speed_factor;
    if !pace.is_finite() || pace < 0.0 || (pace > 0.0 && pace < MIN_SPEED_FACTOR) {
        return Err(Error::Config(format!(
            "simulation speed_factor {} must be 0 or in {}..",
            pace, MIN_SPEED_FACTOR
        )));
    }
    Ok(())
}

struct SimSensors {
    world: Arc<Mutex<SimWorld>>,
}

impl RangeSensor for SimSensors {
    fn ping(&mut self, sensor: SensorId) -> Result<Centimeters> {
        Ok(self.world.lock().ping(sensor))
    }

    fn center(&mut self) -> Result<()> {
        log::debug!("sonars centered");
        Ok(())
    }
}

struct SimMotors {
    world: Arc<Mutex<SimWorld>>,
}

fn wheel(motor: MotorId) -> usize {
    match motor {
        MotorId::Left => 0,
        MotorId::Right => 1,
    }
}

impl MotorPair for SimMotors {
    fn set_speed(&mut self, motor: MotorId, speed: MotorSpeed) -> Result<()> {
        self.world.lock().wheels[wheel(motor)].speed = speed;
        Ok(())
    }

    fn set_direction(&mut self, motor: MotorId, direction: Direction) -> Result<()> {
        self.world.lock().wheels[wheel(motor)].direction = direction;
        Ok(())
    }
}

struct SimClock {
    world: Arc<Mutex<SimWorld>>,
    speed_factor: f32,
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.world.lock().elapsed
    }

    fn delay(&self, duration: Duration) {
        self.world.lock().advance(duration);
        if self.speed_factor > 0.0 {
            std::thread::sleep(duration.div_f32(self.speed_factor));
        }
    }
}
