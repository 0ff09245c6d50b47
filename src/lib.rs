//! SonarPilot - reactive obstacle avoidance for a three-sonar rover
//!
//! Each control cycle samples the front, left and right sonars, classifies
//! the free space into a [`Situation`](crate::core::types::Situation) and drives the
//! two wheel motors through the matching maneuver. A watchdog forces a
//! recovery U-turn when the front distance stops changing.
//!
//! Hardware is reached only through the traits in [`core::driver`]. The
//! [`devices`] module provides a simulated rover and test doubles.

pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod navigation;

pub use config::RoverConfig;
pub use error::{Error, Result};
pub use navigation::Pilot;
