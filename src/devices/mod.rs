//! Device implementations

pub mod mock;
pub mod sim;

use crate::config::DeviceConfig;
use crate::core::driver::{Clock, MotorPair, RangeSensor, StatusDisplay};
use crate::error::{Error, Result};
use sim::Simulation;
use std::sync::Arc;

/// The four collaborators the control loop drives
pub struct Hardware {
    pub sensors: Box<dyn RangeSensor>,
    pub motors: Box<dyn MotorPair>,
    pub display: Box<dyn StatusDisplay>,
    pub clock: Arc<dyn Clock>,
}

/// Create the hardware bundle based on configuration
pub fn create_device(config: &DeviceConfig) -> Result<Hardware> {
    match config.device_type.as_str() {
        "sim" => {
            let simulation = Simulation::new(&config.simulation)?;
            Ok(simulation.hardware())
        }
        _ => Err(Error::UnknownDevice(config.device_type.clone())),
    }
}
