//! Reactive navigation: perception, classification, maneuvers and recovery
//!
//! Components from leaf to root:
//!
//! - [`sampler`]: averaged sonar distances
//! - [`classifier`]: distances to one of seven situations
//! - [`gear`]: front clearance to cruising gear
//! - [`maneuver`]: situation to motor commands
//! - [`recovery`]: periodic stall watchdog
//! - [`display`]: status rows for the character display
//! - [`pilot`]: boot sequence and control loop

pub mod classifier;
pub mod display;
pub mod gear;
pub mod maneuver;
pub mod pilot;
pub mod recovery;
pub mod sampler;

pub use classifier::SituationClassifier;
pub use display::StatusPanel;
pub use gear::GearAdvisor;
pub use maneuver::ManeuverController;
pub use pilot::{CycleReport, Pilot};
pub use recovery::{RecoveryOutcome, RecoveryWindow, StuckRecoveryMonitor};
pub use sampler::DistanceSampler;
