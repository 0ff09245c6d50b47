//! Configuration for SonarPilot
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or no
//! file at all) yields the stock rover tuning:
//!
//! ```toml
//! [sampling]
//! min_pings = 3
//! max_pings = 5
//!
//! [classifier]
//! clear_ahead_cm = 50
//!
//! [device]
//! type = "sim"
//!
//! [device.simulation]
//! start_x = 40.0
//! start_y = 40.0
//! ```

use crate::core::types::{Centimeters, Gear, MotorSpeed};
use crate::devices::sim::SimulationConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoverConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub gears: GearConfig,
    #[serde(default)]
    pub maneuvers: ManeuverConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Raw ping averaging
#[derive(Clone, Debug, Deserialize)]
pub struct SamplingConfig {
    /// Fewest raw pings per measurement (default: 3)
    #[serde(default = "default_min_pings")]
    pub min_pings: u8,

    /// Most raw pings per measurement (default: 5)
    #[serde(default = "default_max_pings")]
    pub max_pings: u8,

    /// Echo settle wait after each ping in milliseconds (default: 5)
    #[serde(default = "default_ping_settle_ms")]
    pub ping_settle_ms: u64,

    /// Whole front measurements to retry before falling back (default: 100)
    #[serde(default = "default_front_retry_limit")]
    pub front_retry_limit: u32,

    /// Seed for ping-count jitter; 0 = random each run
    #[serde(default)]
    pub random_seed: u64,
}

/// Situation thresholds, all in centimeters
#[derive(Clone, Debug, Deserialize)]
pub struct ClassifierConfig {
    /// Front distance above which the path is clear (default: 50)
    #[serde(default = "default_clear_ahead_cm")]
    pub clear_ahead_cm: Centimeters,

    /// Front distance above which a bypass is sought (default: 40)
    #[serde(default = "default_seek_alternate_cm")]
    pub seek_alternate_cm: Centimeters,

    /// Front distance above which the path is merely closing (default: 30)
    #[serde(default = "default_path_closing_cm")]
    pub path_closing_cm: Centimeters,

    /// Side distance below which a side counts as tight (default: 8)
    #[serde(default = "default_side_clearance_cm")]
    pub side_clearance_cm: Centimeters,

    /// Side distance that counts as a wide bypass (default: 80)
    #[serde(default = "default_wide_bypass_cm")]
    pub wide_bypass_cm: Centimeters,
}

/// Gear speeds and front-clearance thresholds
#[derive(Clone, Debug, Deserialize)]
pub struct GearConfig {
    /// PWM speed for gears 1-4 (default: [110, 150, 200, 255])
    #[serde(default = "default_gear_speeds")]
    pub speeds: [MotorSpeed; 4],

    /// Front distance selecting second gear (default: 100)
    #[serde(default = "default_second_gear_cm")]
    pub second_gear_cm: Centimeters,

    /// Front distance selecting third gear (default: 200)
    #[serde(default = "default_third_gear_cm")]
    pub third_gear_cm: Centimeters,

    /// Front distance selecting fourth gear (default: 275)
    #[serde(default = "default_fourth_gear_cm")]
    pub fourth_gear_cm: Centimeters,
}

/// Maneuver timing in milliseconds.
///
/// Turn durations are tuned empirically for the chassis; they stand in for
/// "the rotation has finished" and are not derived from wheel speed.
#[derive(Clone, Debug, Deserialize)]
pub struct ManeuverConfig {
    /// Spin time for a quarter turn (default: 500)
    #[serde(default = "default_quarter_turn_ms")]
    pub quarter_turn_ms: u64,

    /// Settle after a quarter turn (default: 500)
    #[serde(default = "default_quarter_turn_settle_ms")]
    pub quarter_turn_settle_ms: u64,

    /// Spin time for a U-turn (default: 1250)
    #[serde(default = "default_u_turn_ms")]
    pub u_turn_ms: u64,

    /// Settle after a U-turn (default: 1000)
    #[serde(default = "default_u_turn_settle_ms")]
    pub u_turn_settle_ms: u64,

    /// Brief reverse before turning away (default: 400)
    #[serde(default = "default_reverse_ms")]
    pub reverse_ms: u64,

    /// Pause after stopping (default: 250)
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// Time each wheel is held at zero during a lane overtake (default: 400)
    #[serde(default = "default_overtake_ms")]
    pub overtake_ms: u64,
}

/// Stuck detection
#[derive(Clone, Debug, Deserialize)]
pub struct RecoveryConfig {
    /// Minimum time between evaluations in milliseconds (default: 5000)
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Front change at or below which no progress was made (default: 10)
    #[serde(default = "default_front_threshold_cm")]
    pub front_threshold_cm: Centimeters,

    /// Front change at or below which a far reading counts as stagnant (default: 5)
    #[serde(default = "default_long_vision_threshold_cm")]
    pub long_vision_threshold_cm: Centimeters,

    /// Boundary between close-range stall and long-range crawl (default: 100)
    #[serde(default = "default_long_range_cm")]
    pub long_range_cm: Centimeters,

    /// Stagnant evaluations tolerated before recovering (default: 2)
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,

    /// Reverse time during recovery in milliseconds (default: 1000)
    #[serde(default = "default_recovery_reverse_ms")]
    pub reverse_ms: u64,
}

/// Device selection
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device type; only "sim" is built in
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Human readable name shown at boot
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Simulation parameters for the "sim" device
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_min_pings() -> u8 {
    3
}
fn default_max_pings() -> u8 {
    5
}
fn default_ping_settle_ms() -> u64 {
    5
}
fn default_front_retry_limit() -> u32 {
    100
}
fn default_clear_ahead_cm() -> Centimeters {
    50
}
fn default_seek_alternate_cm() -> Centimeters {
    40
}
fn default_path_closing_cm() -> Centimeters {
    30
}
fn default_side_clearance_cm() -> Centimeters {
    8
}
fn default_wide_bypass_cm() -> Centimeters {
    80
}
fn default_gear_speeds() -> [MotorSpeed; 4] {
    [110, 150, 200, 255]
}
fn default_second_gear_cm() -> Centimeters {
    100
}
fn default_third_gear_cm() -> Centimeters {
    200
}
fn default_fourth_gear_cm() -> Centimeters {
    275
}
fn default_quarter_turn_ms() -> u64 {
    500
}
fn default_quarter_turn_settle_ms() -> u64 {
    500
}
fn default_u_turn_ms() -> u64 {
    1250
}
fn default_u_turn_settle_ms() -> u64 {
    1000
}
fn default_reverse_ms() -> u64 {
    400
}
fn default_pause_ms() -> u64 {
    250
}
fn default_overtake_ms() -> u64 {
    400
}
fn default_check_interval_ms() -> u64 {
    5000
}
fn default_front_threshold_cm() -> Centimeters {
    10
}
fn default_long_vision_threshold_cm() -> Centimeters {
    5
}
fn default_long_range_cm() -> Centimeters {
    100
}
fn default_stagnation_limit() -> u32 {
    2
}
fn default_recovery_reverse_ms() -> u64 {
    1000
}
fn default_device_type() -> String {
    "sim".to_string()
}
fn default_device_name() -> String {
    "Simulated sonar rover".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            min_pings: default_min_pings(),
            max_pings: default_max_pings(),
            ping_settle_ms: default_ping_settle_ms(),
            front_retry_limit: default_front_retry_limit(),
            random_seed: 0,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            clear_ahead_cm: default_clear_ahead_cm(),
            seek_alternate_cm: default_seek_alternate_cm(),
            path_closing_cm: default_path_closing_cm(),
            side_clearance_cm: default_side_clearance_cm(),
            wide_bypass_cm: default_wide_bypass_cm(),
        }
    }
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            speeds: default_gear_speeds(),
            second_gear_cm: default_second_gear_cm(),
            third_gear_cm: default_third_gear_cm(),
            fourth_gear_cm: default_fourth_gear_cm(),
        }
    }
}

impl GearConfig {
    /// PWM speed for a gear
    pub fn speed(&self, gear: Gear) -> MotorSpeed {
        self.speeds[gear.index()]
    }
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            quarter_turn_ms: default_quarter_turn_ms(),
            quarter_turn_settle_ms: default_quarter_turn_settle_ms(),
            u_turn_ms: default_u_turn_ms(),
            u_turn_settle_ms: default_u_turn_settle_ms(),
            reverse_ms: default_reverse_ms(),
            pause_ms: default_pause_ms(),
            overtake_ms: default_overtake_ms(),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            front_threshold_cm: default_front_threshold_cm(),
            long_vision_threshold_cm: default_long_vision_threshold_cm(),
            long_range_cm: default_long_range_cm(),
            stagnation_limit: default_stagnation_limit(),
            reverse_ms: default_recovery_reverse_ms(),
        }
    }
}

impl RecoveryConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RoverConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RoverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tunings the control loop cannot honour
    pub fn validate(&self) -> Result<()> {
        let s = &self.sampling;
        if s.min_pings == 0 || s.min_pings > s.max_pings {
            return Err(Error::Config(format!(
                "sampling.min_pings ({}) must be in 1..=max_pings ({})",
                s.min_pings, s.max_pings
            )));
        }

        let c = &self.classifier;
        if !(c.path_closing_cm < c.seek_alternate_cm && c.seek_alternate_cm < c.clear_ahead_cm) {
            return Err(Error::Config(format!(
                "classifier thresholds must increase: {} / {} / {}cm",
                c.path_closing_cm, c.seek_alternate_cm, c.clear_ahead_cm
            )));
        }

        let g = &self.gears;
        if !(g.second_gear_cm < g.third_gear_cm && g.third_gear_cm < g.fourth_gear_cm) {
            return Err(Error::Config(
                "gear thresholds must increase from second to fourth gear".to_string(),
            ));
        }
        if g.speeds.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(Error::Config(format!(
                "gear speeds must not decrease: {:?}",
                g.speeds
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoverConfig::default();
        assert_eq!(config.sampling.min_pings, 3);
        assert_eq!(config.sampling.max_pings, 5);
        assert_eq!(config.classifier.clear_ahead_cm, 50);
        assert_eq!(config.gears.fourth_gear_cm, 275);
        assert_eq!(config.maneuvers.u_turn_ms, 1250);
        assert_eq!(config.recovery.check_interval_ms, 5000);
        assert_eq!(config.device.device_type, "sim");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = RoverConfig::from_toml("").unwrap();
        assert_eq!(config.classifier.side_clearance_cm, 8);
        assert_eq!(config.recovery.stagnation_limit, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[sampling]
min_pings = 4
max_pings = 4
random_seed = 7

[gears]
speeds = [90, 120, 180, 240]

[recovery]
check_interval_ms = 3000

[device]
type = "sim"
name = "Bench rover"

[logging]
level = "debug"
"#;

        let config = RoverConfig::from_toml(toml_content).unwrap();
        assert_eq!(config.sampling.min_pings, 4);
        assert_eq!(config.sampling.random_seed, 7);
        assert_eq!(config.gears.speed(Gear::Third), 180);
        assert_eq!(config.recovery.check_interval(), Duration::from_millis(3000));
        assert_eq!(config.device.name, "Bench rover");
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.maneuvers.quarter_turn_ms, 500);
    }

    #[test]
    fn test_rejects_inverted_ping_range() {
        let result = RoverConfig::from_toml("[sampling]\nmin_pings = 6\nmax_pings = 3\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_pings() {
        let result = RoverConfig::from_toml("[sampling]\nmin_pings = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let result = RoverConfig::from_toml("[classifier]\nseek_alternate_cm = 60\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = RoverConfig::from_toml("[sampling\nmin_pings = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
