//! Mock collaborators for unit and integration testing
//!
//! Every mock is a cheap `Clone` handle onto shared state, so a test can hand
//! one clone to the control loop and keep another to script inputs and
//! inspect what the loop did.

use crate::core::driver::{Clock, MotorPair, RangeSensor, StatusDisplay};
use crate::core::types::{Centimeters, Direction, MotorId, MotorSpeed, SensorId, SensorTriple};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Range sensor
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum ScriptedPing {
    Echo(Centimeters),
    Fault,
}

#[derive(Debug, Default)]
struct ScriptedSensorState {
    queued: HashMap<SensorId, VecDeque<ScriptedPing>>,
    steady: HashMap<SensorId, Centimeters>,
    pings: HashMap<SensorId, usize>,
    centered: bool,
}

/// Range sensor that replays queued pings, then repeats a steady value
#[derive(Clone, Default)]
pub struct ScriptedRangeSensor {
    inner: Arc<Mutex<ScriptedSensorState>>,
}

impl ScriptedRangeSensor {
    /// Create a sensor that reads 0 everywhere until scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sensor holding a steady triple
    pub fn with_steady(triple: SensorTriple) -> Self {
        let sensor = Self::new();
        sensor.set_steady(triple);
        sensor
    }

    /// Value returned by every sensor once its queue is empty
    pub fn set_steady(&self, triple: SensorTriple) {
        let mut inner = self.inner.lock();
        for sensor in SensorId::ALL {
            inner.steady.insert(sensor, triple.get(sensor));
        }
    }

    /// Steady value for one sensor
    pub fn set_steady_one(&self, sensor: SensorId, distance: Centimeters) {
        self.inner.lock().steady.insert(sensor, distance);
    }

    /// Queue raw pings returned before the steady value
    pub fn push_pings(&self, sensor: SensorId, pings: &[Centimeters]) {
        let mut inner = self.inner.lock();
        let queue = inner.queued.entry(sensor).or_default();
        queue.extend(pings.iter().map(|&cm| ScriptedPing::Echo(cm)));
    }

    /// Queue a ping that fails with a sensor fault
    pub fn push_fault(&self, sensor: SensorId) {
        let mut inner = self.inner.lock();
        inner
            .queued
            .entry(sensor)
            .or_default()
            .push_back(ScriptedPing::Fault);
    }

    /// Number of pings taken from a sensor so far
    pub fn ping_count(&self, sensor: SensorId) -> usize {
        self.inner.lock().pings.get(&sensor).copied().unwrap_or(0)
    }

    /// Pings still queued for a sensor
    pub fn queued(&self, sensor: SensorId) -> usize {
        self.inner
            .lock()
            .queued
            .get(&sensor)
            .map_or(0, VecDeque::len)
    }

    /// Whether `center` was called
    pub fn is_centered(&self) -> bool {
        self.inner.lock().centered
    }
}

impl RangeSensor for ScriptedRangeSensor {
    fn ping(&mut self, sensor: SensorId) -> Result<Centimeters> {
        let mut inner = self.inner.lock();
        *inner.pings.entry(sensor).or_insert(0) += 1;

        let next = inner.queued.get_mut(&sensor).and_then(VecDeque::pop_front);
        match next {
            Some(ScriptedPing::Echo(cm)) => Ok(cm),
            Some(ScriptedPing::Fault) => Err(Error::SensorFault {
                sensor,
                reason: "scripted fault".to_string(),
            }),
            None => Ok(inner.steady.get(&sensor).copied().unwrap_or(0)),
        }
    }

    fn center(&mut self) -> Result<()> {
        self.inner.lock().centered = true;
        Ok(())
    }
}

// ============================================================================
// Motors
// ============================================================================

/// One command received by [`RecordingMotors`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    Speed(MotorId, MotorSpeed),
    Direction(MotorId, Direction),
}

#[derive(Debug, Default)]
struct RecordingMotorState {
    commands: Vec<MotorCommand>,
    speeds: [MotorSpeed; 2],
    directions: [Direction; 2],
    fail_next: bool,
}

fn motor_slot(motor: MotorId) -> usize {
    match motor {
        MotorId::Left => 0,
        MotorId::Right => 1,
    }
}

/// Motor pair that records every command
#[derive(Clone, Default)]
pub struct RecordingMotors {
    inner: Arc<Mutex<RecordingMotorState>>,
}

impl RecordingMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands in the order received
    pub fn commands(&self) -> Vec<MotorCommand> {
        self.inner.lock().commands.clone()
    }

    /// Forget recorded commands (current state is kept)
    pub fn clear(&self) {
        self.inner.lock().commands.clear();
    }

    /// Current (left, right) speeds
    pub fn speeds(&self) -> (MotorSpeed, MotorSpeed) {
        let inner = self.inner.lock();
        (inner.speeds[0], inner.speeds[1])
    }

    /// Current (left, right) directions
    pub fn directions(&self) -> (Direction, Direction) {
        let inner = self.inner.lock();
        (inner.directions[0], inner.directions[1])
    }

    /// Make the next command fail with a motor fault
    pub fn fail_next_command(&self) {
        self.inner.lock().fail_next = true;
    }

    fn take_failure(state: &mut RecordingMotorState, motor: MotorId) -> Result<()> {
        if state.fail_next {
            state.fail_next = false;
            return Err(Error::MotorFault {
                motor,
                reason: "scripted fault".to_string(),
            });
        }
        Ok(())
    }
}

impl MotorPair for RecordingMotors {
    fn set_speed(&mut self, motor: MotorId, speed: MotorSpeed) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::take_failure(&mut inner, motor)?;
        inner.speeds[motor_slot(motor)] = speed;
        inner.commands.push(MotorCommand::Speed(motor, speed));
        Ok(())
    }

    fn set_direction(&mut self, motor: MotorId, direction: Direction) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::take_failure(&mut inner, motor)?;
        inner.directions[motor_slot(motor)] = direction;
        inner.commands.push(MotorCommand::Direction(motor, direction));
        Ok(())
    }
}

// ============================================================================
// Clock
// ============================================================================

#[derive(Debug, Default)]
struct ManualClockState {
    now: Duration,
    delays: Vec<Duration>,
}

/// Virtual clock: time only moves on `delay` or `advance`
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a delay
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// Every delay requested so far
    pub fn delays(&self) -> Vec<Duration> {
        self.inner.lock().delays.clone()
    }

    /// Sum of all requested delays
    pub fn total_delayed(&self) -> Duration {
        self.inner.lock().delays.iter().sum()
    }

    pub fn clear_delays(&self) {
        self.inner.lock().delays.clear();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }

    fn delay(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.now += duration;
        inner.delays.push(duration);
    }
}

// ============================================================================
// Display
// ============================================================================

/// Columns on the character display
pub const MOCK_DISPLAY_COLUMNS: usize = 16;

#[derive(Debug, Default)]
struct MemoryDisplayState {
    rows: Vec<String>,
    writes: usize,
    failing: bool,
}

/// In-memory character display
#[derive(Clone, Default)]
pub struct MemoryDisplay {
    inner: Arc<Mutex<MemoryDisplayState>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a row (trailing spaces trimmed)
    pub fn row(&self, row: u8) -> String {
        self.inner
            .lock()
            .rows
            .get(row as usize)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default()
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    /// Make every write fail
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }
}

impl StatusDisplay for MemoryDisplay {
    fn write_line(&mut self, row: u8, col: u8, text: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.failing {
            return Err(Error::DisplayFault("scripted fault".to_string()));
        }

        let row = row as usize;
        while inner.rows.len() <= row {
            inner.rows.push(" ".repeat(MOCK_DISPLAY_COLUMNS));
        }

        let mut cells: Vec<char> = inner.rows[row].chars().collect();
        for (offset, ch) in text.chars().enumerate() {
            let idx = col as usize + offset;
            if idx >= MOCK_DISPLAY_COLUMNS {
                break;
            }
            cells[idx] = ch;
        }
        inner.rows[row] = cells.into_iter().collect();
        inner.writes += 1;
        Ok(())
    }
}
