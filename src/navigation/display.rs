//! Two-row status readout
//!
//! ```text
//! +----------------+
//! |NARROW CORRIDOR |   row 0: situation
//! |F025 L004 R006  |   row 1: smoothed distances
//! +----------------+
//! ```
//!
//! Display output is informational. Write failures are logged and dropped.

use crate::core::driver::StatusDisplay;
use crate::core::types::{Centimeters, SensorTriple, Situation};

/// Character columns per row
pub const PANEL_COLUMNS: usize = 16;

const SITUATION_ROW: u8 = 0;
const DISTANCE_ROW: u8 = 1;

/// Formats controller state onto a [`StatusDisplay`]
pub struct StatusPanel {
    display: Box<dyn StatusDisplay>,
}

impl StatusPanel {
    pub fn new(display: Box<dyn StatusDisplay>) -> Self {
        Self { display }
    }

    /// Boot banner: product name and device name
    pub fn banner(&mut self, device_name: &str) {
        self.write_row(SITUATION_ROW, "SONAR PILOT");
        self.write_row(DISTANCE_ROW, device_name);
    }

    pub fn show_situation(&mut self, situation: Situation) {
        self.write_row(SITUATION_ROW, situation.label());
    }

    /// Three fixed-width fields, clamped to 999cm
    pub fn show_triple(&mut self, triple: &SensorTriple) {
        let text = format_triple(triple);
        self.write_row(DISTANCE_ROW, &text);
    }

    fn write_row(&mut self, row: u8, text: &str) {
        let padded = pad_row(text);
        if let Err(e) = self.display.write_line(row, 0, &padded) {
            log::debug!("status row {} not written: {}", row, e);
        }
    }
}

/// `F025 L004 R006`
pub fn format_triple(triple: &SensorTriple) -> String {
    fn field(cm: Centimeters) -> Centimeters {
        cm.min(999)
    }
    format!(
        "F{:03} L{:03} R{:03}",
        field(triple.front),
        field(triple.left),
        field(triple.right)
    )
}

/// Truncate or space-pad to exactly one row so stale characters are cleared
fn pad_row(text: &str) -> String {
    let mut row: String = text.chars().take(PANEL_COLUMNS).collect();
    let len = row.chars().count();
    row.extend(std::iter::repeat(' ').take(PANEL_COLUMNS - len));
    row
}
