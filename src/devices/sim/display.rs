//! 16x2 character display that writes changed rows to the log

use crate::core::driver::StatusDisplay;
use crate::error::{Error, Result};

const COLUMNS: usize = 16;
const ROWS: usize = 2;

pub struct LogDisplay {
    rows: [[char; COLUMNS]; ROWS],
}

impl LogDisplay {
    pub fn new() -> Self {
        Self {
            rows: [[' '; COLUMNS]; ROWS],
        }
    }

    pub fn row(&self, row: usize) -> String {
        self.rows[row].iter().collect()
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusDisplay for LogDisplay {
    fn write_line(&mut self, row: u8, col: u8, text: &str) -> Result<()> {
        let row = row as usize;
        if row >= ROWS {
            return Err(Error::DisplayFault(format!("row {} out of range", row)));
        }

        let before = self.rows[row];
        for (cell, ch) in self.rows[row]
            .iter_mut()
            .skip(col as usize)
            .zip(text.chars())
        {
            *cell = ch;
        }

        if self.rows[row] != before {
            log::info!("[lcd {}] {}", row, self.row(row).trim_end());
        }
        Ok(())
    }
}
