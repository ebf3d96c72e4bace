pub mod report;

use anyhow::{Context, Result};
use std::io::Write;

/// Vertical pixel offsets of the status rows on the 128x64 panel.
pub const ROW_ACC_X: u32 = 0;
pub const ROW_ACC_Y: u32 = 10;
pub const ROW_ACC_Z: u32 = 20;
pub const ROW_ESTIMATES: u32 = 30;
pub const ROW_PEAK: u32 = 40;
pub const ROW_STEPS: u32 = 50;

/// Receives short status lines, one per screen row.
pub trait StatusSink {
    fn clear(&mut self);
    fn draw_line(&mut self, row: u32, text: &str);
    /// Push the composed frame to the output.
    fn present(&mut self) -> Result<()>;
}

/// Text stand-in for the panel: writes each composed frame to `out`,
/// skipping frames identical to the previous one.
pub struct TerminalDisplay<W: Write> {
    out: W,
    rows: Vec<(u32, String)>,
    last_frame: String,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: Vec::with_capacity(6),
            last_frame: String::new(),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for TerminalDisplay<W> {
    fn clear(&mut self) {
        self.rows.clear();
    }

    fn draw_line(&mut self, row: u32, text: &str) {
        match self.rows.iter_mut().find(|(r, _)| *r == row) {
            Some((_, line)) => {
                line.clear();
                line.push_str(text);
            }
            None => self.rows.push((row, text.to_string())),
        }
    }

    fn present(&mut self) -> Result<()> {
        self.rows.sort_by_key(|(row, _)| *row);
        let mut frame = String::new();
        for (_, line) in &self.rows {
            frame.push_str(line);
            frame.push('\n');
        }
        if frame == self.last_frame {
            return Ok(());
        }

        self.out
            .write_all(frame.as_bytes())
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush())
            .context("Failed to write status frame")?;
        self.last_frame = frame;
        Ok(())
    }
}
