//! Terminal render surface
//!
//! Draws the work-in-progress slots as a block of lines at the bottom of the
//! terminal. Each frame moves the cursor back to the top of the block,
//! clears downwards, prints any pending log lines (they scroll up and stay
//! in the scrollback) and then redraws the block.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveToColumn, MoveUp, Show},
    queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use wipline_core::console::{RenderSurface, SlotId};

/// Render surface backed by a terminal writer
pub struct TerminalSurface<W: Write> {
    out: W,
    lines: Vec<String>,
    idle_text: String,
    visible: bool,
    /// Lines of the block currently on screen
    drawn: usize,
    cursor_hidden: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, idle_text: impl Into<String>) -> Self {
        Self {
            out,
            lines: Vec::new(),
            idle_text: idle_text.into(),
            visible: false,
            drawn: 0,
            cursor_hidden: false,
        }
    }

    /// Draw one frame: pending log lines first, then the block
    pub fn present(&mut self, scrollback: &[String]) -> io::Result<()> {
        if scrollback.is_empty() && !self.visible && self.drawn == 0 {
            return Ok(());
        }

        self.erase_block()?;

        for line in scrollback {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }

        if self.visible && !self.lines.is_empty() {
            if !self.cursor_hidden {
                queue!(self.out, Hide)?;
                self.cursor_hidden = true;
            }
            for line in &self.lines {
                if *line == self.idle_text {
                    queue!(self.out, Print(line.as_str().dim()), Print("\r\n"))?;
                } else {
                    queue!(self.out, Print(line), Print("\r\n"))?;
                }
            }
            self.drawn = self.lines.len();
        }

        self.out.flush()
    }

    /// Remove the block from the screen and give the cursor back
    pub fn finish(&mut self, scrollback: &[String]) -> io::Result<()> {
        self.visible = false;
        self.present(scrollback)?;
        self.restore_cursor()
    }

    #[cfg(test)]
    fn writer(&self) -> &W {
        &self.out
    }

    fn erase_block(&mut self) -> io::Result<()> {
        if self.drawn > 0 {
            queue!(
                self.out,
                MoveToColumn(0),
                MoveUp(self.drawn as u16),
                Clear(ClearType::FromCursorDown)
            )?;
            self.drawn = 0;
        }
        Ok(())
    }

    fn restore_cursor(&mut self) -> io::Result<()> {
        if self.cursor_hidden {
            queue!(self.out, Show)?;
            self.cursor_hidden = false;
        }
        self.out.flush()
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn slot_count(&self) -> usize {
        self.lines.len()
    }

    fn grow_to(&mut self, count: usize) {
        if count > self.lines.len() {
            tracing::debug!(from = self.lines.len(), to = count, "Growing terminal area");
            self.lines.resize(count, self.idle_text.clone());
        }
    }

    fn set_text(&mut self, slot: SlotId, text: &str) {
        if let Some(line) = self.lines.get_mut(slot.index()) {
            if line != text {
                line.clear();
                line.push_str(text);
            }
        }
    }
}
