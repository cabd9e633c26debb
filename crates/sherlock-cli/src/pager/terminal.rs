use std::io::{self, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

/// Output sink plus single-key input.
pub trait Terminal: Write {
    /// Size captured when the terminal was opened.
    fn size(&self) -> TerminalSize;

    /// Blocks until one key is available. `None` means input is closed.
    fn read_char(&mut self) -> io::Result<Option<char>>;
}

/// The process terminal in raw mode. Dropping it restores cooked mode.
pub struct CrosstermTerminal {
    out: Stdout,
    size: TerminalSize,
}

impl CrosstermTerminal {
    pub fn enter() -> Result<Self> {
        let (columns, rows) = crossterm::terminal::size().context("failed to query terminal size")?;
        enable_raw_mode().context("failed to enable raw mode")?;
        Ok(Self {
            out: io::stdout(),
            size: TerminalSize { columns, rows },
        })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.out, cursor::MoveTo(0, self.size.rows), cursor::Show);
    }
}

impl Write for CrosstermTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> TerminalSize {
        self.size
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
            {
                return Ok(None);
            }
            match key.code {
                KeyCode::Char(ch) => return Ok(Some(ch)),
                KeyCode::Enter => return Ok(Some('\n')),
                _ => {}
            }
        }
    }
}
