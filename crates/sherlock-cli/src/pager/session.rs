use std::collections::HashMap;
use std::io;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, Stylize, style};
use crossterm::terminal::{Clear, ClearType};

use super::terminal::{Terminal, TerminalSize};

/// Rows kept between the cursor and either edge before the viewport scrolls.
pub const SCROLL_MARGIN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub column: usize,
    pub row: usize,
}

impl Cursor {
    pub const HOME: Cursor = Cursor { column: 1, row: 1 };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<A> {
    pub text: String,
    pub action: Option<A>,
}

/// Viewport position remembered under a view name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedView {
    pub offset: usize,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuitAction<A> {
    Terminate,
    Run(A),
}

pub struct Session<T, A> {
    terminal: T,
    size: TerminalSize,
    buffer: Vec<Line<A>>,
    cursor: Cursor,
    offset: usize,
    needs_redraw: bool,
    saved: HashMap<String, SavedView>,
    quit: QuitAction<A>,
    status: String,
}

impl<T: Terminal, A> Session<T, A> {
    pub fn new(terminal: T) -> io::Result<Self> {
        let size = terminal.size();
        let mut session = Self {
            terminal,
            size,
            buffer: Vec::new(),
            cursor: Cursor::HOME,
            offset: 0,
            needs_redraw: false,
            saved: HashMap::new(),
            quit: QuitAction::Terminate,
            status: String::new(),
        };
        session.erase()?;
        Ok(session)
    }

    pub fn add_line(&mut self, text: impl Into<String>, action: Option<A>) {
        self.buffer.push(Line {
            text: text.into(),
            action,
        });
        self.needs_redraw = true;
    }

    /// Empties the buffer, homes the cursor and blanks the screen.
    pub fn clear(&mut self) -> io::Result<()> {
        self.buffer.clear();
        self.offset = 0;
        self.cursor = Cursor::HOME;
        self.status.clear();
        self.needs_redraw = true;
        self.erase()?;
        self.terminal.flush()
    }

    /// Applies the scroll rules for the current cursor and redraws if
    /// anything changed since the last draw.
    pub fn update(&mut self) -> io::Result<()> {
        let rows = self.size.rows as isize;
        let row = self.cursor.row as isize;
        let offset = self.offset as isize;
        let len = self.buffer.len() as isize;
        let margin = SCROLL_MARGIN as isize;

        let delta = rows - row;
        if delta <= margin && len > rows + offset + delta {
            self.cursor.row = self.cursor.row.saturating_sub(1).max(1);
            if delta > 0 {
                self.offset += 1;
            }
            self.needs_redraw = true;
        }

        if self.cursor.row <= SCROLL_MARGIN + 1 && self.offset > 0 {
            self.cursor.row += 1;
            self.offset -= 1;
            self.needs_redraw = true;
        }

        if self.needs_redraw {
            self.needs_redraw = false;
            self.draw()?;
        }
        Ok(())
    }

    /// Repaints the visible window, the status line and the cursor.
    pub fn draw(&mut self) -> io::Result<()> {
        self.erase()?;
        let visible = usize::from(self.size.rows.saturating_sub(1));
        let end = self.offset.saturating_add(visible).min(self.buffer.len());
        let start = self.offset.min(end);
        for line in &self.buffer[start..end] {
            self.terminal.write_all(line.text.as_bytes())?;
            // Raw mode disables output post-processing, so return explicitly.
            self.terminal.write_all(b"\r\n")?;
        }
        if !self.status.is_empty() && self.size.rows > 0 {
            let status: String = self
                .status
                .chars()
                .take(usize::from(self.size.columns))
                .collect();
            queue!(
                self.terminal,
                MoveTo(0, self.size.rows - 1),
                Print(style(status).with(Color::DarkGrey))
            )?;
        }
        self.place_cursor()
    }

    /// Moves to an absolute position. The column is clamped to the screen
    /// width and the row to at least 1.
    pub fn move_cursor(&mut self, column: usize, row: usize) -> io::Result<()> {
        let max_column = usize::from(self.size.columns).max(1);
        self.cursor = Cursor {
            column: column.clamp(1, max_column),
            row: row.max(1),
        };
        self.place_cursor()
    }

    pub fn move_by(&mut self, columns: isize, rows: isize) -> io::Result<()> {
        let column = self.cursor.column.saturating_add_signed(columns);
        let row = self.cursor.row.saturating_add_signed(rows);
        self.move_cursor(column, row)
    }

    /// Remembers the viewport under `name` unless a save is already pending.
    pub fn backup(&mut self, name: &str) {
        if self.saved.contains_key(name) {
            return;
        }
        self.saved.insert(
            name.to_string(),
            SavedView {
                offset: self.offset,
                cursor: self.cursor,
            },
        );
    }

    /// Reinstates and forgets the viewport saved under `name`, if any.
    pub fn restore(&mut self, name: &str) -> bool {
        match self.saved.remove(name) {
            Some(view) => {
                self.offset = view.offset;
                self.cursor = view.cursor;
                self.needs_redraw = true;
                true
            }
            None => false,
        }
    }

    pub fn define_quit_action(&mut self, action: QuitAction<A>) {
        self.quit = action;
    }

    pub fn quit_action(&self) -> &QuitAction<A> {
        &self.quit
    }

    /// Action of the buffer line under the cursor.
    pub fn current_action(&self) -> Option<&A> {
        let index = (self.offset + self.cursor.row).checked_sub(1)?;
        self.buffer.get(index)?.action.as_ref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.needs_redraw = true;
    }

    #[cfg(test)]
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[Line<A>] {
        &self.buffer
    }

    #[cfg(test)]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    fn erase(&mut self) -> io::Result<()> {
        queue!(self.terminal, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn place_cursor(&mut self) -> io::Result<()> {
        let column = u16::try_from(self.cursor.column - 1).unwrap_or(u16::MAX);
        let row = u16::try_from(self.cursor.row - 1).unwrap_or(u16::MAX);
        queue!(self.terminal, MoveTo(column, row))?;
        self.terminal.flush()
    }
}
