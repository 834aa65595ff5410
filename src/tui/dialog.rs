// Blocking sub-dialogs: free-text prompt, yes/no confirmation, message popup.
//
// A dialog owns the terminal until it returns. Ctrl-C and Esc abort a prompt
// and hand back `None`; the caller then leaves the document untouched.
use crate::tui::state::AppState;
use crate::tui::view;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::Stdout;
use unicode_width::UnicodeWidthStr;

pub type Term = Terminal<CrosstermBackend<Stdout>>;

pub trait Dialog {
    /// Free-text entry. `None` means the user aborted.
    fn prompt(&mut self, state: &AppState, title: &str, initial: &str) -> Result<Option<String>>;

    fn confirm(&mut self, state: &AppState, question: &str) -> Result<bool>;

    /// Shows `body` until a key is pressed.
    fn show(&mut self, state: &AppState, title: &str, body: &str) -> Result<()>;
}

/// Single-line editing buffer with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    buffer: String,
    cursor: usize,
}

impl InputLine {
    pub fn new(initial: &str) -> Self {
        Self {
            buffer: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.buffer
            .char_indices()
            .map(|(i, _)| i)
            .nth(char_pos)
            .unwrap_or(self.buffer.len())
    }

    /// Terminal columns occupied by the text left of the cursor.
    pub fn display_column(&self) -> usize {
        self.buffer[..self.byte_index(self.cursor)].width()
    }

    /// Horizontal scroll keeping the cursor inside `width` columns.
    pub fn scroll_for(&self, width: usize) -> usize {
        let col = self.display_column();
        if width == 0 || col < width {
            0
        } else {
            col + 1 - width
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.buffer.insert(idx, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let idx = self.byte_index(self.cursor - 1);
        self.buffer.remove(idx);
        self.cursor -= 1;
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.buffer.chars().count() {
            let idx = self.byte_index(self.cursor);
            self.buffer.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

pub enum PromptKey {
    Submit,
    Abort,
    Edited,
}

/// Applies one key to `input`.
pub fn handle_prompt_key(input: &mut InputLine, key: KeyEvent) -> PromptKey {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => return PromptKey::Submit,
        KeyCode::Esc => return PromptKey::Abort,
        KeyCode::Char('c') if ctrl => return PromptKey::Abort,
        KeyCode::Char('u') if ctrl => input.clear(),
        KeyCode::Char('a') if ctrl => input.home(),
        KeyCode::Char('e') if ctrl => input.end(),
        KeyCode::Char(c) if !c.is_control() => input.enter_char(c),
        KeyCode::Tab => input.enter_char(' '),
        KeyCode::Backspace => input.delete_char(),
        KeyCode::Delete => input.delete_forward(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        _ => {}
    }
    PromptKey::Edited
}

pub struct TerminalDialog<'a> {
    terminal: &'a mut Term,
}

impl<'a> TerminalDialog<'a> {
    pub fn new(terminal: &'a mut Term) -> Self {
        Self { terminal }
    }

    fn next_key(&mut self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()?
                && key.kind != KeyEventKind::Release
            {
                return Ok(key);
            }
        }
    }
}

impl Dialog for TerminalDialog<'_> {
    fn prompt(&mut self, state: &AppState, title: &str, initial: &str) -> Result<Option<String>> {
        let mut input = InputLine::new(initial);
        loop {
            self.terminal.draw(|f| {
                view::draw(f, state);
                view::draw_prompt(f, title, &input);
            })?;
            let key = self.next_key()?;
            match handle_prompt_key(&mut input, key) {
                PromptKey::Submit => return Ok(Some(input.into_string())),
                PromptKey::Abort => return Ok(None),
                PromptKey::Edited => {}
            }
        }
    }

    fn confirm(&mut self, state: &AppState, question: &str) -> Result<bool> {
        self.terminal.draw(|f| {
            view::draw(f, state);
            view::draw_confirm(f, question);
        })?;
        let key = self.next_key()?;
        Ok(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')))
    }

    fn show(&mut self, state: &AppState, title: &str, body: &str) -> Result<()> {
        self.terminal.draw(|f| {
            view::draw(f, state);
            view::draw_popup(f, title, body);
        })?;
        self.next_key()?;
        Ok(())
    }
}
