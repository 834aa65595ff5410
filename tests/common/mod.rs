// File: tests/common/mod.rs
// Shared fixtures: an in-process oracle and a scripted dialog.
#![allow(dead_code)]

use anyhow::Result;
use someday::document::CalendarDocument;
use someday::model::{classify, entry, expr};
use someday::oracle::{Oracle, OracleError, Window};
use someday::projector::{SearchMode, ViewMode, ViewProjector};
use someday::tui::dialog::Dialog;
use someday::tui::state::AppState;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const TODAY: &str = "Mon 2026 Oct 19";

/// Stands in for `when`: every non-inert line is due today, except lines
/// whose expression is `never`. A line without a comma, or whose expression
/// neither parses nor is a literal date, makes the output carry the error
/// sentinel. While `failing` is set, rendering fails the way a crashed or
/// missing `when` does.
pub struct FakeOracle {
    pub ordinal: i64,
    pub renders: Rc<Cell<usize>>,
    pub failing: Rc<Cell<bool>>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self {
            ordinal: 60000,
            renders: Rc::new(Cell::new(0)),
            failing: Rc::new(Cell::new(false)),
        }
    }
}

impl Oracle for FakeOracle {
    fn render(&self, working_copy: &str, _window: Window) -> Result<String, OracleError> {
        self.renders.set(self.renders.get() + 1);
        if self.failing.get() {
            return Err(OracleError::Failed {
                command: "when".to_string(),
                status: "exit status: 2".to_string(),
                stderr: "segmentation fault".to_string(),
            });
        }
        let mut out = String::new();
        for raw in working_copy.lines() {
            let Some((line, number)) = raw.rsplit_once('-') else {
                continue;
            };
            if number.parse::<usize>().is_err() || entry::is_inert(line) {
                continue;
            }
            let Some(expression) = entry::expression(line) else {
                out.push_str(&format!("*** missing comma in: {}\n", line));
                continue;
            };
            if expr::parse(expression).is_err() && !classify::is_literal_date(expression) {
                out.push_str(&format!("*** bad expression: {}\n", expression));
                continue;
            }
            if expression.trim() == "never" {
                continue;
            }
            let text = entry::event_text(line).unwrap_or("");
            out.push_str(&format!("today     2026 Oct 19 {}-{}\n", text, number));
        }
        Ok(out)
    }

    fn ordinal_day(&self, _date: Option<&str>) -> Result<i64, OracleError> {
        Ok(self.ordinal)
    }

    fn today(&self) -> Result<String, OracleError> {
        Ok(TODAY.to_string())
    }

    fn month_calendar(&self, _working_copy: &str) -> Result<String, OracleError> {
        Ok("October 2026\nSu Mo Tu We Th Fr Sa\n             1  2  3".to_string())
    }
}

pub fn projector() -> ViewProjector {
    ViewProjector::new(Box::new(FakeOracle::new()))
}

pub fn document(lines: &[&str]) -> CalendarDocument {
    CalendarDocument::new(
        "/nonexistent/calendar",
        lines.iter().map(|l| l.to_string()).collect(),
    )
}

pub fn state(lines: &[&str]) -> AppState {
    state_with(FakeOracle::new(), lines)
}

pub fn state_with(oracle: FakeOracle, lines: &[&str]) -> AppState {
    let mut state = AppState::new(
        document(lines),
        ViewProjector::new(Box::new(oracle)),
        ViewMode::default(),
        SearchMode::CaseInsensitive,
    )
    .expect("fixture calendar must be valid");
    state.cursor.set_height(10);
    state.sync();
    state
}

/// Moves the cursor onto the item rendered from source line `line`.
pub fn select_line(state: &mut AppState, line: usize) {
    state.cursor.top();
    for _ in 0..state.projection.len() {
        if state.selected_item().map(|i| i.line) == Some(line) {
            break;
        }
        state.cursor.down();
    }
    state.sync();
    assert_eq!(state.selected_item().map(|i| i.line), Some(line));
}

/// Answers prompts from a queue. An exhausted queue aborts, so a retry loop
/// under test always terminates.
#[derive(Default)]
pub struct ScriptedDialog {
    pub answers: VecDeque<Option<String>>,
    pub confirmations: VecDeque<bool>,
    /// (title, prefilled text) of every prompt shown.
    pub prompts: Vec<(String, String)>,
    pub questions: Vec<String>,
    /// (title, body) of every popup shown.
    pub shown: Vec<(String, String)>,
}

impl ScriptedDialog {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Some(a.to_string())).collect(),
            ..Self::default()
        }
    }
}

impl Dialog for ScriptedDialog {
    fn prompt(&mut self, _state: &AppState, title: &str, initial: &str) -> Result<Option<String>> {
        self.prompts.push((title.to_string(), initial.to_string()));
        Ok(self.answers.pop_front().flatten())
    }

    fn confirm(&mut self, _state: &AppState, question: &str) -> Result<bool> {
        self.questions.push(question.to_string());
        Ok(self.confirmations.pop_front().unwrap_or(false))
    }

    fn show(&mut self, _state: &AppState, title: &str, body: &str) -> Result<()> {
        self.shown.push((title.to_string(), body.to_string()));
        Ok(())
    }
}
