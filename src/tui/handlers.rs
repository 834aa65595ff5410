// File: src/tui/handlers.rs
// Handles keyboard input and runs menu actions against the document.
use crate::document::EditError;
use crate::model::{Threshold, classify, entry};
use crate::projector::{SearchPattern, ViewMode};
use crate::tui::action::{ActionKind, Flow};
use crate::tui::dialog::Dialog;
use crate::tui::state::AppState;
use anyhow::Result;
use chrono::Datelike;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key_event(
    key: KeyEvent,
    state: &mut AppState,
    dialog: &mut dyn Dialog,
) -> Result<Flow> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(Flow::Quit);
        }
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Flow::Quit),
        KeyCode::Up | KeyCode::Char('k') => state.cursor.up(),
        KeyCode::Down | KeyCode::Char('j') => state.cursor.down(),
        KeyCode::Home | KeyCode::Char('g') => state.cursor.top(),
        KeyCode::PageUp => state.cursor.page_up(),
        KeyCode::PageDown => state.cursor.page_down(),
        KeyCode::Left | KeyCode::Char('h') => state.menu.left(),
        KeyCode::Right | KeyCode::Char('l') => state.menu.right(),
        KeyCode::Enter => show_details(state, dialog)?,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(action) = state.menu.resolve(c) {
                run_action(action, state, dialog)?;
            }
        }
        _ => {}
    }
    Ok(Flow::Continue)
}

/// Runs `action` for the current selection. The menu must have been rebuilt
/// for this selection, which `AppState::sync` guarantees once per frame.
pub fn run_action(action: ActionKind, state: &mut AppState, dialog: &mut dyn Dialog) -> Result<()> {
    log::debug!("Action {} on {:?}", action, state.selected_line());
    state.message.clear();

    match action {
        ActionKind::New => {
            return edit_with_retry(state, dialog, "New entry", "", |s, text| {
                if text.trim().is_empty() {
                    return Ok(());
                }
                s.append_line(text)
            });
        }
        ActionKind::ViewMode => return change_view(state, dialog),
        ActionKind::MonthlyCalendar => return month_calendar(state, dialog),
        _ => {}
    }

    // Owned copy: every edit below borrows the state mutably.
    let Some((index, line)) = state.selected_line().map(|(i, l)| (i, l.to_string())) else {
        state.message = "Nothing selected.".to_string();
        return Ok(());
    };

    match action {
        ActionKind::Edit => edit_with_retry(state, dialog, "Edit", &line, |s, text| {
            s.update_line(index, text)
        }),
        ActionKind::Duplicate => edit_with_retry(state, dialog, "Duplicate", &line, |s, text| {
            if text.trim().is_empty() {
                return Ok(());
            }
            s.append_line(text)
        }),
        ActionKind::Reschedule => reschedule(state, dialog, index, &line),
        ActionKind::Delete => {
            let question = format!("Delete \"{}\"?", line.trim());
            if dialog.confirm(state, &question)? {
                let result = state.delete_line(index);
                report(state, result, "Deleted.");
            } else {
                state.message = "Cancelled.".to_string();
            }
            Ok(())
        }
        ActionKind::Comment => {
            let result = state.update_line(index, &entry::commented_out(&line));
            report(state, result, "Commented out.");
            Ok(())
        }
        ActionKind::Advance => advance(state, index, &line),
        ActionKind::BrowseUrl => {
            browse_url(state);
            Ok(())
        }
        ActionKind::New | ActionKind::ViewMode | ActionKind::MonthlyCalendar => Ok(()),
    }
}

fn report(state: &mut AppState, result: Result<(), EditError>, ok: &str) {
    state.message = match result {
        Ok(()) => ok.to_string(),
        Err(e) => format!("Not changed: {}", e),
    };
}

/// Prompts until `commit` accepts the text or the user aborts. A rejected
/// text is offered again for correction.
fn edit_with_retry<F>(
    state: &mut AppState,
    dialog: &mut dyn Dialog,
    title: &str,
    initial: &str,
    mut commit: F,
) -> Result<()>
where
    F: FnMut(&mut AppState, &str) -> Result<(), EditError>,
{
    let mut prompt_title = title.to_string();
    let mut text = initial.to_string();
    loop {
        let Some(input) = dialog.prompt(state, &prompt_title, &text)? else {
            state.message = "Cancelled.".to_string();
            return Ok(());
        };
        match commit(state, &input) {
            Ok(()) => {
                state.message = format!("{}: done.", title);
                return Ok(());
            }
            Err(e) => {
                prompt_title = format!("{} - {}; try again", title, e);
                text = input;
            }
        }
    }
}

fn reschedule(
    state: &mut AppState,
    dialog: &mut dyn Dialog,
    index: usize,
    line: &str,
) -> Result<()> {
    let initial = entry::expression(line).unwrap_or("").trim().to_string();
    edit_with_retry(state, dialog, "New date", &initial, |s, expr| {
        if expr.contains(',') {
            return Err(EditError::CommaInExpression);
        }
        match entry::with_expression(line, expr) {
            Some(new_line) => s.update_line(index, &new_line),
            None => Err(EditError::NoSuchLine(index)),
        }
    })
}

fn advance(state: &mut AppState, index: usize, line: &str) -> Result<()> {
    let Some(threshold) = entry::expression(line).and_then(classify::variable_to_replace) else {
        state.message = "Nothing to advance.".to_string();
        return Ok(());
    };
    let value = match threshold {
        Threshold::Julian => match state.projector.oracle().ordinal_day(None) {
            Ok(day) => day,
            Err(e) => {
                state.message = format!("Not changed: {}", e);
                return Ok(());
            }
        },
        Threshold::Yearly => i64::from(chrono::Local::now().year()),
    };
    let Some(new_line) = classify::advance(line, threshold, value) else {
        state.message = "Nothing to advance.".to_string();
        return Ok(());
    };
    let result = state.update_line(index, &new_line);
    report(
        state,
        result,
        &format!("Advanced to {} > {}.", threshold.variable(), value),
    );
    Ok(())
}

fn browse_url(state: &mut AppState) {
    let Some(url) = state
        .selected_item()
        .and_then(|item| classify::first_url(&item.text))
        .map(str::to_string)
    else {
        state.message = "No url in this item.".to_string();
        return;
    };
    state.message = match open::that(&url) {
        Ok(()) => format!("Opened {}", url),
        Err(e) => {
            log::warn!("Could not open {}: {}", url, e);
            format!("Could not open {}: {}", url, e)
        }
    };
}

fn show_details(state: &AppState, dialog: &mut dyn Dialog) -> Result<()> {
    let Some(item) = state.selected_item() else {
        return Ok(());
    };
    let source = state.document.line(item.line).unwrap_or("");
    let body = format!("{}\n\nLine {}: {}", item.text, item.line + 1, source);
    dialog.show(state, "Item", &body)
}

fn month_calendar(state: &mut AppState, dialog: &mut dyn Dialog) -> Result<()> {
    match state.month_calendar() {
        Ok(grid) => dialog.show(state, "Calendar", &grid),
        Err(e) => {
            state.message = format!("Error: {}", e);
            Ok(())
        }
    }
}

/// Outer `None`: aborted. Inner `None`: empty answer.
fn prompt_days(
    state: &AppState,
    dialog: &mut dyn Dialog,
    title: &str,
    current: Option<i32>,
) -> Result<Option<Option<i32>>> {
    let mut prompt_title = format!("{} (empty for default)", title);
    let mut text = current.map(|d| d.to_string()).unwrap_or_default();
    loop {
        let Some(input) = dialog.prompt(state, &prompt_title, &text)? else {
            return Ok(None);
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Some(None));
        }
        match trimmed.parse::<i32>() {
            Ok(days) => return Ok(Some(Some(days))),
            Err(_) => {
                prompt_title = format!("{} - '{}' is not a number; try again", title, trimmed);
                text = input;
            }
        }
    }
}

fn prompt_search(state: &AppState, dialog: &mut dyn Dialog) -> Result<Option<Option<SearchPattern>>> {
    let mode = state.search_mode;
    let mut prompt_title = format!("Search, {} (empty for none)", mode);
    let mut text = state
        .view
        .search
        .as_ref()
        .map(|s| s.source().to_string())
        .unwrap_or_default();
    loop {
        let Some(input) = dialog.prompt(state, &prompt_title, &text)? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(Some(None));
        }
        match SearchPattern::new(&input, mode) {
            Ok(pattern) => return Ok(Some(Some(pattern))),
            Err(e) => {
                prompt_title = format!("Search - bad pattern ({}); try again", e);
                text = input;
            }
        }
    }
}

fn change_view(state: &mut AppState, dialog: &mut dyn Dialog) -> Result<()> {
    let Some(past_days) = prompt_days(state, dialog, "Past days", state.view.past_days)? else {
        state.message = "Cancelled.".to_string();
        return Ok(());
    };
    let Some(future_days) = prompt_days(state, dialog, "Future days", state.view.future_days)?
    else {
        state.message = "Cancelled.".to_string();
        return Ok(());
    };
    let Some(search) = prompt_search(state, dialog)? else {
        state.message = "Cancelled.".to_string();
        return Ok(());
    };

    let view = ViewMode {
        past_days,
        future_days,
        search,
    };
    state.message = match state.set_view(view) {
        Ok(()) => "View changed.".to_string(),
        Err(e) => format!("View not changed: {}", e),
    };
    Ok(())
}
