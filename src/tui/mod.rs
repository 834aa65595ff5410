// File: ./src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod cursor;
pub mod dialog;
pub mod handlers;
pub mod menu;
pub mod state;
pub mod view;

use crate::tui::action::Flow;
use crate::tui::dialog::{Term, TerminalDialog};
use crate::tui::state::AppState;
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::io;
use std::path::PathBuf;

/// Appends panics to `path` and puts the terminal back before the default
/// hook prints the message.
pub fn install_panic_hook(path: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));
}

/// Runs the browsing loop until the user quits. The terminal is restored
/// whether the loop ends normally or with an error.
pub fn run(state: &mut AppState) -> Result<()> {
    // --- TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state);

    // --- CLEANUP ---
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(terminal: &mut Term, state: &mut AppState) -> Result<()> {
    log::info!("Browsing {}", state.document.path().display());
    loop {
        let size = terminal.size()?;
        state
            .cursor
            .set_height(view::list_height(Rect::new(0, 0, size.width, size.height)));
        state.sync();
        terminal.draw(|f| draw(f, state))?;

        match event::read()? {
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => state.cursor.down(),
                MouseEventKind::ScrollUp => state.cursor.up(),
                _ => {}
            },
            Event::Key(key) => {
                // Filter out KeyRelease events to prevent double input on Windows
                if key.kind == event::KeyEventKind::Release {
                    continue;
                }
                let mut dialog = TerminalDialog::new(terminal);
                if handlers::handle_key_event(key, state, &mut dialog)? == Flow::Quit {
                    break;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
