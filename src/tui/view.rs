// File: src/tui/view.rs
use crate::tui::dialog::InputLine;
use crate::tui::state::AppState;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

pub const EMPTY_VIEW_MESSAGE: &str = "No items were found for today (and surrounding dates).";

pub struct Areas {
    pub header: Rect,
    pub list: Rect,
    pub menu: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);
    Areas {
        header: chunks[0],
        list: chunks[1],
        menu: chunks[2],
        status: chunks[3],
    }
}

/// Rows available to items once the list borders are drawn.
pub fn list_height(area: Rect) -> usize {
    layout(area).list.height.saturating_sub(2).max(1) as usize
}

fn view_title(state: &AppState) -> String {
    let mut parts = Vec::new();
    if let Some(p) = state.view.past_days {
        parts.push(format!("past {}", p));
    }
    if let Some(f) = state.view.future_days {
        parts.push(format!("future {}", f));
    }
    if let Some(s) = &state.view.search {
        parts.push(format!("{} /{}/", s.mode(), s.source()));
    }
    if parts.is_empty() {
        " Due ".to_string()
    } else {
        format!(" Due ({}) ", parts.join(", "))
    }
}

pub fn draw(f: &mut Frame, state: &AppState) {
    let areas = layout(f.area());

    // --- Header ---
    let header = Paragraph::new(state.header.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(header, areas.header);

    // --- Items ---
    let list_block = Block::default()
        .borders(Borders::ALL)
        .title(view_title(state));

    if state.projection.is_empty() {
        let empty = Paragraph::new(EMPTY_VIEW_MESSAGE)
            .style(Style::default().fg(Color::DarkGray))
            .block(list_block);
        f.render_widget(empty, areas.list);
    } else {
        let first = state.cursor.first_visible();
        let items: Vec<ListItem> = state
            .projection
            .items
            .iter()
            .enumerate()
            .skip(first)
            .take(state.cursor.height())
            .map(|(i, item)| {
                let style = if i == state.cursor.selected_index() {
                    Style::default()
                        .fg(Color::Red)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(item.text.clone(), style)))
            })
            .collect();
        f.render_widget(List::new(items).block(list_block), areas.list);
    }

    // --- Menu ---
    let mut spans = Vec::new();
    for (i, action) in state.menu.actions().iter().enumerate() {
        let style = if i == state.menu.highlighted() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!(" {} ", action), style));
        if let Some(key) = action.keys().first() {
            spans.push(Span::styled(
                format!("{}", key),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    let menu = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Actions "));
    f.render_widget(menu, areas.menu);

    // --- Status ---
    let status_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(areas.status);
    f.render_widget(
        Paragraph::new(state.message.clone()).style(Style::default().fg(Color::Cyan)),
        status_chunks[0],
    );
    if state.document.is_modified() {
        f.render_widget(
            Paragraph::new("[modified]")
                .alignment(Alignment::Right)
                .style(Style::default().fg(Color::LightRed)),
            status_chunks[1],
        );
    }
}

/// Input box drawn over the menu area.
pub fn draw_prompt(f: &mut Frame, title: &str, input: &InputLine) {
    let area = layout(f.area()).menu;
    f.render_widget(Clear, area);

    let scroll = input.scroll_for(area.width.saturating_sub(2) as usize);
    let p = Paragraph::new(input.as_str())
        .scroll((0, scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .border_style(Style::default().fg(Color::Magenta)),
        );
    f.render_widget(p, area);

    let cursor_x = area.x + 1 + (input.display_column() - scroll) as u16;
    f.set_cursor_position((
        cursor_x.min(area.x + area.width.saturating_sub(2)),
        area.y + 1,
    ));
}

pub fn draw_popup(f: &mut Frame, title: &str, body: &str) {
    let area = centered_rect(80, 60, f.area());
    let p = Paragraph::new(body.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .title_bottom(Line::from(" any key to close ").alignment(Alignment::Right)),
        );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

pub fn draw_confirm(f: &mut Frame, question: &str) {
    let area = centered_rect(60, 20, f.area());
    let p = Paragraph::new(format!("{} [y/N]", question))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm ")
                .border_style(Style::default().fg(Color::LightRed)),
        );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_height_leaves_room_for_chrome() {
        // header 1 + borders 2 + menu 3 + status 1
        assert_eq!(list_height(Rect::new(0, 0, 80, 24)), 17);
        assert_eq!(list_height(Rect::new(0, 0, 80, 10)), 3);
    }
}
