//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, Pane};
use super::compose;
use super::messages;
use super::sidebar;

/// Returns status indicator symbol and color based on connection state
fn status_indicator(state: &str) -> (&'static str, Color) {
    if state == "Online" {
        ("*", Color::Green)
    } else {
        ("o", Color::Red)
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header (1 line) + main content + status bar (1 line)
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    // Split main area: sidebar (34 cols) + thread/compose column
    let [sidebar_area, content_area] =
        Layout::horizontal([Constraint::Length(34), Constraint::Fill(1)]).areas(main_area);

    sidebar::render(
        sidebar_area,
        frame.buffer_mut(),
        &app.conversations,
        app.selected,
        app.active_pane == Pane::Sidebar,
        app.loading,
    );

    let [thread_area, compose_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(compose::COMPOSE_HEIGHT),
    ])
    .areas(content_area);

    let open = app.open_conversation();

    messages::render(
        thread_area,
        frame.buffer_mut(),
        open,
        &app.user_id,
        app.thread_scroll,
        app.active_pane == Pane::Thread,
    );

    compose::render(
        compose_area,
        frame,
        &app.compose,
        open.map(|c| c.counterpart_label()).unwrap_or(""),
        app.active_pane == Pane::Compose,
    );

    render_status(status_area, frame.buffer_mut(), app);
}

fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let (symbol, color) = status_indicator(&app.connection_state);
    let total_unread: u32 = app.conversations.iter().map(|c| c.unread_count).sum();

    let mut spans = vec![
        Span::styled(
            " PetMarket ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("\u{2502} "),
        Span::raw(app.user_name.clone()),
        Span::raw("  "),
        Span::styled(symbol, Style::default().fg(color)),
        Span::raw(format!(" {}", app.connection_state)),
    ];
    if total_unread > 0 {
        spans.push(Span::styled(
            format!("  {} unread", total_unread),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    let keys = match app.active_pane {
        Pane::Sidebar => " j/k move \u{2502} Enter open \u{2502} Tab pane \u{2502} q quit",
        Pane::Thread => " j/k scroll \u{2502} Enter compose \u{2502} Esc back \u{2502} Tab pane",
        Pane::Compose => " Enter send \u{2502} Esc back \u{2502} Ctrl+U clear",
    };

    let line = match app.notice {
        Some(ref notice) => Line::from(vec![
            Span::styled(keys, Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled(notice.clone(), Style::default().fg(Color::Yellow)),
        ]),
        None => Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
    };

    Paragraph::new(line).render(area, buf);
}
