//! Sidebar widget: the conversation list with unread badges.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::conversations::Conversation;

/// Render the conversation list. Rows come pre-sorted (newest activity
/// first) from the grouper; this widget only draws them.
pub fn render(
    area: Rect,
    buf: &mut Buffer,
    conversations: &[Conversation],
    selected: usize,
    focused: bool,
    loading: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(border_style)
        .title(" Conversations ");

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if conversations.is_empty() {
        let hint = if loading {
            "  loading..."
        } else {
            "  (no conversations)"
        };
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .render(inner, buf);
        return;
    }

    // Two rows per conversation: counterpart + advert. Scroll so the
    // selected conversation stays visible.
    let rows_per = 2usize;
    let visible = (inner.height as usize / rows_per).max(1);
    let first = selected.saturating_sub(visible.saturating_sub(1));

    let mut lines: Vec<Line> = Vec::new();
    for (idx, conv) in conversations.iter().enumerate().skip(first).take(visible) {
        let is_selected = idx == selected;

        let name_style = if is_selected && focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if is_selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else if conv.unread_count > 0 {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let width = inner.width as usize;
        let mut spans = vec![Span::styled(
            format!(" {}", truncate(conv.counterpart_label(), width.saturating_sub(8))),
            name_style,
        )];
        if conv.unread_count > 0 {
            spans.push(Span::styled(
                format!(" ({})", conv.unread_count),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(spans));

        lines.push(Line::from(Span::styled(
            format!("   {}", truncate(conv.advert_label(), width.saturating_sub(4))),
            Style::default().fg(Color::DarkGray),
        )));
    }

    Paragraph::new(lines).render(inner, buf);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}\u{2026}", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long counterpart", 10), "a very lo\u{2026}");
    }
}
