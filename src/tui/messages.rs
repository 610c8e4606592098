//! Thread pane: displays the open conversation's messages.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::conversations::Conversation;

/// Render the open conversation's thread, bottom-anchored. `scroll` counts
/// lines back from the latest message.
pub fn render(
    area: Rect,
    buf: &mut Buffer,
    conversation: Option<&Conversation>,
    current_user_id: &str,
    scroll: usize,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = match conversation {
        Some(conv) => format!(" {} \u{2014} {} ", conv.counterpart_label(), conv.advert_label()),
        None => " Messages ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(border_style)
        .title(title);

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let Some(conv) = conversation else {
        Paragraph::new(Line::from(Span::styled(
            "  Select a conversation and press Enter",
            Style::default().fg(Color::DarkGray),
        )))
        .render(inner, buf);
        return;
    };

    let lines = thread_lines(conv, current_user_id);

    // Bottom-anchor: show the tail of the thread, shifted up by `scroll`.
    let visible = inner.height as usize;
    let top = lines
        .len()
        .saturating_sub(visible)
        .saturating_sub(scroll.min(lines.len().saturating_sub(visible)));
    let shown: Vec<Line> = lines.into_iter().skip(top).take(visible).collect();

    Paragraph::new(shown).render(inner, buf);
}

/// Build the rendered lines for a thread: a header line per message plus
/// its content lines.
fn thread_lines<'a>(conv: &'a Conversation, current_user_id: &str) -> Vec<Line<'a>> {
    let mut lines = Vec::new();

    for msg in &conv.messages {
        let own = msg.sender_id == current_user_id;
        let sender_style = if own {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        };
        let sender = if own { "You" } else { msg.sender_name.as_str() };

        let mut header = vec![
            Span::styled(
                format!(" {} ", msg.created_at.format("%d %b %H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(sender, sender_style),
        ];
        if msg.is_unread_for(current_user_id) {
            header.push(Span::styled(
                " \u{2022} new",
                Style::default().fg(Color::Red),
            ));
        }
        lines.push(Line::from(header));

        for content_line in msg.content.lines() {
            lines.push(Line::from(format!("   {}", content_line)));
        }
        lines.push(Line::from(""));
    }

    lines
}
