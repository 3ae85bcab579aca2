use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use faqchat_core::{show_contact, Message, Sender};
use crate::app::{App, FocusPane, ServiceHealth};

/// Split a line on `**` markers, rendering every odd segment bold.
/// An unmatched trailing marker is kept as literal text.
fn styled_line(text: &str, base: Style) -> Line<'static> {
    let segments: Vec<&str> = text.split("**").collect();
    let balanced = segments.len() % 2 == 1;

    let mut spans = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        if i % 2 == 1 && (balanced || !is_last) {
            spans.push(Span::styled(segment.to_string(), base.add_modifier(Modifier::BOLD)));
        } else if i % 2 == 1 {
            spans.push(Span::styled(format!("**{}", segment), base));
        } else if !segment.is_empty() {
            spans.push(Span::styled(segment.to_string(), base));
        }
    }
    Line::from(spans)
}

fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let header = match msg.sender {
        Sender::User => Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Sender::Bot => Span::styled(
            "Bot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    };
    let mut header_spans = vec![header];
    if let Some(category) = &msg.category {
        header_spans.push(Span::styled(
            format!(" [{}]", category),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(source) = &msg.source {
        header_spans.push(Span::styled(
            format!(" via {}", source),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }
    lines.push(Line::from(header_spans));

    let body_style = if msg.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    for line in msg.text.lines() {
        match msg.sender {
            Sender::Bot => lines.push(styled_line(line, body_style)),
            Sender::User => lines.push(Line::styled(line.to_string(), body_style)),
        }
    }

    if let Some(confidence) = msg.confidence {
        lines.push(Line::from(Span::styled(
            confidence.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.show_contact {
        render_contact(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (service, status) = match &app.health {
        ServiceHealth::Checking => ("FAQ Assistant".to_string(), Span::styled(" connecting ", Style::default().fg(Color::Gray))),
        ServiceHealth::Online(health) => {
            let name = if health.service.is_empty() { "FAQ Assistant".to_string() } else { health.service.clone() };
            let status = if health.is_healthy() {
                Span::styled(format!(" online · {} FAQs ", health.faq_count), Style::default().fg(Color::Green))
            } else {
                Span::styled(format!(" {} ", health.status), Style::default().fg(Color::Yellow))
            };
            (name, status)
        }
        ServiceHealth::Offline => ("FAQ Assistant".to_string(), Span::styled(" offline ", Style::default().fg(Color::Red))),
    };

    let title = Line::from(vec![
        Span::styled(format!(" {} ", service), Style::default().fg(Color::Cyan).bold()),
        status,
        Span::styled(app.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode, mode_style) = if app.is_busy() {
        (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints: &[(&str, &str)] = if app.show_contact {
        &[("Esc", "close")]
    } else {
        match app.focus {
            FocusPane::Input => &[
                ("Enter", "send"),
                ("Alt+Enter", "newline"),
                ("Tab", "suggestions"),
                ("PgUp/PgDn", "scroll"),
                ("F1", "contact"),
                ("Ctrl+C", "quit"),
            ],
            FocusPane::Related => &[
                ("j/k", "select"),
                ("Enter", "ask"),
                ("Tab", "input"),
                ("?", "contact"),
                ("q", "quit"),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode, mode_style)];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let related_height = if app.chat.related_visible() {
        (app.chat.related().len().min(5) + 2) as u16
    } else {
        0
    };

    let [chat_area, related_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(related_height),
        Constraint::Length(app.input_height()),
    ])
    .areas(area);

    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    app.related_area = (related_height > 0).then_some(related_area);

    render_transcript(app, frame, chat_area);
    if related_height > 0 {
        render_related(app, frame, related_area);
    }
    render_input(app, frame, input_area);
}

fn render_transcript(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let text = if app.chat.transcript().is_empty() && !app.is_busy() {
        Text::from(Span::styled(
            "Ask a question about cards, payments, KYC or rewards...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = app.chat.transcript().iter().flat_map(message_lines).collect();

        if app.is_busy() {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_related(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Related;
    let border_color = if focused { Color::Cyan } else { Color::Magenta };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Related questions (Tab to focus, Enter to ask) ");

    let items: Vec<ListItem> = app
        .chat
        .related()
        .iter()
        .map(|related| {
            let mut spans = vec![Span::raw(format!(" {} ", related.question))];
            if let Some(category) = &related.category {
                spans.push(Span::styled(format!("[{}]", category), Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let highlight = if focused {
        Style::default().bg(Color::Magenta).fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.related_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let focused = app.focus == FocusPane::Input;

    let (title, border_color) = if busy {
        (" Processing... ".to_string(), Color::DarkGray)
    } else if focused {
        (" Ask (Enter to send) ".to_string(), Color::Yellow)
    } else {
        (" Ask (Tab to focus) ".to_string(), Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor inside the visible window, scrolling both ways
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2).max(1);
    let (row, col) = app.cursor_position();
    let scroll_y = row.saturating_sub(inner_height - 1);
    let scroll_x = if inner_width == 0 { 0 } else { col.saturating_sub(inner_width - 1) };

    let input = Paragraph::new(app.chat.input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(block)
        .scroll((scroll_y, scroll_x));

    frame.render_widget(input, area);

    if focused && !app.show_contact {
        frame.set_cursor_position((
            area.x + 1 + col - scroll_x,
            area.y + 1 + row - scroll_y,
        ));
    }
}

fn render_contact(frame: &mut Frame, area: Rect) {
    let text = show_contact();

    let popup_width = 52.min(area.width.saturating_sub(4));
    let popup_height = (text.lines().count() as u16 + 4).min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Contact support (Esc to close) ");

    let popup = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(popup, popup_area);
}
