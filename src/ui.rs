use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};

use crate::app::{App, FocusPane, InputMode};
use crate::session::Role;

/// Parse a line of text and convert **bold** markdown to styled spans.
/// An unmatched marker is kept literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find("**") else {
            if !rest.is_empty() {
                spans.push(Span::raw(rest.to_string()));
            }
            break;
        };

        let (plain, tail) = rest.split_at(open);
        let tail = &tail[2..];

        let Some(close) = tail.find("**") else {
            // No closing marker, keep everything literal
            let mut literal = String::from(plain);
            literal.push_str("**");
            literal.push_str(tail);
            spans.push(Span::raw(literal));
            break;
        };

        if !plain.is_empty() {
            spans.push(Span::raw(plain.to_string()));
        }
        let (bold_text, after) = tail.split_at(close);
        if !bold_text.is_empty() {
            spans.push(Span::styled(
                bold_text.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after[2..];
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Render one message body. Fenced code blocks are tinted so submitted
/// code and code in replies stand apart from prose.
fn message_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in content.lines() {
        if raw.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(parse_markdown_line(raw));
        }
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Code editor on top, chat below, like the action flow reads
    let [editor_area, chat_section] = Layout::vertical([
        Constraint::Percentage(40),
        Constraint::Min(0),
    ])
    .areas(body_area);

    let [messages_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_section);

    render_editor(app, frame, editor_area);
    render_chat(app, frame, messages_area);
    render_chat_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let backend_status = match app.backend_online {
        Some(true) => Span::styled(" [backend online] ", Style::default().fg(Color::Green)),
        Some(false) => Span::styled(" [backend offline] ", Style::default().fg(Color::Red)),
        None => Span::raw(" "),
    };

    let title = Line::from(vec![
        Span::styled(
            " Python AI Assistant ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        backend_status,
        Span::styled(
            app.controller.backend_url().to_string(),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_editor(app: &mut App, frame: &mut Frame, area: Rect) {
    let editor_focused = app.focus == FocusPane::Editor;
    let editing = editor_focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if editor_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Code Editor (Python) ");

    let inner_area = block.inner(area);
    app.editor_area = Some(area);
    app.editor_height = inner_area.height;

    if app.code_input.is_empty() && !editing {
        let placeholder = Paragraph::new("# Enter your Python code here...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Keep the cursor line inside the viewport
    let (cursor_line, cursor_col) = app.code_line_col();
    let height = inner_area.height.max(1);
    if (cursor_line as u16) < app.editor_scroll {
        app.editor_scroll = cursor_line as u16;
    } else if cursor_line as u16 >= app.editor_scroll + height {
        app.editor_scroll = cursor_line as u16 - height + 1;
    }

    // Horizontal scroll so the cursor column stays visible
    let inner_width = inner_area.width.max(1) as usize;
    let h_scroll = if cursor_col >= inner_width {
        (cursor_col - inner_width + 1) as u16
    } else {
        0
    };

    let lines: Vec<Line> = app.code_input.lines().map(Line::raw).collect();
    let total_lines = lines.len().max(1) as u16;

    let editor = Paragraph::new(lines)
        .block(block)
        .scroll((app.editor_scroll, h_scroll));
    frame.render_widget(editor, area);

    if total_lines > app.editor_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.editor_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    if editing {
        frame.set_cursor_position((
            inner_area.x + (cursor_col as u16).saturating_sub(h_scroll),
            inner_area.y + (cursor_line as u16).saturating_sub(app.editor_scroll),
        ));
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_focused = app.focus == FocusPane::Chat;
    let border_color = if chat_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Python Programming Chat ");

    let inner_area = block.inner(area);
    app.chat_area = Some(area);
    app.chat_height = inner_area.height;
    app.chat_width = inner_area.width;

    let messages = app.controller.messages();
    let in_flight = app.controller.in_flight();

    let chat_text = if messages.is_empty() && !in_flight {
        Text::from(vec![
            Line::from(Span::styled(
                "Hello! I'm your Python AI Assistant",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Enter your Python code above, or ask me questions here!",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                Role::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }
            lines.extend(message_lines(&msg.content));
            lines.push(Line::default());
        }

        if in_flight {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis keyed to the action in flight
            let label = app
                .controller
                .current_action()
                .map(|action| action.progress_label())
                .unwrap_or("Thinking");
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("{}{}", label, dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let total_lines = chat_text.lines.len() as u16;

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_focused = app.focus == FocusPane::Input;
    let editing = input_focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if input_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask (Tab to focus) ");

    if app.chat_input.is_empty() && !editing {
        let placeholder = Paragraph::new("Ask me anything about Python programming...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.focus {
        FocusPane::Editor => " CODE ",
        FocusPane::Input => " ASK ",
        FocusPane::Chat => " CHAT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match (app.focus, app.input_mode) {
        (FocusPane::Editor, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" e ", key_style),
            Span::styled(" explain ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" debug ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (FocusPane::Editor, InputMode::Editing) => vec![
            Span::styled(" Ctrl+e ", key_style),
            Span::styled(" explain ", label_style),
            Span::styled(" Ctrl+d ", key_style),
            Span::styled(" debug ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        (FocusPane::Input, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        (FocusPane::Input, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (FocusPane::Chat, _) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    // Gate status: triggers are inert while a request is in flight
    if let Some(action) = app.controller.current_action() {
        hints.push(Span::styled(
            format!(" {}... ", action.progress_label()),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn bold_markers_become_styled_spans() {
        let line = parse_markdown_line("a **bold** word");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content.as_ref(), "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn unmatched_marker_stays_literal() {
        let line = parse_markdown_line("two ** stars");
        assert_eq!(line_text(&line), "two ** stars");
    }

    #[test]
    fn fenced_code_is_tracked_across_lines() {
        let lines = message_lines("Explain this code:\n\n```python\nprint(1)\n```");
        assert_eq!(lines.len(), 5);
        // The code line inside the fence gets the code tint
        assert_eq!(lines[3].spans[0].content.as_ref(), "print(1)");
        assert_eq!(lines[3].spans[0].style.fg, Some(Color::Green));
        // Prose outside the fence does not
        assert_ne!(lines[0].spans[0].style.fg, Some(Color::Green));
    }
}
