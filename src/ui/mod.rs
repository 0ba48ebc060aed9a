use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::api::EchoResult;
use crate::app::{App, Control};
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),                              // Title
            Constraint::Length(health_height(app, area.width)), // Health check
            Constraint::Min(4),                                 // Users
            Constraint::Length(9),                              // Message
            Constraint::Length(1),                              // Footer
        ])
        .split(area);

    draw_title(f, app, chunks[0]);
    draw_health_box(f, app, chunks[1]);
    draw_users_box(f, app, chunks[2]);
    draw_message_box(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);
}

fn draw_title(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            "Frontend ↔ Backend connectivity",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" │ ", Style::default().fg(text_dim())),
        Span::styled(app.base_url(), Style::default().fg(text_dim())),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Bordered box whose border lights up when one of its controls has focus
fn section_block(title: &str, active: bool) -> Block<'_> {
    let (border_color, title_style) = if active {
        (accent(), Style::default().fg(accent()).add_modifier(Modifier::BOLD))
    } else {
        (inactive(), Style::default().fg(header()))
    };

    Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
}

/// `[ label ]`, dimmed when disabled, highlighted when focused
fn button<'a>(app: &App, control: Control, label: &'a str, busy_label: &'a str) -> Span<'a> {
    let enabled = app.is_enabled(control);
    let label = if app.loading { busy_label } else { label };

    let style = if !enabled {
        Style::default().fg(text_dim()).add_modifier(Modifier::DIM)
    } else if app.focus == control {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(accent())
    };

    Span::styled(format!("[ {} ]", label), style)
}

/// Rows the health box needs so a long message wraps instead of being cut
fn health_height(app: &App, width: u16) -> u16 {
    const MIN: u16 = 5;
    const MAX: u16 = 8;

    let Some(health) = &app.health else {
        return MIN;
    };

    let inner = width.saturating_sub(2).max(1) as usize;
    let message = Line::raw(health.message.as_str()).width();
    let mut message_rows = message.div_ceil(inner).max(1);
    if message_rows > 1 {
        // Word wrapping can need one row more than a straight cut
        message_rows += 1;
    }

    // borders + button + status line + message
    (4 + message_rows as u16).clamp(MIN, MAX)
}

fn draw_health_box(f: &mut Frame, app: &App, area: Rect) {
    let block = section_block("Health check", app.focus == Control::HealthButton);

    let mut lines = vec![Line::from(button(
        app,
        Control::HealthButton,
        "Run health check",
        "Checking...",
    ))];

    if let Some(health) = &app.health {
        let color = theme().status_color(&health.status);
        lines.push(Line::from(vec![
            Span::styled("Status: ", Style::default().fg(text_dim())),
            Span::styled(&health.status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::styled(&health.message, Style::default().fg(color)));
    }

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn draw_users_box(f: &mut Frame, app: &App, area: Rect) {
    let block = section_block("Users (GET)", app.focus == Control::UsersButton);

    let mut lines = vec![Line::from(button(
        app,
        Control::UsersButton,
        "Fetch users",
        "Fetching...",
    ))];

    // Nothing below the button until there is at least one user
    if !app.users.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::styled("Fetched users:", Style::default().fg(header())));

        // Rows left after borders, button, spacer and heading
        let rows = area.height.saturating_sub(5) as usize;
        let total = app.users.len();
        let overflow = total > rows;
        let window = if overflow { rows.saturating_sub(1) } else { total };
        let start = app.users_scroll.min(total - window);
        let below = total - start - window;

        for user in app.users.iter().skip(start).take(window) {
            lines.push(Line::from(vec![
                Span::styled("  • ", Style::default().fg(text_dim())),
                Span::styled(format!("{} ({})", user.name, user.email), Style::default().fg(text())),
            ]));
        }

        if below > 0 {
            lines.push(Line::styled(
                format!("  +{} more (↓ to scroll)", below),
                Style::default().fg(text_dim()),
            ));
        } else if overflow && start > 0 {
            lines.push(Line::styled(
                format!("  {} above (↑ to scroll)", start),
                Style::default().fg(text_dim()),
            ));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_message_box(f: &mut Frame, app: &App, area: Rect) {
    let active = matches!(app.focus, Control::DraftInput | Control::SendButton);
    let block = section_block("Message (POST)", active);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    let form = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(20)])
        .split(rows[0]);

    draw_draft_input(f, app, form[0]);

    let send = Paragraph::new(vec![
        Line::from(""),
        Line::from(button(app, Control::SendButton, "Send message", "Sending...")),
    ])
    .alignment(Alignment::Center);
    f.render_widget(send, form[1]);

    if let Some(echo) = &app.echo {
        draw_echo_reply(f, echo, rows[1]);
    }
}

fn draw_draft_input(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Control::DraftInput;
    let border_color = if focused && !app.loading { accent() } else { inactive() };

    let show_cursor = focused && !app.loading;

    let content = if app.draft.is_empty() {
        Span::styled("Type a message", Style::default().fg(text_dim()).add_modifier(Modifier::ITALIC))
    } else {
        let color = if app.loading { text_dim() } else { text() };
        let room = area.width.saturating_sub(2 + u16::from(show_cursor)) as usize;
        Span::styled(tail_that_fits(&app.draft, room), Style::default().fg(color))
    };

    let mut spans = vec![content];
    if show_cursor {
        spans.push(Span::styled("_", Style::default().fg(accent())));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(input, area);
}

/// Longest suffix of `text` that fits in `width` columns, so the end of a
/// long draft stays next to the cursor
fn tail_that_fits(text: &str, width: usize) -> &str {
    text.char_indices()
        .map(|(idx, _)| &text[idx..])
        .find(|tail| Line::raw(*tail).width() <= width)
        .unwrap_or("")
}

fn draw_echo_reply(f: &mut Frame, echo: &EchoResult, area: Rect) {
    let label = Style::default().fg(text_dim()).add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::styled("Server reply:", Style::default().fg(header()))];
    match echo {
        EchoResult::Failed { error } => {
            lines.push(Line::styled(error.as_str(), Style::default().fg(danger())));
        }
        EchoResult::Reply { received_message, response, timestamp } => {
            lines.push(Line::from(vec![
                Span::styled("Received: ", label),
                Span::styled(received_message.as_str(), Style::default().fg(text())),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Response: ", label),
                Span::styled(response.as_str(), Style::default().fg(text())),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Timestamp: ", label),
                Span::styled(timestamp.as_str(), Style::default().fg(text())),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.focus {
        Control::DraftInput => vec![("Enter", "Send"), ("Tab", "Next"), ("Ctrl+C", "Quit")],
        Control::UsersButton if !app.users.is_empty() => {
            vec![("Space", "Run"), ("↑↓", "Scroll"), ("Tab", "Next"), ("q", "Quit")]
        }
        _ => vec![("Space", "Run"), ("Tab", "Next"), ("q", "Quit")],
    };

    let mut hint_spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    if app.loading {
        hint_spans.push(Span::styled("working...", Style::default().fg(theme().warning)));
    }

    f.render_widget(Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendClient, HealthStatus, UserRecord};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        App::new(BackendClient::new("http://localhost:8000"))
    }

    /// Render the panel and return the screen as plain text, one line per row
    fn render(app: &App) -> String {
        render_at(app, 100, 32)
    }

    fn render_at(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_health_status_rendered() {
        let mut app = app();
        assert!(!render(&app).contains("Status:"));

        app.health = Some(HealthStatus {
            status: "ok".to_string(),
            message: "ready".to_string(),
        });
        let screen = render(&app);
        assert!(screen.contains("Status: ok"));
        assert!(screen.contains("ready"));
    }

    #[test]
    fn test_unreachable_health_rendered() {
        let mut app = app();
        app.health = Some(HealthStatus::unreachable());
        let screen = render(&app);
        assert!(screen.contains("Status: error"));
        assert!(screen.contains("cannot reach backend"));
    }

    #[test]
    fn test_empty_users_has_no_list() {
        let screen = render(&app());
        assert!(screen.contains("[ Fetch users ]"));
        assert!(!screen.contains("Fetched users:"));
    }

    #[test]
    fn test_single_user_rendered() {
        let mut app = app();
        app.users = vec![UserRecord {
            id: serde_json::json!(1),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
        }];

        let screen = render(&app);
        assert!(screen.contains("Fetched users:"));
        assert_eq!(screen.matches("A (a@x.com)").count(), 1);
        assert_eq!(screen.matches("  • ").count(), 1);
    }

    #[test]
    fn test_long_user_list_scrolls() {
        let mut app = app();
        app.users = (0..8)
            .map(|i| UserRecord {
                id: serde_json::json!(i),
                name: format!("U{}", i),
                email: format!("u{}@x.com", i),
            })
            .collect();
        app.focus = Control::UsersButton;

        let visible = |screen: &str| -> Vec<usize> {
            (0..8).filter(|i| screen.contains(&format!("U{} (u{}@x.com)", i, i))).collect()
        };

        let screen = render_at(&app, 80, 24);
        let first = visible(&screen);
        assert!(!first.is_empty());
        assert!(first.len() < 8);
        assert!(screen.contains(&format!("+{} more", 8 - first.len())));

        let mut seen: std::collections::HashSet<usize> = first.into_iter().collect();
        for _ in 0..8 {
            app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
            seen.extend(visible(&render_at(&app, 80, 24)));
        }
        assert_eq!(seen.len(), 8);

        // Scrolled to the bottom, the hidden rows are the ones above
        let screen = render_at(&app, 80, 24);
        assert!(screen.contains("U7 (u7@x.com)"));
        assert!(screen.contains("above"));
        assert!(!screen.contains("more (↓"));
    }

    #[test]
    fn test_long_health_message_wraps() {
        let mut app = app();
        app.health = Some(HealthStatus {
            status: "error".to_string(),
            message: "the backend is up but the database pool is exhausted and every request \
                      is queueing behind a slow migration job tail-marker"
                .to_string(),
        });

        let screen = render(&app);
        assert!(screen.contains("Status: error"));
        assert!(screen.contains("tail-marker"));
    }

    #[test]
    fn test_long_draft_keeps_tail_visible() {
        let mut app = app();
        app.focus = Control::DraftInput;
        app.draft = format!("{}END", "x".repeat(200));

        let screen = render(&app);
        assert!(screen.contains("END_"));
    }

    #[test]
    fn test_tail_that_fits() {
        assert_eq!(tail_that_fits("hello", 10), "hello");
        assert_eq!(tail_that_fits("hello", 3), "llo");
        assert_eq!(tail_that_fits("hello", 0), "");
        // Wide characters take two columns each
        assert_eq!(tail_that_fits("疎通確認", 5), "確認");
    }

    #[test]
    fn test_echo_reply_rendered_verbatim() {
        let mut app = app();
        app.draft = "hello".to_string();
        app.echo = Some(EchoResult::Reply {
            received_message: "hello".to_string(),
            response: "echo: hello".to_string(),
            timestamp: "T".to_string(),
        });

        let screen = render(&app);
        assert!(screen.contains("Received: hello"));
        assert!(screen.contains("Response: echo: hello"));
        assert!(screen.contains("Timestamp: T"));
    }

    #[test]
    fn test_echo_error_rendered() {
        let mut app = app();
        app.echo = Some(EchoResult::send_failed());
        let screen = render(&app);
        assert!(screen.contains("Server reply:"));
        assert!(screen.contains("failed to send message"));
        assert!(!screen.contains("Timestamp:"));
    }

    #[test]
    fn test_busy_labels_while_loading() {
        let mut app = app();
        assert!(render(&app).contains("[ Run health check ]"));

        app.loading = true;
        let screen = render(&app);
        assert!(screen.contains("[ Checking... ]"));
        assert!(screen.contains("[ Fetching... ]"));
        assert!(screen.contains("[ Sending... ]"));
        assert!(!screen.contains("[ Run health check ]"));

        app.loading = false;
        let screen = render(&app);
        assert!(screen.contains("[ Run health check ]"));
        assert!(screen.contains("[ Send message ]"));
    }

    #[test]
    fn test_placeholder_until_typed() {
        let mut app = app();
        assert!(render(&app).contains("Type a message"));

        app.draft = "hi there".to_string();
        let screen = render(&app);
        assert!(screen.contains("hi there"));
        assert!(!screen.contains("Type a message"));
    }
}
