use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, Speaker};
use crate::format::format_deadline;

const HELP_TEXT: &str =
    "Enter: Send | ↑/↓: Select task | F2: Done | F3: Postpone | F8: Delete | PgUp/PgDn: Scroll | Esc: Quit";

pub fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Tasks + chat
            Constraint::Length(3), // Input
            Constraint::Length(1), // Help
        ])
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    render_tasks(f, app, panes[0]);
    render_chat(f, app, panes[1]);

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(input, rows[1]);

    let help = Paragraph::new(HELP_TEXT).style(Style::default().fg(Color::Gray));
    f.render_widget(help, rows[2]);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: ratatui::layout::Rect) {
    let now = Local::now();

    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|t| {
            let overdue = t.is_overdue_at(now);
            let style = if overdue {
                Style::default().fg(Color::Red)
            } else if t.has_deadline() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            };

            Row::new(vec![
                Cell::from(t.id.to_string()),
                Cell::from(t.effective_description().to_string()),
                Cell::from(t.deadline.map(format_deadline).unwrap_or_default()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(12),
        Constraint::Length(11),
    ];

    let title = format!("Active tasks (user {})", app.user_id);
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "Description", "Deadline"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_chat(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for message in &app.messages {
        let (prefix, style) = match message.speaker {
            Speaker::User => ("> ", Style::default().fg(Color::Cyan)),
            Speaker::Bot => ("", Style::default()),
        };
        for (i, text) in message.text.lines().enumerate() {
            let lead = if i == 0 { prefix } else { "" };
            lines.push(Line::from(Span::styled(format!("{lead}{text}"), style)));
        }
        lines.push(Line::default());
    }

    // Keep the newest messages in view unless the user scrolled back.
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2);
    let total_rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(inner_width))
        .sum();
    let bottom = u16::try_from(total_rows)
        .unwrap_or(u16::MAX)
        .saturating_sub(inner_height);
    let offset = bottom.saturating_sub(app.scroll_back);

    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0))
        .block(Block::default().borders(Borders::ALL).title("Chat"));
    f.render_widget(chat, area);
}
