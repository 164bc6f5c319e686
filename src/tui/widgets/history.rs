use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.filter_mode {
        Some(mode) => format!(" History (mode: {}) ", mode.as_str()),
        None => " History ".to_string(),
    };

    let items: Vec<ListItem> = app
        .history
        .items
        .iter()
        .map(|entry| {
            let best = app.progress.best_score(entry.mode);
            let score_color = if entry.score > 0 && entry.score == best {
                Color::Green
            } else {
                Color::White
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<14}", format_date(&entry.recorded_at)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<16}", entry.mode.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<8}", entry.score),
                    Style::default().fg(score_color),
                ),
                Span::styled(
                    entry
                        .level
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<14}", "Date"), header_style),
        Span::styled(format!("{:<16}", "Mode"), header_style),
        Span::styled(format!("{:<8}", "Score"), header_style),
        Span::styled("Level", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.history.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}

fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %d %H:%M").to_string()
}
