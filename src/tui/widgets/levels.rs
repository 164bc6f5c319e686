use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::levels::LevelFeatures;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .levels
        .items
        .iter()
        .map(|level| {
            let completed = app.progress.completed_levels.contains(&level.id());
            let (status_text, status_color) = if completed {
                ("Complete", Color::Green)
            } else {
                ("-", Color::DarkGray)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<4}", level.id()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("{:<22}", level.name()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<18}", feature_flags(level.features())),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<10}", status_text),
                    Style::default().fg(status_color),
                ),
                Span::styled(level.description(), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Levels (mode: {}) ", app.practice_mode.label()))
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<4}", "#"), header_style),
        Span::styled(format!("{:<22}", "Name"), header_style),
        Span::styled(format!("{:<18}", "Features"), header_style),
        Span::styled(format!("{:<10}", "Status"), header_style),
        Span::styled("Description", header_style),
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
    state.select(app.levels.selected);

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

/// Compact letters for the notation features a level turns on.
fn feature_flags(features: LevelFeatures) -> String {
    let flags = [
        (features.use_ledger_lines, "ledger"),
        (features.include_stems, "stems"),
        (features.include_rests, "rests"),
        (features.use_sequenced_content, "seq"),
    ];
    let on: Vec<&str> = flags
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, name)| *name)
        .collect();
    if on.is_empty() {
        "-".to_string()
    } else {
        on.join(",")
    }
}
