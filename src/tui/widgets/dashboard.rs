use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::GameMode;
use crate::tui::App;

const BAR_WIDTH: usize = 20;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Profile + best scores row
            Constraint::Min(0),    // Last session
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_profile(f, app, top_chunks[0]);
    draw_best_scores(f, app, top_chunks[1]);
    draw_last_session(f, app, chunks[1]);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_profile(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let policy = app.policy();
    let to_next = policy.xp_to_next_level(stats.level, stats.xp);
    let in_level = policy.progress_in_level(stats.level, stats.xp);

    let text = vec![
        Line::from(vec![
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.level),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line("XP", format!("{}", stats.xp), Color::White),
        Line::from(vec![
            Span::styled(xp_bar(in_level), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {} to go", to_next),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        stat_line(
            "Levels completed",
            format!("{}", stats.levels_completed),
            Color::Green,
        ),
        stat_line(
            "Sessions (7d)",
            format!("{} of {}", stats.sessions_this_week, stats.total_sessions),
            Color::Cyan,
        ),
        stat_line("Avg score", format!("{:.1}", stats.avg_score), Color::Cyan),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Profile ({}) ", policy.as_str()))
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_best_scores(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = GameMode::ALL
        .iter()
        .map(|mode| {
            let best = app.progress.best_score(*mode);
            let style = if best == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Yellow)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<16}", mode.label()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(format!("{}", best), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Best Scores ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_last_session(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.last_summary {
        Some(summary) => {
            let mut lines = vec![
                stat_line("Mode", summary.mode.label().to_string(), Color::White),
                stat_line(
                    "Score",
                    format!(
                        "{} ({} of {} correct)",
                        summary.score, summary.correct, summary.rounds_played
                    ),
                    Color::Yellow,
                ),
                stat_line("XP earned", format!("{}", summary.xp_earned), Color::Green),
            ];
            if let (true, Some(level)) = (summary.level_completed, summary.level) {
                lines.push(Line::from(Span::styled(
                    format!("Level {} complete!", level),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "Pick a level and press p to play.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Last Session ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(Paragraph::new(text).block(block), area);
}

/// Bar for `fraction` of the current level, clamped to `0.0..=1.0`.
fn xp_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
