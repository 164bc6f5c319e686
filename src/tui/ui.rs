use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, history, levels, practice};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Levels", "Practice", "History"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Levels => 1,
        View::Practice => 2,
        View::History => 3,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" NotaQuest "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Levels => levels::draw(f, app, area),
        View::Practice => practice::draw(f, app, area),
        View::History => history::draw(f, app, area),
    }
}

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.filtering {
        vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(&app.filter_input),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            key("<CR>"),
            Span::raw(" Apply  "),
            key("<Esc>"),
            Span::raw(" Cancel"),
        ]
    } else if let Some(status) = &app.status {
        vec![Span::styled(status.as_str(), Style::default().fg(Color::Yellow))]
    } else {
        let mut spans = Vec::new();

        match app.view {
            View::Practice => {
                spans.extend(vec![
                    key("1-9"),
                    Span::raw(" Answer  "),
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("<CR>"),
                    Span::raw(" Submit  "),
                    key("<Esc>"),
                    Span::raw(" End"),
                ]);
            }
            view => {
                spans.extend(vec![key("h/l"), Span::raw(" Views  ")]);
                match view {
                    View::Levels => spans.extend(vec![
                        key("j/k"),
                        Span::raw(" Nav  "),
                        key("g/G"),
                        Span::raw(" Top/Bot  "),
                        key("<CR>/p"),
                        Span::raw(" Play  "),
                    ]),
                    View::History => {
                        spans.extend(vec![
                            key("j/k"),
                            Span::raw(" Nav  "),
                            key("/"),
                            Span::raw(" Filter  "),
                        ]);
                        if app.filter_mode.is_some() {
                            spans.extend(vec![key("<Esc>"), Span::raw(" Clear  ")]);
                        }
                    }
                    _ => spans.extend(vec![
                        key("p"),
                        Span::raw(" Play  "),
                        key("^r"),
                        Span::raw(" Refresh  "),
                    ]),
                }
                spans.extend(vec![
                    key("m"),
                    Span::raw(format!(" Mode: {}  ", app.practice_mode.label())),
                    key("d"),
                    Span::raw(format!(" Ear: {}  ", app.practice_difficulty.as_str())),
                    key("q"),
                    Span::raw(" Quit"),
                ]);
            }
        }

        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
