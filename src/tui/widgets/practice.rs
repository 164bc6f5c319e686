use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::progression::RoundPhase;
use crate::session::Challenge;
use crate::staff;
use crate::tui::{App, Practice};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(practice) = &app.practice else {
        let idle = Paragraph::new("No session running. Press p to play.")
            .block(Block::default().borders(Borders::ALL).title(" Practice "));
        f.render_widget(idle, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Round header
            Constraint::Min(0),    // Challenge + options
            Constraint::Length(3), // Feedback
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    draw_header(f, practice, chunks[0]);
    draw_challenge(f, practice, body[0]);
    draw_options(f, practice, body[1]);
    draw_feedback(f, practice, chunks[2]);
}

fn draw_header(f: &mut Frame, practice: &Practice, area: Rect) {
    let session = &practice.session;
    let round = session.rounds_played() + u32::from(session.phase() == RoundPhase::AwaitingAnswer);
    let round_text = match session.round_limit() {
        Some(limit) => format!("Round {}/{}", round.min(limit), limit),
        None => format!("Round {}", round),
    };
    let progression = session.progression();

    let mut spans = vec![
        Span::styled(round_text, Style::default().fg(Color::White)),
        Span::raw("   "),
        Span::styled(
            format!("Score: {}", session.score()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Level {} ({} XP)", progression.level, progression.xp),
            Style::default().fg(Color::Green),
        ),
    ];
    if let Some(left) = practice.time_left() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("{}s left", left.as_secs()),
            Style::default().fg(if left.as_secs() <= 10 {
                Color::Red
            } else {
                Color::Cyan
            }),
        ));
    }

    let title = match session.config() {
        Some(level) => format!(" {} - {} ", session.kind().mode().label(), level.name()),
        None => format!(" {} ", session.kind().mode().label()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_challenge(f: &mut Frame, practice: &Practice, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    match practice.session.challenge() {
        Some(Challenge::Note { note, .. }) => {
            lines.extend(staff::render_note(note).into_iter().map(Line::from));
            lines.push(Line::from(""));
            lines.push(prompt(format!("Name this note ({} clef)", note.clef.as_str())));
        }
        Some(Challenge::Sequence { sequence, .. }) => {
            lines.extend(
                staff::render_sequence(sequence.clef, &sequence.items)
                    .into_iter()
                    .map(Line::from),
            );
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} beats", sequence.total_beats()),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(prompt(format!(
                "Name the first note ({} clef)",
                sequence.clef.as_str()
            )));
        }
        Some(Challenge::Interval(c)) => {
            lines.push(Line::from(format!(
                "Root {}  {:.2} Hz",
                c.root.display(),
                c.root_hz
            )));
            lines.push(Line::from(format!("Upper    {:.2} Hz", c.upper_hz)));
            lines.push(Line::from(""));
            lines.push(prompt("Which interval is this?".to_string()));
        }
        None => lines.push(prompt("Get ready...".to_string())),
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Challenge ")
        .title_style(Style::default().fg(Color::Magenta));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn prompt(text: String) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))
}

fn draw_options(f: &mut Frame, practice: &Practice, area: Rect) {
    let items: Vec<ListItem> = practice
        .options
        .items
        .iter()
        .enumerate()
        .map(|(i, option)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(option.clone(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Answers ")
                .title_style(Style::default().fg(Color::Yellow)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(practice.options.selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_feedback(f: &mut Frame, practice: &Practice, area: Rect) {
    let line = match &practice.feedback {
        Some(result) if result.correct => {
            let xp: u32 = result.awards().map(|a| a.get()).sum();
            Line::from(vec![
                Span::styled(
                    "Correct!",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  +{} XP", xp), Style::default().fg(Color::Green)),
            ])
        }
        Some(result) => Line::from(vec![
            Span::styled(
                "Incorrect.",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  It was {}", result.expected),
                Style::default().fg(Color::White),
            ),
        ]),
        None => Line::from(Span::styled(
            "Pick an answer",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}
