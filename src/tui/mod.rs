mod ui;
mod widgets;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::db::{Database, Stats};
use crate::intervals::Difficulty;
use crate::levels::{self, LevelConfig};
use crate::models::{GameMode, ProgressData, ProgressHistoryEntry};
use crate::progression::{LevelingPolicy, FEEDBACK_DELAY};
use crate::recorder::ScoreRecorder;
use crate::session::{PracticeKind, PracticeSession, RoundResult, SessionSummary};

const HISTORY_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Levels,
    Practice,
    History,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Levels,
            View::Levels => View::History,
            View::Practice => View::Practice,
            View::History => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::History,
            View::Levels => View::Dashboard,
            View::Practice => View::Practice,
            View::History => View::Levels,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// A running practice session plus the round currently on screen.
pub struct Practice {
    pub session: PracticeSession<StdRng>,
    pub options: StatefulList<String>,
    pub feedback: Option<RoundResult>,
    feedback_at: Option<Instant>,
    started: Instant,
}

impl Practice {
    fn start(kind: PracticeKind, app: &App) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session = PracticeSession::new(kind, StdRng::from_entropy())?
            .with_profile(app.db.get_profile()?, app.policy);
        let options = session.next_challenge()?.option_labels();
        Ok(Self {
            session,
            options: StatefulList::with_items(options),
            feedback: None,
            feedback_at: None,
            started: Instant::now(),
        })
    }

    pub fn time_left(&self) -> Option<Duration> {
        self.session
            .time_limit()
            .map(|limit| limit.saturating_sub(self.started.elapsed()))
    }

    fn out_of_time(&self) -> bool {
        self.time_left().map_or(false, |left| left.is_zero())
    }
}

pub struct App {
    db: Database,
    policy: LevelingPolicy,
    pub view: View,
    pub levels: StatefulList<LevelConfig>,
    pub history: StatefulList<ProgressHistoryEntry>,
    pub progress: ProgressData,
    pub stats: Stats,
    pub practice_mode: GameMode,
    pub practice_difficulty: Difficulty,
    pub practice: Option<Practice>,
    pub last_summary: Option<SessionSummary>,
    pub status: Option<String>,
    pub filter_mode: Option<GameMode>,
    pub filter_input: String,
    pub filtering: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, policy: LevelingPolicy) -> Result<Self, Box<dyn std::error::Error>> {
        let recorder = ScoreRecorder::new(&db);
        let progress = recorder.progress()?;
        let mut history = recorder.history(HISTORY_DAYS)?;
        history.reverse();
        let stats = db.get_stats()?;

        Ok(Self {
            db,
            policy,
            view: View::Dashboard,
            levels: StatefulList::with_items(levels::all_levels()?),
            history: StatefulList::with_items(history),
            progress,
            stats,
            practice_mode: GameMode::Treble,
            practice_difficulty: Difficulty::Easy,
            practice: None,
            last_summary: None,
            status: None,
            filter_mode: None,
            filter_input: String::new(),
            filtering: false,
            should_quit: false,
        })
    }

    pub fn policy(&self) -> LevelingPolicy {
        self.policy
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let recorder = ScoreRecorder::new(&self.db);
        self.progress = recorder.progress()?;
        let mut history = recorder.history(HISTORY_DAYS)?;
        if let Some(mode) = self.filter_mode {
            history.retain(|e| e.mode == mode);
        }
        history.reverse();
        self.history = StatefulList::with_items(history);
        self.stats = self.db.get_stats()?;
        Ok(())
    }

    fn apply_filter(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.filter_mode = if self.filter_input.is_empty() {
            None
        } else {
            match GameMode::from_str(&self.filter_input) {
                Some(mode) => Some(mode),
                None => {
                    self.status = Some(format!("Unknown mode '{}'", self.filter_input));
                    None
                }
            }
        };
        self.refresh_data()
    }

    fn cycle_mode(&mut self) {
        let i = GameMode::ALL
            .iter()
            .position(|m| *m == self.practice_mode)
            .unwrap_or(0);
        self.practice_mode = GameMode::ALL[(i + 1) % GameMode::ALL.len()];
    }

    fn cycle_difficulty(&mut self) {
        let i = Difficulty::ALL
            .iter()
            .position(|d| *d == self.practice_difficulty)
            .unwrap_or(0);
        self.practice_difficulty = Difficulty::ALL[(i + 1) % Difficulty::ALL.len()];
    }

    fn start_practice(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let kind = if self.practice_mode == GameMode::EarTraining {
            PracticeKind::Intervals {
                difficulty: self.practice_difficulty,
            }
        } else {
            let level = self
                .levels
                .selected_item()
                .map_or(levels::DEFAULT_LEVEL, |l| l.id());
            PracticeKind::Notes {
                mode: self.practice_mode,
                level,
            }
        };

        self.practice = Some(Practice::start(kind, self)?);
        self.last_summary = None;
        self.status = None;
        self.view = View::Practice;
        Ok(())
    }

    fn submit_selected(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(practice) = self.practice.as_mut() else {
            return Ok(());
        };
        if practice.feedback.is_some() {
            return Ok(());
        }
        let Some(answer) = practice.options.selected_item().cloned() else {
            return Ok(());
        };

        let result = practice.session.submit(&answer)?;
        for award in result.awards() {
            let applied = self.db.add_xp(award, self.policy)?;
            practice.session.sync_profile(applied.state.profile());
            if applied.leveled_up {
                self.status = Some(format!("Level up! You are now level {}", applied.state.level));
            }
        }
        practice.feedback = Some(result);
        practice.feedback_at = Some(Instant::now());
        Ok(())
    }

    fn select_option(&mut self, index: usize) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(practice) = self.practice.as_mut() {
            if index < practice.options.items.len() {
                practice.options.selected = Some(index);
                return self.submit_selected();
            }
        }
        Ok(())
    }

    /// Moves past the feedback delay and enforces the sight-reading clock.
    fn tick(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(practice) = self.practice.as_mut() else {
            return Ok(());
        };

        if let Some(at) = practice.feedback_at {
            if at.elapsed() < FEEDBACK_DELAY {
                return Ok(());
            }
            practice.session.advance()?;
            practice.feedback = None;
            practice.feedback_at = None;

            if practice.session.is_finished() || practice.out_of_time() {
                return self.finish_practice();
            }
            let options = practice.session.next_challenge()?.option_labels();
            practice.options = StatefulList::with_items(options);
        } else if practice.out_of_time() {
            return self.finish_practice();
        }
        Ok(())
    }

    fn finish_practice(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(practice) = self.practice.take() else {
            return Ok(());
        };
        let summary = practice.session.summary();
        debug!(rounds = summary.rounds_played, score = summary.score, "practice finished");

        if summary.rounds_played > 0 {
            let recorder = ScoreRecorder::new(&self.db);
            recorder.record_score(summary.mode, summary.score, summary.level)?;
            if summary.level_completed {
                if let Some(level) = summary.level {
                    recorder.record_level(level)?;
                }
            }
        }

        self.last_summary = Some(summary);
        self.view = View::Dashboard;
        self.refresh_data()
    }

    fn handle_practice_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.finish_practice()?,
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(p) = self.practice.as_mut() {
                    p.options.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(p) = self.practice.as_mut() {
                    p.options.previous();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.submit_selected()?,
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let index = c.to_digit(10).map_or(0, |d| d as usize - 1);
                self.select_option(index)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.status = None;

        if self.filtering {
            match key {
                KeyCode::Esc => {
                    self.filtering = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filtering = false;
                    self.apply_filter()?;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        if self.view == View::Practice {
            return self.handle_practice_key(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::History => {
                self.filtering = true;
                self.filter_input.clear();
            }

            KeyCode::Esc if self.view == View::History && self.filter_mode.is_some() => {
                self.filter_mode = None;
                self.filter_input.clear();
                self.apply_filter()?;
            }

            KeyCode::Char('m') => self.cycle_mode(),
            KeyCode::Char('d') => self.cycle_difficulty(),
            KeyCode::Char('p') => self.start_practice()?,

            KeyCode::Char('h') | KeyCode::Left => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right => self.view = self.view.next(),
            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => self.view = self.view.prev(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Levels => self.levels.next(),
                View::History => self.history.next(),
                _ => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Levels => self.levels.previous(),
                View::History => self.history.previous(),
                _ => {}
            },
            KeyCode::Char('g') => match self.view {
                View::Levels => self.levels.first(),
                View::History => self.history.first(),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Levels => self.levels.last(),
                View::History => self.history.last(),
                _ => {}
            },

            KeyCode::Enter if self.view == View::Levels => self.start_practice()?,

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, policy: LevelingPolicy) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = App::new(db, policy).and_then(|mut app| run_app(&mut terminal, &mut app));

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }
        app.tick()?;

        if app.should_quit {
            return Ok(());
        }
    }
}
