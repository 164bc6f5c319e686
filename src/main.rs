mod catalog;
mod db;
mod error;
mod generator;
mod intervals;
mod levels;
mod models;
mod progression;
mod recorder;
mod session;
mod staff;
mod tui;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use catalog::{all_mnemonic_cards, mnemonic_cards, mnemonic_phrase, StaffElement};
use db::Database;
use intervals::{random_interval, Difficulty};
use models::{Clef, GameMode, JsonOutput};
use progression::{LevelingPolicy, XpAmount};
use recorder::ScoreRecorder;
use session::{Challenge, PracticeKind, PracticeSession, SessionSummary};

const DEFAULT_DB_NAME: &str = "notaquest.db";
const DB_ENV: &str = "NOTAQUEST_DB";
const LOG_ENV: &str = "NOTAQUEST_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "notaquest")]
#[command(about = "Music-notation practice: note reading, interval training and XP progression")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Leveling policy: simple (100 XP per level) or milestone
    #[arg(long, global = true, default_value = "milestone")]
    policy: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// List all levels
    Levels,

    /// Show level details
    Level {
        /// Level ID
        id: u32,
    },

    /// Generate a note challenge with answer options
    Note {
        /// Level ID
        #[arg(long, short, default_value_t = levels::DEFAULT_LEVEL)]
        level: u32,

        /// Clef: treble/bass
        #[arg(long, short, default_value = "treble")]
        clef: String,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a random interval
    Interval {
        /// Difficulty: easy/medium/hard
        #[arg(long, short, default_value = "easy")]
        difficulty: String,

        /// Pick the interval spanning this many semitones (0-12) instead
        #[arg(long, short)]
        semitones: Option<u8>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show mnemonic flashcards
    Mnemonic {
        /// Clef: treble/bass
        #[arg(long, short)]
        clef: Option<String>,

        /// Staff element: line/space
        #[arg(long, short)]
        element: Option<String>,
    },

    /// Play a note-reading session
    Play {
        /// Mode: treble/bass/both/sight-reading
        #[arg(long, short, default_value = "treble")]
        mode: String,

        /// Level ID
        #[arg(long, short, default_value_t = levels::DEFAULT_LEVEL)]
        level: u32,

        /// Number of rounds (defaults to a full level)
        #[arg(long, short)]
        rounds: Option<u32>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play an interval-recognition session
    Intervals {
        /// Difficulty: easy/medium/hard
        #[arg(long, short, default_value = "easy")]
        difficulty: String,

        /// Number of rounds
        #[arg(long, short)]
        rounds: Option<u32>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show XP and level
    Profile,

    /// Add XP to the profile
    AddXp {
        /// XP amount (positive)
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },

    /// Show best scores, completed levels and statistics
    Progress,

    /// Show score history
    History {
        /// Only entries from the last N days
        #[arg(long, short, default_value_t = 30)]
        days: u32,
    },

    /// Clear progress history
    Reset {
        /// Also reset XP and level
        #[arg(long)]
        all: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_ENV) {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notaquest");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            match serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
                Ok(out) => println!("{}", out),
                Err(_) => eprintln!("Error: {}", e),
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let policy = LevelingPolicy::from_str(&cli.policy).ok_or_else(|| {
        format!(
            "Invalid policy '{}'. Use: simple or milestone",
            cli.policy
        )
    })?;

    let db_path = get_db_path();
    let db = Database::open(&db_path)?;
    db.init()?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Levels => {
            let all = levels::all_levels()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&all))?);
            } else {
                println!("{:<5} {:<22} DESCRIPTION", "ID", "NAME");
                println!("{}", "-".repeat(70));
                for level in all {
                    println!(
                        "{:<5} {:<22} {}",
                        level.id(),
                        truncate(level.name(), 20),
                        truncate(level.description(), 42)
                    );
                }
            }
        }

        Commands::Level { id } => {
            let level = levels::resolve(id)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&level))?);
            } else {
                let features = level.features();
                println!("Level {}: {}", level.id(), level.name());
                println!("{}", level.description());
                println!();
                println!(
                    "Notes: {}",
                    level
                        .notes()
                        .iter()
                        .map(|n| n.as_char().to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                );
                println!(
                    "Octaves: {}",
                    level
                        .octaves()
                        .iter()
                        .map(|o| o.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                println!(
                    "Accidentals: {}",
                    if level.accidentals().is_empty() {
                        "-".to_string()
                    } else {
                        level
                            .accidentals()
                            .iter()
                            .map(|a| a.suffix())
                            .collect::<Vec<_>>()
                            .join(" ")
                    }
                );
                println!("Ledger lines: {}", yes_no(features.use_ledger_lines));
                println!("Stems: {}", yes_no(features.include_stems));
                println!("Rests: {}", yes_no(features.include_rests));
                println!("Sequences: {}", yes_no(features.use_sequenced_content));
            }
        }

        Commands::Note { level, clef, seed } => {
            let clef = Clef::from_str(&clef)
                .ok_or_else(|| format!("Invalid clef '{}'. Use: treble or bass", clef))?;
            let config = levels::resolve(level)?.gated_for(level);
            let mut rng = make_rng(seed);
            let note = generator::generate_note(&config, clef, &mut rng);
            let options = generator::generate_options(&note.answer_label(), &config, &mut rng)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "note": note,
                        "answer": note.answer_label(),
                        "display": note.display(),
                        "midi": note.midi(),
                        "frequency": note.frequency(),
                        "staff_position": note.staff_position(),
                        "ledger_lines": note.ledger_lines(),
                        "stem": note.stem_direction(),
                        "options": options
                    })))?
                );
            } else {
                for row in staff::render_note(&note) {
                    println!("{}", row);
                }
                println!();
                println!("Note: {} ({} clef)", note.display(), note.clef.as_str());
                println!(
                    "Staff position: {} ({} ledger lines)",
                    note.staff_position(),
                    note.ledger_lines()
                );
                println!("Frequency: {:.2} Hz", note.frequency());
                println!("Options: {}", options.options().join("  "));
            }
        }

        Commands::Interval {
            difficulty,
            semitones,
            seed,
        } => {
            let difficulty = parse_difficulty(&difficulty)?;
            let interval = match semitones {
                Some(n) => catalog::Interval::from_semitones(n)
                    .ok_or_else(|| format!("No interval spans {} semitones. Use 0-12", n))?,
                None => random_interval(difficulty, &mut make_rng(seed)),
            };

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "interval": interval,
                        "name": interval.full_name(),
                        "semitones": intervals::semitones(interval),
                        "difficulty": difficulty
                    })))?
                );
            } else {
                println!(
                    "{} ({}): {} semitones",
                    interval.label(),
                    interval.full_name(),
                    intervals::semitones(interval)
                );
            }
        }

        Commands::Mnemonic { clef, element } => {
            let clef = clef
                .map(|c| {
                    Clef::from_str(&c).ok_or_else(|| format!("Invalid clef '{}'. Use: treble or bass", c))
                })
                .transpose()?;
            let element = element
                .map(|e| {
                    StaffElement::from_str(&e)
                        .ok_or_else(|| format!("Invalid element '{}'. Use: line or space", e))
                })
                .transpose()?;

            let cards: Vec<_> = match (clef, element) {
                (Some(c), Some(e)) => mnemonic_cards(c, e),
                _ => all_mnemonic_cards()
                    .into_iter()
                    .filter(|card| clef.map_or(true, |c| card.clef == c))
                    .filter(|card| element.map_or(true, |e| card.element == e))
                    .collect(),
            };

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&cards))?);
            } else {
                let mut current = None;
                for card in cards {
                    let group = (card.clef, card.element);
                    if current != Some(group) {
                        if current.is_some() {
                            println!();
                        }
                        println!(
                            "{} clef {}s: {}",
                            card.clef.as_str(),
                            card.element.as_str(),
                            mnemonic_phrase(card.clef, card.element)
                        );
                        current = Some(group);
                    }
                    println!(
                        "  {} {:<8} {}",
                        card.position + 1,
                        card.word,
                        card.staff_note().display()
                    );
                }
            }
        }

        Commands::Play {
            mode,
            level,
            rounds,
            seed,
        } => {
            let mode = GameMode::from_str(&mode)
                .filter(|m| *m != GameMode::EarTraining)
                .ok_or_else(|| {
                    format!(
                        "Invalid mode '{}'. Use: treble, bass, both, or sight-reading",
                        mode
                    )
                })?;
            let level = levels::resolve_or_default(level)?.id();

            let mut session = PracticeSession::new(PracticeKind::Notes { mode, level }, make_rng(seed))?
                .with_profile(db.get_profile()?, policy);
            if rounds.is_some() {
                session = session.with_round_limit(rounds);
            }

            let summary = play(&db, session, policy, cli.json)?;
            finish_session(&db, &summary, cli.json)?;
        }

        Commands::Intervals {
            difficulty,
            rounds,
            seed,
        } => {
            let difficulty = parse_difficulty(&difficulty)?;
            let mut session =
                PracticeSession::new(PracticeKind::Intervals { difficulty }, make_rng(seed))?
                    .with_profile(db.get_profile()?, policy);
            if rounds.is_some() {
                session = session.with_round_limit(rounds);
            }

            let summary = play(&db, session, policy, cli.json)?;
            finish_session(&db, &summary, cli.json)?;
        }

        Commands::Profile => {
            let profile = db.get_profile()?;
            let to_next = policy.xp_to_next_level(profile.level, profile.xp);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "xp": profile.xp,
                        "level": profile.level,
                        "policy": policy.as_str(),
                        "xp_to_next_level": to_next
                    })))?
                );
            } else {
                println!("Level: {}", profile.level);
                println!("XP: {}", profile.xp);
                println!("Next level in: {} XP ({} policy)", to_next, policy.as_str());
            }
        }

        Commands::AddXp { amount } => {
            let applied = db.add_xp(XpAmount::new(amount)?, policy)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "xp": applied.state.xp,
                        "level": applied.state.level,
                        "leveled_up": applied.leveled_up
                    })))?
                );
            } else {
                println!("Added {} XP. Total: {} XP", amount, applied.state.xp);
                if applied.leveled_up {
                    println!("Level up! You are now level {}.", applied.state.level);
                } else {
                    println!("Level: {}", applied.state.level);
                }
            }
        }

        Commands::Progress => {
            let recorder = ScoreRecorder::new(&db);
            let progress = recorder.progress()?;
            let best = recorder.best_scores()?;
            let stats = db.get_stats()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "best_scores": best,
                        "completed_levels": progress.completed_levels,
                        "last_played": progress.last_played,
                        "stats": stats
                    })))?
                );
            } else {
                println!("=== Progress ===");
                println!("Level {} ({} XP)", stats.level, stats.xp);
                println!();
                println!("{:<16} BEST", "MODE");
                println!("{}", "-".repeat(24));
                for mode in GameMode::ALL {
                    println!("{:<16} {}", mode.label(), best.get(&mode).copied().unwrap_or(0));
                }
                println!();
                println!(
                    "Completed levels: {}",
                    if progress.completed_levels.is_empty() {
                        "-".to_string()
                    } else {
                        progress
                            .completed_levels
                            .iter()
                            .map(|l| l.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    }
                );
                println!("Sessions played: {}", stats.total_sessions);
                println!("Sessions this week: {}", stats.sessions_this_week);
                println!("Average score: {:.1}", stats.avg_score);
                if stats.total_sessions > 0 {
                    println!(
                        "Last played: {}",
                        progress.last_played.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        Commands::History { days } => {
            let history = ScoreRecorder::new(&db).history(days)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&history))?);
            } else if history.is_empty() {
                println!("No sessions in the last {} days.", days);
            } else {
                println!("{:<18} {:<16} {:<7} LEVEL", "DATE", "MODE", "SCORE");
                println!("{}", "-".repeat(50));
                for entry in history {
                    println!(
                        "{:<18} {:<16} {:<7} {}",
                        entry.recorded_at.format("%Y-%m-%d %H:%M"),
                        entry.mode.label(),
                        entry.score,
                        entry
                            .level
                            .map(|l| l.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Reset { all } => {
            ScoreRecorder::new(&db).reset()?;
            if all {
                db.reset_profile()?;
            }

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else if all {
                println!("Progress and profile reset.");
            } else {
                println!("Progress reset.");
            }
        }

        Commands::Tui => {
            tui::run(db, policy)?;
        }
    }

    Ok(())
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s)
        .ok_or_else(|| format!("Invalid difficulty '{}'. Use: easy, medium, or hard", s))
}

// Prompts go to stderr under --json so stdout stays machine-readable
fn say(json: bool, msg: &str) {
    if json {
        eprintln!("{}", msg);
    } else {
        println!("{}", msg);
    }
}

fn print_challenge(json: bool, challenge: &Challenge) {
    match challenge {
        Challenge::Note { note, .. } => {
            for row in staff::render_note(note) {
                say(json, &row);
            }
            say(json, &format!("Name this note ({} clef):", note.clef.as_str()));
        }
        Challenge::Sequence { sequence, .. } => {
            for row in staff::render_sequence(sequence.clef, &sequence.items) {
                say(json, &row);
            }
            say(
                json,
                &format!(
                    "{} beats. Name the first note ({} clef):",
                    sequence.total_beats(),
                    sequence.clef.as_str()
                ),
            );
        }
        Challenge::Interval(c) => {
            say(
                json,
                &format!(
                    "Root {} at {:.2} Hz, upper tone at {:.2} Hz. Which interval?",
                    c.root.display(),
                    c.root_hz,
                    c.upper_hz
                ),
            );
        }
    }

    let options: Vec<String> = challenge
        .option_labels()
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}) {}", i + 1, o))
        .collect();
    say(json, &options.join("  "));
}

/// Maps `2` to the second option; anything else is taken as a label.
fn resolve_choice(input: &str, options: &[String]) -> String {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() => options[n - 1].clone(),
        _ => input.to_string(),
    }
}

fn play<R: Rng>(
    db: &Database,
    mut session: PracticeSession<R>,
    policy: LevelingPolicy,
    json: bool,
) -> Result<SessionSummary, Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let started = Instant::now();

    if let Some(limit) = session.time_limit() {
        say(json, &format!("You have {} seconds. Go!", limit.as_secs()));
    }

    'rounds: while !session.is_finished() {
        if let Some(limit) = session.time_limit() {
            if started.elapsed() >= limit {
                say(json, "Time's up!");
                break;
            }
        }

        let challenge = session.next_challenge()?.clone();
        let round = session.rounds_played() + 1;
        say(json, "");
        match session.round_limit() {
            Some(limit) => say(
                json,
                &format!("Round {}/{}  Score: {}", round, limit, session.score()),
            ),
            None => say(json, &format!("Round {}  Score: {}", round, session.score())),
        }
        print_challenge(json, &challenge);

        let result = loop {
            if json {
                eprint!("> ");
                io::stderr().flush()?;
            } else {
                print!("> ");
                io::stdout().flush()?;
            }

            let Some(line) = lines.next() else {
                break 'rounds;
            };
            let line = line?;
            let input = line.trim();
            if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
                break 'rounds;
            }

            match session.submit(&resolve_choice(input, &challenge.option_labels())) {
                Ok(result) => break result,
                Err(e @ (error::Error::UnknownNote(_) | error::Error::UnknownInterval(_))) => {
                    say(json, &format!("{}. Pick a number or type the answer.", e));
                }
                Err(e) => return Err(e.into()),
            }
        };

        if result.correct {
            say(json, "Correct!");
        } else {
            say(json, &format!("Incorrect. It was {}.", result.expected));
        }

        for award in result.awards() {
            let applied = db.add_xp(award, policy)?;
            session.sync_profile(applied.state.profile());
            if applied.leveled_up {
                say(json, &format!("Level up! You are now level {}.", applied.state.level));
            }
        }

        session.advance()?;
    }

    Ok(session.summary())
}

fn finish_session(
    db: &Database,
    summary: &SessionSummary,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if summary.rounds_played > 0 {
        let recorder = ScoreRecorder::new(db);
        recorder.record_score(summary.mode, summary.score, summary.level)?;
        if summary.level_completed {
            if let Some(level) = summary.level {
                recorder.record_level(level)?;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string(&JsonOutput::ok(summary))?);
    } else {
        println!();
        println!("=== {} ===", summary.mode.label());
        println!(
            "Score: {} ({} of {} correct)",
            summary.score, summary.correct, summary.rounds_played
        );
        println!("XP earned: {}", summary.xp_earned);
        if summary.level_completed {
            if let Some(level) = summary.level {
                println!("Level {} complete!", level);
            }
        }
        println!("Level {} ({} XP)", summary.profile.level, summary.profile.xp);
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("♯♯♯♯♯♯", 5), "♯♯...");
        }
    }

    mod choice_tests {
        use super::*;

        fn options() -> Vec<String> {
            vec!["C".into(), "F#".into(), "A".into(), "Bb".into()]
        }

        #[test]
        fn number_selects_option() {
            assert_eq!(resolve_choice("2", &options()), "F#");
            assert_eq!(resolve_choice("4", &options()), "Bb");
        }

        #[test]
        fn out_of_range_number_is_passed_through() {
            assert_eq!(resolve_choice("0", &options()), "0");
            assert_eq!(resolve_choice("5", &options()), "5");
        }

        #[test]
        fn label_is_passed_through() {
            assert_eq!(resolve_choice("c#", &options()), "c#");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["notaquest", "init"]).unwrap();
            assert!(!cli.json);
            assert_eq!(cli.policy, "milestone");
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_init_with_json() {
            let cli = Cli::try_parse_from(["notaquest", "--json", "init"]).unwrap();
            assert!(cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_policy_global() {
            let cli = Cli::try_parse_from(["notaquest", "profile", "--policy", "simple"]).unwrap();
            assert_eq!(cli.policy, "simple");
            assert!(matches!(cli.command, Commands::Profile));
        }

        #[test]
        fn parse_level_command() {
            let cli = Cli::try_parse_from(["notaquest", "level", "3"]).unwrap();
            match cli.command {
                Commands::Level { id } => assert_eq!(id, 3),
                _ => panic!("Expected Level command"),
            }
        }

        #[test]
        fn parse_note_defaults() {
            let cli = Cli::try_parse_from(["notaquest", "note"]).unwrap();
            match cli.command {
                Commands::Note { level, clef, seed } => {
                    assert_eq!(level, 1);
                    assert_eq!(clef, "treble");
                    assert!(seed.is_none());
                }
                _ => panic!("Expected Note command"),
            }
        }

        #[test]
        fn parse_note_with_flags() {
            let cli = Cli::try_parse_from([
                "notaquest", "note", "-l", "4", "-c", "bass", "--seed", "7",
            ])
            .unwrap();
            match cli.command {
                Commands::Note { level, clef, seed } => {
                    assert_eq!(level, 4);
                    assert_eq!(clef, "bass");
                    assert_eq!(seed, Some(7));
                }
                _ => panic!("Expected Note command"),
            }
        }

        #[test]
        fn parse_interval_command() {
            let cli =
                Cli::try_parse_from(["notaquest", "interval", "--difficulty", "hard"]).unwrap();
            match cli.command {
                Commands::Interval {
                    difficulty,
                    semitones,
                    seed,
                } => {
                    assert_eq!(difficulty, "hard");
                    assert!(semitones.is_none());
                    assert!(seed.is_none());
                }
                _ => panic!("Expected Interval command"),
            }
        }

        #[test]
        fn parse_interval_with_semitones() {
            let cli =
                Cli::try_parse_from(["notaquest", "interval", "--semitones", "7"]).unwrap();
            match cli.command {
                Commands::Interval { semitones, .. } => {
                    assert_eq!(semitones, Some(7));
                    let interval = catalog::Interval::from_semitones(7).unwrap();
                    assert_eq!(interval.semitones(), 7);
                }
                _ => panic!("Expected Interval command"),
            }
        }

        #[test]
        fn parse_mnemonic_filters() {
            let cli = Cli::try_parse_from(["notaquest", "mnemonic", "-c", "bass", "-e", "space"])
                .unwrap();
            match cli.command {
                Commands::Mnemonic { clef, element } => {
                    assert_eq!(clef, Some("bass".to_string()));
                    assert_eq!(element, Some("space".to_string()));
                }
                _ => panic!("Expected Mnemonic command"),
            }
        }

        #[test]
        fn parse_play_command() {
            let cli = Cli::try_parse_from([
                "notaquest", "play", "--mode", "both", "--level", "2", "--rounds", "5",
            ])
            .unwrap();
            match cli.command {
                Commands::Play {
                    mode,
                    level,
                    rounds,
                    seed,
                } => {
                    assert_eq!(mode, "both");
                    assert_eq!(level, 2);
                    assert_eq!(rounds, Some(5));
                    assert!(seed.is_none());
                }
                _ => panic!("Expected Play command"),
            }
        }

        #[test]
        fn parse_intervals_command() {
            let cli = Cli::try_parse_from(["notaquest", "intervals", "-d", "medium"]).unwrap();
            match cli.command {
                Commands::Intervals {
                    difficulty, rounds, ..
                } => {
                    assert_eq!(difficulty, "medium");
                    assert!(rounds.is_none());
                }
                _ => panic!("Expected Intervals command"),
            }
        }

        #[test]
        fn parse_add_xp_accepts_negative_for_validation() {
            let cli = Cli::try_parse_from(["notaquest", "add-xp", "-5"]).unwrap();
            match cli.command {
                Commands::AddXp { amount } => {
                    assert_eq!(amount, -5);
                    assert!(XpAmount::new(amount).is_err());
                }
                _ => panic!("Expected AddXp command"),
            }
        }

        #[test]
        fn parse_history_days() {
            let cli = Cli::try_parse_from(["notaquest", "history", "--days", "7"]).unwrap();
            match cli.command {
                Commands::History { days } => assert_eq!(days, 7),
                _ => panic!("Expected History command"),
            }
            let cli = Cli::try_parse_from(["notaquest", "history"]).unwrap();
            match cli.command {
                Commands::History { days } => assert_eq!(days, 30),
                _ => panic!("Expected History command"),
            }
        }

        #[test]
        fn parse_reset_all() {
            let cli = Cli::try_parse_from(["notaquest", "reset", "--all"]).unwrap();
            assert!(matches!(cli.command, Commands::Reset { all: true }));
        }

        #[test]
        fn parse_simple_commands() {
            for (arg, check) in [
                ("levels", 0),
                ("profile", 1),
                ("progress", 2),
                ("tui", 3),
            ] {
                let cli = Cli::try_parse_from(["notaquest", arg]).unwrap();
                let matched = match cli.command {
                    Commands::Levels => 0,
                    Commands::Profile => 1,
                    Commands::Progress => 2,
                    Commands::Tui => 3,
                    _ => -1,
                };
                assert_eq!(matched, check, "{}", arg);
            }
        }

        #[test]
        fn parse_json_flag_global() {
            let cli1 = Cli::try_parse_from(["notaquest", "--json", "progress"]).unwrap();
            assert!(cli1.json);

            let cli2 = Cli::try_parse_from(["notaquest", "progress", "--json"]).unwrap();
            assert!(cli2.json);
        }

        #[test]
        fn parse_invalid_command_fails() {
            let result = Cli::try_parse_from(["notaquest", "invalid"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["notaquest", "level"]).is_err());
            assert!(Cli::try_parse_from(["notaquest", "add-xp"]).is_err());
            assert!(Cli::try_parse_from(["notaquest", "add-xp", "ten"]).is_err());
        }
    }

    mod db_path_tests {
        use super::*;
        use std::env;

        #[test]
        fn get_db_path_uses_env_var() {
            let test_path = "/tmp/test_notaquest.db";
            env::set_var(DB_ENV, test_path);

            let path = get_db_path();
            assert_eq!(path.to_str().unwrap(), test_path);

            env::remove_var(DB_ENV);
        }

        #[test]
        fn get_db_path_default_includes_notaquest_db() {
            env::remove_var(DB_ENV);

            let path = get_db_path();
            let path_str = path.to_str().unwrap();

            assert!(path_str.ends_with("notaquest.db"));
            assert!(path_str.contains("notaquest"));
        }
    }

    mod rng_tests {
        use super::*;

        #[test]
        fn seeded_rng_is_reproducible() {
            let a: u64 = make_rng(Some(9)).gen();
            let b: u64 = make_rng(Some(9)).gen();
            assert_eq!(a, b);
        }
    }
}
