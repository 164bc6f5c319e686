use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Interval;
use crate::error::{Error, Result};
use crate::generator::{generate_note, generate_options, generate_sequence, AnswerOptionSet, NoteSequence};
use crate::intervals::{interval_frequency, random_interval, upper_note_label, Difficulty};
use crate::levels::{self, LevelConfig};
use crate::models::{answer_label, parse_answer, Clef, GameMode, Note, NoteName, Profile};
use crate::progression::{
    apply_xp, LevelingPolicy, ProgressionState, RoundPhase, XpAmount, POINTS_PER_CORRECT_ANSWER,
    ROUNDS_PER_LEVEL, SIGHT_READING_DURATION, WRONG_ANSWER_PENALTY,
};

/// Items in a generated phrase on sequenced levels.
pub const SEQUENCE_LENGTH: usize = 4;

// Interval roots are natural notes around middle C
const INTERVAL_ROOT_OCTAVE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PracticeKind {
    Notes { mode: GameMode, level: u32 },
    Intervals { difficulty: Difficulty },
}

impl PracticeKind {
    pub fn mode(&self) -> GameMode {
        match self {
            PracticeKind::Notes { mode, .. } => *mode,
            PracticeKind::Intervals { .. } => GameMode::EarTraining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalChallenge {
    pub root: Note,
    pub interval: Interval,
    pub root_hz: f64,
    pub upper_hz: f64,
    pub upper_note: String,
    pub options: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Challenge {
    Note {
        note: Note,
        options: AnswerOptionSet,
    },
    Sequence {
        sequence: NoteSequence,
        target: Note,
        options: AnswerOptionSet,
    },
    Interval(IntervalChallenge),
}

impl Challenge {
    /// The canonical label of the right answer.
    pub fn answer(&self) -> String {
        match self {
            Challenge::Note { note, .. } | Challenge::Sequence { target: note, .. } => {
                note.answer_label()
            }
            Challenge::Interval(c) => c.interval.label().to_string(),
        }
    }

    pub fn option_labels(&self) -> Vec<String> {
        match self {
            Challenge::Note { options, .. } | Challenge::Sequence { options, .. } => {
                options.options().to_vec()
            }
            Challenge::Interval(c) => c.options.iter().map(|i| i.label().to_string()).collect(),
        }
    }

    // Unparseable answers are rejected before the round is resolved
    fn check(&self, answer: &str) -> Result<bool> {
        match self {
            Challenge::Note { .. } | Challenge::Sequence { .. } => {
                let (name, accidental) = parse_answer(answer)?;
                Ok(answer_label(name, accidental) == self.answer())
            }
            Challenge::Interval(c) => Ok(Interval::from_label(answer)? == c.interval),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    pub correct: bool,
    pub expected: String,
    pub score: u32,
    pub xp_award: Option<XpAmount>,
    pub completion_award: Option<XpAmount>,
    pub leveled_up: bool,
    pub finished: bool,
}

impl RoundResult {
    pub fn awards(&self) -> impl Iterator<Item = XpAmount> {
        self.xp_award.into_iter().chain(self.completion_award)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: GameMode,
    pub level: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub rounds_played: u32,
    pub correct: u32,
    pub score: u32,
    pub xp_earned: u64,
    pub level_completed: bool,
    pub profile: Profile,
}

/// One practice run: a fixed number of rounds for level play, unbounded
/// for sight reading (the caller enforces the clock).
pub struct PracticeSession<R> {
    kind: PracticeKind,
    config: Option<LevelConfig>,
    rng: R,
    policy: LevelingPolicy,
    progression: ProgressionState,
    phase: RoundPhase,
    challenge: Option<Challenge>,
    round_limit: Option<u32>,
    rounds_played: u32,
    correct: u32,
    xp_earned: u64,
    level_completed: bool,
}

impl<R: Rng> PracticeSession<R> {
    pub fn new(kind: PracticeKind, rng: R) -> Result<Self> {
        let (config, round_limit) = match kind {
            PracticeKind::Notes { mode, level } => {
                if mode == GameMode::EarTraining {
                    return Err(Error::InvalidConfig(
                        "ear training is an interval session".to_string(),
                    ));
                }
                let config = levels::resolve(level)?.gated_for(level);
                let limit = (mode != GameMode::SightReading).then_some(ROUNDS_PER_LEVEL);
                (Some(config), limit)
            }
            PracticeKind::Intervals { .. } => (None, Some(ROUNDS_PER_LEVEL)),
        };

        debug!(mode = kind.mode().as_str(), ?round_limit, "starting practice session");

        Ok(Self {
            kind,
            config,
            rng,
            policy: LevelingPolicy::default(),
            progression: ProgressionState::default(),
            phase: RoundPhase::Idle,
            challenge: None,
            round_limit,
            rounds_played: 0,
            correct: 0,
            xp_earned: 0,
            level_completed: false,
        })
    }

    /// Starts from a persisted profile so level-ups are reported against it.
    pub fn with_profile(mut self, profile: Profile, policy: LevelingPolicy) -> Self {
        self.progression = ProgressionState::from_profile(profile);
        self.policy = policy;
        self
    }

    /// Overrides the round count; `None` plays until the caller stops.
    pub fn with_round_limit(mut self, limit: Option<u32>) -> Self {
        self.round_limit = limit.filter(|n| *n > 0);
        self
    }

    pub fn kind(&self) -> PracticeKind {
        self.kind
    }

    pub fn config(&self) -> Option<&LevelConfig> {
        self.config.as_ref()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.progression.score
    }

    pub fn progression(&self) -> ProgressionState {
        self.progression
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn round_limit(&self) -> Option<u32> {
        self.round_limit
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.kind.mode() == GameMode::SightReading).then_some(SIGHT_READING_DURATION)
    }

    pub fn is_finished(&self) -> bool {
        self.round_limit
            .map_or(false, |limit| self.rounds_played >= limit)
    }

    /// Replaces the local XP view with the store's authoritative profile.
    pub fn sync_profile(&mut self, profile: Profile) {
        self.progression.xp = profile.xp;
        self.progression.level = profile.level.max(1);
    }

    fn pick_clef(&mut self) -> Clef {
        match self.kind.mode().fixed_clef() {
            Some(clef) => clef,
            None if self.rng.gen_bool(0.5) => Clef::Treble,
            None => Clef::Bass,
        }
    }

    pub fn next_challenge(&mut self) -> Result<&Challenge> {
        if self.is_finished() {
            return Err(Error::InvalidTransition {
                action: "present a challenge",
                phase: "the session is finished",
            });
        }
        let phase = self.phase.present()?;

        let challenge = match (self.kind, self.config.clone()) {
            (PracticeKind::Intervals { difficulty }, _) => self.interval_challenge(difficulty),
            (PracticeKind::Notes { .. }, Some(config)) => self.note_challenge(&config)?,
            (PracticeKind::Notes { level, .. }, None) => return Err(Error::LevelNotFound(level)),
        };

        self.phase = phase;
        Ok(&*self.challenge.insert(challenge))
    }

    fn note_challenge(&mut self, config: &LevelConfig) -> Result<Challenge> {
        let clef = self.pick_clef();

        if config.features().use_sequenced_content {
            let sequence = generate_sequence(config, clef, SEQUENCE_LENGTH, &mut self.rng);
            if let Some(target) = sequence.target().copied() {
                let options = generate_options(&target.answer_label(), config, &mut self.rng)?;
                return Ok(Challenge::Sequence {
                    sequence,
                    target,
                    options,
                });
            }
        }

        let note = generate_note(config, clef, &mut self.rng);
        let options = generate_options(&note.answer_label(), config, &mut self.rng)?;
        Ok(Challenge::Note { note, options })
    }

    fn interval_challenge(&mut self, difficulty: Difficulty) -> Challenge {
        let interval = random_interval(difficulty, &mut self.rng);
        let root = Note {
            name: NoteName::ALL[self.rng.gen_range(0..NoteName::ALL.len())],
            octave: INTERVAL_ROOT_OCTAVE,
            accidental: None,
            clef: Clef::Treble,
        };
        let root_hz = root.frequency();

        Challenge::Interval(IntervalChallenge {
            root,
            interval,
            root_hz,
            upper_hz: interval_frequency(root_hz, interval),
            upper_note: upper_note_label(&root, interval),
            options: difficulty.intervals().to_vec(),
        })
    }

    pub fn submit(&mut self, answer: &str) -> Result<RoundResult> {
        let challenge = self.challenge.as_ref().ok_or(Error::InvalidTransition {
            action: "submit an answer",
            phase: self.phase.as_str(),
        })?;
        let expected = challenge.answer();
        let correct = challenge.check(answer)?;
        self.phase = self.phase.answer(correct)?;
        self.progression.feedback = self.phase.feedback();
        self.rounds_played += 1;

        let mut xp_award = None;
        if correct {
            self.correct += 1;
            self.progression.score += POINTS_PER_CORRECT_ANSWER;
            xp_award = Some(match self.kind {
                PracticeKind::Intervals { difficulty } => XpAmount::new(difficulty.xp_reward() as i64)?,
                PracticeKind::Notes { .. } => XpAmount::for_correct_answer(),
            });
        } else if self.kind.mode() == GameMode::SightReading {
            self.progression.score = self.progression.score.saturating_sub(WRONG_ANSWER_PENALTY);
        }

        let mut completion_award = None;
        if let PracticeKind::Notes { level, mode } = self.kind {
            if mode != GameMode::SightReading && self.is_finished() && !self.level_completed {
                self.level_completed = true;
                completion_award = Some(XpAmount::for_completed_level(level));
                info!(level, score = self.progression.score, "level complete");
            }
        }

        let mut leveled_up = false;
        for award in xp_award.into_iter().chain(completion_award) {
            let applied = apply_xp(&self.progression, award, self.policy);
            leveled_up |= applied.leveled_up;
            self.progression = applied.state;
            self.xp_earned += award.get() as u64;
        }

        debug!(correct, expected = %expected, answer, score = self.progression.score, "round resolved");

        Ok(RoundResult {
            correct,
            expected,
            score: self.progression.score,
            xp_award,
            completion_award,
            leveled_up,
            finished: self.is_finished(),
        })
    }

    /// Leaves the feedback phase so the next challenge can be drawn.
    pub fn advance(&mut self) -> Result<()> {
        self.phase = self.phase.finish()?;
        self.progression.feedback = None;
        self.challenge = None;
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        let (level, difficulty) = match self.kind {
            PracticeKind::Notes { level, .. } => (Some(level), None),
            PracticeKind::Intervals { difficulty } => (None, Some(difficulty)),
        };

        SessionSummary {
            mode: self.kind.mode(),
            level,
            difficulty,
            rounds_played: self.rounds_played,
            correct: self.correct,
            score: self.progression.score,
            xp_earned: self.xp_earned,
            level_completed: self.level_completed,
            profile: self.progression.profile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn notes(mode: GameMode, level: u32) -> PracticeSession<StdRng> {
        PracticeSession::new(PracticeKind::Notes { mode, level }, StdRng::seed_from_u64(11)).unwrap()
    }

    fn intervals(difficulty: Difficulty) -> PracticeSession<StdRng> {
        PracticeSession::new(PracticeKind::Intervals { difficulty }, StdRng::seed_from_u64(5)).unwrap()
    }

    fn wrong_answer(challenge: &Challenge) -> String {
        let expected = challenge.answer();
        challenge
            .option_labels()
            .into_iter()
            .find(|o| *o != expected)
            .unwrap()
    }

    fn play_round(session: &mut PracticeSession<StdRng>, correct: bool) -> RoundResult {
        let challenge = session.next_challenge().unwrap().clone();
        let answer = if correct {
            challenge.answer()
        } else {
            wrong_answer(&challenge)
        };
        let result = session.submit(&answer).unwrap();
        session.advance().unwrap();
        result
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn unknown_level_is_rejected() {
            let result = PracticeSession::new(
                PracticeKind::Notes {
                    mode: GameMode::Treble,
                    level: 42,
                },
                StdRng::seed_from_u64(1),
            );
            assert!(matches!(result, Err(Error::LevelNotFound(42))));
        }

        #[test]
        fn ear_training_is_not_a_note_session() {
            let result = PracticeSession::new(
                PracticeKind::Notes {
                    mode: GameMode::EarTraining,
                    level: 1,
                },
                StdRng::seed_from_u64(1),
            );
            assert!(matches!(result, Err(Error::InvalidConfig(_))));
        }

        #[test]
        fn level_play_has_ten_rounds_sight_reading_is_timed() {
            assert_eq!(notes(GameMode::Treble, 1).round_limit(), Some(ROUNDS_PER_LEVEL));
            let sight = notes(GameMode::SightReading, 1);
            assert_eq!(sight.round_limit(), None);
            assert_eq!(sight.time_limit(), Some(SIGHT_READING_DURATION));
        }

        #[test]
        fn config_is_gated_for_level() {
            let session = notes(GameMode::Treble, 2);
            assert!(!session.config().unwrap().features().use_ledger_lines);
        }
    }

    mod note_round_tests {
        use super::*;

        #[test]
        fn fixed_clef_modes_keep_their_clef() {
            let mut session = notes(GameMode::Bass, 1);
            for _ in 0..5 {
                match session.next_challenge().unwrap() {
                    Challenge::Note { note, .. } => assert_eq!(note.clef, Clef::Bass),
                    other => panic!("unexpected challenge {:?}", other),
                }
                let answer = session.challenge().unwrap().answer();
                session.submit(&answer).unwrap();
                session.advance().unwrap();
            }
        }

        #[test]
        fn both_mode_uses_both_clefs() {
            let mut session = notes(GameMode::Both, 1).with_round_limit(Some(200));
            let mut clefs = std::collections::HashSet::new();
            for _ in 0..50 {
                if let Challenge::Note { note, .. } = session.next_challenge().unwrap() {
                    clefs.insert(note.clef);
                }
                let answer = session.challenge().unwrap().answer();
                session.submit(&answer).unwrap();
                session.advance().unwrap();
            }
            assert_eq!(clefs.len(), 2);
        }

        #[test]
        fn options_contain_the_answer() {
            let mut session = notes(GameMode::Treble, 2);
            let challenge = session.next_challenge().unwrap();
            assert!(challenge.option_labels().contains(&challenge.answer()));
            assert_eq!(challenge.option_labels().len(), 4);
        }

        #[test]
        fn correct_answer_scores_and_awards_xp() {
            let mut session = notes(GameMode::Treble, 1);
            let result = play_round(&mut session, true);
            assert!(result.correct);
            assert_eq!(result.score, POINTS_PER_CORRECT_ANSWER);
            assert_eq!(result.xp_award, Some(XpAmount::for_correct_answer()));
            assert!(result.completion_award.is_none());
            assert_eq!(session.progression().xp, 10);
        }

        #[test]
        fn wrong_answer_scores_nothing() {
            let mut session = notes(GameMode::Treble, 1);
            let result = play_round(&mut session, false);
            assert!(!result.correct);
            assert_eq!(result.score, 0);
            assert!(result.xp_award.is_none());
        }

        #[test]
        fn answers_are_case_insensitive() {
            let mut session = notes(GameMode::Treble, 1);
            let answer = session.next_challenge().unwrap().answer().to_lowercase();
            assert!(session.submit(&answer).unwrap().correct);
        }

        #[test]
        fn garbage_answer_keeps_round_open() {
            let mut session = notes(GameMode::Treble, 1);
            session.next_challenge().unwrap();
            assert!(matches!(session.submit("Z"), Err(Error::UnknownNote(_))));
            assert_eq!(session.phase(), RoundPhase::AwaitingAnswer);
            assert_eq!(session.rounds_played(), 0);
        }

        #[test]
        fn sequenced_level_names_first_note() {
            let mut session = notes(GameMode::Treble, 5);
            match session.next_challenge().unwrap() {
                Challenge::Sequence {
                    sequence, target, ..
                } => {
                    assert_eq!(sequence.items.len(), SEQUENCE_LENGTH);
                    assert_eq!(sequence.target(), Some(target));
                }
                other => panic!("expected a sequence, got {:?}", other),
            }
        }
    }

    mod state_machine_tests {
        use super::*;

        #[test]
        fn cannot_submit_without_challenge() {
            let mut session = notes(GameMode::Treble, 1);
            assert!(matches!(
                session.submit("C"),
                Err(Error::InvalidTransition { .. })
            ));
        }

        #[test]
        fn cannot_draw_twice_without_answering() {
            let mut session = notes(GameMode::Treble, 1);
            session.next_challenge().unwrap();
            assert!(session.next_challenge().is_err());
        }

        #[test]
        fn cannot_answer_twice() {
            let mut session = notes(GameMode::Treble, 1);
            let answer = session.next_challenge().unwrap().answer();
            session.submit(&answer).unwrap();
            assert!(matches!(
                session.submit(&answer),
                Err(Error::InvalidTransition { .. })
            ));
        }

        #[test]
        fn feedback_is_cleared_on_advance() {
            let mut session = notes(GameMode::Treble, 1);
            let answer = session.next_challenge().unwrap().answer();
            session.submit(&answer).unwrap();
            assert!(session.progression().feedback.is_some());
            session.advance().unwrap();
            assert!(session.progression().feedback.is_none());
            assert!(session.challenge().is_none());
        }
    }

    mod completion_tests {
        use super::*;

        #[test]
        fn tenth_round_completes_level_and_awards_bonus() {
            let mut session = notes(GameMode::Treble, 3);
            for round in 1..=ROUNDS_PER_LEVEL {
                let result = play_round(&mut session, round % 2 == 0);
                if round < ROUNDS_PER_LEVEL {
                    assert!(result.completion_award.is_none());
                    assert!(!result.finished);
                } else {
                    assert_eq!(result.completion_award, Some(XpAmount::for_completed_level(3)));
                    assert!(result.finished);
                }
            }

            let summary = session.summary();
            assert!(summary.level_completed);
            assert_eq!(summary.rounds_played, 10);
            assert_eq!(summary.correct, 5);
            assert_eq!(summary.score, 50);
            assert_eq!(summary.xp_earned, 5 * 10 + 300);
            assert!(session.next_challenge().is_err());
        }

        #[test]
        fn level_up_is_reported_against_profile() {
            let mut session = notes(GameMode::Treble, 1)
                .with_profile(Profile { xp: 95, level: 1 }, LevelingPolicy::Simple);
            let result = play_round(&mut session, true);
            assert!(result.leveled_up);
            assert_eq!(session.progression().level, 2);
            assert_eq!(session.summary().profile, Profile { xp: 105, level: 2 });
        }

        #[test]
        fn sync_profile_overrides_local_xp() {
            let mut session = notes(GameMode::Treble, 1);
            session.sync_profile(Profile { xp: 4000, level: 4 });
            assert_eq!(session.progression().xp, 4000);
            assert_eq!(session.progression().level, 4);
        }
    }

    mod sight_reading_tests {
        use super::*;

        #[test]
        fn wrong_answers_cost_points_but_never_go_negative() {
            let mut session = notes(GameMode::SightReading, 1);
            assert_eq!(play_round(&mut session, false).score, 0);
            assert_eq!(play_round(&mut session, true).score, 10);
            assert_eq!(play_round(&mut session, false).score, 8);
            assert!(!session.is_finished());
        }

        #[test]
        fn never_completes_a_level() {
            let mut session = notes(GameMode::SightReading, 1);
            for _ in 0..15 {
                assert!(play_round(&mut session, true).completion_award.is_none());
            }
            assert!(!session.summary().level_completed);
        }
    }

    mod interval_session_tests {
        use super::*;

        #[test]
        fn interval_challenge_is_consistent() {
            let mut session = intervals(Difficulty::Medium);
            match session.next_challenge().unwrap() {
                Challenge::Interval(c) => {
                    assert!(Difficulty::Medium.intervals().contains(&c.interval));
                    assert_eq!(c.options, Difficulty::Medium.intervals().to_vec());
                    assert!((c.upper_hz - interval_frequency(c.root_hz, c.interval)).abs() < 1e-9);
                    assert!(c.root.accidental.is_none());
                }
                other => panic!("expected an interval, got {:?}", other),
            }
        }

        #[test]
        fn hard_correct_answer_awards_thirty_xp() {
            let mut session = intervals(Difficulty::Hard);
            let result = play_round(&mut session, true);
            assert_eq!(result.xp_award.map(|x| x.get()), Some(30));
            assert_eq!(session.summary().mode, GameMode::EarTraining);
        }

        #[test]
        fn unknown_interval_label_is_rejected() {
            let mut session = intervals(Difficulty::Easy);
            session.next_challenge().unwrap();
            assert!(matches!(
                session.submit("A4"),
                Err(Error::UnknownInterval(_))
            ));
        }

        #[test]
        fn interval_sessions_never_complete_levels() {
            let mut session = intervals(Difficulty::Easy);
            for _ in 0..ROUNDS_PER_LEVEL {
                assert!(play_round(&mut session, true).completion_award.is_none());
            }
            assert!(session.is_finished());
            assert_eq!(session.summary().difficulty, Some(Difficulty::Easy));
        }
    }
}
