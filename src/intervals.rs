use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Interval;
use crate::models::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

const EASY: [Interval; 8] = [
    Interval::P1,
    Interval::Min2,
    Interval::Maj2,
    Interval::Min3,
    Interval::Maj3,
    Interval::P4,
    Interval::P5,
    Interval::P8,
];

const MEDIUM: [Interval; 11] = [
    Interval::Min2,
    Interval::Maj2,
    Interval::Min3,
    Interval::Maj3,
    Interval::P4,
    Interval::Tritone,
    Interval::P5,
    Interval::Min6,
    Interval::Maj6,
    Interval::Min7,
    Interval::Maj7,
];

const HARD: [Interval; 12] = [
    Interval::Min2,
    Interval::Maj2,
    Interval::Min3,
    Interval::Maj3,
    Interval::P4,
    Interval::Tritone,
    Interval::P5,
    Interval::Min6,
    Interval::Maj6,
    Interval::Min7,
    Interval::Maj7,
    Interval::P8,
];

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "e" | "beginner" => Some(Difficulty::Easy),
            "medium" | "m" | "intermediate" => Some(Difficulty::Medium),
            "hard" | "h" | "advanced" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// The intervals drawn at this difficulty, ascending.
    pub fn intervals(&self) -> &'static [Interval] {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }

    /// XP awarded for a correct answer at this difficulty.
    pub fn xp_reward(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 30,
        }
    }
}

pub fn random_interval<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Interval {
    let pool = difficulty.intervals();
    pool[rng.gen_range(0..pool.len())]
}

pub fn semitones(interval: Interval) -> u8 {
    interval.semitones()
}

/// Frequency of the upper tone of `interval` above `root_hz`.
pub fn interval_frequency(root_hz: f64, interval: Interval) -> f64 {
    root_hz * 2f64.powf(interval.semitones() as f64 / 12.0)
}

const SHARP_SPELLINGS: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Spells the note `interval` above `root` with sharps, e.g. `E4` for a
/// major third above `C4`.
pub fn upper_note_label(root: &Note, interval: Interval) -> String {
    let midi = root.midi() + interval.semitones() as i32;
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", SHARP_SPELLINGS[pitch_class], octave)
}
