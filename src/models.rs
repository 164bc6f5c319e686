// Several accessors are part of the engine API but only exercised by tests or the TUI
#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// Letter names of the natural notes, in diatonic order from C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 7] = [
        NoteName::A,
        NoteName::B,
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
    ];

    pub fn as_char(&self) -> char {
        match self {
            NoteName::C => 'C',
            NoteName::D => 'D',
            NoteName::E => 'E',
            NoteName::F => 'F',
            NoteName::G => 'G',
            NoteName::A => 'A',
            NoteName::B => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Diatonic step above C within one octave (C=0 .. B=6).
    pub fn step(&self) -> i32 {
        *self as i32
    }

    pub fn from_step(step: i32) -> Self {
        match step.rem_euclid(7) {
            0 => NoteName::C,
            1 => NoteName::D,
            2 => NoteName::E,
            3 => NoteName::F,
            4 => NoteName::G,
            5 => NoteName::A,
            _ => NoteName::B,
        }
    }

    /// Semitones above C within one octave.
    pub fn semitone(&self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    Flat,
    Sharp,
}

impl Accidental {
    pub fn suffix(&self) -> &'static str {
        match self {
            Accidental::Flat => "b",
            Accidental::Sharp => "#",
        }
    }

    pub fn alter(&self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }

    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "b" | "♭" => Some(Accidental::Flat),
            "#" | "♯" => Some(Accidental::Sharp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "treble" | "t" | "g" => Some(Clef::Treble),
            "bass" | "b" | "f" => Some(Clef::Bass),
            _ => None,
        }
    }

    /// Diatonic index (octave * 7 + step) of the bottom staff line: E4 / G2.
    pub fn bottom_line(&self) -> i32 {
        match self {
            Clef::Treble => 4 * 7 + NoteName::E.step(),
            Clef::Bass => 2 * 7 + NoteName::G.step(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
}

impl NoteValue {
    pub const ALL: [NoteValue; 4] = [
        NoteValue::Whole,
        NoteValue::Half,
        NoteValue::Quarter,
        NoteValue::Eighth,
    ];

    pub fn beats(&self) -> f64 {
        match self {
            NoteValue::Whole => 4.0,
            NoteValue::Half => 2.0,
            NoteValue::Quarter => 1.0,
            NoteValue::Eighth => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteValue::Whole => "whole",
            NoteValue::Half => "half",
            NoteValue::Quarter => "quarter",
            NoteValue::Eighth => "eighth",
        }
    }
}

/// A generated note challenge. Lives for one round only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: NoteName,
    pub octave: i32,
    pub accidental: Option<Accidental>,
    pub clef: Clef,
}

impl Note {
    /// The string a player must pick to answer this note, e.g. `C#`.
    pub fn answer_label(&self) -> String {
        answer_label(self.name, self.accidental)
    }

    /// The natural note sitting at `position` on the given clef's staff.
    pub fn at_staff_position(clef: Clef, position: i32) -> Self {
        let diatonic = clef.bottom_line() + position;
        Self {
            name: NoteName::from_step(diatonic),
            octave: diatonic.div_euclid(7),
            accidental: None,
            clef,
        }
    }

    pub fn midi(&self) -> i32 {
        let alter = self.accidental.map(|a| a.alter()).unwrap_or(0);
        (self.octave + 1) * 12 + self.name.semitone() + alter
    }

    /// Equal-tempered frequency with A4 = 440 Hz.
    pub fn frequency(&self) -> f64 {
        440.0 * 2f64.powf((self.midi() - 69) as f64 / 12.0)
    }

    /// Diatonic distance from the clef's bottom line. 0 is the bottom line,
    /// 8 the top line; odd values are spaces.
    pub fn staff_position(&self) -> i32 {
        self.octave * 7 + self.name.step() - self.clef.bottom_line()
    }

    pub fn ledger_lines(&self) -> u32 {
        let pos = self.staff_position();
        if pos < 0 {
            (-pos / 2) as u32
        } else if pos > 8 {
            ((pos - 8) / 2) as u32
        } else {
            0
        }
    }

    pub fn stem_direction(&self) -> StemDirection {
        if self.staff_position() < 4 {
            StemDirection::Up
        } else {
            StemDirection::Down
        }
    }

    /// Scientific pitch notation, e.g. `Bb3`.
    pub fn display(&self) -> String {
        format!("{}{}", self.answer_label(), self.octave)
    }
}

pub fn answer_label(name: NoteName, accidental: Option<Accidental>) -> String {
    let mut label = name.as_char().to_string();
    if let Some(acc) = accidental {
        label.push_str(acc.suffix());
    }
    label
}

/// Parses a player's answer such as `c`, `F#` or `Bb` into its canonical label.
pub fn parse_answer(input: &str) -> Result<(NoteName, Option<Accidental>)> {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let name = chars
        .next()
        .and_then(NoteName::from_char)
        .ok_or_else(|| Error::UnknownNote(trimmed.to_string()))?;
    let rest: String = chars.collect();
    if rest.is_empty() {
        return Ok((name, None));
    }
    let accidental =
        Accidental::from_suffix(&rest).ok_or_else(|| Error::UnknownNote(trimmed.to_string()))?;
    Ok((name, Some(accidental)))
}

// Practice mode tags used for best scores and history
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    Treble,
    Bass,
    Both,
    EarTraining,
    SightReading,
}

impl GameMode {
    pub const ALL: [GameMode; 5] = [
        GameMode::Treble,
        GameMode::Bass,
        GameMode::Both,
        GameMode::EarTraining,
        GameMode::SightReading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Treble => "treble",
            GameMode::Bass => "bass",
            GameMode::Both => "both",
            GameMode::EarTraining => "ear-training",
            GameMode::SightReading => "sight-reading",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "treble" | "t" => Some(GameMode::Treble),
            "bass" | "b" => Some(GameMode::Bass),
            "both" => Some(GameMode::Both),
            "ear-training" | "ear" | "intervals" => Some(GameMode::EarTraining),
            "sight-reading" | "sight" => Some(GameMode::SightReading),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Treble => "Treble Clef",
            GameMode::Bass => "Bass Clef",
            GameMode::Both => "Both Clefs",
            GameMode::EarTraining => "Ear Training",
            GameMode::SightReading => "Sight Reading",
        }
    }

    /// The fixed clef for single-clef modes; `None` means pick per round.
    pub fn fixed_clef(&self) -> Option<Clef> {
        match self {
            GameMode::Treble => Some(Clef::Treble),
            GameMode::Bass => Some(Clef::Bass),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// The local player's persisted XP and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub xp: u64,
    pub level: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// One completed round or session outcome. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressHistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub mode: GameMode,
    pub score: u32,
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    pub best_scores: BTreeMap<GameMode, u32>,
    pub completed_levels: Vec<u32>,
    pub last_played: DateTime<Utc>,
    pub history: Vec<ProgressHistoryEntry>,
}

impl ProgressData {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            best_scores: GameMode::ALL.iter().map(|m| (*m, 0)).collect(),
            completed_levels: Vec::new(),
            last_played: now,
            history: Vec::new(),
        }
    }

    pub fn best_score(&self, mode: GameMode) -> u32 {
        self.best_scores.get(&mode).copied().unwrap_or(0)
    }
}

impl Default for ProgressData {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
