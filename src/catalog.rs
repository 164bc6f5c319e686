//! Static musical facts consumed by the generators: mnemonic flashcards and
//! the interval vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Clef, Note, NoteName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffElement {
    Line,
    Space,
}

impl StaffElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffElement::Line => "line",
            StaffElement::Space => "space",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "line" | "lines" | "l" => Some(StaffElement::Line),
            "space" | "spaces" | "s" => Some(StaffElement::Space),
            _ => None,
        }
    }
}

// Mnemonic words per clef and staff element, bottom to top
const TREBLE_SPACES: [&str; 4] = ["F", "A", "C", "E"];
const TREBLE_LINES: [&str; 5] = ["Every", "Good", "Boy", "Does", "Fine"];
const BASS_SPACES: [&str; 4] = ["All", "Cows", "Eat", "Grass"];
const BASS_LINES: [&str; 5] = ["Good", "Boys", "Do", "Fine", "Always"];

fn mnemonic_words(clef: Clef, element: StaffElement) -> &'static [&'static str] {
    match (clef, element) {
        (Clef::Treble, StaffElement::Space) => &TREBLE_SPACES,
        (Clef::Treble, StaffElement::Line) => &TREBLE_LINES,
        (Clef::Bass, StaffElement::Space) => &BASS_SPACES,
        (Clef::Bass, StaffElement::Line) => &BASS_LINES,
    }
}

pub fn mnemonic_phrase(clef: Clef, element: StaffElement) -> &'static str {
    match (clef, element) {
        (Clef::Treble, StaffElement::Space) => "FACE - Space notes from bottom to top",
        (Clef::Treble, StaffElement::Line) => {
            "Every Good Boy Does Fine - Line notes from bottom to top"
        }
        (Clef::Bass, StaffElement::Space) => {
            "All Cows Eat Grass - Space notes from bottom to top"
        }
        (Clef::Bass, StaffElement::Line) => {
            "Good Boys Do Fine Always - Line notes from bottom to top"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MnemonicCard {
    pub note: NoteName,
    pub word: &'static str,
    pub element: StaffElement,
    /// 0-based index from the bottom of the staff within `element`.
    pub position: u8,
    pub clef: Clef,
}

impl MnemonicCard {
    /// The staff note this card teaches, with its octave.
    pub fn staff_note(&self) -> Note {
        Note::at_staff_position(self.clef, staff_position(self.element, self.position))
    }
}

fn staff_position(element: StaffElement, position: u8) -> i32 {
    let offset = match element {
        StaffElement::Line => 0,
        StaffElement::Space => 1,
    };
    position as i32 * 2 + offset
}

/// Flashcards for one clef and staff element, ordered bottom to top.
pub fn mnemonic_cards(clef: Clef, element: StaffElement) -> Vec<MnemonicCard> {
    mnemonic_words(clef, element)
        .iter()
        .enumerate()
        .map(|(i, word)| MnemonicCard {
            note: Note::at_staff_position(clef, staff_position(element, i as u8)).name,
            word: *word,
            element,
            position: i as u8,
            clef,
        })
        .collect()
}

pub fn all_mnemonic_cards() -> Vec<MnemonicCard> {
    let mut cards = Vec::new();
    for clef in [Clef::Treble, Clef::Bass] {
        for element in [StaffElement::Space, StaffElement::Line] {
            cards.extend(mnemonic_cards(clef, element));
        }
    }
    cards
}

/// The 13 intervals from unison to octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    P1,
    #[serde(rename = "m2")]
    Min2,
    #[serde(rename = "M2")]
    Maj2,
    #[serde(rename = "m3")]
    Min3,
    #[serde(rename = "M3")]
    Maj3,
    P4,
    Tritone,
    P5,
    #[serde(rename = "m6")]
    Min6,
    #[serde(rename = "M6")]
    Maj6,
    #[serde(rename = "m7")]
    Min7,
    #[serde(rename = "M7")]
    Maj7,
    P8,
}

impl Interval {
    /// Canonical order: ascending by semitone distance.
    pub const ALL: [Interval; 13] = [
        Interval::P1,
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

    pub fn label(&self) -> &'static str {
        match self {
            Interval::P1 => "P1",
            Interval::Min2 => "m2",
            Interval::Maj2 => "M2",
            Interval::Min3 => "m3",
            Interval::Maj3 => "M3",
            Interval::P4 => "P4",
            Interval::Tritone => "Tritone",
            Interval::P5 => "P5",
            Interval::Min6 => "m6",
            Interval::Maj6 => "M6",
            Interval::Min7 => "m7",
            Interval::Maj7 => "M7",
            Interval::P8 => "P8",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Interval::P1 => "Perfect Unison",
            Interval::Min2 => "Minor 2nd",
            Interval::Maj2 => "Major 2nd",
            Interval::Min3 => "Minor 3rd",
            Interval::Maj3 => "Major 3rd",
            Interval::P4 => "Perfect 4th",
            Interval::Tritone => "Tritone",
            Interval::P5 => "Perfect 5th",
            Interval::Min6 => "Minor 6th",
            Interval::Maj6 => "Major 6th",
            Interval::Min7 => "Minor 7th",
            Interval::Maj7 => "Major 7th",
            Interval::P8 => "Perfect Octave",
        }
    }

    pub fn semitones(&self) -> u8 {
        *self as u8
    }

    /// Exact, case-sensitive: `m3` and `M3` are different intervals.
    pub fn from_label(label: &str) -> Result<Self> {
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.label() == label.trim())
            .ok_or_else(|| Error::UnknownInterval(label.to_string()))
    }

    pub fn from_semitones(semitones: u8) -> Option<Self> {
        Interval::ALL.get(semitones as usize).copied()
    }
}
